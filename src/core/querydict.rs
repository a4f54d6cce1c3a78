//! Ordered multi-valued query-string dictionary
//!
//! Keys keep the position of their first insertion and each key holds a list
//! of values, so `a=1&b=2&a=3` re-encodes as `a=1&a=3&b=2`. Replacing a key's
//! values keeps its position; removing it drops it entirely.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDict {
    entries: IndexMap<String, Vec<String>>,
}

impl QueryDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` string (leading `?` allowed)
    pub fn parse(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)?;
        Ok(pairs.into_iter().collect())
    }

    /// Last value for a key, like a plain dictionary lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Every value for a key, in order
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Replace a key's values with a single value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), vec![value.into()]);
    }

    /// Replace a key's values; an empty list removes the key
    pub fn set_list(&mut self, key: impl Into<String>, values: Vec<String>) {
        let key = key.into();
        if values.is_empty() {
            self.entries.shift_remove(&key);
        } else {
            self.entries.insert(key, values);
        }
    }

    /// Append a value to a key
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// Remove a key, returning its values
    pub fn pop(&mut self, key: &str) -> Option<Vec<String>> {
        self.entries.shift_remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattened `(key, value)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Encode back into a query string (without the leading `?`)
    pub fn urlencode(&self) -> String {
        let pairs: Vec<(&str, &str)> = self.pairs().collect();
        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryDict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = QueryDict::new();
        for (k, v) in iter {
            dict.append(k, v);
        }
        dict
    }
}

impl Serialize for QueryDict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_groups_repeated_keys() {
        let dict = QueryDict::parse("?a=1&b=2&a=3").unwrap();
        assert_eq!(dict.get_list("a"), vec!["1", "3"]);
        assert_eq!(dict.get("a"), Some("3"));
        assert_eq!(dict.urlencode(), "a=1&a=3&b=2");
    }

    #[test]
    fn test_set_keeps_position() {
        let mut dict = QueryDict::parse("q=web&gender=1&page=2").unwrap();
        dict.set("gender", "2");
        assert_eq!(dict.urlencode(), "q=web&gender=2&page=2");
    }

    #[test]
    fn test_pop_and_set_list_empty_remove_key() {
        let mut dict = QueryDict::parse("q=web&depart=1&depart=2").unwrap();
        assert_eq!(dict.pop("depart"), Some(vec!["1".to_string(), "2".to_string()]));
        assert_eq!(dict.urlencode(), "q=web");

        dict.set_list("q", vec![]);
        assert!(dict.is_empty());
        assert_eq!(dict.urlencode(), "");
    }

    #[test]
    fn test_urlencode_escapes_reserved_characters() {
        let mut dict = QueryDict::new();
        dict.set("_filter", "q=foo&page=2");
        assert_eq!(dict.urlencode(), "_filter=q%3Dfoo%26page%3D2");

        let back = QueryDict::parse(&dict.urlencode()).unwrap();
        assert_eq!(back.get("_filter"), Some("q=foo&page=2"));
    }

    #[test]
    fn test_spaces_use_plus() {
        let dict: QueryDict = [("q", "web server")].into_iter().collect();
        assert_eq!(dict.urlencode(), "q=web+server");
        assert_eq!(QueryDict::parse("q=web+server").unwrap().get("q"), Some("web server"));
    }
}
