//! Query conditions, ordering and windows
//!
//! Conditions use Django-style lookups: a key such as `name__contains` names a
//! field and an operator. They are plain values so any data source can translate
//! them; [`Condition::matches`] evaluates them against a serialized record for
//! in-memory sources.

use crate::core::model::plain_string;
use serde_json::Value;
use std::cmp::Ordering;

/// Lookup operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOp {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    EndsWith,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
    IsNull,
}

impl LookupOp {
    fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "exact" => LookupOp::Exact,
            "iexact" => LookupOp::IExact,
            "contains" => LookupOp::Contains,
            "icontains" => LookupOp::IContains,
            "startswith" => LookupOp::StartsWith,
            "endswith" => LookupOp::EndsWith,
            "in" => LookupOp::In,
            "gt" => LookupOp::Gt,
            "gte" => LookupOp::Gte,
            "lt" => LookupOp::Lt,
            "lte" => LookupOp::Lte,
            "isnull" => LookupOp::IsNull,
            _ => return None,
        })
    }
}

/// A single `field <op> value` test
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub field: String,
    pub op: LookupOp,
    pub value: Value,
}

impl Lookup {
    /// Parse a lookup key like `name__icontains`; a key without a known
    /// operator suffix is an exact match on the whole key
    pub fn parse(key: &str, value: impl Into<Value>) -> Self {
        let (field, op) = match key.rsplit_once("__") {
            Some((field, suffix)) => match LookupOp::from_suffix(suffix) {
                Some(op) => (field, op),
                None => (key, LookupOp::Exact),
            },
            None => (key, LookupOp::Exact),
        };
        Self {
            field: field.to_string(),
            op,
            value: value.into(),
        }
    }

    fn matches(&self, record: &Value, pk_field: &str) -> bool {
        let field = if self.field == "pk" {
            pk_field
        } else {
            &self.field
        };
        let stored = record.get(field).unwrap_or(&Value::Null);

        if self.op == LookupOp::IsNull {
            let want_null = match &self.value {
                Value::Bool(b) => *b,
                other => plain_string(other) == "true",
            };
            let is_null = stored.is_null() || stored.as_array().is_some_and(|a| a.is_empty());
            return is_null == want_null;
        }

        // Many-valued fields match when any element matches
        match stored {
            Value::Array(items) => items.iter().any(|item| self.test_scalar(item)),
            scalar => self.test_scalar(scalar),
        }
    }

    fn test_scalar(&self, stored: &Value) -> bool {
        if stored.is_null() {
            return false;
        }
        let stored_text = plain_string(stored);
        match self.op {
            LookupOp::Exact => loose_eq(stored, &self.value),
            LookupOp::IExact => stored_text.to_lowercase() == plain_string(&self.value).to_lowercase(),
            LookupOp::Contains => stored_text.contains(&plain_string(&self.value)),
            LookupOp::IContains => stored_text
                .to_lowercase()
                .contains(&plain_string(&self.value).to_lowercase()),
            LookupOp::StartsWith => stored_text.starts_with(&plain_string(&self.value)),
            LookupOp::EndsWith => stored_text.ends_with(&plain_string(&self.value)),
            LookupOp::In => match &self.value {
                Value::Array(candidates) => candidates.iter().any(|c| loose_eq(stored, c)),
                single => loose_eq(stored, single),
            },
            LookupOp::Gt => compare_values(stored, &self.value) == Ordering::Greater,
            LookupOp::Gte => compare_values(stored, &self.value) != Ordering::Less,
            LookupOp::Lt => compare_values(stored, &self.value) == Ordering::Less,
            LookupOp::Lte => compare_values(stored, &self.value) != Ordering::Greater,
            LookupOp::IsNull => unreachable!("handled before scalar dispatch"),
        }
    }
}

/// Query-string values are strings, stored values may not be
fn loose_eq(stored: &Value, wanted: &Value) -> bool {
    stored == wanted || plain_string(stored) == plain_string(wanted)
}

/// Total order over JSON scalars: null < bool < number < string
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        // Numeric query-string values against numeric fields
        (Value::Number(x), Value::String(s)) | (Value::String(s), Value::Number(x))
            if s.parse::<f64>().is_ok() =>
        {
            let x = x.as_f64().unwrap_or(0.0);
            let y = s.parse::<f64>().unwrap_or(0.0);
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            if matches!(a, Value::Number(_)) {
                ord
            } else {
                ord.reverse()
            }
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Boolean combination of lookups
///
/// An empty `And` or `Or` matches everything, like an empty `Q()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Lookup(Lookup),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Default for Condition {
    fn default() -> Self {
        Condition::all()
    }
}

impl Condition {
    /// Unrestricted condition
    pub fn all() -> Self {
        Condition::And(Vec::new())
    }

    /// Single lookup parsed from a `field__op` key
    pub fn lookup(key: &str, value: impl Into<Value>) -> Self {
        Condition::Lookup(Lookup::parse(key, value))
    }

    /// AND of `key=value` pairs, the shape of `filter(**kwargs)`
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        Condition::And(
            pairs
                .into_iter()
                .map(|(k, v)| Condition::lookup(k.as_ref(), v))
                .collect(),
        )
    }

    pub fn is_unrestricted(&self) -> bool {
        match self {
            Condition::And(items) | Condition::Or(items) => {
                items.iter().all(Condition::is_unrestricted)
            }
            _ => false,
        }
    }

    /// Combine with another condition, flattening nested ANDs
    pub fn and(self, other: Condition) -> Condition {
        if other.is_unrestricted() {
            return self;
        }
        if self.is_unrestricted() {
            return other;
        }
        match self {
            Condition::And(mut items) => {
                items.push(other);
                Condition::And(items)
            }
            this => Condition::And(vec![this, other]),
        }
    }

    /// Evaluate against a serialized record
    pub fn matches(&self, record: &Value, pk_field: &str) -> bool {
        match self {
            Condition::Lookup(lookup) => lookup.matches(record, pk_field),
            Condition::And(items) => items.iter().all(|c| c.matches(record, pk_field)),
            Condition::Or(items) => {
                items.is_empty() || items.iter().any(|c| c.matches(record, pk_field))
            }
            Condition::Not(inner) => !inner.matches(record, pk_field),
        }
    }
}

/// One ordering rule; `-field` sorts descending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn parse(rule: &str) -> Self {
        match rule.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                descending: true,
            },
            None => Self {
                field: rule.to_string(),
                descending: false,
            },
        }
    }

    /// Compare two serialized records under a list of rules
    pub fn compare(rules: &[OrderBy], a: &Value, b: &Value, pk_field: &str) -> Ordering {
        for rule in rules {
            let field = if rule.field == "pk" {
                pk_field
            } else {
                &rule.field
            };
            let left = a.get(field).unwrap_or(&Value::Null);
            let right = b.get(field).unwrap_or(&Value::Null);
            let ord = compare_values(left, right);
            let ord = if rule.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// A lazily described query: condition, ordering and an optional window
///
/// Data sources receive the whole description and decide how to execute it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySet {
    pub condition: Condition,
    pub ordering: Vec<OrderBy>,
    /// Half-open `[start, end)` window over the ordered result
    pub window: Option<(usize, usize)>,
}

impl QuerySet {
    pub fn all() -> Self {
        Self::default()
    }

    /// Narrow the query (AND with the existing condition)
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = std::mem::take(&mut self.condition).and(condition);
        self
    }

    pub fn order_by<S: AsRef<str>>(mut self, rules: impl IntoIterator<Item = S>) -> Self {
        self.ordering = rules
            .into_iter()
            .map(|r| OrderBy::parse(r.as_ref()))
            .collect();
        self
    }

    pub fn slice(mut self, start: usize, end: usize) -> Self {
        self.window = Some((start, end.max(start)));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn host(id: i64, name: &str) -> Value {
        json!({"id": id, "name": name, "tags": [1, 3], "gender": 1, "note": null})
    }

    #[test]
    fn test_parse_lookup_keys() {
        let l = Lookup::parse("name__contains", "web");
        assert_eq!(l.field, "name");
        assert_eq!(l.op, LookupOp::Contains);

        let l = Lookup::parse("depart__in", json!([1, 2]));
        assert_eq!(l.op, LookupOp::In);

        let l = Lookup::parse("first__name", "x");
        assert_eq!(l.field, "first__name");
        assert_eq!(l.op, LookupOp::Exact);
    }

    #[test]
    fn test_exact_matches_string_query_against_number() {
        let c = Condition::lookup("gender", "1");
        assert!(c.matches(&host(1, "web"), "id"));
        assert!(!Condition::lookup("gender", "2").matches(&host(1, "web"), "id"));
    }

    #[test]
    fn test_contains_is_case_sensitive_icontains_is_not() {
        let row = host(1, "Web-01");
        assert!(!Condition::lookup("name__contains", "web").matches(&row, "id"));
        assert!(Condition::lookup("name__icontains", "web").matches(&row, "id"));
    }

    #[test]
    fn test_many_valued_field_matches_any_element() {
        let row = host(1, "web");
        assert!(Condition::lookup("tags", "3").matches(&row, "id"));
        assert!(Condition::lookup("tags__in", json!(["2", "3"])).matches(&row, "id"));
        assert!(!Condition::lookup("tags__in", json!(["2"])).matches(&row, "id"));
    }

    #[test]
    fn test_comparisons_and_pk_alias() {
        let row = host(5, "web");
        assert!(Condition::lookup("pk__gt", 2).matches(&row, "id"));
        assert!(Condition::lookup("id__lte", "5").matches(&row, "id"));
        assert!(!Condition::lookup("id__lt", 5).matches(&row, "id"));
    }

    #[test]
    fn test_isnull() {
        let row = host(1, "web");
        assert!(Condition::lookup("note__isnull", true).matches(&row, "id"));
        assert!(!Condition::lookup("name__isnull", true).matches(&row, "id"));
    }

    #[test]
    fn test_empty_or_and_and_match_everything() {
        let row = host(1, "web");
        assert!(Condition::Or(vec![]).matches(&row, "id"));
        assert!(Condition::all().matches(&row, "id"));
        assert!(Condition::all().is_unrestricted());
    }

    #[test]
    fn test_or_needs_one_branch() {
        let c = Condition::Or(vec![
            Condition::lookup("name__contains", "db"),
            Condition::lookup("name__contains", "we"),
        ]);
        assert!(c.matches(&host(1, "web"), "id"));
        assert!(!c.matches(&host(1, "cache"), "id"));
    }

    #[test]
    fn test_and_skips_unrestricted_operands() {
        let c = Condition::all().and(Condition::lookup("id", 1));
        assert_eq!(c, Condition::lookup("id", 1));
        let c = c.and(Condition::all());
        assert_eq!(c, Condition::lookup("id", 1));
    }

    #[test]
    fn test_order_by_parse_and_compare() {
        let rules = vec![OrderBy::parse("-id")];
        assert!(rules[0].descending);
        let a = host(1, "a");
        let b = host(2, "b");
        assert_eq!(OrderBy::compare(&rules, &a, &b, "id"), Ordering::Greater);
        let rules = vec![OrderBy::parse("name")];
        assert_eq!(OrderBy::compare(&rules, &a, &b, "id"), Ordering::Less);
    }

    #[test]
    fn test_queryset_builder() {
        let qs = QuerySet::all()
            .filter(Condition::lookup("name__contains", "web"))
            .filter(Condition::lookup("gender", "1"))
            .order_by(["-id"])
            .slice(10, 20);
        assert_eq!(qs.ordering, vec![OrderBy::parse("-id")]);
        assert_eq!(qs.window, Some((10, 20)));
        assert!(matches!(qs.condition, Condition::And(ref items) if items.len() == 2));
    }
}
