//! Reusable input filters
//!
//! Filters transform submitted text before it is converted and validated.

use serde_json::Value;
use std::sync::Arc;

/// Shared input filter callable
pub type InputFilter = Arc<dyn Fn(&str, Value) -> Value + Send + Sync>;

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    }
}

/// Filter: convert string to uppercase
pub fn uppercase() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Value::String(s.to_uppercase()),
        other => other,
    }
}

/// Filter: convert string to lowercase
pub fn lowercase() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trim_removes_whitespace() {
        let f = trim();
        assert_eq!(f("name", json!("  hello  ")), json!("hello"));
        assert_eq!(f("name", json!("   ")), json!(""));
    }

    #[test]
    fn test_case_filters() {
        assert_eq!(uppercase()("code", json!("Hello World")), json!("HELLO WORLD"));
        assert_eq!(lowercase()("email", json!("Hello@WORLD.com")), json!("hello@world.com"));
    }

    #[test]
    fn test_non_string_passthrough() {
        assert_eq!(trim()("age", json!(42)), json!(42));
        assert_eq!(uppercase()("flag", json!(true)), json!(true));
        assert_eq!(lowercase()("note", json!(null)), json!(null));
    }
}
