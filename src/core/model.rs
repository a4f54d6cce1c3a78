//! Model traits and field metadata
//!
//! A model is any serializable record with an integer primary key and a small
//! static description of its fields. Everything the admin derives (column
//! headers, facet choices, form fields, URL names) comes from [`ModelMeta`].

use crate::core::error::ConfigError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// One declared choice of an enumerated field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    /// Stored value
    pub value: Value,
    /// Human-readable label
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Storage kind of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
    /// Enumerated field with declared choices
    Choice(Vec<Choice>),
    /// Single-valued relation, stored as the related primary key.
    /// Holds the related model key (`app_label.model_name`).
    ForeignKey(String),
    /// Many-valued relation, stored as an array of related primary keys
    ManyToMany(String),
}

impl FieldKind {
    /// Related model key for relation fields
    pub fn related_model(&self) -> Option<&str> {
        match self {
            FieldKind::ForeignKey(model) | FieldKind::ManyToMany(model) => Some(model),
            _ => None,
        }
    }

    pub fn is_relation(&self) -> bool {
        self.related_model().is_some()
    }

    pub fn choices(&self) -> Option<&[Choice]> {
        match self {
            FieldKind::Choice(choices) => Some(choices),
            _ => None,
        }
    }
}

/// Description of a single model field
#[derive(Debug, Clone)]
pub struct FieldMeta {
    /// Attribute name (also the serialized key)
    pub name: String,
    /// Label shown in column headers, facet titles and forms
    pub verbose_name: String,
    pub kind: FieldKind,
    /// Whether an empty form value is accepted
    pub blank: bool,
}

impl FieldMeta {
    /// Create a field whose label is the attribute name
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            verbose_name: name.clone(),
            name,
            kind,
            blank: false,
        }
    }

    pub fn verbose_name(mut self, label: impl Into<String>) -> Self {
        self.verbose_name = label.into();
        self
    }

    pub fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    /// Label of a stored choice value, if this is an enumerated field
    pub fn choice_label(&self, value: &Value) -> Option<&str> {
        self.kind.choices().and_then(|choices| {
            choices
                .iter()
                .find(|c| plain_string(&c.value) == plain_string(value))
                .map(|c| c.label.as_str())
        })
    }
}

/// Static description of a model
#[derive(Debug, Clone)]
pub struct ModelMeta {
    pub app_label: String,
    pub model_name: String,
    /// Name of the primary-key field
    pub pk_field: String,
    pub fields: Vec<FieldMeta>,
}

impl ModelMeta {
    /// Create metadata with an `id` primary key and no other fields
    pub fn new(app_label: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            model_name: model_name.into(),
            pk_field: "id".to_string(),
            fields: vec![FieldMeta::new("id", FieldKind::Integer).verbose_name("ID")],
        }
    }

    pub fn field(mut self, field: FieldMeta) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Key used to look the model up as a relation target
    pub fn key(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }

    /// Resolve a field by name; `pk` is an alias for the primary key
    pub fn get_field(&self, name: &str) -> Result<&FieldMeta, ConfigError> {
        let name = if name == "pk" { &self.pk_field } else { name };
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| ConfigError::UnknownField {
                model: self.key(),
                field: name.to_string(),
            })
    }

    /// Fields a default form edits: everything except the primary key
    pub fn editable_fields(&self) -> impl Iterator<Item = &FieldMeta> {
        self.fields.iter().filter(|f| f.name != self.pk_field)
    }
}

/// A record the admin can list, edit and delete
///
/// Attribute access goes through the serialized form, so the serde field
/// names must match the names declared in [`ModelMeta`].
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Host { #[serde(default)] id: i64, name: String, ip: String }
///
/// impl Model for Host {
///     fn meta() -> &'static ModelMeta {
///         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
///             ModelMeta::new("app", "host")
///                 .field(FieldMeta::new("name", FieldKind::Text).verbose_name("Host name"))
///                 .field(FieldMeta::new("ip", FieldKind::Text).verbose_name("IP"))
///         });
///         &META
///     }
///     fn pk(&self) -> i64 { self.id }
///     fn set_pk(&mut self, pk: i64) { self.id = pk }
/// }
/// ```
pub trait Model:
    Serialize + DeserializeOwned + Clone + fmt::Display + Send + Sync + 'static
{
    fn meta() -> &'static ModelMeta;

    /// Primary key; `0` means not yet saved
    fn pk(&self) -> i64;

    fn set_pk(&mut self, pk: i64);

    /// Serialized form used for attribute access and condition matching
    fn to_record(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Read one attribute by name
    fn field_value(&self, field: &str) -> Value {
        let field = if field == "pk" {
            Self::meta().pk_field.as_str()
        } else {
            field
        };
        self.to_record().get(field).cloned().unwrap_or(Value::Null)
    }
}

/// String form of a JSON scalar as it would appear in a query string
pub fn plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta() -> ModelMeta {
        ModelMeta::new("app", "user")
            .field(FieldMeta::new("name", FieldKind::Text).verbose_name("Name"))
            .field(FieldMeta::new(
                "gender",
                FieldKind::Choice(vec![Choice::new(1, "Male"), Choice::new(2, "Female")]),
            ))
            .field(FieldMeta::new(
                "depart",
                FieldKind::ForeignKey("app.department".to_string()),
            ))
    }

    #[test]
    fn test_get_field_resolves_pk_alias() {
        let meta = meta();
        assert_eq!(meta.get_field("pk").unwrap().name, "id");
        assert_eq!(meta.get_field("name").unwrap().verbose_name, "Name");
    }

    #[test]
    fn test_get_field_unknown_is_config_error() {
        let err = meta().get_field("age").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField { ref field, .. } if field == "age"));
    }

    #[test]
    fn test_choice_label_compares_string_forms() {
        let meta = meta();
        let gender = meta.get_field("gender").unwrap();
        assert_eq!(gender.choice_label(&json!(2)), Some("Female"));
        assert_eq!(gender.choice_label(&json!("1")), Some("Male"));
        assert_eq!(gender.choice_label(&json!(3)), None);
    }

    #[test]
    fn test_redeclaring_a_field_replaces_it() {
        let meta = meta().field(FieldMeta::new("id", FieldKind::Integer).verbose_name("Number"));
        assert_eq!(meta.fields.iter().filter(|f| f.name == "id").count(), 1);
        assert_eq!(meta.get_field("id").unwrap().verbose_name, "Number");
    }

    #[test]
    fn test_editable_fields_skip_primary_key() {
        let meta = meta();
        let names: Vec<_> = meta.editable_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "gender", "depart"]);
    }

    #[test]
    fn test_relation_kind() {
        let meta = meta();
        let depart = meta.get_field("depart").unwrap();
        assert!(depart.kind.is_relation());
        assert_eq!(depart.kind.related_model(), Some("app.department"));
        assert_eq!(meta.key(), "app.user");
    }

    #[test]
    fn test_plain_string() {
        assert_eq!(plain_string(&json!("web")), "web");
        assert_eq!(plain_string(&json!(3)), "3");
        assert_eq!(plain_string(&json!(true)), "true");
        assert_eq!(plain_string(&Value::Null), "");
    }
}
