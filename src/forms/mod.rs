//! Model forms
//!
//! A [`ModelFormSpec`] says which fields of a model a form edits and how the
//! submitted text is filtered and validated. A [`StarkModelForm`] binds a spec
//! to an instance and/or submitted data, validates it into a cleaned model and
//! persists it through a data source. Every rendered field carries the
//! `form-control` class.

pub mod filters;
pub mod validators;

pub use filters::InputFilter;
pub use validators::Validator;

use crate::core::model::plain_string;
use crate::core::{ConfigError, DataSource, FieldKind, FieldMeta, Model, QueryDict, StarkError};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::marker::PhantomData;
use std::sync::Arc;

const REQUIRED: &str = "This field is required.";

/// Declaration of a form over a model
pub struct ModelFormSpec<M: Model> {
    /// `None` means every editable field
    fields: Option<Vec<String>>,
    validators: Vec<(String, Validator)>,
    filters: Vec<(String, InputFilter)>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Clone for ModelFormSpec<M> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            validators: self.validators.clone(),
            filters: self.filters.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> Default for ModelFormSpec<M> {
    fn default() -> Self {
        Self::all()
    }
}

impl<M: Model> ModelFormSpec<M> {
    /// Form over every field except the primary key
    pub fn all() -> Self {
        Self {
            fields: None,
            validators: Vec::new(),
            filters: Vec::new(),
            _model: PhantomData,
        }
    }

    /// Restrict the form to the listed fields, in that order
    pub fn fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn validator<F>(mut self, field: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push((field.into(), Arc::new(validator)));
        self
    }

    pub fn filter<F>(mut self, field: impl Into<String>, filter: F) -> Self
    where
        F: Fn(&str, Value) -> Value + Send + Sync + 'static,
    {
        self.filters.push((field.into(), Arc::new(filter)));
        self
    }

    /// Resolve the form's fields against the model metadata
    pub fn field_metas(&self) -> Result<Vec<&'static FieldMeta>, ConfigError> {
        let meta = M::meta();
        match &self.fields {
            Some(names) => names.iter().map(|name| meta.get_field(name)).collect(),
            None => Ok(meta.editable_fields().collect()),
        }
    }
}

/// One field as handed to the template layer
#[derive(Debug, Clone, Serialize)]
pub struct BoundField {
    pub name: String,
    pub label: String,
    pub widget: &'static str,
    pub value: Value,
    pub attrs: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<crate::core::Choice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_model: Option<String>,
    pub required: bool,
    pub errors: Vec<String>,
}

/// A form bound to one model type
pub struct StarkModelForm<M: Model> {
    spec: ModelFormSpec<M>,
    instance: Option<M>,
    data: Option<QueryDict>,
    errors: IndexMap<String, Vec<String>>,
    non_field_errors: Vec<String>,
    cleaned: Option<M>,
}

impl<M: Model> StarkModelForm<M> {
    /// Empty form (add view, GET)
    pub fn unbound(spec: ModelFormSpec<M>) -> Self {
        Self {
            spec,
            instance: None,
            data: None,
            errors: IndexMap::new(),
            non_field_errors: Vec::new(),
            cleaned: None,
        }
    }

    /// Form showing an existing row (edit view, GET)
    pub fn for_instance(spec: ModelFormSpec<M>, instance: M) -> Self {
        Self {
            instance: Some(instance),
            ..Self::unbound(spec)
        }
    }

    /// Form carrying submitted data, optionally over an existing row
    pub fn bound(spec: ModelFormSpec<M>, data: QueryDict, instance: Option<M>) -> Self {
        Self {
            instance,
            data: Some(data),
            ..Self::unbound(spec)
        }
    }

    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    pub fn instance(&self) -> Option<&M> {
        self.instance.as_ref()
    }

    pub fn errors(&self) -> &IndexMap<String, Vec<String>> {
        &self.errors
    }

    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }

    /// Model built from valid data
    pub fn cleaned(&self) -> Option<&M> {
        self.cleaned.as_ref()
    }

    /// Mutable access for save hooks that fill system-managed fields
    pub fn cleaned_mut(&mut self) -> Option<&mut M> {
        self.cleaned.as_mut()
    }

    /// Validate submitted data into a cleaned model
    ///
    /// An unbound form is never valid. Unknown field names in the spec are a
    /// configuration error.
    pub fn is_valid(&mut self) -> Result<bool, StarkError> {
        let Some(data) = self.data.clone() else {
            return Ok(false);
        };
        self.errors.clear();
        self.non_field_errors.clear();
        self.cleaned = None;

        let mut record = match &self.instance {
            Some(instance) => match instance.to_record() {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            None => {
                let mut record = Map::new();
                record.insert(M::meta().pk_field.clone(), json!(0));
                record
            }
        };

        for field in self.spec.field_metas()? {
            match self.clean_field(field, &data) {
                Ok(value) => {
                    record.insert(field.name.clone(), value);
                }
                Err(message) => self
                    .errors
                    .entry(field.name.clone())
                    .or_default()
                    .push(message),
            }
        }

        if !self.errors.is_empty() {
            return Ok(false);
        }

        match serde_json::from_value::<M>(Value::Object(record)) {
            Ok(model) => {
                self.cleaned = Some(model);
                Ok(true)
            }
            Err(e) => {
                self.non_field_errors.push(e.to_string());
                Ok(false)
            }
        }
    }

    fn clean_field(&self, field: &FieldMeta, data: &QueryDict) -> Result<Value, String> {
        let name = field.name.as_str();

        let value = match &field.kind {
            FieldKind::Boolean => {
                let raw = data.get(name).unwrap_or_default().to_lowercase();
                Value::Bool(matches!(raw.as_str(), "on" | "true" | "1" | "yes"))
            }
            FieldKind::ManyToMany(_) => {
                let raw: Vec<String> = data
                    .get_list(name)
                    .into_iter()
                    .filter(|v| !v.trim().is_empty())
                    .collect();
                if raw.is_empty() && !field.blank {
                    return Err(REQUIRED.to_string());
                }
                let mut keys = Vec::with_capacity(raw.len());
                for item in raw {
                    let pk = item
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| format!("'{}' is not a valid primary key.", item))?;
                    keys.push(Value::from(pk));
                }
                Value::Array(keys)
            }
            kind => {
                let submitted = data.get(name).unwrap_or_default().to_string();
                let raw = self.apply_filters(name, Value::String(submitted));
                let text = plain_string(&raw);
                if text.trim().is_empty() {
                    if field.blank {
                        return Ok(match kind {
                            FieldKind::Text => Value::String(String::new()),
                            _ => Value::Null,
                        });
                    }
                    return Err(REQUIRED.to_string());
                }
                convert(kind, &text)?
            }
        };

        for (target, validator) in &self.spec.validators {
            if target == name {
                validator(name, &value)?;
            }
        }
        Ok(value)
    }

    fn apply_filters(&self, name: &str, value: Value) -> Value {
        self.spec
            .filters
            .iter()
            .filter(|(target, _)| target == name)
            .fold(value, |acc, (_, filter)| filter(name, acc))
    }

    /// Persist the cleaned model
    ///
    /// Calling this on a form that has not validated is an internal error.
    pub async fn save(&self, source: &dyn DataSource<M>) -> Result<M, StarkError> {
        let cleaned = self.cleaned.clone().ok_or_else(|| {
            StarkError::Internal("save() called on a form without cleaned data".to_string())
        })?;
        Ok(source.save(cleaned).await?)
    }

    /// Fields with their current values, widget attrs and errors
    pub fn bound_fields(&self) -> Result<Vec<BoundField>, StarkError> {
        let instance = self.instance.as_ref().map(Model::to_record);
        let mut fields = Vec::new();
        for field in self.spec.field_metas()? {
            let value = match (&self.data, &instance) {
                (Some(data), _) => match field.kind {
                    FieldKind::ManyToMany(_) => json!(data.get_list(&field.name)),
                    _ => data.get(&field.name).map(Value::from).unwrap_or(Value::Null),
                },
                (None, Some(record)) => record.get(&field.name).cloned().unwrap_or(Value::Null),
                (None, None) => Value::Null,
            };

            let mut attrs = IndexMap::new();
            attrs.insert("class".to_string(), "form-control".to_string());

            fields.push(BoundField {
                name: field.name.clone(),
                label: field.verbose_name.clone(),
                widget: widget_for(&field.kind),
                value,
                attrs,
                choices: field.kind.choices().map(<[_]>::to_vec).unwrap_or_default(),
                related_model: field.kind.related_model().map(str::to_string),
                required: !field.blank && field.kind != FieldKind::Boolean,
                errors: self.errors.get(&field.name).cloned().unwrap_or_default(),
            });
        }
        Ok(fields)
    }

    /// Render context for `stark/change.html`
    pub fn to_context(&self) -> Result<Value, StarkError> {
        Ok(json!({
            "fields": self.bound_fields()?,
            "non_field_errors": self.non_field_errors,
            "is_bound": self.is_bound(),
        }))
    }
}

fn widget_for(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "text",
        FieldKind::Integer | FieldKind::Float => "number",
        FieldKind::Boolean => "checkbox",
        FieldKind::Choice(_) | FieldKind::ForeignKey(_) => "select",
        FieldKind::ManyToMany(_) => "select_multiple",
    }
}

fn convert(kind: &FieldKind, text: &str) -> Result<Value, String> {
    let text = text.trim();
    match kind {
        FieldKind::Text => Ok(Value::String(text.to_string())),
        FieldKind::Integer => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| "Enter a whole number.".to_string()),
        FieldKind::ForeignKey(_) => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("'{}' is not a valid primary key.", text)),
        FieldKind::Float => text
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| "Enter a number.".to_string()),
        FieldKind::Choice(choices) => choices
            .iter()
            .find(|c| plain_string(&c.value) == text)
            .map(|c| c.value.clone())
            .ok_or_else(|| {
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    text
                )
            }),
        FieldKind::Boolean | FieldKind::ManyToMany(_) => {
            unreachable!("handled before scalar conversion")
        }
    }
}
