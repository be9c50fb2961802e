//! Declarative object schemas for boundary validation.
//!
//! # Responsibility
//! - Describe the accepted shape of a record as a list of typed fields.
//! - Derive projections from one canonical schema (`omit`, `partial`).
//! - Validate untyped JSON input and return a normalized object or every
//!   violated field constraint.
//!
//! # Invariants
//! - Validation is pure: the same input always yields the same outcome.
//! - Unknown keys never reach the normalized output.
//! - Violations are collected for all fields, not only the first.

use crate::model::validation::{Constraint, FieldViolation, ValidationError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Path used for violations that concern the whole input value.
pub const ROOT_PATH: &str = "$";

/// Value kind accepted by one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// UTF-8 string; lengths are counted in characters.
    Text { min: usize, max: Option<usize> },
    /// JSON integer within `[min, max]`.
    Integer { min: i64, max: i64 },
    /// JSON number within `[min, max]`.
    Number { min: f64, max: f64 },
    /// RFC 3339 / ISO-8601 datetime string.
    DateTime,
    /// Hyphenated UUID string.
    Uuid,
    /// String restricted to a closed value set.
    Enum(&'static [&'static str]),
    /// Nested object.
    Object(ObjectSchema),
    /// Homogeneous array with an upper bound on its length.
    Array { item: Box<FieldKind>, max_items: usize },
}

impl FieldKind {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } | Self::DateTime | Self::Uuid | Self::Enum(_) => "string",
            Self::Integer { .. } => "integer",
            Self::Number { .. } => "number",
            Self::Object(_) => "object",
            Self::Array { .. } => "array",
        }
    }
}

/// One named field of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Missing or null values are rejected when set.
    pub required: bool,
    /// Explicit `null` is accepted when set.
    pub nullable: bool,
}

impl Field {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            nullable: false,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Ordered set of fields describing one record shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<Field>,
}

impl ObjectSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns field names in declaration order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name).collect()
    }

    /// Derives a schema without the named fields.
    pub fn omit(&self, names: &[&str]) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .filter(|field| !names.contains(&field.name))
                .cloned()
                .collect(),
        }
    }

    /// Derives a patch schema where every field is optional.
    ///
    /// Fields that were already optional also accept `null`, which a patch
    /// uses to clear the stored value.
    pub fn partial(&self) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .map(|field| Field {
                    name: field.name,
                    kind: field.kind.clone(),
                    required: false,
                    nullable: field.nullable || !field.required,
                })
                .collect(),
        }
    }

    /// Validates `value` and returns the normalized object.
    ///
    /// # Errors
    /// - Returns every violated field constraint when input is invalid.
    pub fn validate(&self, value: &Value) -> Result<Value, ValidationError> {
        let mut violations = Vec::new();
        let normalized = match value.as_object() {
            Some(map) => self.check_object(map, "", &mut violations),
            None => {
                violations.push(FieldViolation::new(
                    ROOT_PATH,
                    Constraint::Type { expected: "object" },
                ));
                Map::new()
            }
        };

        match ValidationError::from_violations(violations) {
            Some(err) => Err(err),
            None => Ok(Value::Object(normalized)),
        }
    }

    /// Validates `value` and decodes the normalized object into `T`.
    pub fn parse<T: DeserializeOwned>(&self, value: &Value) -> Result<T, ValidationError> {
        let normalized = self.validate(value)?;
        serde_json::from_value(normalized)
            .map_err(|_| ValidationError::single(ROOT_PATH, Constraint::Type { expected: "object" }))
    }

    fn check_object(
        &self,
        map: &Map<String, Value>,
        prefix: &str,
        violations: &mut Vec<FieldViolation>,
    ) -> Map<String, Value> {
        let mut normalized = Map::new();
        for field in &self.fields {
            let path = join_path(prefix, field.name);
            match map.get(field.name) {
                None => {
                    if field.required {
                        violations.push(FieldViolation::new(path, Constraint::Required));
                    }
                }
                Some(Value::Null) => {
                    if field.nullable {
                        normalized.insert(field.name.to_string(), Value::Null);
                    } else if field.required {
                        violations.push(FieldViolation::new(path, Constraint::Required));
                    } else {
                        violations.push(FieldViolation::new(
                            path,
                            Constraint::Type {
                                expected: field.kind.type_name(),
                            },
                        ));
                    }
                }
                Some(value) => {
                    if let Some(checked) = check_value(&field.kind, value, &path, violations) {
                        normalized.insert(field.name.to_string(), checked);
                    }
                }
            }
        }
        normalized
    }
}

fn check_value(
    kind: &FieldKind,
    value: &Value,
    path: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<Value> {
    let type_violation = |violations: &mut Vec<FieldViolation>| {
        violations.push(FieldViolation::new(
            path,
            Constraint::Type {
                expected: kind.type_name(),
            },
        ));
        None
    };

    match kind {
        FieldKind::Text { min, max } => {
            let Some(text) = value.as_str() else {
                return type_violation(violations);
            };
            let length = text.chars().count();
            if length < *min {
                violations.push(FieldViolation::new(path, Constraint::MinLength { min: *min }));
                return None;
            }
            if let Some(max) = max {
                if length > *max {
                    violations.push(FieldViolation::new(path, Constraint::MaxLength { max: *max }));
                    return None;
                }
            }
            Some(value.clone())
        }
        FieldKind::Integer { min, max } => {
            let range = Constraint::Range {
                min: *min as f64,
                max: *max as f64,
            };
            if let Some(number) = value.as_i64() {
                if number < *min || number > *max {
                    violations.push(FieldViolation::new(path, range));
                    return None;
                }
                return Some(value.clone());
            }
            if value.is_u64() {
                violations.push(FieldViolation::new(path, range));
                return None;
            }
            // `5.0` from JS number serialization; normalized to `5`.
            match value.as_f64() {
                Some(number) if number.is_finite() && number.fract() == 0.0 => {
                    if number < *min as f64 || number > *max as f64 {
                        violations.push(FieldViolation::new(path, range));
                        return None;
                    }
                    Some(Value::from(number as i64))
                }
                _ => type_violation(violations),
            }
        }
        FieldKind::Number { min, max } => {
            let Some(number) = value.as_f64() else {
                return type_violation(violations);
            };
            if !number.is_finite() || number < *min || number > *max {
                violations.push(FieldViolation::new(
                    path,
                    Constraint::Range {
                        min: *min,
                        max: *max,
                    },
                ));
                return None;
            }
            Some(value.clone())
        }
        FieldKind::DateTime => {
            let Some(text) = value.as_str() else {
                return type_violation(violations);
            };
            match DateTime::parse_from_rfc3339(text) {
                Ok(parsed) => Some(Value::String(
                    parsed
                        .with_timezone(&Utc)
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                )),
                Err(_) => {
                    violations.push(FieldViolation::new(
                        path,
                        Constraint::Format { format: "datetime" },
                    ));
                    None
                }
            }
        }
        FieldKind::Uuid => {
            let Some(text) = value.as_str() else {
                return type_violation(violations);
            };
            match Uuid::parse_str(text) {
                Ok(parsed) => Some(Value::String(parsed.hyphenated().to_string())),
                Err(_) => {
                    violations.push(FieldViolation::new(path, Constraint::Format { format: "uuid" }));
                    None
                }
            }
        }
        FieldKind::Enum(allowed) => {
            let Some(text) = value.as_str() else {
                return type_violation(violations);
            };
            if allowed.contains(&text) {
                Some(value.clone())
            } else {
                violations.push(FieldViolation::new(path, Constraint::OneOf { allowed }));
                None
            }
        }
        FieldKind::Object(schema) => {
            let Some(map) = value.as_object() else {
                return type_violation(violations);
            };
            let before = violations.len();
            let normalized = schema.check_object(map, path, violations);
            (violations.len() == before).then_some(Value::Object(normalized))
        }
        FieldKind::Array { item, max_items } => {
            let Some(items) = value.as_array() else {
                return type_violation(violations);
            };
            if items.len() > *max_items {
                violations.push(FieldViolation::new(
                    path,
                    Constraint::MaxLength { max: *max_items },
                ));
                return None;
            }
            let before = violations.len();
            let checked = items
                .iter()
                .enumerate()
                .filter_map(|(index, element)| {
                    check_value(item, element, &format!("{path}[{index}]"), violations)
                })
                .collect::<Vec<_>>();
            (violations.len() == before).then_some(Value::Array(checked))
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Deserializes a present patch value, keeping explicit `null` as `Some(None)`.
///
/// Pair with `#[serde(default)]` so absent keys stay `None`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{Field, FieldKind, ObjectSchema};
    use crate::model::validation::Constraint;
    use serde_json::json;

    fn sample_schema() -> ObjectSchema {
        ObjectSchema::new(vec![
            Field::required("name", FieldKind::Text { min: 1, max: Some(5) }),
            Field::required("count", FieldKind::Integer { min: 0, max: 3 }),
            Field::optional("note", FieldKind::Text { min: 0, max: None }),
            Field::optional("seen_at", FieldKind::DateTime).nullable(),
            Field::optional(
                "tags",
                FieldKind::Array {
                    item: Box::new(FieldKind::Enum(&["a", "b"])),
                    max_items: 2,
                },
            ),
        ])
    }

    #[test]
    fn validate_strips_unknown_keys_and_normalizes_datetime() {
        let normalized = sample_schema()
            .validate(&json!({
                "name": "abc",
                "count": 2,
                "seen_at": "2024-05-01T19:00:00+09:00",
                "extra": true
            }))
            .expect("input should validate");

        assert!(normalized.get("extra").is_none());
        assert_eq!(normalized["seen_at"], "2024-05-01T10:00:00Z");
    }

    #[test]
    fn validate_collects_every_violation() {
        let err = sample_schema()
            .validate(&json!({
                "name": "",
                "count": 1.5,
                "note": null,
                "tags": ["a", "z"]
            }))
            .expect_err("input should fail");

        let fields = err
            .violations()
            .iter()
            .map(|violation| violation.field.as_str())
            .collect::<Vec<_>>();
        assert_eq!(fields, vec!["name", "count", "note", "tags[1]"]);
        assert_eq!(
            err.violations()[1].constraint,
            Constraint::Type { expected: "integer" }
        );
    }

    #[test]
    fn integral_float_normalizes_to_integer() {
        let normalized = sample_schema()
            .validate(&json!({ "name": "abc", "count": 2.0 }))
            .expect("integral float should validate");
        assert!(normalized["count"].is_i64());
        assert_eq!(normalized["count"], json!(2));
    }

    #[test]
    fn integer_outside_i64_is_a_range_violation() {
        let err = sample_schema()
            .validate(&json!({ "name": "a", "count": u64::MAX }))
            .expect_err("huge integer should fail");
        assert!(err.has_range_error());
    }

    #[test]
    fn non_object_input_is_rejected_at_root() {
        let err = sample_schema()
            .validate(&json!([1, 2]))
            .expect_err("array input should fail");
        assert_eq!(err.violations()[0].field, "$");
    }

    #[test]
    fn omit_and_partial_transform_field_set() {
        let schema = sample_schema();
        let omitted = schema.omit(&["count"]);
        assert_eq!(
            omitted.field_names(),
            vec!["name", "note", "seen_at", "tags"]
        );

        let partial = omitted.partial();
        assert!(partial.fields().iter().all(|field| !field.required));
        assert!(partial.field("note").expect("note field").nullable);
        assert!(!partial.field("name").expect("name field").nullable);
        partial.validate(&json!({})).expect("empty patch is valid");
    }
}
