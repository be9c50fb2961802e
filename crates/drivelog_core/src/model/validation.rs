//! Structured validation failures.
//!
//! # Responsibility
//! - Describe which field violated which constraint.
//! - Classify range/enum violations separately from shape violations.
//!
//! # Invariants
//! - A `ValidationError` always carries at least one violation.
//! - Violations keep the order in which fields were checked.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// One constraint a field value can break.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Field is missing or null where a value is required.
    Required,
    /// Value has the wrong JSON type (`expected` is `string|integer|...`).
    Type { expected: &'static str },
    /// String or array is shorter than allowed.
    MinLength { min: usize },
    /// String or array is longer than allowed.
    MaxLength { max: usize },
    /// Number is outside `[min, max]`.
    Range { min: f64, max: f64 },
    /// String is not one of the allowed enum values.
    OneOf { allowed: &'static [&'static str] },
    /// String does not parse as the named format (`uuid`, `datetime`).
    Format { format: &'static str },
}

impl Constraint {
    /// Returns whether this violation is a numeric/enum domain error.
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. } | Self::OneOf { .. })
    }

    /// Stable machine-readable code for host-side error mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Type { .. } => "type",
            Self::MinLength { .. } => "min_length",
            Self::MaxLength { .. } => "max_length",
            Self::Range { .. } => "range",
            Self::OneOf { .. } => "one_of",
            Self::Format { .. } => "format",
        }
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "is required"),
            Self::Type { expected } => write!(f, "must be of type {expected}"),
            Self::MinLength { min } => write!(f, "must have at least {min} character(s)"),
            Self::MaxLength { max } => write!(f, "must have at most {max} character(s)"),
            Self::Range { min, max } => write!(f, "must be between {min} and {max}"),
            Self::OneOf { allowed } => write!(f, "must be one of {}", allowed.join("|")),
            Self::Format { format } => write!(f, "must be a valid {format}"),
        }
    }
}

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    /// Dotted field path, e.g. `address.city` or `interests[2]`.
    pub field: String,
    pub constraint: Constraint,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            field: field.into(),
            constraint,
        }
    }
}

impl Display for FieldViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.constraint)
    }
}

/// Validation failure listing every violated field constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Builds an error from collected violations.
    ///
    /// Returns `None` when nothing was violated.
    pub fn from_violations(violations: Vec<FieldViolation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    /// Shorthand for a single violation.
    pub fn single(field: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, constraint)],
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Returns violations reported for exactly `field`.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldViolation> {
        self.violations
            .iter()
            .filter(move |violation| violation.field == field)
    }

    /// Returns whether any violation is a range/enum error.
    pub fn has_range_error(&self) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.constraint.is_range())
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: ")?;
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::{Constraint, FieldViolation, ValidationError};

    #[test]
    fn empty_violation_list_is_not_an_error() {
        assert!(ValidationError::from_violations(Vec::new()).is_none());
    }

    #[test]
    fn range_and_enum_are_classified_as_range_errors() {
        assert!(Constraint::Range { min: 1.0, max: 5.0 }.is_range());
        assert!(Constraint::OneOf { allowed: &["a"] }.is_range());
        assert!(!Constraint::Required.is_range());
        assert!(!Constraint::MinLength { min: 1 }.is_range());
    }

    #[test]
    fn display_joins_all_violations() {
        let err = ValidationError::from_violations(vec![
            FieldViolation::new("rating", Constraint::Range { min: 1.0, max: 5.0 }),
            FieldViolation::new("place_name", Constraint::MinLength { min: 1 }),
        ])
        .expect("two violations");

        let text = err.to_string();
        assert!(text.contains("rating must be between 1 and 5"));
        assert!(text.contains("place_name must have at least 1 character(s)"));
        assert!(err.has_range_error());
        assert_eq!(err.for_field("rating").count(), 1);
    }
}
