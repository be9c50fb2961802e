//! Location value types shared by journal entries and personas.
//!
//! # Invariants
//! - `Coordinates.lat` is within [-90, 90] and `lng` within [-180, 180].
//! - `Address` keeps `country`, `prefecture` and `city` non-empty.

use crate::model::schema::{Field, FieldKind, ObjectSchema};
use crate::model::validation::ValidationError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const LAT_MIN: f64 = -90.0;
pub const LAT_MAX: f64 = 90.0;
pub const LNG_MIN: f64 = -180.0;
pub const LNG_MAX: f64 = 180.0;

static COORDINATES_SCHEMA: Lazy<ObjectSchema> = Lazy::new(|| {
    ObjectSchema::new(vec![
        Field::required(
            "lat",
            FieldKind::Number {
                min: LAT_MIN,
                max: LAT_MAX,
            },
        ),
        Field::required(
            "lng",
            FieldKind::Number {
                min: LNG_MIN,
                max: LNG_MAX,
            },
        ),
    ])
});

static ADDRESS_SCHEMA: Lazy<ObjectSchema> = Lazy::new(|| {
    let non_empty = FieldKind::Text { min: 1, max: None };
    ObjectSchema::new(vec![
        Field::required("country", non_empty.clone()),
        Field::required("prefecture", non_empty.clone()),
        Field::required("city", non_empty),
        Field::optional("detail", FieldKind::Text { min: 0, max: None }),
    ])
});

/// Accepted shape of a latitude/longitude pair.
pub fn coordinates_schema() -> &'static ObjectSchema {
    &COORDINATES_SCHEMA
}

/// Accepted shape of a postal address.
pub fn address_schema() -> &'static ObjectSchema {
    &ADDRESS_SCHEMA
}

/// Immutable latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Builds a range-checked coordinate pair.
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        let coordinates = Self { lat, lng };
        coordinates.validate()?;
        Ok(coordinates)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        // Non-finite floats serialize as JSON null and fail as `Required`.
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        coordinates_schema().validate(&value).map(|_| ())
    }

    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        coordinates_schema().parse(value)
    }
}

/// Immutable postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub country: String,
    pub prefecture: String,
    pub city: String,
    /// Street, building or free-form remainder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Address {
    pub fn new(
        country: impl Into<String>,
        prefecture: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            country: country.into(),
            prefecture: prefecture.into(),
            city: city.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        address_schema().validate(&value).map(|_| ())
    }

    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        address_schema().parse(value)
    }
}
