//! Synthetic persona records used as mock recommendation data.
//!
//! # Responsibility
//! - Describe personas (demographics, places, lifestyle, preferences).
//! - Describe persona profiles (persona plus health/behavior metrics).
//! - Validate mock data files before the app consumes them.
//!
//! # Invariants
//! - Enumerated attributes are closed sets; unknown values are rejected.
//! - Numeric attributes are range-bounded.
//! - Records are immutable once generated; the app never mutates them.

use crate::model::place::{address_schema, coordinates_schema, Address, Coordinates};
use crate::model::schema::{Field, FieldKind, ObjectSchema};
use crate::model::validation::ValidationError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub const AGE_MIN: i64 = 18;
pub const AGE_MAX: i64 = 100;
pub const LIST_MAX_ITEMS: usize = 20;
pub const LIST_ITEM_MAX_CHARS: usize = 50;

/// Declares a closed string enum with its wire values.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $variant:ident => $wire:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every accepted wire value.
            pub const ALL: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $( $wire => Ok(Self::$variant), )+
                    _ => Err(ValidationError::single(
                        stringify!($name),
                        crate::model::validation::Constraint::OneOf { allowed: Self::ALL },
                    )),
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    Gender {
        Male => "male",
        Female => "female",
        NonBinary => "non_binary",
        Unspecified => "unspecified",
    }
}

string_enum! {
    WorkStyle {
        Office => "office",
        Remote => "remote",
        Hybrid => "hybrid",
        Shift => "shift",
        Freelance => "freelance",
        Student => "student",
        Retired => "retired",
    }
}

string_enum! {
    CommuteMode {
        Car => "car",
        Train => "train",
        Bus => "bus",
        Bicycle => "bicycle",
        Walk => "walk",
        Mixed => "mixed",
    }
}

string_enum! {
    Household {
        Single => "single",
        Couple => "couple",
        FamilyWithKids => "family_with_kids",
        Shared => "shared",
        WithParents => "with_parents",
    }
}

string_enum! {
    BudgetRange {
        Low => "low",
        Medium => "medium",
        High => "high",
        Luxury => "luxury",
    }
}

string_enum! {
    TravelStyle {
        Relaxed => "relaxed",
        Adventurous => "adventurous",
        Cultural => "cultural",
        Gourmet => "gourmet",
        Efficient => "efficient",
    }
}

string_enum! {
    ActivityLevel {
        Sedentary => "sedentary",
        Light => "light",
        Moderate => "moderate",
        Active => "active",
        VeryActive => "very_active",
    }
}

string_enum! {
    VisitFrequency {
        Rarely => "rarely",
        Monthly => "monthly",
        Weekly => "weekly",
        Daily => "daily",
    }
}

string_enum! {
    /// Preferred part of the day for outings.
    TimeOfDay {
        Morning => "morning",
        Afternoon => "afternoon",
        Evening => "evening",
        Night => "night",
    }
}

/// A named place tied to a persona (home, workplace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaPlace {
    pub address: Address,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifestyle {
    pub work_style: WorkStyle,
    pub commute_mode: CommuteMode,
    pub household: Household,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub budget_range: BudgetRange,
    pub travel_style: TravelStyle,
    #[serde(default)]
    pub favorite_cuisines: Vec<String>,
}

/// Synthetic user description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: Uuid,
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub occupation: String,
    pub home: PersonaPlace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work: Option<PersonaPlace>,
    pub lifestyle: Lifestyle,
    #[serde(default)]
    pub interests: Vec<String>,
    pub preferences: Preferences,
}

/// Synthetic health metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub activity_level: ActivityLevel,
    pub sleep_hours: f64,
    pub daily_steps: u32,
    /// Self-reported stress, 1 (calm) to 10.
    pub stress_level: u8,
}

/// Synthetic behavior metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorMetrics {
    pub driving_hours_per_week: f64,
    pub visit_frequency: VisitFrequency,
    pub preferred_time_of_day: TimeOfDay,
}

/// Persona enriched with health and behavior metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub persona: Persona,
    pub health: HealthMetrics,
    pub behavior: BehaviorMetrics,
}

fn short_text_list() -> FieldKind {
    FieldKind::Array {
        item: Box::new(FieldKind::Text {
            min: 1,
            max: Some(LIST_ITEM_MAX_CHARS),
        }),
        max_items: LIST_MAX_ITEMS,
    }
}

static PERSONA_PLACE_SCHEMA: Lazy<ObjectSchema> = Lazy::new(|| {
    ObjectSchema::new(vec![
        Field::required("address", FieldKind::Object(address_schema().clone())),
        Field::required(
            "coordinates",
            FieldKind::Object(coordinates_schema().clone()),
        ),
    ])
});

static PERSONA_SCHEMA: Lazy<ObjectSchema> = Lazy::new(|| {
    let name = FieldKind::Text {
        min: 1,
        max: Some(100),
    };
    ObjectSchema::new(vec![
        Field::required("id", FieldKind::Uuid),
        Field::required("name", name.clone()),
        Field::required(
            "age",
            FieldKind::Integer {
                min: AGE_MIN,
                max: AGE_MAX,
            },
        ),
        Field::required("gender", FieldKind::Enum(Gender::ALL)),
        Field::required("occupation", name),
        Field::required("home", FieldKind::Object(PERSONA_PLACE_SCHEMA.clone())),
        Field::optional("work", FieldKind::Object(PERSONA_PLACE_SCHEMA.clone())),
        Field::required(
            "lifestyle",
            FieldKind::Object(ObjectSchema::new(vec![
                Field::required("work_style", FieldKind::Enum(WorkStyle::ALL)),
                Field::required("commute_mode", FieldKind::Enum(CommuteMode::ALL)),
                Field::required("household", FieldKind::Enum(Household::ALL)),
            ])),
        ),
        Field::optional("interests", short_text_list()),
        Field::required(
            "preferences",
            FieldKind::Object(ObjectSchema::new(vec![
                Field::required("budget_range", FieldKind::Enum(BudgetRange::ALL)),
                Field::required("travel_style", FieldKind::Enum(TravelStyle::ALL)),
                Field::optional("favorite_cuisines", short_text_list()),
            ])),
        ),
    ])
});

static PERSONA_PROFILE_SCHEMA: Lazy<ObjectSchema> = Lazy::new(|| {
    ObjectSchema::new(vec![
        Field::required("persona", FieldKind::Object(PERSONA_SCHEMA.clone())),
        Field::required(
            "health",
            FieldKind::Object(ObjectSchema::new(vec![
                Field::required("activity_level", FieldKind::Enum(ActivityLevel::ALL)),
                Field::required("sleep_hours", FieldKind::Number { min: 0.0, max: 24.0 }),
                Field::required(
                    "daily_steps",
                    FieldKind::Integer {
                        min: 0,
                        max: 100_000,
                    },
                ),
                Field::required("stress_level", FieldKind::Integer { min: 1, max: 10 }),
            ])),
        ),
        Field::required(
            "behavior",
            FieldKind::Object(ObjectSchema::new(vec![
                Field::required(
                    "driving_hours_per_week",
                    FieldKind::Number {
                        min: 0.0,
                        max: 168.0,
                    },
                ),
                Field::required("visit_frequency", FieldKind::Enum(VisitFrequency::ALL)),
                Field::required("preferred_time_of_day", FieldKind::Enum(TimeOfDay::ALL)),
            ])),
        ),
    ])
});

pub fn persona_schema() -> &'static ObjectSchema {
    &PERSONA_SCHEMA
}

pub fn persona_profile_schema() -> &'static ObjectSchema {
    &PERSONA_PROFILE_SCHEMA
}

impl Persona {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        persona_schema().validate(&value).map(|_| ())
    }

    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        persona_schema().parse(value)
    }
}

impl PersonaProfile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        persona_profile_schema().validate(&value).map(|_| ())
    }

    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        persona_profile_schema().parse(value)
    }
}

/// Validation failure of one record inside a mock data file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileLoadError {
    /// Zero-based record index; `None` when the file itself is malformed.
    pub index: Option<usize>,
    pub error: ValidationError,
}

impl Display for ProfileLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(index) => write!(f, "profile #{index}: {}", self.error),
            None => write!(f, "profile file: {}", self.error),
        }
    }
}

impl std::error::Error for ProfileLoadError {}

/// Parses a JSON array of persona profiles, validating every record.
///
/// # Errors
/// - Returns the first invalid record with its index.
/// - Returns an index-less error when the text is not a JSON array.
pub fn parse_profiles(json: &str) -> Result<Vec<PersonaProfile>, ProfileLoadError> {
    use crate::model::schema::ROOT_PATH;
    use crate::model::validation::Constraint;

    let not_an_array = || ProfileLoadError {
        index: None,
        error: ValidationError::single(ROOT_PATH, Constraint::Type { expected: "array" }),
    };

    let value: Value = serde_json::from_str(json).map_err(|_| not_an_array())?;
    let records = value.as_array().ok_or_else(not_an_array)?;

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            PersonaProfile::parse(record).map_err(|error| ProfileLoadError {
                index: Some(index),
                error,
            })
        })
        .collect()
}
