//! Journal entry domain model and its input projections.
//!
//! # Responsibility
//! - Define the canonical journal entry record.
//! - Derive the create/update projections from the same field list, both
//!   as typed structs and as validation schemas.
//! - Own lifecycle helpers (creation, patching, sync marker).
//!
//! # Invariants
//! - `id` is stable and never reused for another entry.
//! - `rating` is an integer within [1, 5].
//! - `place_name` is 1..=100 characters, `notes` at most 500.
//! - `synced_at == None` means the entry was not pushed to a device yet.
//! - Timestamps carry millisecond precision.

use crate::model::place::{address_schema, coordinates_schema, Address, Coordinates};
use crate::model::schema::{Field, FieldKind, ObjectSchema};
use crate::model::validation::{Constraint, ValidationError};
use chrono::{DateTime, SubsecRound, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Stable identifier of a journal entry.
pub type EntryId = Uuid;

pub const PLACE_NAME_MAX_CHARS: usize = 100;
pub const NOTES_MAX_CHARS: usize = 500;
pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 5;

/// Fields assigned by the core when an entry is created.
pub const ASSIGNED_FIELDS: &[&str] = &["id", "created_at", "updated_at"];

static JOURNAL_ENTRY_SCHEMA: Lazy<ObjectSchema> = Lazy::new(|| {
    ObjectSchema::new(vec![
        Field::required("id", FieldKind::Uuid),
        Field::required("visited_at", FieldKind::DateTime),
        Field::required("address", FieldKind::Object(address_schema().clone())),
        Field::required(
            "place_name",
            FieldKind::Text {
                min: 1,
                max: Some(PLACE_NAME_MAX_CHARS),
            },
        ),
        Field::required(
            "rating",
            FieldKind::Integer {
                min: i64::from(RATING_MIN),
                max: i64::from(RATING_MAX),
            },
        ),
        Field::optional("location", FieldKind::Object(coordinates_schema().clone())),
        Field::optional(
            "notes",
            FieldKind::Text {
                min: 0,
                max: Some(NOTES_MAX_CHARS),
            },
        ),
        Field::optional("synced_at", FieldKind::DateTime).nullable(),
        Field::required("created_at", FieldKind::DateTime),
        Field::required("updated_at", FieldKind::DateTime),
    ])
});

static NEW_ENTRY_SCHEMA: Lazy<ObjectSchema> =
    Lazy::new(|| JOURNAL_ENTRY_SCHEMA.omit(ASSIGNED_FIELDS));

static ENTRY_PATCH_SCHEMA: Lazy<ObjectSchema> = Lazy::new(|| NEW_ENTRY_SCHEMA.partial());

/// Canonical schema of a stored journal entry.
pub fn journal_entry_schema() -> &'static ObjectSchema {
    &JOURNAL_ENTRY_SCHEMA
}

/// Create projection: the entry schema without core-assigned fields.
pub fn new_entry_schema() -> &'static ObjectSchema {
    &NEW_ENTRY_SCHEMA
}

/// Update projection: the create projection with every field optional.
pub fn entry_patch_schema() -> &'static ObjectSchema {
    &ENTRY_PATCH_SCHEMA
}

/// Generates the entry record and both projections from one field list.
macro_rules! journal_entry_records {
    ($( $(#[$attr:meta])* $field:ident: $ty:ty, )+) => {
        /// Create projection collected by entry forms.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct NewJournalEntry {
            $( $(#[$attr])* pub $field: $ty, )+
        }

        /// Update projection. `None` leaves the stored field untouched.
        ///
        /// For optional fields `Some(None)` clears the stored value.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct JournalEntryPatch {
            $(
                #[serde(
                    default,
                    skip_serializing_if = "Option::is_none",
                    deserialize_with = "crate::model::schema::present"
                )]
                pub $field: Option<$ty>,
            )+
        }

        /// Canonical journal entry record.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct JournalEntry {
            pub id: EntryId,
            $( $(#[$attr])* pub $field: $ty, )+
            pub created_at: DateTime<Utc>,
            pub updated_at: DateTime<Utc>,
        }

        impl NewJournalEntry {
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            fn into_entry(self, id: EntryId, now: DateTime<Utc>) -> JournalEntry {
                JournalEntry {
                    id,
                    $( $field: self.$field, )+
                    created_at: now,
                    updated_at: now,
                }
            }
        }

        impl JournalEntryPatch {
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            /// Returns whether the patch changes nothing.
            pub fn is_empty(&self) -> bool {
                true $( && self.$field.is_none() )+
            }

            fn apply_to(self, entry: &mut JournalEntry) {
                $(
                    if let Some(value) = self.$field {
                        entry.$field = value;
                    }
                )+
            }
        }

        impl JournalEntry {
            pub const FIELDS: &'static [&'static str] =
                &["id", $(stringify!($field),)+ "created_at", "updated_at"];
        }
    };
}

journal_entry_records! {
    /// When the place was visited.
    visited_at: DateTime<Utc>,
    address: Address,
    /// Display name, 1..=100 characters.
    place_name: String,
    /// Star rating, 1..=5.
    rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<Coordinates>,
    /// Free-form memo, at most 500 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    /// Set once the entry was pushed to an external device.
    #[serde(default)]
    synced_at: Option<DateTime<Utc>>,
}

impl NewJournalEntry {
    /// Builds a create payload with required fields only.
    pub fn new(
        visited_at: DateTime<Utc>,
        address: Address,
        place_name: impl Into<String>,
        rating: u8,
    ) -> Self {
        Self {
            visited_at,
            address,
            place_name: place_name.into(),
            rating,
            location: None,
            notes: None,
            synced_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_serialized(new_entry_schema(), self)
    }

    /// Validates untyped form input into a create payload.
    ///
    /// Core-assigned fields (`id`, `created_at`, `updated_at`) are dropped.
    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        new_entry_schema().parse(value)
    }
}

impl JournalEntryPatch {
    /// Validates the patch against the update projection.
    ///
    /// `synced_at` may only be cleared; a timestamp is rejected because the
    /// marker is written by sync runs alone.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_serialized(entry_patch_schema(), self)?;
        self.check_sync_marker()
    }

    /// Validates untyped edit-form input into a patch.
    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        let patch: Self = entry_patch_schema().parse(value)?;
        patch.check_sync_marker()?;
        Ok(patch)
    }

    fn check_sync_marker(&self) -> Result<(), ValidationError> {
        match self.synced_at {
            Some(Some(_)) => Err(ValidationError::single(
                "synced_at",
                Constraint::Type { expected: "null" },
            )),
            _ => Ok(()),
        }
    }
}

impl JournalEntry {
    /// Builds a full entry from a create payload with a fresh v4 id.
    pub fn create(new_entry: NewJournalEntry, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Self::create_with_id(Uuid::new_v4(), new_entry, now)
    }

    /// Builds a full entry from a create payload with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    ///
    /// # Errors
    /// - Returns validation errors of the payload or the built entry.
    pub fn create_with_id(
        id: EntryId,
        new_entry: NewJournalEntry,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        new_entry.validate()?;

        let now = now.trunc_subsecs(3);
        let mut entry = new_entry.into_entry(id, now);
        entry.visited_at = entry.visited_at.trunc_subsecs(3);
        entry.synced_at = entry.synced_at.map(|at| at.trunc_subsecs(3));
        entry.validate()?;
        Ok(entry)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_serialized(journal_entry_schema(), self)
    }

    /// Validates untyped input into a full stored entry.
    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        journal_entry_schema().parse(value)
    }

    /// Applies an edit patch and refreshes `updated_at`.
    ///
    /// Returns `Ok(false)` for an empty patch, which leaves the entry as-is.
    ///
    /// # Invariants
    /// - The entry is left untouched when the patch or its result is invalid.
    /// - Any applied patch clears `synced_at`; only sync runs set it.
    pub fn apply_patch(
        &mut self,
        patch: JournalEntryPatch,
        now: DateTime<Utc>,
    ) -> Result<bool, ValidationError> {
        patch.validate()?;
        if patch.is_empty() {
            return Ok(false);
        }

        let mut patched = self.clone();
        patch.apply_to(&mut patched);
        patched.synced_at = None;
        patched.visited_at = patched.visited_at.trunc_subsecs(3);
        patched.updated_at = now.trunc_subsecs(3);
        patched.validate()?;

        *self = patched;
        Ok(true)
    }

    /// Returns whether the entry was pushed to an external device.
    pub fn is_synced(&self) -> bool {
        self.synced_at.is_some()
    }
}

fn validate_serialized<T: Serialize>(
    schema: &ObjectSchema,
    record: &T,
) -> Result<(), ValidationError> {
    let value = serde_json::to_value(record).unwrap_or(Value::Null);
    schema.validate(&value).map(|_| ())
}
