//! Core domain logic for DriveLog.
//! This crate is the single source of truth for journal invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use logging::{
    default_log_level, init_logging, init_logging_with, logging_status, LoggingConfig,
    LoggingError,
};
pub use model::journal::{
    entry_patch_schema, journal_entry_schema, new_entry_schema, EntryId, JournalEntry,
    JournalEntryPatch, NewJournalEntry,
};
pub use model::persona::{parse_profiles, Persona, PersonaProfile, ProfileLoadError};
pub use model::place::{Address, Coordinates};
pub use model::schema::{Field, FieldKind, ObjectSchema};
pub use model::validation::{Constraint, FieldViolation, ValidationError};
pub use repo::journal_repo::{
    EntryListQuery, JournalRepository, RepoError, RepoResult, SqliteJournalRepository,
};
pub use service::journal_service::{EntryPage, JournalService};
pub use sync::registry::{SyncRegistryError, SyncTargetRegistry};
pub use sync::service::{SyncFailure, SyncReport, SyncRunError, SyncService};
pub use sync::target::{SyncError, SyncResult, SyncTarget};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
