//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level journal functions to Dart via FRB.
//! - Translate core errors into flat envelopes the forms can render.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Payloads cross the boundary as JSON text matching core schemas.

use drivelog_core::db::open_db;
use drivelog_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, parse_profiles,
    ping as ping_inner, EntryId, JournalEntry, JournalEntryPatch, JournalService,
    NewJournalEntry, RepoError, RepoResult, SqliteJournalRepository, ValidationError,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const JOURNAL_DB_FILE_NAME: &str = "drivelog_journal.sqlite3";
const JOURNAL_DB_PATH_ENV: &str = "DRIVELOG_DB_PATH";
static JOURNAL_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One violated field constraint, flattened for form rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationItem {
    /// Dotted field path, e.g. `address.city`.
    pub field: String,
    /// Stable constraint code (`required|type|min_length|...`).
    pub code: String,
    /// Human-readable English message.
    pub message: String,
}

/// Validation-only response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResponse {
    pub ok: bool,
    pub violations: Vec<ViolationItem>,
}

/// Generic action response envelope for journal commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    pub ok: bool,
    /// Affected entry ID on success.
    pub entry_id: Option<String>,
    pub message: String,
    /// Field violations when the payload was rejected.
    pub violations: Vec<ViolationItem>,
}

impl EntryActionResponse {
    fn success(message: impl Into<String>, entry_id: EntryId) -> Self {
        Self {
            ok: true,
            entry_id: Some(entry_id.to_string()),
            message: message.into(),
            violations: Vec::new(),
        }
    }

    fn failure(operation: &str, err: RepoError) -> Self {
        log::warn!("event={operation} module=ffi status=error error={err}");
        let violations = match &err {
            RepoError::Validation(validation) => to_violation_items(validation, ""),
            _ => Vec::new(),
        };
        Self {
            ok: false,
            entry_id: None,
            message: format!("{operation} failed: {err}"),
            violations,
        }
    }
}

/// Summary row for journal list screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalListItem {
    pub entry_id: String,
    pub place_name: String,
    pub city: String,
    pub rating: u8,
    /// Visit time in epoch milliseconds.
    pub visited_at_ms: i64,
    pub synced: bool,
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalListResponse {
    pub items: Vec<JournalListItem>,
    pub message: String,
    /// Effective applied list limit.
    pub applied_limit: u32,
}

/// Validates a create-form payload without persisting it.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_validate_create(payload_json: String) -> ValidationResponse {
    match parse_json(&payload_json).and_then(|value| NewJournalEntry::parse(&value)) {
        Ok(_) => ValidationResponse {
            ok: true,
            violations: Vec::new(),
        },
        Err(err) => ValidationResponse {
            ok: false,
            violations: to_violation_items(&err, ""),
        },
    }
}

/// Creates a journal entry from a create-form payload.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Returns the created entry ID on success, violations on rejection.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_create(payload_json: String) -> EntryActionResponse {
    let result = parse_json(&payload_json)
        .and_then(|value| NewJournalEntry::parse(&value))
        .map_err(RepoError::from)
        .and_then(|new_entry| with_journal_service(|service| service.create_entry(new_entry)));
    match result {
        Ok(entry) => EntryActionResponse::success("Entry created.", entry.id),
        Err(err) => EntryActionResponse::failure("journal_create", err),
    }
}

/// Applies an edit-form patch to an existing entry.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_update(entry_id: String, patch_json: String) -> EntryActionResponse {
    let result = parse_entry_id(&entry_id).and_then(|id| {
        let patch = parse_json(&patch_json).and_then(|value| JournalEntryPatch::parse(&value))?;
        with_journal_service(|service| service.update_entry(id, patch))
    });
    match result {
        Ok(entry) => EntryActionResponse::success("Entry updated.", entry.id),
        Err(err) => EntryActionResponse::failure("journal_update", err),
    }
}

/// Deletes an entry permanently.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_delete(entry_id: String) -> EntryActionResponse {
    let result = parse_entry_id(&entry_id)
        .and_then(|id| with_journal_service(|service| service.delete_entry(id)).map(|()| id));
    match result {
        Ok(id) => EntryActionResponse::success("Entry deleted.", id),
        Err(err) => EntryActionResponse::failure("journal_delete", err),
    }
}

/// Lists entries newest visit first.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_list(limit: Option<u32>, unsynced_only: bool) -> JournalListResponse {
    match with_journal_service(|service| service.list_entries(limit, 0, unsynced_only)) {
        Ok(page) => {
            let items = page.items.iter().map(to_list_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No entries.".to_string()
            } else {
                format!("Found {} entr(ies).", items.len())
            };
            JournalListResponse {
                items,
                message,
                applied_limit: page.applied_limit,
            }
        }
        Err(err) => JournalListResponse {
            items: Vec::new(),
            message: format!("journal_list failed: {err}"),
            applied_limit: 0,
        },
    }
}

/// Validates a JSON array of persona profiles used as mock data.
///
/// Violation fields are prefixed with the record index, e.g. `[2].persona.age`.
#[flutter_rust_bridge::frb(sync)]
pub fn persona_profiles_validate(profiles_json: String) -> ValidationResponse {
    match parse_profiles(&profiles_json) {
        Ok(_) => ValidationResponse {
            ok: true,
            violations: Vec::new(),
        },
        Err(err) => {
            let prefix = err.index.map(|index| format!("[{index}]")).unwrap_or_default();
            ValidationResponse {
                ok: false,
                violations: to_violation_items(&err.error, &prefix),
            }
        }
    }
}

fn parse_json(text: &str) -> Result<Value, ValidationError> {
    serde_json::from_str(text).map_err(|_| {
        ValidationError::single(
            drivelog_core::model::schema::ROOT_PATH,
            drivelog_core::Constraint::Format { format: "json" },
        )
    })
}

fn parse_entry_id(raw: &str) -> RepoResult<EntryId> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        RepoError::Validation(ValidationError::single(
            "id",
            drivelog_core::Constraint::Format { format: "uuid" },
        ))
    })
}

fn resolve_journal_db_path() -> PathBuf {
    JOURNAL_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(JOURNAL_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(JOURNAL_DB_FILE_NAME)
        })
        .clone()
}

fn with_journal_service<T>(
    f: impl FnOnce(&JournalService<SqliteJournalRepository<'_>>) -> RepoResult<T>,
) -> RepoResult<T> {
    let conn = open_db(resolve_journal_db_path())?;
    let repo = SqliteJournalRepository::try_new(&conn)?;
    let service = JournalService::new(repo);
    f(&service)
}

fn to_violation_items(err: &ValidationError, prefix: &str) -> Vec<ViolationItem> {
    err.violations()
        .iter()
        .map(|violation| {
            let field = match (prefix.is_empty(), violation.field.as_str()) {
                (true, field) => field.to_string(),
                (false, "$") => prefix.to_string(),
                (false, field) => format!("{prefix}.{field}"),
            };
            ViolationItem {
                message: format!("{field} {}", violation.constraint),
                field,
                code: violation.constraint.code().to_string(),
            }
        })
        .collect()
}

fn to_list_item(entry: &JournalEntry) -> JournalListItem {
    JournalListItem {
        entry_id: entry.id.to_string(),
        place_name: entry.place_name.clone(),
        city: entry.address.city.clone(),
        rating: entry.rating,
        visited_at_ms: entry.visited_at.timestamp_millis(),
        synced: entry.is_synced(),
    }
}
