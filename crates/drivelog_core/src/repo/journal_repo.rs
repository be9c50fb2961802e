//! Journal entry repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over `journal_entries` storage.
//! - Own the one-way `synced_at` transition.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `JournalEntry::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `mark_synced` only succeeds while `synced_at` is still null.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::journal::{EntryId, JournalEntry};
use crate::model::place::{Address, Coordinates};
use crate::model::validation::ValidationError;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ENTRY_TABLE: &str = "journal_entries";

const ENTRY_COLUMNS: &[&str] = &[
    "id",
    "visited_at",
    "address_country",
    "address_prefecture",
    "address_city",
    "address_detail",
    "place_name",
    "rating",
    "location_lat",
    "location_lng",
    "notes",
    "synced_at",
    "created_at",
    "updated_at",
];

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    visited_at,
    address_country,
    address_prefecture,
    address_city,
    address_detail,
    place_name,
    rating,
    location_lat,
    location_lng,
    notes,
    synced_at,
    created_at,
    updated_at
FROM journal_entries";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for journal persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound(EntryId),
    /// `mark_synced` was called on an entry that already carries `synced_at`.
    AlreadySynced(EntryId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "journal entry not found: {id}"),
            Self::AlreadySynced(id) => write!(f, "journal entry already synced: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryListQuery {
    /// Only entries whose `synced_at` is null.
    pub unsynced_only: bool,
    /// Only entries rated at least this value.
    pub min_rating: Option<u8>,
    pub limit: Option<u32>,
    pub offset: u32,
    /// Oldest visit first instead of newest first.
    pub oldest_first: bool,
}

/// Persistence contract for journal entries.
pub trait JournalRepository {
    fn create_entry(&self, entry: &JournalEntry) -> RepoResult<EntryId>;
    fn update_entry(&self, entry: &JournalEntry) -> RepoResult<()>;
    fn get_entry(&self, id: EntryId) -> RepoResult<Option<JournalEntry>>;
    fn list_entries(&self, query: &EntryListQuery) -> RepoResult<Vec<JournalEntry>>;
    fn delete_entry(&self, id: EntryId) -> RepoResult<()>;
    /// Records a successful external sync. Valid once per null-to-set transition.
    fn mark_synced(&self, id: EntryId, synced_at: DateTime<Utc>) -> RepoResult<()>;
}

impl<R: JournalRepository + ?Sized> JournalRepository for &R {
    fn create_entry(&self, entry: &JournalEntry) -> RepoResult<EntryId> {
        (**self).create_entry(entry)
    }

    fn update_entry(&self, entry: &JournalEntry) -> RepoResult<()> {
        (**self).update_entry(entry)
    }

    fn get_entry(&self, id: EntryId) -> RepoResult<Option<JournalEntry>> {
        (**self).get_entry(id)
    }

    fn list_entries(&self, query: &EntryListQuery) -> RepoResult<Vec<JournalEntry>> {
        (**self).list_entries(query)
    }

    fn delete_entry(&self, id: EntryId) -> RepoResult<()> {
        (**self).delete_entry(id)
    }

    fn mark_synced(&self, id: EntryId, synced_at: DateTime<Utc>) -> RepoResult<()> {
        (**self).mark_synced(id, synced_at)
    }
}

/// SQLite-backed journal repository.
pub struct SqliteJournalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJournalRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` for foreign schemas.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl JournalRepository for SqliteJournalRepository<'_> {
    fn create_entry(&self, entry: &JournalEntry) -> RepoResult<EntryId> {
        entry.validate()?;

        let (lat, lng) = split_location(entry.location);
        self.conn.execute(
            "INSERT INTO journal_entries (
                id,
                visited_at,
                address_country,
                address_prefecture,
                address_city,
                address_detail,
                place_name,
                rating,
                location_lat,
                location_lng,
                notes,
                synced_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
            params![
                entry.id.to_string(),
                entry.visited_at.timestamp_millis(),
                entry.address.country.as_str(),
                entry.address.prefecture.as_str(),
                entry.address.city.as_str(),
                entry.address.detail.as_deref(),
                entry.place_name.as_str(),
                i64::from(entry.rating),
                lat,
                lng,
                entry.notes.as_deref(),
                entry.synced_at.map(|at| at.timestamp_millis()),
                entry.created_at.timestamp_millis(),
                entry.updated_at.timestamp_millis(),
            ],
        )?;

        Ok(entry.id)
    }

    fn update_entry(&self, entry: &JournalEntry) -> RepoResult<()> {
        entry.validate()?;

        let (lat, lng) = split_location(entry.location);
        let changed = self.conn.execute(
            "UPDATE journal_entries
             SET
                visited_at = ?1,
                address_country = ?2,
                address_prefecture = ?3,
                address_city = ?4,
                address_detail = ?5,
                place_name = ?6,
                rating = ?7,
                location_lat = ?8,
                location_lng = ?9,
                notes = ?10,
                synced_at = ?11,
                updated_at = ?12
             WHERE id = ?13;",
            params![
                entry.visited_at.timestamp_millis(),
                entry.address.country.as_str(),
                entry.address.prefecture.as_str(),
                entry.address.city.as_str(),
                entry.address.detail.as_deref(),
                entry.place_name.as_str(),
                i64::from(entry.rating),
                lat,
                lng,
                entry.notes.as_deref(),
                entry.synced_at.map(|at| at.timestamp_millis()),
                entry.updated_at.timestamp_millis(),
                entry.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(entry.id));
        }

        Ok(())
    }

    fn get_entry(&self, id: EntryId) -> RepoResult<Option<JournalEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }

        Ok(None)
    }

    fn list_entries(&self, query: &EntryListQuery) -> RepoResult<Vec<JournalEntry>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if query.unsynced_only {
            sql.push_str(" AND synced_at IS NULL");
        }

        if let Some(min_rating) = query.min_rating {
            sql.push_str(" AND rating >= ?");
            bind_values.push(Value::Integer(i64::from(min_rating)));
        }

        if query.oldest_first {
            sql.push_str(" ORDER BY visited_at ASC, id ASC");
        } else {
            sql.push_str(" ORDER BY visited_at DESC, id ASC");
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        Ok(entries)
    }

    fn delete_entry(&self, id: EntryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM journal_entries WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn mark_synced(&self, id: EntryId, synced_at: DateTime<Utc>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE journal_entries
             SET synced_at = ?1
             WHERE id = ?2
               AND synced_at IS NULL;",
            params![synced_at.timestamp_millis(), id.to_string()],
        )?;

        if changed == 1 {
            return Ok(());
        }

        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM journal_entries WHERE id = ?1;",
                [id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        if exists {
            Err(RepoError::AlreadySynced(id))
        } else {
            Err(RepoError::NotFound(id))
        }
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [ENTRY_TABLE],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(RepoError::MissingRequiredTable(ENTRY_TABLE));
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({ENTRY_TABLE});"))?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(&column) = ENTRY_COLUMNS
        .iter()
        .find(|&&column| !present.iter().any(|name| name == column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: ENTRY_TABLE,
            column,
        });
    }

    Ok(())
}

fn split_location(location: Option<Coordinates>) -> (Option<f64>, Option<f64>) {
    match location {
        Some(coordinates) => (Some(coordinates.lat), Some(coordinates.lng)),
        None => (None, None),
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<JournalEntry> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in journal_entries.id"))
    })?;

    let rating = match row.get::<_, i64>("rating")? {
        value @ 1..=5 => value as u8,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid rating `{other}` in journal_entries.rating"
            )));
        }
    };

    let location = match (
        row.get::<_, Option<f64>>("location_lat")?,
        row.get::<_, Option<f64>>("location_lng")?,
    ) {
        (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
        (None, None) => None,
        _ => {
            return Err(RepoError::InvalidData(
                "half-set location in journal_entries.location_lat/location_lng".to_string(),
            ));
        }
    };

    let synced_at = match row.get::<_, Option<i64>>("synced_at")? {
        Some(millis) => Some(millis_to_datetime(millis, "synced_at")?),
        None => None,
    };

    let entry = JournalEntry {
        id,
        visited_at: millis_to_datetime(row.get("visited_at")?, "visited_at")?,
        address: Address {
            country: row.get("address_country")?,
            prefecture: row.get("address_prefecture")?,
            city: row.get("address_city")?,
            detail: row.get("address_detail")?,
        },
        place_name: row.get("place_name")?,
        rating,
        location,
        notes: row.get("notes")?,
        synced_at,
        created_at: millis_to_datetime(row.get("created_at")?, "created_at")?,
        updated_at: millis_to_datetime(row.get("updated_at")?, "updated_at")?,
    };
    entry.validate().map_err(|err| {
        RepoError::InvalidData(format!("persisted entry {id} failed validation: {err}"))
    })?;
    Ok(entry)
}

fn millis_to_datetime(millis: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{millis}` in journal_entries.{column}"
        ))
    })
}
