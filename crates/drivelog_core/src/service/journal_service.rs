//! Journal entry use-case service.
//!
//! # Responsibility
//! - Turn create/update projections into persisted journal entries.
//! - Assign identifiers and timestamps on behalf of form callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Log lines carry ids and status only, never place names or notes.

use crate::model::journal::{EntryId, JournalEntry, JournalEntryPatch, NewJournalEntry};
use crate::repo::journal_repo::{EntryListQuery, JournalRepository, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use log::{info, warn};

pub const ENTRIES_DEFAULT_LIMIT: u32 = 20;
pub const ENTRIES_LIMIT_MAX: u32 = 100;

/// Page of entries with the limit that was actually applied.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPage {
    pub items: Vec<JournalEntry>,
    pub applied_limit: u32,
}

/// Use-case service wrapper for journal entry operations.
pub struct JournalService<R: JournalRepository> {
    repo: R,
    clock: fn() -> DateTime<Utc>,
}

impl<R: JournalRepository> JournalService<R> {
    /// Creates a service using the wall clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, Utc::now)
    }

    /// Creates a service with a custom timestamp source.
    pub fn with_clock(repo: R, clock: fn() -> DateTime<Utc>) -> Self {
        Self { repo, clock }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Validates a create payload and persists it as a full entry.
    ///
    /// # Contract
    /// - Assigns a fresh v4 id and `created_at == updated_at == now`.
    /// - Keeps `synced_at` as given (null by default).
    /// - Returns the stored entry.
    pub fn create_entry(&self, new_entry: NewJournalEntry) -> RepoResult<JournalEntry> {
        let entry = JournalEntry::create(new_entry, (self.clock)()).inspect_err(|err| {
            warn!(
                "event=entry_create module=service status=rejected violations={}",
                err.violations().len()
            );
        })?;
        self.repo.create_entry(&entry)?;
        info!(
            "event=entry_create module=service status=ok entry_id={}",
            entry.id
        );
        Ok(entry)
    }

    /// Applies a patch to an existing entry.
    ///
    /// # Contract
    /// - Empty patches are valid and return the stored entry unchanged.
    /// - Non-empty patches refresh `updated_at`.
    ///
    /// # Errors
    /// - `RepoError::Validation` for an invalid patch or patched result.
    /// - `RepoError::NotFound` when `id` does not exist.
    pub fn update_entry(&self, id: EntryId, patch: JournalEntryPatch) -> RepoResult<JournalEntry> {
        patch.validate()?;
        let mut entry = self.repo.get_entry(id)?.ok_or(RepoError::NotFound(id))?;

        if entry.apply_patch(patch, (self.clock)())? {
            self.repo.update_entry(&entry)?;
            info!("event=entry_update module=service status=ok entry_id={id}");
        }
        Ok(entry)
    }

    pub fn get_entry(&self, id: EntryId) -> RepoResult<Option<JournalEntry>> {
        self.repo.get_entry(id)
    }

    /// Lists entries newest visit first.
    ///
    /// `limit` defaults to 20 and is capped at 100.
    pub fn list_entries(
        &self,
        limit: Option<u32>,
        offset: u32,
        unsynced_only: bool,
    ) -> RepoResult<EntryPage> {
        let applied_limit = normalize_limit(limit);
        let items = self.repo.list_entries(&EntryListQuery {
            unsynced_only,
            limit: Some(applied_limit),
            offset,
            ..EntryListQuery::default()
        })?;
        Ok(EntryPage {
            items,
            applied_limit,
        })
    }

    /// Deletes an entry permanently.
    pub fn delete_entry(&self, id: EntryId) -> RepoResult<()> {
        self.repo.delete_entry(id)?;
        info!("event=entry_delete module=service status=ok entry_id={id}");
        Ok(())
    }
}

/// Maps `None`/`0` to the default page size and caps the rest.
pub(crate) fn normalize_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => ENTRIES_DEFAULT_LIMIT,
        Some(value) => value.min(ENTRIES_LIMIT_MAX),
    }
}
