//! Sync run orchestration.
//!
//! # Responsibility
//! - Push entries whose `synced_at` is null to the active sync target.
//! - Record each accepted push through `JournalRepository::mark_synced`.
//! - Report per-entry outcomes to the caller.
//!
//! # Invariants
//! - A failed push leaves `synced_at` null; the entry is picked up again by
//!   the next run. Runs never retry on their own.
//! - Already-synced entries are never pushed.

use crate::model::journal::EntryId;
use crate::repo::journal_repo::{EntryListQuery, JournalRepository, RepoError};
use crate::service::journal_service::normalize_limit;
use crate::sync::registry::SyncTargetRegistry;
use crate::sync::target::{SyncError, SyncTarget};
use chrono::SubsecRound;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// One entry that could not be synced during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub entry_id: EntryId,
    pub error: SyncError,
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub target_id: String,
    pub synced: Vec<EntryId>,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn attempted(&self) -> usize {
        self.synced.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run-level failure that prevented any push.
#[derive(Debug)]
pub enum SyncRunError {
    Target(SyncError),
    Repo(RepoError),
}

impl Display for SyncRunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Target(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncRunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Target(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<SyncError> for SyncRunError {
    fn from(value: SyncError) -> Self {
        Self::Target(value)
    }
}

impl From<RepoError> for SyncRunError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Pushes unsynced journal entries to external targets.
pub struct SyncService<R: JournalRepository> {
    repo: R,
}

impl<R: JournalRepository> SyncService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Syncs up to `limit` pending entries to the registry's active target.
    ///
    /// # Errors
    /// - `SyncRunError::Target` with code `target_not_selected` when no
    ///   target is active.
    /// - `SyncRunError::Repo` when pending entries cannot be read.
    pub fn sync_pending(
        &self,
        registry: &SyncTargetRegistry,
        limit: u32,
    ) -> Result<SyncReport, SyncRunError> {
        let target = registry.require_active()?;
        self.sync_pending_to(target.as_ref(), limit)
    }

    /// Syncs up to `limit` pending entries, oldest visit first.
    ///
    /// `limit` follows the listing rules: `0` means the default batch of 20
    /// and larger values are capped at 100.
    pub fn sync_pending_to(
        &self,
        target: &dyn SyncTarget,
        limit: u32,
    ) -> Result<SyncReport, SyncRunError> {
        let started_at = Instant::now();
        let pending = self.repo.list_entries(&EntryListQuery {
            unsynced_only: true,
            limit: Some(normalize_limit(Some(limit))),
            oldest_first: true,
            ..EntryListQuery::default()
        })?;

        let mut report = SyncReport {
            target_id: target.target_id().to_string(),
            ..SyncReport::default()
        };

        for entry in pending {
            let outcome = target
                .push_entry(&entry)
                .and_then(|accepted_at| {
                    self.repo
                        .mark_synced(entry.id, accepted_at.trunc_subsecs(3))
                        .map_err(|err| {
                            SyncError::new("store", "mark_synced_failed", err.to_string(), false)
                        })
                });

            match outcome {
                Ok(()) => report.synced.push(entry.id),
                Err(error) => {
                    warn!(
                        "event=sync_entry module=sync status=error target={} entry_id={} error_code={} retryable={}",
                        report.target_id, entry.id, error.code, error.retryable
                    );
                    report.failed.push(SyncFailure {
                        entry_id: entry.id,
                        error,
                    });
                }
            }
        }

        info!(
            "event=sync_run module=sync status=ok target={} synced={} failed={} duration_ms={}",
            report.target_id,
            report.synced.len(),
            report.failed.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}
