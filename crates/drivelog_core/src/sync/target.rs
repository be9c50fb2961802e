//! External sync target contract.
//!
//! # Responsibility
//! - Define the seam implemented by device adapters (in-vehicle units,
//!   companion apps).
//! - Define the error envelope adapters report failures with.
//!
//! # Invariants
//! - A successful push returns the timestamp recorded as `synced_at`.
//! - Adapters never mutate entries; the core owns the sync marker.

use crate::model::journal::JournalEntry;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SyncResult<T> = Result<T, SyncError>;

/// Failure reported by a sync target or the sync orchestration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncError {
    /// Target that produced the failure (`registry` for selection errors).
    pub target_id: String,
    /// Stable machine-readable code, e.g. `device_unreachable`.
    pub code: String,
    pub message: String,
    /// Hint for the caller; the core never retries on its own.
    pub retryable: bool,
}

impl SyncError {
    pub fn new(
        target_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {}{}",
            self.target_id,
            self.code,
            self.message,
            if self.retryable { " (retryable)" } else { "" }
        )
    }
}

impl Error for SyncError {}

/// Device or service that journal entries are pushed to.
pub trait SyncTarget {
    /// Stable lowercase id, e.g. `car_head_unit`.
    fn target_id(&self) -> &str;

    /// Transfers one entry and returns when the target accepted it.
    fn push_entry(&self, entry: &JournalEntry) -> SyncResult<DateTime<Utc>>;
}
