//! In-process sync target registry and selection.

use crate::sync::target::{SyncError, SyncResult, SyncTarget};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Target registration/selection errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRegistryError {
    InvalidTargetId(String),
    DuplicateTargetId(String),
    TargetNotFound(String),
}

impl Display for SyncRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTargetId(value) => write!(f, "sync target id is invalid: {value}"),
            Self::DuplicateTargetId(value) => {
                write!(f, "sync target id already registered: {value}")
            }
            Self::TargetNotFound(value) => write!(f, "sync target not found: {value}"),
        }
    }
}

impl Error for SyncRegistryError {}

/// Registered sync targets with at most one active selection.
#[derive(Default)]
pub struct SyncTargetRegistry {
    targets: BTreeMap<String, Arc<dyn SyncTarget>>,
    active_target_id: Option<String>,
}

impl SyncTargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one target adapter.
    pub fn register(&mut self, target: Arc<dyn SyncTarget>) -> Result<(), SyncRegistryError> {
        let target_id = target.target_id().trim().to_string();
        if !is_valid_target_id(&target_id) {
            return Err(SyncRegistryError::InvalidTargetId(target_id));
        }
        if self.targets.contains_key(target_id.as_str()) {
            return Err(SyncRegistryError::DuplicateTargetId(target_id));
        }

        self.targets.insert(target_id, target);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns sorted target ids.
    pub fn target_ids(&self) -> Vec<String> {
        self.targets.keys().cloned().collect()
    }

    /// Selects the target used by sync runs.
    pub fn select_active(&mut self, target_id: &str) -> Result<(), SyncRegistryError> {
        let normalized = target_id.trim();
        if !self.targets.contains_key(normalized) {
            return Err(SyncRegistryError::TargetNotFound(normalized.to_string()));
        }
        self.active_target_id = Some(normalized.to_string());
        Ok(())
    }

    pub fn clear_active(&mut self) {
        self.active_target_id = None;
    }

    pub fn active_target_id(&self) -> Option<&str> {
        self.active_target_id.as_deref()
    }

    pub fn get(&self, target_id: &str) -> Option<Arc<dyn SyncTarget>> {
        self.targets.get(target_id.trim()).cloned()
    }

    pub fn active_target(&self) -> Option<Arc<dyn SyncTarget>> {
        let id = self.active_target_id()?;
        self.get(id)
    }

    /// Returns the active target or a `target_not_selected` error.
    pub fn require_active(&self) -> SyncResult<Arc<dyn SyncTarget>> {
        self.active_target().ok_or_else(|| {
            SyncError::new(
                "registry",
                "target_not_selected",
                "No active sync target selected.",
                false,
            )
        })
    }
}

fn is_valid_target_id(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
