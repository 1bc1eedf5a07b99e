use std::collections::BTreeSet;
use std::fmt;

/// Where a [`SyncEngine`](super::SyncEngine) is in its current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Pushing,
    Pulling,
    /// The push phase could not reach the remote at all.
    Failed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Idle => write!(f, "idle"),
            SyncState::Pushing => write!(f, "pushing"),
            SyncState::Pulling => write!(f, "pulling"),
            SyncState::Failed => write!(f, "failed"),
        }
    }
}

/// Ids present on only one side, for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncDiff {
    pub local_only_ids: BTreeSet<String>,
    pub remote_only_ids: BTreeSet<String>,
}

impl SyncDiff {
    pub fn between(local: &BTreeSet<String>, remote: &BTreeSet<String>) -> Self {
        Self {
            local_only_ids: local.difference(remote).cloned().collect(),
            remote_only_ids: remote.difference(local).cloned().collect(),
        }
    }

    pub fn is_in_sync(&self) -> bool {
        self.local_only_ids.is_empty() && self.remote_only_ids.is_empty()
    }
}

/// Outcome of a push, pull or full sync of one collection.
///
/// Operations that do not run a phase leave its fields at zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub collection: String,
    pub pushed: usize,
    pub push_failed: usize,
    pub pulled: usize,
    pub decode_failed: usize,
    /// Local records replaced by their remote copy.
    pub replaced: usize,
    /// Ids present on both sides with different content.
    pub conflicts: Vec<String>,
    pub local_only_ids: BTreeSet<String>,
    pub remote_only_ids: BTreeSet<String>,
    /// Outbox entries settled during this pass.
    pub pending_flushed: usize,
    /// First push failure, if any.
    pub push_error: Option<String>,
    pub pull_error: Option<String>,
    pub local_error: Option<String>,
}

impl SyncReport {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// True when every attempted call succeeded and nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.push_failed == 0
            && self.decode_failed == 0
            && self.push_error.is_none()
            && self.pull_error.is_none()
            && self.local_error.is_none()
    }

    pub(crate) fn apply_diff(&mut self, diff: SyncDiff) {
        self.local_only_ids = diff.local_only_ids;
        self.remote_only_ids = diff.remote_only_ids;
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: pushed {}, pulled {}",
            self.collection, self.pushed, self.pulled
        )?;
        if self.pending_flushed > 0 {
            write!(f, ", {} pending flushed", self.pending_flushed)?;
        }
        if self.push_failed > 0 {
            write!(f, ", {} push failed", self.push_failed)?;
        }
        if self.decode_failed > 0 {
            write!(f, ", {} undecodable", self.decode_failed)?;
        }
        if !self.conflicts.is_empty() {
            write!(f, ", {} conflicts", self.conflicts.len())?;
        }
        if self.replaced > 0 {
            write!(f, ", {} replaced", self.replaced)?;
        }
        if let Some(e) = &self.local_error {
            write!(f, " (local error: {})", e)?;
        }
        if let Some(e) = &self.push_error {
            write!(f, " (push error: {})", e)?;
        }
        if let Some(e) = &self.pull_error {
            write!(f, " (pull error: {})", e)?;
        }
        Ok(())
    }
}
