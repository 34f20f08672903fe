//! Debounced, best-effort persistence of the in-progress draft.
//!
//! A single snapshot slot is written at most once per quiet period and read at most once per
//! session. Storage faults are logged and swallowed.

mod store;

pub use store::{
    FileSnapshotStore, MemorySnapshotStore, SnapshotStore, StorageError, DRAFT_STORAGE_KEY,
};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::domain::JobPostingDraft;
use super::step::WizardStep;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(3);

/// The sole unit written to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub draft: JobPostingDraft,
    pub step: WizardStep,
    pub saved_at: DateTime<Utc>,
}

impl DraftSnapshot {
    pub fn capture(draft: JobPostingDraft, step: WizardStep) -> Self {
        Self {
            draft,
            step,
            saved_at: Utc::now(),
        }
    }

    /// The stored compensation variant is one the employment type selects.
    pub fn has_consistent_compensation(&self) -> bool {
        self.draft
            .compensation
            .salary_type()
            .permitted_for(self.draft.employment_type.category())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    SkippedEmptyTitle,
    Failed,
}

/// Owner of the debounce timer and the restore-once guard.
pub struct DraftAutosave {
    store: Arc<dyn SnapshotStore>,
    quiet_period: Duration,
    pending: Option<JoinHandle<()>>,
    restored: bool,
}

impl DraftAutosave {
    pub fn new(store: Arc<dyn SnapshotStore>, quiet_period: Duration) -> Self {
        Self {
            store,
            quiet_period,
            pending: None,
            restored: false,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Read the pending snapshot. Only the first call per session touches storage; malformed
    /// or terminal snapshots are discarded.
    pub fn restore(&mut self) -> Option<DraftSnapshot> {
        if self.restored {
            return None;
        }
        self.restored = true;

        let raw = match self.store.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(%err, "draft snapshot could not be read");
                return None;
            }
        };

        match serde_json::from_str::<DraftSnapshot>(&raw) {
            Ok(snapshot) if !snapshot.has_consistent_compensation() => {
                warn!(
                    employment_type = snapshot.draft.employment_type.label(),
                    "discarding snapshot whose compensation does not fit its employment type"
                );
                None
            }
            Ok(snapshot) if snapshot.step.is_editable() => {
                debug!(step = snapshot.step.number(), saved_at = %snapshot.saved_at, "draft snapshot restored");
                Some(snapshot)
            }
            Ok(snapshot) => {
                debug!(
                    step = snapshot.step.number(),
                    "discarding snapshot outside editable steps"
                );
                None
            }
            Err(err) => {
                warn!(error = %StorageError::from(err), "discarding malformed draft snapshot");
                None
            }
        }
    }

    /// Restart the quiet-period timer with the latest draft. Any previously scheduled write
    /// is cancelled.
    pub fn schedule(&mut self, draft: &JobPostingDraft, step: WizardStep) {
        self.cancel_pending();

        let Ok(runtime) = Handle::try_current() else {
            warn!("no async runtime available; autosave skipped");
            return;
        };

        let store = Arc::clone(&self.store);
        let quiet_period = self.quiet_period;
        let draft = draft.clone();
        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(quiet_period).await;
            write_snapshot(store.as_ref(), &DraftSnapshot::capture(draft, step));
        }));
    }

    /// Manual save: bypasses the timer and writes immediately.
    pub fn save_now(&mut self, draft: &JobPostingDraft, step: WizardStep) -> SaveOutcome {
        self.cancel_pending();
        write_snapshot(
            self.store.as_ref(),
            &DraftSnapshot::capture(draft.clone(), step),
        )
    }

    /// Purge the slot. Called only after a confirmed submission.
    pub fn clear(&mut self) {
        self.cancel_pending();
        if let Err(err) = self.store.clear() {
            warn!(%err, "draft snapshot could not be cleared");
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for DraftAutosave {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

impl std::fmt::Debug for DraftAutosave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftAutosave")
            .field("quiet_period", &self.quiet_period)
            .field("pending", &self.has_pending())
            .field("restored", &self.restored)
            .finish()
    }
}

fn write_snapshot(store: &dyn SnapshotStore, snapshot: &DraftSnapshot) -> SaveOutcome {
    if !snapshot.draft.has_title() {
        debug!("skipping draft snapshot without a title");
        return SaveOutcome::SkippedEmptyTitle;
    }

    let record = match serde_json::to_string(snapshot) {
        Ok(record) => record,
        Err(err) => {
            warn!(error = %StorageError::from(err), "draft snapshot could not be serialized");
            return SaveOutcome::Failed;
        }
    };

    match store.write(&record) {
        Ok(()) => {
            debug!(step = snapshot.step.number(), bytes = record.len(), "draft snapshot written");
            SaveOutcome::Saved
        }
        Err(err) => {
            warn!(%err, "draft snapshot could not be written");
            SaveOutcome::Failed
        }
    }
}
