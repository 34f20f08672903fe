use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Asynchronous wizard operations that show a pending affordance while in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingOperation {
    Matching,
    Submitting,
}

/// Shared view of in-flight operations. Cloned handles observe the same flags, so a UI or
/// HTTP layer can render a spinner or reject duplicate requests while the wizard is busy.
#[derive(Debug, Clone, Default)]
pub struct WizardActivity {
    matching: Arc<AtomicBool>,
    submitting: Arc<AtomicBool>,
}

impl WizardActivity {
    pub fn is_matching(&self) -> bool {
        self.matching.load(Ordering::Acquire)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn is_busy(&self) -> bool {
        self.is_matching() || self.is_submitting()
    }

    pub fn pending(&self) -> Option<PendingOperation> {
        if self.is_submitting() {
            Some(PendingOperation::Submitting)
        } else if self.is_matching() {
            Some(PendingOperation::Matching)
        } else {
            None
        }
    }

    /// Claim the flag for `operation`; `None` when the same operation is already running.
    pub fn try_begin(&self, operation: PendingOperation) -> Option<ActivityGuard> {
        let flag = Arc::clone(self.flag(operation));
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ActivityGuard { flag })
    }

    fn flag(&self, operation: PendingOperation) -> &Arc<AtomicBool> {
        match operation {
            PendingOperation::Matching => &self.matching,
            PendingOperation::Submitting => &self.submitting,
        }
    }
}

/// Resets its flag when dropped, including when the owning future is cancelled.
#[derive(Debug)]
pub struct ActivityGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
