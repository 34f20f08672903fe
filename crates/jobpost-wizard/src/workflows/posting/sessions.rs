use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::info;

use super::activity::WizardActivity;
use super::domain::PostingId;
use super::notice::Notice;
use super::wizard::{PostingWizard, WizardError, WizardServices, WizardSettings};

pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
struct SessionEntry {
    wizard: Arc<AsyncMutex<PostingWizard>>,
    activity: WizardActivity,
    last_used: Instant,
}

/// Live wizard sessions keyed by an opaque id. Each session owns its own draft.
pub struct WizardSessions {
    services: WizardServices,
    settings: WizardSettings,
    idle_timeout: Duration,
    next_id: AtomicU64,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl WizardSessions {
    pub fn new(services: WizardServices, settings: WizardSettings) -> Self {
        Self {
            services,
            settings,
            idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Mount a new wizard, optionally prepopulated from an existing posting.
    pub async fn open(
        &self,
        duplicate_from: Option<PostingId>,
    ) -> (String, OwnedMutexGuard<PostingWizard>) {
        self.prune_idle();
        let id = format!("session-{:06}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let wizard =
            PostingWizard::start(self.services.clone(), self.settings.clone(), duplicate_from)
                .await;
        let entry = SessionEntry {
            activity: wizard.activity(),
            wizard: Arc::new(AsyncMutex::new(wizard)),
            last_used: Instant::now(),
        };
        let guard = Arc::clone(&entry.wizard).lock_owned().await;

        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .insert(id.clone(), entry);
        info!(session_id = %id, "wizard session opened");
        (id, guard)
    }

    /// Exclusive access to a session. Sessions with a pending match or submission are
    /// reported as busy instead of queueing behind it.
    pub async fn acquire(&self, id: &str) -> Result<OwnedMutexGuard<PostingWizard>, SessionError> {
        let entry = {
            let mut sessions = self
                .sessions
                .lock()
                .expect("session registry mutex poisoned");
            let entry = sessions.get_mut(id).ok_or(SessionError::NotFound)?;
            entry.last_used = Instant::now();
            entry.clone()
        };

        if let Some(operation) = entry.activity.pending() {
            return Err(SessionError::Wizard(WizardError::Busy(operation)));
        }
        Ok(entry.wizard.lock_owned().await)
    }

    pub fn close(&self, id: &str) -> bool {
        let removed = self
            .sessions
            .lock()
            .expect("session registry mutex poisoned")
            .remove(id)
            .is_some();
        if removed {
            info!(session_id = %id, "wizard session closed");
        }
        removed
    }

    /// Drop sessions untouched for longer than the idle timeout. Returns how many were removed.
    pub fn prune_idle(&self) -> usize {
        let idle_timeout = self.idle_timeout;
        let mut sessions = self
            .sessions
            .lock()
            .expect("session registry mutex poisoned");
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_used.elapsed() < idle_timeout);
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(pruned, remaining = sessions.len(), "idle wizard sessions evicted");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("wizard session not found")]
    NotFound,
    #[error(transparent)]
    Wizard(#[from] WizardError),
}

/// Response envelope shared by the session endpoints.
#[derive(Debug, serde::Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub wizard: super::wizard::WizardView,
    pub notices: Vec<Notice>,
}

impl SessionSnapshot {
    pub fn drain(session_id: impl Into<String>, wizard: &mut PostingWizard) -> Self {
        Self {
            session_id: session_id.into(),
            notices: wizard.take_notices(),
            wizard: wizard.view(),
        }
    }
}
