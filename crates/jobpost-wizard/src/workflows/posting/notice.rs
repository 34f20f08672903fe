use serde::Serialize;

use super::domain::PostingId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    ValidationFailed,
    ProfileMissing,
    Network,
    PartialActivation,
    DraftSaved,
    DuplicateUnavailable,
}

impl NoticeKind {
    /// Blocking notices must be acted on; the rest can be dismissed.
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::ValidationFailed | Self::ProfileMissing)
    }
}

/// User-visible message queued by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub blocking: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_id: Option<PostingId>,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            blocking: kind.is_blocking(),
            posting_id: None,
        }
    }

    pub fn with_posting(mut self, posting_id: PostingId) -> Self {
        self.posting_id = Some(posting_id);
        self
    }
}
