//! Outbound collaborator contracts consumed by the wizard.
//!
//! Implementations live at the edges (`http` for the REST backend, in-memory fakes in tests
//! and the demo service) so the orchestration logic never depends on a transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::PostingId;
use super::eligibility::{CompanyProfile, EligibilityRequest, VisaMatchResult};
use super::submission::PostingPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStatus {
    Inactive,
    Active,
}

/// Backend acknowledgement for both submission phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingReceipt {
    pub id: PostingId,
    pub status: PostingStatus,
}

/// Posting previously stored by the backend, fetched when duplicating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingPosting {
    pub id: PostingId,
    #[serde(flatten)]
    pub posting: PostingPayload,
}

/// Address selected through the embeddable lookup widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSelection {
    pub road_address: String,
    pub postal_code: Option<String>,
}

/// Transport-level failure from any collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("request could not be delivered: {0}")]
    Transport(String),
    #[error("service responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("response could not be decoded: {0}")]
    Decode(String),
    #[error("resource not found")]
    NotFound,
    #[error("unexpected posting status {found:?} (expected {expected:?})")]
    UnexpectedStatus {
        expected: PostingStatus,
        found: PostingStatus,
    },
}

#[async_trait]
pub trait PostingBackend: Send + Sync {
    /// Phase one: create the posting in the inactive state.
    async fn create_posting(&self, payload: &PostingPayload)
        -> Result<PostingReceipt, GatewayError>;
    /// Phase two: flip a created posting to active.
    async fn activate_posting(&self, id: &PostingId) -> Result<PostingReceipt, GatewayError>;
    async fn fetch_posting(&self, id: &PostingId) -> Result<ExistingPosting, GatewayError>;
}

/// Company verification service supplying the eligibility profile.
#[async_trait]
pub trait CompanyVerification: Send + Sync {
    /// `Ok(None)` when the company has not completed verification.
    async fn company_profile(&self) -> Result<Option<CompanyProfile>, GatewayError>;
}

/// Black-box visa eligibility rule engine.
#[async_trait]
pub trait EligibilityEvaluator: Send + Sync {
    async fn evaluate(&self, request: &EligibilityRequest)
        -> Result<VisaMatchResult, GatewayError>;
}

/// Embeddable address search capability. `Ok(None)` means the user closed the widget
/// without choosing an address.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn search_address(
        &self,
        mount_point: Option<&str>,
    ) -> Result<Option<AddressSelection>, GatewayError>;
}
