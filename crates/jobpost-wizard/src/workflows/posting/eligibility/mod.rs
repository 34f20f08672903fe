mod domain;
mod normalize;

pub use domain::{BlockedVisa, CompanyProfile, EligibilityRequest, EligibleVisa, VisaMatchResult};
pub use normalize::{monthly_equivalent, CompensationError, KRW_PER_SALARY_UNIT, MONTHLY_PAID_HOURS};

use std::sync::Arc;

use tracing::{debug, info};

use super::domain::JobPostingDraft;
use super::gateway::{CompanyVerification, EligibilityEvaluator, GatewayError};

/// Failure modes of a matching pass. None of them modify the draft.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("company verification is required before visa matching")]
    ProfileMissing,
    #[error("invalid compensation for visa matching: {0}")]
    Compensation(#[from] CompensationError),
    #[error("company profile lookup failed: {0}")]
    ProfileUnavailable(#[source] GatewayError),
    #[error("visa eligibility service failed: {0}")]
    Evaluation(#[source] GatewayError),
}

/// Evaluates a draft against the external rule engine. The matcher never retains state;
/// merging results into the draft is the orchestrator's job.
#[derive(Clone)]
pub struct EligibilityMatcher {
    verification: Arc<dyn CompanyVerification>,
    evaluator: Arc<dyn EligibilityEvaluator>,
}

impl EligibilityMatcher {
    pub fn new(
        verification: Arc<dyn CompanyVerification>,
        evaluator: Arc<dyn EligibilityEvaluator>,
    ) -> Self {
        Self {
            verification,
            evaluator,
        }
    }

    pub async fn evaluate(&self, draft: &JobPostingDraft) -> Result<VisaMatchResult, MatchError> {
        let monthly_salary = monthly_equivalent(&draft.compensation)?;
        debug!(
            monthly_salary,
            salary_type = ?draft.compensation.salary_type(),
            "normalized compensation for visa matching"
        );

        let company = self
            .verification
            .company_profile()
            .await
            .map_err(MatchError::ProfileUnavailable)?
            .ok_or(MatchError::ProfileMissing)?;

        let request = EligibilityRequest {
            company,
            employment_type: draft.employment_type,
            location: draft.location.clone(),
            monthly_salary,
        };

        let result = self
            .evaluator
            .evaluate(&request)
            .await
            .map_err(MatchError::Evaluation)?;

        info!(
            eligible = result.eligible.len(),
            blocked = result.blocked.len(),
            "visa matching completed"
        );
        Ok(result)
    }
}

impl std::fmt::Debug for EligibilityMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EligibilityMatcher").finish_non_exhaustive()
    }
}
