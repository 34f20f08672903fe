use async_trait::async_trait;
use chrono::Utc;
use jobpost_wizard::workflows::posting::{
    BlockedVisa, CompanyProfile, CompanyVerification, EligibilityEvaluator, EligibilityRequest,
    EligibleVisa, EmploymentCategory, ExistingPosting, GatewayError, PostingBackend, PostingId,
    PostingPayload, PostingReceipt, PostingStatus, VisaCode, VisaMatchResult,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Monthly salary (10,000 KRW units) below which professional E-7 hiring is blocked.
const PROFESSIONAL_SALARY_FLOOR: u32 = 250;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Debug, Clone)]
struct StoredPosting {
    posting: PostingPayload,
    status: PostingStatus,
}

/// Posting store used when no backend URL is configured.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPostingBackend {
    postings: Arc<Mutex<HashMap<PostingId, StoredPosting>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryPostingBackend {
    pub(crate) fn status(&self, id: &PostingId) -> Option<PostingStatus> {
        let guard = self.postings.lock().expect("posting mutex poisoned");
        guard.get(id).map(|stored| stored.status)
    }
}

#[async_trait]
impl PostingBackend for InMemoryPostingBackend {
    async fn create_posting(
        &self,
        payload: &PostingPayload,
    ) -> Result<PostingReceipt, GatewayError> {
        let id = PostingId(format!(
            "jp-{:05}",
            self.next_id.fetch_add(1, Ordering::Relaxed) + 1
        ));
        let mut guard = self.postings.lock().expect("posting mutex poisoned");
        guard.insert(
            id.clone(),
            StoredPosting {
                posting: payload.clone(),
                status: PostingStatus::Inactive,
            },
        );
        Ok(PostingReceipt {
            id,
            status: PostingStatus::Inactive,
        })
    }

    async fn activate_posting(&self, id: &PostingId) -> Result<PostingReceipt, GatewayError> {
        let mut guard = self.postings.lock().expect("posting mutex poisoned");
        let stored = guard.get_mut(id).ok_or(GatewayError::NotFound)?;
        stored.status = PostingStatus::Active;
        Ok(PostingReceipt {
            id: id.clone(),
            status: stored.status,
        })
    }

    async fn fetch_posting(&self, id: &PostingId) -> Result<ExistingPosting, GatewayError> {
        let guard = self.postings.lock().expect("posting mutex poisoned");
        guard
            .get(id)
            .map(|stored| ExistingPosting {
                id: id.clone(),
                posting: stored.posting.clone(),
            })
            .ok_or(GatewayError::NotFound)
    }
}

/// Verification service stub answering with a fixed profile, or none.
#[derive(Debug, Clone)]
pub(crate) struct StaticCompanyVerification {
    profile: Option<CompanyProfile>,
}

impl StaticCompanyVerification {
    pub(crate) fn verified() -> Self {
        Self {
            profile: Some(CompanyProfile {
                company_name: "Demo Manufacturing Co.".to_string(),
                business_number: "000-00-00000".to_string(),
                industry_code: "C29".to_string(),
                employee_count: 35,
                domestic_insured_count: 30,
                foreign_worker_count: 5,
            }),
        }
    }

    pub(crate) fn unverified() -> Self {
        Self { profile: None }
    }
}

#[async_trait]
impl CompanyVerification for StaticCompanyVerification {
    async fn company_profile(&self) -> Result<Option<CompanyProfile>, GatewayError> {
        Ok(self.profile.clone())
    }
}

/// Small rule table approximating the eligibility engine for local runs.
#[derive(Debug, Clone, Default)]
pub(crate) struct RuleTableEvaluator;

#[async_trait]
impl EligibilityEvaluator for RuleTableEvaluator {
    async fn evaluate(
        &self,
        request: &EligibilityRequest,
    ) -> Result<VisaMatchResult, GatewayError> {
        let mut eligible = vec![eligible_visa("E-9", "Non-professional employment")];
        let mut blocked = Vec::new();

        if request.company.domestic_insured_count == 0 {
            eligible.clear();
            blocked.push(BlockedVisa {
                code: VisaCode::new("E-9"),
                name: "Non-professional employment".to_string(),
                reasons: vec!["no domestic employees are insured".to_string()],
                suggestions: vec!["register employment insurance first".to_string()],
            });
        }

        match request.employment_type.category() {
            EmploymentCategory::PartTime => {
                eligible.push(eligible_visa("H-2", "Working visit"));
            }
            EmploymentCategory::FullTime if request.monthly_salary >= PROFESSIONAL_SALARY_FLOOR => {
                eligible.push(eligible_visa("E-7", "Specific activities"));
            }
            EmploymentCategory::FullTime => blocked.push(BlockedVisa {
                code: VisaCode::new("E-7"),
                name: "Specific activities".to_string(),
                reasons: vec![format!(
                    "monthly salary {} is below {}",
                    request.monthly_salary, PROFESSIONAL_SALARY_FLOOR
                )],
                suggestions: vec!["raise the salary range minimum".to_string()],
            }),
        }

        Ok(VisaMatchResult {
            summary: format!("{} eligible, {} blocked", eligible.len(), blocked.len()),
            eligible,
            blocked,
            evaluated_at: Utc::now(),
        })
    }
}

fn eligible_visa(code: &str, name: &str) -> EligibleVisa {
    EligibleVisa {
        code: VisaCode::new(code),
        name: name.to_string(),
        required_documents: vec!["Standard labor contract".to_string()],
        restrictions: Vec::new(),
        notes: Vec::new(),
    }
}
