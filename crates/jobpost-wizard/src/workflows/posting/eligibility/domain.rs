use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::posting::domain::{EmploymentType, VisaCode, WorkLocation};

/// Externally verified employer attributes required by the eligibility engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_name: String,
    pub business_number: String,
    pub industry_code: String,
    pub employee_count: u32,
    pub domestic_insured_count: u32,
    pub foreign_worker_count: u32,
}

/// Evaluation request sent to the rule engine. Compensation is already normalized to a
/// monthly amount in units of 10,000 KRW.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRequest {
    pub company: CompanyProfile,
    pub employment_type: EmploymentType,
    pub location: WorkLocation,
    pub monthly_salary: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleVisa {
    pub code: VisaCode,
    pub name: String,
    #[serde(default)]
    pub required_documents: Vec<String>,
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedVisa {
    pub code: VisaCode,
    pub name: String,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Fresh, non-cumulative evaluation result for a single matching pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisaMatchResult {
    pub eligible: Vec<EligibleVisa>,
    pub blocked: Vec<BlockedVisa>,
    pub summary: String,
    pub evaluated_at: DateTime<Utc>,
}

impl VisaMatchResult {
    pub fn eligible_codes(&self) -> impl Iterator<Item = &VisaCode> {
        self.eligible.iter().map(|visa| &visa.code)
    }
}
