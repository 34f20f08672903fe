use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use jobpost_wizard::workflows::posting::{
    ApplicationMethod, ApplicationSettings, CompanyProfile, CompanyVerification, Compensation,
    DraftPatch, EducationRequirement, EligibilityEvaluator, EligibilityRequest, EligibleVisa,
    EmploymentType, ExistingPosting, ExperienceRequirement, FileSnapshotStore,
    FullTimeCompensation, FullTimeKind, GatewayError, PostingBackend, PostingId, PostingPayload,
    PostingReceipt, PostingStatus, PostingWizard, VisaCode, VisaMatchResult, WeeklySchedule,
    WizardServices, WizardSettings, WizardStep, WorkLocation,
};

#[derive(Default)]
struct RecordingBackend {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl PostingBackend for RecordingBackend {
    async fn create_posting(
        &self,
        payload: &PostingPayload,
    ) -> Result<PostingReceipt, GatewayError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(format!("create:{}", payload.title));
        Ok(PostingReceipt {
            id: PostingId("jp-1001".to_string()),
            status: PostingStatus::Inactive,
        })
    }

    async fn activate_posting(&self, id: &PostingId) -> Result<PostingReceipt, GatewayError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(format!("activate:{id}"));
        Ok(PostingReceipt {
            id: id.clone(),
            status: PostingStatus::Active,
        })
    }

    async fn fetch_posting(&self, _id: &PostingId) -> Result<ExistingPosting, GatewayError> {
        Err(GatewayError::NotFound)
    }
}

struct VerifiedCompany;

#[async_trait]
impl CompanyVerification for VerifiedCompany {
    async fn company_profile(&self) -> Result<Option<CompanyProfile>, GatewayError> {
        Ok(Some(CompanyProfile {
            company_name: "Daehan Logistics".to_string(),
            business_number: "220-81-12345".to_string(),
            industry_code: "H52".to_string(),
            employee_count: 120,
            domestic_insured_count: 110,
            foreign_worker_count: 10,
        }))
    }
}

#[derive(Default)]
struct SalaryAwareEvaluator {
    seen: Mutex<Vec<u32>>,
}

#[async_trait]
impl EligibilityEvaluator for SalaryAwareEvaluator {
    async fn evaluate(
        &self,
        request: &EligibilityRequest,
    ) -> Result<VisaMatchResult, GatewayError> {
        self.seen
            .lock()
            .expect("seen mutex poisoned")
            .push(request.monthly_salary);
        let code = if request.monthly_salary >= 250 {
            "E-7"
        } else {
            "E-9"
        };
        Ok(VisaMatchResult {
            eligible: vec![EligibleVisa {
                code: VisaCode::new(code),
                name: format!("{code} work visa"),
                required_documents: Vec::new(),
                restrictions: Vec::new(),
                notes: Vec::new(),
            }],
            blocked: Vec::new(),
            summary: "1 visa type eligible".to_string(),
            evaluated_at: Utc::now(),
        })
    }
}

#[tokio::test]
async fn annual_posting_flows_from_draft_to_published() {
    let drafts = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(FileSnapshotStore::for_editor(drafts.path(), "employer-17"));
    let backend = Arc::new(RecordingBackend::default());
    let evaluator = Arc::new(SalaryAwareEvaluator::default());
    let services = WizardServices {
        backend: backend.clone(),
        verification: Arc::new(VerifiedCompany),
        evaluator: evaluator.clone(),
        store: store.clone(),
    };

    let mut wizard = PostingWizard::start(services, WizardSettings::default(), None).await;
    assert_eq!(wizard.step(), WizardStep::Basics);

    wizard
        .set_employment_type(EmploymentType::FullTime(FullTimeKind::Permanent))
        .expect("editable");
    wizard
        .update_fields(DraftPatch {
            title: Some("Logistics coordinator".to_string()),
            job_categories: Some(vec!["Logistics".to_string()]),
            ..DraftPatch::default()
        })
        .expect("basics");
    wizard.go_next().await.expect("basics valid");

    wizard
        .update_fields(DraftPatch {
            compensation: Some(Compensation::Annual(FullTimeCompensation {
                min: Some(3_000),
                max: Some(3_600),
                experience: Some(ExperienceRequirement::Experienced { min_years: 3 }),
                education: Some(EducationRequirement::Bachelor),
            })),
            schedule: Some(WeeklySchedule {
                days: [true, true, true, true, true, false, false],
                start_time: NaiveTime::from_hms_opt(9, 0, 0),
                end_time: NaiveTime::from_hms_opt(18, 0, 0),
            }),
            ..DraftPatch::default()
        })
        .expect("conditions");
    wizard.go_next().await.expect("conditions valid");

    wizard
        .update_fields(DraftPatch {
            location: Some(WorkLocation {
                address: "45 Hangang-daero, Seoul".to_string(),
                detail: "3F".to_string(),
            }),
            description: Some("Coordinate inbound container schedules.".to_string()),
            ..DraftPatch::default()
        })
        .expect("workplace");
    wizard.go_next().await.expect("matching succeeds");

    assert_eq!(evaluator.seen.lock().expect("seen mutex poisoned").clone(), vec![250]);
    assert!(wizard
        .draft()
        .allowed_visas
        .contains(&VisaCode::new("E-7")));

    wizard
        .update_fields(DraftPatch {
            application: Some(ApplicationSettings {
                method: Some(ApplicationMethod::Platform),
                start_date: NaiveDate::from_ymd_opt(2025, 5, 1),
                end_date: NaiveDate::from_ymd_opt(2025, 5, 31),
                contact: None,
            }),
            ..DraftPatch::default()
        })
        .expect("application");
    wizard.go_next().await.expect("visas valid");
    wizard.save_now().expect("editable");
    assert!(store.path().exists());

    let receipt = wizard.submit().await.expect("published");

    assert_eq!(receipt.status, PostingStatus::Active);
    assert_eq!(wizard.step(), WizardStep::Completed);
    assert_eq!(
        backend.calls.lock().expect("calls mutex poisoned").clone(),
        vec![
            "create:Logistics coordinator".to_string(),
            "activate:jp-1001".to_string(),
        ]
    );
    assert!(!store.path().exists());
}
