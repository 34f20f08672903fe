use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use tokio::sync::Notify;

use crate::workflows::posting::{
    AddressLookup, AddressSelection, ApplicationMethod, ApplicationSettings, CompanyProfile,
    CompanyVerification, Compensation, DraftPatch, EducationRequirement, EligibilityEvaluator,
    EligibilityRequest, EligibleVisa, EmploymentType, ExistingPosting, ExperienceRequirement,
    FullTimeCompensation, FullTimeKind, GatewayError, Headcount, MemorySnapshotStore,
    PostingBackend, PostingId, PostingPayload, PostingReceipt, PostingStatus, PostingWizard,
    ValidationPolicy, VisaCode, VisaMatchResult, WeeklySchedule, WizardServices, WizardSettings,
    WizardStep, WorkLocation,
};

pub(super) const QUIET_PERIOD: Duration = Duration::from_secs(3);

pub(super) fn company_profile() -> CompanyProfile {
    CompanyProfile {
        company_name: "Hanbit Precision".to_string(),
        business_number: "123-45-67890".to_string(),
        industry_code: "C25".to_string(),
        employee_count: 42,
        domestic_insured_count: 38,
        foreign_worker_count: 4,
    }
}

pub(super) fn match_result(codes: &[&str]) -> VisaMatchResult {
    VisaMatchResult {
        eligible: codes
            .iter()
            .map(|code| EligibleVisa {
                code: VisaCode::new(*code),
                name: format!("{code} visa"),
                required_documents: vec!["Business registration".to_string()],
                restrictions: Vec::new(),
                notes: Vec::new(),
            })
            .collect(),
        blocked: Vec::new(),
        summary: format!("{} visa types eligible", codes.len()),
        evaluated_at: Utc
            .with_ymd_and_hms(2025, 3, 14, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
    }
}

pub(super) fn visas(codes: &[&str]) -> BTreeSet<VisaCode> {
    codes.iter().map(|code| VisaCode::new(*code)).collect()
}

pub(super) fn weekday_schedule() -> WeeklySchedule {
    WeeklySchedule {
        days: [true, true, true, true, true, false, false],
        start_time: NaiveTime::from_hms_opt(9, 0, 0),
        end_time: NaiveTime::from_hms_opt(18, 0, 0),
    }
}

pub(super) fn basics_patch() -> DraftPatch {
    DraftPatch {
        title: Some("Production line operator".to_string()),
        job_categories: Some(vec!["Manufacturing".to_string()]),
        headcount: Some(Headcount::Exact(2)),
        ..DraftPatch::default()
    }
}

pub(super) fn hourly_conditions_patch(hourly_wage: u32) -> DraftPatch {
    DraftPatch {
        compensation: Some(Compensation::Hourly {
            hourly_wage: Some(hourly_wage),
        }),
        schedule: Some(weekday_schedule()),
        ..DraftPatch::default()
    }
}

pub(super) fn annual_conditions_patch(min: u32) -> DraftPatch {
    DraftPatch {
        compensation: Some(Compensation::Annual(FullTimeCompensation {
            min: Some(min),
            max: None,
            experience: Some(ExperienceRequirement::NotRequired),
            education: Some(EducationRequirement::HighSchool),
        })),
        schedule: Some(weekday_schedule()),
        ..DraftPatch::default()
    }
}

pub(super) fn workplace_patch() -> DraftPatch {
    DraftPatch {
        location: Some(WorkLocation {
            address: "15 Gongdan-ro, Ansan-si".to_string(),
            detail: "Building B".to_string(),
        }),
        description: Some("Operate and monitor stamping presses.".to_string()),
        ..DraftPatch::default()
    }
}

pub(super) fn application_patch() -> DraftPatch {
    DraftPatch {
        application: Some(ApplicationSettings {
            method: Some(ApplicationMethod::Email),
            start_date: NaiveDate::from_ymd_opt(2025, 4, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 4, 30),
            contact: Some("hr@hanbit.example".to_string()),
        }),
        ..DraftPatch::default()
    }
}

/// Payload of a previously published full-time posting.
pub(super) fn existing_posting(id: &str) -> ExistingPosting {
    ExistingPosting {
        id: PostingId(id.to_string()),
        posting: PostingPayload {
            title: "Welding technician".to_string(),
            job_categories: vec!["Welding".to_string()],
            employment_type: EmploymentType::FullTime(FullTimeKind::Permanent),
            headcount: Headcount::Exact(3),
            location: WorkLocation {
                address: "88 Jungang-daero, Busan".to_string(),
                detail: String::new(),
            },
            schedule: crate::workflows::posting::SchedulePayload {
                work_days: vec![chrono::Weekday::Mon, chrono::Weekday::Tue],
                start_time: NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
                end_time: NaiveTime::from_hms_opt(17, 0, 0).expect("valid time"),
            },
            compensation: crate::workflows::posting::CompensationBlock::Monthly {
                min: 280,
                max: Some(320),
                experience: ExperienceRequirement::Experienced { min_years: 2 },
                education: EducationRequirement::HighSchool,
            },
            description: "TIG welding of steel frames.".to_string(),
            requirements: String::new(),
            preferences: String::new(),
            benefits: vec!["Dormitory".to_string()],
            application: ApplicationSettings {
                method: Some(ApplicationMethod::Platform),
                start_date: NaiveDate::from_ymd_opt(2024, 9, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 9, 30),
                contact: None,
            },
            allowed_visas: vec![VisaCode::new("E-9")],
        },
    }
}

#[derive(Default)]
struct BackendState {
    created: Vec<PostingPayload>,
    activations: Vec<PostingId>,
    postings: HashMap<String, ExistingPosting>,
    create_failure: Option<GatewayError>,
    activate_failure: Option<GatewayError>,
    creation_status: Option<PostingStatus>,
    activation_status: Option<PostingStatus>,
    fetch_failure: Option<GatewayError>,
}

/// Records every call and answers with configurable outcomes.
#[derive(Default)]
pub(super) struct MemoryBackend {
    state: Mutex<BackendState>,
    next_id: AtomicUsize,
}

impl MemoryBackend {
    pub(super) fn with_posting(posting: ExistingPosting) -> Self {
        let backend = Self::default();
        backend
            .state
            .lock()
            .expect("backend mutex poisoned")
            .postings
            .insert(posting.id.0.clone(), posting);
        backend
    }

    pub(super) fn fail_create(&self, error: GatewayError) {
        self.state.lock().expect("backend mutex poisoned").create_failure = Some(error);
    }

    pub(super) fn fail_activation(&self, error: GatewayError) {
        self.state.lock().expect("backend mutex poisoned").activate_failure = Some(error);
    }

    pub(super) fn create_with_status(&self, status: PostingStatus) {
        self.state.lock().expect("backend mutex poisoned").creation_status = Some(status);
    }

    pub(super) fn activate_with_status(&self, status: PostingStatus) {
        self.state.lock().expect("backend mutex poisoned").activation_status = Some(status);
    }

    pub(super) fn fail_fetch(&self, error: GatewayError) {
        self.state.lock().expect("backend mutex poisoned").fetch_failure = Some(error);
    }

    pub(super) fn recover(&self) {
        let mut state = self.state.lock().expect("backend mutex poisoned");
        state.create_failure = None;
        state.activate_failure = None;
        state.creation_status = None;
        state.activation_status = None;
    }

    pub(super) fn created(&self) -> Vec<PostingPayload> {
        self.state.lock().expect("backend mutex poisoned").created.clone()
    }

    pub(super) fn activations(&self) -> Vec<PostingId> {
        self.state
            .lock()
            .expect("backend mutex poisoned")
            .activations
            .clone()
    }
}

#[async_trait]
impl PostingBackend for MemoryBackend {
    async fn create_posting(
        &self,
        payload: &PostingPayload,
    ) -> Result<PostingReceipt, GatewayError> {
        let mut state = self.state.lock().expect("backend mutex poisoned");
        if let Some(error) = state.create_failure.clone() {
            return Err(error);
        }
        state.created.push(payload.clone());
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(PostingReceipt {
            id: PostingId(format!("post-{id:04}")),
            status: state.creation_status.unwrap_or(PostingStatus::Inactive),
        })
    }

    async fn activate_posting(&self, id: &PostingId) -> Result<PostingReceipt, GatewayError> {
        let mut state = self.state.lock().expect("backend mutex poisoned");
        state.activations.push(id.clone());
        if let Some(error) = state.activate_failure.clone() {
            return Err(error);
        }
        Ok(PostingReceipt {
            id: id.clone(),
            status: state.activation_status.unwrap_or(PostingStatus::Active),
        })
    }

    async fn fetch_posting(&self, id: &PostingId) -> Result<ExistingPosting, GatewayError> {
        let state = self.state.lock().expect("backend mutex poisoned");
        if let Some(error) = state.fetch_failure.clone() {
            return Err(error);
        }
        state.postings.get(&id.0).cloned().ok_or(GatewayError::NotFound)
    }
}

pub(super) struct MemoryVerification {
    profile: Mutex<Result<Option<CompanyProfile>, GatewayError>>,
    calls: AtomicUsize,
}

impl MemoryVerification {
    pub(super) fn verified() -> Self {
        Self {
            profile: Mutex::new(Ok(Some(company_profile()))),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn unverified() -> Self {
        Self {
            profile: Mutex::new(Ok(None)),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn set(&self, profile: Result<Option<CompanyProfile>, GatewayError>) {
        *self.profile.lock().expect("profile mutex poisoned") = profile;
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CompanyVerification for MemoryVerification {
    async fn company_profile(&self) -> Result<Option<CompanyProfile>, GatewayError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.profile.lock().expect("profile mutex poisoned").clone()
    }
}

/// Returns a fixed result; optionally parks each call until released.
pub(super) struct StaticEvaluator {
    result: Mutex<Result<VisaMatchResult, GatewayError>>,
    requests: Mutex<Vec<EligibilityRequest>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl StaticEvaluator {
    pub(super) fn eligible(codes: &[&str]) -> Self {
        Self {
            result: Mutex::new(Ok(match_result(codes))),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Each call signals `entered` and then waits for `release`.
    pub(super) fn gated(codes: &[&str], entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((entered, release)),
            ..Self::eligible(codes)
        }
    }

    pub(super) fn set(&self, result: Result<VisaMatchResult, GatewayError>) {
        *self.result.lock().expect("evaluator mutex poisoned") = result;
    }

    pub(super) fn requests(&self) -> Vec<EligibilityRequest> {
        self.requests
            .lock()
            .expect("evaluator mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl EligibilityEvaluator for StaticEvaluator {
    async fn evaluate(
        &self,
        request: &EligibilityRequest,
    ) -> Result<VisaMatchResult, GatewayError> {
        self.requests
            .lock()
            .expect("evaluator mutex poisoned")
            .push(request.clone());
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        self.result.lock().expect("evaluator mutex poisoned").clone()
    }
}

pub(super) struct FixedAddress(pub(super) Result<Option<AddressSelection>, GatewayError>);

#[async_trait]
impl AddressLookup for FixedAddress {
    async fn search_address(
        &self,
        _mount_point: Option<&str>,
    ) -> Result<Option<AddressSelection>, GatewayError> {
        self.0.clone()
    }
}

/// Collaborators wired into a wizard, kept accessible for assertions.
pub(super) struct Harness {
    pub(super) backend: Arc<MemoryBackend>,
    pub(super) verification: Arc<MemoryVerification>,
    pub(super) evaluator: Arc<StaticEvaluator>,
    pub(super) store: Arc<MemorySnapshotStore>,
}

impl Harness {
    pub(super) fn new() -> Self {
        Self::with(
            MemoryBackend::default(),
            MemoryVerification::verified(),
            StaticEvaluator::eligible(&["E-9", "H-2"]),
            MemorySnapshotStore::default(),
        )
    }

    pub(super) fn with(
        backend: MemoryBackend,
        verification: MemoryVerification,
        evaluator: StaticEvaluator,
        store: MemorySnapshotStore,
    ) -> Self {
        Self {
            backend: Arc::new(backend),
            verification: Arc::new(verification),
            evaluator: Arc::new(evaluator),
            store: Arc::new(store),
        }
    }

    pub(super) fn services(&self) -> WizardServices {
        WizardServices {
            backend: self.backend.clone(),
            verification: self.verification.clone(),
            evaluator: self.evaluator.clone(),
            store: self.store.clone(),
        }
    }

    pub(super) fn settings() -> WizardSettings {
        WizardSettings {
            autosave_quiet_period: QUIET_PERIOD,
            validation: ValidationPolicy::default(),
        }
    }

    pub(super) fn wizard(&self) -> PostingWizard {
        PostingWizard::new(self.services(), Self::settings())
    }

    pub(super) async fn start(&self, duplicate_from: Option<&str>) -> PostingWizard {
        PostingWizard::start(
            self.services(),
            Self::settings(),
            duplicate_from.map(|id| PostingId(id.to_string())),
        )
        .await
    }
}

/// Part-time wizard advanced to step 4 with eligible visas merged.
pub(super) async fn wizard_at_visas(harness: &Harness) -> PostingWizard {
    let mut wizard = harness.wizard();
    wizard
        .set_employment_type(EmploymentType::PartTime)
        .expect("editable");
    wizard.update_fields(basics_patch()).expect("basics");
    wizard.go_next().await.expect("leave basics");
    wizard
        .update_fields(hourly_conditions_patch(10_030))
        .expect("conditions");
    wizard.go_next().await.expect("leave conditions");
    wizard.update_fields(workplace_patch()).expect("workplace");
    wizard.go_next().await.expect("leave workplace");
    assert_eq!(wizard.step(), WizardStep::VisasAndApplication);
    wizard
}

pub(super) async fn wizard_at_review(harness: &Harness) -> PostingWizard {
    let mut wizard = wizard_at_visas(harness).await;
    wizard
        .update_fields(application_patch())
        .expect("application");
    wizard.go_next().await.expect("leave visas");
    assert_eq!(wizard.step(), WizardStep::Review);
    wizard
}
