//! Multi-step job posting creation wizard.
//!
//! [`PostingWizard`] owns the in-progress draft and sequences per-step validation, visa
//! eligibility matching, debounced draft persistence and the create-then-activate submission.
//! Remote collaborators are reached through the traits in [`gateway`].

pub mod activity;
pub mod domain;
pub mod eligibility;
pub mod gateway;
pub mod http;
pub mod notice;
pub mod persistence;
pub mod router;
pub mod sessions;
pub mod step;
pub mod submission;
pub mod validation;
mod wizard;

#[cfg(test)]
mod tests;

pub use activity::{ActivityGuard, PendingOperation, WizardActivity};
pub use domain::{
    fields, ApplicationMethod, ApplicationSettings, Compensation, DraftPatch,
    EducationRequirement, EmploymentCategory, EmploymentType, ExperienceRequirement,
    FullTimeCompensation, FullTimeKind, Headcount, JobPostingDraft, PostingId, SalaryType,
    VisaCode, WeeklySchedule, WorkLocation,
};
pub use eligibility::{
    monthly_equivalent, BlockedVisa, CompanyProfile, CompensationError, EligibilityMatcher,
    EligibilityRequest, EligibleVisa, MatchError, VisaMatchResult,
};
pub use gateway::{
    AddressLookup, AddressSelection, CompanyVerification, EligibilityEvaluator, ExistingPosting,
    GatewayError, PostingBackend, PostingReceipt, PostingStatus,
};
pub use http::HttpPostingGateway;
pub use notice::{Notice, NoticeKind};
pub use persistence::{
    DraftAutosave, DraftSnapshot, FileSnapshotStore, MemorySnapshotStore, SaveOutcome,
    SnapshotStore, StorageError, DEFAULT_QUIET_PERIOD, DRAFT_STORAGE_KEY,
};
pub use router::{wizard_router, wizard_status};
pub use sessions::{
    SessionError, SessionSnapshot, WizardSessions, DEFAULT_SESSION_IDLE_TIMEOUT,
};
pub use step::{InvalidStep, WizardStep};
pub use submission::{
    CompensationBlock, IncompleteDraft, PostingPayload, SchedulePayload, SubmissionError,
    SubmissionPipeline,
};
pub use validation::{owning_step, StepValidator, ValidationErrorSet, ValidationPolicy};
pub use wizard::{
    DraftOrigin, PostingWizard, WizardError, WizardServices, WizardSettings, WizardView,
};
