use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::activity::{PendingOperation, WizardActivity};
use super::domain::{fields, DraftPatch, EmploymentType, JobPostingDraft, PostingId, SalaryType};
use super::eligibility::{EligibilityMatcher, MatchError, VisaMatchResult};
use super::gateway::{
    AddressLookup, CompanyVerification, EligibilityEvaluator, GatewayError, PostingBackend,
    PostingReceipt,
};
use super::notice::{Notice, NoticeKind};
use super::persistence::{
    DraftAutosave, DraftSnapshot, SaveOutcome, SnapshotStore, DEFAULT_QUIET_PERIOD,
};
use super::step::WizardStep;
use super::submission::{SubmissionError, SubmissionPipeline};
use super::validation::{owning_step, StepValidator, ValidationErrorSet, ValidationPolicy};

/// Collaborators injected into a wizard session.
#[derive(Clone)]
pub struct WizardServices {
    pub backend: Arc<dyn PostingBackend>,
    pub verification: Arc<dyn CompanyVerification>,
    pub evaluator: Arc<dyn EligibilityEvaluator>,
    pub store: Arc<dyn SnapshotStore>,
}

#[derive(Debug, Clone)]
pub struct WizardSettings {
    pub autosave_quiet_period: Duration,
    pub validation: ValidationPolicy,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            autosave_quiet_period: DEFAULT_QUIET_PERIOD,
            validation: ValidationPolicy::default(),
        }
    }
}

/// How the current draft came to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftOrigin {
    Empty,
    Restored { saved_at: DateTime<Utc> },
    Duplicated { source: PostingId },
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("{} has {} invalid field(s)", .step.label(), .errors.len())]
    Validation {
        step: WizardStep,
        errors: ValidationErrorSet,
    },
    #[error(transparent)]
    Matching(#[from] MatchError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("address lookup failed: {0}")]
    AddressLookup(#[source] GatewayError),
    #[error("{0:?} is already in progress")]
    Busy(PendingOperation),
    #[error("the posting has been submitted; the draft can no longer change")]
    Finalized,
    #[error("already at the first step")]
    AtFirstStep,
    #[error("cannot jump forward from step {} to step {}", .from.number(), .to.number())]
    ForwardJump { from: WizardStep, to: WizardStep },
    #[error("step {} has not been completed", .0.number())]
    StepNotCompleted(WizardStep),
    #[error("the review step is confirmed by submitting the posting")]
    SubmissionRequired,
    #[error("submission is only available from the review step (current step {})", .0.number())]
    NotAtReview(WizardStep),
    #[error("{salary_type:?} pay is not available for {} postings", .employment_type.label())]
    CompensationMismatch {
        employment_type: EmploymentType,
        salary_type: SalaryType,
    },
    #[error("no inactive posting is awaiting activation")]
    NothingToActivate,
}

/// Serializable state exposed to presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub step: WizardStep,
    pub step_label: &'static str,
    pub completed_steps: Vec<WizardStep>,
    pub draft: JobPostingDraft,
    pub errors: ValidationErrorSet,
    pub origin: DraftOrigin,
    pub matching: bool,
    pub submitting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_match: Option<VisaMatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<PostingReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orphaned_posting: Option<PostingId>,
    pub warn_before_unload: bool,
}

/// Owns the draft and current step, and sequences validation, matching, navigation and
/// submission.
pub struct PostingWizard {
    draft: JobPostingDraft,
    step: WizardStep,
    completed: BTreeSet<WizardStep>,
    errors: ValidationErrorSet,
    origin: DraftOrigin,
    notices: Vec<Notice>,
    last_match: Option<VisaMatchResult>,
    receipt: Option<PostingReceipt>,
    orphaned_posting: Option<PostingId>,
    activity: WizardActivity,
    validator: StepValidator,
    matcher: EligibilityMatcher,
    pipeline: SubmissionPipeline,
    backend: Arc<dyn PostingBackend>,
    autosave: DraftAutosave,
}

impl PostingWizard {
    /// Empty wizard at step 1. Storage is not consulted; see [`PostingWizard::start`].
    pub fn new(services: WizardServices, settings: WizardSettings) -> Self {
        let WizardServices {
            backend,
            verification,
            evaluator,
            store,
        } = services;

        Self {
            draft: JobPostingDraft::default(),
            step: WizardStep::Basics,
            completed: BTreeSet::new(),
            errors: ValidationErrorSet::new(),
            origin: DraftOrigin::Empty,
            notices: Vec::new(),
            last_match: None,
            receipt: None,
            orphaned_posting: None,
            activity: WizardActivity::default(),
            validator: StepValidator::new(settings.validation),
            matcher: EligibilityMatcher::new(verification, evaluator),
            pipeline: SubmissionPipeline::new(Arc::clone(&backend)),
            backend,
            autosave: DraftAutosave::new(store, settings.autosave_quiet_period),
        }
    }

    /// Mount the wizard. A duplication source takes precedence over the stored snapshot; if
    /// the source cannot be fetched the wizard falls back to normal initialization.
    pub async fn start(
        services: WizardServices,
        settings: WizardSettings,
        duplicate_from: Option<PostingId>,
    ) -> Self {
        let mut wizard = Self::new(services, settings);

        if let Some(source) = duplicate_from {
            match wizard.backend.fetch_posting(&source).await {
                Ok(existing) => {
                    info!(source = %source, "prepopulating draft from existing posting");
                    wizard.draft = existing.posting.into_duplicate_draft();
                    wizard.origin = DraftOrigin::Duplicated { source };
                    return wizard;
                }
                Err(err) => {
                    warn!(source = %source, error = %err, "posting for duplication unavailable");
                    wizard.notices.push(Notice::new(
                        NoticeKind::DuplicateUnavailable,
                        format!("The posting to copy could not be loaded: {err}"),
                    ));
                }
            }
        }

        wizard.restore();
        wizard
    }

    /// Hydrate from the stored snapshot. Effective at most once per session.
    pub fn restore(&mut self) -> bool {
        let Some(snapshot) = self.autosave.restore() else {
            return false;
        };
        let DraftSnapshot {
            draft,
            step,
            saved_at,
        } = snapshot;

        self.draft = draft;
        self.completed = BTreeSet::new();
        self.step = step;
        for earlier in WizardStep::ordered().into_iter().filter(|earlier| *earlier < step) {
            if !self.validator.validate(earlier, &self.draft).is_empty() {
                self.step = earlier;
                break;
            }
            self.completed.insert(earlier);
        }
        self.origin = DraftOrigin::Restored { saved_at };
        info!(
            stored = step.number(),
            step = self.step.number(),
            "resumed draft from snapshot"
        );
        true
    }

    pub fn draft(&self) -> &JobPostingDraft {
        &self.draft
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn errors(&self) -> &ValidationErrorSet {
        &self.errors
    }

    pub fn origin(&self) -> &DraftOrigin {
        &self.origin
    }

    pub fn is_completed(&self, step: WizardStep) -> bool {
        self.completed.contains(&step)
    }

    pub fn last_match(&self) -> Option<&VisaMatchResult> {
        self.last_match.as_ref()
    }

    pub fn receipt(&self) -> Option<&PostingReceipt> {
        self.receipt.as_ref()
    }

    /// Posting created by a submission whose activation failed.
    pub fn orphaned_posting(&self) -> Option<&PostingId> {
        self.orphaned_posting.as_ref()
    }

    pub fn activity(&self) -> WizardActivity {
        self.activity.clone()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn has_pending_autosave(&self) -> bool {
        self.autosave.has_pending()
    }

    /// Advisory only: leaving now would discard a non-empty, unsubmitted draft.
    pub fn should_warn_before_unload(&self) -> bool {
        !self.step.is_terminal() && !self.draft.is_blank()
    }

    pub fn view(&self) -> WizardView {
        WizardView {
            step: self.step,
            step_label: self.step.label(),
            completed_steps: self.completed.iter().copied().collect(),
            draft: self.draft.clone(),
            errors: self.errors.clone(),
            origin: self.origin.clone(),
            matching: self.activity.is_matching(),
            submitting: self.activity.is_submitting(),
            last_match: self.last_match.clone(),
            receipt: self.receipt.clone(),
            orphaned_posting: self.orphaned_posting.clone(),
            warn_before_unload: self.should_warn_before_unload(),
        }
    }

    pub fn update_fields(&mut self, patch: DraftPatch) -> Result<(), WizardError> {
        self.ensure_editable()?;

        if let Some(compensation) = &patch.compensation {
            let salary_type = compensation.salary_type();
            let employment_type = self.draft.employment_type;
            if !salary_type.permitted_for(employment_type.category()) {
                return Err(WizardError::CompensationMismatch {
                    employment_type,
                    salary_type,
                });
            }
        }

        let touched = patch.apply(&mut self.draft);
        for path in &touched {
            self.errors.clear_path(path);
        }
        let earliest = touched.iter().filter_map(|path| owning_step(path)).min();
        if let Some(step) = earliest {
            self.revalidate_completed_from(step);
        }
        self.schedule_autosave();
        Ok(())
    }

    pub fn set_employment_type(
        &mut self,
        employment_type: EmploymentType,
    ) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.draft.set_employment_type(employment_type);
        self.errors.clear_path(fields::COMPENSATION);
        self.revalidate_completed_from(WizardStep::Conditions);
        self.schedule_autosave();
        Ok(())
    }

    /// Validate the current step and advance. Leaving the workplace step additionally awaits
    /// visa matching and unions the eligible codes into the draft.
    pub async fn go_next(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_editable()?;
        let current = self.step;
        let next = match current.next() {
            Some(next) if !next.is_terminal() => next,
            _ => return Err(WizardError::SubmissionRequired),
        };

        self.gate(current)?;

        if current == WizardStep::Workplace {
            self.match_visas().await?;
        }

        self.completed.insert(current);
        self.move_to(next);
        Ok(next)
    }

    /// Step back without validation.
    pub fn go_back(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_editable()?;
        let previous = self.step.previous().ok_or(WizardError::AtFirstStep)?;
        self.move_to(previous);
        Ok(previous)
    }

    /// Jump back to a completed step. Forward jumps are rejected.
    pub fn go_to_step(&mut self, target: WizardStep) -> Result<WizardStep, WizardError> {
        self.ensure_editable()?;
        if target >= self.step {
            return Err(WizardError::ForwardJump {
                from: self.step,
                to: target,
            });
        }
        if !self.completed.contains(&target) {
            return Err(WizardError::StepNotCompleted(target));
        }
        self.move_to(target);
        Ok(target)
    }

    /// Manual save: writes immediately and confirms to the user.
    pub fn save_now(&mut self) -> Result<SaveOutcome, WizardError> {
        self.ensure_editable()?;
        let outcome = self.autosave.save_now(&self.draft, self.step);
        if outcome == SaveOutcome::Saved {
            self.notices.push(Notice::new(NoticeKind::DraftSaved, "Draft saved"));
        }
        Ok(outcome)
    }

    /// Invoke the injected address widget and apply the selected address.
    pub async fn search_address(
        &mut self,
        lookup: &dyn AddressLookup,
        mount_point: Option<&str>,
    ) -> Result<bool, WizardError> {
        self.ensure_editable()?;
        match lookup.search_address(mount_point).await {
            Ok(Some(selection)) => {
                self.draft.location.address = selection.road_address;
                self.errors.clear_path(fields::LOCATION_ADDRESS);
                self.schedule_autosave();
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => {
                self.notices.push(Notice::new(
                    NoticeKind::Network,
                    format!("Address search is unavailable: {err}"),
                ));
                Err(WizardError::AddressLookup(err))
            }
        }
    }

    /// Re-validate the application settings and commit through the two-phase pipeline.
    pub async fn submit(&mut self) -> Result<PostingReceipt, WizardError> {
        self.ensure_editable()?;
        if self.step != WizardStep::Review {
            return Err(WizardError::NotAtReview(self.step));
        }
        let _submitting = self
            .activity
            .try_begin(PendingOperation::Submitting)
            .ok_or(WizardError::Busy(PendingOperation::Submitting))?;

        self.gate_editable_steps()?;

        match self.pipeline.submit(&self.draft).await {
            Ok(receipt) => {
                self.finalize(receipt.clone());
                Ok(receipt)
            }
            Err(err) => Err(self.submission_failed(err)),
        }
    }

    /// Retry only the activation phase for a posting left inactive by a previous submission.
    pub async fn retry_activation(&mut self) -> Result<PostingReceipt, WizardError> {
        self.ensure_editable()?;
        let posting_id = self
            .orphaned_posting
            .clone()
            .ok_or(WizardError::NothingToActivate)?;
        let _submitting = self
            .activity
            .try_begin(PendingOperation::Submitting)
            .ok_or(WizardError::Busy(PendingOperation::Submitting))?;

        match self.pipeline.activate(posting_id).await {
            Ok(receipt) => {
                self.finalize(receipt.clone());
                Ok(receipt)
            }
            Err(err) => Err(self.submission_failed(err)),
        }
    }
}

impl PostingWizard {
    fn ensure_editable(&self) -> Result<(), WizardError> {
        if self.step.is_terminal() {
            Err(WizardError::Finalized)
        } else {
            Ok(())
        }
    }

    fn gate(&mut self, step: WizardStep) -> Result<(), WizardError> {
        let errors = self.validator.validate(step, &self.draft);
        if errors.is_empty() {
            return Ok(());
        }

        self.completed.remove(&step);
        self.errors = errors.clone();
        self.notices.push(Notice::new(
            NoticeKind::ValidationFailed,
            format!("Check the highlighted fields in {}", step.label()),
        ));
        info!(step = step.number(), invalid = errors.len(), "step validation failed");
        Err(WizardError::Validation { step, errors })
    }

    /// Completed steps from `from` onwards lose their status at the first one whose fields
    /// no longer validate.
    fn revalidate_completed_from(&mut self, from: WizardStep) {
        let invalid = self
            .completed
            .iter()
            .copied()
            .filter(|step| *step >= from)
            .find(|step| !self.validator.validate(*step, &self.draft).is_empty());
        if let Some(step) = invalid {
            self.completed.retain(|completed| *completed < step);
            info!(step = step.number(), "completed step invalidated by edit");
        }
    }

    /// Gate every editable step in order. The wizard moves to the first failing step so its
    /// errors are shown where they can be fixed.
    fn gate_editable_steps(&mut self) -> Result<(), WizardError> {
        let failing = WizardStep::ordered()
            .into_iter()
            .filter(|step| *step < WizardStep::Review)
            .find(|step| !self.validator.validate(*step, &self.draft).is_empty());
        match failing {
            Some(step) => {
                if step != self.step {
                    self.move_to(step);
                }
                self.completed.retain(|completed| *completed < step);
                self.gate(step)
            }
            None => Ok(()),
        }
    }

    async fn match_visas(&mut self) -> Result<(), WizardError> {
        let _matching = self
            .activity
            .try_begin(PendingOperation::Matching)
            .ok_or(WizardError::Busy(PendingOperation::Matching))?;

        match self.matcher.evaluate(&self.draft).await {
            Ok(result) => {
                let before = self.draft.allowed_visas.len();
                self.draft
                    .allowed_visas
                    .extend(result.eligible_codes().cloned());
                info!(
                    added = self.draft.allowed_visas.len() - before,
                    retained = before,
                    "merged eligible visas into draft"
                );
                self.last_match = Some(result);
                Ok(())
            }
            Err(err) => {
                let notice = match &err {
                    MatchError::ProfileMissing => Notice::new(
                        NoticeKind::ProfileMissing,
                        "Complete company verification before matching eligible visas",
                    ),
                    MatchError::Compensation(_) => {
                        Notice::new(NoticeKind::ValidationFailed, err.to_string())
                    }
                    MatchError::ProfileUnavailable(_) | MatchError::Evaluation(_) => {
                        Notice::new(NoticeKind::Network, err.to_string())
                    }
                };
                warn!(error = %err, "visa matching failed");
                self.notices.push(notice);
                Err(err.into())
            }
        }
    }

    fn move_to(&mut self, step: WizardStep) {
        info!(from = self.step.number(), to = step.number(), "wizard step changed");
        self.step = step;
        self.errors.clear();
        self.schedule_autosave();
    }

    fn schedule_autosave(&mut self) {
        self.autosave.schedule(&self.draft, self.step);
    }

    fn finalize(&mut self, receipt: PostingReceipt) {
        self.autosave.clear();
        self.completed.insert(WizardStep::Review);
        self.orphaned_posting = None;
        self.errors.clear();
        info!(posting_id = %receipt.id, "posting published");
        self.receipt = Some(receipt);
        self.step = WizardStep::Completed;
    }

    fn submission_failed(&mut self, err: SubmissionError) -> WizardError {
        let notice = match &err {
            SubmissionError::PartialActivation { posting_id, .. } => {
                self.orphaned_posting = Some(posting_id.clone());
                Notice::new(NoticeKind::PartialActivation, err.to_string())
                    .with_posting(posting_id.clone())
            }
            SubmissionError::Incomplete(_) => {
                Notice::new(NoticeKind::ValidationFailed, err.to_string())
            }
            SubmissionError::Create(_) => Notice::new(NoticeKind::Network, err.to_string()),
        };
        warn!(error = %err, "submission failed");
        self.notices.push(notice);
        err.into()
    }
}

impl std::fmt::Debug for PostingWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostingWizard")
            .field("step", &self.step)
            .field("completed", &self.completed)
            .field("errors", &self.errors)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}
