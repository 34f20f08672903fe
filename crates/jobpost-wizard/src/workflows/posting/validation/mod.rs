//! Per-step schema checks producing field-keyed error maps.
//!
//! Validation is pure: it inspects only the fields owned by the requested step and never
//! mutates the draft.

mod compensation;
mod rules;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{fields, JobPostingDraft};
use super::step::WizardStep;

pub use compensation::CompensationShape;

const DEFAULT_MINIMUM_HOURLY_WAGE: u32 = 9_860;
const DEFAULT_MAX_TITLE_CHARS: usize = 100;
const DEFAULT_MAX_JOB_CATEGORIES: usize = 3;

/// Tunable limits applied by the step schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Statutory minimum hourly wage in KRW.
    pub minimum_hourly_wage: u32,
    pub max_title_chars: usize,
    pub max_job_categories: usize,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            minimum_hourly_wage: DEFAULT_MINIMUM_HOURLY_WAGE,
            max_title_chars: DEFAULT_MAX_TITLE_CHARS,
            max_job_categories: DEFAULT_MAX_JOB_CATEGORIES,
        }
    }
}

/// Field path to message map scoped to a single step. The first error recorded for a field
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrorSet {
    errors: BTreeMap<String, String>,
}

impl ValidationErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: &str, message: impl Into<String>) {
        self.errors
            .entry(path.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.errors.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.errors.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors
            .iter()
            .map(|(path, message)| (path.as_str(), message.as_str()))
    }

    /// Remove the error for `path` and for every path nested beneath it.
    pub fn clear_path(&mut self, path: &str) {
        let nested = format!("{path}.");
        self.errors
            .retain(|key, _| key != path && !key.starts_with(&nested));
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }
}

/// Stateless validator dispatching to the schema owned by each step.
#[derive(Debug, Clone, Default)]
pub struct StepValidator {
    policy: ValidationPolicy,
}

impl StepValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn validate(&self, step: WizardStep, draft: &JobPostingDraft) -> ValidationErrorSet {
        let mut errors = ValidationErrorSet::new();
        match step {
            WizardStep::Basics => rules::basics(draft, &self.policy, &mut errors),
            WizardStep::Conditions => rules::conditions(draft, &self.policy, &mut errors),
            WizardStep::Workplace => rules::workplace(draft, &mut errors),
            WizardStep::VisasAndApplication => rules::visas_and_application(draft, &mut errors),
            WizardStep::Review | WizardStep::Completed => {}
        }
        errors
    }
}

/// Step whose schema owns the field at `path`.
pub fn owning_step(path: &str) -> Option<WizardStep> {
    let root = path.split('.').next().unwrap_or(path);
    match root {
        fields::TITLE | fields::JOB_CATEGORIES | fields::HEADCOUNT => Some(WizardStep::Basics),
        fields::COMPENSATION | fields::SCHEDULE => Some(WizardStep::Conditions),
        fields::LOCATION
        | fields::DESCRIPTION
        | fields::REQUIREMENTS
        | fields::PREFERENCES
        | fields::BENEFITS => Some(WizardStep::Workplace),
        fields::ALLOWED_VISAS | fields::APPLICATION => Some(WizardStep::VisasAndApplication),
        _ => None,
    }
}
