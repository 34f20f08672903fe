use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    fields, ApplicationSettings, Compensation, EducationRequirement, EmploymentType,
    ExperienceRequirement, FullTimeCompensation, Headcount, JobPostingDraft, PostingId, VisaCode,
    WeeklySchedule, WorkLocation,
};
use super::gateway::{GatewayError, PostingBackend, PostingReceipt, PostingStatus};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Variant-specific compensation block sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "salary_type", rename_all = "snake_case")]
pub enum CompensationBlock {
    Hourly {
        hourly_wage: u32,
    },
    Monthly {
        min: u32,
        max: Option<u32>,
        experience: ExperienceRequirement,
        education: EducationRequirement,
    },
    Annual {
        min: u32,
        max: Option<u32>,
        experience: ExperienceRequirement,
        education: EducationRequirement,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePayload {
    pub work_days: Vec<Weekday>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Creation payload: the draft with every optional field resolved. Lifecycle state is not
/// part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingPayload {
    pub title: String,
    pub job_categories: Vec<String>,
    pub employment_type: EmploymentType,
    pub headcount: Headcount,
    pub location: WorkLocation,
    pub schedule: SchedulePayload,
    pub compensation: CompensationBlock,
    pub description: String,
    pub requirements: String,
    pub preferences: String,
    pub benefits: Vec<String>,
    pub application: ApplicationSettings,
    pub allowed_visas: Vec<VisaCode>,
}

/// Draft field that must be filled before the payload can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("draft is missing required field `{0}`")]
pub struct IncompleteDraft(pub &'static str);

impl TryFrom<&JobPostingDraft> for PostingPayload {
    type Error = IncompleteDraft;

    fn try_from(draft: &JobPostingDraft) -> Result<Self, Self::Error> {
        let schedule = SchedulePayload {
            work_days: WEEK
                .iter()
                .zip(draft.schedule.days.iter())
                .filter(|(_, worked)| **worked)
                .map(|(day, _)| *day)
                .collect(),
            start_time: draft
                .schedule
                .start_time
                .ok_or(IncompleteDraft(fields::SCHEDULE_START))?,
            end_time: draft
                .schedule
                .end_time
                .ok_or(IncompleteDraft(fields::SCHEDULE_END))?,
        };

        Ok(Self {
            title: draft.title.trim().to_string(),
            job_categories: draft.job_categories.clone(),
            employment_type: draft.employment_type,
            headcount: draft.headcount,
            location: draft.location.clone(),
            schedule,
            compensation: compensation_block(&draft.compensation)?,
            description: draft.description.clone(),
            requirements: draft.requirements.clone(),
            preferences: draft.preferences.clone(),
            benefits: draft.benefits.iter().cloned().collect(),
            application: draft.application.clone(),
            allowed_visas: draft.allowed_visas.iter().cloned().collect(),
        })
    }
}

fn compensation_block(compensation: &Compensation) -> Result<CompensationBlock, IncompleteDraft> {
    fn terms(
        terms: &FullTimeCompensation,
    ) -> Result<(u32, Option<u32>, ExperienceRequirement, EducationRequirement), IncompleteDraft>
    {
        Ok((
            terms.min.ok_or(IncompleteDraft(fields::SALARY_MIN))?,
            terms.max,
            terms.experience.ok_or(IncompleteDraft(fields::EXPERIENCE))?,
            terms.education.ok_or(IncompleteDraft(fields::EDUCATION))?,
        ))
    }

    Ok(match compensation {
        Compensation::Hourly { hourly_wage } => CompensationBlock::Hourly {
            hourly_wage: hourly_wage.ok_or(IncompleteDraft(fields::HOURLY_WAGE))?,
        },
        Compensation::Monthly(full_time) => {
            let (min, max, experience, education) = terms(full_time)?;
            CompensationBlock::Monthly {
                min,
                max,
                experience,
                education,
            }
        }
        Compensation::Annual(full_time) => {
            let (min, max, experience, education) = terms(full_time)?;
            CompensationBlock::Annual {
                min,
                max,
                experience,
                education,
            }
        }
    })
}

impl PostingPayload {
    /// Prepopulate a new draft from an existing posting. Visa eligibility must be matched
    /// again and the application window chosen anew.
    pub fn into_duplicate_draft(self) -> JobPostingDraft {
        let mut days = [false; 7];
        for day in &self.schedule.work_days {
            days[day.num_days_from_monday() as usize] = true;
        }

        let compensation = match self.compensation {
            CompensationBlock::Hourly { hourly_wage } => Compensation::Hourly {
                hourly_wage: Some(hourly_wage),
            },
            CompensationBlock::Monthly {
                min,
                max,
                experience,
                education,
            } => Compensation::Monthly(FullTimeCompensation {
                min: Some(min),
                max,
                experience: Some(experience),
                education: Some(education),
            }),
            CompensationBlock::Annual {
                min,
                max,
                experience,
                education,
            } => Compensation::Annual(FullTimeCompensation {
                min: Some(min),
                max,
                experience: Some(experience),
                education: Some(education),
            }),
        };

        let mut draft = JobPostingDraft {
            title: self.title,
            job_categories: self.job_categories,
            employment_type: self.employment_type,
            headcount: self.headcount,
            location: self.location,
            schedule: WeeklySchedule {
                days,
                start_time: Some(self.schedule.start_time),
                end_time: Some(self.schedule.end_time),
            },
            compensation,
            description: self.description,
            requirements: self.requirements,
            preferences: self.preferences,
            benefits: self.benefits.into_iter().collect::<BTreeSet<_>>(),
            application: ApplicationSettings {
                start_date: None,
                end_date: None,
                ..self.application
            },
            allowed_visas: BTreeSet::new(),
        };

        if !draft
            .compensation
            .salary_type()
            .permitted_for(draft.employment_type.category())
        {
            draft.compensation = draft.employment_type.default_compensation();
        }
        draft
    }
}

/// Failure of the two-phase commit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Incomplete(#[from] IncompleteDraft),
    #[error("posting could not be created: {0}")]
    Create(#[source] GatewayError),
    #[error("posting {posting_id} was created but could not be activated: {source}")]
    PartialActivation {
        posting_id: PostingId,
        #[source]
        source: GatewayError,
    },
}

/// Create-inactive then activate. A failed activation leaves the inactive posting in place;
/// no compensating action is taken.
#[derive(Clone)]
pub struct SubmissionPipeline {
    backend: Arc<dyn PostingBackend>,
}

impl SubmissionPipeline {
    pub fn new(backend: Arc<dyn PostingBackend>) -> Self {
        Self { backend }
    }

    pub async fn submit(&self, draft: &JobPostingDraft) -> Result<PostingReceipt, SubmissionError> {
        let payload = PostingPayload::try_from(draft)?;

        let created = self
            .backend
            .create_posting(&payload)
            .await
            .and_then(|receipt| expect_status(receipt, PostingStatus::Inactive))
            .map_err(SubmissionError::Create)?;
        info!(posting_id = %created.id, status = ?created.status, "posting created");

        self.activate(created.id).await
    }

    /// Second phase on its own, for a posting that already exists in the inactive state.
    pub async fn activate(&self, posting_id: PostingId) -> Result<PostingReceipt, SubmissionError> {
        let activated = self
            .backend
            .activate_posting(&posting_id)
            .await
            .and_then(|receipt| expect_status(receipt, PostingStatus::Active));

        match activated {
            Ok(receipt) => {
                info!(posting_id = %receipt.id, "posting activated");
                Ok(receipt)
            }
            Err(source) => {
                warn!(%posting_id, error = %source, "posting left inactive after activation failure");
                Err(SubmissionError::PartialActivation { posting_id, source })
            }
        }
    }
}

fn expect_status(
    receipt: PostingReceipt,
    expected: PostingStatus,
) -> Result<PostingReceipt, GatewayError> {
    if receipt.status == expected {
        Ok(receipt)
    } else {
        Err(GatewayError::UnexpectedStatus {
            expected,
            found: receipt.status,
        })
    }
}

impl std::fmt::Debug for SubmissionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPipeline").finish_non_exhaustive()
    }
}
