use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Field paths used to key validation errors and patch bookkeeping.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const JOB_CATEGORIES: &str = "job_categories";
    pub const HEADCOUNT: &str = "headcount";
    pub const COMPENSATION: &str = "compensation";
    pub const HOURLY_WAGE: &str = "compensation.hourly_wage";
    pub const SALARY_MIN: &str = "compensation.min";
    pub const SALARY_MAX: &str = "compensation.max";
    pub const EXPERIENCE: &str = "compensation.experience";
    pub const EDUCATION: &str = "compensation.education";
    pub const SCHEDULE: &str = "schedule";
    pub const SCHEDULE_DAYS: &str = "schedule.days";
    pub const SCHEDULE_START: &str = "schedule.start_time";
    pub const SCHEDULE_END: &str = "schedule.end_time";
    pub const LOCATION: &str = "location";
    pub const LOCATION_ADDRESS: &str = "location.address";
    pub const DESCRIPTION: &str = "description";
    pub const REQUIREMENTS: &str = "requirements";
    pub const PREFERENCES: &str = "preferences";
    pub const BENEFITS: &str = "benefits";
    pub const ALLOWED_VISAS: &str = "allowed_visas";
    pub const APPLICATION: &str = "application";
    pub const APPLICATION_METHOD: &str = "application.method";
    pub const APPLICATION_START: &str = "application.start_date";
    pub const APPLICATION_END: &str = "application.end_date";
    pub const APPLICATION_CONTACT: &str = "application.contact";
}

/// Identifier assigned by the backend once a posting has been created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostingId(pub String);

impl fmt::Display for PostingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Visa classification code such as `E-9` or `H-2`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VisaCode(pub String);

impl VisaCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullTimeKind {
    Permanent,
    Contract,
}

/// Employment arrangement offered by the posting. Drives the compensation schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime(FullTimeKind),
    PartTime,
}

impl EmploymentType {
    pub const fn category(self) -> EmploymentCategory {
        match self {
            Self::FullTime(_) => EmploymentCategory::FullTime,
            Self::PartTime => EmploymentCategory::PartTime,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FullTime(FullTimeKind::Permanent) => "Full-time (permanent)",
            Self::FullTime(FullTimeKind::Contract) => "Full-time (contract)",
            Self::PartTime => "Part-time",
        }
    }

    /// Compensation variant a freshly selected employment type starts with.
    pub fn default_compensation(self) -> Compensation {
        match self.category() {
            EmploymentCategory::PartTime => Compensation::Hourly { hourly_wage: None },
            EmploymentCategory::FullTime => Compensation::Monthly(FullTimeCompensation::default()),
        }
    }
}

impl Default for EmploymentType {
    fn default() -> Self {
        Self::FullTime(FullTimeKind::Permanent)
    }
}

/// Discriminator for the compensation schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentCategory {
    FullTime,
    PartTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryType {
    Hourly,
    Monthly,
    Annual,
}

impl SalaryType {
    pub const fn permitted_for(self, category: EmploymentCategory) -> bool {
        matches!(
            (self, category),
            (Self::Hourly, EmploymentCategory::PartTime)
                | (Self::Monthly, EmploymentCategory::FullTime)
                | (Self::Annual, EmploymentCategory::FullTime)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceRequirement {
    NotRequired,
    EntryLevel,
    Experienced { min_years: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationRequirement {
    NotRequired,
    HighSchool,
    Associate,
    Bachelor,
    Master,
}

/// Salary range and hiring requirements shared by the monthly and annual variants.
/// Amounts are expressed in units of 10,000 KRW.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullTimeCompensation {
    pub min: Option<u32>,
    pub max: Option<u32>,
    pub experience: Option<ExperienceRequirement>,
    pub education: Option<EducationRequirement>,
}

/// Exactly one compensation variant is active at a time; the variant is selected by the
/// employment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "salary_type", rename_all = "snake_case")]
pub enum Compensation {
    /// Hourly wage in KRW.
    Hourly { hourly_wage: Option<u32> },
    Monthly(FullTimeCompensation),
    Annual(FullTimeCompensation),
}

impl Compensation {
    pub const fn salary_type(&self) -> SalaryType {
        match self {
            Self::Hourly { .. } => SalaryType::Hourly,
            Self::Monthly(_) => SalaryType::Monthly,
            Self::Annual(_) => SalaryType::Annual,
        }
    }
}

impl Default for Compensation {
    fn default() -> Self {
        EmploymentType::default().default_compensation()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Headcount {
    Exact(u32),
    Undetermined,
}

impl Default for Headcount {
    fn default() -> Self {
        Self::Exact(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkLocation {
    pub address: String,
    pub detail: String,
}

/// Working days (Monday first) and daily hours.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub days: [bool; 7],
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl WeeklySchedule {
    pub fn workday_count(&self) -> usize {
        self.days.iter().filter(|worked| **worked).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationMethod {
    Platform,
    Email,
    Phone,
    ExternalLink,
}

impl ApplicationMethod {
    pub const fn requires_contact(self) -> bool {
        !matches!(self, Self::Platform)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub method: Option<ApplicationMethod>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub contact: Option<String>,
}

/// The single in-progress job posting aggregate held by the wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPostingDraft {
    pub title: String,
    pub job_categories: Vec<String>,
    pub employment_type: EmploymentType,
    pub headcount: Headcount,
    pub location: WorkLocation,
    pub schedule: WeeklySchedule,
    pub compensation: Compensation,
    pub description: String,
    pub requirements: String,
    pub preferences: String,
    pub benefits: BTreeSet<String>,
    pub application: ApplicationSettings,
    pub allowed_visas: BTreeSet<VisaCode>,
}

impl JobPostingDraft {
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// True when nothing has been entered since the draft was created.
    pub fn is_blank(&self) -> bool {
        *self == Self {
            employment_type: self.employment_type,
            compensation: self.employment_type.default_compensation(),
            ..Self::default()
        }
    }

    /// Switch employment type and reset the compensation variant in the same update.
    pub fn set_employment_type(&mut self, employment_type: EmploymentType) {
        self.employment_type = employment_type;
        self.compensation = employment_type.default_compensation();
    }
}

/// Partial update merged shallowly into a draft. Employment type is changed through
/// [`JobPostingDraft::set_employment_type`] so the compensation cascade cannot be bypassed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftPatch {
    pub title: Option<String>,
    pub job_categories: Option<Vec<String>>,
    pub headcount: Option<Headcount>,
    pub location: Option<WorkLocation>,
    pub schedule: Option<WeeklySchedule>,
    pub compensation: Option<Compensation>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub preferences: Option<String>,
    pub benefits: Option<BTreeSet<String>>,
    pub application: Option<ApplicationSettings>,
    pub allowed_visas: Option<BTreeSet<VisaCode>>,
}

impl DraftPatch {
    /// Merge into `draft`, returning the top-level field paths that were touched.
    pub fn apply(self, draft: &mut JobPostingDraft) -> Vec<&'static str> {
        let mut touched = Vec::new();

        macro_rules! merge {
            ($field:ident, $path:expr) => {
                if let Some(value) = self.$field {
                    draft.$field = value;
                    touched.push($path);
                }
            };
        }

        merge!(title, fields::TITLE);
        merge!(job_categories, fields::JOB_CATEGORIES);
        merge!(headcount, fields::HEADCOUNT);
        merge!(location, fields::LOCATION);
        merge!(schedule, fields::SCHEDULE);
        merge!(compensation, fields::COMPENSATION);
        merge!(description, fields::DESCRIPTION);
        merge!(requirements, fields::REQUIREMENTS);
        merge!(preferences, fields::PREFERENCES);
        merge!(benefits, fields::BENEFITS);
        merge!(application, fields::APPLICATION);
        merge!(allowed_visas, fields::ALLOWED_VISAS);

        touched
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
