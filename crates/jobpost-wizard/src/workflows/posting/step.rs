use serde::{Deserialize, Serialize};

/// Ordinal wizard stage. Steps 1 through 5 are editable; step 6 is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WizardStep {
    Basics = 1,
    Conditions = 2,
    Workplace = 3,
    VisasAndApplication = 4,
    Review = 5,
    Completed = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("wizard step must be between 1 and 6, found {0}")]
pub struct InvalidStep(pub u8);

impl WizardStep {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Basics,
            Self::Conditions,
            Self::Workplace,
            Self::VisasAndApplication,
            Self::Review,
            Self::Completed,
        ]
    }

    pub const fn number(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Basics => "Basic information",
            Self::Conditions => "Working conditions",
            Self::Workplace => "Workplace & details",
            Self::VisasAndApplication => "Visas & application",
            Self::Review => "Review",
            Self::Completed => "Completed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    pub const fn is_editable(self) -> bool {
        !self.is_terminal()
    }

    pub fn next(self) -> Option<Self> {
        Self::try_from(self.number() + 1).ok()
    }

    pub fn previous(self) -> Option<Self> {
        self.number()
            .checked_sub(1)
            .and_then(|number| Self::try_from(number).ok())
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = InvalidStep;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ordered()
            .into_iter()
            .find(|step| step.number() == value)
            .ok_or(InvalidStep(value))
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}
