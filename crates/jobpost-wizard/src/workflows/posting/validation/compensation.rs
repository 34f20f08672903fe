use super::ValidationErrorSet;
use super::ValidationPolicy;
use crate::workflows::posting::domain::{
    fields, Compensation, EmploymentCategory, EmploymentType, FullTimeCompensation, SalaryType,
};

/// Compensation schema resolved from the employment type discriminator. Only one shape is
/// ever active for a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompensationShape<'a> {
    PartTime {
        hourly_wage: Option<u32>,
    },
    FullTime {
        salary_type: SalaryType,
        terms: &'a FullTimeCompensation,
    },
    Mismatched {
        expected: EmploymentCategory,
        found: SalaryType,
    },
}

impl<'a> CompensationShape<'a> {
    pub fn resolve(employment_type: EmploymentType, compensation: &'a Compensation) -> Self {
        let category = employment_type.category();
        match (category, compensation) {
            (EmploymentCategory::PartTime, Compensation::Hourly { hourly_wage }) => {
                Self::PartTime {
                    hourly_wage: *hourly_wage,
                }
            }
            (EmploymentCategory::FullTime, Compensation::Monthly(terms))
            | (EmploymentCategory::FullTime, Compensation::Annual(terms)) => Self::FullTime {
                salary_type: compensation.salary_type(),
                terms,
            },
            (expected, other) => Self::Mismatched {
                expected,
                found: other.salary_type(),
            },
        }
    }

    pub(super) fn validate(self, policy: &ValidationPolicy, errors: &mut ValidationErrorSet) {
        match self {
            Self::PartTime { hourly_wage } => validate_hourly(hourly_wage, policy, errors),
            Self::FullTime { salary_type, terms } => validate_full_time(salary_type, terms, errors),
            Self::Mismatched { expected, found } => errors.push(
                fields::COMPENSATION,
                format!("{found:?} pay does not apply to {expected:?} employment"),
            ),
        }
    }
}

fn validate_hourly(
    hourly_wage: Option<u32>,
    policy: &ValidationPolicy,
    errors: &mut ValidationErrorSet,
) {
    match hourly_wage {
        None => errors.push(fields::HOURLY_WAGE, "enter an hourly wage"),
        Some(wage) if wage < policy.minimum_hourly_wage => errors.push(
            fields::HOURLY_WAGE,
            format!(
                "hourly wage must be at least the minimum wage of {} KRW",
                format_thousands(policy.minimum_hourly_wage)
            ),
        ),
        Some(_) => {}
    }
}

fn validate_full_time(
    salary_type: SalaryType,
    terms: &FullTimeCompensation,
    errors: &mut ValidationErrorSet,
) {
    let period = match salary_type {
        SalaryType::Annual => "annual",
        _ => "monthly",
    };

    match terms.min {
        None => errors.push(fields::SALARY_MIN, format!("enter a minimum {period} salary")),
        Some(0) => errors.push(
            fields::SALARY_MIN,
            format!("minimum {period} salary must be greater than zero"),
        ),
        Some(min) => {
            if let Some(max) = terms.max {
                if max < min {
                    errors.push(
                        fields::SALARY_MAX,
                        "maximum salary cannot be lower than the minimum",
                    );
                }
            }
        }
    }

    if terms.experience.is_none() {
        errors.push(fields::EXPERIENCE, "select an experience requirement");
    }
    if terms.education.is_none() {
        errors.push(fields::EDUCATION, "select an education requirement");
    }
}

fn format_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }
    formatted
}
