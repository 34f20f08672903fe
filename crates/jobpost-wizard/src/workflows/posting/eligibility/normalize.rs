use crate::workflows::posting::domain::{Compensation, SalaryType};

/// Paid hours assumed per month when converting an hourly wage.
pub const MONTHLY_PAID_HOURS: u64 = 160;
/// Monthly and annual salaries are entered in units of this many won.
pub const KRW_PER_SALARY_UNIT: u64 = 10_000;
const MONTHS_PER_YEAR: u64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CompensationError {
    #[error("{0:?} compensation has no amount to evaluate")]
    Missing(SalaryType),
    #[error("normalized monthly compensation must be positive")]
    NonPositive,
}

/// Convert the active compensation variant to a monthly amount in 10,000 KRW units.
///
/// Hourly wages are multiplied by [`MONTHLY_PAID_HOURS`] and divided by
/// [`KRW_PER_SALARY_UNIT`]; annual salaries are divided by twelve; monthly salaries pass
/// through. Ranges contribute their minimum. Division rounds half up.
pub fn monthly_equivalent(compensation: &Compensation) -> Result<u32, CompensationError> {
    let normalized = match compensation {
        Compensation::Hourly { hourly_wage } => {
            let wage = hourly_wage.ok_or(CompensationError::Missing(SalaryType::Hourly))?;
            rounded_div(u64::from(wage) * MONTHLY_PAID_HOURS, KRW_PER_SALARY_UNIT)
        }
        Compensation::Monthly(terms) => {
            u64::from(terms.min.ok_or(CompensationError::Missing(SalaryType::Monthly))?)
        }
        Compensation::Annual(terms) => {
            let annual = terms.min.ok_or(CompensationError::Missing(SalaryType::Annual))?;
            rounded_div(u64::from(annual), MONTHS_PER_YEAR)
        }
    };

    match u32::try_from(normalized) {
        Ok(0) => Err(CompensationError::NonPositive),
        Ok(value) => Ok(value),
        Err(_) => Ok(u32::MAX),
    }
}

fn rounded_div(numerator: u64, denominator: u64) -> u64 {
    (numerator + denominator / 2) / denominator
}
