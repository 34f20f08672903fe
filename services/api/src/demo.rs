use crate::infra::{InMemoryPostingBackend, RuleTableEvaluator, StaticCompanyVerification};
use chrono::{Days, Local, NaiveTime};
use clap::Args;
use jobpost_wizard::error::AppError;
use jobpost_wizard::workflows::posting::{
    monthly_equivalent, ApplicationMethod, ApplicationSettings, Compensation, DraftPatch,
    EducationRequirement, EmploymentType, ExperienceRequirement, FullTimeCompensation,
    FullTimeKind, Headcount, MatchError, MemorySnapshotStore, PostingWizard, WeeklySchedule,
    WizardError, WizardServices, WizardSettings, WorkLocation,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Post a part-time role paid hourly instead of a full-time annual role.
    #[arg(long)]
    pub(crate) part_time: bool,
    /// Hourly wage in KRW for part-time postings.
    #[arg(long, default_value_t = 10_030)]
    pub(crate) hourly_wage: u32,
    /// Minimum annual salary in units of 10,000 KRW for full-time postings.
    #[arg(long, default_value_t = 3_200)]
    pub(crate) annual_min: u32,
    /// Simulate a company that has not completed verification.
    #[arg(long)]
    pub(crate) unverified: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub(crate) struct SalaryArgs {
    /// Hourly wage in KRW
    #[arg(long)]
    pub(crate) hourly: Option<u32>,
    /// Monthly salary in units of 10,000 KRW
    #[arg(long)]
    pub(crate) monthly: Option<u32>,
    /// Annual salary in units of 10,000 KRW
    #[arg(long)]
    pub(crate) annual: Option<u32>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let backend = Arc::new(InMemoryPostingBackend::default());
    let verification = if args.unverified {
        StaticCompanyVerification::unverified()
    } else {
        StaticCompanyVerification::verified()
    };
    let services = WizardServices {
        backend: backend.clone(),
        verification: Arc::new(verification),
        evaluator: Arc::new(RuleTableEvaluator),
        store: Arc::new(MemorySnapshotStore::default()),
    };

    let mut wizard = PostingWizard::start(services, WizardSettings::default(), None).await;
    println!("=== Job Posting Wizard Demo ===");

    let employment_type = if args.part_time {
        EmploymentType::PartTime
    } else {
        EmploymentType::FullTime(FullTimeKind::Permanent)
    };
    wizard.set_employment_type(employment_type)?;
    wizard.update_fields(DraftPatch {
        title: Some("Production line operator".to_string()),
        job_categories: Some(vec!["Manufacturing".to_string()]),
        headcount: Some(Headcount::Exact(2)),
        ..DraftPatch::default()
    })?;
    advance(&mut wizard).await?;

    let compensation = if args.part_time {
        Compensation::Hourly {
            hourly_wage: Some(args.hourly_wage),
        }
    } else {
        Compensation::Annual(FullTimeCompensation {
            min: Some(args.annual_min),
            max: None,
            experience: Some(ExperienceRequirement::NotRequired),
            education: Some(EducationRequirement::HighSchool),
        })
    };
    wizard.update_fields(DraftPatch {
        compensation: Some(compensation),
        schedule: Some(WeeklySchedule {
            days: [true, true, true, true, true, false, false],
            start_time: NaiveTime::from_hms_opt(9, 0, 0),
            end_time: NaiveTime::from_hms_opt(18, 0, 0),
        }),
        ..DraftPatch::default()
    })?;
    advance(&mut wizard).await?;

    wizard.update_fields(DraftPatch {
        location: Some(WorkLocation {
            address: "15 Gongdan-ro, Ansan-si".to_string(),
            detail: "Building B".to_string(),
        }),
        description: Some("Operate and monitor stamping presses.".to_string()),
        ..DraftPatch::default()
    })?;
    match wizard.go_next().await {
        Ok(_) => {}
        Err(WizardError::Matching(MatchError::ProfileMissing)) => {
            print_notices(&mut wizard);
            println!(
                "Stopped at {}: complete company verification first.",
                wizard.step().label()
            );
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }

    if let Some(result) = wizard.last_match() {
        println!("\nVisa matching: {}", result.summary);
        for visa in &result.eligible {
            println!("  eligible  {} ({})", visa.code, visa.name);
        }
        for visa in &result.blocked {
            println!(
                "  blocked   {} ({}): {}",
                visa.code,
                visa.name,
                visa.reasons.join("; ")
            );
        }
    }

    let today = Local::now().date_naive();
    wizard.update_fields(DraftPatch {
        application: Some(ApplicationSettings {
            method: Some(ApplicationMethod::Platform),
            start_date: Some(today),
            end_date: today.checked_add_days(Days::new(30)),
            contact: None,
        }),
        ..DraftPatch::default()
    })?;
    advance(&mut wizard).await?;
    wizard.save_now()?;
    print_notices(&mut wizard);

    match wizard.submit().await {
        Ok(receipt) => {
            println!("\nPublished posting {} ({:?})", receipt.id, receipt.status);
            println!("Backend status: {:?}", backend.status(&receipt.id));
        }
        Err(err) => {
            print_notices(&mut wizard);
            return Err(err.into());
        }
    }

    Ok(())
}

pub(crate) fn run_salary(args: SalaryArgs) -> Result<(), AppError> {
    let compensation = match (args.hourly, args.monthly, args.annual) {
        (Some(wage), _, _) => Compensation::Hourly {
            hourly_wage: Some(wage),
        },
        (_, Some(min), _) => Compensation::Monthly(FullTimeCompensation {
            min: Some(min),
            ..FullTimeCompensation::default()
        }),
        (_, _, annual) => Compensation::Annual(FullTimeCompensation {
            min: annual,
            ..FullTimeCompensation::default()
        }),
    };

    let monthly = monthly_equivalent(&compensation)
        .map_err(|err| AppError::Wizard(WizardError::Matching(MatchError::Compensation(err))))?;
    println!(
        "{:?} compensation normalizes to {monthly} (10,000 KRW per month)",
        compensation.salary_type()
    );
    Ok(())
}

async fn advance(wizard: &mut PostingWizard) -> Result<(), AppError> {
    let from = wizard.step();
    let outcome = wizard.go_next().await;
    print_notices(wizard);
    if let Err(err) = outcome {
        for (path, message) in wizard.errors().iter() {
            println!("  {path}: {message}");
        }
        return Err(err.into());
    }
    println!("Step {} {} complete", from.number(), from.label());
    Ok(())
}

fn print_notices(wizard: &mut PostingWizard) {
    for notice in wizard.take_notices() {
        let marker = if notice.blocking { "!" } else { "-" };
        println!("  {marker} {}", notice.message);
    }
}
