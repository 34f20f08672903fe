use super::compensation::CompensationShape;
use super::{ValidationErrorSet, ValidationPolicy};
use crate::workflows::posting::domain::{fields, Headcount, JobPostingDraft};

pub(super) fn basics(
    draft: &JobPostingDraft,
    policy: &ValidationPolicy,
    errors: &mut ValidationErrorSet,
) {
    let title = draft.title.trim();
    if title.is_empty() {
        errors.push(fields::TITLE, "enter a posting title");
    } else if title.chars().count() > policy.max_title_chars {
        errors.push(
            fields::TITLE,
            format!("title must be at most {} characters", policy.max_title_chars),
        );
    }

    let categories = &draft.job_categories;
    if categories.is_empty() {
        errors.push(fields::JOB_CATEGORIES, "select at least one job category");
    } else if categories.len() > policy.max_job_categories {
        errors.push(
            fields::JOB_CATEGORIES,
            format!(
                "select at most {} job categories",
                policy.max_job_categories
            ),
        );
    } else if categories.iter().any(|category| category.trim().is_empty()) {
        errors.push(fields::JOB_CATEGORIES, "job categories cannot be blank");
    }

    if draft.headcount == Headcount::Exact(0) {
        errors.push(
            fields::HEADCOUNT,
            "headcount must be at least 1 or marked undetermined",
        );
    }
}

pub(super) fn conditions(
    draft: &JobPostingDraft,
    policy: &ValidationPolicy,
    errors: &mut ValidationErrorSet,
) {
    CompensationShape::resolve(draft.employment_type, &draft.compensation).validate(policy, errors);

    let schedule = &draft.schedule;
    if schedule.workday_count() == 0 {
        errors.push(fields::SCHEDULE_DAYS, "select at least one working day");
    }
    match (schedule.start_time, schedule.end_time) {
        (None, _) => errors.push(fields::SCHEDULE_START, "enter a start time"),
        (Some(_), None) => errors.push(fields::SCHEDULE_END, "enter an end time"),
        (Some(start), Some(end)) if start == end => errors.push(
            fields::SCHEDULE_END,
            "end time must differ from the start time",
        ),
        _ => {}
    }
    if schedule.start_time.is_none() && schedule.end_time.is_none() {
        errors.push(fields::SCHEDULE_END, "enter an end time");
    }
}

pub(super) fn workplace(draft: &JobPostingDraft, errors: &mut ValidationErrorSet) {
    if draft.location.address.trim().is_empty() {
        errors.push(fields::LOCATION_ADDRESS, "search for the workplace address");
    }
    if draft.description.trim().is_empty() {
        errors.push(fields::DESCRIPTION, "describe the job");
    }
    if draft.benefits.iter().any(|benefit| benefit.trim().is_empty()) {
        errors.push(fields::BENEFITS, "benefit tags cannot be blank");
    }
}

pub(super) fn visas_and_application(draft: &JobPostingDraft, errors: &mut ValidationErrorSet) {
    if draft.allowed_visas.is_empty() {
        errors.push(fields::ALLOWED_VISAS, "keep at least one eligible visa");
    }

    let application = &draft.application;
    match application.method {
        None => errors.push(fields::APPLICATION_METHOD, "choose how candidates apply"),
        Some(method) if method.requires_contact() => {
            let missing = application
                .contact
                .as_deref()
                .map_or(true, |contact| contact.trim().is_empty());
            if missing {
                errors.push(
                    fields::APPLICATION_CONTACT,
                    "enter the contact candidates should use",
                );
            }
        }
        Some(_) => {}
    }

    match (application.start_date, application.end_date) {
        (None, _) => errors.push(fields::APPLICATION_START, "choose when applications open"),
        (Some(_), None) => errors.push(fields::APPLICATION_END, "choose when applications close"),
        (Some(start), Some(end)) if end < start => errors.push(
            fields::APPLICATION_END,
            "applications cannot close before they open",
        ),
        _ => {}
    }
    if application.start_date.is_none() && application.end_date.is_none() {
        errors.push(fields::APPLICATION_END, "choose when applications close");
    }
}
