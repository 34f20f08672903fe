use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OwnedMutexGuard;

use super::domain::{DraftPatch, EmploymentType, PostingId};
use super::eligibility::MatchError;
use super::gateway::{AddressLookup, AddressSelection, GatewayError};
use super::sessions::{SessionError, SessionSnapshot, WizardSessions};
use super::step::WizardStep;
use super::submission::SubmissionError;
use super::wizard::{PostingWizard, WizardError};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpenSessionQuery {
    #[serde(default)]
    source_posting_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmploymentTypeRequest {
    employment_type: EmploymentType,
}

/// Address chosen by the client-side lookup widget.
struct ChosenAddress(Option<AddressSelection>);

#[async_trait]
impl AddressLookup for ChosenAddress {
    async fn search_address(
        &self,
        _mount_point: Option<&str>,
    ) -> Result<Option<AddressSelection>, GatewayError> {
        Ok(self.0.clone())
    }
}

/// HTTP surface over [`WizardSessions`].
pub fn wizard_router(sessions: Arc<WizardSessions>) -> Router {
    Router::new()
        .route("/api/v1/wizard/sessions", post(open_handler))
        .route(
            "/api/v1/wizard/sessions/:session_id",
            get(view_handler).delete(close_handler),
        )
        .route(
            "/api/v1/wizard/sessions/:session_id/fields",
            patch(fields_handler),
        )
        .route(
            "/api/v1/wizard/sessions/:session_id/employment-type",
            put(employment_type_handler),
        )
        .route(
            "/api/v1/wizard/sessions/:session_id/address",
            put(address_handler),
        )
        .route("/api/v1/wizard/sessions/:session_id/next", post(next_handler))
        .route("/api/v1/wizard/sessions/:session_id/back", post(back_handler))
        .route(
            "/api/v1/wizard/sessions/:session_id/steps/:step",
            post(jump_handler),
        )
        .route("/api/v1/wizard/sessions/:session_id/save", post(save_handler))
        .route(
            "/api/v1/wizard/sessions/:session_id/submit",
            post(submit_handler),
        )
        .route(
            "/api/v1/wizard/sessions/:session_id/activation",
            post(activation_handler),
        )
        .with_state(sessions)
}

/// HTTP status for a rejected wizard operation.
pub fn wizard_status(error: &WizardError) -> StatusCode {
    match error {
        WizardError::Validation { .. }
        | WizardError::CompensationMismatch { .. }
        | WizardError::Matching(MatchError::Compensation(_))
        | WizardError::Matching(MatchError::ProfileMissing)
        | WizardError::Submission(SubmissionError::Incomplete(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        WizardError::Matching(_) | WizardError::Submission(_) | WizardError::AddressLookup(_) => {
            StatusCode::BAD_GATEWAY
        }
        WizardError::Busy(_)
        | WizardError::Finalized
        | WizardError::AtFirstStep
        | WizardError::ForwardJump { .. }
        | WizardError::StepNotCompleted(_)
        | WizardError::SubmissionRequired
        | WizardError::NotAtReview(_)
        | WizardError::NothingToActivate => StatusCode::CONFLICT,
    }
}

fn respond(
    session_id: &str,
    wizard: &mut PostingWizard,
    outcome: Result<(), WizardError>,
    success: StatusCode,
) -> Response {
    let snapshot = SessionSnapshot::drain(session_id, wizard);
    match outcome {
        Ok(()) => (success, Json(snapshot)).into_response(),
        Err(error) => {
            let errors = match &error {
                WizardError::Validation { errors, .. } => json!(errors),
                _ => json!({}),
            };
            let payload = json!({
                "error": error.to_string(),
                "errors": errors,
                "session": snapshot,
            });
            (wizard_status(&error), Json(payload)).into_response()
        }
    }
}

fn session_failure(error: SessionError) -> Response {
    match error {
        SessionError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        SessionError::Wizard(error) => (
            wizard_status(&error),
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
    }
}

macro_rules! acquire {
    ($sessions:expr, $id:expr) => {
        match $sessions.acquire(&$id).await {
            Ok(guard) => guard,
            Err(error) => return session_failure(error),
        }
    };
}

pub(crate) async fn open_handler(
    State(sessions): State<Arc<WizardSessions>>,
    Query(query): Query<OpenSessionQuery>,
) -> Response {
    let source = query
        .source_posting_id
        .filter(|id| !id.trim().is_empty())
        .map(PostingId);
    let (session_id, mut wizard) = sessions.open(source).await;
    respond(&session_id, &mut wizard, Ok(()), StatusCode::CREATED)
}

pub(crate) async fn view_handler(
    State(sessions): State<Arc<WizardSessions>>,
    Path(session_id): Path<String>,
) -> Response {
    let mut wizard = acquire!(sessions, session_id);
    respond(&session_id, &mut wizard, Ok(()), StatusCode::OK)
}

pub(crate) async fn close_handler(
    State(sessions): State<Arc<WizardSessions>>,
    Path(session_id): Path<String>,
) -> Response {
    if sessions.close(&session_id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        session_failure(SessionError::NotFound)
    }
}

pub(crate) async fn fields_handler(
    State(sessions): State<Arc<WizardSessions>>,
    Path(session_id): Path<String>,
    Json(patch): Json<DraftPatch>,
) -> Response {
    let mut wizard = acquire!(sessions, session_id);
    let outcome = wizard.update_fields(patch);
    respond(&session_id, &mut wizard, outcome, StatusCode::OK)
}

pub(crate) async fn employment_type_handler(
    State(sessions): State<Arc<WizardSessions>>,
    Path(session_id): Path<String>,
    Json(request): Json<EmploymentTypeRequest>,
) -> Response {
    let mut wizard = acquire!(sessions, session_id);
    let outcome = wizard.set_employment_type(request.employment_type);
    respond(&session_id, &mut wizard, outcome, StatusCode::OK)
}

pub(crate) async fn address_handler(
    State(sessions): State<Arc<WizardSessions>>,
    Path(session_id): Path<String>,
    Json(selection): Json<AddressSelection>,
) -> Response {
    let mut wizard = acquire!(sessions, session_id);
    let outcome = wizard
        .search_address(&ChosenAddress(Some(selection)), None)
        .await
        .map(|_| ());
    respond(&session_id, &mut wizard, outcome, StatusCode::OK)
}

pub(crate) async fn next_handler(
    State(sessions): State<Arc<WizardSessions>>,
    Path(session_id): Path<String>,
) -> Response {
    let mut wizard = acquire!(sessions, session_id);
    let outcome = wizard.go_next().await.map(|_| ());
    respond(&session_id, &mut wizard, outcome, StatusCode::OK)
}

pub(crate) async fn back_handler(
    State(sessions): State<Arc<WizardSessions>>,
    Path(session_id): Path<String>,
) -> Response {
    let mut wizard = acquire!(sessions, session_id);
    let outcome = wizard.go_back().map(|_| ());
    respond(&session_id, &mut wizard, outcome, StatusCode::OK)
}

pub(crate) async fn jump_handler(
    State(sessions): State<Arc<WizardSessions>>,
    Path((session_id, step)): Path<(String, u8)>,
) -> Response {
    let target = match WizardStep::try_from(step) {
        Ok(target) => target,
        Err(error) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response()
        }
    };
    let mut wizard = acquire!(sessions, session_id);
    let outcome = wizard.go_to_step(target).map(|_| ());
    respond(&session_id, &mut wizard, outcome, StatusCode::OK)
}

pub(crate) async fn save_handler(
    State(sessions): State<Arc<WizardSessions>>,
    Path(session_id): Path<String>,
) -> Response {
    let mut wizard = acquire!(sessions, session_id);
    let outcome = wizard.save_now().map(|_| ());
    respond(&session_id, &mut wizard, outcome, StatusCode::OK)
}

pub(crate) async fn submit_handler(
    State(sessions): State<Arc<WizardSessions>>,
    Path(session_id): Path<String>,
) -> Response {
    let mut wizard = acquire!(sessions, session_id);
    let outcome = wizard.submit().await.map(|_| ());
    let response = respond(&session_id, &mut wizard, outcome, StatusCode::CREATED);
    release_if_published(&sessions, &session_id, wizard);
    response
}

pub(crate) async fn activation_handler(
    State(sessions): State<Arc<WizardSessions>>,
    Path(session_id): Path<String>,
) -> Response {
    let mut wizard = acquire!(sessions, session_id);
    let outcome = wizard.retry_activation().await.map(|_| ());
    let response = respond(&session_id, &mut wizard, outcome, StatusCode::OK);
    release_if_published(&sessions, &session_id, wizard);
    response
}

/// A published session accepts no further edits; its final state went out in the response.
fn release_if_published(
    sessions: &WizardSessions,
    session_id: &str,
    wizard: OwnedMutexGuard<PostingWizard>,
) {
    let published = wizard.step().is_terminal();
    drop(wizard);
    if published {
        sessions.close(session_id);
    }
}
