//! Public registration endpoints.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use domain::models::{RegistrationSummary, WeeklyRegistration};
use domain::services::summarize_registration;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::registration::SubmissionAction;
use crate::services::SubmissionOutcome;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRegistrationRequest {
    pub players: Vec<String>,
}

/// A stored week together with its derived fee summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    #[serde(flatten)]
    pub registration: WeeklyRegistration,
    pub summary: RegistrationSummary,
}

impl From<WeeklyRegistration> for RegistrationView {
    fn from(registration: WeeklyRegistration) -> Self {
        Self {
            summary: summarize_registration(&registration),
            registration,
        }
    }
}

/// GET /api/v1/registrations
///
/// Newest week first.
pub async fn list_registrations(
    State(state): State<AppState>,
) -> Result<Json<Vec<RegistrationView>>, ApiError> {
    let registrations = state.store.list_registrations().await?;
    Ok(Json(registrations.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/registrations/current
pub async fn current_registration(
    State(state): State<AppState>,
) -> Result<Json<RegistrationView>, ApiError> {
    state
        .registrations
        .current(Utc::now())
        .await?
        .map(|r| Json(r.into()))
        .ok_or_else(|| ApiError::NotFound("No registrations for next week yet".to_string()))
}

/// POST /api/v1/registrations
///
/// 201 when the week was created, 200 when players were merged into it
/// (including the all-duplicates case, which writes nothing).
pub async fn submit_registration(
    State(state): State<AppState>,
    Json(request): Json<SubmitRegistrationRequest>,
) -> Result<(StatusCode, Json<SubmissionOutcome>), ApiError> {
    let outcome = state
        .registrations
        .submit(&request.players, Utc::now())
        .await?;

    let status = match outcome.action {
        SubmissionAction::Create => StatusCode::CREATED,
        SubmissionAction::Merge => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}
