//! Live fee preview.

use axum::{extract::State, Json};
use domain::models::RegistrationSummary;
use domain::services::compute_summary;
use domain::store::settings_or_default;
use serde::Deserialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeePreviewRequest {
    #[validate(range(max = 10000, message = "Player count is too large"))]
    pub player_count: u32,
}

/// POST /api/v1/fees/preview
///
/// Summary for a hypothetical player count under the current settings.
pub async fn preview(
    State(state): State<AppState>,
    Json(request): Json<FeePreviewRequest>,
) -> Result<Json<RegistrationSummary>, ApiError> {
    request.validate()?;
    let settings = settings_or_default(state.store.as_ref()).await?;
    Ok(Json(compute_summary(request.player_count as usize, &settings)))
}
