//! Public settings endpoint.

use axum::{extract::State, Json};
use domain::models::Settings;
use domain::store::settings_or_default;

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api/v1/settings
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, ApiError> {
    Ok(Json(settings_or_default(state.store.as_ref()).await?))
}
