//! Admin endpoints.
//!
//! Every route here sits behind `require_admin`; handlers receive the
//! verified [`AdminSession`] through request extensions and record each
//! mutation in the admin audit stream.

use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use domain::models::{AuditKind, AuditLogEntry, ExportDocument, Settings};
use domain::services::audit_helpers;
use domain::store::settings_or_default;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use shared::password::{hash_passcode, validate_passcode};
use std::collections::BTreeMap;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::RequestContext;
use crate::services::AdminSession;

const DEFAULT_AUDIT_LIMIT: usize = 100;
const MAX_AUDIT_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasscodeRequest {
    pub new_code: String,
}

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub kind: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOperationResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRemovedResponse {
    pub success: bool,
    pub registration_id: Uuid,
    pub player_id: Uuid,
    pub registration_deleted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub success: bool,
    pub total_registrations: usize,
    pub total_players: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogListResponse {
    pub logs: Vec<AuditLogEntry>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateWeek {
    pub week_start: NaiveDate,
    pub count: usize,
    pub registration_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsResponse {
    pub backend: String,
    pub storage_healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<String>,
    pub settings_stored: bool,
    pub total_registrations: usize,
    pub total_players: usize,
    pub duplicate_weeks: Vec<DuplicateWeek>,
    pub non_canonical_weeks: Vec<Uuid>,
    pub integrity_ok: bool,
}

/// PUT /api/v1/admin/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    ctx: RequestContext,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, ApiError> {
    settings.validate()?;

    let previous = settings_or_default(state.store.as_ref()).await?;
    state.store.update_settings(&settings).await?;

    info!(session_id = %session.session_id, "Settings updated");
    state.audit.log(
        audit_helpers::settings_updated(&previous, &settings).with_session(&session.session_id),
        Some(&ctx),
    );

    Ok(Json(settings))
}

/// PUT /api/v1/admin/passcode
///
/// Stores an Argon2id hash of the new code. Existing sessions stay valid.
pub async fn change_passcode(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    ctx: RequestContext,
    Json(request): Json<ChangePasscodeRequest>,
) -> Result<Json<AdminOperationResponse>, ApiError> {
    validate_passcode(&request.new_code)?;

    let code = request.new_code;
    let hash = tokio::task::spawn_blocking(move || hash_passcode(&code))
        .await
        .map_err(|e| ApiError::Internal(format!("Passcode hashing task failed: {}", e)))??;
    state.store.set_admin_secret_hash(&hash).await?;

    info!(session_id = %session.session_id, "Admin passcode changed");
    state.audit.log(
        audit_helpers::passcode_changed().with_session(&session.session_id),
        Some(&ctx),
    );

    Ok(Json(AdminOperationResponse {
        success: true,
        message: "Admin passcode updated".to_string(),
    }))
}

/// DELETE /api/v1/admin/registrations/:id
pub async fn delete_registration(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminOperationResponse>, ApiError> {
    let registration = state
        .store
        .get_registration(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Registration {} not found", id)))?;

    state
        .store
        .delete_registration(id, registration.revision)
        .await?;

    info!(
        session_id = %session.session_id,
        registration_id = %id,
        week_start = %registration.week_start,
        "Registration deleted"
    );
    state.audit.log(
        audit_helpers::registration_deleted(
            id,
            registration.week_start,
            registration.player_count(),
        )
        .with_session(&session.session_id),
        Some(&ctx),
    );

    Ok(Json(AdminOperationResponse {
        success: true,
        message: format!("Registration {} deleted", id),
    }))
}

/// DELETE /api/v1/admin/registrations/:id/players/:player_id
///
/// Removing the last player deletes the week.
pub async fn remove_player(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    ctx: RequestContext,
    Path((registration_id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PlayerRemovedResponse>, ApiError> {
    let outcome = state
        .registrations
        .remove_player(registration_id, player_id, Utc::now())
        .await?;
    let registration_deleted = outcome.registration.is_none();

    state.audit.log(
        audit_helpers::player_removed(
            registration_id,
            player_id,
            &outcome.player.name,
            registration_deleted,
        )
        .with_session(&session.session_id),
        Some(&ctx),
    );

    Ok(Json(PlayerRemovedResponse {
        success: true,
        registration_id,
        player_id,
        registration_deleted,
    }))
}

/// GET /api/v1/admin/export
pub async fn export_data(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    ctx: RequestContext,
) -> Result<Response, ApiError> {
    let now = Utc::now();
    let settings = settings_or_default(state.store.as_ref()).await?;
    let registrations = state.store.list_registrations().await?;
    let document = ExportDocument::build(settings, registrations, now);

    state.audit.log(
        audit_helpers::data_exported(
            document.metadata.total_registrations,
            document.metadata.total_players,
        )
        .with_session(&session.session_id),
        Some(&ctx),
    );

    let filename = format!(
        "attachment; filename=\"club-registrations-{}.json\"",
        now.format("%Y-%m-%d")
    );
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&filename) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((headers, Json(document)).into_response())
}

/// POST /api/v1/admin/import
///
/// Replaces all settings and registrations with the document's contents.
pub async fn import_data(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    ctx: RequestContext,
    Json(body): Json<JsonValue>,
) -> Result<Json<ImportResponse>, ApiError> {
    let document = ExportDocument::from_json(body)?;
    let total_registrations = document.registrations.len();
    let total_players: usize = document
        .registrations
        .iter()
        .map(|r| r.player_count())
        .sum();

    state
        .store
        .replace_all(&document.settings, &document.registrations)
        .await?;

    info!(
        session_id = %session.session_id,
        total_registrations,
        total_players,
        "Data imported"
    );
    state.audit.log(
        audit_helpers::data_imported(total_registrations, total_players)
            .with_session(&session.session_id),
        Some(&ctx),
    );

    Ok(Json(ImportResponse {
        success: true,
        total_registrations,
        total_players,
    }))
}

/// GET /api/v1/admin/audit-logs?kind=admin|security&limit=
///
/// Newest first.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<AuditLogListResponse>, ApiError> {
    let kind = query
        .kind
        .as_deref()
        .filter(|k| !k.is_empty())
        .map(str::parse::<AuditKind>)
        .transpose()
        .map_err(ApiError::Validation)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);

    let logs = state.store.list_audit_logs(kind, limit).await?;
    Ok(Json(AuditLogListResponse {
        count: logs.len(),
        logs,
    }))
}

/// GET /api/v1/admin/diagnostics
///
/// Storage health plus an integrity report. Never fails on storage errors;
/// they are reported in the body instead.
pub async fn diagnostics(State(state): State<AppState>) -> Json<DiagnosticsResponse> {
    let ping = state.store.ping().await;
    let settings_stored = matches!(state.store.get_settings().await, Ok(Some(_)));
    let (registrations, listing_error) = match state.store.list_registrations().await {
        Ok(registrations) => (registrations, None),
        Err(e) => {
            warn!(error = %e, "Diagnostics could not list registrations");
            (Vec::new(), Some(e.to_string()))
        }
    };

    let mut weeks: BTreeMap<NaiveDate, Vec<Uuid>> = BTreeMap::new();
    for registration in &registrations {
        weeks
            .entry(registration.week_start)
            .or_default()
            .push(registration.id);
    }
    let duplicate_weeks: Vec<DuplicateWeek> = weeks
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(week_start, registration_ids)| DuplicateWeek {
            week_start,
            count: registration_ids.len(),
            registration_ids,
        })
        .collect();
    let non_canonical_weeks: Vec<Uuid> = registrations
        .iter()
        .filter(|r| !r.week().is_canonical())
        .map(|r| r.id)
        .collect();

    Json(DiagnosticsResponse {
        backend: state.store.backend_name().to_string(),
        storage_healthy: ping.is_ok(),
        storage_error: ping.err().map(|e| e.to_string()).or(listing_error.clone()),
        settings_stored,
        total_registrations: registrations.len(),
        total_players: registrations.iter().map(|r| r.player_count()).sum(),
        integrity_ok: listing_error.is_none()
            && duplicate_weeks.is_empty()
            && non_canonical_weeks.is_empty(),
        duplicate_weeks,
        non_canonical_weeks,
    })
}
