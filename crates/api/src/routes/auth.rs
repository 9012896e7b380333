//! Admin login, logout and session status.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use domain::services::audit_helpers;
use serde::{Deserialize, Serialize};
use shared::crypto::redact_secret;
use tracing::{info, warn};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::RequestContext;
use crate::middleware::session_token;
use crate::services::SessionError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /api/v1/auth/admin/login
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let result = state
        .sessions
        .authenticate(
            state.store.as_ref(),
            state.config.admin.passcode.as_deref(),
            &request.code,
            Utc::now(),
        )
        .await;

    match result {
        Ok((issued, source)) => {
            info!(
                session_id = %issued.session.session_id,
                source = ?source,
                "Admin logged in"
            );
            state.audit.log(
                audit_helpers::admin_login(&issued.session.session_id),
                Some(&ctx),
            );

            let mut headers = HeaderMap::new();
            state.cookies.add_session_cookie(&mut headers, &issued.token);
            let body = LoginResponse {
                token: issued.token,
                expires_at: issued.session.expires_at,
            };
            Ok((StatusCode::OK, headers, Json(body)).into_response())
        }
        Err(SessionError::Store(e)) => Err(e.into()),
        Err(e) => {
            warn!(client_ip = %ctx.client_ip, reason = e.reason(), "Admin login failed");
            metrics::counter!("admin_login_failures_total").increment(1);
            state.audit.log(
                audit_helpers::login_failed(&redact_secret(&request.code), e.reason()),
                Some(&ctx),
            );

            let mut response =
                ApiError::Unauthorized("Invalid admin code".to_string()).into_response();
            state.cookies.add_clear_cookies(response.headers_mut());
            Ok(response)
        }
    }
}

/// POST /api/v1/auth/admin/logout
///
/// Idempotent: always clears the admin cookies.
pub async fn logout(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
) -> Response {
    if let Some(token) = session_token(&headers, &state.cookies) {
        if let Some(session) = state.sessions.revoke(&token, Utc::now()) {
            info!(session_id = %session.session_id, "Admin logged out");
            state
                .audit
                .log(audit_helpers::admin_logout(&session.session_id), Some(&ctx));
        }
    }

    let mut response = Json(LogoutResponse { success: true }).into_response();
    state.cookies.add_clear_cookies(response.headers_mut());
    response
}

/// GET /api/v1/auth/admin/session
///
/// Reports whether the caller holds a valid admin session. An invalid or
/// expired token gets its cookies cleared.
pub async fn session_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = session_token(&headers, &state.cookies) else {
        return Json(SessionStatusResponse {
            authenticated: false,
            expires_at: None,
        })
        .into_response();
    };

    match state.sessions.validate(&token, Utc::now()) {
        Ok(session) => Json(SessionStatusResponse {
            authenticated: true,
            expires_at: Some(session.expires_at),
        })
        .into_response(),
        Err(e) => {
            tracing::debug!(reason = e.reason(), "Admin session check failed");
            let mut response = Json(SessionStatusResponse {
                authenticated: false,
                expires_at: None,
            })
            .into_response();
            state.cookies.add_clear_cookies(response.headers_mut());
            response
        }
    }
}
