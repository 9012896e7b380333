//! Admin authorization gate.
//!
//! Every admin route runs behind [`require_admin`]. A request without a
//! valid session is answered with 401, a security audit entry, and
//! `Set-Cookie` headers clearing both the session cookie and the legacy
//! `isAdmin` flag. Handlers read the verified `AdminSession` from request
//! extensions.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::Utc;
use domain::services::audit_helpers;
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::RequestContext;
use crate::services::{CookieHelper, SessionError};

/// Session token from the session cookie, else from `Authorization: Bearer`.
pub fn session_token(headers: &HeaderMap, cookies: &CookieHelper) -> Option<String> {
    if let Some(token) = cookies.extract_session_token(headers) {
        return Some(token.to_string());
    }
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .filter(|token| !token.is_empty())
}

pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();
    let ctx = RequestContext::from_parts(&parts);
    let attempted = format!("{} {}", parts.method, parts.uri.path());

    let result = match session_token(&parts.headers, &state.cookies) {
        Some(token) => state.sessions.validate(&token, Utc::now()).map_err(Some),
        None => Err(None),
    };

    match result {
        Ok(session) => {
            let mut req = Request::from_parts(parts, body);
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Err(err) => {
            let reason = err.as_ref().map_or("missing_token", SessionError::reason);
            warn!(
                client_ip = %ctx.client_ip,
                action = %attempted,
                reason,
                "Rejected admin request"
            );
            metrics::counter!("unauthorized_admin_actions_total", "reason" => reason)
                .increment(1);

            if matches!(err, Some(SessionError::BadSignature)) {
                warn!(client_ip = %ctx.client_ip, "Admin session token signature mismatch");
                state
                    .audit
                    .log(audit_helpers::session_tampered(&attempted), Some(&ctx));
            }
            state.audit.log(
                audit_helpers::unauthorized_admin_action(&attempted, reason),
                Some(&ctx),
            );

            unauthorized_response(&state.cookies)
        }
    }
}

/// 401 that also clears every admin cookie.
pub fn unauthorized_response(cookies: &CookieHelper) -> Response {
    let mut response =
        ApiError::Unauthorized("Admin session required".to_string()).into_response();
    cookies.add_clear_cookies(response.headers_mut());
    response
}
