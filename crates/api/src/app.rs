use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use domain::store::ClubStore;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    login_rate_limit, metrics_handler, metrics_middleware, require_admin,
    security_headers_middleware, trace_id, LoginRateLimiter,
};
use crate::routes::{admin, auth, fees, health, registrations, settings, week};
use crate::services::{AuditLogger, CookieHelper, RegistrationService, SessionService};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ClubStore>,
    pub config: Arc<Config>,
    pub sessions: Arc<SessionService>,
    pub cookies: CookieHelper,
    pub audit: AuditLogger,
    pub registrations: RegistrationService,
    pub login_limiter: Option<Arc<LoginRateLimiter>>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ClubStore>) -> Self {
        let sessions = SessionService::new(
            config.session.signing_secret.as_bytes().to_vec(),
            config.session.ttl_secs,
        );
        let login_limiter =
            LoginRateLimiter::new(config.security.login_rate_limit_per_minute).map(Arc::new);

        Self {
            cookies: CookieHelper::new(&config.session),
            audit: AuditLogger::new(store.clone()),
            registrations: RegistrationService::new(store.clone(), config.club_offset()),
            sessions: Arc::new(sessions),
            login_limiter,
            store,
            config: Arc::new(config),
        }
    }
}

pub fn create_app(config: Config, store: Arc<dyn ClubStore>) -> Router {
    let state = AppState::new(config, store);
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        // Development: any origin
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Session cookies need credentials, which rule out wildcards.
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
            .allow_credentials(true)
    };

    // Admin routes: session gate runs before every handler
    let admin_routes = Router::new()
        .route("/api/v1/admin/settings", put(admin::update_settings))
        .route("/api/v1/admin/passcode", put(admin::change_passcode))
        .route(
            "/api/v1/admin/registrations/:id",
            delete(admin::delete_registration),
        )
        .route(
            "/api/v1/admin/registrations/:id/players/:player_id",
            delete(admin::remove_player),
        )
        .route("/api/v1/admin/export", get(admin::export_data))
        .route("/api/v1/admin/import", post(admin::import_data))
        .route("/api/v1/admin/audit-logs", get(admin::list_audit_logs))
        .route("/api/v1/admin/diagnostics", get(admin::diagnostics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let login_routes = Router::new()
        .route("/api/v1/auth/admin/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/settings", get(settings::get_settings))
        .route("/api/v1/week/next", get(week::next_week))
        .route("/api/v1/fees/preview", post(fees::preview))
        .route(
            "/api/v1/registrations",
            get(registrations::list_registrations).post(registrations::submit_registration),
        )
        .route(
            "/api/v1/registrations/current",
            get(registrations::current_registration),
        )
        .route("/api/v1/auth/admin/logout", post(auth::logout))
        .route("/api/v1/auth/admin/session", get(auth::session_status));

    Router::new()
        .merge(public_routes)
        .merge(login_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
