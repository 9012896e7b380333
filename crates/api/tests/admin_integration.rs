//! Integration tests for admin-only endpoints.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{
    delete_request_with_auth, get_request, get_request_with_auth, json_request,
    json_request_with_auth, login, parse_response_body, set_cookies, settle, spawn_app, submit,
    ADMIN_CODE,
};
use domain::models::{AuditAction, AuditKind, Settings};
use domain::store::ClubStore;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_admin_routes_require_session() {
    let app = spawn_app();
    let (_, body) = submit(&app, &["An"]).await;
    let id = body["registration"]["id"].as_str().unwrap().to_string();

    let response = app
        .send(
            axum::http::Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/v1/admin/registrations/{}", id))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));

    // Nothing was deleted.
    assert_eq!(app.store.list_registrations().await.unwrap().len(), 1);

    settle().await;
    let logs = app
        .store
        .list_audit_logs(Some(AuditKind::Security), 10)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, AuditAction::UnauthorizedAdminAction);
    assert_eq!(
        logs[0].details["attemptedAction"],
        format!("DELETE /api/v1/admin/registrations/{}", id)
    );
    assert_eq!(logs[0].details["reason"], "missing_token");
}

#[tokio::test]
async fn test_update_settings() {
    let app = spawn_app();
    let token = login(&app).await;

    let response = app
        .send(json_request_with_auth(
            Method::PUT,
            "/api/v1/admin/settings",
            json!({
                "courtsCount": 3,
                "playersPerCourt": 4,
                "extraCourtFee": 120000.0,
                "registrationEnabled": false,
                "courtName": "Riverside",
                "feeSharing": "extraPlayersOnly"
            }),
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(get_request("/api/v1/settings")).await;
    let body = parse_response_body(response).await;
    assert_eq!(body["courtsCount"], 3);
    assert_eq!(body["registrationEnabled"], false);
    assert_eq!(body["courtName"], "Riverside");

    settle().await;
    let logs = app
        .store
        .list_audit_logs(Some(AuditKind::Admin), 10)
        .await
        .unwrap();
    let entry = logs
        .iter()
        .find(|l| l.action == AuditAction::SettingsUpdate)
        .expect("settings audit entry");
    assert_eq!(entry.details["previous"]["courtsCount"], 2);
    assert_eq!(entry.details["updated"]["courtsCount"], 3);
}

#[tokio::test]
async fn test_update_settings_rejects_invalid_values() {
    let app = spawn_app();
    let token = login(&app).await;

    let response = app
        .send(json_request_with_auth(
            Method::PUT,
            "/api/v1/admin/settings",
            json!({
                "courtsCount": 0,
                "playersPerCourt": 4,
                "extraCourtFee": 100000.0,
                "registrationEnabled": true
            }),
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.store.get_settings().await.unwrap().is_none());
}

#[tokio::test]
async fn test_change_passcode() {
    let app = spawn_app();
    let token = login(&app).await;

    let response = app
        .send(json_request_with_auth(
            Method::PUT,
            "/api/v1/admin/passcode",
            json!({ "newCode": "short" }),
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(json_request_with_auth(
            Method::PUT,
            "/api/v1/admin/passcode",
            json!({ "newCode": "new-club-code" }),
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = app.store.admin_secret_hash().await.unwrap().unwrap();
    assert!(stored.starts_with("$argon2id$"));

    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/admin/login",
            json!({ "code": ADMIN_CODE }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/admin/login",
            json!({ "code": "new-club-code" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Sessions issued before the change stay valid.
    let response = app
        .send(get_request_with_auth("/api/v1/admin/diagnostics", &token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_registration() {
    let app = spawn_app();
    let token = login(&app).await;
    let (_, body) = submit(&app, &["An", "Binh"]).await;
    let id = body["registration"]["id"].as_str().unwrap().to_string();

    let response = app
        .send(delete_request_with_auth(
            &format!("/api/v1/admin/registrations/{}", id),
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.store.list_registrations().await.unwrap().is_empty());

    let response = app
        .send(delete_request_with_auth(
            &format!("/api/v1/admin/registrations/{}", id),
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    settle().await;
    let logs = app
        .store
        .list_audit_logs(Some(AuditKind::Admin), 10)
        .await
        .unwrap();
    let entry = logs
        .iter()
        .find(|l| l.action == AuditAction::RegistrationDelete)
        .expect("deletion audit entry");
    assert_eq!(entry.details["playerCount"], 2);
}

#[tokio::test]
async fn test_remove_player() {
    let app = spawn_app();
    let token = login(&app).await;
    let (_, body) = submit(&app, &["An", "Binh"]).await;
    let id = body["registration"]["id"].as_str().unwrap().to_string();
    let players = body["registration"]["players"].as_array().unwrap().clone();

    let path = format!(
        "/api/v1/admin/registrations/{}/players/{}",
        id,
        players[0]["id"].as_str().unwrap()
    );
    let response = app.send(delete_request_with_auth(&path, &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["registrationDeleted"], false);

    let remaining = app.store.list_registrations().await.unwrap();
    assert_eq!(remaining[0].players.len(), 1);
    assert_eq!(remaining[0].players[0].name, "Binh");

    // Unknown player
    let path = format!(
        "/api/v1/admin/registrations/{}/players/{}",
        id,
        Uuid::new_v4()
    );
    let response = app.send(delete_request_with_auth(&path, &token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Last player takes the week with it.
    let path = format!(
        "/api/v1/admin/registrations/{}/players/{}",
        id,
        players[1]["id"].as_str().unwrap()
    );
    let response = app.send(delete_request_with_auth(&path, &token)).await;
    let body = parse_response_body(response).await;
    assert_eq!(body["registrationDeleted"], true);
    assert!(app.store.list_registrations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_export_import_round_trip() {
    let app = spawn_app();
    let token = login(&app).await;
    submit(&app, &["An", "Binh", "Chi"]).await;

    let response = app
        .send(get_request_with_auth("/api/v1/admin/export", &token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"club-registrations-"));

    let exported = parse_response_body(response).await;
    assert_eq!(exported["metadata"]["totalRegistrations"], 1);
    assert_eq!(exported["metadata"]["totalPlayers"], 3);

    // Wipe, then restore from the export.
    app.store.replace_all(&Settings::default(), &[]).await.unwrap();
    assert!(app.store.list_registrations().await.unwrap().is_empty());

    let response = app
        .send(json_request_with_auth(
            Method::POST,
            "/api/v1/admin/import",
            exported.clone(),
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["totalRegistrations"], 1);
    assert_eq!(body["totalPlayers"], 3);

    let restored = app.store.list_registrations().await.unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(
        restored[0].id.to_string(),
        exported["registrations"][0]["id"].as_str().unwrap()
    );
}

#[tokio::test]
async fn test_import_rejects_incomplete_document() {
    let app = spawn_app();
    let token = login(&app).await;
    submit(&app, &["An"]).await;

    let response = app
        .send(json_request_with_auth(
            Method::POST,
            "/api/v1/admin/import",
            json!({ "settings": {}, "registrations": [] }),
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("metadata"));

    // Existing data untouched.
    assert_eq!(app.store.list_registrations().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_import_rejects_duplicate_weeks() {
    let app = spawn_app();
    let token = login(&app).await;
    submit(&app, &["An"]).await;

    let response = app
        .send(get_request_with_auth("/api/v1/admin/export", &token))
        .await;
    let mut exported = parse_response_body(response).await;

    let mut copy = exported["registrations"][0].clone();
    copy["id"] = json!(Uuid::new_v4());
    exported["registrations"]
        .as_array_mut()
        .unwrap()
        .push(copy);

    let response = app
        .send(json_request_with_auth(
            Method::POST,
            "/api/v1/admin/import",
            exported,
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

async fn exported_document(app: &common::TestApp, token: &str) -> serde_json::Value {
    let response = app
        .send(get_request_with_auth("/api/v1/admin/export", token))
        .await;
    parse_response_body(response).await
}

#[tokio::test]
async fn test_import_rejects_repeated_player_in_week() {
    let app = spawn_app();
    let token = login(&app).await;
    submit(&app, &["An", "Binh"]).await;

    let mut exported = exported_document(&app, &token).await;
    let mut repeat = exported["registrations"][0]["players"][0].clone();
    repeat["id"] = json!(Uuid::new_v4());
    repeat["name"] = json!(" an ");
    exported["registrations"][0]["players"]
        .as_array_mut()
        .unwrap()
        .push(repeat);

    let response = app
        .send(json_request_with_auth(
            Method::POST,
            "/api/v1/admin/import",
            exported,
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("more than once"));

    let stored = app.store.list_registrations().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].players.len(), 2);
}

#[tokio::test]
async fn test_import_rejects_week_without_players() {
    let app = spawn_app();
    let token = login(&app).await;
    submit(&app, &["An"]).await;

    let mut exported = exported_document(&app, &token).await;
    exported["registrations"][0]["players"] = json!([]);

    let response = app
        .send(json_request_with_auth(
            Method::POST,
            "/api/v1/admin/import",
            exported,
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("no players"));

    let stored = app.store.list_registrations().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].players.len(), 1);
}

#[tokio::test]
async fn test_audit_log_listing() {
    let app = spawn_app();
    let token = login(&app).await;

    // One failed login for the security stream.
    app.send(json_request(
        Method::POST,
        "/api/v1/auth/admin/login",
        json!({ "code": "999999" }),
    ))
    .await;
    settle().await;

    let response = app
        .send(get_request_with_auth(
            "/api/v1/admin/audit-logs?kind=security",
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["logs"][0]["kind"], "security");
    assert_eq!(body["logs"][0]["action"], "ADMIN_LOGIN_FAILED");

    let response = app
        .send(get_request_with_auth(
            "/api/v1/admin/audit-logs?kind=admin",
            &token,
        ))
        .await;
    let body = parse_response_body(response).await;
    assert!(body["logs"]
        .as_array()
        .unwrap()
        .iter()
        .all(|l| l["kind"] == "admin"));

    let response = app
        .send(get_request_with_auth(
            "/api/v1/admin/audit-logs?kind=everything",
            &token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_diagnostics_report() {
    let app = spawn_app();
    let token = login(&app).await;
    submit(&app, &["An", "Binh"]).await;

    let response = app
        .send(get_request_with_auth("/api/v1/admin/diagnostics", &token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["backend"], "memory");
    assert_eq!(body["storageHealthy"], true);
    assert_eq!(body["totalRegistrations"], 1);
    assert_eq!(body["totalPlayers"], 2);
    assert_eq!(body["integrityOk"], true);
    assert_eq!(body["duplicateWeeks"], json!([]));
}

#[tokio::test]
async fn test_diagnostics_flags_unreadable_storage() {
    let app = spawn_app();
    let token = login(&app).await;
    submit(&app, &["An"]).await;
    settle().await;

    app.store.set_available(false);
    let response = app
        .send(get_request_with_auth("/api/v1/admin/diagnostics", &token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["storageHealthy"], false);
    assert!(body["storageError"].is_string());
    assert_eq!(body["integrityOk"], false);
    assert_eq!(body["totalRegistrations"], 0);
}
