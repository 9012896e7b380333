//! Integration tests for public registration endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{get_request, json_request, parse_response_body, spawn_app, submit};
use domain::store::ClubStore;
use fake::faker::name::en::FirstName;
use fake::Fake;
use serde_json::json;

#[tokio::test]
async fn test_health_endpoints() {
    let app = spawn_app();

    let response = app.send(get_request("/api/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"]["backend"], "memory");

    let response = app.send(get_request("/api/health/ready")).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.store.set_available(false);
    let response = app.send(get_request("/api/health/ready")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = spawn_app();
    let response = app.send(get_request("/api/health/live")).await;

    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_default_settings_served() {
    let app = spawn_app();
    let response = app.send(get_request("/api/v1/settings")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["courtsCount"], 2);
    assert_eq!(body["playersPerCourt"], 4);
    assert_eq!(body["registrationEnabled"], true);
    assert_eq!(body["feeSharing"], "allPlayers");
}

#[tokio::test]
async fn test_next_week_label() {
    let app = spawn_app();
    let response = app.send(get_request("/api/v1/week/next")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    let label = body["label"].as_str().unwrap();
    assert_eq!(label.len(), "dd/mm/yyyy - dd/mm/yyyy".len());
    assert!(body["startsAt"].as_str().unwrap().ends_with("+07:00"));
}

#[tokio::test]
async fn test_fee_preview_nine_players() {
    let app = spawn_app();
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/fees/preview",
            json!({ "playerCount": 9 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["extraPlayersCount"], 1);
    assert_eq!(body["extraCourts"], 1);
    assert_eq!(body["requiredCourts"], 3);
    assert_eq!(body["totalExtraFee"], 100000.0);
    let fee = body["feePerPlayer"].as_f64().unwrap();
    assert!((fee - 100000.0 / 9.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_first_submission_creates_week() {
    let app = spawn_app();
    let (status, body) = submit(&app, &["An", "Binh"]).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["action"], "create");
    assert_eq!(body["added"], 2);
    assert_eq!(body["rejectedDuplicates"], json!([]));
    assert_eq!(body["summary"]["totalPlayers"], 2);
    assert_eq!(body["registration"]["players"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_partial_merge_keeps_one_record() {
    let app = spawn_app();
    submit(&app, &["An", "Binh"]).await;

    let (status, body) = submit(&app, &["an", " Binh ", "Chi"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "merge");
    assert_eq!(body["added"], 1);
    assert_eq!(body["rejectedDuplicates"], json!(["an", " Binh "]));

    let names: Vec<&str> = body["registration"]["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["An", "Binh", "Chi"]);

    assert_eq!(app.store.list_registrations().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_full_duplicate_submission_is_noop() {
    let app = spawn_app();
    submit(&app, &["An", "Binh"]).await;

    let (status, body) = submit(&app, &["AN", "binh"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "merge");
    assert_eq!(body["added"], 0);
    assert_eq!(body["rejectedDuplicates"].as_array().unwrap().len(), 2);
    assert_eq!(body["registration"]["revision"], 0);
}

#[tokio::test]
async fn test_invalid_submissions_rejected() {
    let app = spawn_app();

    let (status, body) = submit(&app, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = submit(&app, &["   "]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long_name = "x".repeat(51);
    let (status, _) = submit(&app, &[long_name.as_str()]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = submit(&app, &["Chi", "chi "]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.store.list_registrations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_current_registration() {
    let app = spawn_app();

    let response = app.send(get_request("/api/v1/registrations/current")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    submit(&app, &["An"]).await;
    let response = app.send(get_request("/api/v1/registrations/current")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["players"][0]["name"], "An");
    assert_eq!(body["summary"]["totalPlayers"], 1);
}

#[tokio::test]
async fn test_list_includes_summaries() {
    let app = spawn_app();
    let names: Vec<String> = (0..9).map(|_| FirstName().fake::<String>()).collect();
    let mut unique: Vec<&str> = Vec::new();
    for name in &names {
        if !unique.iter().any(|u| u.eq_ignore_ascii_case(name)) {
            unique.push(name.as_str());
        }
    }
    submit(&app, &unique).await;

    let response = app.send(get_request("/api/v1/registrations")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["summary"]["totalPlayers"], unique.len());
    assert!(list[0]["summary"]["weekInfo"].is_string());
}

#[tokio::test]
async fn test_concurrent_first_submissions_create_one_week() {
    let app = spawn_app();

    let mut handles = Vec::new();
    for i in 0..6 {
        let router = app.router.clone();
        handles.push(tokio::spawn(async move {
            use tower::ServiceExt;
            router
                .oneshot(json_request(
                    Method::POST,
                    "/api/v1/registrations",
                    json!({ "players": [format!("Player {}", i)] }),
                ))
                .await
                .unwrap()
                .status()
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap() == StatusCode::CREATED {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(app.store.list_registrations().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_registration_closed() {
    let app = spawn_app();
    app.store
        .update_settings(&domain::models::Settings {
            registration_enabled: false,
            ..Default::default()
        })
        .await
        .unwrap();

    let (status, body) = submit(&app, &["An"]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("closed"));
}

#[tokio::test]
async fn test_storage_outage_returns_503() {
    let app = spawn_app();
    app.store.set_available(false);

    let (status, body) = submit(&app, &["An"]).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_unavailable");
}
