//! End-to-end tests that drive the router against the in-memory store.

use api_lib::adapters::LogNotifier;
use api_lib::config::Config;
use api_lib::web::{self, state::AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use skill_swap_core::InMemoryDatabase;
use std::sync::Arc;
use tower::ServiceExt;

fn app_with(config: Config) -> Router {
    let db = Arc::new(InMemoryDatabase::new());
    let notifier = Arc::new(LogNotifier::new(config.app_base_url.clone()));
    web::router(Arc::new(AppState::new(db, notifier, Arc::new(config))))
}

fn app() -> Router {
    app_with(Config::default())
}

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    body: Value,
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    Reply {
        status,
        cookie,
        body,
    }
}

/// Registers a user and returns their session cookie and id.
async fn register(app: &Router, name: &str, teach: &[&str], learn: &[&str]) -> (String, String) {
    let reply = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": "Password1",
            "skills_to_teach": teach,
            "skills_to_learn": learn,
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    let id = reply.body["user"]["id"].as_str().unwrap().to_string();
    (reply.cookie.expect("register sets a session cookie"), id)
}

#[tokio::test]
async fn test_match_connect_and_schedule_over_http() {
    let app = app();
    let (alice, _alice_id) = register(&app, "Alice", &["React"], &["Node.js"]).await;
    let (bob, bob_id) = register(&app, "Bob", &["Node.js"], &["React"]).await;
    register(&app, "Carol", &["Cooking"], &["Painting"]).await;

    // Matches
    let reply = call(&app, Method::GET, "/api/users/matches", Some(&alice), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let matches = reply.body.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["user"]["name"], "Bob");
    assert_eq!(matches[0]["shared_teach"], json!(["Node.js"]));

    // Send a request without a body
    let connect_uri = format!("/api/users/connect/{}", bob_id);
    let reply = call(&app, Method::POST, &connect_uri, Some(&alice), None).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.body["request"]["status"], "pending");
    assert_eq!(
        reply.body["request"]["message"],
        "I would like to connect with you for skill exchange!"
    );
    assert_eq!(reply.body["notification_sent"], true);

    let reply = call(&app, Method::POST, &connect_uri, Some(&alice), None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "duplicate_request");

    // Bob sees the pending request
    let reply = call(&app, Method::GET, "/api/users/requests", Some(&bob), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let pending = reply.body.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["from"]["name"], "Alice");
    let request_id = pending[0]["id"].as_str().unwrap().to_string();

    // Only the recipient may accept, and only once
    let accept_uri = format!("/api/users/requests/{}/accept", request_id);
    let reply = call(&app, Method::POST, &accept_uri, Some(&alice), None).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["error"], "not_authorized");

    let reply = call(&app, Method::POST, &accept_uri, Some(&bob), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["request"]["status"], "accepted");

    let reply = call(&app, Method::POST, &accept_uri, Some(&bob), None).await;
    assert_eq!(reply.body["error"], "already_processed");

    let reject_uri = format!("/api/users/requests/{}/reject", request_id);
    let reply = call(&app, Method::POST, &reject_uri, Some(&bob), None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "already_processed");

    // Both sides see the connection
    let reply = call(&app, Method::GET, "/api/users/connections", Some(&alice), None).await;
    assert_eq!(reply.body.as_array().unwrap().len(), 1);
    assert_eq!(reply.body[0]["name"], "Bob");
    assert_eq!(reply.body[0]["skills_to_teach"], json!(["Node.js"]));
    assert_eq!(reply.body[0]["skills_to_learn"], json!(["React"]));
    let reply = call(&app, Method::GET, "/api/users/connections", Some(&bob), None).await;
    assert_eq!(reply.body[0]["name"], "Alice");

    let reply = call(&app, Method::POST, &connect_uri, Some(&alice), None).await;
    assert_eq!(reply.body["error"], "already_connected");

    // Schedule, update and delete an appointment
    let reply = call(
        &app,
        Method::POST,
        "/api/users/appointments",
        Some(&alice),
        Some(json!({
            "participant_ids": [bob_id],
            "meeting_link": "https://meet.example.com/abc",
            "title": "React for Node",
            "start_time": "2030-01-01T10:00:00Z",
            "end_time": "2030-01-01T11:00:00Z",
            "recurrence": { "frequency": "weekly", "count": 4 }
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.body["status"], "scheduled");
    assert_eq!(reply.body["participants"].as_array().unwrap().len(), 2);
    assert_eq!(reply.body["recurrence"]["interval"], 1);
    let appointment_uri = format!(
        "/api/users/appointments/{}",
        reply.body["id"].as_str().unwrap()
    );

    let reply = call(&app, Method::GET, "/api/users/appointments", Some(&bob), None).await;
    assert_eq!(reply.body.as_array().unwrap().len(), 1);

    let reply = call(
        &app,
        Method::PATCH,
        &appointment_uri,
        Some(&bob),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "completed");
    assert_eq!(reply.body["title"], "React for Node");

    let reply = call(&app, Method::DELETE, &appointment_uri, Some(&bob), None).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = call(&app, Method::DELETE, &appointment_uri, Some(&alice), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["message"], "Appointment deleted");

    let reply = call(&app, Method::GET, "/api/users/appointments", Some(&bob), None).await;
    assert_eq!(reply.body, json!([]));
}

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let app = app();
    let reply = call(&app, Method::GET, "/api/users/me", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"], "unauthorized");

    let reply = call(
        &app,
        Method::GET,
        "/api/users/me",
        Some("session=not-a-session"),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = call(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "ok");
}

#[tokio::test]
async fn test_login_logout_cycle() {
    let app = app();
    register(&app, "Alice", &["React"], &[]).await;

    let reply = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "Password2" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "Password1" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "Password1" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let session = reply.cookie.unwrap();

    let reply = call(&app, Method::GET, "/api/users/me", Some(&session), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["email"], "alice@example.com");
    assert!(reply.body.get("hashed_password").is_none());

    let reply = call(&app, Method::POST, "/api/auth/logout", Some(&session), None).await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = call(&app, Method::GET, "/api/users/me", Some(&session), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_validation() {
    let app = app();
    let reply = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Weak", "email": "weak@example.com", "password": "password" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "invalid_request");

    register(&app, "Alice", &[], &[]).await;
    let reply = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Alice2", "email": "alice@example.com", "password": "Password1" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_errors() {
    let app = app();
    let (alice, alice_id) = register(&app, "Alice", &["React"], &["Node.js"]).await;

    let reply = call(
        &app,
        Method::POST,
        &format!("/api/users/connect/{}", alice_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "self_connection");

    let reply = call(
        &app,
        Method::POST,
        &format!("/api/users/connect/{}", uuid::Uuid::new_v4()),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = call(
        &app,
        Method::POST,
        &format!("/api/users/requests/{}/accept", uuid::Uuid::new_v4()),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], "not_found");
}

#[tokio::test]
async fn test_update_skills_replaces_supplied_lists() {
    let app = app();
    let (alice, _) = register(&app, "Alice", &["React"], &["Node.js"]).await;

    let reply = call(
        &app,
        Method::PUT,
        "/api/users/me",
        Some(&alice),
        Some(json!({ "skills_to_learn": ["Rust", "SQL"] })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["skills_to_teach"], json!(["React"]));
    assert_eq!(reply.body["skills_to_learn"], json!(["Rust", "SQL"]));
}

#[tokio::test]
async fn test_connected_participants_policy() {
    let config = Config {
        require_connected_participants: true,
        ..Config::default()
    };
    let app = app_with(config);
    let (alice, _) = register(&app, "Alice", &["React"], &["Node.js"]).await;
    let (_, carol_id) = register(&app, "Carol", &["Cooking"], &["Painting"]).await;

    let reply = call(
        &app,
        Method::POST,
        "/api/users/appointments",
        Some(&alice),
        Some(json!({
            "participant_ids": [carol_id],
            "meeting_link": "https://meet.example.com/xyz",
            "title": "Cooking",
            "start_time": "2030-01-01T10:00:00Z",
            "end_time": "2030-01-01T11:00:00Z"
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["error"], "not_authorized");
}

#[tokio::test]
async fn test_malformed_ids_get_json_errors() {
    let app = app();
    let (alice, _) = register(&app, "Alice", &["React"], &["Node.js"]).await;

    for (method, uri) in [
        (Method::POST, "/api/users/connect/not-a-uuid"),
        (Method::POST, "/api/users/requests/not-a-uuid/accept"),
        (Method::POST, "/api/users/requests/not-a-uuid/reject"),
        (Method::DELETE, "/api/users/appointments/not-a-uuid"),
    ] {
        let reply = call(&app, method, uri, Some(&alice), None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(reply.body["error"], "invalid_request", "{}", uri);
    }

    let reply = call(
        &app,
        Method::PATCH,
        "/api/users/appointments/not-a-uuid",
        Some(&alice),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "invalid_request");
}
