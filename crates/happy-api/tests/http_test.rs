//! Drives the full router in-process: sign up, login, save and recall moments.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use happy_api::AppStateInner;
use happy_api::routes::router;
use happy_db::Database;

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0xFF, 0xD9];

fn app() -> Router {
    app_with_body_limit(64 * 1024)
}

fn app_with_body_limit(max_body_bytes: usize) -> Router {
    let db = Arc::new(Database::open_in_memory().unwrap());
    router(AppStateInner::new(
        db,
        "test-secret".into(),
        Duration::days(1),
        max_body_bytes,
    ))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn sign_up_and_login(app: &Router, username: &str) -> String {
    let creds = json!({ "username": username, "password": "hunter22" });

    let (status, _) = send(app, Method::POST, "/auth/register", None, Some(creds.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app, Method::POST, "/auth/login", None, Some(creds)).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_conflict_on_duplicate_username() {
    let app = app();
    let creds = json!({ "username": "alice", "password": "correct" });

    let (status, body) = send(&app, Method::POST, "/auth/register", None, Some(creds.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["user_id"].is_i64());

    let (status, body) = send(&app, Method::POST, "/auth/register", None, Some(creds)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "Username already exists. Please choose a different one."
    );
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = app();
    let creds = json!({ "username": "alice", "password": "correct" });
    send(&app, Method::POST, "/auth/register", None, Some(creds)).await;

    let wrong = json!({ "username": "alice", "password": "wrong" });
    let (status, wrong_body) = send(&app, Method::POST, "/auth/login", None, Some(wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let unknown = json!({ "username": "mallory", "password": "correct" });
    let (status, unknown_body) = send(&app, Method::POST, "/auth/login", None, Some(unknown)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"], "Invalid username or password");
}

#[tokio::test]
async fn login_returns_session_for_me() {
    let app = app();
    let token = sign_up_and_login(&app, "alice").await;

    let (status, body) = send(&app, Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = app();

    let (status, _) = send(&app, Method::GET, "/moments/random", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/me", Some("forged.token.value"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let note = json!({ "note": "sneaky" });
    let (status, _) = send(&app, Method::POST, "/moments", None, Some(note)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn save_and_recall_moment_with_image() {
    let app = app();
    let token = sign_up_and_login(&app, "alice").await;

    let (status, body) = send(&app, Method::GET, "/moments/random", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "You haven't added any happy moments yet. Start by adding one!"
    );

    let moment = json!({ "note": "Got a promotion", "image": B64.encode(JPEG) });
    let (status, saved) = send(&app, Method::POST, "/moments", Some(&token), Some(moment)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::GET, "/moments/random", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], saved["id"]);
    assert_eq!(body["note"], "Got a promotion");
    assert_eq!(body["image_type"], "image/jpeg");
    assert_eq!(body["created_at"], saved["created_at"]);

    let image = B64.decode(body["image"].as_str().unwrap()).unwrap();
    assert_eq!(image, JPEG);
}

#[tokio::test]
async fn moment_without_image_omits_image_fields() {
    let app = app();
    let token = sign_up_and_login(&app, "alice").await;

    let moment = json!({ "note": "warm soup" });
    let (status, _) = send(&app, Method::POST, "/moments", Some(&token), Some(moment)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, Method::GET, "/moments/random", Some(&token), None).await;
    assert_eq!(body["note"], "warm soup");
    assert!(body.get("image").is_none());
    assert!(body.get("image_type").is_none());
}

#[tokio::test]
async fn invalid_moments_rejected() {
    let app = app();
    let token = sign_up_and_login(&app, "alice").await;

    let blank = json!({ "note": "   " });
    let (status, body) = send(&app, Method::POST, "/moments", Some(&token), Some(blank)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter a note for your happy moment.");

    let bad_base64 = json!({ "note": "hi", "image": "***" });
    let (status, _) = send(&app, Method::POST, "/moments", Some(&token), Some(bad_base64)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let gif = json!({ "note": "hi", "image": B64.encode(b"GIF89a\x01\x00") });
    let (status, body) = send(&app, Method::POST, "/moments", Some(&token), Some(gif)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only PNG and JPEG images are supported.");

    let (status, _) = send(&app, Method::GET, "/moments/random", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn moments_stay_with_their_owner() {
    let app = app();
    let alice = sign_up_and_login(&app, "alice").await;
    let bob = sign_up_and_login(&app, "bob").await;

    let moment = json!({ "note": "alice's secret joy" });
    send(&app, Method::POST, "/moments", Some(&alice), Some(moment)).await;

    let (status, _) = send(&app, Method::GET, "/moments/random", Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_body_rejected() {
    let app = app_with_body_limit(1024);
    let token = sign_up_and_login(&app, "alice").await;

    let mut big = JPEG.to_vec();
    big.resize(4096, 0);
    let moment = json!({ "note": "huge", "image": B64.encode(&big) });
    let (status, _) = send(&app, Method::POST, "/moments", Some(&token), Some(moment)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn health_check() {
    let app = app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}
