//! Route-level tests driven through the router with `oneshot`.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use cupid_api::fallback::JsonFallback;
use cupid_api::router;
use cupid_api::state::{AppState, AppStateInner, Settings};
use cupid_api::storage::Storage;
use cupid_db::Database;

const PUBLIC_URL: &str = "http://localhost:3000";

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("cupid-routes-{}-{}", name, uuid::Uuid::new_v4()))
}

struct Fixture {
    state: AppState,
    app: Router,
    files: PathBuf,
}

async fn fixture(admin_token: Option<&str>) -> Fixture {
    let files = temp_dir("files");
    let db = Arc::new(Database::open_in_memory().unwrap());
    let storage = Arc::new(Storage::new(files.clone()).await.unwrap());
    let fallback = JsonFallback::new(temp_dir("fallback")).await.unwrap();
    let settings = Settings {
        public_url: PUBLIC_URL.into(),
        retention_days: 30,
        admin_token: admin_token.map(str::to_string),
        max_upload_bytes: 1024,
    };
    let state: AppState = Arc::new(AppStateInner::new(db, storage, fallback, settings));
    Fixture {
        app: router(state.clone()),
        state,
        files,
    }
}

async fn app_with(admin_token: Option<&str>) -> Router {
    fixture(admin_token).await.app
}

/// Make every write to the proposals table fail.
fn break_proposals_table(state: &AppState) {
    state
        .db
        .with_conn_mut(|conn| {
            conn.execute_batch("DROP TABLE proposals;")?;
            Ok(())
        })
        .unwrap();
}

async fn app() -> Router {
    app_with(None).await
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn publish(app: &Router, extra: Value) -> String {
    let mut body = json!({
        "proposer_name": "Alice",
        "partner_name": "Bob",
        "love_message": "You make every day brighter",
    });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    let (status, created) = send(app, "POST", "/proposals", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created["slug"].as_str().unwrap().to_string()
}

async fn event(app: &Router, session: &str, kind: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/sessions/{}/events", session),
        Some(json!({ "event": { "type": kind } })),
    )
    .await
}

async fn session_at_collection(app: &Router, slug: &str) -> String {
    let (status, view) = send(app, "POST", &format!("/proposals/{}/sessions", slug), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = view["session_id"].as_str().unwrap().to_string();

    event(app, &id, "begin").await;
    loop {
        let (_, current) = send(app, "GET", &format!("/sessions/{}", id), None).await;
        if current["step"]["step"] != "question" {
            break;
        }
        event(app, &id, "affirm").await;
    }
    event(app, &id, "interstitial_complete").await;
    event(app, &id, "reveal").await;
    let (status, out) = event(app, &id, "affirm").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["view"]["step"]["step"], "response_collection");
    assert_eq!(out["effect"]["type"], "start_celebration");
    id
}

#[tokio::test]
async fn health() {
    let (status, _) = send(&app().await, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn publish_and_fetch() {
    let app = app().await;
    let slug = publish(&app, json!({ "confetti_style": "stars" })).await;
    assert!(slug.starts_with("alice-bob-"));

    let (status, def) = send(&app, "GET", &format!("/{}", slug), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(def["partner_name"], "Bob");
    assert_eq!(def["theme"], "romantic-garden");
    assert_eq!(def["confetti_style"], "stars");
    assert_eq!(def["collect_responses"], true);
}

#[tokio::test]
async fn missing_fields_and_too_many_questions() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/proposals",
        Some(json!({ "proposer_name": "Alice", "partner_name": " ", "love_message": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("required"));

    let questions: Vec<Value> = (0..7)
        .map(|i| json!({ "id": i.to_string(), "prompt": "?", "affirmative_label": "Yes", "evasive_label": "No" }))
        .collect();
    let (status, _) = send(
        &app,
        "POST",
        "/proposals",
        Some(json!({
            "proposer_name": "Alice",
            "partner_name": "Bob",
            "love_message": "x",
            "questions": questions,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_slug_redirects_to_expired() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(Request::get("/nobody-here-1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/expired");

    let (status, notice) = send(&app, "GET", "/expired", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(notice["title"].as_str().unwrap().contains("faded"));

    let (status, _) = send(&app, "POST", "/proposals/nobody-here-1/sessions", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uploaded_photo_is_served() {
    let app = app().await;
    let slug = publish(
        &app,
        json!({ "photos": [{ "file_name": "us.png", "data": "iVBORw==", "caption": "us" }] }),
    )
    .await;

    let (_, def) = send(&app, "GET", &format!("/{}", slug), None).await;
    let url = def["photos"][0]["source"]["url"].as_str().unwrap().to_string();
    let path = url.strip_prefix(PUBLIC_URL).unwrap();
    assert!(path.starts_with(&format!("/files/proposals/{}/", slug)));

    let response = app
        .clone()
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
}

#[tokio::test]
async fn oversized_photo_is_rejected() {
    let app = app().await;
    let big = base64_of(&vec![0u8; 2048]);
    let (status, _) = send(
        &app,
        "POST",
        "/proposals",
        Some(json!({
            "proposer_name": "Alice",
            "partner_name": "Bob",
            "love_message": "x",
            "photos": [{ "file_name": "big.jpg", "data": big }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

fn base64_of(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[tokio::test]
async fn walk_and_respond() {
    let app = app().await;
    let slug = publish(&app, json!({})).await;
    let session = session_at_collection(&app, &slug).await;

    let (status, out) = send(
        &app,
        "POST",
        &format!("/sessions/{}/response", session),
        Some(json!({ "sentiment": "yes", "message": "Forever 💖" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{out}");
    assert_eq!(out["confirmation"]["title"], "Response sent! 💕");
    assert_eq!(out["view"]["step"]["step"], "response_submitted");
    assert_eq!(out["view"]["step"]["sentiment"], "yes");

    let (_, listed) = send(&app, "GET", &format!("/responses?slug={}", slug), None).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["respondent_name"], "Bob");
    assert_eq!(listed[0]["message"], "Forever 💖");

    // nothing more to collect
    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{}/response", session),
        Some(json!({ "sentiment": "no" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn long_message_keeps_collecting() {
    let app = app().await;
    let slug = publish(&app, json!({})).await;
    let session = session_at_collection(&app, &slug).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{}/response", session),
        Some(json!({ "sentiment": "not_yet", "message": "a".repeat(201) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, view) = send(&app, "GET", &format!("/sessions/{}", session), None).await;
    assert_eq!(view["step"]["step"], "response_collection");
    assert_eq!(view["submitting"], false);

    let (_, listed) = send(&app, "GET", "/responses", None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn out_of_order_events_conflict() {
    let app = app().await;
    let slug = publish(&app, json!({})).await;
    let (_, view) = send(&app, "POST", &format!("/proposals/{}/sessions", slug), None).await;
    let id = view["session_id"].as_str().unwrap();

    let (status, body) = event(&app, id, "reveal").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("reveal"));

    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{}/events", id),
        Some(json!({ "event": { "type": "submission_succeeded", "data": { "sentiment": "yes" } } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn countdown_blocks_begin() {
    let app = app().await;
    let opens = (chrono::Utc::now() + chrono::Duration::days(2)).to_rfc3339();
    let slug = publish(&app, json!({ "countdown_at": opens })).await;
    let (_, view) = send(&app, "POST", &format!("/proposals/{}/sessions", slug), None).await;
    assert_eq!(view["countdown"]["days"], 1);
    let id = view["session_id"].as_str().unwrap();

    let (status, _) = event(&app, id, "begin").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn legacy_ending_without_collection() {
    let app = app().await;
    let slug = publish(&app, json!({ "collect_responses": false })).await;
    let (_, view) = send(&app, "POST", &format!("/proposals/{}/sessions", slug), None).await;
    let id = view["session_id"].as_str().unwrap().to_string();

    event(&app, &id, "begin").await;
    for _ in 0..3 {
        event(&app, &id, "affirm").await;
    }
    event(&app, &id, "interstitial_complete").await;
    event(&app, &id, "reveal").await;
    let (_, out) = event(&app, &id, "affirm").await;
    assert_eq!(out["view"]["step"]["step"], "celebration");
}

#[tokio::test]
async fn cleanup_requires_configured_token() {
    let app = app_with(Some("s3cret")).await;
    let (status, _) = send(&app, "POST", "/admin/cleanup", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::post("/admin/cleanup")
                .header(header::AUTHORIZATION, "Bearer s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let summary: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(summary["success"], true);
    assert_eq!(summary["cleaned"], 0);
}

#[tokio::test]
async fn premium_toggle() {
    let app = app().await;
    let slug = publish(&app, json!({})).await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/admin/proposals/{}/premium", slug),
        Some(json!({ "premium": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, def) = send(&app, "GET", &format!("/{}", slug), None).await;
    assert_eq!(def["is_premium"], true);

    let (status, _) = send(
        &app,
        "PUT",
        "/admin/proposals/nobody-1/premium",
        Some(json!({ "premium": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refused_proposal_is_served_from_fallback() {
    let Fixture { state, app, .. } = fixture(None).await;
    break_proposals_table(&state);

    let (status, created) = send(
        &app,
        "POST",
        "/proposals",
        Some(json!({
            "proposer_name": "Alice",
            "partner_name": "Bob",
            "love_message": "You make every day brighter",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["stored_locally"], true);
    let slug = created["slug"].as_str().unwrap().to_string();

    let (status, def) = send(&app, "GET", &format!("/{}", slug), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(def["slug"], slug.as_str());
    assert_eq!(def["love_message"], "You make every day brighter");
}

#[tokio::test]
async fn fallback_proposal_accepts_responses() {
    let Fixture { state, app, .. } = fixture(None).await;
    break_proposals_table(&state);
    let slug = publish(&app, json!({})).await;
    let session = session_at_collection(&app, &slug).await;

    let (status, out) = send(
        &app,
        "POST",
        &format!("/sessions/{}/response", session),
        Some(json!({ "sentiment": "yes" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{out}");
    assert_eq!(out["view"]["step"]["step"], "response_submitted");

    let (_, listed) = send(&app, "GET", &format!("/responses?slug={}", slug), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_upload_keeps_photo_inline() {
    let Fixture { app, files, .. } = fixture(None).await;
    // a plain file where the proposals directory should go
    std::fs::write(files.join("proposals"), b"in the way").unwrap();

    let slug = publish(
        &app,
        json!({ "photos": [{ "file_name": "us.png", "data": "iVBORw==", "caption": "us" }] }),
    )
    .await;

    let (status, def) = send(&app, "GET", &format!("/{}", slug), None).await;
    assert_eq!(status, StatusCode::OK);
    let source = &def["photos"][0]["source"];
    assert_eq!(source["kind"], "local");
    assert_eq!(source["bytes"], "iVBORw==");
    assert_eq!(def["photos"][0]["caption"], "us");
}

#[tokio::test]
async fn dropped_submit_request_still_finishes() {
    use axum::Json;
    use axum::extract::{Path, State};
    use std::task::{Context, Poll, Waker};

    let Fixture { state, app, .. } = fixture(None).await;
    let slug = publish(&app, json!({})).await;
    let session = session_at_collection(&app, &slug).await;
    let id: uuid::Uuid = session.parse().unwrap();

    let req = serde_json::from_value(json!({ "sentiment": "yes" })).unwrap();
    let mut pending = Box::pin(cupid_api::sessions::submit_response(
        State(state.clone()),
        Path(id),
        Json(req),
    ));
    let mut cx = Context::from_waker(Waker::noop());
    assert!(matches!(pending.as_mut().poll(&mut cx), Poll::Pending));
    assert!(state.sessions.view(id).await.unwrap().submitting);
    drop(pending);

    for _ in 0..200 {
        if !state.sessions.view(id).await.unwrap().submitting {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let (_, view) = send(&app, "GET", &format!("/sessions/{}", session), None).await;
    assert_eq!(view["submitting"], false);
    assert_eq!(view["step"]["step"], "response_submitted");
    assert_eq!(view["finished"], true);

    let (_, listed) = send(&app, "GET", &format!("/responses?slug={}", slug), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}
