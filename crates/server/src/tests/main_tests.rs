use super::*;
use axum::{body, body::Body, http::Request};
use dispatch::catalog::{NEWS, STAFF};
use tower::ServiceExt;

fn test_app(bot_running: bool) -> (tempfile::TempDir, Router, Dispatcher) {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = Arc::new(Catalog::department());
    let store = CounterStore::load(dir.path().join("bot_stats.json"), &catalog.counter_schema());
    let dispatcher = Dispatcher::new(catalog, store);
    let state = AppState {
        status: dispatcher.status().clone(),
        bot_running: Arc::new(AtomicBool::new(bot_running)),
    };
    (dir, build_router(Arc::new(state)), dispatcher)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::get(uri).body(Body::empty()).expect("request");
    send_json(app, request).await
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&body).expect("json"))
}

#[tokio::test]
async fn health_reports_bot_flag_independent_of_counters() {
    let (_dir, app, _dispatcher) = test_app(false);
    let (status, body) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "telegram-bot");
    assert_eq!(body["bot_running"], false);
    assert!(body["timestamp"].as_f64().expect("timestamp") > 0.0);

    let (_dir, app, _dispatcher) = test_app(true);
    let (_, body) = get_json(app, "/health").await;
    assert_eq!(body["bot_running"], true);
}

#[tokio::test]
async fn stats_exposes_counts_and_total() {
    let (_dir, app, dispatcher) = test_app(true);
    dispatcher.handle(NEWS);
    dispatcher.handle(NEWS);
    dispatcher.handle(STAFF);
    dispatcher.handle("something else");

    let (status, body) = get_json(app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["total_requests"], 3);
    assert_eq!(body["button_stats"][NEWS], 2);
    assert_eq!(body["button_stats"][STAFF], 1);
    assert_eq!(body["button_stats"].as_object().expect("object").len(), 8);
}

#[tokio::test]
async fn stats_after_reset_are_zero() {
    let (_dir, app, dispatcher) = test_app(true);
    dispatcher.handle(NEWS);
    dispatcher.handle("/statreset");

    let (_, body) = get_json(app, "/stats").await;
    assert_eq!(body["total_requests"], 0);
    assert!(body["button_stats"]
        .as_object()
        .expect("object")
        .values()
        .all(|count| count == 0));
}

#[tokio::test]
async fn reset_endpoint_zeroes_live_counters_and_file() {
    let (dir, app, dispatcher) = test_app(true);
    dispatcher.handle(NEWS);
    dispatcher.handle(NEWS);

    let request = Request::post("/stats/reset")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send_json(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_requests"], 0);

    // Later presses count up from the reset, both in memory and on disk.
    dispatcher.handle(NEWS);
    let (_, body) = get_json(app, "/stats").await;
    assert_eq!(body["button_stats"][NEWS], 1);
    assert_eq!(body["total_requests"], 1);

    let path = dir.path().join("bot_stats.json");
    let saved = std::fs::read(&path).expect("saved");
    let saved: serde_json::Value = serde_json::from_slice(&saved).expect("json");
    assert_eq!(saved[NEWS], 1);
    assert_eq!(saved[STAFF], 0);
}

#[tokio::test]
async fn reset_endpoint_rejects_get() {
    let (_dir, app, _dispatcher) = test_app(true);
    let request = Request::get("/stats/reset")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn home_page_links_endpoints() {
    let (_dir, app, _dispatcher) = test_app(true);
    let request = Request::get("/").body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let html = String::from_utf8(body.to_vec()).expect("utf8");
    assert!(html.contains("href=\"/health\""));
    assert!(html.contains("href=\"/stats\""));
}

#[tokio::test]
async fn unknown_route_returns_error_envelope() {
    let (_dir, app, _dispatcher) = test_app(true);
    let (status, body) = get_json(app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}
