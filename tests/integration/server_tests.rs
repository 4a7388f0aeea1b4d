//! Integration tests for the HTTP service
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pixiv_crawler::config::Config;
use pixiv_crawler::server::{create_router, AppState};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot()

fn create_test_state(dir: &Path) -> AppState {
    let mut config = Config::default();
    config.server.download_root = dir.join("downloads").to_string_lossy().into_owned();
    config.auth.token_path = dir.join("token.txt").to_string_lossy().into_owned();
    config.api.base_url = "http://127.0.0.1:1".to_string();
    config.api.oauth_url = None;
    AppState::new(config)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn populate_run(state: &AppState, run: &str) {
    let dir = state.run_dir(run);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("1.png"), b"png-one").unwrap();
    std::fs::write(dir.join("2.png"), b"png-two").unwrap();
    std::fs::write(dir.join("notes.txt"), b"skip me").unwrap();
}

#[tokio::test]
async fn test_health_check() {
    let dir = TempDir::new().unwrap();
    let app = create_router(create_test_state(dir.path()));

    let (status, _, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_index_serves_form() {
    let dir = TempDir::new().unwrap();
    let app = create_router(create_test_state(dir.path()));

    let (status, _, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains(r#"name="tags""#));
    assert!(html.contains("R-18, AI"));
}

#[tokio::test]
async fn test_invalid_form_is_rejected() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(dir.path());
    let app = create_router(state.clone());

    let (status, _, _) = send(&app, post_form("/", "tags=+,+&max_items=5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(&app, post_form("/", "tags=cat&max_items=lots")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "invalid_request");

    assert!(state.runs.is_empty());
}

#[tokio::test]
async fn test_start_crawl_redirects_to_status() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(dir.path());
    let app = create_router(state.clone());

    let (status, headers, _) = send(
        &app,
        post_form("/", "tags=cat%2C+dog&exclude_tags=AI&max_items=3"),
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    let location = headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(location.starts_with("/status/"));
    assert_eq!(state.runs.len(), 1);

    let (status, _, body) = send(&app, get(&location)).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains(r#"http-equiv="refresh""#));

    // No token is cached and no login endpoint is configured: the run fails
    let run = location.trim_start_matches("/status/").to_string();
    let handle = state.runs.get(&run).unwrap();
    for _ in 0..50 {
        if handle
            .status
            .snapshot()
            .iter()
            .any(|e| e.message.starts_with("Crawl failed"))
        {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(handle.status.snapshot()[0]
        .message
        .contains("Starting crawl for cat, dog"));
    assert!(handle
        .status
        .snapshot()
        .iter()
        .any(|e| e.message.starts_with("Crawl failed")));
}

#[tokio::test]
async fn test_failed_run_is_no_longer_running() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(dir.path());
    let app = create_router(state.clone());

    let mut request = post_form("/", "tags=cat&max_items=3");
    let peer: std::net::SocketAddr = "192.0.2.10:51000".parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    let (status, headers, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let location = headers[header::LOCATION].to_str().unwrap().to_string();
    let messages_uri = format!("{}/messages", location);

    let mut json = serde_json::Value::Null;
    for _ in 0..100 {
        let (_, _, body) = send(&app, get(&messages_uri)).await;
        json = serde_json::from_slice(&body).unwrap();
        if json["running"] == false {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    assert_eq!(json["running"], false);
    assert!(json["messages"]
        .as_array()
        .unwrap()
        .iter()
        .any(|m| m["message"].as_str().unwrap().starts_with("Crawl failed")));

    let (_, _, body) = send(&app, get(&location)).await;
    let html = String::from_utf8(body).unwrap();
    assert!(!html.contains("Cancel crawl"));
}

#[tokio::test]
async fn test_unknown_run_is_not_found() {
    let dir = TempDir::new().unwrap();
    let app = create_router(create_test_state(dir.path()));

    for uri in [
        "/status/12345",
        "/status/12345/messages",
        "/download/12345",
        "/files/12345/1.png",
    ] {
        let (status, _, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }

    let (status, _, _) = send(&app, post_form("/status/12345/cancel", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_page_of_finished_run_shows_previews() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(dir.path());
    populate_run(&state, "42");
    let app = create_router(state);

    let (status, _, body) = send(&app, get("/status/42")).await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains(r#"src="/files/42/1.png""#));
    assert!(html.contains(r#"src="/files/42/2.png""#));
    assert!(html.contains(r#"href="/download/42""#));
}

#[tokio::test]
async fn test_download_archive() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(dir.path());
    populate_run(&state, "42");
    let app = create_router(state);

    let (status, headers, body) = send(&app, get("/download/42")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("pixiv_download_42.zip"));

    let archive = zip::ZipArchive::new(std::io::Cursor::new(body)).unwrap();
    let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, vec!["1.png", "2.png"]);
}

#[tokio::test]
async fn test_saved_file_is_served() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(dir.path());
    populate_run(&state, "42");
    let app = create_router(state);

    let (status, headers, body) = send(&app, get("/files/42/1.png")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(body, b"png-one");

    for uri in ["/files/42/notes.txt", "/files/42/..%2F..%2Ftoken.png", "/files/..%2F42/1.png"] {
        let (status, _, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_cancel_and_messages() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(dir.path());
    let run = state.runs.register(10);
    run.status.emit("Searching tag 'cat'");
    let app = create_router(state);

    let (status, _, body) = send(&app, get(&format!("/status/{}/messages", run.id))).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["running"], true);
    assert_eq!(json["messages"][0]["message"], "Searching tag 'cat'");

    let (status, headers, _) =
        send(&app, post_form(&format!("/status/{}/cancel", run.id), "")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        headers[header::LOCATION],
        format!("/status/{}", run.id).as_str()
    );
    assert!(run.cancel.is_cancelled());

    let (_, _, body) = send(&app, get(&format!("/status/{}/messages", run.id))).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["running"], false);
    assert_eq!(json["messages"][1]["message"], "Cancellation requested");
}
