//! Route handlers

use crate::auth::login_flow_from_config;
use crate::crawler::Coordinator;
use crate::model::{split_tag_list, CrawlRequest};
use crate::output::{bundle_directory, list_png_files};
use crate::search::build_http_client;
use crate::server::error::ServerError;
use crate::server::pages::{self, PREVIEW_COUNT, STATUS_TAIL};
use crate::server::state::{AppState, RunHandle};
use crate::status::StatusEntry;
use crate::CrawlerError;
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;

/// Fields of the crawl form
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CrawlForm {
    pub tags: String,
    pub exclude_tags: String,
    pub max_items: Option<String>,
    pub multiplier: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub run: String,
    pub running: bool,
    pub messages: Vec<StatusEntry>,
}

/// Accepts run ids and file stems made of ASCII letters, digits, `-` and `_`
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.len() <= 64
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_safe_png_name(name: &str) -> bool {
    name.strip_suffix(".png").map(is_safe_segment).unwrap_or(false)
}

fn checked_run(run: String) -> Result<String, ServerError> {
    if is_safe_segment(&run) {
        Ok(run)
    } else {
        Err(ServerError::RunNotFound(run))
    }
}

/// Parses an optional positive count, falling back to `default` when blank
fn parse_count(
    raw: Option<&str>,
    default: usize,
    field: &'static str,
) -> Result<usize, ServerError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(value) => match value.parse::<usize>() {
            Ok(0) => Err(ServerError::InvalidField {
                field,
                message: "must be at least 1".to_string(),
            }),
            Ok(n) => Ok(n),
            Err(e) => Err(ServerError::InvalidField {
                field,
                message: e.to_string(),
            }),
        },
    }
}

/// Client address for access logging
///
/// The first `X-Forwarded-For` hop wins, then the peer address of the connection.
fn client_addr(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// GET /
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(pages::index_page(
        &state.config.crawler.exclude_tags,
        state.config.crawler.max_items,
    ))
}

/// POST / - validate the form and start a crawl in the background
pub async fn start_crawl(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Form(form): Form<CrawlForm>,
) -> Result<Redirect, ServerError> {
    let config = &state.config;
    let max_items = parse_count(
        form.max_items.as_deref(),
        config.crawler.max_items as usize,
        "max_items",
    )?;
    let multiplier = parse_count(
        form.multiplier.as_deref(),
        config.crawler.pool_multiplier as usize,
        "multiplier",
    )?;

    let request = CrawlRequest::new(
        split_tag_list(&form.tags),
        split_tag_list(&form.exclude_tags),
        max_items,
        multiplier,
    )?;

    tracing::info!(
        client = %client_addr(&headers, peer.map(|ConnectInfo(addr)| addr)),
        tags = ?request.tags,
        "Crawl requested"
    );

    let login_http = build_http_client(
        &config.download.user_agent,
        config.crawler.request_timeout_secs,
    )
    .map_err(CrawlerError::from)?;
    let login = login_flow_from_config(config, login_http, form.username, form.password);

    let run = state.runs.register(config.server.status_capacity);
    let output_dir = state.run_dir(&run.id);

    let task = Coordinator::new((**config).clone(), run.status.clone())
        .with_login(login)
        .with_cancellation(run.cancel.clone())
        .spawn(request, output_dir);
    run.watch(task);

    Ok(Redirect::to(&format!("/status/{}", run.id)))
}

/// GET /status/:run
pub async fn status_page(
    State(state): State<AppState>,
    Path(run): Path<String>,
) -> Result<Html<String>, ServerError> {
    let run = checked_run(run)?;
    let handle = state.runs.get(&run);
    let dir = state.run_dir(&run);

    if handle.is_none() && !dir.is_dir() {
        return Err(ServerError::RunNotFound(run));
    }

    let entries = handle
        .as_ref()
        .map(|h| h.status.tail(STATUS_TAIL))
        .unwrap_or_default();

    let files = if dir.is_dir() {
        list_png_files(&dir)?
    } else {
        Vec::new()
    };
    let previews: Vec<String> = files
        .iter()
        .take(PREVIEW_COUNT)
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect();
    let running = handle.as_ref().map(RunHandle::is_running).unwrap_or(false);

    Ok(Html(pages::status_page(
        &run,
        &entries,
        &previews,
        !files.is_empty(),
        running,
    )))
}

/// GET /status/:run/messages
pub async fn status_messages(
    State(state): State<AppState>,
    Path(run): Path<String>,
) -> Result<Json<MessagesResponse>, ServerError> {
    let run = checked_run(run)?;
    let handle = state
        .runs
        .get(&run)
        .ok_or_else(|| ServerError::RunNotFound(run.clone()))?;

    Ok(Json(MessagesResponse {
        running: handle.is_running(),
        messages: handle.status.snapshot(),
        run,
    }))
}

/// POST /status/:run/cancel
pub async fn cancel_run(
    State(state): State<AppState>,
    Path(run): Path<String>,
) -> Result<Redirect, ServerError> {
    let run = checked_run(run)?;
    let handle = state
        .runs
        .get(&run)
        .ok_or_else(|| ServerError::RunNotFound(run.clone()))?;

    if !handle.cancel.is_cancelled() {
        handle.cancel.cancel();
        handle.status.emit("Cancellation requested");
    }

    Ok(Redirect::to(&format!("/status/{}", run)))
}

/// GET /files/:run/:name
pub async fn saved_file(
    State(state): State<AppState>,
    Path((run, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServerError> {
    let run = checked_run(run)?;
    if !is_safe_png_name(&name) {
        return Err(ServerError::FileNotFound(name));
    }

    let path = state.run_dir(&run).join(&name);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ServerError::FileNotFound(name))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}

/// GET /download/:run - zip of the run's PNG files
pub async fn download_archive(
    State(state): State<AppState>,
    Path(run): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let run = checked_run(run)?;
    let dir = state.run_dir(&run);
    if !dir.is_dir() {
        return Err(ServerError::RunNotFound(run));
    }

    let archive = tokio::task::spawn_blocking(move || bundle_directory(&dir)).await??;
    let disposition = format!("attachment; filename=\"pixiv_download_{}.zip\"", run);

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive,
    ))
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
