//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the OAuth endpoint, the search API
//! and the image host, and run the pipeline end-to-end.

use image::{DynamicImage, ImageFormat, ImageOutputFormat, Rgb, RgbImage};
use pixiv_crawler::auth::{PasswordLogin, TokenCache};
use pixiv_crawler::config::Config;
use pixiv_crawler::crawler::{Coordinator, Downloader};
use pixiv_crawler::search::{PixivClient, SearchSource};
use pixiv_crawler::{
    AuthError, CrawlRequest, CrawlerError, DownloadOutcome, Illustration, SearchError,
    SkipReason, StatusLog,
};
use serde_json::json;
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing every endpoint at the mock server
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.api.oauth_url = Some(format!("{}/auth/token", base_url));
    config.auth.token_path = dir.join("token.txt").to_string_lossy().into_owned();
    config.crawler.request_delay_ms = 0;
    config.crawler.request_timeout_secs = 5;
    config
}

fn encoded_image(format: ImageOutputFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([10, 120, 240])));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format).expect("Failed to encode image");
    bytes.into_inner()
}

fn illust_json(base_url: &str, id: u64, bookmarks: u64, tags: &[&str], image: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("illust {}", id),
        "tags": tags.iter().map(|t| json!({"name": t})).collect::<Vec<_>>(),
        "total_bookmarks": bookmarks,
        "image_urls": {"large": format!("{}/large/{}", base_url, id)},
        "meta_single_page": {"original_image_url": format!("{}{}", base_url, image)},
    })
}

fn illustration(base_url: &str, id: u64, image: &str) -> Illustration {
    Illustration {
        id,
        title: String::new(),
        tags: Default::default(),
        bookmark_count: 0,
        image_url: format!("{}{}", base_url, image),
    }
}

fn downloader(config: &Config) -> Downloader {
    Downloader::new(
        reqwest::Client::new(),
        config,
        StatusLog::default(),
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn test_full_crawl_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().expect("Failed to create temp dir");

    std::fs::write(dir.path().join("token.txt"), "refresh-123\n").unwrap();

    // OAuth exchange
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-abc",
            "refresh_token": "refresh-123",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Second page, selected by the cursor's offset
    Mock::given(method("GET"))
        .and(path("/v1/search/illust"))
        .and(query_param("offset", "30"))
        .and(header("authorization", "Bearer access-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "illusts": [
                illust_json(&base_url, 5, 100, &["cat"], "/img/5.jpg"),
                illust_json(&base_url, 6, 5, &["cat"], "/img/6.png"),
                illust_json(&base_url, 1, 50, &["cat"], "/img/1.png"),
            ],
            "next_url": null,
        })))
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    // First page
    Mock::given(method("GET"))
        .and(path("/v1/search/illust"))
        .and(query_param("word", "cat"))
        .and(query_param("search_target", "partial_match_for_tags"))
        .and(query_param("sort", "date_desc"))
        .and(header("authorization", "Bearer access-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "illusts": [
                illust_json(&base_url, 1, 50, &["cat"], "/img/1.png"),
                illust_json(&base_url, 2, 80, &["cat"], "/img/2.png"),
                illust_json(&base_url, 3, 999, &["cat", "AI"], "/img/3.png"),
                illust_json(&base_url, 4, 30, &["cat"], "/img/4.png"),
            ],
            "next_url": format!("{}/v1/search/illust?word=cat&search_target=partial_match_for_tags&sort=date_desc&offset=30", base_url),
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/5.jpg"))
        .and(header("referer", "https://www.pixiv.net"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(encoded_image(ImageOutputFormat::Jpeg(90))),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/2.png"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/1.png"))
        .and(header("referer", "https://www.pixiv.net"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(encoded_image(ImageOutputFormat::Png)),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, dir.path());
    let status = StatusLog::default();
    let request = CrawlRequest::new(["cat"], ["AI"], 3, 2).unwrap();
    let output_dir = dir.path().join("cat_imgs");

    let report = Coordinator::new(config, status.clone())
        .run(&request, &output_dir)
        .await
        .expect("Crawl failed");

    // Pool is 1, 2, 4, 5, 6 (3 excluded, duplicate 1 dropped); top 3 by bookmarks
    assert_eq!(report.summary.candidates, 5);
    assert_eq!(
        report.outcomes.iter().map(|o| o.id()).collect::<Vec<_>>(),
        vec![5, 2, 1]
    );
    assert!(report.outcomes[0].is_saved());
    assert_eq!(report.outcomes[1].skip_reason(), Some(&SkipReason::Forbidden));
    assert!(report.outcomes[2].is_saved());
    assert_eq!(report.summary.saved, 2);
    assert!(!report.cancelled);

    for id in [5, 1] {
        let bytes = std::fs::read(output_dir.join(format!("{}.png", id))).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }
    assert!(!output_dir.join("2.png").exists());

    let messages: Vec<String> = status.snapshot().into_iter().map(|e| e.message).collect();
    assert!(messages.iter().any(|m| m.starts_with("Starting crawl for cat")));
    assert!(messages.iter().any(|m| m.contains("403 Forbidden")));
    assert!(messages.iter().any(|m| m.starts_with("Finished: 2 saved, 1 skipped")));
}

#[tokio::test]
async fn test_forbidden_item_does_not_affect_others() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/a.png"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;
    for name in ["/b.png", "/c.png"] {
        Mock::given(method("GET"))
            .and(path(name))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(encoded_image(ImageOutputFormat::Png)),
            )
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&base_url, dir.path());
    let items = vec![
        illustration(&base_url, 1, "/a.png"),
        illustration(&base_url, 2, "/b.png"),
        illustration(&base_url, 3, "/c.png"),
    ];

    let outcomes = downloader(&config)
        .with_concurrency(2)
        .download(items, dir.path())
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            DownloadOutcome::Skipped {
                id: 1,
                reason: SkipReason::Forbidden
            },
            DownloadOutcome::Saved {
                id: 2,
                path: dir.path().join("2.png")
            },
            DownloadOutcome::Saved {
                id: 3,
                path: dir.path().join("3.png")
            },
        ]
    );
}

#[tokio::test]
async fn test_decode_and_status_failures_are_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/garbage.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, dir.path());
    let items = vec![
        illustration(&base_url, 1, "/garbage.png"),
        illustration(&base_url, 2, "/missing.png"),
        illustration("http://127.0.0.1:1", 3, "/unreachable.png"),
    ];

    let outcomes = downloader(&config).download(items, dir.path()).await.unwrap();

    assert!(matches!(
        outcomes[0].skip_reason(),
        Some(SkipReason::Decode(_))
    ));
    assert_eq!(
        outcomes[1].skip_reason(),
        Some(&SkipReason::Transport("HTTP 404".to_string()))
    );
    assert!(matches!(
        outcomes[2].skip_reason(),
        Some(SkipReason::Transport(_))
    ));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_search_errors_are_classified() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/search/illust"))
        .and(query_param("word", "broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search/illust"))
        .and(query_param("word", "down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search/illust"))
        .and(query_param("word", "empty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"illusts": [], "next_url": null})))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, dir.path());
    let client = PixivClient::new(reqwest::Client::new(), config.api.clone());

    assert!(matches!(
        client.search("broken", None).await,
        Err(SearchError::Decode(_))
    ));
    assert!(matches!(
        client.search("down", None).await,
        Err(SearchError::Status { status: 503 })
    ));

    let page = client.search("empty", None).await.unwrap();
    assert!(page.illustrations.is_empty());
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn test_rejected_token_is_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("token.txt"), "stale").unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search/illust"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let status = StatusLog::default();
    let request = CrawlRequest::new(["cat"], Vec::<String>::new(), 5, 2).unwrap();
    let output_dir = dir.path().join("out");

    let result = Coordinator::new(create_test_config(&base_url, dir.path()), status.clone())
        .run(&request, &output_dir)
        .await;

    assert!(matches!(
        result,
        Err(CrawlerError::Auth(AuthError::TokenRejected { status: 400 }))
    ));
    assert!(!output_dir.exists());
    assert!(status
        .snapshot()
        .iter()
        .any(|e| e.message.starts_with("Crawl failed")));
}

#[tokio::test]
async fn test_password_login_populates_cache() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("username=alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"refresh_token": "fresh"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let flow = PasswordLogin::new(
        reqwest::Client::new(),
        format!("{}/login", base_url),
        Some("alice".to_string()),
        Some("secret".to_string()),
    );
    let cache = TokenCache::new(dir.path().join("token.txt"));

    assert_eq!(cache.get_token(&flow).await.unwrap(), "fresh");
    assert_eq!(cache.get_token(&flow).await.unwrap(), "fresh");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("token.txt")).unwrap(),
        "fresh"
    );
}
