//! Crawler coordinator - one crawl from credential to saved files
//!
//! This module wires the pipeline stages together:
//! - Obtaining the credential from the token cache or login flow
//! - Authenticating the search client
//! - Aggregating and ranking candidates
//! - Downloading the selection
//!
//! Every stage boundary and every fatal error is reported to the run's
//! [`StatusLog`].

use crate::auth::{LoginFlow, NoLogin, TokenCache};
use crate::config::Config;
use crate::crawler::aggregator::Aggregator;
use crate::crawler::downloader::Downloader;
use crate::crawler::selector::select;
use crate::model::{CrawlRequest, DownloadOutcome};
use crate::output::CrawlSummary;
use crate::search::{build_http_client, PixivClient};
use crate::status::StatusLog;
use crate::CrawlerError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub output_dir: PathBuf,
    pub outcomes: Vec<DownloadOutcome>,
    pub summary: CrawlSummary,
    pub cancelled: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    login: Box<dyn LoginFlow>,
    status: StatusLog,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator that can only use an already cached token
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `status` - Log receiving the run's progress messages
    pub fn new(config: Config, status: StatusLog) -> Self {
        Self {
            config: Arc::new(config),
            login: Box::new(NoLogin),
            status,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the flow run when the token cache is empty
    pub fn with_login(mut self, login: Box<dyn LoginFlow>) -> Self {
        self.login = login;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn status(&self) -> &StatusLog {
        &self.status
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the whole pipeline for `request`, saving into `output_dir`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl finished; individual downloads may still
    ///   have been skipped
    /// * `Err(CrawlerError)` - Authentication, client setup or output directory
    ///   creation failed
    pub async fn run(
        &self,
        request: &CrawlRequest,
        output_dir: &Path,
    ) -> Result<CrawlReport, CrawlerError> {
        let result = self.execute(request, output_dir).await;

        if let Err(e) = &result {
            tracing::error!("Crawl failed: {}", e);
            self.status.emit(format!("Crawl failed: {}", e));
        }

        result
    }

    /// Runs the crawl on a background task
    ///
    /// Progress is observable through the [`StatusLog`] handed to
    /// [`Coordinator::new`].
    pub fn spawn(
        self,
        request: CrawlRequest,
        output_dir: PathBuf,
    ) -> JoinHandle<Result<CrawlReport, CrawlerError>> {
        tokio::spawn(async move { self.run(&request, &output_dir).await })
    }

    async fn execute(
        &self,
        request: &CrawlRequest,
        output_dir: &Path,
    ) -> Result<CrawlReport, CrawlerError> {
        let config = &self.config;
        tracing::info!(
            "Starting crawl for {:?} (max {}, pool target {})",
            request.tags,
            request.max_items,
            request.target_pool_size()
        );
        self.status.emit(format!(
            "Starting crawl for {} (max {} images)",
            request.tags.join(", "),
            request.max_items
        ));

        let cache = TokenCache::new(&config.auth.token_path);
        let token = cache.get_token(self.login.as_ref()).await?;

        let api_http = build_http_client(
            &config.api.app_user_agent,
            config.crawler.request_timeout_secs,
        )?;
        let mut client = PixivClient::new(api_http, config.api.clone());
        client.authenticate(&token).await?;
        self.status.emit("Authenticated");

        let pool = Aggregator::new(&client, self.status.clone(), self.cancel.clone())
            .with_search_delay(Duration::from_millis(config.crawler.search_delay_ms))
            .aggregate(request)
            .await;
        let candidates = pool.len();
        self.status
            .emit(format!("Collected {} candidate illustrations", candidates));

        let selected = select(pool, request.max_items);
        self.status.emit(format!(
            "Selected the {} most bookmarked illustrations",
            selected.len()
        ));

        let download_http = build_http_client(
            &config.download.user_agent,
            config.crawler.request_timeout_secs,
        )?;
        let outcomes = Downloader::new(
            download_http,
            config,
            self.status.clone(),
            self.cancel.clone(),
        )
        .download(selected, output_dir)
        .await?;

        let summary = CrawlSummary::from_outcomes(candidates, &outcomes);
        let cancelled = self.cancel.is_cancelled();

        tracing::info!(
            "Crawl finished: {} saved, {} skipped",
            summary.saved,
            summary.skipped_total()
        );
        if cancelled {
            self.status.emit(format!(
                "Crawl cancelled: {} saved, {} skipped",
                summary.saved,
                summary.skipped_total()
            ));
        } else {
            self.status.emit(format!(
                "Finished: {} saved, {} skipped",
                summary.saved,
                summary.skipped_total()
            ));
        }

        Ok(CrawlReport {
            output_dir: output_dir.to_path_buf(),
            outcomes,
            summary,
            cancelled,
        })
    }
}

/// Runs one crawl to completion with a cached token
///
/// # Example
///
/// ```no_run
/// use pixiv_crawler::config::Config;
/// use pixiv_crawler::crawler::run_crawl;
/// use pixiv_crawler::CrawlRequest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let request = CrawlRequest::new(["風景"], ["AI"], 30, 2)?;
/// let report = run_crawl(Config::default(), &request, Path::new("風景_imgs")).await?;
/// println!("{} saved", report.summary.saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    request: &CrawlRequest,
    output_dir: &Path,
) -> Result<CrawlReport, CrawlerError> {
    Coordinator::new(config, StatusLog::default())
        .run(request, output_dir)
        .await
}
