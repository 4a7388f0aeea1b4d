//! Image downloader
//!
//! This module handles fetching the selected illustrations, including:
//! - Sending the Referer and browser User-Agent the image host requires
//! - Classifying failures into per-item skip reasons
//! - Re-encoding every image as PNG under `{id}.png`
//! - Bounded concurrency with a per-worker pause after each attempt

use crate::config::Config;
use crate::model::{DownloadOutcome, Illustration, SkipReason};
use crate::status::StatusLog;
use crate::CrawlerError;
use futures::stream::{self, StreamExt};
use image::ImageFormat;
use reqwest::header::{REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Downloads illustrations into an output directory
pub struct Downloader {
    client: Client,
    referer: String,
    user_agent: String,
    concurrency: usize,
    delay: Duration,
    status: StatusLog,
    cancel: CancellationToken,
}

impl Downloader {
    /// Creates a downloader from the `[download]` and `[crawler]` settings
    pub fn new(client: Client, config: &Config, status: StatusLog, cancel: CancellationToken) -> Self {
        Self {
            client,
            referer: config.download.referer.clone(),
            user_agent: config.download.user_agent.clone(),
            concurrency: config.crawler.download_concurrency.max(1) as usize,
            delay: Duration::from_millis(config.crawler.request_delay_ms),
            status,
            cancel,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Downloads every item, returning one outcome per item in input order
    ///
    /// Per-item failures become [`DownloadOutcome::Skipped`] and never abort the
    /// batch.
    ///
    /// # Returns
    ///
    /// * `Ok(outcomes)` - One outcome per input illustration
    /// * `Err(CrawlerError::Filesystem)` - The output directory could not be created
    pub async fn download(
        &self,
        items: Vec<Illustration>,
        output_dir: &Path,
    ) -> Result<Vec<DownloadOutcome>, CrawlerError> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| CrawlerError::Filesystem {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let total = items.len();
        tracing::info!(
            "Downloading {} images to {} ({} workers)",
            total,
            output_dir.display(),
            self.concurrency
        );

        let outcomes = stream::iter(items.into_iter().enumerate())
            .map(|(index, item)| self.download_one(index + 1, total, item, output_dir))
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(outcomes)
    }

    async fn download_one(
        &self,
        position: usize,
        total: usize,
        item: Illustration,
        output_dir: &Path,
    ) -> DownloadOutcome {
        if self.cancel.is_cancelled() {
            tracing::debug!("Skipping {} after cancellation", item.id);
            return DownloadOutcome::Skipped {
                id: item.id,
                reason: SkipReason::Cancelled,
            };
        }

        let outcome = self.fetch_and_save(&item, output_dir).await;

        match &outcome {
            DownloadOutcome::Saved { .. } => {
                tracing::debug!("Saved {} ({}/{})", item.id, position, total);
                self.status.emit(format!(
                    "Downloaded {}/{}: {} ({} bookmarks)",
                    position, total, item.id, item.bookmark_count
                ));
            }
            DownloadOutcome::Skipped { reason, .. } => {
                tracing::warn!("Skipped {}: {}", item.id, reason);
                self.status.emit(format!(
                    "Skipped {}/{}: {} ({})",
                    position, total, item.id, reason
                ));
            }
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        outcome
    }

    async fn fetch_and_save(&self, item: &Illustration, output_dir: &Path) -> DownloadOutcome {
        let skipped = |reason| DownloadOutcome::Skipped {
            id: item.id,
            reason,
        };

        let response = match self
            .client
            .get(&item.image_url)
            .header(REFERER, &self.referer)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return skipped(SkipReason::Transport(e.to_string())),
        };

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return skipped(SkipReason::Forbidden);
        }
        if !status.is_success() {
            return skipped(SkipReason::Transport(format!("HTTP {}", status.as_u16())));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return skipped(SkipReason::Transport(e.to_string())),
        };

        let path = output_dir.join(item.file_name());
        let target = path.clone();
        match tokio::task::spawn_blocking(move || save_as_png(&body, &target)).await {
            Ok(Ok(())) => DownloadOutcome::Saved { id: item.id, path },
            Ok(Err(reason)) => skipped(reason),
            Err(e) => skipped(SkipReason::Decode(e.to_string())),
        }
    }
}

/// Decodes `bytes` in any supported format and writes them to `path` as PNG
fn save_as_png(bytes: &[u8], path: &Path) -> Result<(), SkipReason> {
    let image = image::load_from_memory(bytes).map_err(|e| SkipReason::Decode(e.to_string()))?;
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| SkipReason::Write(e.to_string()))
}
