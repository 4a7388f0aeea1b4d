//! Candidate pool aggregation
//!
//! Drives a [`SearchSource`] across the requested tags, page by page, until the
//! pool reaches `max_items * pool_multiplier` unique, non-excluded illustrations
//! or every tag runs out of pages.

use crate::model::{CrawlRequest, Illustration, SearchCursor};
use crate::search::SearchSource;
use crate::status::StatusLog;
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pagination driver for one crawl
pub struct Aggregator<'a, S: SearchSource + ?Sized> {
    source: &'a S,
    status: StatusLog,
    cancel: CancellationToken,
    search_delay: Duration,
}

/// Working state shared across the tags of one run
struct Pool {
    items: Vec<Illustration>,
    seen: HashSet<u64>,
    target: usize,
}

impl Pool {
    fn is_full(&self) -> bool {
        self.items.len() >= self.target
    }
}

#[derive(Debug, Default)]
struct PageCounts {
    added: usize,
    excluded: usize,
    duplicate: usize,
}

impl<'a, S: SearchSource + ?Sized> Aggregator<'a, S> {
    pub fn new(source: &'a S, status: StatusLog, cancel: CancellationToken) -> Self {
        Self {
            source,
            status,
            cancel,
            search_delay: Duration::ZERO,
        }
    }

    /// Sets the pause between two consecutive page requests
    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = delay;
        self
    }

    /// Collects the candidate pool for `request`
    ///
    /// Tags are searched in order. Ids are unique across the whole pool and
    /// insertion order is kept. A failing search abandons the current tag only.
    ///
    /// # Returns
    ///
    /// The pool, possibly smaller than the target when pagination runs out
    pub async fn aggregate(&self, request: &CrawlRequest) -> Vec<Illustration> {
        let mut pool = Pool {
            items: Vec::new(),
            seen: HashSet::new(),
            target: request.target_pool_size(),
        };

        for tag in &request.tags {
            if pool.is_full() {
                break;
            }
            if self.cancel.is_cancelled() {
                tracing::info!("Aggregation cancelled before tag '{}'", tag);
                break;
            }

            self.status.emit(format!("Searching tag '{}'", tag));
            self.collect_tag(tag, request, &mut pool).await;
        }

        tracing::info!(
            "Aggregated {} candidates (target {})",
            pool.items.len(),
            pool.target
        );

        pool.items
    }

    async fn collect_tag(&self, tag: &str, request: &CrawlRequest, pool: &mut Pool) {
        let mut cursor: Option<SearchCursor> = None;
        let mut visited: HashSet<SearchCursor> = HashSet::new();
        let mut page_number = 0usize;

        loop {
            if page_number > 0 && !self.pause_between_pages().await {
                return;
            }
            if self.cancel.is_cancelled() {
                return;
            }

            let page = match self.source.search(tag, cursor.as_ref()).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Search for '{}' failed: {}", tag, e);
                    self.status
                        .emit(format!("Search for '{}' failed, skipping tag: {}", tag, e));
                    return;
                }
            };
            page_number += 1;

            if page.illustrations.is_empty() {
                tracing::debug!("Tag '{}' page {} is empty", tag, page_number);
                return;
            }

            let mut counts = PageCounts::default();
            for illustration in page.illustrations {
                if pool.seen.contains(&illustration.id) {
                    counts.duplicate += 1;
                } else if illustration.is_excluded(&request.exclude_tags) {
                    counts.excluded += 1;
                } else {
                    pool.seen.insert(illustration.id);
                    pool.items.push(illustration);
                    counts.added += 1;
                }
            }

            tracing::debug!(
                "Tag '{}' page {}: {} added, {} excluded, {} duplicate",
                tag,
                page_number,
                counts.added,
                counts.excluded,
                counts.duplicate
            );
            self.status.emit(format!(
                "Tag '{}' page {}: {} new, {} excluded ({}/{} collected)",
                tag,
                page_number,
                counts.added,
                counts.excluded,
                pool.items.len(),
                pool.target
            ));

            if pool.is_full() {
                return;
            }

            match page.next_cursor {
                Some(next) if !visited.insert(next.clone()) => {
                    tracing::warn!("Tag '{}' returned a repeated cursor, stopping", tag);
                    return;
                }
                Some(next) => cursor = Some(next),
                None => return,
            }
        }
    }

    /// Sleeps for the configured search delay; `false` when cancelled meanwhile
    async fn pause_between_pages(&self) -> bool {
        if self.search_delay.is_zero() {
            return !self.cancel.is_cancelled();
        }

        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(self.search_delay) => true,
        }
    }
}
