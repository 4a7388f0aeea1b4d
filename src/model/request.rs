//! Crawl request parameters and tag list parsing

use crate::CrawlerError;
use std::collections::BTreeSet;

/// Parameters of a single crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Search tags, processed in order
    pub tags: Vec<String>,

    /// Illustrations carrying any of these tags are dropped
    pub exclude_tags: BTreeSet<String>,

    /// Upper bound on the number of downloaded illustrations
    pub max_items: usize,

    /// Pool amplification factor applied before ranking
    pub pool_multiplier: usize,
}

impl CrawlRequest {
    /// Builds a request, trimming tags and dropping empty ones
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlRequest)` - At least one tag and positive sizes
    /// * `Err(CrawlerError::InvalidRequest)` - Otherwise
    pub fn new<T, E>(
        tags: T,
        exclude_tags: E,
        max_items: usize,
        pool_multiplier: usize,
    ) -> Result<Self, CrawlerError>
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let tags: Vec<String> = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();

        let exclude_tags = exclude_tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if tags.is_empty() {
            return Err(CrawlerError::InvalidRequest(
                "at least one search tag is required".to_string(),
            ));
        }

        if max_items == 0 {
            return Err(CrawlerError::InvalidRequest(
                "max_items must be at least 1".to_string(),
            ));
        }

        if pool_multiplier == 0 {
            return Err(CrawlerError::InvalidRequest(
                "pool_multiplier must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            tags,
            exclude_tags,
            max_items,
            pool_multiplier,
        })
    }

    /// Number of candidates the aggregator collects before stopping
    pub fn target_pool_size(&self) -> usize {
        self.max_items.saturating_mul(self.pool_multiplier)
    }
}

/// Splits a comma-separated list, trimming entries and dropping empty ones
pub fn split_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
