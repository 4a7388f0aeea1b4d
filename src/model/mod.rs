//! Domain types shared by the crawl pipeline
//!
//! This module defines the illustration record, the pagination cursor, the crawl
//! request and the per-item download outcome.

mod cursor;
mod outcome;
mod request;

pub use cursor::SearchCursor;
pub use outcome::{DownloadOutcome, SkipReason};
pub use request::{split_tag_list, CrawlRequest};

use serde::Serialize;
use std::collections::BTreeSet;

/// A single illustration returned by a tag search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Illustration {
    /// Identifier, stable across search pages
    pub id: u64,

    pub title: String,

    /// Tag names attached to the illustration
    pub tags: BTreeSet<String>,

    /// Bookmark count, used for ranking
    pub bookmark_count: u64,

    /// Download URL: the original variant when available, otherwise the large one
    pub image_url: String,
}

impl Illustration {
    /// Returns true if any tag of this illustration is in `excluded`
    pub fn is_excluded(&self, excluded: &BTreeSet<String>) -> bool {
        !self.tags.is_disjoint(excluded)
    }

    /// File name the illustration is saved under
    pub fn file_name(&self) -> String {
        format!("{}.png", self.id)
    }
}

/// One page of search results
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub illustrations: Vec<Illustration>,

    /// Continuation for the next page. `None` means the tag is exhausted.
    pub next_cursor: Option<SearchCursor>,
}

/// Picks the image URL for an illustration: original first, then large
pub fn resolve_image_url(original: Option<&str>, large: Option<&str>) -> Option<String> {
    original
        .filter(|u| !u.is_empty())
        .or(large.filter(|u| !u.is_empty()))
        .map(str::to_string)
}
