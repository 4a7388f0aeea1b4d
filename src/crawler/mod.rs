//! Crawler module for the tag crawl pipeline
//!
//! This module contains the core crawling logic, including:
//! - Cursor-driven aggregation of search results
//! - Popularity ranking and truncation
//! - Bounded concurrent image downloads
//! - Overall crawl coordination

mod aggregator;
mod coordinator;
mod downloader;
mod selector;

pub use aggregator::Aggregator;
pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use downloader::Downloader;
pub use selector::select;
