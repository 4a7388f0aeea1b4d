//! Output module for post-crawl reporting and packaging
//!
//! This module handles:
//! - Summarizing download outcomes
//! - Bundling saved images into a zip archive

pub mod archive;
pub mod summary;

pub use archive::{bundle_directory, list_png_files, write_archive};
pub use summary::{print_summary, CrawlSummary};
