//! Tag search
//!
//! [`SearchSource`] is the seam between the aggregator and the network: one call is
//! one page. [`PixivClient`] is the production implementation.

mod client;
mod models;

pub use client::{build_http_client, PixivClient};

use crate::model::{SearchCursor, SearchPage};
use crate::SearchError;
use async_trait::async_trait;

/// A paginated tag search
///
/// `cursor == None` requests the first page. An empty page is returned as
/// `Ok` with no illustrations, not as an error.
#[async_trait]
pub trait SearchSource: Send + Sync {
    async fn search(
        &self,
        tag: &str,
        cursor: Option<&SearchCursor>,
    ) -> Result<SearchPage, SearchError>;
}
