use crate::model::{resolve_image_url, Illustration, SearchCursor, SearchPage};
use serde::Deserialize;

/// Body of `GET /v1/search/illust`
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub illusts: Vec<IllustRecord>,
    #[serde(default)]
    pub next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IllustRecord {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<TagRecord>,
    #[serde(default)]
    pub total_bookmarks: u64,
    #[serde(default)]
    pub image_urls: ImageUrls,
    /// Empty object for multi-page works
    #[serde(default)]
    pub meta_single_page: MetaSinglePage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagRecord {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ImageUrls {
    #[serde(default)]
    pub large: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MetaSinglePage {
    #[serde(default)]
    pub original_image_url: Option<String>,
}

impl IllustRecord {
    /// Converts to the domain type; `None` when no image URL is available
    fn into_illustration(self) -> Option<Illustration> {
        let Some(image_url) = resolve_image_url(
            self.meta_single_page.original_image_url.as_deref(),
            self.image_urls.large.as_deref(),
        ) else {
            tracing::debug!("Illustration {} has no downloadable image, dropping", self.id);
            return None;
        };

        Some(Illustration {
            id: self.id,
            title: self.title,
            tags: self.tags.into_iter().map(|t| t.name).collect(),
            bookmark_count: self.total_bookmarks,
            image_url,
        })
    }
}

impl SearchResponse {
    pub fn into_page(self) -> SearchPage {
        let next_cursor = self
            .next_url
            .as_deref()
            .and_then(SearchCursor::from_next_url);

        SearchPage {
            illustrations: self
                .illusts
                .into_iter()
                .filter_map(IllustRecord::into_illustration)
                .collect(),
            next_cursor,
        }
    }
}

/// Body of the OAuth token endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    /// Older endpoints wrap the token in a `response` object
    #[serde(default)]
    pub response: Option<TokenInner>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenInner {
    #[serde(default)]
    pub access_token: Option<String>,
}

impl TokenResponse {
    pub fn access_token(self) -> Option<String> {
        self.access_token
            .or_else(|| self.response.and_then(|r| r.access_token))
            .filter(|t| !t.is_empty())
    }
}
