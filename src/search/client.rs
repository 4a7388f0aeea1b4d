//! pixiv app API client
//!
//! This module handles the HTTP side of searching:
//! - Building HTTP clients with the configured user agent and timeout
//! - Exchanging the cached refresh token for a bearer access token
//! - Issuing one search page request per call

use crate::config::ApiConfig;
use crate::model::{SearchCursor, SearchPage};
use crate::search::models::{SearchResponse, TokenResponse};
use crate::search::SearchSource;
use crate::{AuthError, AuthResult, SearchError};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

const SEARCH_PATH: &str = "/v1/search/illust";

/// Builds an HTTP client with the given user agent and request timeout
///
/// # Example
///
/// ```no_run
/// use pixiv_crawler::search::build_http_client;
///
/// let client = build_http_client("PixivIOSApp/7.13.3", 30).unwrap();
/// ```
pub fn build_http_client(user_agent: &str, timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Search client for the pixiv app API
#[derive(Debug, Clone)]
pub struct PixivClient {
    http: Client,
    api: ApiConfig,
    access_token: Option<String>,
}

impl PixivClient {
    pub fn new(http: Client, api: ApiConfig) -> Self {
        Self {
            http,
            api,
            access_token: None,
        }
    }

    /// Establishes the bearer token used for searches
    ///
    /// With an OAuth endpoint configured, `refresh_token` is exchanged for an
    /// access token. Without one, `refresh_token` itself is used as the bearer.
    pub async fn authenticate(&mut self, refresh_token: &str) -> AuthResult<()> {
        let Some(oauth_url) = self.api.oauth_url.as_deref().filter(|u| !u.is_empty()) else {
            tracing::debug!("No OAuth endpoint configured, using cached token as bearer");
            self.access_token = Some(refresh_token.to_string());
            return Ok(());
        };

        tracing::debug!("Exchanging refresh token at {}", oauth_url);

        let response = self
            .http
            .post(oauth_url)
            .form(&[
                ("client_id", self.api.client_id.as_str()),
                ("client_secret", self.api.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("include_policy", "true"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::TokenRejected {
                status: status.as_u16(),
            });
        }

        let token: TokenResponse = response.json().await?;
        let access_token = token.access_token().ok_or_else(|| {
            AuthError::LoginFailed("token endpoint returned no access token".to_string())
        })?;

        self.access_token = Some(access_token);
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Query parameters for a page: the first-page query with the cursor overlaid
    pub fn search_params(&self, tag: &str, cursor: Option<&SearchCursor>) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("word".to_string(), tag.to_string());
        params.insert("search_target".to_string(), self.api.search_target.clone());
        params.insert("sort".to_string(), self.api.sort.clone());
        if !self.api.filter.is_empty() {
            params.insert("filter".to_string(), self.api.filter.clone());
        }

        if let Some(cursor) = cursor {
            cursor.merge_into(&mut params);
        }

        params
    }

    fn search_url(&self) -> Result<Url, SearchError> {
        let base = Url::parse(&self.api.base_url)?;
        Ok(base.join(SEARCH_PATH)?)
    }
}

#[async_trait]
impl SearchSource for PixivClient {
    async fn search(
        &self,
        tag: &str,
        cursor: Option<&SearchCursor>,
    ) -> Result<SearchPage, SearchError> {
        let url = self.search_url()?;
        let params = self.search_params(tag, cursor);

        tracing::debug!("Searching {} with {:?}", url, params);

        let mut request = self
            .http
            .get(url)
            .query(&params)
            .header("App-OS", &self.api.app_os)
            .header("App-OS-Version", &self.api.app_os_version);

        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(parsed.into_page())
    }
}
