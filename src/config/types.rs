use serde::Deserialize;

/// Tags excluded from every crawl unless the caller opts out
pub const DEFAULT_EXCLUDE_TAGS: &[&str] = &[
    "R-18",
    "AI",
    "ai_generated",
    "AI 그림",
    "aiart",
    "ai_art",
    "人工知能",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Crawl pipeline tuning
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Pool amplification factor: the aggregator collects `max_items * pool_multiplier`
    /// candidates before ranking
    #[serde(rename = "pool-multiplier", default = "default_pool_multiplier")]
    pub pool_multiplier: u32,

    /// Number of illustrations downloaded when the caller does not say
    #[serde(rename = "max-items", default = "default_max_items")]
    pub max_items: u32,

    /// Maximum number of simultaneous downloads
    #[serde(
        rename = "download-concurrency",
        default = "default_download_concurrency"
    )]
    pub download_concurrency: u32,

    /// Pause after every download attempt, per worker (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Pause between two search page requests (milliseconds)
    #[serde(rename = "search-delay-ms", default)]
    pub search_delay_ms: u64,

    /// Timeout applied to every HTTP request (seconds)
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,

    /// Tags that drop an illustration from the pool
    #[serde(rename = "exclude-tags", default = "default_exclude_tags")]
    pub exclude_tags: Vec<String>,
}

/// Search API endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the app API
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// OAuth token endpoint used to exchange the cached refresh token for an access
    /// token. When unset, the cached token is sent as the bearer token directly.
    #[serde(rename = "oauth-url", default = "default_oauth_url")]
    pub oauth_url: Option<String>,

    #[serde(rename = "client-id", default = "default_client_id")]
    pub client_id: String,

    #[serde(rename = "client-secret", default = "default_client_secret")]
    pub client_secret: String,

    /// Tag matching mode sent as `search_target`
    #[serde(rename = "search-target", default = "default_search_target")]
    pub search_target: String,

    /// Result ordering sent as `sort`
    #[serde(default = "default_sort")]
    pub sort: String,

    /// Value of the `filter` parameter
    #[serde(default = "default_filter")]
    pub filter: String,

    /// User agent presented by the app API client
    #[serde(rename = "app-user-agent", default = "default_app_user_agent")]
    pub app_user_agent: String,

    #[serde(rename = "app-os", default = "default_app_os")]
    pub app_os: String,

    #[serde(rename = "app-os-version", default = "default_app_os_version")]
    pub app_os_version: String,
}

/// Credential cache and login endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// File holding the cached refresh token
    #[serde(rename = "token-path", default = "default_token_path")]
    pub token_path: String,

    /// Endpoint of the external login flow, invoked only when the cache is empty
    #[serde(rename = "login-url", default)]
    pub login_url: Option<String>,
}

/// Image download configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    /// Referer header required by the image host
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Browser user agent sent to the image host
    #[serde(rename = "user-agent", default = "default_download_user_agent")]
    pub user_agent: String,
}

/// HTTP service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the service listens on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Directory holding one sub-directory per crawl run
    #[serde(rename = "download-root", default = "default_download_root")]
    pub download_root: String,

    /// Number of status messages retained per run
    #[serde(rename = "status-capacity", default = "default_status_capacity")]
    pub status_capacity: usize,

    /// Finished runs kept in memory; older ones are only served from disk
    #[serde(rename = "retained-runs", default = "default_retained_runs")]
    pub retained_runs: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            pool_multiplier: default_pool_multiplier(),
            max_items: default_max_items(),
            download_concurrency: default_download_concurrency(),
            request_delay_ms: default_request_delay_ms(),
            search_delay_ms: 0,
            request_timeout_secs: default_request_timeout_secs(),
            exclude_tags: default_exclude_tags(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            oauth_url: default_oauth_url(),
            client_id: default_client_id(),
            client_secret: default_client_secret(),
            search_target: default_search_target(),
            sort: default_sort(),
            filter: default_filter(),
            app_user_agent: default_app_user_agent(),
            app_os: default_app_os(),
            app_os_version: default_app_os_version(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_path: default_token_path(),
            login_url: None,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            referer: default_referer(),
            user_agent: default_download_user_agent(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            download_root: default_download_root(),
            status_capacity: default_status_capacity(),
            retained_runs: default_retained_runs(),
        }
    }
}

fn default_pool_multiplier() -> u32 {
    2
}

fn default_max_items() -> u32 {
    30
}

fn default_download_concurrency() -> u32 {
    4
}

fn default_request_delay_ms() -> u64 {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_exclude_tags() -> Vec<String> {
    DEFAULT_EXCLUDE_TAGS.iter().map(|t| t.to_string()).collect()
}

fn default_base_url() -> String {
    "https://app-api.pixiv.net".to_string()
}

fn default_oauth_url() -> Option<String> {
    Some("https://oauth.secure.pixiv.net/auth/token".to_string())
}

fn default_client_id() -> String {
    "MOBrBDS8blbauoSck0ZfDbtuzpyT".to_string()
}

fn default_client_secret() -> String {
    "lsACyCD94FhDUtGTXi3QzcFE2uU1hqtDaKeqrdwj".to_string()
}

fn default_search_target() -> String {
    "partial_match_for_tags".to_string()
}

fn default_sort() -> String {
    "date_desc".to_string()
}

fn default_filter() -> String {
    "for_ios".to_string()
}

fn default_app_user_agent() -> String {
    "PixivIOSApp/7.13.3 (iOS 14.6; iPhone13,2)".to_string()
}

fn default_app_os() -> String {
    "ios".to_string()
}

fn default_app_os_version() -> String {
    "14.6".to_string()
}

fn default_token_path() -> String {
    "token.txt".to_string()
}

fn default_referer() -> String {
    "https://www.pixiv.net".to_string()
}

fn default_download_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36"
        .to_string()
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_download_root() -> String {
    "static/downloads".to_string()
}

fn default_status_capacity() -> usize {
    50
}

fn default_retained_runs() -> usize {
    32
}
