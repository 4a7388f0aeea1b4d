//! Credential acquisition
//!
//! The crawler needs one opaque refresh token. It is read from the
//! [`TokenCache`] when present; otherwise a [`LoginFlow`] obtains it once and the
//! cache keeps it for later runs.

mod cache;

pub use cache::TokenCache;

use crate::config::Config;
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// External login flow producing a refresh token
#[async_trait]
pub trait LoginFlow: Send + Sync {
    async fn login(&self) -> AuthResult<String>;
}

/// Placeholder flow for setups without a login endpoint
///
/// Crawls still work as long as the token cache is populated.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLogin;

#[async_trait]
impl LoginFlow for NoLogin {
    async fn login(&self) -> AuthResult<String> {
        Err(AuthError::NoLoginFlow)
    }
}

/// Username/password login against an HTTP endpoint
///
/// Posts the credentials as a form and expects `{"refresh_token": "..."}` back.
#[derive(Debug, Clone)]
pub struct PasswordLogin {
    client: Client,
    login_url: String,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    refresh_token: Option<String>,
}

impl PasswordLogin {
    pub fn new(
        client: Client,
        login_url: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            client,
            login_url: login_url.into(),
            username,
            password,
        }
    }
}

#[async_trait]
impl LoginFlow for PasswordLogin {
    async fn login(&self) -> AuthResult<String> {
        let (Some(username), Some(password)) = (
            self.username.as_deref().filter(|u| !u.is_empty()),
            self.password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::MissingCredentials);
        };

        tracing::debug!("Logging in as {} via {}", username, self.login_url);

        let response = self
            .client
            .post(&self.login_url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::LoginFailed(format!(
                "login endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::LoginFailed(format!("unreadable login response: {}", e)))?;

        body.refresh_token.ok_or(AuthError::EmptyToken)
    }
}

/// Picks the login flow for the current configuration
///
/// With `auth.login-url` set, a [`PasswordLogin`] with the given credentials;
/// otherwise [`NoLogin`].
pub fn login_flow_from_config(
    config: &Config,
    client: Client,
    username: Option<String>,
    password: Option<String>,
) -> Box<dyn LoginFlow> {
    match &config.auth.login_url {
        Some(url) => Box::new(PasswordLogin::new(client, url.clone(), username, password)),
        None => {
            if has_credentials(username.as_deref(), password.as_deref()) {
                tracing::warn!(
                    "Credentials were supplied but auth.login-url is not set; \
                     only a cached token can be used"
                );
            }
            Box::new(NoLogin)
        }
    }
}

fn has_credentials(username: Option<&str>, password: Option<&str>) -> bool {
    [username, password]
        .iter()
        .any(|v| v.map(|v| !v.trim().is_empty()).unwrap_or(false))
}
