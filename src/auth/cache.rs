//! On-disk credential cache
//!
//! The cache is a single text file holding the raw refresh token. A non-empty
//! cached value is returned as-is: there is no freshness or expiry check.

use crate::auth::LoginFlow;
use crate::{AuthError, AuthResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Credential cache backed by a single file
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached token
    ///
    /// # Returns
    ///
    /// * `Ok(Some(token))` - The file exists and holds a non-blank token (trimmed)
    /// * `Ok(None)` - The file is missing or blank
    /// * `Err(AuthError::Cache)` - The file exists but could not be read
    pub async fn read(&self) -> AuthResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(AuthError::Cache {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Replaces the cache content with `token`
    pub async fn store(&self, token: &str) -> AuthResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| AuthError::Cache {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&self.path, token)
            .await
            .map_err(|source| AuthError::Cache {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!("Wrote token cache to {}", self.path.display());
        Ok(())
    }

    /// Returns the cached token, running `flow` only when the cache is empty
    ///
    /// A token obtained from `flow` is written to the cache before it is returned.
    pub async fn get_token(&self, flow: &dyn LoginFlow) -> AuthResult<String> {
        if let Some(token) = self.read().await? {
            tracing::debug!("Using cached token from {}", self.path.display());
            return Ok(token);
        }

        tracing::info!("No cached token at {}, running login flow", self.path.display());
        let token = flow.login().await?;
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        self.store(token).await?;
        Ok(token.to_string())
    }
}
