//! Per-item download outcome definitions
//!
//! Every selected illustration produces exactly one outcome. Failures are recorded,
//! never retried within the same run.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Why an illustration was not saved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The image host answered HTTP 403
    Forbidden,

    /// Connection failure, timeout, or a non-success status other than 403
    Transport(String),

    /// The body could not be decoded as an image
    Decode(String),

    /// The PNG could not be written to the output directory
    Write(String),

    /// The run was cancelled before this item started
    Cancelled,
}

impl SkipReason {
    /// Short machine-friendly label, used for summaries
    pub fn label(&self) -> &'static str {
        match self {
            Self::Forbidden => "forbidden",
            Self::Transport(_) => "transport_error",
            Self::Decode(_) => "decode_error",
            Self::Write(_) => "write_error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forbidden => write!(f, "403 Forbidden"),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::Decode(msg) => write!(f, "decode error: {}", msg),
            Self::Write(msg) => write!(f, "write error: {}", msg),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one download attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    Saved { id: u64, path: PathBuf },
    Skipped { id: u64, reason: SkipReason },
}

impl DownloadOutcome {
    pub fn id(&self) -> u64 {
        match self {
            Self::Saved { id, .. } | Self::Skipped { id, .. } => *id,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Self::Saved { .. } => None,
            Self::Skipped { reason, .. } => Some(reason),
        }
    }

    pub fn saved_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Saved { path, .. } => Some(path),
            Self::Skipped { .. } => None,
        }
    }
}
