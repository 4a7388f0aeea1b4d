//! Bounded, append-only progress log for one crawl run
//!
//! The pipeline writes human-readable messages here as it goes; presentation layers
//! poll [`StatusLog::snapshot`]. Nothing in the pipeline reads the log back, it is
//! purely observational.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

/// Number of entries kept when no capacity is given
pub const DEFAULT_CAPACITY: usize = 50;

/// A single timestamped status message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Cloneable handle to a bounded status log
///
/// Clones share the same underlying buffer. Once `capacity` entries are stored the
/// oldest one is dropped for every new append.
#[derive(Debug, Clone)]
pub struct StatusLog {
    entries: Arc<Mutex<VecDeque<StatusEntry>>>,
    capacity: usize,
}

impl StatusLog {
    /// Creates an empty log retaining at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Appends a message, evicting the oldest entry when full
    pub fn emit(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "pixiv_crawler::status", "{}", message);

        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(StatusEntry {
            timestamp: Utc::now(),
            message,
        });
    }

    /// Returns a copy of the retained entries, oldest first
    pub fn snapshot(&self) -> Vec<StatusEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Returns the newest `n` entries, oldest first
    pub fn tail(&self, n: usize) -> Vec<StatusEntry> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
