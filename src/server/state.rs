//! Shared state for the HTTP service

use crate::config::Config;
use crate::status::StatusLog;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handles kept for one crawl started by the service
#[derive(Debug, Clone)]
pub struct RunHandle {
    pub id: String,
    pub status: StatusLog,
    pub cancel: CancellationToken,
    finished: Arc<AtomicBool>,
}

impl RunHandle {
    /// Whether the crawl task has ended, successfully or not
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// False once the task has ended or cancellation was requested
    pub fn is_running(&self) -> bool {
        !self.is_finished() && !self.cancel.is_cancelled()
    }

    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    /// Marks the run finished when `task` ends
    ///
    /// A task that panics or is aborted is reported to the run's status log.
    pub fn watch<T: Send + 'static>(&self, task: JoinHandle<T>) {
        let run = self.clone();
        tokio::spawn(async move {
            if let Err(e) = task.await {
                tracing::error!(run = %run.id, "Crawl task ended abnormally: {}", e);
                run.status.emit(format!("Crawl aborted: {}", e));
            }
            run.mark_finished();
        });
    }
}

/// Registry of runs started since the service came up, keyed by run id
///
/// Only the most recent `retained` finished runs are kept. Evicted runs lose
/// their status log but their files stay on disk.
#[derive(Debug)]
pub struct RunRegistry {
    runs: Mutex<HashMap<String, RunHandle>>,
    retained: usize,
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new(32)
    }
}

impl RunRegistry {
    pub fn new(retained: usize) -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
            retained: retained.max(1),
        }
    }

    /// Registers a new run with a fresh status log
    ///
    /// Run ids are the start time in milliseconds since the epoch, bumped until
    /// unique. Finished runs beyond the retention limit are evicted first.
    pub fn register(&self, status_capacity: usize) -> RunHandle {
        let mut runs = self.runs.lock();
        evict_finished(&mut runs, self.retained);

        let mut stamp = chrono::Utc::now().timestamp_millis();
        while runs.contains_key(&stamp.to_string()) {
            stamp += 1;
        }

        let handle = RunHandle {
            id: stamp.to_string(),
            status: StatusLog::new(status_capacity),
            cancel: CancellationToken::new(),
            finished: Arc::new(AtomicBool::new(false)),
        };
        runs.insert(handle.id.clone(), handle.clone());
        handle
    }

    pub fn get(&self, id: &str) -> Option<RunHandle> {
        self.runs.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.runs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.lock().is_empty()
    }
}

/// Drops the oldest finished runs until at most `keep` remain
fn evict_finished(runs: &mut HashMap<String, RunHandle>, keep: usize) {
    let mut finished: Vec<(i64, String)> = runs
        .values()
        .filter(|run| run.is_finished())
        .map(|run| (run.id.parse().unwrap_or(i64::MAX), run.id.clone()))
        .collect();
    if finished.len() <= keep {
        return;
    }

    finished.sort_unstable();
    let excess = finished.len() - keep;
    for (_, id) in finished.into_iter().take(excess) {
        tracing::debug!(run = %id, "Evicting finished run");
        runs.remove(&id);
    }
}

/// Shared application state accessible to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runs: Arc<RunRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            runs: Arc::new(RunRegistry::new(config.server.retained_runs)),
            config: Arc::new(config),
        }
    }

    /// Output directory of a run
    pub fn run_dir(&self, run: &str) -> PathBuf {
        PathBuf::from(&self.config.server.download_root).join(run)
    }
}
