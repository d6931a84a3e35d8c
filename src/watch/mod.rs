use crate::error::DataSourceError;
use crate::reconcile::{reconcile, ReconcileReport, UpdatePolicy};
use crate::registry::Registry;
use crate::source::{parse_str, FileLoader};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};


/// Default time between two checks of the watched file
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest period the watcher will poll at; shorter periods are raised to it
pub const MIN_RELOAD_INTERVAL: Duration = Duration::from_millis(1);

/// Result of one successful watch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Modification time unchanged; nothing was read
    Unchanged,
    /// Modification time moved but the content is what was last applied
    ContentUnchanged,
    /// The file changed and the registry was reconciled against it
    Reconciled(ReconcileReport),
}

/// Hot-reloads a file-backed registry.
///
/// The file state recorded in the loader only advances after a cycle
/// succeeds, so a broken file is re-read and re-reported on every tick
/// until it is fixed.
pub struct WatchPoller {
    loader: FileLoader,
    registry: Arc<Registry>,
    policy: UpdatePolicy,
}

impl WatchPoller {
    /// `loader` should already hold the state of the initial load
    pub fn new(loader: FileLoader, registry: Arc<Registry>, policy: UpdatePolicy) -> Self {
        Self {
            loader,
            registry,
            policy,
        }
    }

    pub fn loader(&self) -> &FileLoader {
        &self.loader
    }

    /// Run a single check-and-reconcile cycle
    pub fn poll_once(&mut self) -> Result<PollOutcome, DataSourceError> {
        let modified = self.loader.modified()?;
        if self.loader.last_modified() == Some(modified) {
            return Ok(PollOutcome::Unchanged);
        }

        let (content, modified) = self.loader.read()?;
        if self.loader.is_last_content(&content) {
            self.loader.commit(content, modified);
            return Ok(PollOutcome::ContentUnchanged);
        }

        let candidates = parse_str(&content)?;
        let report = reconcile(&self.registry, candidates, self.policy)?;
        self.loader.commit(content, modified);

        Ok(PollOutcome::Reconciled(report))
    }

    /// One tick: poll and log, never fail
    fn cycle(&mut self) {
        let path = self.loader.path().display().to_string();

        match self.poll_once() {
            Ok(PollOutcome::Unchanged) => {}
            Ok(PollOutcome::ContentUnchanged) => {
                debug!(path = %path, "Source file touched, content unchanged");
            }
            Ok(PollOutcome::Reconciled(report)) => {
                if report.is_noop() {
                    debug!(path = %path, "Source file changed, registry already in sync");
                } else {
                    info!(
                        path = %path,
                        added = report.added.len(),
                        removed = report.removed.len(),
                        updated = report.updated.len(),
                        "Data source reloaded: {}",
                        report.summary()
                    );
                }
            }
            Err(e) if e.is_defect() => {
                error!(
                    path = %path,
                    error = %e,
                    tracked = self.registry.len(),
                    "Registry invariant violated during reload, registry may be partially reconciled"
                );
            }
            Err(e) => {
                warn!(
                    path = %path,
                    kind = e.kind(),
                    error = %e,
                    "Failed to reload data source, keeping last good state"
                );
            }
        }
    }

    /// Poll every `period` until `cancel` fires.
    ///
    /// Cancellation is only observed between cycles; a cycle in progress
    /// always runs to completion. A zero `period` is raised to
    /// [`MIN_RELOAD_INTERVAL`].
    pub async fn run(mut self, period: Duration, cancel: CancellationToken) {
        let period = period.max(MIN_RELOAD_INTERVAL);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await; // consume the immediate first tick

        info!(
            path = %self.loader.path().display(),
            interval = ?period,
            "Watching data source file"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => self.cycle(),
            }
        }

        info!(path = %self.loader.path().display(), "Stopped watching data source file");
    }

    /// Run on a background task
    pub fn spawn(self, period: Duration) -> WatchHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(period, cancel.clone()));
        WatchHandle { cancel, task }
    }
}

/// Owner of a running watch task
pub struct WatchHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Token that stops the task when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait for the in-flight cycle, if any, to finish
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "Watch task terminated abnormally");
        }
    }
}
