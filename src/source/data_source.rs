use super::{FileLoader, Loader, StaticLoader};
use crate::config::{SourceConfig, SourceKind};
use crate::error::DataSourceError;
use crate::event::EventSink;
use crate::reconcile::{initial_load, ReconcileReport, UpdatePolicy};
use crate::registry::Registry;
use crate::watch::{WatchHandle, WatchPoller, DEFAULT_RELOAD_INTERVAL};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

enum Origin {
    Inline(StaticLoader),
    /// Moves into the watcher once it starts
    File(Option<FileLoader>),
}

/// A registry together with the source that feeds it.
///
/// `load` populates the registry once. For a file source with auto reload
/// it also starts the watcher, which keeps the registry in sync with the
/// file until `shutdown`.
pub struct DataSource {
    registry: Arc<Registry>,
    origin: Origin,
    auto_reload: bool,
    interval: Duration,
    policy: UpdatePolicy,
    watcher: Option<WatchHandle>,
}

impl DataSource {
    fn new(origin: Origin, sink: Arc<dyn EventSink>) -> Self {
        Self {
            registry: Arc::new(Registry::new(sink)),
            origin,
            auto_reload: false,
            interval: DEFAULT_RELOAD_INTERVAL,
            policy: UpdatePolicy::default(),
            watcher: None,
        }
    }

    /// Source backed by in-memory configuration (one record or an array)
    pub fn from_value(config: Value, sink: Arc<dyn EventSink>) -> Self {
        Self::new(Origin::Inline(StaticLoader::new(config)), sink)
    }

    /// Source backed by a JSON file, watched every `interval` when
    /// `auto_reload` is set
    pub fn from_file(
        path: impl Into<PathBuf>,
        sink: Arc<dyn EventSink>,
        auto_reload: bool,
        interval: Duration,
    ) -> Self {
        let mut source = Self::new(Origin::File(Some(FileLoader::new(path))), sink);
        source.auto_reload = auto_reload;
        source.interval = interval;
        source
    }

    pub fn from_config(config: &SourceConfig, sink: Arc<dyn EventSink>) -> Self {
        let source = match config.kind {
            SourceKind::Json => Self::from_file(
                config.path.clone(),
                sink,
                config.auto_reload,
                config.reload_interval(),
            ),
            SourceKind::Inline => Self::from_value(Value::Array(config.records.clone()), sink),
        };
        source.with_update_policy(config.update_policy)
    }

    pub fn with_update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Populate the registry from the source.
    ///
    /// Errors here are fatal for the caller. Calling `load` again once the
    /// registry is populated (or the watcher runs) does nothing.
    pub async fn load(&mut self) -> Result<ReconcileReport, DataSourceError> {
        if self.watcher.is_some() || !self.registry.is_empty() {
            return Ok(ReconcileReport::default());
        }

        match &mut self.origin {
            Origin::Inline(loader) => {
                info!("Loading streamers from inline configuration");
                let report = initial_load(&self.registry, loader.load()?)?;
                info!(count = report.added.len(), "Imported streamers from inline configuration");
                Ok(report)
            }
            Origin::File(slot) => {
                let Some(loader) = slot.as_mut() else {
                    return Ok(ReconcileReport::default());
                };

                info!(path = %loader.path().display(), "Loading streamers from JSON file");
                let report = initial_load(&self.registry, loader.load()?)?;
                info!(
                    path = %loader.path().display(),
                    count = report.added.len(),
                    "Imported streamers from JSON file"
                );

                if self.auto_reload {
                    if let Some(loader) = slot.take() {
                        let poller = WatchPoller::new(loader, Arc::clone(&self.registry), self.policy);
                        self.watcher = Some(poller.spawn(self.interval));
                    }
                }
                Ok(report)
            }
        }
    }

    /// Stop the watcher, letting an in-flight cycle finish
    pub async fn shutdown(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.stop().await;
        }
    }
}
