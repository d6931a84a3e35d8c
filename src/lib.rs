// Streamer push configuration
pub mod model;

// Error taxonomy
pub mod error;

// Registry change notifications
pub mod event;

// Live streamer registry
pub mod registry;

// Diff and apply of candidate sets
pub mod reconcile;

// Loaders and data source bootstrap
pub mod source;

// File hot reload
pub mod watch;

// TOML configuration
pub mod config;

pub use error::{DataSourceError, ReconcileError, RegistryError, SourceError};
pub use event::{BroadcastSink, EventKind, EventSink, Notification, RecordingSink};
pub use model::{Ident, Platform, PushTarget, Streamer};
pub use reconcile::{ReconcileReport, UpdatePolicy};
pub use registry::Registry;
pub use source::{DataSource, FileLoader, Loader, StaticLoader};
pub use watch::{WatchHandle, WatchPoller};
