//! Error taxonomy for loading, registry mutation and reconciliation.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn a raw source into a list of streamers.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source file {} does not exist", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("source file {} is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },

    #[error("failed to read source file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed source content: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("source must be a JSON object or an array of objects, found {found}")]
    UnexpectedShape { found: &'static str },

    /// `field` is None when the failure cannot be pinned to one field
    #[error("record {index} failed validation{}: {message}", on_field(.field))]
    Validation {
        index: usize,
        field: Option<String>,
        message: String,
    },
}

fn on_field(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|f| format!(" on field '{}'", f))
        .unwrap_or_default()
}

impl SourceError {
    /// Short label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::FileNotFound { .. } => "not_found",
            SourceError::Encoding { .. } => "encoding",
            SourceError::Read { .. } => "io",
            SourceError::Malformed(_) => "malformed",
            SourceError::UnexpectedShape { .. } => "shape",
            SourceError::Validation { .. } => "validation",
        }
    }
}

/// Registry invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("streamer {0} is already registered")]
    DuplicateEntity(i64),

    #[error("streamer {0} is not registered")]
    NotFound(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("source contains streamer {0} more than once")]
    DuplicateInSource(i64),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Top-level error of a data source.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl From<RegistryError> for DataSourceError {
    fn from(e: RegistryError) -> Self {
        DataSourceError::Reconcile(ReconcileError::Registry(e))
    }
}

impl DataSourceError {
    /// A registry invariant failed during reconciliation. This is a bug in
    /// the diff, not a problem with the input.
    pub fn is_defect(&self) -> bool {
        matches!(self, DataSourceError::Reconcile(ReconcileError::Registry(_)))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DataSourceError::Source(e) => e.kind(),
            DataSourceError::Reconcile(ReconcileError::DuplicateInSource(_)) => "duplicate",
            DataSourceError::Reconcile(ReconcileError::Registry(_)) => "invariant",
        }
    }
}
