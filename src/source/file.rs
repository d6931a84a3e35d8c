use super::{parse_str, Loader};
use crate::error::SourceError;
use crate::model::Streamer;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Loader for a UTF-8 JSON file.
///
/// Remembers the modification time and content of the last successful load
/// so a watcher can tell cheaply whether anything changed since.
#[derive(Debug)]
pub struct FileLoader {
    path: PathBuf,
    last_modified: Option<SystemTime>,
    last_content: Option<String>,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_modified: None,
            last_content: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time recorded at the last successful load
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    /// Current modification time of the file on disk
    pub fn modified(&self) -> Result<SystemTime, SourceError> {
        fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_err(|e| self.io_error(e))
    }

    /// Read the file, returning its content and the modification time
    /// observed before reading
    pub fn read(&self) -> Result<(String, SystemTime), SourceError> {
        let modified = self.modified()?;
        let bytes = fs::read(&self.path).map_err(|e| self.io_error(e))?;
        let content = String::from_utf8(bytes).map_err(|_| SourceError::Encoding {
            path: self.path.clone(),
        })?;
        Ok((content, modified))
    }

    /// True if `content` is exactly what the last successful load saw
    pub fn is_last_content(&self, content: &str) -> bool {
        self.last_content.as_deref() == Some(content)
    }

    /// Record a successfully applied load
    pub fn commit(&mut self, content: String, modified: SystemTime) {
        debug!(path = %self.path.display(), "Recorded source file state");
        self.last_content = Some(content);
        self.last_modified = Some(modified);
    }

    fn io_error(&self, e: std::io::Error) -> SourceError {
        match e.kind() {
            ErrorKind::NotFound => SourceError::FileNotFound {
                path: self.path.clone(),
            },
            ErrorKind::InvalidData => SourceError::Encoding {
                path: self.path.clone(),
            },
            _ => SourceError::Read {
                path: self.path.clone(),
                source: e,
            },
        }
    }
}

impl Loader for FileLoader {
    fn load(&mut self) -> Result<Vec<Streamer>, SourceError> {
        let (content, modified) = self.read()?;
        let streamers = parse_str(&content)?;
        self.commit(content, modified);
        Ok(streamers)
    }
}
