use super::{into_records, parse_records, Loader};
use crate::error::SourceError;
use crate::model::Streamer;
use serde_json::Value;

/// Loader over configuration already held in memory.
///
/// Loading does not consume the value, so it can be repeated and always
/// yields the same result.
#[derive(Clone, Debug)]
pub struct StaticLoader {
    config: Value,
}

impl StaticLoader {
    /// Accepts a single record object or an array of them
    pub fn new(config: Value) -> Self {
        Self { config }
    }
}

impl Loader for StaticLoader {
    fn load(&mut self) -> Result<Vec<Streamer>, SourceError> {
        parse_records(into_records(self.config.clone())?)
    }
}
