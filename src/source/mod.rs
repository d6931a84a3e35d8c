// Push-configuration sources: raw input -> validated streamers

mod data_source;
mod file;
mod inline;

pub use data_source::DataSource;
pub use file::FileLoader;
pub use inline::StaticLoader;

use crate::error::SourceError;
use crate::model::Streamer;
use serde_json::Value;
use serde_path_to_error::Segment;

#[cfg(test)]
mod tests;

/// Produces the full candidate list of streamers from some source.
///
/// The first invalid record aborts the whole load; there is no partial import.
pub trait Loader {
    fn load(&mut self) -> Result<Vec<Streamer>, SourceError>;
}

/// Split a decoded document into records.
///
/// A single object counts as a one-element list.
pub fn into_records(value: Value) -> Result<Vec<Value>, SourceError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(_) => Ok(vec![value]),
        Value::Null => Err(SourceError::UnexpectedShape { found: "null" }),
        Value::Bool(_) => Err(SourceError::UnexpectedShape { found: "a boolean" }),
        Value::Number(_) => Err(SourceError::UnexpectedShape { found: "a number" }),
        Value::String(_) => Err(SourceError::UnexpectedShape { found: "a string" }),
    }
}

/// Validate every record into a streamer, stopping at the first failure
pub fn parse_records(records: Vec<Value>) -> Result<Vec<Streamer>, SourceError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| parse_record(index, record))
        .collect()
}

/// Decode JSON text and validate it into streamers
pub fn parse_str(content: &str) -> Result<Vec<Streamer>, SourceError> {
    let value: Value = serde_json::from_str(content)?;
    parse_records(into_records(value)?)
}

fn parse_record(index: usize, record: Value) -> Result<Streamer, SourceError> {
    let streamer: Streamer = serde_path_to_error::deserialize(record).map_err(|e| {
        let inner = e.inner().to_string();
        let field = field_in_message(&inner).or_else(|| last_key(e.path()));
        let message = if e.path().iter().next().is_some() {
            format!("{}: {}", e.path(), inner)
        } else {
            inner
        };
        SourceError::Validation {
            index,
            field,
            message,
        }
    })?;

    streamer.validate().map_err(|e| SourceError::Validation {
        index,
        field: Some(e.field.to_string()),
        message: e.reason,
    })?;

    Ok(streamer)
}

/// Innermost object key on the path to a failed value
fn last_key(path: &serde_path_to_error::Path) -> Option<String> {
    path.iter()
        .filter_map(|segment| match segment {
            Segment::Map { key } => Some(key.clone()),
            _ => None,
        })
        .last()
}

/// Pull the field name out of serde's "missing field `x`" style messages
fn field_in_message(message: &str) -> Option<String> {
    const PREFIXES: [&str; 3] = ["missing field `", "duplicate field `", "unknown field `"];

    PREFIXES.iter().find_map(|prefix| {
        let rest = message.strip_prefix(prefix)?;
        let end = rest.find('`')?;
        Some(rest[..end].to_string())
    })
}
