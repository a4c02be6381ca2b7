//! Loader for the upload input file.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, UploadError};

/// Reads a JSON array of objects and returns each object as compact JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not an array of objects.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| UploadError::Load {
        path: path.display().to_string(),
        source,
    })?;
    let records = parse_records(&content)?;
    debug!(path = %path.display(), count = records.len(), "Loaded records");
    Ok(records)
}

/// Same as [`load_records`], from text already in memory. Key order is kept.
pub fn parse_records(content: &str) -> Result<Vec<String>> {
    let objects: Vec<Map<String, Value>> = serde_json::from_str(content)?;
    objects
        .into_iter()
        .map(|object| serde_json::to_string(&object).map_err(UploadError::from))
        .collect()
}
