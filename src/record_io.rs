//! Terminal-record save/load to a run directory (JSON).
//!
//! The export boundary: the terminal record is written unchanged; nothing
//! here inspects or rewrites fields.

use std::path::Path;

use tracing::instrument;

use crate::types::Record;

/// Default filename for the terminal record under a run directory.
pub const RECORD_FILENAME: &str = "record.json";

/// Saves a record to `path` as pretty JSON. Creates parent directories.
#[instrument(level = "trace", skip(path, record))]
pub fn save_record(path: &Path, record: &Record) -> Result<(), std::io::Error> {
  let json = serde_json::to_string_pretty(record)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, json)
}

/// Loads a record from `path`. Returns error if file is missing or invalid JSON.
#[instrument(level = "trace", skip(path))]
pub fn load_record(path: &Path) -> Result<Record, std::io::Error> {
  let bytes = std::fs::read(path)?;
  serde_json::from_slice(&bytes)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
