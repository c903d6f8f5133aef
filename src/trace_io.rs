//! Run-trace save/load: persist the progress sequence for debugging.

use std::path::Path;

use crate::types::RunTrace;

/// Default filename for the run trace under a run directory.
pub const TRACE_FILENAME: &str = "trace.json";

/// Saves a run trace to `path` as pretty JSON. Creates parent directories.
pub fn save_trace(path: &Path, trace: &RunTrace) -> Result<(), std::io::Error> {
  let json = serde_json::to_string_pretty(trace)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, json)
}

/// Loads a run trace from `path`. Returns error if file is missing or invalid JSON.
pub fn load_trace(path: &Path) -> Result<RunTrace, std::io::Error> {
  let bytes = std::fs::read(path)?;
  serde_json::from_slice(&bytes)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
