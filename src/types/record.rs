//! The shared working record threaded through one pipeline invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FieldMap;

/// The shared working record threaded through one pipeline invocation.
///
/// Stages receive a read view and return partial updates; only the engine
/// mutates the record, via [`crate::store::RecordStore::merge`]. After every
/// merge exactly one of `terminal` / `current_stage` describes what happens
/// next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
  /// Free-form payload fields (e.g. "plan", "draft", "validation_passed").
  pub fields: FieldMap,
  /// Count of re-entrant edge traversals taken so far.
  pub iteration: u32,
  /// Bound on re-entrant traversals; stamped from the pipeline at run start.
  pub max_iterations: u32,
  /// Stage the engine will run next; `None` once terminal.
  pub current_stage: Option<String>,
  /// True once no further stage will execute.
  pub terminal: bool,
  /// Failure captured from a stage, or the cancellation reason.
  pub error: Option<String>,
  /// Incremented once per applied merge.
  pub version: u64,
}

impl Record {
  /// Creates a fresh record from caller-supplied seed fields.
  pub fn seed(fields: FieldMap) -> Self {
    Self {
      fields,
      iteration: 0,
      max_iterations: 0,
      current_stage: None,
      terminal: false,
      error: None,
      version: 0,
    }
  }

  /// Seed-building convenience: sets one field and returns the record.
  pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
    self.fields.insert(name.into(), value);
    self
  }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self.fields.get(name)
  }

  /// Reads a field as a string slice; `None` if absent or not a string.
  pub fn str_field(&self, name: &str) -> Option<&str> {
    self.get(name).and_then(Value::as_str)
  }

  /// Reads a field as a bool; `None` if absent or not a bool.
  pub fn bool_field(&self, name: &str) -> Option<bool> {
    self.get(name).and_then(Value::as_bool)
  }

  /// Reads a field as an array slice; `None` if absent or not an array.
  pub fn array_field(&self, name: &str) -> Option<&Vec<Value>> {
    self.get(name).and_then(Value::as_array)
  }
}
