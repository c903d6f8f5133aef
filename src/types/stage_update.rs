//! Partial field update returned by one stage execution.

use serde::Serialize;
use serde_json::Value;

use super::FieldMap;

/// Partial field update returned by one stage execution.
///
/// Fields absent from the update leave the record untouched; how present
/// fields land (replace vs append) is the record store's decision.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageUpdate {
  pub fields: FieldMap,
}

impl StageUpdate {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets one field on the update.
  pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
    self.fields.insert(field.into(), value);
    self
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }
}
