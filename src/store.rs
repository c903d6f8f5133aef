//! Record store: holds the canonical record and applies stage updates.
//!
//! Merges are shallow and atomic: the whole update is validated against the
//! declared field schema before any field is written, so a rejected update
//! leaves the record untouched. Unknown fields are always accepted.

use std::collections::HashMap;

use serde_json::Value;
use tracing::instrument;

use crate::error::SchemaViolation;
use crate::types::{Record, StageUpdate};

/// Declared kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  String,
  Number,
  Bool,
  Array,
  Object,
}

impl FieldKind {
  pub(crate) fn name(&self) -> &'static str {
    match self {
      FieldKind::String => "string",
      FieldKind::Number => "number",
      FieldKind::Bool => "bool",
      FieldKind::Array => "array",
      FieldKind::Object => "object",
    }
  }

  fn matches(&self, value: &Value) -> bool {
    match self {
      FieldKind::String => value.is_string(),
      FieldKind::Number => value.is_number(),
      FieldKind::Bool => value.is_boolean(),
      FieldKind::Array => value.is_array(),
      FieldKind::Object => value.is_object(),
    }
  }
}

/// Kind name of an incoming value, for violation messages.
fn value_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

/// How an update value lands on an existing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
  /// Whole-field replacement (the default).
  #[default]
  Replace,
  /// Accumulate into an array: array values extend, scalars push.
  Append,
}

/// Per-field merge declarations for one pipeline.
///
/// Fields not declared here are accepted as-is and replaced on merge
/// (forward-compatible schema).
#[derive(Debug, Clone, Default)]
pub struct Schema {
  fields: HashMap<String, (FieldKind, MergePolicy)>,
}

impl Schema {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declares a replace-on-merge field of the given kind.
  pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
    self.fields.insert(name.into(), (kind, MergePolicy::Replace));
    self
  }

  /// Declares an append-on-merge array field (e.g. running message history).
  pub fn append_field(mut self, name: impl Into<String>) -> Self {
    self
      .fields
      .insert(name.into(), (FieldKind::Array, MergePolicy::Append));
    self
  }

  pub(crate) fn policy(&self, name: &str) -> MergePolicy {
    self
      .fields
      .get(name)
      .map(|(_, p)| *p)
      .unwrap_or(MergePolicy::Replace)
  }

  /// Checks one update value against the declared kind. Append fields accept
  /// any value: arrays extend the history, scalars become one entry.
  pub(crate) fn check(&self, name: &str, value: &Value) -> Result<(), SchemaViolation> {
    match self.fields.get(name) {
      Some((_, MergePolicy::Append)) => Ok(()),
      Some((kind, MergePolicy::Replace)) if !kind.matches(value) => Err(SchemaViolation {
        field: name.to_string(),
        expected: kind.name(),
        actual: value_kind(value),
      }),
      _ => Ok(()),
    }
  }
}

/// Owns the canonical record for one invocation and applies merges.
#[derive(Debug, Clone)]
pub struct RecordStore {
  record: Record,
  schema: Schema,
}

impl RecordStore {
  pub fn new(record: Record, schema: Schema) -> Self {
    Self { record, schema }
  }

  pub fn record(&self) -> &Record {
    &self.record
  }

  pub(crate) fn record_mut(&mut self) -> &mut Record {
    &mut self.record
  }

  pub fn into_record(self) -> Record {
    self.record
  }

  /// Shallow-merges the update into the record.
  ///
  /// Validates every field first; on violation nothing is written. Append
  /// fields accumulate, everything else replaces, fields absent from the
  /// update stay untouched. Each applied merge bumps `version`.
  #[instrument(level = "trace", skip(self, update))]
  pub fn merge(&mut self, update: StageUpdate) -> Result<&Record, SchemaViolation> {
    for (name, value) in &update.fields {
      self.schema.check(name, value)?;
    }
    for (name, value) in update.fields {
      match self.schema.policy(&name) {
        MergePolicy::Replace => {
          self.record.fields.insert(name, value);
        }
        MergePolicy::Append => {
          let slot = self
            .record
            .fields
            .entry(name)
            .or_insert_with(|| Value::Array(vec![]));
          if !slot.is_array() {
            let existing = slot.take();
            *slot = Value::Array(vec![existing]);
          }
          let entries = slot.as_array_mut().expect("append slot is an array");
          match value {
            Value::Array(items) => entries.extend(items),
            other => entries.push(other),
          }
        }
      }
    }
    self.record.version += 1;
    Ok(&self.record)
  }
}
