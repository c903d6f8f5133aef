//! Error taxonomy: construction errors, stage failures, schema violations.
//!
//! Only [BuildError] escapes synchronously, at pipeline construction. Stage
//! failures are caught at the engine boundary and normalized into the
//! record's `error` field; budget exhaustion and cancellation are control
//! flow, not errors.

use thiserror::Error;

/// Reason recorded on the record and the error event when a caller cancels
/// the run between stage boundaries.
pub const CANCELLED_REASON: &str = "cancelled";

/// Malformed pipeline graph, rejected at construction before any execution.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error("pipeline has no stages")]
  Empty,
  #[error("stage `{0}` is defined twice")]
  DuplicateStage(String),
  #[error("no entry stage configured")]
  MissingEntry,
  #[error("entry stage `{0}` is not defined")]
  UnknownEntry(String),
  #[error("failure stage `{0}` is not defined")]
  UnknownFailureStage(String),
  #[error("stage `{0}` has no route")]
  MissingRoute(String),
  #[error("route for `{0}` targets no defined stage")]
  OrphanRoute(String),
  #[error("route from `{from}` references undefined stage `{to}`")]
  DanglingRoute { from: String, to: String },
}

/// A stage update value incompatible with the field's declared kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("field `{field}` expects {expected}, got {actual}")]
pub struct SchemaViolation {
  pub field: String,
  /// Declared kind name (e.g. "array").
  pub expected: &'static str,
  /// Kind name of the rejected value.
  pub actual: &'static str,
}

/// Failure signaled by (or on behalf of) one stage invocation.
///
/// Never propagates past the engine boundary; the engine captures it into
/// the record and follows the failure path.
#[derive(Debug, Error)]
pub enum StageError {
  #[error("{0}")]
  Failed(String),
  #[error(transparent)]
  Schema(#[from] SchemaViolation),
}

impl StageError {
  pub fn failed(reason: impl Into<String>) -> Self {
    StageError::Failed(reason.into())
  }
}

/// Failure from an external collaborator (model, index, search, browser).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ClientError(pub String);

impl ClientError {
  pub fn new(reason: impl Into<String>) -> Self {
    ClientError(reason.into())
  }
}

impl From<ClientError> for StageError {
  fn from(e: ClientError) -> Self {
    StageError::Failed(e.0)
  }
}
