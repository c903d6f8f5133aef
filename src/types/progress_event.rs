//! Observer-facing notification of stage lifecycle during a run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldMap;

/// Lifecycle kind of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
  Started,
  Completed,
  Error,
  Terminal,
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EventKind::Started => write!(f, "started"),
      EventKind::Completed => write!(f, "completed"),
      EventKind::Error => write!(f, "error"),
      EventKind::Terminal => write!(f, "terminal"),
    }
  }
}

/// One entry in the append-only progress sequence of a run.
///
/// Events are never mutated after emission. A `completed` event carries the
/// post-merge values of the fields the stage changed; the `terminal` event
/// carries the full final field snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
  pub run_id: Uuid,
  pub stage: String,
  pub kind: EventKind,
  pub changed: FieldMap,
  /// Failure or cancellation reason on `error` events.
  pub reason: Option<String>,
  pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
  pub fn started(run_id: Uuid, stage: impl Into<String>) -> Self {
    Self {
      run_id,
      stage: stage.into(),
      kind: EventKind::Started,
      changed: FieldMap::new(),
      reason: None,
      timestamp: Utc::now(),
    }
  }

  pub fn completed(run_id: Uuid, stage: impl Into<String>, changed: FieldMap) -> Self {
    Self {
      run_id,
      stage: stage.into(),
      kind: EventKind::Completed,
      changed,
      reason: None,
      timestamp: Utc::now(),
    }
  }

  pub fn error(run_id: Uuid, stage: impl Into<String>, reason: impl Into<String>) -> Self {
    Self {
      run_id,
      stage: stage.into(),
      kind: EventKind::Error,
      changed: FieldMap::new(),
      reason: Some(reason.into()),
      timestamp: Utc::now(),
    }
  }

  pub fn terminal(run_id: Uuid, stage: impl Into<String>, snapshot: FieldMap) -> Self {
    Self {
      run_id,
      stage: stage.into(),
      kind: EventKind::Terminal,
      changed: snapshot,
      reason: None,
      timestamp: Utc::now(),
    }
  }
}
