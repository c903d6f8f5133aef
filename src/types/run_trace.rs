//! DTO for trace.json: the recorded progress sequence of one run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CANCELLED_REASON;

use super::{EventKind, ProgressEvent};

/// Trace format version.
pub const TRACE_VERSION: u32 = 1;

/// Root structure for trace.json: one run's full progress sequence plus
/// derived summary fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTrace {
  /// Trace format version.
  pub version: u32,
  /// Id of the invocation the events belong to.
  pub run_id: Uuid,
  /// ISO 8601 timestamp of the first event.
  pub started_at: String,
  /// ISO 8601 timestamp of the last event (None for an empty trace).
  pub finished_at: Option<String>,
  /// "success", "error", or "cancelled".
  pub final_status: String,
  /// Stages that completed, in execution order (repeats on re-entry).
  pub completed_stages: Vec<String>,
  /// Recorded events in emission order.
  pub events: Vec<ProgressEvent>,
}

impl RunTrace {
  /// Builds a trace from an emitted event sequence.
  pub fn from_events(events: &[ProgressEvent]) -> Self {
    let run_id = events.first().map(|e| e.run_id).unwrap_or_else(Uuid::nil);
    let started_at = events
      .first()
      .map(|e| e.timestamp.to_rfc3339())
      .unwrap_or_default();
    let finished_at = events.last().map(|e| e.timestamp.to_rfc3339());
    let cancelled = events
      .iter()
      .any(|e| e.kind == EventKind::Error && e.reason.as_deref() == Some(CANCELLED_REASON));
    let errored = events.iter().any(|e| e.kind == EventKind::Error);
    let final_status = if cancelled {
      "cancelled".to_string()
    } else if errored {
      "error".to_string()
    } else {
      "success".to_string()
    };
    let completed_stages = events
      .iter()
      .filter(|e| e.kind == EventKind::Completed)
      .map(|e| e.stage.clone())
      .collect();
    Self {
      version: TRACE_VERSION,
      run_id,
      started_at,
      finished_at,
      final_status,
      completed_stages,
      events: events.to_vec(),
    }
  }
}
