//! Core pipeline types: the shared record, stage updates, and progress events.
//!
//! These types flow between the engine, the stages, and the observers of a run.

use std::collections::HashMap;

mod progress_event;
mod record;
mod run_trace;
mod stage_update;

pub use progress_event::{EventKind, ProgressEvent};
pub use record::Record;
pub use run_trace::RunTrace;
pub use stage_update::StageUpdate;

/// Named record fields shared across one pipeline run.
pub type FieldMap = HashMap<String, serde_json::Value>;
