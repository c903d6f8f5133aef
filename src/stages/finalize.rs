//! Finalize stage: close out the run, with or without a captured error.

use async_trait::async_trait;
use serde_json::json;

use crate::error::StageError;
use crate::stage::Stage;
use crate::types::{Record, StageUpdate};

/// Marks the record complete. Doubles as the failure path: when an error
/// was captured earlier, the summary says so instead of pretending success.
#[derive(Default)]
pub struct FinalizeStage;

impl FinalizeStage {
  pub fn new() -> Self {
    Self
  }
}

#[async_trait]
impl Stage for FinalizeStage {
  async fn process(&self, record: &Record) -> Result<StageUpdate, StageError> {
    let summary = match &record.error {
      Some(reason) => format!("completed with error: {}", reason),
      None if record.get("draft").is_some() => "content ready".to_string(),
      None => "completed".to_string(),
    };
    Ok(
      StageUpdate::new()
        .set("completed", json!(true))
        .set("summary", json!(summary)),
    )
  }
}
