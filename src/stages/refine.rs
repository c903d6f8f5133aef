//! Refine stage: rework the draft against the validation problems.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::clients::ModelClient;
use crate::error::StageError;
use crate::stage::Stage;
use crate::types::{Record, StageUpdate};

pub(crate) const REFINE_PROMPT: &str = "Refine the draft to fix these problems.";

/// Asks the model for a corrected draft. The engine, not this stage, owns
/// the iteration counter that bounds the loop.
pub struct RefineStage {
  model: Arc<dyn ModelClient>,
}

impl RefineStage {
  pub fn new(model: Arc<dyn ModelClient>) -> Self {
    Self { model }
  }
}

#[async_trait]
impl Stage for RefineStage {
  async fn process(&self, record: &Record) -> Result<StageUpdate, StageError> {
    let draft = record
      .str_field("draft")
      .ok_or_else(|| StageError::failed("refine: record has no `draft` field"))?;
    let problems = record
      .get("validation_report")
      .and_then(|r| r.get("problems"))
      .and_then(|p| p.as_array())
      .map(|items| {
        items
          .iter()
          .filter_map(|v| v.as_str())
          .collect::<Vec<_>>()
          .join("\n")
      })
      .unwrap_or_default();
    let prompt = format!(
      "{}\n\nProblems:\n{}\n\nDraft:\n{}",
      REFINE_PROMPT, problems, draft
    );
    let revised = self.model.complete(&prompt).await?;
    Ok(
      StageUpdate::new()
        .set("draft", json!(revised))
        .set(
          "messages",
          json!({ "role": "assistant", "stage": "refine", "content": revised }),
        ),
    )
  }
}
