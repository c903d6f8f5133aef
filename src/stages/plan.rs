//! Plan stage: turn the user request into a content plan.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::clients::ModelClient;
use crate::error::StageError;
use crate::stage::Stage;
use crate::types::{Record, StageUpdate};

pub(crate) const PLAN_PROMPT: &str = "Plan the content for this request.";

/// Asks the model for a plan covering the seeded `request`.
pub struct PlanStage {
  model: Arc<dyn ModelClient>,
}

impl PlanStage {
  pub fn new(model: Arc<dyn ModelClient>) -> Self {
    Self { model }
  }
}

#[async_trait]
impl Stage for PlanStage {
  async fn process(&self, record: &Record) -> Result<StageUpdate, StageError> {
    let request = record
      .str_field("request")
      .ok_or_else(|| StageError::failed("plan: record has no `request` field"))?;
    let prompt = format!("{}\n\nRequest: {}", PLAN_PROMPT, request);
    let plan = self.model.complete(&prompt).await?;
    Ok(
      StageUpdate::new()
        .set("plan", json!(plan))
        .set("messages", json!({ "role": "assistant", "stage": "plan", "content": plan })),
    )
  }
}
