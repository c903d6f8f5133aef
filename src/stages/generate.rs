//! Generate stage: produce the first draft from plan and research.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::clients::ModelClient;
use crate::error::StageError;
use crate::stage::Stage;
use crate::types::{Record, StageUpdate};

pub(crate) const GENERATE_PROMPT: &str = "Generate the content described by this plan.";

/// Asks the model for a draft; research material is included when present.
pub struct GenerateStage {
  model: Arc<dyn ModelClient>,
}

impl GenerateStage {
  pub fn new(model: Arc<dyn ModelClient>) -> Self {
    Self { model }
  }
}

#[async_trait]
impl Stage for GenerateStage {
  async fn process(&self, record: &Record) -> Result<StageUpdate, StageError> {
    let plan = record
      .str_field("plan")
      .ok_or_else(|| StageError::failed("generate: record has no `plan` field"))?;
    let mut prompt = format!("{}\n\nPlan:\n{}", GENERATE_PROMPT, plan);
    if let Some(research) = record.get("research") {
      let rendered = serde_json::to_string_pretty(research)
        .map_err(|e| StageError::failed(format!("generate: {}", e)))?;
      prompt.push_str("\n\nResearch:\n");
      prompt.push_str(&rendered);
    }
    let draft = self.model.complete(&prompt).await?;
    Ok(
      StageUpdate::new()
        .set("draft", json!(draft))
        .set(
          "messages",
          json!({ "role": "assistant", "stage": "generate", "content": draft }),
        ),
    )
  }
}
