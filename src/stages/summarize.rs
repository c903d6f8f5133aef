//! Summarize stage: turn web fallback results into the final answer.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::clients::ModelClient;
use crate::error::StageError;
use crate::stage::Stage;
use crate::types::{Record, StageUpdate};

pub(crate) const SUMMARIZE_PROMPT: &str = "Summarize these search results into an answer.";

/// Summarizes `web_results` into `answer`, citing hit urls.
pub struct SummarizeStage {
  model: Arc<dyn ModelClient>,
}

impl SummarizeStage {
  pub fn new(model: Arc<dyn ModelClient>) -> Self {
    Self { model }
  }
}

#[async_trait]
impl Stage for SummarizeStage {
  async fn process(&self, record: &Record) -> Result<StageUpdate, StageError> {
    let question = record
      .str_field("question")
      .ok_or_else(|| StageError::failed("summarize: record has no `question` field"))?;
    let hits = record
      .array_field("web_results")
      .ok_or_else(|| StageError::failed("summarize: record has no `web_results` field"))?;
    let rendered = serde_json::to_string_pretty(hits)
      .map_err(|e| StageError::failed(format!("summarize: {}", e)))?;
    let prompt = format!(
      "{}\n\nQuestion: {}\n\nResults:\n{}",
      SUMMARIZE_PROMPT, question, rendered
    );
    let answer = self.model.complete(&prompt).await?;
    let sources: Vec<&str> = hits
      .iter()
      .filter_map(|h| h.get("url").and_then(|u| u.as_str()))
      .collect();
    Ok(
      StageUpdate::new()
        .set("answer", json!(answer))
        .set("sources", json!(sources)),
    )
  }
}
