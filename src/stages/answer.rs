//! Answer stage: generate the answer from graded document evidence.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::clients::ModelClient;
use crate::error::StageError;
use crate::stage::Stage;
use crate::types::{Record, StageUpdate};

pub(crate) const ANSWER_PROMPT: &str = "Answer the question from these documents.";

/// Generates the final answer from `retrieved_docs`, citing their sources.
pub struct AnswerStage {
  model: Arc<dyn ModelClient>,
}

impl AnswerStage {
  pub fn new(model: Arc<dyn ModelClient>) -> Self {
    Self { model }
  }
}

#[async_trait]
impl Stage for AnswerStage {
  async fn process(&self, record: &Record) -> Result<StageUpdate, StageError> {
    let question = record
      .str_field("question")
      .ok_or_else(|| StageError::failed("answer: record has no `question` field"))?;
    let docs = record
      .array_field("retrieved_docs")
      .ok_or_else(|| StageError::failed("answer: record has no `retrieved_docs` field"))?;
    let rendered = serde_json::to_string_pretty(docs)
      .map_err(|e| StageError::failed(format!("answer: {}", e)))?;
    let prompt = format!(
      "{}\n\nQuestion: {}\n\nDocuments:\n{}",
      ANSWER_PROMPT, question, rendered
    );
    let answer = self.model.complete(&prompt).await?;
    let sources: Vec<&str> = docs
      .iter()
      .filter_map(|d| d.get("source").and_then(|s| s.as_str()))
      .collect();
    Ok(
      StageUpdate::new()
        .set("answer", json!(answer))
        .set("sources", json!(sources)),
    )
  }
}
