//! Grade stage: judge whether retrieved evidence can answer the question.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::clients::ModelClient;
use crate::error::StageError;
use crate::stage::Stage;
use crate::types::{Record, StageUpdate};

pub(crate) const GRADE_PROMPT: &str =
  "Grade the evidence: is it sufficient to answer the question? Reply sufficient or insufficient.";

/// Grade value routed on by the answer pipeline.
pub(crate) const GRADE_SUFFICIENT: &str = "sufficient";
pub(crate) const GRADE_INSUFFICIENT: &str = "insufficient";

/// Writes a binary sufficiency verdict into `grade`.
pub struct GradeStage {
  model: Arc<dyn ModelClient>,
}

impl GradeStage {
  pub fn new(model: Arc<dyn ModelClient>) -> Self {
    Self { model }
  }
}

#[async_trait]
impl Stage for GradeStage {
  async fn process(&self, record: &Record) -> Result<StageUpdate, StageError> {
    let question = record
      .str_field("question")
      .ok_or_else(|| StageError::failed("grade: record has no `question` field"))?;
    let docs = record
      .array_field("retrieved_docs")
      .ok_or_else(|| StageError::failed("grade: record has no `retrieved_docs` field"))?;

    // No evidence, nothing to grade.
    if docs.is_empty() {
      return Ok(StageUpdate::new().set("grade", json!(GRADE_INSUFFICIENT)));
    }

    let rendered = serde_json::to_string_pretty(docs)
      .map_err(|e| StageError::failed(format!("grade: {}", e)))?;
    let prompt = format!(
      "{}\n\nQuestion: {}\n\nEvidence:\n{}",
      GRADE_PROMPT, question, rendered
    );
    let reply = self.model.complete(&prompt).await?;
    let grade = if reply.to_lowercase().contains(GRADE_INSUFFICIENT) {
      GRADE_INSUFFICIENT
    } else {
      GRADE_SUFFICIENT
    };
    info!(grade = grade, "evidence graded");
    Ok(StageUpdate::new().set("grade", json!(grade)))
  }
}
