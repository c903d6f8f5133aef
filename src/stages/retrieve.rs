//! Retrieve stage: pull candidate evidence from the document index.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::clients::DocumentIndex;
use crate::error::StageError;
use crate::stage::Stage;
use crate::types::{Record, StageUpdate};

/// Chunks pulled per question; wide on purpose, grading filters later.
const RETRIEVE_K: usize = 10;

pub struct RetrieveStage {
  index: Arc<dyn DocumentIndex>,
}

impl RetrieveStage {
  pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
    Self { index }
  }
}

#[async_trait]
impl Stage for RetrieveStage {
  async fn process(&self, record: &Record) -> Result<StageUpdate, StageError> {
    let question = record
      .str_field("question")
      .ok_or_else(|| StageError::failed("retrieve: record has no `question` field"))?;
    let docs = self.index.search(question, RETRIEVE_K).await?;
    info!(count = docs.len(), "evidence retrieved");
    let docs = serde_json::to_value(&docs)
      .map_err(|e| StageError::failed(format!("retrieve: {}", e)))?;
    Ok(StageUpdate::new().set("retrieved_docs", docs))
  }
}
