//! Research stage: gather supporting documents for the plan.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::clients::DocumentIndex;
use crate::error::StageError;
use crate::stage::Stage;
use crate::types::{Record, StageUpdate};

/// Chunks pulled per research query.
const RESEARCH_K: usize = 4;

/// Searches the document index for material supporting the plan.
pub struct ResearchStage {
  index: Arc<dyn DocumentIndex>,
}

impl ResearchStage {
  pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
    Self { index }
  }
}

#[async_trait]
impl Stage for ResearchStage {
  async fn process(&self, record: &Record) -> Result<StageUpdate, StageError> {
    // Query by the plan when one exists, else fall back to the raw request.
    let query = record
      .str_field("plan")
      .or_else(|| record.str_field("request"))
      .ok_or_else(|| StageError::failed("research: record has no `plan` or `request` field"))?;
    let docs = self.index.search(query, RESEARCH_K).await?;
    info!(count = docs.len(), "research documents retrieved");
    let research = serde_json::to_value(&docs)
      .map_err(|e| StageError::failed(format!("research: {}", e)))?;
    Ok(StageUpdate::new().set("research", research))
  }
}
