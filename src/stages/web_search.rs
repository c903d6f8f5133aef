//! Web-search stage: fallback evidence when documents graded insufficient.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::clients::WebSearch;
use crate::error::StageError;
use crate::stage::Stage;
use crate::types::{Record, StageUpdate};

pub struct WebSearchStage {
  search: Arc<dyn WebSearch>,
}

impl WebSearchStage {
  pub fn new(search: Arc<dyn WebSearch>) -> Self {
    Self { search }
  }
}

#[async_trait]
impl Stage for WebSearchStage {
  async fn process(&self, record: &Record) -> Result<StageUpdate, StageError> {
    let question = record
      .str_field("question")
      .ok_or_else(|| StageError::failed("web_search: record has no `question` field"))?;
    let hits = self.search.search(question).await?;
    info!(count = hits.len(), "web fallback searched");
    let hits = serde_json::to_value(&hits)
      .map_err(|e| StageError::failed(format!("web_search: {}", e)))?;
    Ok(StageUpdate::new().set("web_results", hits))
  }
}
