//! Validate stage: check the draft with the page checker.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::clients::PageChecker;
use crate::error::StageError;
use crate::stage::Stage;
use crate::types::{Record, StageUpdate};

/// Runs the draft through the injected checker and records the verdict.
pub struct ValidateStage {
  checker: Arc<dyn PageChecker>,
}

impl ValidateStage {
  pub fn new(checker: Arc<dyn PageChecker>) -> Self {
    Self { checker }
  }
}

#[async_trait]
impl Stage for ValidateStage {
  async fn process(&self, record: &Record) -> Result<StageUpdate, StageError> {
    let draft = record
      .str_field("draft")
      .ok_or_else(|| StageError::failed("validate: record has no `draft` field"))?;
    let report = self.checker.check(draft).await?;
    info!(passed = report.passed, problems = report.problems.len(), "draft checked");
    Ok(
      StageUpdate::new()
        .set(
          "validation_report",
          json!({ "passed": report.passed, "problems": report.problems }),
        )
        .set("validation_passed", json!(report.passed)),
    )
  }
}
