//! Tests for `RefineStage`.

use std::sync::Arc;

use serde_json::json;

use super::RefineStage;
use crate::clients::CannedModel;
use crate::stage::Stage;
use crate::types::{FieldMap, Record};

#[tokio::test]
async fn rewrites_the_draft() {
  let model = CannedModel::new("").rule("Refine the draft", "<html>fixed</html>");
  let stage = RefineStage::new(Arc::new(model));
  let record = Record::seed(FieldMap::new())
    .with_field("draft", json!("<html>broken</html>"))
    .with_field(
      "validation_report",
      json!({ "passed": false, "problems": ["missing required snippet: <footer>"] }),
    );

  let update = stage.process(&record).await.unwrap();
  assert_eq!(update.fields["draft"], json!("<html>fixed</html>"));
  assert_eq!(update.fields["messages"]["stage"], json!("refine"));
}

#[tokio::test]
async fn tolerates_a_missing_validation_report() {
  let model = CannedModel::new("revised");
  let stage = RefineStage::new(Arc::new(model));
  let record = Record::seed(FieldMap::new()).with_field("draft", json!("v1"));
  let update = stage.process(&record).await.unwrap();
  assert_eq!(update.fields["draft"], json!("revised"));
}

#[tokio::test]
async fn missing_draft_fails_the_stage() {
  let stage = RefineStage::new(Arc::new(CannedModel::new("x")));
  let err = stage.process(&Record::seed(FieldMap::new())).await.unwrap_err();
  assert!(err.to_string().contains("`draft`"));
}
