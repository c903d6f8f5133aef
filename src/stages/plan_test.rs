//! Tests for `PlanStage`.

use std::sync::Arc;

use serde_json::json;

use super::PlanStage;
use crate::clients::CannedModel;
use crate::stage::Stage;
use crate::types::{FieldMap, Record};

#[tokio::test]
async fn writes_plan_and_appends_a_message() {
  let model = CannedModel::new("").rule("Plan the content", "1. hero\n2. signup form");
  let stage = PlanStage::new(Arc::new(model));
  let record = Record::seed(FieldMap::new()).with_field("request", json!("landing page"));

  let update = stage.process(&record).await.unwrap();
  assert_eq!(update.fields["plan"], json!("1. hero\n2. signup form"));
  assert_eq!(update.fields["messages"]["stage"], json!("plan"));
}

#[tokio::test]
async fn missing_request_fails_the_stage() {
  let stage = PlanStage::new(Arc::new(CannedModel::new("x")));
  let err = stage.process(&Record::seed(FieldMap::new())).await.unwrap_err();
  assert!(err.to_string().contains("`request`"));
}
