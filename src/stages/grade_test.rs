//! Tests for `GradeStage`.

use std::sync::Arc;

use serde_json::json;

use super::GradeStage;
use crate::clients::CannedModel;
use crate::stage::Stage;
use crate::types::{FieldMap, Record};

fn record_with_docs(docs: serde_json::Value) -> Record {
  Record::seed(FieldMap::new())
    .with_field("question", json!("what changed in 2021?"))
    .with_field("retrieved_docs", docs)
}

#[tokio::test]
async fn sufficient_reply_grades_sufficient() {
  let model = CannedModel::new("").rule("Grade the evidence", "sufficient");
  let stage = GradeStage::new(Arc::new(model));
  let record = record_with_docs(json!([{ "source": "2021.pdf", "content": "hiring grew" }]));
  let update = stage.process(&record).await.unwrap();
  assert_eq!(update.fields["grade"], json!("sufficient"));
}

#[tokio::test]
async fn insufficient_reply_grades_insufficient() {
  let model = CannedModel::new("").rule("Grade the evidence", "clearly insufficient");
  let stage = GradeStage::new(Arc::new(model));
  let record = record_with_docs(json!([{ "source": "x.pdf", "content": "unrelated" }]));
  let update = stage.process(&record).await.unwrap();
  assert_eq!(update.fields["grade"], json!("insufficient"));
}

#[tokio::test]
async fn empty_evidence_skips_the_model() {
  // Model would answer "sufficient"; the empty doc list must win.
  let model = CannedModel::new("sufficient");
  let stage = GradeStage::new(Arc::new(model));
  let update = stage.process(&record_with_docs(json!([]))).await.unwrap();
  assert_eq!(update.fields["grade"], json!("insufficient"));
}

#[tokio::test]
async fn missing_docs_field_fails_the_stage() {
  let stage = GradeStage::new(Arc::new(CannedModel::new("x")));
  let record = Record::seed(FieldMap::new()).with_field("question", json!("q"));
  let err = stage.process(&record).await.unwrap_err();
  assert!(err.to_string().contains("`retrieved_docs`"));
}
