//! End-to-end tests over the public API: both built-in pipelines with
//! scripted collaborators, the grading branch, the refinement loop, failure
//! containment, and the run-dir file formats.

use std::sync::Arc;

use futures::StreamExt;
use pipewright::clients::{
  CannedChecker, CannedIndex, CannedModel, CannedSearch, DocumentIndex, RetrievedDoc,
};
use pipewright::error::ClientError;
use pipewright::record_io::{RECORD_FILENAME, load_record, save_record};
use pipewright::trace_io::{TRACE_FILENAME, load_trace, save_trace};
use pipewright::types::{EventKind, FieldMap, ProgressEvent, Record, RunTrace};
use pipewright::{answer_pipeline, content_pipeline};
use serde_json::json;

fn content_model() -> Arc<CannedModel> {
  Arc::new(
    CannedModel::new("ok")
      .rule("Plan the content", "1. hero\n2. footer")
      .rule("Generate the content", "<html><header>hero</header></html>")
      .rule(
        "Refine the draft",
        "<html><header>hero</header><footer>contact</footer></html>",
      ),
  )
}

fn content_index() -> Arc<CannedIndex> {
  Arc::new(CannedIndex::new().doc("brand.md", "hero imagery guidance"))
}

fn answer_model(grade_reply: &str) -> Arc<CannedModel> {
  Arc::new(
    CannedModel::new("No idea.")
      .rule("Grade the evidence", grade_reply)
      .rule("Answer the question", "Hiring grew 12%.")
      .rule("Summarize these search results", "The web says hiring grew."),
  )
}

fn report_index() -> Arc<CannedIndex> {
  Arc::new(CannedIndex::new().doc("2021.pdf", "hiring grew 12% in 2021"))
}

#[tokio::test]
async fn content_pipeline_refines_once_then_succeeds() {
  // First draft misses the footer; the refined draft carries it.
  let checker = Arc::new(CannedChecker::new().require("<footer>"));
  let p = content_pipeline(content_model(), content_index(), checker, 3).unwrap();
  let seed = Record::seed(FieldMap::new()).with_field("request", json!("landing page"));

  let record = p.run(seed).await;
  assert!(record.terminal);
  assert!(record.error.is_none());
  assert_eq!(record.iteration, 1);
  assert_eq!(record.bool_field("validation_passed"), Some(true));
  assert_eq!(record.bool_field("completed"), Some(true));
  assert_eq!(record.str_field("summary"), Some("content ready"));
  assert!(record.str_field("draft").unwrap().contains("<footer>"));
  // plan + generate + refine each appended one message.
  assert_eq!(record.array_field("messages").unwrap().len(), 3);
}

#[tokio::test]
async fn content_pipeline_exhausts_budget_on_the_success_path() {
  // Nothing the refiner produces will ever satisfy this checker.
  let checker = Arc::new(CannedChecker::new().require("<video>"));
  let p = content_pipeline(content_model(), content_index(), checker, 2).unwrap();
  let seed = Record::seed(FieldMap::new()).with_field("request", json!("landing page"));

  let record = p.run(seed).await;
  assert!(record.terminal);
  assert!(record.error.is_none());
  assert_eq!(record.iteration, 2);
  assert_eq!(record.bool_field("validation_passed"), Some(false));
  // Budget exhaustion still closes out through finalize.
  assert_eq!(record.bool_field("completed"), Some(true));
}

#[tokio::test]
async fn content_pipeline_event_order_includes_the_refinement_loop() {
  let checker = Arc::new(CannedChecker::new().require("<footer>"));
  let p = content_pipeline(content_model(), content_index(), checker, 3).unwrap();
  let seed = Record::seed(FieldMap::new()).with_field("request", json!("landing page"));

  let events: Vec<ProgressEvent> = p.stream(seed).collect().await;
  let completed: Vec<&str> = events
    .iter()
    .filter(|e| e.kind == EventKind::Completed)
    .map(|e| e.stage.as_str())
    .collect();
  assert_eq!(
    completed,
    vec!["plan", "research", "generate", "validate", "refine", "validate", "finalize"]
  );
  assert_eq!(events.last().unwrap().kind, EventKind::Terminal);
}

#[tokio::test]
async fn sufficient_evidence_answers_from_documents() {
  let p = answer_pipeline(answer_model("sufficient"), report_index(), Arc::new(CannedSearch::new()))
    .unwrap();
  let seed = Record::seed(FieldMap::new()).with_field("question", json!("hiring in 2021?"));

  let record = p.run(seed).await;
  assert!(record.terminal);
  assert_eq!(record.str_field("answer"), Some("Hiring grew 12%."));
  assert_eq!(record.get("sources"), Some(&json!(["2021.pdf"])));
  assert!(record.get("web_results").is_none());
}

#[tokio::test]
async fn insufficient_evidence_falls_back_to_web_search_exactly_once() {
  let search = Arc::new(CannedSearch::new().hit(
    "hiring in 2021?",
    "https://news/hiring",
    "Hiring report",
    "hiring grew",
  ));
  let p = answer_pipeline(answer_model("insufficient"), report_index(), search).unwrap();
  let seed = Record::seed(FieldMap::new()).with_field("question", json!("hiring in 2021?"));

  let events: Vec<ProgressEvent> = p.stream(seed).collect().await;
  let completed: Vec<&str> = events
    .iter()
    .filter(|e| e.kind == EventKind::Completed)
    .map(|e| e.stage.as_str())
    .collect();
  // One grading pass, one fallback retrieval, no re-grading.
  assert_eq!(completed, vec!["retrieve", "grade", "web_search", "summarize"]);
  assert_eq!(completed.iter().filter(|s| **s == "grade").count(), 1);

  let terminal = events.last().unwrap();
  assert_eq!(terminal.kind, EventKind::Terminal);
  assert_eq!(terminal.changed["answer"], json!("The web says hiring grew."));
  assert_eq!(terminal.changed["sources"], json!(["https://news/hiring"]));
}

/// Index that fails every search.
struct BrokenIndex;

#[async_trait::async_trait]
impl DocumentIndex for BrokenIndex {
  async fn search(&self, _query: &str, _k: usize) -> Result<Vec<RetrievedDoc>, ClientError> {
    Err(ClientError::new("index unavailable"))
  }
}

#[tokio::test]
async fn collaborator_failure_is_contained_and_finalized() {
  let checker = Arc::new(CannedChecker::new());
  let p = content_pipeline(content_model(), Arc::new(BrokenIndex), checker, 3).unwrap();
  let seed = Record::seed(FieldMap::new()).with_field("request", json!("landing page"));

  // The run resolves instead of panicking, with the error recorded and the
  // failure path (finalize) taken.
  let record = p.run(seed).await;
  assert!(record.terminal);
  assert_eq!(record.error.as_deref(), Some("index unavailable"));
  assert_eq!(record.bool_field("completed"), Some(true));
  assert_eq!(
    record.str_field("summary"),
    Some("completed with error: index unavailable")
  );
}

#[tokio::test]
async fn each_stream_call_is_a_fresh_invocation() {
  let p = answer_pipeline(answer_model("sufficient"), report_index(), Arc::new(CannedSearch::new()))
    .unwrap();

  for _ in 0..2 {
    let seed = Record::seed(FieldMap::new()).with_field("question", json!("hiring in 2021?"));
    let events: Vec<ProgressEvent> = p.stream(seed).collect().await;
    // A full, independent sequence every time: 3 stages plus terminal.
    assert_eq!(events.len(), 7);
    assert_eq!(events.first().unwrap().kind, EventKind::Started);
    assert_eq!(events.last().unwrap().kind, EventKind::Terminal);
  }
}

#[tokio::test]
async fn run_dir_files_roundtrip() {
  let search = Arc::new(CannedSearch::new());
  let p = answer_pipeline(answer_model("sufficient"), report_index(), search).unwrap();
  let seed = Record::seed(FieldMap::new()).with_field("question", json!("hiring in 2021?"));

  let (tx, mut rx) = tokio::sync::mpsc::channel(16);
  let engine = {
    let p = p.clone();
    tokio::spawn(async move { p.run_with_events(seed, tx).await })
  };
  let mut events = vec![];
  while let Some(event) = rx.recv().await {
    events.push(event);
  }
  let record = engine.await.expect("engine task");

  let dir = tempfile::tempdir().unwrap();
  let record_path = dir.path().join(RECORD_FILENAME);
  let trace_path = dir.path().join(TRACE_FILENAME);
  save_record(&record_path, &record).unwrap();
  let trace = RunTrace::from_events(&events);
  save_trace(&trace_path, &trace).unwrap();

  let loaded_record = load_record(&record_path).unwrap();
  assert_eq!(loaded_record.str_field("answer"), record.str_field("answer"));
  assert!(loaded_record.terminal);

  let loaded_trace = load_trace(&trace_path).unwrap();
  assert_eq!(loaded_trace.final_status, "success");
  assert_eq!(loaded_trace.completed_stages, vec!["retrieve", "grade", "answer"]);
  assert_eq!(loaded_trace.run_id, events[0].run_id);
}
