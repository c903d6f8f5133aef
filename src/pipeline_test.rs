//! Tests for pipeline construction and graph validation.

use async_trait::async_trait;

use crate::error::{BuildError, StageError};
use crate::pipeline::{DEFAULT_MAX_ITERATIONS, Pipeline};
use crate::router::Router;
use crate::stage::Stage;
use crate::types::{Record, StageUpdate};

/// Stage that writes nothing; these tests only exercise construction.
struct NullStage;

#[async_trait]
impl Stage for NullStage {
  async fn process(&self, _record: &Record) -> Result<StageUpdate, StageError> {
    Ok(StageUpdate::new())
  }
}

#[test]
fn linear_graph_builds() {
  let p = Pipeline::builder()
    .stage("a", NullStage)
    .stage("b", NullStage)
    .route("a", Router::To("b".to_string()))
    .route("b", Router::End)
    .entry("a")
    .build()
    .expect("valid graph");
  assert_eq!(p.stage_names(), vec!["a", "b"]);
  assert_eq!(p.max_iterations(), DEFAULT_MAX_ITERATIONS);
}

#[test]
fn empty_graph_is_rejected() {
  let err = Pipeline::builder().entry("a").build().unwrap_err();
  assert!(matches!(err, BuildError::Empty));
}

#[test]
fn missing_entry_is_rejected() {
  let err = Pipeline::builder()
    .stage("a", NullStage)
    .route("a", Router::End)
    .build()
    .unwrap_err();
  assert!(matches!(err, BuildError::MissingEntry));
}

#[test]
fn unknown_entry_is_rejected() {
  let err = Pipeline::builder()
    .stage("a", NullStage)
    .route("a", Router::End)
    .entry("nope")
    .build()
    .unwrap_err();
  assert!(matches!(err, BuildError::UnknownEntry(name) if name == "nope"));
}

#[test]
fn dangling_route_is_rejected() {
  let err = Pipeline::builder()
    .stage("a", NullStage)
    .route("a", Router::To("ghost".to_string()))
    .entry("a")
    .build()
    .unwrap_err();
  assert!(
    matches!(err, BuildError::DanglingRoute { from, to } if from == "a" && to == "ghost")
  );
}

#[test]
fn stage_without_route_is_rejected() {
  let err = Pipeline::builder()
    .stage("a", NullStage)
    .stage("b", NullStage)
    .route("a", Router::To("b".to_string()))
    .entry("a")
    .build()
    .unwrap_err();
  assert!(matches!(err, BuildError::MissingRoute(name) if name == "b"));
}

#[test]
fn route_for_undefined_stage_is_rejected() {
  let err = Pipeline::builder()
    .stage("a", NullStage)
    .route("a", Router::End)
    .route("ghost", Router::End)
    .entry("a")
    .build()
    .unwrap_err();
  assert!(matches!(err, BuildError::OrphanRoute(name) if name == "ghost"));
}

#[test]
fn duplicate_stage_is_rejected() {
  let err = Pipeline::builder()
    .stage("a", NullStage)
    .stage("a", NullStage)
    .route("a", Router::End)
    .entry("a")
    .build()
    .unwrap_err();
  assert!(matches!(err, BuildError::DuplicateStage(name) if name == "a"));
}

#[test]
fn unknown_failure_stage_is_rejected() {
  let err = Pipeline::builder()
    .stage("a", NullStage)
    .route("a", Router::End)
    .entry("a")
    .failure_stage("ghost")
    .build()
    .unwrap_err();
  assert!(matches!(err, BuildError::UnknownFailureStage(name) if name == "ghost"));
}
