//! Prebuilt pipelines wired from the built-in stages.
//!
//! Use these instead of assembling equivalent graphs manually so the fixed
//! pipeline shapes stay declarative and easy to read.

use std::sync::Arc;

use crate::clients::{DocumentIndex, ModelClient, PageChecker, WebSearch};
use crate::error::BuildError;
use crate::pipeline::Pipeline;
use crate::router::{Predicate, Router};
use crate::stage::StageDescriptor;
use crate::stages::{
  AnswerStage, FinalizeStage, GenerateStage, GradeStage, PlanStage, RefineStage, ResearchStage,
  RetrieveStage, SummarizeStage, ValidateStage, WebSearchStage,
};
use crate::store::{FieldKind, Schema};

/// Content generation: plan → research → generate → validate ⇄ refine →
/// finalize.
///
/// The validate/refine loop re-enters at most `max_iterations` times, then
/// takes the success path regardless of the verdict. Finalize is also the
/// failure path, so a failed run still produces a closed-out record.
pub fn content_pipeline(
  model: Arc<dyn ModelClient>,
  index: Arc<dyn DocumentIndex>,
  checker: Arc<dyn PageChecker>,
  max_iterations: u32,
) -> Result<Pipeline, BuildError> {
  let schema = Schema::new()
    .field("request", FieldKind::String)
    .field("plan", FieldKind::String)
    .field("research", FieldKind::Array)
    .field("draft", FieldKind::String)
    .field("validation_report", FieldKind::Object)
    .field("validation_passed", FieldKind::Bool)
    .field("completed", FieldKind::Bool)
    .field("summary", FieldKind::String)
    .append_field("messages");

  Pipeline::builder()
    .stage_arc(
      StageDescriptor::new("plan").writes(&["plan", "messages"]),
      Arc::new(PlanStage::new(model.clone())),
    )
    .stage_arc(
      StageDescriptor::new("research").writes(&["research"]),
      Arc::new(ResearchStage::new(index)),
    )
    .stage_arc(
      StageDescriptor::new("generate").writes(&["draft", "messages"]),
      Arc::new(GenerateStage::new(model.clone())),
    )
    .stage_arc(
      StageDescriptor::new("validate").writes(&["validation_report", "validation_passed"]),
      Arc::new(ValidateStage::new(checker)),
    )
    .stage_arc(
      StageDescriptor::new("refine").writes(&["draft", "messages"]),
      Arc::new(RefineStage::new(model)),
    )
    .stage_arc(
      StageDescriptor::new("finalize").writes(&["completed", "summary"]),
      Arc::new(FinalizeStage::new()),
    )
    .route("plan", Router::To("research".to_string()))
    .route("research", Router::To("generate".to_string()))
    .route("generate", Router::To("validate".to_string()))
    .route(
      "validate",
      Router::Loop {
        pass_when: Predicate::Truthy("validation_passed".to_string()),
        on_pass: "finalize".to_string(),
        on_retry: "refine".to_string(),
      },
    )
    .route("refine", Router::To("validate".to_string()))
    .route("finalize", Router::End)
    .entry("plan")
    .failure_stage("finalize")
    .max_iterations(max_iterations)
    .schema(schema)
    .build()
}

/// Question answering: retrieve → grade → answer, falling back to
/// web_search → summarize when the evidence grades insufficient.
///
/// The fallback branch is one-shot: retrieved web results are never
/// re-graded, so run depth is constant regardless of the iteration bound.
pub fn answer_pipeline(
  model: Arc<dyn ModelClient>,
  index: Arc<dyn DocumentIndex>,
  search: Arc<dyn WebSearch>,
) -> Result<Pipeline, BuildError> {
  let schema = Schema::new()
    .field("question", FieldKind::String)
    .field("retrieved_docs", FieldKind::Array)
    .field("grade", FieldKind::String)
    .field("web_results", FieldKind::Array)
    .field("answer", FieldKind::String)
    .field("sources", FieldKind::Array);

  Pipeline::builder()
    .stage_arc(
      StageDescriptor::new("retrieve").writes(&["retrieved_docs"]),
      Arc::new(RetrieveStage::new(index)),
    )
    .stage_arc(
      StageDescriptor::new("grade").writes(&["grade"]),
      Arc::new(GradeStage::new(model.clone())),
    )
    .stage_arc(
      StageDescriptor::new("answer").writes(&["answer", "sources"]),
      Arc::new(AnswerStage::new(model.clone())),
    )
    .stage_arc(
      StageDescriptor::new("web_search").writes(&["web_results"]),
      Arc::new(WebSearchStage::new(search)),
    )
    .stage_arc(
      StageDescriptor::new("summarize").writes(&["answer", "sources"]),
      Arc::new(SummarizeStage::new(model)),
    )
    .route("retrieve", Router::To("grade".to_string()))
    .route(
      "grade",
      Router::Branch {
        when: Predicate::equals("grade", "sufficient"),
        then_to: "answer".to_string(),
        else_to: "web_search".to_string(),
      },
    )
    .route("answer", Router::End)
    .route("web_search", Router::To("summarize".to_string()))
    .route("summarize", Router::End)
    .entry("retrieve")
    .build()
}
