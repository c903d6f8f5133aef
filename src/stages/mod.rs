//! Leaf stage adapters for the two built-in pipelines.
//!
//! Content generation: plan → research → generate → validate ⇄ refine →
//! finalize. Question answering: retrieve → grade → answer, with the
//! web-search fallback when the graded evidence is insufficient.
//!
//! Each stage reads record fields, talks to its injected collaborator, and
//! returns a partial update; none of them touch the engine.

mod answer;
mod finalize;
mod generate;
mod grade;
#[cfg(test)]
mod grade_test;
mod plan;
#[cfg(test)]
mod plan_test;
mod research;
mod retrieve;
mod refine;
#[cfg(test)]
mod refine_test;
mod summarize;
mod validate;
mod web_search;

pub use answer::AnswerStage;
pub use finalize::FinalizeStage;
pub use generate::GenerateStage;
pub use grade::GradeStage;
pub use plan::PlanStage;
pub use refine::RefineStage;
pub use research::ResearchStage;
pub use retrieve::RetrieveStage;
pub use summarize::SummarizeStage;
pub use validate::ValidateStage;
pub use web_search::WebSearchStage;
