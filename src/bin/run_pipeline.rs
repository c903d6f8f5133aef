//! CLI: Run a built-in pipeline with canned collaborators.
//!
//! Streams progress events to stdout while the run executes, then writes the
//! terminal record and the run trace into the run directory.
//!
//! Usage: `run_pipeline [OPTIONS] <content|answer> <text>`
//! Example: run_pipeline answer "what changed in the 2021 report?"
//!
//! Set RUST_LOG=pipewright=trace for TRACE-level span enter/exit and events.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use pipewright::clients::{CannedChecker, CannedIndex, CannedModel, CannedSearch};
use pipewright::record_io::{RECORD_FILENAME, save_record};
use pipewright::trace_io::{TRACE_FILENAME, save_trace};
use pipewright::{FieldMap, Pipeline, Record, RunTrace, answer_pipeline, content_pipeline};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

const RUN_DIR: &str = ".pipewright";

/// Which built-in pipeline to run.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
  /// plan → research → generate → validate ⇄ refine → finalize
  Content,
  /// retrieve → grade → answer | web_search → summarize
  Answer,
}

/// Run a built-in pipeline with canned collaborators.
#[derive(Parser, Debug)]
#[command(name = "run_pipeline")]
#[command(after_help = r#"Examples:
  run_pipeline content "signup landing page with a footer"
  run_pipeline --max-iterations 5 content "signup landing page"
  run_pipeline answer "what changed in the 2021 report?""#)]
struct Args {
  /// Directory for record.json and trace.json. Default: .pipewright
  #[arg(long, value_name = "DIR", default_value = RUN_DIR)]
  run_dir: PathBuf,

  /// Bound on validate/refine re-entries (content pipeline only).
  #[arg(long, value_name = "N", default_value_t = 3)]
  max_iterations: u32,

  /// Pipeline to run
  #[arg(value_enum)]
  mode: Mode,

  /// Request (content) or question (answer) seeding the record
  #[arg(value_name = "text")]
  text: String,
}

/// Content pipeline with collaborators scripted so the first draft fails
/// validation once and the refined draft passes.
fn demo_content_pipeline(max_iterations: u32) -> Result<Pipeline, pipewright::BuildError> {
  let model = Arc::new(
    CannedModel::new("ok")
      .rule("Plan the content", "1. hero section\n2. signup form\n3. footer")
      .rule("Generate the content", "<html><header>hero</header><form/></html>")
      .rule(
        "Refine the draft",
        "<html><header>hero</header><form/><footer>contact</footer></html>",
      ),
  );
  let index = Arc::new(
    CannedIndex::new()
      .doc("brand.md", "hero section uses the primary palette")
      .doc("forms.md", "signup form field reference"),
  );
  let checker = Arc::new(CannedChecker::new().require("<footer>"));
  content_pipeline(model, index, checker, max_iterations)
}

/// Answer pipeline over a small canned corpus with a web fallback.
fn demo_answer_pipeline() -> Result<Pipeline, pipewright::BuildError> {
  let model = Arc::new(
    CannedModel::new("No evidence either way.")
      .rule("Grade the evidence", "sufficient")
      .rule("Answer the question", "Hiring grew 12% and attrition fell.")
      .rule("Summarize these search results", "The web results answer the question."),
  );
  let index = Arc::new(
    CannedIndex::new()
      .doc("2021-report.pdf", "In the 2021 report hiring grew 12%")
      .doc("2022-report.pdf", "In the 2022 report attrition fell"),
  );
  let search = Arc::new(CannedSearch::new());
  answer_pipeline(model, index, search)
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    .init();

  info!("run_pipeline starting");
  let args = Args::parse();

  let (pipeline, seed) = match args.mode {
    Mode::Content => {
      let seed = Record::seed(FieldMap::new()).with_field("request", json!(args.text.clone()));
      (demo_content_pipeline(args.max_iterations), seed)
    }
    Mode::Answer => {
      let seed = Record::seed(FieldMap::new()).with_field("question", json!(args.text.clone()));
      (demo_answer_pipeline(), seed)
    }
  };
  let pipeline = match pipeline {
    Ok(p) => p,
    Err(e) => {
      eprintln!("Pipeline configuration error: {}", e);
      process::exit(1);
    }
  };

  let (tx, mut rx) = mpsc::channel(16);
  let engine = {
    let pipeline = pipeline.clone();
    tokio::spawn(async move { pipeline.run_with_events(seed, tx).await })
  };

  let mut events = vec![];
  while let Some(event) = rx.recv().await {
    println!("[{}] {} {}", event.timestamp.format("%H:%M:%S%.3f"), event.kind, event.stage);
    if let Some(reason) = &event.reason {
      println!("        reason: {}", reason);
    }
    events.push(event);
  }
  let record = match engine.await {
    Ok(r) => r,
    Err(e) => {
      eprintln!("Engine task failed: {}", e);
      process::exit(1);
    }
  };

  let record_path = args.run_dir.join(RECORD_FILENAME);
  if let Err(e) = save_record(&record_path, &record) {
    eprintln!("Error writing {}: {}", record_path.display(), e);
    process::exit(1);
  }
  let trace = RunTrace::from_events(&events);
  let trace_path = args.run_dir.join(TRACE_FILENAME);
  if let Err(e) = save_trace(&trace_path, &trace) {
    eprintln!("Error writing {}: {}", trace_path.display(), e);
    process::exit(1);
  }

  info!(status = %trace.final_status, record = %record_path.display(), "pipeline completed");
  println!("Pipeline completed.");
  println!("  Status: {}", trace.final_status);
  println!("  Iterations: {}", record.iteration);
  println!("  Record: {}", record_path.display());
  println!("  Trace: {}", trace_path.display());
  if record.error.is_some() {
    process::exit(1);
  }
}
