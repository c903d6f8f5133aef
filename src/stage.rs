//! The uniform contract every pipeline stage implements.

use async_trait::async_trait;

use crate::error::StageError;
use crate::types::{Record, StageUpdate};

/// A named unit of work in the pipeline.
///
/// Stages are stateless between invocations: they receive a read view of the
/// record and return a proposed partial update, never a mutated reference.
/// Any I/O a stage needs (model call, search, browser) is private to its
/// implementation and invisible to the engine.
#[async_trait]
pub trait Stage: Send + Sync {
  async fn process(&self, record: &Record) -> Result<StageUpdate, StageError>;
}

/// Registration-time description of one stage.
#[derive(Debug, Clone)]
pub struct StageDescriptor {
  /// Name used in routes and progress events.
  pub name: String,
  /// Fields this stage is expected to write. Advisory: enforced by
  /// convention and tests, not by the engine.
  pub writes: Vec<String>,
}

impl StageDescriptor {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      writes: vec![],
    }
  }

  pub fn writes(mut self, fields: &[&str]) -> Self {
    self.writes = fields.iter().map(|f| f.to_string()).collect();
    self
  }
}
