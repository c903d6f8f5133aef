//! Pipeline construction: stages, routes, and fail-fast validation.
//!
//! A malformed graph (missing entry, dangling route, duplicate stage) is
//! rejected here, before any execution. Successful construction resolves
//! every route target to a stage index, so the running engine dispatches by
//! index rather than by string lookup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::BuildError;
use crate::router::Router;
use crate::stage::{Stage, StageDescriptor};
use crate::store::Schema;

/// Default bound on re-entrant edge traversals per run.
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// One registered stage with its resolved route.
pub(crate) struct StageEntry {
  pub(crate) descriptor: StageDescriptor,
  pub(crate) stage: Arc<dyn Stage>,
  pub(crate) router: Router<usize>,
}

pub(crate) struct PipelineInner {
  pub(crate) stages: Vec<StageEntry>,
  pub(crate) entry: usize,
  pub(crate) failure: Option<usize>,
  pub(crate) max_iterations: u32,
  pub(crate) schema: Schema,
}

/// A validated, immutable stage graph. Cheap to clone; one `Pipeline` can
/// serve many concurrent invocations, each with its own record and events.
#[derive(Clone)]
pub struct Pipeline {
  pub(crate) inner: Arc<PipelineInner>,
}

impl std::fmt::Debug for Pipeline {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pipeline")
      .field("stages", &self.stage_names())
      .field("max_iterations", &self.inner.max_iterations)
      .finish()
  }
}

impl Pipeline {
  pub fn builder() -> PipelineBuilder {
    PipelineBuilder::new()
  }

  /// Names of the registered stages, in registration order.
  pub fn stage_names(&self) -> Vec<&str> {
    self
      .inner
      .stages
      .iter()
      .map(|e| e.descriptor.name.as_str())
      .collect()
  }

  pub fn max_iterations(&self) -> u32 {
    self.inner.max_iterations
  }
}

/// Collects stages, routes, entry/failure configuration, and the merge
/// schema; `build()` validates the whole graph.
#[derive(Default)]
pub struct PipelineBuilder {
  stages: Vec<(StageDescriptor, Arc<dyn Stage>)>,
  routes: HashMap<String, Router>,
  entry: Option<String>,
  failure_stage: Option<String>,
  max_iterations: Option<u32>,
  schema: Schema,
}

impl PipelineBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a stage under the given name.
  pub fn stage(self, name: impl Into<String>, stage: impl Stage + 'static) -> Self {
    self.stage_arc(StageDescriptor::new(name), Arc::new(stage))
  }

  /// Registers an already-shared stage with a full descriptor.
  pub fn stage_arc(mut self, descriptor: StageDescriptor, stage: Arc<dyn Stage>) -> Self {
    self.stages.push((descriptor, stage));
    self
  }

  /// Sets the route evaluated after the named stage completes.
  pub fn route(mut self, name: impl Into<String>, router: Router) -> Self {
    self.routes.insert(name.into(), router);
    self
  }

  pub fn entry(mut self, name: impl Into<String>) -> Self {
    self.entry = Some(name.into());
    self
  }

  /// Stage to divert to when a stage fails (e.g. finalize-with-error).
  pub fn failure_stage(mut self, name: impl Into<String>) -> Self {
    self.failure_stage = Some(name.into());
    self
  }

  pub fn max_iterations(mut self, bound: u32) -> Self {
    self.max_iterations = Some(bound);
    self
  }

  pub fn schema(mut self, schema: Schema) -> Self {
    self.schema = schema;
    self
  }

  /// Validates the graph and resolves routes to stage indices.
  #[instrument(level = "trace", skip(self))]
  pub fn build(self) -> Result<Pipeline, BuildError> {
    if self.stages.is_empty() {
      return Err(BuildError::Empty);
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, (descriptor, _)) in self.stages.iter().enumerate() {
      if index.insert(descriptor.name.clone(), i).is_some() {
        return Err(BuildError::DuplicateStage(descriptor.name.clone()));
      }
    }

    for name in self.routes.keys() {
      if !index.contains_key(name) {
        return Err(BuildError::OrphanRoute(name.clone()));
      }
    }

    let entry_name = self.entry.ok_or(BuildError::MissingEntry)?;
    let entry = *index
      .get(&entry_name)
      .ok_or(BuildError::UnknownEntry(entry_name))?;

    let failure = match &self.failure_stage {
      Some(name) => Some(
        *index
          .get(name)
          .ok_or_else(|| BuildError::UnknownFailureStage(name.clone()))?,
      ),
      None => None,
    };

    let mut stages = Vec::with_capacity(self.stages.len());
    for (descriptor, stage) in self.stages {
      let router = self
        .routes
        .get(&descriptor.name)
        .ok_or_else(|| BuildError::MissingRoute(descriptor.name.clone()))?;
      let router = router
        .resolved(|name| index.get(name).copied())
        .map_err(|to| BuildError::DanglingRoute {
          from: descriptor.name.clone(),
          to: to.clone(),
        })?;
      stages.push(StageEntry {
        descriptor,
        stage,
        router,
      });
    }

    info!(
      stage_count = stages.len(),
      entry = entry,
      "pipeline graph validated"
    );
    Ok(Pipeline {
      inner: Arc::new(PipelineInner {
        stages,
        entry,
        failure,
        max_iterations: self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
        schema: self.schema,
      }),
    })
  }
}
