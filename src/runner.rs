//! The execution engine: drives one invocation of a pipeline to a terminal
//! record.
//!
//! Stages run strictly sequentially; each stage's merged update is the input
//! to the router that picks the next stage. Stage failures are caught here,
//! normalized into the record's `error` field, and diverted to the failure
//! path when one is configured. Every run ends in a terminal record; no
//! path hangs or unwinds past this loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{CANCELLED_REASON, StageError};
use crate::pipeline::Pipeline;
use crate::router::RouteDecision;
use crate::store::RecordStore;
use crate::types::{FieldMap, ProgressEvent, Record};

/// Hard bound on stage invocations per run. Routed loops are already
/// budget-bounded; this valve keeps a misconfigured cyclic graph from
/// hanging.
pub const MAX_STEPS: u32 = 1000;

/// Buffered events before a slow observer blocks the engine.
const EVENT_BUFFER: usize = 16;

/// Cooperative cancellation handle, checked between stage boundaries only.
/// An in-flight stage call completes before the engine notices.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
  flag: Arc<AtomicBool>,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.flag.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::SeqCst)
  }
}

/// Sends to the observer when one is attached. A full buffer blocks the
/// engine rather than dropping: observers rely on a complete trace.
async fn emit(events: &Option<mpsc::Sender<ProgressEvent>>, event: ProgressEvent) {
  if let Some(tx) = events {
    let _ = tx.send(event).await;
  }
}

impl Pipeline {
  /// Runs the pipeline to completion and returns the terminal record.
  /// Never panics on stage failure: a failed run resolves to a terminal
  /// record with `error` populated.
  pub async fn run(&self, seed: Record) -> Record {
    self.run_inner(seed, None, None).await
  }

  /// Like [run](Pipeline::run), with cooperative cancellation between stage
  /// boundaries.
  pub async fn run_with_cancel(&self, seed: Record, cancel: CancelToken) -> Record {
    self.run_inner(seed, None, Some(cancel)).await
  }

  /// Runs the pipeline, sending every progress event into `events`, and
  /// returns the terminal record. Useful when the caller needs both the
  /// live event feed and the record (e.g. an exporter).
  pub async fn run_with_events(
    &self,
    seed: Record,
    events: mpsc::Sender<ProgressEvent>,
  ) -> Record {
    self.run_inner(seed, Some(events), None).await
  }

  /// Runs the pipeline as a lazy progress-event stream: nothing executes
  /// until the stream is first polled, and each call is a fresh invocation
  /// over a fresh record. The final `terminal` event carries the full field
  /// snapshot of the terminal record.
  pub fn stream(&self, seed: Record) -> impl Stream<Item = ProgressEvent> + Send + 'static {
    self.stream_with_cancel(seed, CancelToken::new())
  }

  /// Like [stream](Pipeline::stream), with cooperative cancellation.
  pub fn stream_with_cancel(
    &self,
    seed: Record,
    cancel: CancelToken,
  ) -> impl Stream<Item = ProgressEvent> + Send + 'static {
    let pipeline = self.clone();
    async_stream::stream! {
      let (tx, rx) = mpsc::channel(EVENT_BUFFER);
      let task = tokio::spawn(async move {
        pipeline.run_inner(seed, Some(tx), Some(cancel)).await
      });
      let mut events = ReceiverStream::new(rx);
      while let Some(event) = events.next().await {
        yield event;
      }
      let _ = task.await;
    }
  }

  async fn run_inner(
    &self,
    seed: Record,
    events: Option<mpsc::Sender<ProgressEvent>>,
    cancel: Option<CancelToken>,
  ) -> Record {
    let run_id = Uuid::new_v4();
    let inner = &self.inner;
    let mut store = RecordStore::new(seed, inner.schema.clone());
    {
      let record = store.record_mut();
      record.max_iterations = inner.max_iterations;
      record.terminal = false;
      record.current_stage = Some(inner.stages[inner.entry].descriptor.name.clone());
    }

    let mut current = inner.entry;
    let mut failure_taken = false;
    let mut steps: u32 = 0;

    loop {
      let stage_name = inner.stages[current].descriptor.name.clone();

      if cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
        info!(run_id = %run_id, stage = %stage_name, "run cancelled between stages");
        let record = store.record_mut();
        record.error = Some(CANCELLED_REASON.to_string());
        record.terminal = true;
        record.current_stage = None;
        emit(&events, ProgressEvent::error(run_id, &stage_name, CANCELLED_REASON)).await;
        let snapshot = store.record().fields.clone();
        emit(&events, ProgressEvent::terminal(run_id, &stage_name, snapshot)).await;
        return store.into_record();
      }

      if steps >= MAX_STEPS {
        warn!(run_id = %run_id, steps, "step valve tripped, terminating run");
        let reason = format!("stage budget exceeded after {} invocations", steps);
        let record = store.record_mut();
        record.error = Some(reason.clone());
        record.terminal = true;
        record.current_stage = None;
        emit(&events, ProgressEvent::error(run_id, &stage_name, reason)).await;
        let snapshot = store.record().fields.clone();
        emit(&events, ProgressEvent::terminal(run_id, &stage_name, snapshot)).await;
        return store.into_record();
      }
      steps += 1;

      info!(run_id = %run_id, stage = %stage_name, step = steps, "running stage");
      emit(&events, ProgressEvent::started(run_id, &stage_name)).await;

      let failure = match inner.stages[current].stage.process(store.record()).await {
        Ok(update) => {
          let changed_keys: Vec<String> = update.fields.keys().cloned().collect();
          match store.merge(update) {
            Ok(record) => {
              let mut changed = FieldMap::new();
              for key in changed_keys {
                if let Some(value) = record.fields.get(&key) {
                  changed.insert(key, value.clone());
                }
              }
              emit(&events, ProgressEvent::completed(run_id, &stage_name, changed)).await;
              None
            }
            Err(violation) => Some(StageError::from(violation).to_string()),
          }
        }
        Err(e) => Some(e.to_string()),
      };

      if let Some(reason) = failure {
        warn!(run_id = %run_id, stage = %stage_name, reason = %reason, "stage failed");
        store.record_mut().error = Some(reason.clone());
        emit(&events, ProgressEvent::error(run_id, &stage_name, reason)).await;
        match inner.failure {
          Some(failure_idx) if !failure_taken && failure_idx != current => {
            failure_taken = true;
            store.record_mut().current_stage =
              Some(inner.stages[failure_idx].descriptor.name.clone());
            current = failure_idx;
            continue;
          }
          _ => {
            let record = store.record_mut();
            record.terminal = true;
            record.current_stage = None;
            let snapshot = store.record().fields.clone();
            emit(&events, ProgressEvent::terminal(run_id, &stage_name, snapshot)).await;
            return store.into_record();
          }
        }
      }

      match inner.stages[current].router.decide(store.record()) {
        RouteDecision::Done => {
          let record = store.record_mut();
          record.terminal = true;
          record.current_stage = None;
          info!(run_id = %run_id, stage = %stage_name, steps, "run complete");
          let snapshot = store.record().fields.clone();
          emit(&events, ProgressEvent::terminal(run_id, &stage_name, snapshot)).await;
          return store.into_record();
        }
        RouteDecision::Next(next) => {
          store.record_mut().current_stage = Some(inner.stages[next].descriptor.name.clone());
          current = next;
        }
        RouteDecision::Reenter(next) => {
          let record = store.record_mut();
          record.iteration += 1;
          record.current_stage = Some(inner.stages[next].descriptor.name.clone());
          info!(run_id = %run_id, iteration = record.iteration, "re-entrant edge taken");
          current = next;
        }
      }
    }
  }
}
