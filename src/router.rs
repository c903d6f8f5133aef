//! Route selection: pure decision functions from the post-merge record.
//!
//! Routers are declarative so construction can check every referenced stage
//! up front; `decide` is deterministic given the record, which keeps runs
//! replayable. Callers write routes over stage names; `build()` resolves
//! them to stage indices so the engine never dispatches by string.

use std::fmt::Display;

use serde_json::Value;
use tracing::{info, instrument};

use crate::types::Record;

/// Condition evaluated over the post-merge record.
#[derive(Debug, Clone)]
pub enum Predicate {
  /// Field is boolean `true`.
  Truthy(String),
  /// Field equals the given value.
  Equals { field: String, value: Value },
}

impl Predicate {
  /// Convenience for the common string-equality shape.
  pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
    Predicate::Equals {
      field: field.into(),
      value: value.into(),
    }
  }

  #[instrument(level = "trace", skip(self, record))]
  pub fn holds(&self, record: &Record) -> bool {
    match self {
      Predicate::Truthy(field) => record.bool_field(field).unwrap_or(false),
      Predicate::Equals { field, value } => record.get(field) == Some(value),
    }
  }
}

/// Next-stage decision for one stage, evaluated after its merge lands.
///
/// `T` is the stage reference type: names when the caller declares routes,
/// resolved indices once the pipeline is built.
#[derive(Debug, Clone)]
pub enum Router<T = String> {
  /// Terminal sink: the run is done after this stage.
  End,
  /// Unconditional edge.
  To(T),
  /// One-shot binary branch (e.g. sufficient → answer, else fallback).
  Branch {
    when: Predicate,
    then_to: T,
    else_to: T,
  },
  /// Bounded refinement loop. `on_retry` is the re-entrant edge; the
  /// iteration-budget check takes precedence over the predicate, and budget
  /// exhaustion forces the success path rather than failing.
  Loop {
    pass_when: Predicate,
    on_pass: T,
    on_retry: T,
  },
}

/// Outcome of routing: where the engine goes next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision<T = String> {
  /// No further stage; the record becomes terminal.
  Done,
  /// Proceed to the referenced stage.
  Next(T),
  /// Traverse a re-entrant edge; the engine increments `iteration`.
  Reenter(T),
}

impl<T> Router<T> {
  /// Stage references this router can select, for construction-time checking.
  pub fn targets(&self) -> Vec<&T> {
    match self {
      Router::End => vec![],
      Router::To(next) => vec![next],
      Router::Branch { then_to, else_to, .. } => vec![then_to, else_to],
      Router::Loop { on_pass, on_retry, .. } => vec![on_pass, on_retry],
    }
  }

  /// Maps stage references through `resolve`, failing on the first target it
  /// cannot resolve.
  pub(crate) fn resolved<U>(&self, mut resolve: impl FnMut(&T) -> Option<U>) -> Result<Router<U>, &T> {
    Ok(match self {
      Router::End => Router::End,
      Router::To(next) => Router::To(resolve(next).ok_or(next)?),
      Router::Branch { when, then_to, else_to } => Router::Branch {
        when: when.clone(),
        then_to: resolve(then_to).ok_or(then_to)?,
        else_to: resolve(else_to).ok_or(else_to)?,
      },
      Router::Loop { pass_when, on_pass, on_retry } => Router::Loop {
        pass_when: pass_when.clone(),
        on_pass: resolve(on_pass).ok_or(on_pass)?,
        on_retry: resolve(on_retry).ok_or(on_retry)?,
      },
    })
  }
}

impl<T: Clone + Display> Router<T> {
  /// Picks the next stage from the post-merge record. Pure: no side effects,
  /// no I/O, deterministic given the record.
  #[instrument(level = "trace", skip(self, record))]
  pub fn decide(&self, record: &Record) -> RouteDecision<T> {
    match self {
      Router::End => RouteDecision::Done,
      Router::To(next) => RouteDecision::Next(next.clone()),
      Router::Branch { when, then_to, else_to } => {
        if when.holds(record) {
          RouteDecision::Next(then_to.clone())
        } else {
          RouteDecision::Next(else_to.clone())
        }
      }
      Router::Loop { pass_when, on_pass, on_retry } => {
        if record.iteration >= record.max_iterations {
          info!(
            iteration = record.iteration,
            max_iterations = record.max_iterations,
            on_pass = %on_pass,
            "refinement budget exhausted, taking success path"
          );
          return RouteDecision::Next(on_pass.clone());
        }
        if pass_when.holds(record) {
          RouteDecision::Next(on_pass.clone())
        } else {
          RouteDecision::Reenter(on_retry.clone())
        }
      }
    }
  }
}
