//! Collaborator seams: the external services stages talk to.
//!
//! The engine never sees these; stages receive them as constructor arguments
//! (no ambient globals) and keep whatever I/O they do private. The canned
//! implementations back the demo binary and the tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// A chunk retrieved from the document index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDoc {
  pub source: String,
  pub content: String,
}

/// One web search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
  pub url: String,
  pub title: String,
  pub content: String,
}

/// Result of checking a generated page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
  pub passed: bool,
  pub problems: Vec<String>,
}

/// Text-completion model.
#[async_trait]
pub trait ModelClient: Send + Sync {
  async fn complete(&self, prompt: &str) -> Result<String, ClientError>;
}

/// Similarity search over an indexed document corpus.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
  async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDoc>, ClientError>;
}

/// Live web search, the fallback evidence source.
#[async_trait]
pub trait WebSearch: Send + Sync {
  async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ClientError>;
}

/// Renders and checks a generated page (browser-backed in production).
#[async_trait]
pub trait PageChecker: Send + Sync {
  async fn check(&self, html: &str) -> Result<CheckReport, ClientError>;
}

/// Canned model: answers from a prefix table, with a fixed fallback reply.
///
/// The first rule whose prefix starts the prompt wins, so demos can script
/// per-stage replies by prompt shape.
#[derive(Debug, Clone, Default)]
pub struct CannedModel {
  rules: Vec<(String, String)>,
  fallback: String,
}

impl CannedModel {
  pub fn new(fallback: impl Into<String>) -> Self {
    Self {
      rules: vec![],
      fallback: fallback.into(),
    }
  }

  pub fn rule(mut self, prompt_prefix: impl Into<String>, reply: impl Into<String>) -> Self {
    self.rules.push((prompt_prefix.into(), reply.into()));
    self
  }
}

#[async_trait]
impl ModelClient for CannedModel {
  async fn complete(&self, prompt: &str) -> Result<String, ClientError> {
    for (prefix, reply) in &self.rules {
      if prompt.starts_with(prefix.as_str()) {
        return Ok(reply.clone());
      }
    }
    Ok(self.fallback.clone())
  }
}

/// Canned index: returns documents whose content shares a word with the
/// query, capped at `k`.
#[derive(Debug, Clone, Default)]
pub struct CannedIndex {
  docs: Vec<RetrievedDoc>,
}

impl CannedIndex {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn doc(mut self, source: impl Into<String>, content: impl Into<String>) -> Self {
    self.docs.push(RetrievedDoc {
      source: source.into(),
      content: content.into(),
    });
    self
  }
}

#[async_trait]
impl DocumentIndex for CannedIndex {
  async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDoc>, ClientError> {
    let query = query.to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();
    let hits = self
      .docs
      .iter()
      .filter(|d| {
        let content = d.content.to_lowercase();
        words.iter().any(|w| content.contains(w))
      })
      .take(k)
      .cloned()
      .collect();
    Ok(hits)
  }
}

/// Canned web search: fixed hits per exact query, empty otherwise.
#[derive(Debug, Clone, Default)]
pub struct CannedSearch {
  hits: HashMap<String, Vec<SearchHit>>,
}

impl CannedSearch {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn hit(
    mut self,
    query: impl Into<String>,
    url: impl Into<String>,
    title: impl Into<String>,
    content: impl Into<String>,
  ) -> Self {
    self.hits.entry(query.into()).or_default().push(SearchHit {
      url: url.into(),
      title: title.into(),
      content: content.into(),
    });
    self
  }
}

#[async_trait]
impl WebSearch for CannedSearch {
  async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ClientError> {
    Ok(self.hits.get(query).cloned().unwrap_or_default())
  }
}

/// Canned page checker: passes when every required snippet appears in the
/// page, reporting the missing ones otherwise.
#[derive(Debug, Clone, Default)]
pub struct CannedChecker {
  required: Vec<String>,
}

impl CannedChecker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn require(mut self, snippet: impl Into<String>) -> Self {
    self.required.push(snippet.into());
    self
  }
}

#[async_trait]
impl PageChecker for CannedChecker {
  async fn check(&self, html: &str) -> Result<CheckReport, ClientError> {
    let problems: Vec<String> = self
      .required
      .iter()
      .filter(|s| !html.contains(s.as_str()))
      .map(|s| format!("missing required snippet: {}", s))
      .collect();
    Ok(CheckReport {
      passed: problems.is_empty(),
      problems,
    })
  }
}
