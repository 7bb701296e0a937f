//! The orchestration core of Agora.
//!
//! [`Engine`] drives every piece of generated content: it picks topics that
//! have not been used before, asks personas for posts, assembles threads and
//! debates, finalises debates from visitor votes, and runs the admin judge.
//! It talks to the database only through [`ForumStore`] and to language
//! models only through [`Completion`], so both can be swapped for test
//! doubles.
//!
//! Every operation is sequential: each completion is awaited before the next
//! one starts, and each post is persisted before the next prompt is built
//! from the thread.

#![allow(async_fn_in_trait)]

pub mod config;
pub mod cron;
pub mod error;
pub mod evaluator;
pub mod fallback;
pub mod orchestrator;
pub mod posts;
pub mod text;
pub mod topics;

mod prompts;

#[cfg(test)]
mod tests;

use std::sync::{Arc, Mutex, PoisonError};

use agora_core::{
  debate::Debate,
  forum::{Post, Thread},
  persona::Persona,
  store::ForumStore,
};
use agora_llm::Completion;
use rand::{SeedableRng, rngs::StdRng};
use uuid::Uuid;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use fallback::{FallbackPolicy, FirstAvailable};

/// Orchestrates generation over a store `S` and a completion backend `C`.
pub struct Engine<S, C> {
  store:    Arc<S>,
  llm:      Arc<C>,
  config:   EngineConfig,
  fallback: Arc<dyn FallbackPolicy>,
  rng:      Mutex<StdRng>,
}

impl<S, C> Engine<S, C>
where
  S: ForumStore,
  C: Completion,
{
  pub fn new(store: Arc<S>, llm: Arc<C>, config: EngineConfig) -> Self {
    let rng = match config.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };
    Self {
      store,
      llm,
      config,
      fallback: Arc::new(FirstAvailable),
      rng: Mutex::new(rng),
    }
  }

  /// Replace the default [`FirstAvailable`] fallback policy.
  pub fn with_fallback(mut self, fallback: Arc<dyn FallbackPolicy>) -> Self {
    self.fallback = fallback;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn config(&self) -> &EngineConfig { &self.config }

  /// Run `f` with the engine's random source. The lock is never held across
  /// an await point.
  fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
    let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut rng)
  }

  // ─── Lookups ───────────────────────────────────────────────────────────────

  async fn active_personas(&self) -> Result<Vec<Persona>> {
    self.store.list_personas(true).await.map_err(Error::store)
  }

  async fn require_persona(&self, id: Uuid) -> Result<Persona> {
    self
      .store
      .get_persona(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| agora_core::Error::PersonaNotFound(id.to_string()).into())
  }

  async fn require_thread(&self, id: Uuid) -> Result<Thread> {
    self
      .store
      .get_thread(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| agora_core::Error::ThreadNotFound(id).into())
  }

  async fn require_debate(&self, id: Uuid) -> Result<Debate> {
    self
      .store
      .get_debate(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| agora_core::Error::DebateNotFound(id).into())
  }

  async fn thread_posts(&self, thread_id: Uuid) -> Result<Vec<Post>> {
    self
      .store
      .list_thread_posts(thread_id)
      .await
      .map_err(Error::store)
  }
}
