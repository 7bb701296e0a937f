//! One tick of the periodic generation cycle.
//!
//! A cycle either starts a new thread or replies to one of the most recently
//! active ordinary threads, newer threads being likelier picks. After a
//! reply the thread may also be sent to the judge.

use agora_core::{
  forum::{Thread, ThreadQuery},
  store::ForumStore,
};
use agora_llm::Completion;
use rand::{
  Rng,
  distributions::{Distribution, WeightedIndex},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{Engine, Error, Result};

/// What a cycle did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CycleAction {
  CreatedThread { thread_id: Uuid, slug: String, posts: usize },
  Replied { thread_id: Uuid, post_id: Uuid },
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
  #[serde(flatten)]
  pub action:    CycleAction,
  /// Whether the thread replied to was also judged.
  pub evaluated: bool,
}

/// Weights `n, n-1, .., 1` for `n` threads ordered newest first.
fn recency_weights(n: usize) -> Vec<usize> { (1..=n).rev().collect() }

/// A configured chance as a valid probability. Non-finite values count as
/// never.
fn chance(p: f64) -> f64 {
  if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 }
}

impl<S, C> Engine<S, C>
where
  S: ForumStore,
  C: Completion,
{
  pub async fn run_cycle(&self) -> Result<CycleReport> {
    let config = &self.config.cron;
    let recent: Vec<Thread> = self
      .store
      .list_threads(&ThreadQuery {
        is_debate: Some(false),
        limit: Some(config.recent_threads.max(1)),
        ..ThreadQuery::default()
      })
      .await
      .map_err(Error::store)?;

    let start_new = recent.is_empty()
      || self.with_rng(|rng| rng.gen_bool(chance(config.new_thread_weight)));
    if start_new {
      let outcome = self.generate_thread().await?;
      tracing::info!(thread = %outcome.thread.slug, "cycle started a thread");
      return Ok(CycleReport {
        action:    CycleAction::CreatedThread {
          thread_id: outcome.thread.thread_id,
          slug:      outcome.thread.slug,
          posts:     outcome.posts.len(),
        },
        evaluated: false,
      });
    }

    let index = self.with_rng(|rng| {
      WeightedIndex::new(recency_weights(recent.len()))
        .map(|weights| weights.sample(rng))
        .unwrap_or(0)
    });
    let thread = &recent[index.min(recent.len() - 1)];

    let post = self.reply_to_thread(thread.thread_id).await?;
    let post_count = thread.post_count + 1;

    let evaluated = post_count >= config.evaluation_min_posts
      && self.with_rng(|rng| rng.gen_bool(chance(config.evaluation_chance)));
    let evaluated = evaluated
      && match self.evaluate_thread(thread.thread_id).await {
        Ok(_) => true,
        Err(e) => {
          tracing::warn!(thread = %thread.slug, error = %e, "cycle evaluation failed");
          false
        }
      };

    Ok(CycleReport {
      action: CycleAction::Replied {
        thread_id: thread.thread_id,
        post_id:   post.post_id,
      },
      evaluated,
    })
  }
}
