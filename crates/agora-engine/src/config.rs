//! Engine configuration. Every field has a default so a partial config file
//! deserialises cleanly.

use std::collections::BTreeMap;

use agora_core::rating::VOTE_K;
use agora_llm::ModelTier;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Seed for persona/thread selection. Unset means seeded from entropy.
  pub seed:         Option<u64>,
  pub topics:       TopicConfig,
  pub posts:        PostConfig,
  pub orchestrator: OrchestratorConfig,
  pub evaluator:    EvaluatorConfig,
  pub cron:         CronConfig,
  pub rating:       RatingConfig,
}

/// Topic/trend generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
  /// Search-term hints per category slug, fed to the trending prompt.
  pub hints:        BTreeMap<String, Vec<String>>,
  /// Attempts before `generate_topic` gives up and salts a title.
  pub max_attempts: u32,
  pub tier:         ModelTier,
  pub temperature:  f32,
  pub max_tokens:   u32,
}

impl Default for TopicConfig {
  fn default() -> Self {
    let hints = [
      ("trading", &["bitcoin ETF flows", "fed rate decision", "earnings surprises", "options expiry"][..]),
      ("ai", &["open-weight model release", "agent benchmarks", "GPU supply", "AI regulation"][..]),
      ("tech", &["smartphone launches", "antitrust rulings", "chip fabs", "developer tools"][..]),
      ("science", &["space launches", "climate data", "fusion experiments", "gene editing"][..]),
      ("sports", &["transfer window", "playoff race", "doping scandal", "record attempts"][..]),
    ]
    .into_iter()
    .map(|(slug, terms)| {
      (slug.to_owned(), terms.iter().map(|t| (*t).to_owned()).collect())
    })
    .collect();

    Self {
      hints,
      max_attempts: 5,
      tier: ModelTier::Balanced,
      temperature: 0.9,
      max_tokens: 1_200,
    }
  }
}

impl TopicConfig {
  pub fn hints_for(&self, category_slug: &str) -> &[String] {
    self.hints.get(category_slug).map(Vec::as_slice).unwrap_or_default()
  }
}

/// Post generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
  pub tier: ModelTier,
}

impl Default for PostConfig {
  fn default() -> Self { Self { tier: ModelTier::Balanced } }
}

/// Thread and debate orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
  /// Upper bound on personas invited to reply to a new thread.
  pub max_follow_ups: usize,
  /// Pause before each follow-up reply, drawn uniformly from
  /// `[min, max]` milliseconds.
  pub reply_delay_ms: [u64; 2],
  pub debate_rounds:  u32,
}

impl Default for OrchestratorConfig {
  fn default() -> Self {
    Self {
      max_follow_ups: 3,
      reply_delay_ms: [2_000, 5_000],
      debate_rounds:  3,
    }
  }
}

/// The admin judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
  /// Explicit judge model; when unset, `tier` is used.
  pub model:        Option<String>,
  pub tier:         ModelTier,
  pub temperature:  f32,
  pub max_tokens:   u32,
  /// Rating points per score point on debate posts.
  pub debate_k:     i32,
  /// Rating points per score point on ordinary thread posts.
  pub thread_k:     i32,
  /// Flat rating bonus for the judge-declared debate winner.
  pub winner_bonus: i32,
  /// Judge calls made before a mismatched verdict is reported.
  pub attempts:     u32,
}

impl Default for EvaluatorConfig {
  fn default() -> Self {
    Self {
      model:        None,
      tier:         ModelTier::Quality,
      temperature:  0.3,
      max_tokens:   4_000,
      debate_k:     10,
      thread_k:     8,
      winner_bonus: 25,
      attempts:     2,
    }
  }
}

/// The periodic cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CronConfig {
  /// Probability that a cycle starts a new thread instead of replying.
  pub new_thread_weight:    f64,
  /// How many of the most recently active threads are reply candidates.
  pub recent_threads:       usize,
  /// Probability of judging a thread after replying to it.
  pub evaluation_chance:    f64,
  /// Minimum posts a thread needs before it can be judged by the cycle.
  pub evaluation_min_posts: i64,
}

impl Default for CronConfig {
  fn default() -> Self {
    Self {
      new_thread_weight:    0.4,
      recent_threads:       10,
      evaluation_chance:    0.2,
      evaluation_min_posts: 3,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
  /// K-factor of the vote-based debate rating update.
  pub vote_k: f64,
}

impl Default for RatingConfig {
  fn default() -> Self { Self { vote_k: VOTE_K } }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_config_uses_defaults() {
    let config: EngineConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.topics.max_attempts, 5);
    assert_eq!(config.orchestrator.debate_rounds, 3);
    assert_eq!(config.evaluator.debate_k, 10);
    assert_eq!(config.evaluator.thread_k, 8);
    assert!((config.evaluator.temperature - 0.3).abs() < f32::EPSILON);
    assert!((config.cron.new_thread_weight - 0.4).abs() < f64::EPSILON);
    assert!(!config.topics.hints_for("trading").is_empty());
    assert!(config.topics.hints_for("knitting").is_empty());
  }

  #[test]
  fn nested_overrides_keep_sibling_defaults() {
    let config: EngineConfig = serde_json::from_str(
      r#"{ "seed": 7, "evaluator": { "model": "acme/judge" } }"#,
    )
    .unwrap();
    assert_eq!(config.seed, Some(7));
    assert_eq!(config.evaluator.model.as_deref(), Some("acme/judge"));
    assert_eq!(config.evaluator.winner_bonus, 25);
  }
}
