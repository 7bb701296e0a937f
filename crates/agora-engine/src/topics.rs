//! Topic and trend source.
//!
//! Topics are deduplicated against the used-topic ledger (keyed by
//! [`hash_topic`]) and, for new threads, against every existing thread
//! title. Trend suggestions fail soft: a malformed answer yields no topics
//! rather than an error.

use std::collections::HashSet;

use agora_core::{
  forum::Category,
  store::ForumStore,
  topic::{NewUsedTopic, TopicUse, hash_topic, normalize_title},
};
use agora_llm::{Completion, CompletionRequest};
use chrono::Utc;
use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{Engine, Error, Result, prompts};

/// What a topic is going to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
  Thread,
  Debate,
}

/// Where a topic came from. Recorded in the ledger's `source` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicOrigin {
  Trending,
  #[default]
  Generated,
  /// Generation kept colliding; the title was made unique with a timestamp.
  Salted,
}

impl TopicOrigin {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Trending => "trending",
      Self::Generated => "generated",
      Self::Salted => "salted",
    }
  }
}

/// How each side of a debate motion is framed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateFraming {
  #[serde(default)]
  pub pro: String,
  #[serde(default)]
  pub con: String,
}

/// A candidate topic, as produced by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSuggestion {
  pub title:              String,
  #[serde(default)]
  pub summary:            String,
  #[serde(default, alias = "category_slug", alias = "category")]
  pub category_slug:      Option<String>,
  #[serde(
    default,
    alias = "suggested_personas",
    alias = "personas",
    deserialize_with = "one_or_many"
  )]
  pub suggested_personas: Vec<String>,
  #[serde(default)]
  pub debate:             Option<DebateFraming>,
  #[serde(skip)]
  pub origin:             TopicOrigin,
}

impl TopicSuggestion {
  pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
    Self {
      title:              title.into(),
      summary:            summary.into(),
      category_slug:      None,
      suggested_personas: Vec::new(),
      debate:             None,
      origin:             TopicOrigin::Generated,
    }
  }
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum OneOrMany {
    One(String),
    Many(Vec<String>),
  }

  Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
    Some(OneOrMany::One(slug)) => vec![slug],
    Some(OneOrMany::Many(slugs)) => slugs,
    None => Vec::new(),
  })
}

/// Models answer a list request either with a bare array or wrapped in an
/// object.
#[derive(Deserialize)]
#[serde(untagged)]
enum TrendingResponse {
  List(Vec<TopicSuggestion>),
  Wrapped { topics: Vec<TopicSuggestion> },
}

impl TrendingResponse {
  fn into_vec(self) -> Vec<TopicSuggestion> {
    match self {
      Self::List(topics) | Self::Wrapped { topics } => topics,
    }
  }
}

fn fold_title(title: &str) -> String { title.trim().to_lowercase() }

fn today() -> String { Utc::now().format("%Y-%m-%d").to_string() }

impl<S, C> Engine<S, C>
where
  S: ForumStore,
  C: Completion,
{
  pub async fn is_topic_used(&self, title: &str) -> Result<bool> {
    let hash = hash_topic(title);
    self.store.is_topic_used(&hash).await.map_err(Error::store)
  }

  /// Record `title` as consumed. Returns `false` if it already was.
  pub async fn mark_topic_used(
    &self,
    title: &str,
    origin: TopicOrigin,
    category_id: Option<Uuid>,
    used_for: TopicUse,
  ) -> Result<bool> {
    self
      .store
      .mark_topic_used(NewUsedTopic::new(
        title,
        origin.as_str(),
        category_id,
        used_for,
      ))
      .await
      .map_err(Error::store)
  }

  /// Up to `count` unused topics for `category`, based on what is being
  /// talked about right now.
  pub async fn trending_topics(
    &self,
    category: &Category,
    count: usize,
    kind: TopicKind,
  ) -> Result<Vec<TopicSuggestion>> {
    let personas = self.active_personas().await?;
    let slugs: Vec<&str> = personas.iter().map(|p| p.slug.as_str()).collect();
    let prompt = prompts::trending_topics(
      category,
      self.config.topics.hints_for(&category.slug),
      &slugs,
      count + 3,
      kind,
      &today(),
    );

    let candidates = match self
      .llm
      .complete_json::<TrendingResponse>(self.topic_request(prompt))
      .await
    {
      Ok(response) => response.into_vec(),
      Err(agora_llm::Error::InvalidJson { message, .. }) => {
        tracing::warn!(
          category = %category.slug,
          %message,
          "trending topics were not valid JSON; returning none"
        );
        return Ok(Vec::new());
      }
      Err(e) => return Err(e.into()),
    };

    let mut seen = HashSet::new();
    let mut fresh = Vec::with_capacity(count);
    for mut candidate in candidates {
      if fresh.len() >= count {
        break;
      }
      let key = normalize_title(&candidate.title);
      if key.is_empty() || !seen.insert(key) {
        continue;
      }
      if self.is_topic_used(&candidate.title).await? {
        tracing::debug!(title = %candidate.title, "skipping used trending topic");
        continue;
      }
      candidate.origin = TopicOrigin::Trending;
      candidate
        .category_slug
        .get_or_insert_with(|| category.slug.clone());
      fresh.push(candidate);
    }
    Ok(fresh)
  }

  /// A single generated topic, or `None` if the model proposed one that was
  /// already used. Callers decide whether to ask again.
  pub async fn fallback_topic(
    &self,
    category: &Category,
    kind: TopicKind,
  ) -> Result<Option<TopicSuggestion>> {
    let personas = self.active_personas().await?;
    let slugs: Vec<&str> = personas.iter().map(|p| p.slug.as_str()).collect();
    let prompt = prompts::single_topic(category, &slugs, kind, &today());

    let mut candidate: TopicSuggestion =
      self.llm.complete_json(self.topic_request(prompt)).await?;
    if normalize_title(&candidate.title).is_empty() {
      return Ok(None);
    }
    if self.is_topic_used(&candidate.title).await? {
      tracing::debug!(title = %candidate.title, "fallback topic already used");
      return Ok(None);
    }
    candidate.origin = TopicOrigin::Generated;
    candidate
      .category_slug
      .get_or_insert_with(|| category.slug.clone());
    Ok(Some(candidate))
  }

  /// A topic not yet used by the ledger nor by any existing thread title.
  ///
  /// Tries trends first, then a single generated topic, for up to
  /// `topics.max_attempts` rounds. When every round collides the last
  /// candidate (or a stock title) is made unique with a timestamp.
  pub async fn generate_topic(&self, kind: TopicKind) -> Result<TopicSuggestion> {
    let categories = self
      .store
      .list_categories()
      .await
      .map_err(Error::store)?;
    if categories.is_empty() {
      return Err(agora_core::Error::NoCategories.into());
    }
    let titles: HashSet<String> = self
      .store
      .list_thread_titles()
      .await
      .map_err(Error::store)?
      .iter()
      .map(|t| fold_title(t))
      .collect();

    let max_attempts = self.config.topics.max_attempts.max(1);
    let mut last = None;
    for attempt in 1..=max_attempts {
      let Some(category) = self.with_rng(|rng| categories.choose(rng)) else {
        break;
      };

      let mut candidate = self
        .trending_topics(category, 1, kind)
        .await?
        .into_iter()
        .next();
      if candidate.is_none() {
        candidate = self.fallback_topic(category, kind).await?;
      }

      match candidate {
        Some(topic) if !titles.contains(&fold_title(&topic.title)) => {
          tracing::debug!(attempt, title = %topic.title, "topic chosen");
          return Ok(topic);
        }
        Some(topic) => {
          tracing::debug!(attempt, title = %topic.title, "topic matches an existing thread");
          last = Some(topic);
        }
        None => {
          tracing::debug!(attempt, category = %category.slug, "no fresh topic");
          last = last.or_else(|| {
            let mut stock = TopicSuggestion::new(
              format!("What's next for {}?", category.name),
              format!("An open discussion about {}.", category.name),
            );
            stock.category_slug = Some(category.slug.clone());
            Some(stock)
          });
        }
      }
    }

    let mut topic = last.unwrap_or_else(|| {
      TopicSuggestion::new("Open discussion", "Anything goes.")
    });
    topic.title = format!(
      "{} ({})",
      topic.title.trim(),
      Utc::now().format("%Y-%m-%d %H:%M:%S")
    );
    topic.origin = TopicOrigin::Salted;
    tracing::warn!(
      max_attempts,
      title = %topic.title,
      "topic generation kept colliding; salted the title"
    );
    Ok(topic)
  }

  fn topic_request(&self, prompt: String) -> CompletionRequest {
    let config = &self.config.topics;
    CompletionRequest::new(prompt)
      .tier(config.tier)
      .temperature(config.temperature)
      .max_tokens(config.max_tokens)
  }
}
