//! Categories, threads and posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Category ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
  pub category_id:  Uuid,
  pub slug:         String,
  pub name:         String,
  pub description:  Option<String>,
  pub thread_count: i64,
  pub post_count:   i64,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::ForumStore::add_category`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
  pub slug:        String,
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
}

// ─── Thread ──────────────────────────────────────────────────────────────────

/// A discussion thread. Ordinary threads and debate threads share this shape;
/// debate threads carry `is_debate` and a `debate_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
  pub thread_id:        Uuid,
  /// Unique; derived from the title plus a random salt.
  pub slug:             String,
  pub title:            String,
  pub summary:          String,
  pub category_id:      Uuid,
  pub starter_id:       Uuid,
  pub post_count:       i64,
  pub view_count:       i64,
  pub upvotes:          i64,
  pub is_debate:        bool,
  pub debate_id:        Option<Uuid>,
  pub pinned:           bool,
  pub created_at:       DateTime<Utc>,
  pub last_activity_at: DateTime<Utc>,
}

/// Input to [`crate::store::ForumStore::insert_thread`].
#[derive(Debug, Clone)]
pub struct NewThread {
  pub slug:        String,
  pub title:       String,
  pub summary:     String,
  pub category_id: Uuid,
  pub starter_id:  Uuid,
  pub is_debate:   bool,
}

/// Parameters for [`crate::store::ForumStore::list_threads`]. Results are
/// ordered by most recent activity first.
#[derive(Debug, Clone, Default)]
pub struct ThreadQuery {
  pub category_id: Option<Uuid>,
  /// `Some(false)` keeps ordinary threads only, `Some(true)` debate threads.
  pub is_debate:   Option<bool>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

// ─── Admin score ─────────────────────────────────────────────────────────────

/// The judge's verdict on a single post, always in `-2..=2`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct AdminScore(i8);

impl AdminScore {
  pub const MIN: i8 = -2;
  pub const MAX: i8 = 2;

  pub fn get(self) -> i8 { self.0 }
}

impl TryFrom<i64> for AdminScore {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self> {
    if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
      Ok(Self(value as i8))
    } else {
      Err(Error::ScoreOutOfRange(value))
    }
  }
}

impl From<AdminScore> for i64 {
  fn from(score: AdminScore) -> Self { i64::from(score.0) }
}

impl std::fmt::Display for AdminScore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:+}", self.0)
  }
}

/// What the evaluator writes onto a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostEvaluation {
  pub score:        AdminScore,
  pub comment:      String,
  /// Set when the judge flags a rule violation.
  pub warning:      Option<String>,
  pub evaluated_at: DateTime<Utc>,
}

// ─── Post ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
  pub post_id:     Uuid,
  pub thread_id:   Uuid,
  pub persona_id:  Uuid,
  pub parent_id:   Option<Uuid>,
  pub content:     String,
  pub upvotes:     i64,
  pub downvotes:   i64,
  pub best_answer: bool,
  pub evaluation:  Option<PostEvaluation>,
  /// Generation metadata; opaque to the store.
  pub metadata:    serde_json::Value,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::ForumStore::insert_post`].
#[derive(Debug, Clone)]
pub struct NewPost {
  pub thread_id:  Uuid,
  pub persona_id: Uuid,
  pub parent_id:  Option<Uuid>,
  pub content:    String,
  pub metadata:   serde_json::Value,
}
