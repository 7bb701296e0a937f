//! The used-topic ledger and the title hash that keys it.
//!
//! Two titles collide when they are equal after lowercasing and dropping
//! every non-alphanumeric character. The ledger is append-only and exists
//! purely for deduplication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Lowercase `title` and strip everything that is not alphanumeric.
pub fn normalize_title(title: &str) -> String {
  title
    .chars()
    .filter(|c| c.is_alphanumeric())
    .flat_map(char::to_lowercase)
    .collect()
}

/// SHA-256 hex digest of the normalised title.
pub fn hash_topic(title: &str) -> String {
  let digest = Sha256::digest(normalize_title(title).as_bytes());
  hex::encode(digest)
}

/// Which entity consumed a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TopicUse {
  Thread(Uuid),
  Debate(Uuid),
  Prediction(Uuid),
}

impl TopicUse {
  /// The discriminant stored in the `used_for` column.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Thread(_) => "thread",
      Self::Debate(_) => "debate",
      Self::Prediction(_) => "prediction",
    }
  }

  pub fn id(&self) -> Uuid {
    match *self {
      Self::Thread(id) | Self::Debate(id) | Self::Prediction(id) => id,
    }
  }

  pub fn from_parts(discriminant: &str, id: Uuid) -> crate::Result<Self> {
    match discriminant {
      "thread" => Ok(Self::Thread(id)),
      "debate" => Ok(Self::Debate(id)),
      "prediction" => Ok(Self::Prediction(id)),
      other => Err(crate::Error::UnknownDiscriminant {
        kind:  "topic use",
        value: other.to_owned(),
      }),
    }
  }
}

/// A ledger row. Never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsedTopic {
  pub topic_id:    Uuid,
  pub title_hash:  String,
  pub title:       String,
  /// Where the topic came from, e.g. `"trending"` or `"generated"`.
  pub source:      String,
  pub category_id: Option<Uuid>,
  pub used_for:    TopicUse,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::ForumStore::mark_topic_used`].
#[derive(Debug, Clone)]
pub struct NewUsedTopic {
  pub title_hash:  String,
  pub title:       String,
  pub source:      String,
  pub category_id: Option<Uuid>,
  pub used_for:    TopicUse,
}

impl NewUsedTopic {
  /// Build a ledger entry, hashing `title` on the way in.
  pub fn new(
    title: impl Into<String>,
    source: impl Into<String>,
    category_id: Option<Uuid>,
    used_for: TopicUse,
  ) -> Self {
    let title = title.into();
    Self {
      title_hash: hash_topic(&title),
      title,
      source: source.into(),
      category_id,
      used_for,
    }
  }
}
