//! Error types for `agora-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::debate::DebateStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("persona not found: {0}")]
  PersonaNotFound(String),

  #[error("category not found: {0}")]
  CategoryNotFound(String),

  #[error("thread not found: {0}")]
  ThreadNotFound(Uuid),

  #[error("post not found: {0}")]
  PostNotFound(Uuid),

  #[error("debate not found: {0}")]
  DebateNotFound(Uuid),

  #[error("debate {0} has no thread")]
  DebateMissingThread(Uuid),

  #[error("no categories configured")]
  NoCategories,

  #[error("need at least {needed} active personas, found {available}")]
  NotEnoughPersonas { needed: usize, available: usize },

  #[error("invalid vote: {0}")]
  InvalidVote(String),

  #[error("admin score {0} outside -2..=2")]
  ScoreOutOfRange(i64),

  #[error("illegal debate transition {from} -> {to}")]
  IllegalTransition { from: DebateStatus, to: DebateStatus },

  #[error("unknown {kind} discriminant: {value:?}")]
  UnknownDiscriminant { kind: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
