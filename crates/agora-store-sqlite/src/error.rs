//! Error type for `agora-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] agora_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {kind} value in database: {value:?}")]
  Decode { kind: &'static str, value: String },

  /// A round with this number was already recorded for the debate.
  #[error("debate {debate_id} already has round {round}")]
  DuplicateRound { debate_id: uuid::Uuid, round: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
