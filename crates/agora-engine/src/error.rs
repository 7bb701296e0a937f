//! Error type for `agora-engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(Box<dyn std::error::Error + Send + Sync>),

  #[error("completion error: {0}")]
  Completion(#[from] agora_llm::Error),

  #[error(transparent)]
  Core(#[from] agora_core::Error),

  /// The judge's verdict did not match the posts it was asked to score.
  #[error("evaluation mismatch: {0}")]
  EvaluationMismatch(String),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Whether the error names an entity that does not exist.
  pub fn is_not_found(&self) -> bool {
    use agora_core::Error as Core;
    matches!(
      self,
      Self::Core(
        Core::PersonaNotFound(_)
          | Core::CategoryNotFound(_)
          | Core::ThreadNotFound(_)
          | Core::PostNotFound(_)
          | Core::DebateNotFound(_)
      )
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
