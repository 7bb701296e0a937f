//! Error type for `agora-llm`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The provider answered with a non-success status or an error body.
  #[error("provider error (status {status}): {message}")]
  Provider { status: u16, message: String },

  #[error("provider returned no content")]
  EmptyResponse,

  /// The completion could not be parsed into the requested JSON shape.
  #[error("invalid JSON response: {message}")]
  InvalidJson { raw: String, message: String },

  #[error("configuration error: {0}")]
  Config(String),
}

impl Error {
  /// Whether a retry at a cheaper tier could plausibly succeed.
  pub fn is_upstream(&self) -> bool {
    matches!(self, Self::Http(_) | Self::Provider { .. } | Self::EmptyResponse)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
