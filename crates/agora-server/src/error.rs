//! Error type for the admin surface and its `IntoResponse` implementation.
//!
//! Bodies are `{"error": "..."}`. Failures of a generation run surface as a
//! 500 carrying the raw message.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Engine(#[from] agora_engine::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  fn status(&self) -> StatusCode {
    use agora_core::Error as Core;
    match self {
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Engine(e) if e.is_not_found() => StatusCode::NOT_FOUND,
      Error::Engine(agora_engine::Error::Core(
        Core::IllegalTransition { .. } | Core::InvalidVote(_),
      )) => StatusCode::BAD_REQUEST,
      Error::Engine(_) | Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "admin request failed");
    }
    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("X-Admin-Secret"),
      );
    }
    res
  }
}
