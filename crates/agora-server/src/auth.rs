//! Shared-secret gate for the admin surface.
//!
//! The secret travels in the `x-admin-secret` header or, for cron services
//! that can only hit a URL, the `?secret=` query parameter. It is checked
//! against an argon2 PHC hash from the configuration.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::{FromRequestParts, Query},
  http::request::Parts,
};
use rand_core::OsRng;
use serde::Deserialize;

use crate::{AppState, error::Error};

pub const SECRET_HEADER: &str = "x-admin-secret";

#[derive(Clone)]
pub struct AuthConfig {
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub secret_hash: String,
}

/// Zero-size marker: present in the handler means the caller presented the
/// admin secret.
pub struct Admin;

#[derive(Deserialize)]
struct SecretParam {
  secret: Option<String>,
}

/// Pull the presented secret from the header, falling back to the query.
fn presented_secret(parts: &Parts) -> Option<String> {
  let header = parts
    .headers
    .get(SECRET_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::to_owned);
  header.or_else(|| {
    Query::<SecretParam>::try_from_uri(&parts.uri)
      .ok()
      .and_then(|Query(param)| param.secret)
  })
}

pub fn verify_secret(secret: &str, config: &AuthConfig) -> Result<(), Error> {
  let parsed_hash =
    PasswordHash::new(&config.secret_hash).map_err(|_| Error::Unauthorized)?;
  Argon2::default()
    .verify_password(secret.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)
}

/// Hash `secret` into the PHC string expected by [`AuthConfig`].
pub fn hash_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(secret.as_bytes(), &salt)?
      .to_string(),
  )
}

impl<S, C> FromRequestParts<AppState<S, C>> for Admin
where
  S: Send + Sync,
  C: Send + Sync,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, C>,
  ) -> Result<Self, Self::Rejection> {
    let secret = presented_secret(parts).ok_or(Error::Unauthorized)?;
    verify_secret(&secret, &state.auth)?;
    Ok(Admin)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::Request;

  use super::*;

  fn config(secret: &str) -> AuthConfig {
    AuthConfig { secret_hash: hash_secret(secret).unwrap() }
  }

  fn parts(req: Request<()>) -> Parts { req.into_parts().0 }

  #[test]
  fn correct_secret() {
    let config = config("hunter2");
    assert!(verify_secret("hunter2", &config).is_ok());
  }

  #[test]
  fn wrong_secret() {
    let config = config("hunter2");
    assert!(matches!(
      verify_secret("hunter3", &config),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn malformed_hash_rejects_everything() {
    let config = AuthConfig { secret_hash: "not-a-phc-string".into() };
    assert!(verify_secret("anything", &config).is_err());
  }

  #[test]
  fn header_wins_over_query() {
    let req = Request::builder()
      .uri("/admin/cron?secret=from-query")
      .header(SECRET_HEADER, "from-header")
      .body(())
      .unwrap();
    assert_eq!(presented_secret(&parts(req)).as_deref(), Some("from-header"));
  }

  #[test]
  fn query_secret_is_accepted() {
    let req = Request::builder()
      .uri("/admin/cron?secret=from-query")
      .body(())
      .unwrap();
    assert_eq!(presented_secret(&parts(req)).as_deref(), Some("from-query"));

    let bare = Request::builder().uri("/admin/cron").body(()).unwrap();
    assert_eq!(presented_secret(&parts(bare)), None);
  }
}
