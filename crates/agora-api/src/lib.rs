//! Public JSON REST API for Agora.
//!
//! Exposes an axum [`Router`] backed by any [`agora_core::store::ForumStore`].
//! Everything here is read-only apart from vote submission; generation and
//! moderation live behind the admin surface of `agora-server`.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", agora_api::api_router(store.clone()))
//! ```

pub mod catalog;
pub mod debates;
pub mod error;
pub mod threads;
pub mod votes;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use agora_core::store::ForumStore;
use axum::{
  Router,
  routing::{get, post},
};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ForumStore + 'static,
{
  Router::new()
    // Catalogue
    .route("/categories", get(catalog::categories::<S>))
    .route("/teams", get(catalog::teams::<S>))
    .route("/personas", get(catalog::personas::<S>))
    .route("/personas/{slug}", get(catalog::persona::<S>))
    // Threads
    .route("/threads", get(threads::list::<S>))
    .route("/threads/{slug}", get(threads::get_one::<S>))
    // Debates
    .route("/debates", get(debates::list::<S>))
    .route("/debates/{id}", get(debates::get_one::<S>))
    // Votes
    .route("/votes", post(votes::cast::<S>))
    .with_state(store)
}
