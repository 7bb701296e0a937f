//! Handlers for `/threads` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/threads` | `?category=<slug>&limit=&offset=`, pinned then most recently active first |
//! | `GET`  | `/threads/{slug}` | Thread with every post; counts a view |

use std::sync::Arc;

use agora_core::{
  forum::{Post, Thread, ThreadQuery},
  store::ForumStore,
};
use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Category slug.
  pub category: Option<String>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

/// `GET /threads[?category=<slug>][&limit=N][&offset=N]`
pub async fn list<S: ForumStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Thread>>, ApiError> {
  let category_id = match params.category.as_deref() {
    Some(slug) => Some(
      store
        .get_category_by_slug(slug)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| ApiError::NotFound(format!("category {slug} not found")))?
        .category_id,
    ),
    None => None,
  };

  let query = ThreadQuery {
    category_id,
    is_debate: None,
    limit: Some(params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)),
    offset: params.offset,
  };
  let threads = store.list_threads(&query).await.map_err(ApiError::store)?;
  Ok(Json(threads))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ThreadView {
  #[serde(flatten)]
  pub thread: Thread,
  pub posts:  Vec<Post>,
}

/// `GET /threads/{slug}`
///
/// The view counter is bumped in a detached task; a failure there is logged
/// and never affects the response.
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<ThreadView>, ApiError>
where
  S: ForumStore + 'static,
{
  let thread = store
    .get_thread_by_slug(&slug)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("thread {slug} not found")))?;
  let posts = store
    .list_thread_posts(thread.thread_id)
    .await
    .map_err(ApiError::store)?;

  let thread_id = thread.thread_id;
  let counter = store.clone();
  tokio::spawn(async move {
    if let Err(e) = counter.increment_thread_views(thread_id).await {
      tracing::warn!(%thread_id, error = %e, "failed to count thread view");
    }
  });

  Ok(Json(ThreadView { thread, posts }))
}
