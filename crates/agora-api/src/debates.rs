//! Handlers for `/debates` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/debates` | Newest first, optional `?status=active\|voting\|completed\|pending` |
//! | `GET`  | `/debates/{id}` | Debate with its rounds; 404 if not found |

use std::sync::Arc;

use agora_core::{
  debate::{Debate, DebateRound, DebateStatus},
  store::ForumStore,
};
use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub status: Option<DebateStatus>,
}

/// `GET /debates[?status=<status>]`
pub async fn list<S: ForumStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Debate>>, ApiError> {
  let debates = store
    .list_debates(params.status)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(debates))
}

#[derive(Debug, Serialize)]
pub struct DebateView {
  #[serde(flatten)]
  pub debate: Debate,
  pub rounds: Vec<DebateRound>,
}

/// `GET /debates/{id}`
pub async fn get_one<S: ForumStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DebateView>, ApiError> {
  let debate = store
    .get_debate(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(agora_core::Error::DebateNotFound(id))?;
  let rounds = store
    .list_debate_rounds(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(DebateView { debate, rounds }))
}
