//! Handlers for the slow-changing catalogue: categories, teams and
//! personas.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/categories` | Creation order |
//! | `GET`  | `/teams` | Each team with aggregates from its personas |
//! | `GET`  | `/personas` | Active only unless `?all=true` |
//! | `GET`  | `/personas/{slug}` | 404 if not found |

use std::sync::Arc;

use agora_core::{
  forum::Category,
  persona::{Persona, TeamStanding},
  store::ForumStore,
};
use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::error::ApiError;

/// `GET /categories`
pub async fn categories<S: ForumStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Category>>, ApiError> {
  let categories = store.list_categories().await.map_err(ApiError::store)?;
  Ok(Json(categories))
}

/// `GET /teams`
pub async fn teams<S: ForumStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<TeamStanding>>, ApiError> {
  let standings = store
    .list_team_standings()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(standings))
}

// ─── Personas ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PersonaParams {
  /// Include retired personas.
  #[serde(default)]
  pub all: bool,
}

/// `GET /personas[?all=true]`
pub async fn personas<S: ForumStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<PersonaParams>,
) -> Result<Json<Vec<Persona>>, ApiError> {
  let personas = store
    .list_personas(!params.all)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(personas))
}

/// `GET /personas/{slug}`
pub async fn persona<S: ForumStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Persona>, ApiError> {
  let persona = store
    .get_persona_by_slug(&slug)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("persona {slug} not found")))?;
  Ok(Json(persona))
}
