//! Admin and cron trigger endpoints.
//!
//! Every handler requires [`Admin`]; generation runs are synchronous, so a
//! request returns once the whole thread or debate has been written.

use agora_core::{
  debate::Debate,
  forum::{Category, NewCategory, Post},
  persona::{NewPersona, NewTeam, Persona, PersonaPatch, Team},
  store::ForumStore,
};
use agora_engine::{
  cron::CycleReport,
  evaluator::{DebateEvaluation, ThreadEvaluation},
  orchestrator::{DebateCompletion, DebateOutcome, ThreadOutcome},
};
use agora_llm::Completion;
use axum::{
  Json, Router,
  extract::{Path, Query, State},
  routing::{patch, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Admin, error::Error};

type Result<T> = std::result::Result<Json<T>, Error>;

pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: ForumStore + 'static,
  C: Completion + 'static,
{
  Router::new()
    // Generation
    .route("/threads",                post(create_thread::<S, C>))
    .route("/threads/{id}/reply",     post(reply_to_thread::<S, C>))
    .route("/threads/{id}/evaluate",  post(evaluate_thread::<S, C>))
    .route("/debates",                post(create_debate::<S, C>))
    .route("/debates/{id}/voting",    post(open_voting::<S, C>))
    .route("/debates/{id}/complete",  post(complete_debate::<S, C>))
    .route("/debates/{id}/evaluate",  post(evaluate_debate::<S, C>))
    .route("/cron",                   post(run_cycle::<S, C>).get(run_cycle::<S, C>))
    // Catalogue
    .route("/personas",               post(create_persona::<S, C>))
    .route("/personas/{id}",          patch(update_persona::<S, C>))
    .route("/categories",             post(create_category::<S, C>))
    .route("/teams",                  post(create_team::<S, C>))
    .with_state(state)
}

// ─── Generation ──────────────────────────────────────────────────────────────

pub async fn create_thread<S, C>(
  _: Admin,
  State(state): State<AppState<S, C>>,
) -> Result<ThreadOutcome>
where
  S: ForumStore,
  C: Completion,
{
  Ok(Json(state.engine.generate_thread().await?))
}

pub async fn reply_to_thread<S, C>(
  _: Admin,
  State(state): State<AppState<S, C>>,
  Path(id): Path<Uuid>,
) -> Result<Post>
where
  S: ForumStore,
  C: Completion,
{
  Ok(Json(state.engine.reply_to_thread(id).await?))
}

pub async fn evaluate_thread<S, C>(
  _: Admin,
  State(state): State<AppState<S, C>>,
  Path(id): Path<Uuid>,
) -> Result<ThreadEvaluation>
where
  S: ForumStore,
  C: Completion,
{
  Ok(Json(state.engine.evaluate_thread(id).await?))
}

#[derive(Deserialize)]
pub struct DebateParams {
  pub rounds: Option<u32>,
}

pub async fn create_debate<S, C>(
  _: Admin,
  State(state): State<AppState<S, C>>,
  Query(params): Query<DebateParams>,
) -> Result<DebateOutcome>
where
  S: ForumStore,
  C: Completion,
{
  if params.rounds == Some(0) {
    return Err(Error::BadRequest("a debate needs at least one round".into()));
  }
  Ok(Json(state.engine.create_debate(params.rounds).await?))
}

pub async fn open_voting<S, C>(
  _: Admin,
  State(state): State<AppState<S, C>>,
  Path(id): Path<Uuid>,
) -> Result<Debate>
where
  S: ForumStore,
  C: Completion,
{
  Ok(Json(state.engine.open_voting(id).await?))
}

pub async fn complete_debate<S, C>(
  _: Admin,
  State(state): State<AppState<S, C>>,
  Path(id): Path<Uuid>,
) -> Result<DebateCompletion>
where
  S: ForumStore,
  C: Completion,
{
  Ok(Json(state.engine.complete_debate(id).await?))
}

pub async fn evaluate_debate<S, C>(
  _: Admin,
  State(state): State<AppState<S, C>>,
  Path(id): Path<Uuid>,
) -> Result<DebateEvaluation>
where
  S: ForumStore,
  C: Completion,
{
  Ok(Json(state.engine.evaluate_debate(id).await?))
}

pub async fn run_cycle<S, C>(
  _: Admin,
  State(state): State<AppState<S, C>>,
) -> Result<CycleReport>
where
  S: ForumStore,
  C: Completion,
{
  Ok(Json(state.engine.run_cycle().await?))
}

// ─── Catalogue ───────────────────────────────────────────────────────────────

fn check_temperature(temperature: u8) -> std::result::Result<(), Error> {
  if temperature > 100 {
    return Err(Error::BadRequest(format!(
      "temperature {temperature} outside 0..=100"
    )));
  }
  Ok(())
}

pub async fn create_persona<S, C>(
  _: Admin,
  State(state): State<AppState<S, C>>,
  Json(input): Json<NewPersona>,
) -> Result<Persona>
where
  S: ForumStore,
  C: Completion,
{
  check_temperature(input.temperature)?;
  let persona = state
    .engine
    .store()
    .add_persona(input)
    .await
    .map_err(Error::store)?;
  tracing::info!(persona = %persona.slug, "persona added");
  Ok(Json(persona))
}

pub async fn update_persona<S, C>(
  _: Admin,
  State(state): State<AppState<S, C>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<PersonaPatch>,
) -> Result<Persona>
where
  S: ForumStore,
  C: Completion,
{
  if let Some(temperature) = patch.temperature {
    check_temperature(temperature)?;
  }
  state
    .engine
    .store()
    .update_persona(id, patch)
    .await
    .map_err(Error::store)?
    .map(Json)
    .ok_or_else(|| Error::NotFound(format!("persona {id}")))
}

pub async fn create_category<S, C>(
  _: Admin,
  State(state): State<AppState<S, C>>,
  Json(input): Json<NewCategory>,
) -> Result<Category>
where
  S: ForumStore,
  C: Completion,
{
  let category = state
    .engine
    .store()
    .add_category(input)
    .await
    .map_err(Error::store)?;
  Ok(Json(category))
}

pub async fn create_team<S, C>(
  _: Admin,
  State(state): State<AppState<S, C>>,
  Json(input): Json<NewTeam>,
) -> Result<Team>
where
  S: ForumStore,
  C: Completion,
{
  let team = state
    .engine
    .store()
    .add_team(input)
    .await
    .map_err(Error::store)?;
  Ok(Json(team))
}
