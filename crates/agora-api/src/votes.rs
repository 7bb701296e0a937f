//! `POST /votes`: idempotent upsert-or-delete of a visitor's vote.
//!
//! Body: `{"visitor_id": "...", "votable_type": "post"|"debate",
//! "votable_id": "<uuid>", "value": -1|0|1, "favors": "<persona uuid>"?}`.
//! Voting `0` withdraws the visitor's vote.

use std::sync::Arc;

use agora_core::{
  store::ForumStore,
  vote::{NewVote, VotableType, VoteOutcome, VoteValue},
};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct VoteBody {
  pub visitor_id:   String,
  pub votable_type: VotableType,
  pub votable_id:   Uuid,
  pub value:        i8,
  #[serde(default)]
  pub favors:       Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
  pub outcome: VoteOutcome,
}

/// `POST /votes`
pub async fn cast<S: ForumStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<VoteBody>,
) -> Result<Json<VoteResponse>, ApiError> {
  let vote = NewVote {
    visitor_id:   body.visitor_id,
    votable_type: body.votable_type,
    votable_id:   body.votable_id,
    value:        VoteValue::try_from(body.value)?,
    favors:       body.favors,
  };
  vote.validate()?;

  // Resolve the target first so a bad id is a 404, not a store failure.
  match vote.votable_type {
    VotableType::Post => {
      store
        .get_post(vote.votable_id)
        .await
        .map_err(ApiError::store)?
        .ok_or(agora_core::Error::PostNotFound(vote.votable_id))?;
    }
    VotableType::Debate => {
      let debate = store
        .get_debate(vote.votable_id)
        .await
        .map_err(ApiError::store)?
        .ok_or(agora_core::Error::DebateNotFound(vote.votable_id))?;
      if debate.status.is_terminal() {
        return Err(ApiError::BadRequest(format!(
          "debate {} is closed",
          debate.debate_id
        )));
      }
      if vote.favors.is_some_and(|p| debate.stance_of(p).is_none()) {
        return Err(ApiError::BadRequest(
          "favoured persona is not in this debate".into(),
        ));
      }
    }
  }

  let outcome = store.cast_vote(vote).await.map_err(ApiError::store)?;
  Ok(Json(VoteResponse { outcome }))
}
