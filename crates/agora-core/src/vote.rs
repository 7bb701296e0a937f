//! Visitor votes on posts and debates.
//!
//! At most one vote row exists per `(visitor, votable type, votable id)`.
//! Re-voting replaces the row; voting `0` deletes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VotableType {
  Post,
  Debate,
}

/// A vote's direction. `Clear` withdraws a previous vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum VoteValue {
  Down,
  Clear,
  Up,
}

impl TryFrom<i8> for VoteValue {
  type Error = Error;

  fn try_from(value: i8) -> Result<Self> {
    match value {
      -1 => Ok(Self::Down),
      0 => Ok(Self::Clear),
      1 => Ok(Self::Up),
      other => Err(Error::InvalidVote(format!("value {other} not in -1..=1"))),
    }
  }
}

impl From<VoteValue> for i8 {
  fn from(value: VoteValue) -> Self {
    match value {
      VoteValue::Down => -1,
      VoteValue::Clear => 0,
      VoteValue::Up => 1,
    }
  }
}

/// A persisted vote. `value` is never [`VoteValue::Clear`]; clearing deletes
/// the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
  pub vote_id:      Uuid,
  pub visitor_id:   String,
  pub votable_type: VotableType,
  pub votable_id:   Uuid,
  pub value:        VoteValue,
  /// For debate votes: the debater the vote supports.
  pub favors:       Option<Uuid>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input to [`crate::store::ForumStore::cast_vote`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewVote {
  /// Anonymous visitor fingerprint.
  pub visitor_id:   String,
  pub votable_type: VotableType,
  pub votable_id:   Uuid,
  pub value:        VoteValue,
  #[serde(default)]
  pub favors:       Option<Uuid>,
}

impl NewVote {
  /// Shape checks that need no database access.
  ///
  /// Debate votes must name the favoured debater and can only be `Up` or
  /// `Clear`. Post votes never name a persona.
  pub fn validate(&self) -> Result<()> {
    if self.visitor_id.trim().is_empty() {
      return Err(Error::InvalidVote("empty visitor id".into()));
    }
    match self.votable_type {
      VotableType::Debate => {
        if self.value == VoteValue::Down {
          return Err(Error::InvalidVote(
            "debate votes cannot be negative".into(),
          ));
        }
        if self.value == VoteValue::Up && self.favors.is_none() {
          return Err(Error::InvalidVote(
            "debate votes must name a persona".into(),
          ));
        }
      }
      VotableType::Post => {
        if self.favors.is_some() {
          return Err(Error::InvalidVote(
            "post votes cannot favour a persona".into(),
          ));
        }
      }
    }
    Ok(())
  }
}

/// What [`crate::store::ForumStore::cast_vote`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOutcome {
  /// No prior vote; a row was inserted.
  Created,
  /// A prior vote with a different value or favourite was replaced.
  Changed,
  /// The same vote was submitted again; nothing changed.
  Unchanged,
  /// A prior vote was deleted.
  Removed,
  /// `Clear` with no prior vote; nothing changed.
  Ignored,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn vote(votable_type: VotableType, value: VoteValue, favors: Option<Uuid>) -> NewVote {
    NewVote {
      visitor_id: "visitor-1".into(),
      votable_type,
      votable_id: Uuid::new_v4(),
      value,
      favors,
    }
  }

  #[test]
  fn vote_value_parses_only_unit_range() {
    assert_eq!(VoteValue::try_from(-1).unwrap(), VoteValue::Down);
    assert_eq!(VoteValue::try_from(0).unwrap(), VoteValue::Clear);
    assert_eq!(VoteValue::try_from(1).unwrap(), VoteValue::Up);
    assert!(VoteValue::try_from(2).is_err());
    assert!(serde_json::from_str::<VoteValue>("-3").is_err());
  }

  #[test]
  fn debate_vote_needs_favourite() {
    let v = vote(VotableType::Debate, VoteValue::Up, None);
    assert!(v.validate().is_err());
    let v = vote(VotableType::Debate, VoteValue::Up, Some(Uuid::new_v4()));
    assert!(v.validate().is_ok());
  }

  #[test]
  fn debate_downvote_rejected() {
    let v = vote(VotableType::Debate, VoteValue::Down, Some(Uuid::new_v4()));
    assert!(v.validate().is_err());
  }

  #[test]
  fn clearing_a_debate_vote_needs_no_favourite() {
    let v = vote(VotableType::Debate, VoteValue::Clear, None);
    assert!(v.validate().is_ok());
  }

  #[test]
  fn post_vote_cannot_favour() {
    let v = vote(VotableType::Post, VoteValue::Up, Some(Uuid::new_v4()));
    assert!(v.validate().is_err());
  }
}
