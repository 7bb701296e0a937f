//! Debates, their rounds, and the debate status machine.
//!
//! A debate pairs two personas with fixed stances: `persona1` always argues
//! [`Stance::Pro`], `persona2` always argues [`Stance::Con`]. Each round
//! contributes exactly one post per side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status machine ──────────────────────────────────────────────────────────

/// Lifecycle of a debate.
///
/// ```text
/// pending -> active -> voting -> completed
///              \__________________/
/// ```
///
/// `completed` is terminal.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DebateStatus {
  Pending,
  Active,
  Voting,
  Completed,
}

impl DebateStatus {
  pub fn can_transition_to(self, next: DebateStatus) -> bool {
    use DebateStatus::*;
    matches!(
      (self, next),
      (Pending, Active) | (Active, Voting) | (Active, Completed) | (Voting, Completed)
    )
  }

  /// Validate a transition, returning the new status.
  pub fn transition(self, next: DebateStatus) -> Result<DebateStatus> {
    if self.can_transition_to(next) {
      Ok(next)
    } else {
      Err(Error::IllegalTransition { from: self, to: next })
    }
  }

  pub fn is_terminal(self) -> bool { matches!(self, Self::Completed) }
}

/// Which side of the motion a debater argues.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Stance {
  Pro,
  Con,
}

impl Stance {
  pub fn opposite(self) -> Stance {
    match self {
      Self::Pro => Self::Con,
      Self::Con => Self::Pro,
    }
  }
}

// ─── Debate ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debate {
  pub debate_id:      Uuid,
  pub slug:           String,
  pub topic:          String,
  pub thread_id:      Option<Uuid>,
  /// Argues [`Stance::Pro`].
  pub persona1_id:    Uuid,
  /// Argues [`Stance::Con`].
  pub persona2_id:    Uuid,
  pub persona1_votes: i64,
  pub persona2_votes: i64,
  pub winner_id:      Option<Uuid>,
  pub total_rounds:   u32,
  pub current_round:  u32,
  pub status:         DebateStatus,
  /// The judge's closing summary, if the judge finalised the debate.
  pub summary:        Option<String>,
  pub persona1_score: Option<i64>,
  pub persona2_score: Option<i64>,
  /// Rating swing applied when the debate was finalised.
  pub elo_delta:      Option<i32>,
  pub created_at:     DateTime<Utc>,
  pub completed_at:   Option<DateTime<Utc>>,
}

impl Debate {
  /// The persona arguing `stance`.
  pub fn persona_for(&self, stance: Stance) -> Uuid {
    match stance {
      Stance::Pro => self.persona1_id,
      Stance::Con => self.persona2_id,
    }
  }

  /// The stance `persona_id` argues, or `None` if they are not a debater.
  pub fn stance_of(&self, persona_id: Uuid) -> Option<Stance> {
    if persona_id == self.persona1_id {
      Some(Stance::Pro)
    } else if persona_id == self.persona2_id {
      Some(Stance::Con)
    } else {
      None
    }
  }

  /// The other debater, or `None` if `persona_id` is not in this debate.
  pub fn opponent_of(&self, persona_id: Uuid) -> Option<Uuid> {
    self
      .stance_of(persona_id)
      .map(|stance| self.persona_for(stance.opposite()))
  }

  /// The thread holding this debate's posts.
  pub fn require_thread(&self) -> Result<Uuid> {
    self
      .thread_id
      .ok_or(Error::DebateMissingThread(self.debate_id))
  }
}

/// Input to [`crate::store::ForumStore::insert_debate`].
#[derive(Debug, Clone)]
pub struct NewDebate {
  pub slug:         String,
  pub topic:        String,
  pub thread_id:    Option<Uuid>,
  pub persona1_id:  Uuid,
  pub persona2_id:  Uuid,
  pub total_rounds: u32,
  pub status:       DebateStatus,
}

/// Everything written when a debate is finalised, by either the vote tally or
/// the judge.
#[derive(Debug, Clone)]
pub struct DebateFinalization {
  pub winner_id:      Option<Uuid>,
  pub summary:        Option<String>,
  pub persona1_score: Option<i64>,
  pub persona2_score: Option<i64>,
  pub elo_delta:      i32,
  pub completed_at:   DateTime<Utc>,
}

// ─── Rounds ──────────────────────────────────────────────────────────────────

/// One exchange of arguments. `round_number` is unique within a debate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRound {
  pub round_id:     Uuid,
  pub debate_id:    Uuid,
  pub round_number: u32,
  pub pro_post_id:  Uuid,
  pub con_post_id:  Uuid,
  pub started_at:   DateTime<Utc>,
  pub completed_at: DateTime<Utc>,
}

/// Input to [`crate::store::ForumStore::insert_debate_round`].
#[derive(Debug, Clone)]
pub struct NewDebateRound {
  pub debate_id:    Uuid,
  pub round_number: u32,
  pub pro_post_id:  Uuid,
  pub con_post_id:  Uuid,
  pub started_at:   DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use super::*;

  #[test]
  fn legal_transitions() {
    use DebateStatus::*;
    assert!(Pending.can_transition_to(Active));
    assert!(Active.can_transition_to(Voting));
    assert!(Active.can_transition_to(Completed));
    assert!(Voting.can_transition_to(Completed));
  }

  #[test]
  fn completed_is_terminal() {
    use DebateStatus::*;
    for next in [Pending, Active, Voting, Completed] {
      assert!(!Completed.can_transition_to(next));
    }
    assert!(matches!(
      Completed.transition(Active),
      Err(Error::IllegalTransition { from: Completed, to: Active })
    ));
  }

  #[test]
  fn pending_cannot_skip_to_completed() {
    assert!(
      !DebateStatus::Pending.can_transition_to(DebateStatus::Completed)
    );
  }

  #[test]
  fn status_string_roundtrip() {
    assert_eq!(DebateStatus::Voting.as_ref(), "voting");
    assert_eq!(
      DebateStatus::from_str("completed").unwrap(),
      DebateStatus::Completed
    );
  }

  #[test]
  fn stances_follow_persona_slots() {
    let p1 = Uuid::new_v4();
    let p2 = Uuid::new_v4();
    let debate = Debate {
      debate_id:      Uuid::new_v4(),
      slug:           "d".into(),
      topic:          "t".into(),
      thread_id:      None,
      persona1_id:    p1,
      persona2_id:    p2,
      persona1_votes: 0,
      persona2_votes: 0,
      winner_id:      None,
      total_rounds:   3,
      current_round:  0,
      status:         DebateStatus::Active,
      summary:        None,
      persona1_score: None,
      persona2_score: None,
      elo_delta:      None,
      created_at:     Utc::now(),
      completed_at:   None,
    };

    assert_eq!(debate.stance_of(p1), Some(Stance::Pro));
    assert_eq!(debate.stance_of(p2), Some(Stance::Con));
    assert_eq!(debate.opponent_of(p1), Some(p2));
    assert_eq!(debate.stance_of(Uuid::new_v4()), None);
    assert!(matches!(
      debate.require_thread(),
      Err(Error::DebateMissingThread(_))
    ));
  }
}
