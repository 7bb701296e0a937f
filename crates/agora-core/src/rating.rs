//! Rating arithmetic shared by both debate-finalisation paths.
//!
//! Vote-based finalisation uses a logistic ELO update scaled by the vote
//! margin: a landslide moves ratings further than a narrow win, and the
//! swing is zero-sum. Judge-based scoring moves a persona by
//! `score × k` per evaluated post.

use serde::{Deserialize, Serialize};

use crate::{debate::Stance, forum::AdminScore};

/// Default K-factor for vote-based debate finalisation.
pub const VOTE_K: f64 = 32.0;

/// Probability that a player rated `rating` beats one rated `opponent`.
pub fn expected_score(rating: i32, opponent: i32) -> f64 {
  1.0 / (1.0 + 10f64.powf(f64::from(opponent - rating) / 400.0))
}

/// Accumulated visitor support for each side of a debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
  pub pro: i64,
  pub con: i64,
}

/// Outcome of a vote tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteVerdict {
  Winner {
    side:         Stance,
    winner_votes: i64,
    loser_votes:  i64,
  },
  /// Equal tallies, including zero votes on both sides.
  Draw,
}

impl VoteTally {
  pub fn total(&self) -> i64 { self.pro + self.con }

  pub fn verdict(&self) -> VoteVerdict {
    use std::cmp::Ordering;
    match self.pro.cmp(&self.con) {
      Ordering::Greater => VoteVerdict::Winner {
        side:         Stance::Pro,
        winner_votes: self.pro,
        loser_votes:  self.con,
      },
      Ordering::Less => VoteVerdict::Winner {
        side:         Stance::Con,
        winner_votes: self.con,
        loser_votes:  self.pro,
      },
      Ordering::Equal => VoteVerdict::Draw,
    }
  }
}

/// Rating points moved from loser to winner after a vote-decided debate.
///
/// `round(k · (1 − E_winner) · (1 + margin))` where `margin` is the winner's
/// share of the vote lead over all votes cast. The result is never negative
/// and never decreases as the margin grows.
pub fn vote_elo_delta(
  k: f64,
  winner_elo: i32,
  loser_elo: i32,
  winner_votes: i64,
  loser_votes: i64,
) -> i32 {
  let total = winner_votes + loser_votes;
  if total <= 0 || winner_votes <= loser_votes {
    return 0;
  }
  let margin = (winner_votes - loser_votes) as f64 / total as f64;
  let expected = expected_score(winner_elo, loser_elo);
  (k * (1.0 - expected) * (1.0 + margin)).round().max(0.0) as i32
}

/// Rating change for one judged post.
pub fn score_elo_delta(score: AdminScore, k: i32) -> i32 {
  i32::from(score.get()) * k
}

/// Rating change when a post is re-judged: only the difference from the
/// previous score is applied, so repeated evaluation never double-counts.
pub fn rescore_elo_delta(
  previous: Option<AdminScore>,
  next: AdminScore,
  k: i32,
) -> i32 {
  let before = previous.map(|s| score_elo_delta(s, k)).unwrap_or(0);
  score_elo_delta(next, k) - before
}
