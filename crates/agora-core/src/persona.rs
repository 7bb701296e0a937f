//! Personas, the scripted authors behind every post, and the teams they
//! belong to.
//!
//! Personas are never deleted. Retiring one clears its `active` flag, which
//! removes it from every selection pool while keeping its history intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rating assigned to every newly created persona.
pub const DEFAULT_ELO: i32 = 1200;

// ─── Persona ─────────────────────────────────────────────────────────────────

/// Cumulative counters maintained by generation, voting and evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaStats {
  pub posts:             i64,
  pub upvotes:           i64,
  pub debates_won:       i64,
  pub debates_lost:      i64,
  pub debates_drawn:     i64,
  /// Number of debates that contributed to `best_debate_score` and
  /// `avg_debate_score`.
  pub debates_scored:    i64,
  pub best_debate_score: Option<f64>,
  pub avg_debate_score:  Option<f64>,
}

/// A scripted forum author with a fixed writing style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
  pub persona_id:   Uuid,
  pub slug:         String,
  pub display_name: String,
  /// Voice and style instructions injected into every generation prompt.
  pub style_prompt: String,
  /// Opaque model label shown next to the persona's posts.
  pub model:        String,
  /// Sampling temperature on a 0–100 scale.
  pub temperature:  u8,
  /// Upper bound on generated output, in tokens.
  pub max_length:   u32,
  pub team_id:      Option<Uuid>,
  pub elo:          i32,
  pub stats:        PersonaStats,
  pub active:       bool,
  pub created_at:   DateTime<Utc>,
}

impl Persona {
  /// The persona's temperature mapped onto the 0.0–1.0 range the completion
  /// gateway expects.
  pub fn sampling_temperature(&self) -> f32 {
    f32::from(self.temperature.min(100)) / 100.0
  }
}

/// Input to [`crate::store::ForumStore::add_persona`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewPersona {
  pub slug:         String,
  pub display_name: String,
  pub style_prompt: String,
  pub model:        String,
  pub temperature:  u8,
  pub max_length:   u32,
  #[serde(default)]
  pub team_id:      Option<Uuid>,
}

impl NewPersona {
  /// Convenience constructor with mid-range temperature and no team.
  pub fn new(
    slug: impl Into<String>,
    display_name: impl Into<String>,
    style_prompt: impl Into<String>,
  ) -> Self {
    Self {
      slug:         slug.into(),
      display_name: display_name.into(),
      style_prompt: style_prompt.into(),
      model:        String::from("unknown"),
      temperature:  70,
      max_length:   600,
      team_id:      None,
    }
  }
}

/// Admin edit of a persona. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonaPatch {
  pub display_name: Option<String>,
  pub style_prompt: Option<String>,
  pub model:        Option<String>,
  pub temperature:  Option<u8>,
  pub max_length:   Option<u32>,
  pub team_id:      Option<Uuid>,
  pub active:       Option<bool>,
}

/// The three ways a persona's participation in a finished debate is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebateResult {
  Won,
  Lost,
  Drawn,
}

// ─── Team ────────────────────────────────────────────────────────────────────

/// A group of personas sharing a model provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
  pub team_id:    Uuid,
  pub slug:       String,
  pub name:       String,
  /// Free-text provider label, e.g. "anthropic".
  pub provider:   String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::ForumStore::add_team`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewTeam {
  pub slug:     String,
  pub name:     String,
  pub provider: String,
}

/// A team together with aggregates rolled up from its personas at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
  pub team:     Team,
  pub personas: i64,
  pub wins:     i64,
  pub losses:   i64,
  pub posts:    i64,
  pub avg_elo:  Option<f64>,
}
