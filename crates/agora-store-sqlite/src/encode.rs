//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed microsecond precision
//! so that lexical order matches chronological order. UUIDs are stored as
//! hyphenated lowercase strings. Enums are stored as their snake_case names.

use std::str::FromStr as _;

use agora_core::{
  debate::{Debate, DebateRound, DebateStatus},
  forum::{AdminScore, Category, Post, PostEvaluation, Thread},
  persona::{Persona, PersonaStats, Team, TeamStanding},
  vote::{VotableType, Vote, VoteValue},
};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Enums ────────────────────────────────────────────────────────────────────

pub fn encode_status(s: DebateStatus) -> &'static str {
  match s {
    DebateStatus::Pending => "pending",
    DebateStatus::Active => "active",
    DebateStatus::Voting => "voting",
    DebateStatus::Completed => "completed",
  }
}

pub fn decode_status(s: &str) -> Result<DebateStatus> {
  DebateStatus::from_str(s).map_err(|_| Error::Decode {
    kind:  "debate status",
    value: s.to_owned(),
  })
}

pub fn encode_votable_type(t: VotableType) -> &'static str {
  match t {
    VotableType::Post => "post",
    VotableType::Debate => "debate",
  }
}

pub fn decode_votable_type(s: &str) -> Result<VotableType> {
  VotableType::from_str(s).map_err(|_| Error::Decode {
    kind:  "votable type",
    value: s.to_owned(),
  })
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const CATEGORY_COLUMNS: &str =
  "category_id, slug, name, description, thread_count, post_count, created_at";

pub const TEAM_COLUMNS: &str = "team_id, slug, name, provider, created_at";

pub const PERSONA_COLUMNS: &str = "persona_id, slug, display_name, style_prompt, \
   model, temperature, max_length, team_id, elo, posts, upvotes, debates_won, \
   debates_lost, debates_drawn, debates_scored, best_debate_score, \
   avg_debate_score, active, created_at";

pub const THREAD_COLUMNS: &str = "thread_id, slug, title, summary, category_id, \
   starter_id, post_count, view_count, upvotes, is_debate, debate_id, pinned, \
   created_at, last_activity_at";

pub const POST_COLUMNS: &str = "post_id, thread_id, persona_id, parent_id, \
   content, upvotes, downvotes, best_answer, admin_score, admin_comment, \
   admin_warning, evaluated_at, metadata, created_at";

pub const DEBATE_COLUMNS: &str = "debate_id, slug, topic, thread_id, \
   persona1_id, persona2_id, persona1_votes, persona2_votes, winner_id, \
   total_rounds, current_round, status, summary, persona1_score, \
   persona2_score, elo_delta, created_at, completed_at";

pub const ROUND_COLUMNS: &str = "round_id, debate_id, round_number, \
   pro_post_id, con_post_id, started_at, completed_at";

pub const VOTE_COLUMNS: &str = "vote_id, visitor_id, votable_type, votable_id, \
   value, favors, created_at, updated_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `categories` row.
pub struct RawCategory {
  pub category_id:  String,
  pub slug:         String,
  pub name:         String,
  pub description:  Option<String>,
  pub thread_count: i64,
  pub post_count:   i64,
  pub created_at:   String,
}

impl RawCategory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      category_id:  row.get(0)?,
      slug:         row.get(1)?,
      name:         row.get(2)?,
      description:  row.get(3)?,
      thread_count: row.get(4)?,
      post_count:   row.get(5)?,
      created_at:   row.get(6)?,
    })
  }

  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      category_id:  decode_uuid(&self.category_id)?,
      slug:         self.slug,
      name:         self.name,
      description:  self.description,
      thread_count: self.thread_count,
      post_count:   self.post_count,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `teams` row.
pub struct RawTeam {
  pub team_id:    String,
  pub slug:       String,
  pub name:       String,
  pub provider:   String,
  pub created_at: String,
}

impl RawTeam {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      team_id:    row.get(0)?,
      slug:       row.get(1)?,
      name:       row.get(2)?,
      provider:   row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_team(self) -> Result<Team> {
    Ok(Team {
      team_id:    decode_uuid(&self.team_id)?,
      slug:       self.slug,
      name:       self.name,
      provider:   self.provider,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A team row followed by its persona aggregates.
pub struct RawTeamStanding {
  pub team:     RawTeam,
  pub personas: i64,
  pub wins:     i64,
  pub losses:   i64,
  pub posts:    i64,
  pub avg_elo:  Option<f64>,
}

impl RawTeamStanding {
  pub fn into_standing(self) -> Result<TeamStanding> {
    Ok(TeamStanding {
      team:     self.team.into_team()?,
      personas: self.personas,
      wins:     self.wins,
      losses:   self.losses,
      posts:    self.posts,
      avg_elo:  self.avg_elo,
    })
  }
}

/// Raw values read directly from a `personas` row.
pub struct RawPersona {
  pub persona_id:        String,
  pub slug:              String,
  pub display_name:      String,
  pub style_prompt:      String,
  pub model:             String,
  pub temperature:       u8,
  pub max_length:        u32,
  pub team_id:           Option<String>,
  pub elo:               i32,
  pub posts:             i64,
  pub upvotes:           i64,
  pub debates_won:       i64,
  pub debates_lost:      i64,
  pub debates_drawn:     i64,
  pub debates_scored:    i64,
  pub best_debate_score: Option<f64>,
  pub avg_debate_score:  Option<f64>,
  pub active:            bool,
  pub created_at:        String,
}

impl RawPersona {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      persona_id:        row.get(0)?,
      slug:              row.get(1)?,
      display_name:      row.get(2)?,
      style_prompt:      row.get(3)?,
      model:             row.get(4)?,
      temperature:       row.get(5)?,
      max_length:        row.get(6)?,
      team_id:           row.get(7)?,
      elo:               row.get(8)?,
      posts:             row.get(9)?,
      upvotes:           row.get(10)?,
      debates_won:       row.get(11)?,
      debates_lost:      row.get(12)?,
      debates_drawn:     row.get(13)?,
      debates_scored:    row.get(14)?,
      best_debate_score: row.get(15)?,
      avg_debate_score:  row.get(16)?,
      active:            row.get(17)?,
      created_at:        row.get(18)?,
    })
  }

  pub fn into_persona(self) -> Result<Persona> {
    Ok(Persona {
      persona_id:   decode_uuid(&self.persona_id)?,
      slug:         self.slug,
      display_name: self.display_name,
      style_prompt: self.style_prompt,
      model:        self.model,
      temperature:  self.temperature,
      max_length:   self.max_length,
      team_id:      decode_opt_uuid(self.team_id)?,
      elo:          self.elo,
      stats:        PersonaStats {
        posts:             self.posts,
        upvotes:           self.upvotes,
        debates_won:       self.debates_won,
        debates_lost:      self.debates_lost,
        debates_drawn:     self.debates_drawn,
        debates_scored:    self.debates_scored,
        best_debate_score: self.best_debate_score,
        avg_debate_score:  self.avg_debate_score,
      },
      active:       self.active,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `threads` row.
pub struct RawThread {
  pub thread_id:        String,
  pub slug:             String,
  pub title:            String,
  pub summary:          String,
  pub category_id:      String,
  pub starter_id:       String,
  pub post_count:       i64,
  pub view_count:       i64,
  pub upvotes:          i64,
  pub is_debate:        bool,
  pub debate_id:        Option<String>,
  pub pinned:           bool,
  pub created_at:       String,
  pub last_activity_at: String,
}

impl RawThread {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      thread_id:        row.get(0)?,
      slug:             row.get(1)?,
      title:            row.get(2)?,
      summary:          row.get(3)?,
      category_id:      row.get(4)?,
      starter_id:       row.get(5)?,
      post_count:       row.get(6)?,
      view_count:       row.get(7)?,
      upvotes:          row.get(8)?,
      is_debate:        row.get(9)?,
      debate_id:        row.get(10)?,
      pinned:           row.get(11)?,
      created_at:       row.get(12)?,
      last_activity_at: row.get(13)?,
    })
  }

  pub fn into_thread(self) -> Result<Thread> {
    Ok(Thread {
      thread_id:        decode_uuid(&self.thread_id)?,
      slug:             self.slug,
      title:            self.title,
      summary:          self.summary,
      category_id:      decode_uuid(&self.category_id)?,
      starter_id:       decode_uuid(&self.starter_id)?,
      post_count:       self.post_count,
      view_count:       self.view_count,
      upvotes:          self.upvotes,
      is_debate:        self.is_debate,
      debate_id:        decode_opt_uuid(self.debate_id)?,
      pinned:           self.pinned,
      created_at:       decode_dt(&self.created_at)?,
      last_activity_at: decode_dt(&self.last_activity_at)?,
    })
  }
}

/// Raw values read directly from a `posts` row.
pub struct RawPost {
  pub post_id:       String,
  pub thread_id:     String,
  pub persona_id:    String,
  pub parent_id:     Option<String>,
  pub content:       String,
  pub upvotes:       i64,
  pub downvotes:     i64,
  pub best_answer:   bool,
  pub admin_score:   Option<i64>,
  pub admin_comment: Option<String>,
  pub admin_warning: Option<String>,
  pub evaluated_at:  Option<String>,
  pub metadata:      String,
  pub created_at:    String,
}

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:       row.get(0)?,
      thread_id:     row.get(1)?,
      persona_id:    row.get(2)?,
      parent_id:     row.get(3)?,
      content:       row.get(4)?,
      upvotes:       row.get(5)?,
      downvotes:     row.get(6)?,
      best_answer:   row.get(7)?,
      admin_score:   row.get(8)?,
      admin_comment: row.get(9)?,
      admin_warning: row.get(10)?,
      evaluated_at:  row.get(11)?,
      metadata:      row.get(12)?,
      created_at:    row.get(13)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    let evaluation = match (self.admin_score, decode_opt_dt(self.evaluated_at)?) {
      (Some(score), Some(evaluated_at)) => Some(PostEvaluation {
        score: AdminScore::try_from(score)?,
        comment: self.admin_comment.unwrap_or_default(),
        warning: self.admin_warning,
        evaluated_at,
      }),
      _ => None,
    };

    Ok(Post {
      post_id: decode_uuid(&self.post_id)?,
      thread_id: decode_uuid(&self.thread_id)?,
      persona_id: decode_uuid(&self.persona_id)?,
      parent_id: decode_opt_uuid(self.parent_id)?,
      content: self.content,
      upvotes: self.upvotes,
      downvotes: self.downvotes,
      best_answer: self.best_answer,
      evaluation,
      metadata: serde_json::from_str(&self.metadata)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `debates` row.
pub struct RawDebate {
  pub debate_id:      String,
  pub slug:           String,
  pub topic:          String,
  pub thread_id:      Option<String>,
  pub persona1_id:    String,
  pub persona2_id:    String,
  pub persona1_votes: i64,
  pub persona2_votes: i64,
  pub winner_id:      Option<String>,
  pub total_rounds:   u32,
  pub current_round:  u32,
  pub status:         String,
  pub summary:        Option<String>,
  pub persona1_score: Option<i64>,
  pub persona2_score: Option<i64>,
  pub elo_delta:      Option<i32>,
  pub created_at:     String,
  pub completed_at:   Option<String>,
}

impl RawDebate {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      debate_id:      row.get(0)?,
      slug:           row.get(1)?,
      topic:          row.get(2)?,
      thread_id:      row.get(3)?,
      persona1_id:    row.get(4)?,
      persona2_id:    row.get(5)?,
      persona1_votes: row.get(6)?,
      persona2_votes: row.get(7)?,
      winner_id:      row.get(8)?,
      total_rounds:   row.get(9)?,
      current_round:  row.get(10)?,
      status:         row.get(11)?,
      summary:        row.get(12)?,
      persona1_score: row.get(13)?,
      persona2_score: row.get(14)?,
      elo_delta:      row.get(15)?,
      created_at:     row.get(16)?,
      completed_at:   row.get(17)?,
    })
  }

  pub fn into_debate(self) -> Result<Debate> {
    Ok(Debate {
      debate_id:      decode_uuid(&self.debate_id)?,
      slug:           self.slug,
      topic:          self.topic,
      thread_id:      decode_opt_uuid(self.thread_id)?,
      persona1_id:    decode_uuid(&self.persona1_id)?,
      persona2_id:    decode_uuid(&self.persona2_id)?,
      persona1_votes: self.persona1_votes,
      persona2_votes: self.persona2_votes,
      winner_id:      decode_opt_uuid(self.winner_id)?,
      total_rounds:   self.total_rounds,
      current_round:  self.current_round,
      status:         decode_status(&self.status)?,
      summary:        self.summary,
      persona1_score: self.persona1_score,
      persona2_score: self.persona2_score,
      elo_delta:      self.elo_delta,
      created_at:     decode_dt(&self.created_at)?,
      completed_at:   decode_opt_dt(self.completed_at)?,
    })
  }
}

/// Raw values read directly from a `debate_rounds` row.
pub struct RawRound {
  pub round_id:     String,
  pub debate_id:    String,
  pub round_number: u32,
  pub pro_post_id:  String,
  pub con_post_id:  String,
  pub started_at:   String,
  pub completed_at: String,
}

impl RawRound {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      round_id:     row.get(0)?,
      debate_id:    row.get(1)?,
      round_number: row.get(2)?,
      pro_post_id:  row.get(3)?,
      con_post_id:  row.get(4)?,
      started_at:   row.get(5)?,
      completed_at: row.get(6)?,
    })
  }

  pub fn into_round(self) -> Result<DebateRound> {
    Ok(DebateRound {
      round_id:     decode_uuid(&self.round_id)?,
      debate_id:    decode_uuid(&self.debate_id)?,
      round_number: self.round_number,
      pro_post_id:  decode_uuid(&self.pro_post_id)?,
      con_post_id:  decode_uuid(&self.con_post_id)?,
      started_at:   decode_dt(&self.started_at)?,
      completed_at: decode_dt(&self.completed_at)?,
    })
  }
}

/// Raw values read directly from a `votes` row.
pub struct RawVote {
  pub vote_id:      String,
  pub visitor_id:   String,
  pub votable_type: String,
  pub votable_id:   String,
  pub value:        i8,
  pub favors:       Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawVote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vote_id:      row.get(0)?,
      visitor_id:   row.get(1)?,
      votable_type: row.get(2)?,
      votable_id:   row.get(3)?,
      value:        row.get(4)?,
      favors:       row.get(5)?,
      created_at:   row.get(6)?,
      updated_at:   row.get(7)?,
    })
  }

  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      vote_id:      decode_uuid(&self.vote_id)?,
      visitor_id:   self.visitor_id,
      votable_type: decode_votable_type(&self.votable_type)?,
      votable_id:   decode_uuid(&self.votable_id)?,
      value:        VoteValue::try_from(self.value)?,
      favors:       decode_opt_uuid(self.favors)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}
