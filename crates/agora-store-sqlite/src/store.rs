//! [`SqliteStore`], the SQLite implementation of [`ForumStore`].

use std::path::Path;

use agora_core::{
  Error as CoreError,
  debate::{
    Debate, DebateFinalization, DebateRound, DebateStatus, NewDebate,
    NewDebateRound,
  },
  forum::{
    Category, NewCategory, NewPost, NewThread, Post, PostEvaluation, Thread,
    ThreadQuery,
  },
  persona::{
    DEFAULT_ELO, DebateResult, NewPersona, NewTeam, Persona, PersonaPatch,
    PersonaStats, Team, TeamStanding,
  },
  store::ForumStore,
  topic::NewUsedTopic,
  vote::{NewVote, VotableType, Vote, VoteOutcome, VoteValue},
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    CATEGORY_COLUMNS, DEBATE_COLUMNS, PERSONA_COLUMNS, POST_COLUMNS,
    ROUND_COLUMNS, RawCategory, RawDebate, RawPersona, RawPost, RawRound,
    RawTeam, RawTeamStanding, RawThread, RawVote, THREAD_COLUMNS,
    VOTE_COLUMNS, encode_dt, encode_status, encode_uuid, encode_votable_type,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Agora forum store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("schema initialised");
    Ok(())
  }

  /// Run a single-row persona lookup.
  async fn query_persona(
    &self,
    filter: &'static str,
    value: String,
  ) -> Result<Option<Persona>> {
    let raw: Option<RawPersona> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {PERSONA_COLUMNS} FROM personas WHERE {filter} = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![value], RawPersona::from_row)
            .optional()?,
        )
      })
      .await?;
    raw.map(RawPersona::into_persona).transpose()
  }

  async fn query_thread(
    &self,
    filter: &'static str,
    value: String,
  ) -> Result<Option<Thread>> {
    let raw: Option<RawThread> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads WHERE {filter} = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![value], RawThread::from_row)
            .optional()?,
        )
      })
      .await?;
    raw.map(RawThread::into_thread).transpose()
  }

  /// Apply `sql` to one persona row, failing if the persona does not exist.
  async fn update_persona_counter(
    &self,
    id: Uuid,
    sql: &'static str,
    amount: i64,
  ) -> Result<()> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(sql, rusqlite::params![id_str, amount])?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::PersonaNotFound(id.to_string()).into());
    }
    Ok(())
  }
}

// ─── Vote bookkeeping ────────────────────────────────────────────────────────

/// What a vote points at, with the ids needed to adjust derived counters.
enum VoteTarget {
  Post {
    post_id:   String,
    thread_id: String,
    author_id: String,
  },
  Debate {
    debate_id:   String,
    persona1_id: String,
  },
}

impl VoteTarget {
  /// Resolve and check the vote's target. Domain failures are returned in
  /// the inner `Result` so the caller can roll back without a database error.
  fn load(
    conn: &rusqlite::Connection,
    input: &NewVote,
  ) -> rusqlite::Result<std::result::Result<Self, CoreError>> {
    let id_str = encode_uuid(input.votable_id);
    match input.votable_type {
      VotableType::Post => {
        let row: Option<(String, String)> = conn
          .query_row(
            "SELECT thread_id, persona_id FROM posts WHERE post_id = ?1",
            rusqlite::params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        Ok(match row {
          Some((thread_id, author_id)) => Ok(Self::Post {
            post_id: id_str,
            thread_id,
            author_id,
          }),
          None => Err(CoreError::PostNotFound(input.votable_id)),
        })
      }
      VotableType::Debate => {
        let row: Option<(String, String, String)> = conn
          .query_row(
            "SELECT persona1_id, persona2_id, status FROM debates WHERE debate_id = ?1",
            rusqlite::params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
          )
          .optional()?;
        let Some((persona1_id, persona2_id, status)) = row else {
          return Ok(Err(CoreError::DebateNotFound(input.votable_id)));
        };
        if status == encode_status(DebateStatus::Completed) {
          return Ok(Err(CoreError::InvalidVote(
            "debate is already completed".into(),
          )));
        }
        let favors = input.favors.map(encode_uuid);
        if favors.is_some_and(|f| f != persona1_id && f != persona2_id) {
          return Ok(Err(CoreError::InvalidVote(
            "favoured persona is not a debater".into(),
          )));
        }
        Ok(Ok(Self::Debate { debate_id: id_str, persona1_id }))
      }
    }
  }

  /// Add (`sign = 1`) or withdraw (`sign = -1`) one vote's effect on the
  /// derived counters.
  fn apply(
    &self,
    conn: &rusqlite::Connection,
    value: VoteValue,
    favors: Option<&str>,
    sign: i64,
  ) -> rusqlite::Result<()> {
    match self {
      Self::Post { post_id, thread_id, author_id } => match value {
        VoteValue::Up => {
          conn.execute(
            "UPDATE posts SET upvotes = upvotes + ?2 WHERE post_id = ?1",
            rusqlite::params![post_id, sign],
          )?;
          conn.execute(
            "UPDATE threads SET upvotes = upvotes + ?2 WHERE thread_id = ?1",
            rusqlite::params![thread_id, sign],
          )?;
          conn.execute(
            "UPDATE personas SET upvotes = upvotes + ?2 WHERE persona_id = ?1",
            rusqlite::params![author_id, sign],
          )?;
        }
        VoteValue::Down => {
          conn.execute(
            "UPDATE posts SET downvotes = downvotes + ?2 WHERE post_id = ?1",
            rusqlite::params![post_id, sign],
          )?;
        }
        VoteValue::Clear => {}
      },
      Self::Debate { debate_id, persona1_id } => {
        let sql = if favors == Some(persona1_id.as_str()) {
          "UPDATE debates SET persona1_votes = persona1_votes + ?2 WHERE debate_id = ?1"
        } else {
          "UPDATE debates SET persona2_votes = persona2_votes + ?2 WHERE debate_id = ?1"
        };
        conn.execute(sql, rusqlite::params![debate_id, sign])?;
      }
    }
    Ok(())
  }
}

/// Reconcile the visitor's stored vote with `input`, inside the caller's
/// transaction.
fn apply_vote(
  conn: &rusqlite::Connection,
  input: &NewVote,
  now: &str,
) -> rusqlite::Result<std::result::Result<VoteOutcome, CoreError>> {
  let target = match VoteTarget::load(conn, input)? {
    Ok(target) => target,
    Err(e) => return Ok(Err(e)),
  };

  let type_str = encode_votable_type(input.votable_type);
  let id_str = encode_uuid(input.votable_id);
  let favors = input.favors.map(encode_uuid);
  let value = i8::from(input.value);

  let existing: Option<(String, i8, Option<String>)> = conn
    .query_row(
      "SELECT vote_id, value, favors FROM votes
       WHERE visitor_id = ?1 AND votable_type = ?2 AND votable_id = ?3",
      rusqlite::params![input.visitor_id, type_str, id_str],
      |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )
    .optional()?;

  let outcome = match (existing, input.value) {
    (None, VoteValue::Clear) => VoteOutcome::Ignored,
    (None, _) => {
      conn.execute(
        "INSERT INTO votes (
           vote_id, visitor_id, votable_type, votable_id, value, favors,
           created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        rusqlite::params![
          encode_uuid(Uuid::new_v4()),
          input.visitor_id,
          type_str,
          id_str,
          value,
          favors,
          now,
        ],
      )?;
      target.apply(conn, input.value, favors.as_deref(), 1)?;
      VoteOutcome::Created
    }
    (Some((vote_id, old_value, old_favors)), new_value) => {
      let old_value = match VoteValue::try_from(old_value) {
        Ok(v) => v,
        Err(e) => return Ok(Err(e)),
      };
      if new_value == VoteValue::Clear {
        conn.execute(
          "DELETE FROM votes WHERE vote_id = ?1",
          rusqlite::params![vote_id],
        )?;
        target.apply(conn, old_value, old_favors.as_deref(), -1)?;
        VoteOutcome::Removed
      } else if old_value == new_value && old_favors == favors {
        VoteOutcome::Unchanged
      } else {
        conn.execute(
          "UPDATE votes SET value = ?2, favors = ?3, updated_at = ?4
           WHERE vote_id = ?1",
          rusqlite::params![vote_id, value, favors, now],
        )?;
        target.apply(conn, old_value, old_favors.as_deref(), -1)?;
        target.apply(conn, new_value, favors.as_deref(), 1)?;
        VoteOutcome::Changed
      }
    }
  };

  Ok(Ok(outcome))
}

// ─── ForumStore impl ─────────────────────────────────────────────────────────

impl ForumStore for SqliteStore {
  type Error = Error;

  // ── Categories ────────────────────────────────────────────────────────────

  async fn add_category(&self, input: NewCategory) -> Result<Category> {
    let category = Category {
      category_id:  Uuid::new_v4(),
      slug:         input.slug,
      name:         input.name,
      description:  input.description,
      thread_count: 0,
      post_count:   0,
      created_at:   Utc::now(),
    };

    let id_str      = encode_uuid(category.category_id);
    let slug        = category.slug.clone();
    let name        = category.name.clone();
    let description = category.description.clone();
    let at_str      = encode_dt(category.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO categories (category_id, slug, name, description, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, slug, name, description, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(category)
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map([], RawCategory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn get_category_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> Result<Option<Category>> {
    let slug = slug.to_owned();
    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = ?1"),
              rusqlite::params![slug],
              RawCategory::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCategory::into_category).transpose()
  }

  // ── Teams ─────────────────────────────────────────────────────────────────

  async fn add_team(&self, input: NewTeam) -> Result<Team> {
    let team = Team {
      team_id:    Uuid::new_v4(),
      slug:       input.slug,
      name:       input.name,
      provider:   input.provider,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(team.team_id);
    let slug     = team.slug.clone();
    let name     = team.name.clone();
    let provider = team.provider.clone();
    let at_str   = encode_dt(team.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO teams (team_id, slug, name, provider, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, slug, name, provider, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(team)
  }

  async fn list_team_standings(&self) -> Result<Vec<TeamStanding>> {
    let raws: Vec<RawTeamStanding> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT t.team_id, t.slug, t.name, t.provider, t.created_at,
                  COUNT(p.persona_id),
                  COALESCE(SUM(p.debates_won), 0),
                  COALESCE(SUM(p.debates_lost), 0),
                  COALESCE(SUM(p.posts), 0),
                  AVG(p.elo)
           FROM teams t
           LEFT JOIN personas p ON p.team_id = t.team_id AND p.active = 1
           GROUP BY t.team_id
           ORDER BY COALESCE(AVG(p.elo), 0) DESC, t.slug",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawTeamStanding {
              team:     RawTeam::from_row(row)?,
              personas: row.get(5)?,
              wins:     row.get(6)?,
              losses:   row.get(7)?,
              posts:    row.get(8)?,
              avg_elo:  row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTeamStanding::into_standing).collect()
  }

  // ── Personas ──────────────────────────────────────────────────────────────

  async fn add_persona(&self, input: NewPersona) -> Result<Persona> {
    let persona = Persona {
      persona_id:   Uuid::new_v4(),
      slug:         input.slug,
      display_name: input.display_name,
      style_prompt: input.style_prompt,
      model:        input.model,
      temperature:  input.temperature,
      max_length:   input.max_length,
      team_id:      input.team_id,
      elo:          DEFAULT_ELO,
      stats:        PersonaStats::default(),
      active:       true,
      created_at:   Utc::now(),
    };

    let id_str       = encode_uuid(persona.persona_id);
    let slug         = persona.slug.clone();
    let display_name = persona.display_name.clone();
    let style_prompt = persona.style_prompt.clone();
    let model        = persona.model.clone();
    let temperature  = persona.temperature;
    let max_length   = persona.max_length;
    let team_str     = persona.team_id.map(encode_uuid);
    let at_str       = encode_dt(persona.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO personas (
             persona_id, slug, display_name, style_prompt, model,
             temperature, max_length, team_id, elo, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            slug,
            display_name,
            style_prompt,
            model,
            temperature,
            max_length,
            team_str,
            DEFAULT_ELO,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(persona)
  }

  async fn get_persona(&self, id: Uuid) -> Result<Option<Persona>> {
    self.query_persona("persona_id", encode_uuid(id)).await
  }

  async fn get_persona_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> Result<Option<Persona>> {
    self.query_persona("slug", slug.to_owned()).await
  }

  async fn list_personas(&self, active_only: bool) -> Result<Vec<Persona>> {
    let raws: Vec<RawPersona> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSONA_COLUMNS} FROM personas
           WHERE (?1 = 0 OR active = 1)
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![active_only], RawPersona::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPersona::into_persona).collect()
  }

  async fn update_persona(
    &self,
    id: Uuid,
    patch: PersonaPatch,
  ) -> Result<Option<Persona>> {
    let id_str   = encode_uuid(id);
    let team_str = patch.team_id.map(encode_uuid);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE personas SET
             display_name = COALESCE(?2, display_name),
             style_prompt = COALESCE(?3, style_prompt),
             model        = COALESCE(?4, model),
             temperature  = COALESCE(?5, temperature),
             max_length   = COALESCE(?6, max_length),
             team_id      = COALESCE(?7, team_id),
             active       = COALESCE(?8, active)
           WHERE persona_id = ?1",
          rusqlite::params![
            id_str,
            patch.display_name,
            patch.style_prompt,
            patch.model,
            patch.temperature,
            patch.max_length,
            team_str,
            patch.active,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_persona(id).await
  }

  async fn adjust_persona_elo(&self, id: Uuid, delta: i32) -> Result<()> {
    self
      .update_persona_counter(
        id,
        "UPDATE personas SET elo = elo + ?2 WHERE persona_id = ?1",
        i64::from(delta),
      )
      .await
  }

  async fn add_persona_upvotes(&self, id: Uuid, upvotes: i64) -> Result<()> {
    self
      .update_persona_counter(
        id,
        "UPDATE personas SET upvotes = upvotes + ?2 WHERE persona_id = ?1",
        upvotes,
      )
      .await
  }

  async fn record_debate_result(
    &self,
    id: Uuid,
    result: DebateResult,
  ) -> Result<()> {
    let sql = match result {
      DebateResult::Won => {
        "UPDATE personas SET debates_won = debates_won + ?2 WHERE persona_id = ?1"
      }
      DebateResult::Lost => {
        "UPDATE personas SET debates_lost = debates_lost + ?2 WHERE persona_id = ?1"
      }
      DebateResult::Drawn => {
        "UPDATE personas SET debates_drawn = debates_drawn + ?2 WHERE persona_id = ?1"
      }
    };
    self.update_persona_counter(id, sql, 1).await
  }

  async fn record_debate_score(&self, id: Uuid, score: f64) -> Result<()> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE personas SET
             best_debate_score = MAX(COALESCE(best_debate_score, ?2), ?2),
             avg_debate_score  = (COALESCE(avg_debate_score, 0) * debates_scored + ?2)
                                 / (debates_scored + 1),
             debates_scored    = debates_scored + 1
           WHERE persona_id = ?1",
          rusqlite::params![id_str, score],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::PersonaNotFound(id.to_string()).into());
    }
    Ok(())
  }

  // ── Threads ───────────────────────────────────────────────────────────────

  async fn insert_thread(&self, input: NewThread) -> Result<Thread> {
    let now = Utc::now();
    let thread = Thread {
      thread_id:        Uuid::new_v4(),
      slug:             input.slug,
      title:            input.title,
      summary:          input.summary,
      category_id:      input.category_id,
      starter_id:       input.starter_id,
      post_count:       0,
      view_count:       0,
      upvotes:          0,
      is_debate:        input.is_debate,
      debate_id:        None,
      pinned:           false,
      created_at:       now,
      last_activity_at: now,
    };

    let id_str       = encode_uuid(thread.thread_id);
    let slug         = thread.slug.clone();
    let title        = thread.title.clone();
    let summary      = thread.summary.clone();
    let category_str = encode_uuid(thread.category_id);
    let starter_str  = encode_uuid(thread.starter_id);
    let is_debate    = thread.is_debate;
    let at_str       = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO threads (
             thread_id, slug, title, summary, category_id, starter_id,
             is_debate, created_at, last_activity_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![
            id_str,
            slug,
            title,
            summary,
            category_str,
            starter_str,
            is_debate,
            at_str,
          ],
        )?;
        tx.execute(
          "UPDATE categories SET thread_count = thread_count + 1
           WHERE category_id = ?1",
          rusqlite::params![category_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(thread)
  }

  async fn get_thread(&self, id: Uuid) -> Result<Option<Thread>> {
    self.query_thread("thread_id", encode_uuid(id)).await
  }

  async fn get_thread_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> Result<Option<Thread>> {
    self.query_thread("slug", slug.to_owned()).await
  }

  async fn list_threads<'a>(
    &'a self,
    query: &'a ThreadQuery,
  ) -> Result<Vec<Thread>> {
    let category_str = query.category_id.map(encode_uuid);
    let is_debate = query.is_debate;
    // SQLite treats a negative LIMIT as "no limit".
    let limit = query.limit.map_or(-1, |l| l as i64);
    let offset = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawThread> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {THREAD_COLUMNS} FROM threads
           WHERE (?1 IS NULL OR category_id = ?1)
             AND (?4 IS NULL OR is_debate = ?4)
           ORDER BY pinned DESC, last_activity_at DESC, rowid DESC
           LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![category_str, limit, offset, is_debate],
            RawThread::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawThread::into_thread).collect()
  }

  async fn list_thread_titles(&self) -> Result<Vec<String>> {
    let titles = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT title FROM threads")?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(titles)
  }

  async fn increment_thread_views(&self, thread_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(thread_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE threads SET view_count = view_count + 1 WHERE thread_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn link_thread_debate(
    &self,
    thread_id: Uuid,
    debate_id: Uuid,
  ) -> Result<()> {
    let thread_str = encode_uuid(thread_id);
    let debate_str = encode_uuid(debate_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE threads SET debate_id = ?2, is_debate = 1 WHERE thread_id = ?1",
          rusqlite::params![thread_str, debate_str],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::ThreadNotFound(thread_id).into());
    }
    Ok(())
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn insert_post(&self, input: NewPost) -> Result<Post> {
    let post = Post {
      post_id:     Uuid::new_v4(),
      thread_id:   input.thread_id,
      persona_id:  input.persona_id,
      parent_id:   input.parent_id,
      content:     input.content,
      upvotes:     0,
      downvotes:   0,
      best_answer: false,
      evaluation:  None,
      metadata:    input.metadata,
      created_at:  Utc::now(),
    };

    let id_str       = encode_uuid(post.post_id);
    let thread_str   = encode_uuid(post.thread_id);
    let persona_str  = encode_uuid(post.persona_id);
    let parent_str   = post.parent_id.map(encode_uuid);
    let content      = post.content.clone();
    let metadata_str = post.metadata.to_string();
    let at_str       = encode_dt(post.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let category: Option<String> = tx
          .query_row(
            "SELECT category_id FROM threads WHERE thread_id = ?1",
            rusqlite::params![thread_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(category_str) = category else {
          return Ok(false);
        };

        tx.execute(
          "INSERT INTO posts (
             post_id, thread_id, persona_id, parent_id, content, metadata,
             created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            thread_str,
            persona_str,
            parent_str,
            content,
            metadata_str,
            at_str,
          ],
        )?;
        tx.execute(
          "UPDATE threads SET post_count = post_count + 1, last_activity_at = ?2
           WHERE thread_id = ?1",
          rusqlite::params![thread_str, at_str],
        )?;
        tx.execute(
          "UPDATE categories SET post_count = post_count + 1 WHERE category_id = ?1",
          rusqlite::params![category_str],
        )?;
        tx.execute(
          "UPDATE personas SET posts = posts + 1 WHERE persona_id = ?1",
          rusqlite::params![persona_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(CoreError::ThreadNotFound(post.thread_id).into());
    }
    Ok(post)
  }

  async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {POST_COLUMNS} FROM posts WHERE post_id = ?1"),
              rusqlite::params![id_str],
              RawPost::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn list_thread_posts(&self, thread_id: Uuid) -> Result<Vec<Post>> {
    let id_str = encode_uuid(thread_id);
    let raws: Vec<RawPost> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {POST_COLUMNS} FROM posts WHERE thread_id = ?1
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }

  async fn record_post_evaluation(
    &self,
    post_id: Uuid,
    evaluation: PostEvaluation,
  ) -> Result<()> {
    let id_str = encode_uuid(post_id);
    let score  = i64::from(evaluation.score);
    let at_str = encode_dt(evaluation.evaluated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE posts SET admin_score = ?2, admin_comment = ?3,
                            admin_warning = ?4, evaluated_at = ?5
           WHERE post_id = ?1",
          rusqlite::params![
            id_str,
            score,
            evaluation.comment,
            evaluation.warning,
            at_str,
          ],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::PostNotFound(post_id).into());
    }
    Ok(())
  }

  // ── Debates ───────────────────────────────────────────────────────────────

  async fn insert_debate(&self, input: NewDebate) -> Result<Debate> {
    let debate = Debate {
      debate_id:      Uuid::new_v4(),
      slug:           input.slug,
      topic:          input.topic,
      thread_id:      input.thread_id,
      persona1_id:    input.persona1_id,
      persona2_id:    input.persona2_id,
      persona1_votes: 0,
      persona2_votes: 0,
      winner_id:      None,
      total_rounds:   input.total_rounds,
      current_round:  0,
      status:         input.status,
      summary:        None,
      persona1_score: None,
      persona2_score: None,
      elo_delta:      None,
      created_at:     Utc::now(),
      completed_at:   None,
    };

    let id_str       = encode_uuid(debate.debate_id);
    let slug         = debate.slug.clone();
    let topic        = debate.topic.clone();
    let thread_str   = debate.thread_id.map(encode_uuid);
    let p1_str       = encode_uuid(debate.persona1_id);
    let p2_str       = encode_uuid(debate.persona2_id);
    let total_rounds = debate.total_rounds;
    let status_str   = encode_status(debate.status);
    let at_str       = encode_dt(debate.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO debates (
             debate_id, slug, topic, thread_id, persona1_id, persona2_id,
             total_rounds, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            slug,
            topic,
            thread_str,
            p1_str,
            p2_str,
            total_rounds,
            status_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(debate)
  }

  async fn get_debate(&self, id: Uuid) -> Result<Option<Debate>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawDebate> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {DEBATE_COLUMNS} FROM debates WHERE debate_id = ?1"),
              rusqlite::params![id_str],
              RawDebate::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDebate::into_debate).transpose()
  }

  async fn list_debates(
    &self,
    status: Option<DebateStatus>,
  ) -> Result<Vec<Debate>> {
    let status_str = status.map(encode_status);
    let raws: Vec<RawDebate> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DEBATE_COLUMNS} FROM debates
           WHERE (?1 IS NULL OR status = ?1)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![status_str], RawDebate::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDebate::into_debate).collect()
  }

  async fn insert_debate_round(
    &self,
    input: NewDebateRound,
  ) -> Result<DebateRound> {
    let round = DebateRound {
      round_id:     Uuid::new_v4(),
      debate_id:    input.debate_id,
      round_number: input.round_number,
      pro_post_id:  input.pro_post_id,
      con_post_id:  input.con_post_id,
      started_at:   input.started_at,
      completed_at: Utc::now(),
    };

    let id_str       = encode_uuid(round.round_id);
    let debate_str   = encode_uuid(round.debate_id);
    let round_number = round.round_number;
    let pro_str      = encode_uuid(round.pro_post_id);
    let con_str      = encode_uuid(round.con_post_id);
    let started_str  = encode_dt(round.started_at);
    let done_str     = encode_dt(round.completed_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "INSERT OR IGNORE INTO debate_rounds (
             round_id, debate_id, round_number, pro_post_id, con_post_id,
             started_at, completed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            debate_str,
            round_number,
            pro_str,
            con_str,
            started_str,
            done_str,
          ],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        tx.execute(
          "UPDATE debates SET current_round = MAX(current_round, ?2)
           WHERE debate_id = ?1",
          rusqlite::params![debate_str, round_number],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateRound {
        debate_id: round.debate_id,
        round:     round.round_number,
      });
    }
    Ok(round)
  }

  async fn list_debate_rounds(&self, debate_id: Uuid) -> Result<Vec<DebateRound>> {
    let id_str = encode_uuid(debate_id);
    let raws: Vec<RawRound> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ROUND_COLUMNS} FROM debate_rounds WHERE debate_id = ?1
           ORDER BY round_number"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawRound::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRound::into_round).collect()
  }

  async fn transition_debate(
    &self,
    id: Uuid,
    from: DebateStatus,
    to: DebateStatus,
  ) -> Result<bool> {
    from.transition(to)?;

    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE debates SET status = ?3 WHERE debate_id = ?1 AND status = ?2",
          rusqlite::params![id_str, encode_status(from), encode_status(to)],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn finalize_debate(
    &self,
    id: Uuid,
    outcome: DebateFinalization,
  ) -> Result<bool> {
    let id_str     = encode_uuid(id);
    let winner_str = outcome.winner_id.map(encode_uuid);
    let done_str   = encode_dt(outcome.completed_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE debates SET
             status         = 'completed',
             winner_id      = ?2,
             summary        = COALESCE(?3, summary),
             persona1_score = COALESCE(?4, persona1_score),
             persona2_score = COALESCE(?5, persona2_score),
             elo_delta      = ?6,
             completed_at   = ?7
           WHERE debate_id = ?1 AND status != 'completed'",
          rusqlite::params![
            id_str,
            winner_str,
            outcome.summary,
            outcome.persona1_score,
            outcome.persona2_score,
            outcome.elo_delta,
            done_str,
          ],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  // ── Topic ledger ──────────────────────────────────────────────────────────

  async fn is_topic_used<'a>(&'a self, title_hash: &'a str) -> Result<bool> {
    let hash = title_hash.to_owned();
    let used = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM used_topics WHERE title_hash = ?1",
              rusqlite::params![hash],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(used)
  }

  async fn mark_topic_used(&self, input: NewUsedTopic) -> Result<bool> {
    let id_str       = encode_uuid(Uuid::new_v4());
    let category_str = input.category_id.map(encode_uuid);
    let used_for     = input.used_for.discriminant();
    let used_for_id  = encode_uuid(input.used_for.id());
    let at_str       = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO used_topics (
             topic_id, title_hash, title, source, category_id, used_for,
             used_for_id, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            input.title_hash,
            input.title,
            input.source,
            category_str,
            used_for,
            used_for_id,
            at_str,
          ],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn cast_vote(&self, input: NewVote) -> Result<VoteOutcome> {
    input.validate()?;
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = apply_vote(&tx, &input, &now)?;
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await??;

    tracing::debug!(?outcome, "vote cast");
    Ok(outcome)
  }

  async fn get_vote<'a>(
    &'a self,
    visitor_id: &'a str,
    votable_type: VotableType,
    votable_id: Uuid,
  ) -> Result<Option<Vote>> {
    let visitor  = visitor_id.to_owned();
    let type_str = encode_votable_type(votable_type);
    let id_str   = encode_uuid(votable_id);

    let raw: Option<RawVote> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {VOTE_COLUMNS} FROM votes
                 WHERE visitor_id = ?1 AND votable_type = ?2 AND votable_id = ?3"
              ),
              rusqlite::params![visitor, type_str, id_str],
              RawVote::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVote::into_vote).transpose()
  }
}
