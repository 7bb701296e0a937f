//! Thread and debate orchestration.
//!
//! Each public operation is one sequential unit of work. Inside loops
//! (follow-up replies, debate rounds) a failed step is logged and skipped;
//! whatever was already written stays written.

use std::{collections::HashMap, time::Duration};

use agora_core::{
  debate::{
    Debate, DebateFinalization, DebateRound, DebateStatus, NewDebate,
    NewDebateRound, Stance,
  },
  forum::{Category, NewPost, NewThread, Post, Thread},
  persona::{DebateResult, Persona},
  rating::{VoteTally, VoteVerdict, vote_elo_delta},
  slug::salted_slug,
  store::ForumStore,
  topic::TopicUse,
};
use agora_llm::Completion;
use chrono::Utc;
use rand::{
  Rng,
  distributions::Alphanumeric,
  seq::SliceRandom,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Engine, Error, Result,
  posts::{GeneratedPost, PostRequest, render_context},
  topics::{TopicKind, TopicSuggestion},
};

const SLUG_SALT_LEN: usize = 6;

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// A freshly generated thread with every post that made it in.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadOutcome {
  pub thread: Thread,
  pub posts:  Vec<Post>,
  pub topic:  TopicSuggestion,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebateOutcome {
  pub debate: Debate,
  pub thread: Thread,
  pub rounds: Vec<DebateRound>,
}

/// Result of [`Engine::complete_debate`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DebateCompletion {
  /// This call finalised the debate.
  Finalized {
    debate:    Debate,
    winner_id: Option<Uuid>,
    elo_delta: i32,
  },
  /// The debate was already completed; nothing was written.
  AlreadyCompleted { debate: Debate },
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Render a thread's posts as prompt context, naming each author.
fn thread_context(posts: &[Post], personas: &[Persona]) -> String {
  let names: HashMap<Uuid, &str> = personas
    .iter()
    .map(|p| (p.persona_id, p.display_name.as_str()))
    .collect();
  render_context(posts.iter().map(|post| {
    let name = names.get(&post.persona_id).copied().unwrap_or("Someone");
    (name, post.content.as_str())
  }))
}

fn opener_topic(topic: &TopicSuggestion) -> String {
  if topic.summary.trim().is_empty() {
    topic.title.clone()
  } else {
    format!("{}\n{}", topic.title, topic.summary.trim())
  }
}

/// The motion as presented to one side of a debate.
fn debate_brief(topic: &TopicSuggestion, stance: Stance) -> String {
  let framing = topic.debate.as_ref().map(|d| match stance {
    Stance::Pro => d.pro.trim(),
    Stance::Con => d.con.trim(),
  });
  match framing.filter(|f| !f.is_empty()) {
    Some(framing) => format!("{}\nYour angle: {framing}", topic.title),
    None => topic.title.clone(),
  }
}

impl<S, C> Engine<S, C>
where
  S: ForumStore,
  C: Completion,
{
  // ─── Threads ───────────────────────────────────────────────────────────────

  /// Pick a fresh topic and build a thread around it.
  pub async fn generate_thread(&self) -> Result<ThreadOutcome> {
    let topic = self.generate_topic(TopicKind::Thread).await?;
    self.generate_thread_from(topic).await
  }

  /// Build a thread for `topic`: the opening post, then up to
  /// `orchestrator.max_follow_ups` replies from other personas.
  pub async fn generate_thread_from(
    &self,
    topic: TopicSuggestion,
  ) -> Result<ThreadOutcome> {
    let category = self.resolve_category(topic.category_slug.as_deref()).await?;
    let personas = self.active_personas().await?;
    let starter = self.resolve_starter(&personas, &topic.suggested_personas)?;

    let opener = self
      .generate_post(PostRequest::opener(starter.persona_id, opener_topic(&topic)))
      .await?;

    let thread = self
      .store
      .insert_thread(NewThread {
        slug:        self.thread_slug(&topic.title),
        title:       topic.title.clone(),
        summary:     topic.summary.clone(),
        category_id: category.category_id,
        starter_id:  starter.persona_id,
        is_debate:   false,
      })
      .await
      .map_err(Error::store)?;
    self
      .mark_topic_used(
        &topic.title,
        topic.origin,
        Some(category.category_id),
        TopicUse::Thread(thread.thread_id),
      )
      .await?;

    let first = self.persist_post(thread.thread_id, None, opener).await?;
    tracing::info!(
      thread = %thread.slug,
      category = %category.slug,
      starter = %starter.slug,
      "thread created"
    );

    let mut posts = vec![first];
    for persona in self.pick_follow_ups(&personas, &topic.suggested_personas, starter.persona_id) {
      self.pause_before_reply().await;
      match self.append_reply(&thread, &persona, &posts, &personas).await {
        Ok(post) => posts.push(post),
        Err(e) => tracing::warn!(
          thread = %thread.slug,
          persona = %persona.slug,
          error = %e,
          "follow-up reply failed; continuing"
        ),
      }
    }

    let thread = self.require_thread(thread.thread_id).await?;
    Ok(ThreadOutcome { thread, posts, topic })
  }

  /// Append one reply to an existing thread, preferring a persona other
  /// than the author of the latest post.
  pub async fn reply_to_thread(&self, thread_id: Uuid) -> Result<Post> {
    let thread = self.require_thread(thread_id).await?;
    let posts = self.thread_posts(thread_id).await?;
    let personas = self.active_personas().await?;

    let last_author = posts.last().map(|p| p.persona_id);
    let persona = self
      .with_rng(|rng| {
        let others: Vec<&Persona> = personas
          .iter()
          .filter(|p| Some(p.persona_id) != last_author)
          .collect();
        match others.choose(rng) {
          Some(persona) => Some(*persona),
          None => personas.choose(rng),
        }
      })
      .cloned()
      .ok_or(agora_core::Error::NotEnoughPersonas { needed: 1, available: 0 })?;

    let post = self.append_reply(&thread, &persona, &posts, &personas).await?;
    tracing::info!(thread = %thread.slug, persona = %persona.slug, "reply added");
    Ok(post)
  }

  async fn append_reply(
    &self,
    thread: &Thread,
    persona: &Persona,
    posts: &[Post],
    personas: &[Persona],
  ) -> Result<Post> {
    let context = thread_context(posts, personas);
    let generated = self
      .generate_post(PostRequest::reply(
        persona.persona_id,
        thread.title.as_str(),
        context,
      ))
      .await?;
    self.persist_post(thread.thread_id, None, generated).await
  }

  async fn persist_post(
    &self,
    thread_id: Uuid,
    parent_id: Option<Uuid>,
    generated: GeneratedPost,
  ) -> Result<Post> {
    let metadata = generated.metadata_json();
    self
      .store
      .insert_post(NewPost {
        thread_id,
        persona_id: generated.persona.persona_id,
        parent_id,
        content: generated.content,
        metadata,
      })
      .await
      .map_err(Error::store)
  }

  // ─── Debates ───────────────────────────────────────────────────────────────

  /// Pair two distinct active personas on a fresh motion and generate every
  /// round up front. The debate is left `active`.
  pub async fn create_debate(&self, rounds: Option<u32>) -> Result<DebateOutcome> {
    let total_rounds = rounds.unwrap_or(self.config.orchestrator.debate_rounds).max(1);

    let personas = self.active_personas().await?;
    if personas.len() < 2 {
      return Err(
        agora_core::Error::NotEnoughPersonas {
          needed:    2,
          available: personas.len(),
        }
        .into(),
      );
    }

    let topic = self.generate_topic(TopicKind::Debate).await?;
    let category = self.resolve_category(topic.category_slug.as_deref()).await?;
    let pair: Vec<Persona> = self.with_rng(|rng| {
      personas.choose_multiple(rng, 2).cloned().collect()
    });
    let [pro, con] = <[Persona; 2]>::try_from(pair).map_err(|pair| {
      agora_core::Error::NotEnoughPersonas { needed: 2, available: pair.len() }
    })?;

    let slug = self.thread_slug(&topic.title);
    let thread = self
      .store
      .insert_thread(NewThread {
        slug:        slug.clone(),
        title:       topic.title.clone(),
        summary:     topic.summary.clone(),
        category_id: category.category_id,
        starter_id:  pro.persona_id,
        is_debate:   true,
      })
      .await
      .map_err(Error::store)?;
    let debate = self
      .store
      .insert_debate(NewDebate {
        slug,
        topic: topic.title.clone(),
        thread_id: Some(thread.thread_id),
        persona1_id: pro.persona_id,
        persona2_id: con.persona_id,
        total_rounds,
        status: DebateStatus::Active,
      })
      .await
      .map_err(Error::store)?;
    self
      .store
      .link_thread_debate(thread.thread_id, debate.debate_id)
      .await
      .map_err(Error::store)?;
    self
      .mark_topic_used(
        &topic.title,
        topic.origin,
        Some(category.category_id),
        TopicUse::Debate(debate.debate_id),
      )
      .await?;
    tracing::info!(
      debate = %debate.slug,
      pro = %pro.slug,
      con = %con.slug,
      total_rounds,
      "debate created"
    );

    let debaters = [pro, con];
    for round in 1..=total_rounds {
      if let Err(e) = self
        .run_debate_round(&debate, thread.thread_id, round, &topic, &debaters)
        .await
      {
        tracing::warn!(
          debate = %debate.slug,
          round,
          error = %e,
          "debate round failed; continuing"
        );
      }
    }

    Ok(DebateOutcome {
      debate: self.require_debate(debate.debate_id).await?,
      thread: self.require_thread(thread.thread_id).await?,
      rounds: self
        .store
        .list_debate_rounds(debate.debate_id)
        .await
        .map_err(Error::store)?,
    })
  }

  /// One pro argument, then one con argument that has seen it.
  async fn run_debate_round(
    &self,
    debate: &Debate,
    thread_id: Uuid,
    round: u32,
    topic: &TopicSuggestion,
    debaters: &[Persona; 2],
  ) -> Result<DebateRound> {
    let started_at = Utc::now();
    let mut post_ids = [Uuid::nil(); 2];

    for (slot, stance) in [Stance::Pro, Stance::Con].into_iter().enumerate() {
      let persona = &debaters[slot];
      let prior = self.thread_posts(thread_id).await?;
      let previous = (!prior.is_empty()).then(|| thread_context(&prior, debaters));
      let argument = self
        .generate_debate_argument(
          persona.persona_id,
          &debate_brief(topic, stance),
          stance,
          round,
          previous,
        )
        .await?;
      let post = self.persist_post(thread_id, None, argument).await?;
      post_ids[slot] = post.post_id;
    }

    let [pro_post_id, con_post_id] = post_ids;
    let round = self
      .store
      .insert_debate_round(NewDebateRound {
        debate_id: debate.debate_id,
        round_number: round,
        pro_post_id,
        con_post_id,
        started_at,
      })
      .await
      .map_err(Error::store)?;
    tracing::debug!(debate = %debate.slug, round = round.round_number, "round recorded");
    Ok(round)
  }

  /// Close an active debate to new arguments and open it for votes.
  pub async fn open_voting(&self, debate_id: Uuid) -> Result<Debate> {
    let debate = self.require_debate(debate_id).await?;
    debate.status.transition(DebateStatus::Voting)?;

    let moved = self
      .store
      .transition_debate(debate_id, debate.status, DebateStatus::Voting)
      .await
      .map_err(Error::store)?;
    if !moved {
      let current = self.require_debate(debate_id).await?;
      return Err(
        agora_core::Error::IllegalTransition {
          from: current.status,
          to:   DebateStatus::Voting,
        }
        .into(),
      );
    }
    tracing::info!(debate = %debate.slug, "voting opened");
    self.require_debate(debate_id).await
  }

  /// Finalise a debate from its visitor vote tally.
  ///
  /// The larger tally wins; equal tallies are a draw with no rating change.
  /// The winner gains exactly what the loser gives up. Completing a debate
  /// that is already completed is a no-op.
  pub async fn complete_debate(&self, debate_id: Uuid) -> Result<DebateCompletion> {
    let debate = self.require_debate(debate_id).await?;
    if debate.status.is_terminal() {
      tracing::info!(debate = %debate.slug, "debate already completed");
      return Ok(DebateCompletion::AlreadyCompleted { debate });
    }
    debate.status.transition(DebateStatus::Completed)?;

    let tally = VoteTally {
      pro: debate.persona1_votes,
      con: debate.persona2_votes,
    };
    let (decided, elo_delta) = match tally.verdict() {
      VoteVerdict::Winner { side, winner_votes, loser_votes } => {
        let winner = self.require_persona(debate.persona_for(side)).await?;
        let loser = self
          .require_persona(debate.persona_for(side.opposite()))
          .await?;
        let delta = vote_elo_delta(
          self.config.rating.vote_k,
          winner.elo,
          loser.elo,
          winner_votes,
          loser_votes,
        );
        (Some((winner.persona_id, loser.persona_id)), delta)
      }
      VoteVerdict::Draw => (None, 0),
    };

    let finalized = self
      .store
      .finalize_debate(
        debate_id,
        DebateFinalization {
          winner_id: decided.map(|(winner, _)| winner),
          summary: None,
          persona1_score: None,
          persona2_score: None,
          elo_delta,
          completed_at: Utc::now(),
        },
      )
      .await
      .map_err(Error::store)?;
    if !finalized {
      tracing::info!(debate = %debate.slug, "debate completed concurrently");
      let debate = self.require_debate(debate_id).await?;
      return Ok(DebateCompletion::AlreadyCompleted { debate });
    }

    match decided {
      Some((winner, loser)) => {
        self.settle_persona(winner, elo_delta, DebateResult::Won).await?;
        self.settle_persona(loser, -elo_delta, DebateResult::Lost).await?;
      }
      None => {
        self
          .settle_persona(debate.persona1_id, 0, DebateResult::Drawn)
          .await?;
        self
          .settle_persona(debate.persona2_id, 0, DebateResult::Drawn)
          .await?;
      }
    }

    tracing::info!(
      debate = %debate.slug,
      pro_votes = tally.pro,
      con_votes = tally.con,
      elo_delta,
      "debate completed from votes"
    );
    Ok(DebateCompletion::Finalized {
      debate: self.require_debate(debate_id).await?,
      winner_id: decided.map(|(winner, _)| winner),
      elo_delta,
    })
  }

  pub(crate) async fn settle_persona(
    &self,
    persona_id: Uuid,
    elo_delta: i32,
    result: DebateResult,
  ) -> Result<()> {
    if elo_delta != 0 {
      self
        .store
        .adjust_persona_elo(persona_id, elo_delta)
        .await
        .map_err(Error::store)?;
    }
    self
      .store
      .record_debate_result(persona_id, result)
      .await
      .map_err(Error::store)
  }

  // ─── Resolution ────────────────────────────────────────────────────────────

  async fn resolve_category(&self, slug: Option<&str>) -> Result<Category> {
    if let Some(slug) = slug {
      match self
        .store
        .get_category_by_slug(slug)
        .await
        .map_err(Error::store)?
      {
        Some(category) => return Ok(category),
        None => tracing::debug!(slug, "unknown category; using fallback"),
      }
    }
    let categories = self
      .store
      .list_categories()
      .await
      .map_err(Error::store)?;
    self
      .fallback
      .category(&categories)
      .cloned()
      .ok_or_else(|| agora_core::Error::NoCategories.into())
  }

  fn resolve_starter(
    &self,
    personas: &[Persona],
    suggested: &[String],
  ) -> Result<Persona> {
    suggested
      .iter()
      .find_map(|slug| personas.iter().find(|p| &p.slug == slug))
      .or_else(|| self.fallback.persona(personas, &[]))
      .cloned()
      .ok_or_else(|| {
        agora_core::Error::NotEnoughPersonas {
          needed:    1,
          available: personas.len(),
        }
        .into()
      })
  }

  /// Suggested personas first, then the rest in random order, never the
  /// starter, at most `max_follow_ups`.
  fn pick_follow_ups(
    &self,
    personas: &[Persona],
    suggested: &[String],
    starter_id: Uuid,
  ) -> Vec<Persona> {
    let mut picked: Vec<&Persona> = Vec::new();
    for slug in suggested {
      let found = personas.iter().find(|p| &p.slug == slug);
      if let Some(persona) = found.filter(|p| p.persona_id != starter_id) {
        if !picked.iter().any(|q| q.persona_id == persona.persona_id) {
          picked.push(persona);
        }
      }
    }

    let mut rest: Vec<&Persona> = personas
      .iter()
      .filter(|p| p.persona_id != starter_id)
      .filter(|p| !picked.iter().any(|q| q.persona_id == p.persona_id))
      .collect();
    self.with_rng(|rng| rest.shuffle(rng));

    picked
      .into_iter()
      .chain(rest)
      .take(self.config.orchestrator.max_follow_ups)
      .cloned()
      .collect()
  }

  fn thread_slug(&self, title: &str) -> String {
    let salt: String = self.with_rng(|rng| {
      (0..SLUG_SALT_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
        .collect()
    });
    salted_slug(title, &salt)
  }

  async fn pause_before_reply(&self) {
    let [min, max] = self.config.orchestrator.reply_delay_ms;
    let millis = if max > min {
      self.with_rng(|rng| rng.gen_range(min..=max))
    } else {
      min
    };
    if millis > 0 {
      tokio::time::sleep(Duration::from_millis(millis)).await;
    }
  }
}
