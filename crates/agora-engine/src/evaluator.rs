//! The admin judge.
//!
//! One completion scores every post of a thread at once. The answer must
//! name each post by id exactly once with a score in `-2..=2`; anything else
//! is rejected before a single row is written. Re-judging a post moves its
//! author's rating by the difference from the previous score only.

use std::collections::HashSet;

use agora_core::{
  debate::{Debate, DebateFinalization, DebateStatus},
  forum::{AdminScore, Post, PostEvaluation},
  persona::{DebateResult, Persona},
  rating::rescore_elo_delta,
  store::ForumStore,
};
use agora_llm::{Completion, CompletionRequest};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Engine, Error, Result,
  prompts::{self, JudgedPost},
};

// ─── Judge response ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct JudgeResponse {
  evaluations: Vec<JudgeEntry>,
  #[serde(default)]
  winner:      Option<String>,
  #[serde(default)]
  summary:     Option<String>,
}

#[derive(Debug, Deserialize)]
struct JudgeEntry {
  #[serde(alias = "postId", alias = "id")]
  post_id: Uuid,
  score:   i64,
  #[serde(default)]
  comment: String,
  #[serde(default)]
  warning: Option<String>,
}

/// A judge entry matched to its post and range-checked.
#[derive(Debug)]
struct Scored<'a> {
  post:    &'a Post,
  score:   AdminScore,
  comment: String,
  warning: Option<String>,
}

#[derive(Debug)]
struct Verdict<'a> {
  scored:  Vec<Scored<'a>>,
  winner:  Option<String>,
  summary: Option<String>,
}

/// Match `response` against `posts`, in post order. Returns a description
/// of the first problem found.
fn validate<'a>(
  posts: &'a [Post],
  response: JudgeResponse,
) -> std::result::Result<Verdict<'a>, String> {
  if response.evaluations.len() != posts.len() {
    return Err(format!(
      "expected {} evaluations, got {}",
      posts.len(),
      response.evaluations.len()
    ));
  }

  let mut seen = HashSet::new();
  let mut entries = Vec::with_capacity(posts.len());
  for entry in response.evaluations {
    if !seen.insert(entry.post_id) {
      return Err(format!("post {} evaluated twice", entry.post_id));
    }
    let Some(post) = posts.iter().find(|p| p.post_id == entry.post_id) else {
      return Err(format!("unknown post {}", entry.post_id));
    };
    let score = AdminScore::try_from(entry.score)
      .map_err(|e| format!("post {}: {e}", entry.post_id))?;
    let warning = entry
      .warning
      .map(|w| w.trim().to_owned())
      .filter(|w| !w.is_empty() && !w.eq_ignore_ascii_case("null"));
    entries.push(Scored {
      post,
      score,
      comment: entry.comment.trim().to_owned(),
      warning,
    });
  }

  entries.sort_by_key(|s| {
    posts
      .iter()
      .position(|p| p.post_id == s.post.post_id)
      .unwrap_or(usize::MAX)
  });

  Ok(Verdict {
    scored:  entries,
    winner:  response.winner,
    summary: response.summary.filter(|s| !s.trim().is_empty()),
  })
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What the judge wrote onto one post.
#[derive(Debug, Clone, Serialize)]
pub struct PostVerdict {
  pub post_id:    Uuid,
  pub persona_id: Uuid,
  pub score:      AdminScore,
  pub comment:    String,
  pub warning:    Option<String>,
  /// Rating change applied to the author by this evaluation.
  pub elo_delta:  i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadEvaluation {
  pub thread_id: Uuid,
  pub posts:     Vec<PostVerdict>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebateEvaluation {
  pub debate_id:      Uuid,
  /// The judge's winner, when it named one of the two debaters.
  pub winner_id:      Option<Uuid>,
  pub summary:        Option<String>,
  pub persona1_score: i64,
  pub persona2_score: i64,
  /// Whether this evaluation completed the debate. `false` when votes (or
  /// an earlier evaluation) got there first.
  pub finalized:      bool,
  pub posts:          Vec<PostVerdict>,
}

impl<S, C> Engine<S, C>
where
  S: ForumStore,
  C: Completion,
{
  /// Score every post of an ordinary thread.
  pub async fn evaluate_thread(&self, thread_id: Uuid) -> Result<ThreadEvaluation> {
    let thread = self.require_thread(thread_id).await?;
    let posts = self.thread_posts(thread_id).await?;
    if posts.is_empty() {
      return Ok(ThreadEvaluation { thread_id, posts: Vec::new() });
    }
    let personas = self.all_personas().await?;

    let judged: Vec<JudgedPost<'_>> = posts
      .iter()
      .map(|post| JudgedPost {
        post,
        author: personas.iter().find(|p| p.persona_id == post.persona_id),
        stance: None,
      })
      .collect();
    let prompt = prompts::judge(&thread.title, &judged, None);
    let verdict = self.judge(prompt, &posts).await?;

    let verdicts = self
      .apply_scores(verdict.scored, self.config.evaluator.thread_k, false)
      .await?;
    tracing::info!(thread = %thread.slug, posts = verdicts.len(), "thread evaluated");
    Ok(ThreadEvaluation { thread_id, posts: verdicts })
  }

  /// Score every post of a debate and, unless the debate is already
  /// completed, finalise it with the judge's winner.
  ///
  /// The named winner gets `evaluator.winner_bonus` rating and a win; the
  /// other debater gets a loss and no rating penalty. A winner the judge
  /// names that is not one of the debaters is ignored.
  pub async fn evaluate_debate(&self, debate_id: Uuid) -> Result<DebateEvaluation> {
    let debate = self.require_debate(debate_id).await?;
    let thread_id = debate.require_thread()?;
    let posts = self.thread_posts(thread_id).await?;
    if posts.is_empty() {
      return Err(Error::EvaluationMismatch(format!(
        "debate {} has no arguments to judge",
        debate.slug
      )));
    }
    let pro = self.require_persona(debate.persona1_id).await?;
    let con = self.require_persona(debate.persona2_id).await?;
    let personas = self.all_personas().await?;

    let judged: Vec<JudgedPost<'_>> = posts
      .iter()
      .map(|post| JudgedPost {
        post,
        author: personas.iter().find(|p| p.persona_id == post.persona_id),
        stance: debate.stance_of(post.persona_id),
      })
      .collect();
    let prompt = prompts::judge(&debate.topic, &judged, Some((&pro, &con)));
    let verdict = self.judge(prompt, &posts).await?;

    let winner_id = resolve_winner(verdict.winner.as_deref(), &pro, &con);
    let summary = verdict.summary.clone();
    let verdicts = self
      .apply_scores(verdict.scored, self.config.evaluator.debate_k, true)
      .await?;

    let total = |id: Uuid| -> i64 {
      verdicts
        .iter()
        .filter(|v| v.persona_id == id)
        .map(|v| i64::from(v.score))
        .sum()
    };
    let persona1_score = total(debate.persona1_id);
    let persona2_score = total(debate.persona2_id);

    let finalized = self
      .finalize_judged(&debate, winner_id, summary.clone(), persona1_score, persona2_score)
      .await?;

    tracing::info!(
      debate = %debate.slug,
      persona1_score,
      persona2_score,
      finalized,
      "debate evaluated"
    );
    Ok(DebateEvaluation {
      debate_id,
      winner_id,
      summary,
      persona1_score,
      persona2_score,
      finalized,
      posts: verdicts,
    })
  }

  async fn finalize_judged(
    &self,
    debate: &Debate,
    winner_id: Option<Uuid>,
    summary: Option<String>,
    persona1_score: i64,
    persona2_score: i64,
  ) -> Result<bool> {
    if !debate.status.can_transition_to(DebateStatus::Completed) {
      tracing::debug!(
        debate = %debate.slug,
        status = %debate.status,
        "debate not finalised by the judge"
      );
      return Ok(false);
    }

    let bonus = self.config.evaluator.winner_bonus;
    let finalized = self
      .store
      .finalize_debate(
        debate.debate_id,
        DebateFinalization {
          winner_id,
          summary,
          persona1_score: Some(persona1_score),
          persona2_score: Some(persona2_score),
          elo_delta: if winner_id.is_some() { bonus } else { 0 },
          completed_at: Utc::now(),
        },
      )
      .await
      .map_err(Error::store)?;
    if !finalized {
      return Ok(false);
    }

    if let Some(winner) = winner_id {
      self.settle_persona(winner, bonus, DebateResult::Won).await?;
      if let Some(loser) = debate.opponent_of(winner) {
        self.settle_persona(loser, 0, DebateResult::Lost).await?;
      }
    }
    for (persona_id, score) in [
      (debate.persona1_id, persona1_score),
      (debate.persona2_id, persona2_score),
    ] {
      self
        .store
        .record_debate_score(persona_id, score as f64)
        .await
        .map_err(Error::store)?;
    }
    Ok(true)
  }

  /// Ask the judge, retrying answers that do not match `posts`.
  async fn judge<'p>(&self, prompt: String, posts: &'p [Post]) -> Result<Verdict<'p>> {
    let attempts = self.config.evaluator.attempts.max(1);
    let mut attempt = 1;
    loop {
      let response: JudgeResponse =
        self.llm.complete_json(self.judge_request(prompt.clone())).await?;
      match validate(posts, response) {
        Ok(verdict) => return Ok(verdict),
        Err(problem) => {
          tracing::warn!(attempt, attempts, %problem, "judge verdict rejected");
          if attempt >= attempts {
            return Err(Error::EvaluationMismatch(problem));
          }
          attempt += 1;
        }
      }
    }
  }

  fn judge_request(&self, prompt: String) -> CompletionRequest {
    let config = &self.config.evaluator;
    let request = CompletionRequest::new(prompt)
      .temperature(config.temperature)
      .max_tokens(config.max_tokens);
    match &config.model {
      Some(model) => request.model(model.as_str()),
      None => request.tier(config.tier),
    }
  }

  /// Write scores and move ratings. With `count_upvotes`, positive scores
  /// also count towards the author's upvotes.
  async fn apply_scores(
    &self,
    scored: Vec<Scored<'_>>,
    k: i32,
    count_upvotes: bool,
  ) -> Result<Vec<PostVerdict>> {
    let evaluated_at = Utc::now();
    let mut verdicts = Vec::with_capacity(scored.len());
    for entry in scored {
      let post = entry.post;
      let previous = post.evaluation.as_ref().map(|e| e.score);

      self
        .store
        .record_post_evaluation(post.post_id, PostEvaluation {
          score: entry.score,
          comment: entry.comment.clone(),
          warning: entry.warning.clone(),
          evaluated_at,
        })
        .await
        .map_err(Error::store)?;

      let elo_delta = rescore_elo_delta(previous, entry.score, k);
      if elo_delta != 0 {
        self
          .store
          .adjust_persona_elo(post.persona_id, elo_delta)
          .await
          .map_err(Error::store)?;
      }

      if count_upvotes {
        let positive = |s: Option<AdminScore>| s.map_or(0, |s| i64::from(s).max(0));
        let upvotes = positive(Some(entry.score)) - positive(previous);
        if upvotes != 0 {
          self
            .store
            .add_persona_upvotes(post.persona_id, upvotes)
            .await
            .map_err(Error::store)?;
        }
      }

      verdicts.push(PostVerdict {
        post_id: post.post_id,
        persona_id: post.persona_id,
        score: entry.score,
        comment: entry.comment,
        warning: entry.warning,
        elo_delta,
      });
    }
    Ok(verdicts)
  }

  async fn all_personas(&self) -> Result<Vec<Persona>> {
    self.store.list_personas(false).await.map_err(Error::store)
  }
}

fn resolve_winner(slug: Option<&str>, pro: &Persona, con: &Persona) -> Option<Uuid> {
  let slug = slug.map(str::trim).filter(|s| !s.is_empty())?;
  let found = [pro, con]
    .into_iter()
    .find(|p| p.slug.eq_ignore_ascii_case(slug))
    .map(|p| p.persona_id);
  if found.is_none() {
    tracing::debug!(slug, "judge named a winner who is not a debater");
  }
  found
}

#[cfg(test)]
mod tests {
  use agora_core::persona::{DEFAULT_ELO, PersonaStats};
  use serde_json::json;

  use super::*;

  fn post() -> Post {
    Post {
      post_id:     Uuid::new_v4(),
      thread_id:   Uuid::nil(),
      persona_id:  Uuid::new_v4(),
      parent_id:   None,
      content:     "hello".into(),
      upvotes:     0,
      downvotes:   0,
      best_answer: false,
      evaluation:  None,
      metadata:    serde_json::Value::Null,
      created_at:  Utc::now(),
    }
  }

  fn response(entries: serde_json::Value) -> JudgeResponse {
    serde_json::from_value(json!({ "evaluations": entries })).unwrap()
  }

  fn persona(slug: &str) -> Persona {
    Persona {
      persona_id:   Uuid::new_v4(),
      slug:         slug.into(),
      display_name: slug.into(),
      style_prompt: String::new(),
      model:        "m".into(),
      temperature:  70,
      max_length:   400,
      team_id:      None,
      elo:          DEFAULT_ELO,
      stats:        PersonaStats::default(),
      active:       true,
      created_at:   Utc::now(),
    }
  }

  #[test]
  fn validate_reorders_to_post_order() {
    let posts = [post(), post()];
    let verdict = validate(
      &posts,
      response(json!([
        { "post_id": posts[1].post_id, "score": -1, "comment": "meh" },
        { "postId": posts[0].post_id, "score": 2, "comment": "great", "warning": "" },
      ])),
    )
    .unwrap();
    assert_eq!(verdict.scored[0].post.post_id, posts[0].post_id);
    assert_eq!(verdict.scored[0].score.get(), 2);
    assert_eq!(verdict.scored[0].warning, None);
    assert_eq!(verdict.scored[1].score.get(), -1);
  }

  #[test]
  fn validate_rejects_missing_extra_and_duplicate_ids() {
    let posts = [post(), post()];
    let only_one = response(json!([{ "post_id": posts[0].post_id, "score": 1 }]));
    assert!(validate(&posts, only_one).is_err());

    let twice = response(json!([
      { "post_id": posts[0].post_id, "score": 1 },
      { "post_id": posts[0].post_id, "score": 1 },
    ]));
    assert!(validate(&posts, twice).unwrap_err().contains("twice"));

    let stranger = response(json!([
      { "post_id": posts[0].post_id, "score": 1 },
      { "post_id": Uuid::new_v4(), "score": 1 },
    ]));
    assert!(validate(&posts, stranger).unwrap_err().contains("unknown"));
  }

  #[test]
  fn validate_rejects_out_of_range_scores() {
    let posts = [post()];
    let wild = response(json!([{ "post_id": posts[0].post_id, "score": 5 }]));
    assert!(validate(&posts, wild).is_err());
  }

  #[test]
  fn winner_matches_debaters_only() {
    let pro = persona("mike-trades");
    let con = persona("ana-quant");
    assert_eq!(
      resolve_winner(Some(" Ana-Quant "), &pro, &con),
      Some(con.persona_id)
    );
    assert_eq!(resolve_winner(Some("somebody"), &pro, &con), None);
    assert_eq!(resolve_winner(None, &pro, &con), None);
  }
}
