//! The `ForumStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `agora-store-sqlite`).
//! The engine and the HTTP layers depend on this abstraction, not on any
//! concrete backend.
//!
//! Counter updates (post counts, ratings, vote tallies) are relative: a
//! backend applies them as `column = column + delta` in a single statement
//! rather than reading, computing and writing back.

use std::future::Future;

use uuid::Uuid;

use crate::{
  debate::{
    Debate, DebateFinalization, DebateRound, DebateStatus, NewDebate,
    NewDebateRound,
  },
  forum::{
    Category, NewCategory, NewPost, NewThread, Post, PostEvaluation, Thread,
    ThreadQuery,
  },
  persona::{
    DebateResult, NewPersona, NewTeam, Persona, PersonaPatch, Team,
    TeamStanding,
  },
  topic::NewUsedTopic,
  vote::{NewVote, VotableType, Vote, VoteOutcome},
};

/// Abstraction over an Agora store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ForumStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Categories ────────────────────────────────────────────────────────

  fn add_category(
    &self,
    input: NewCategory,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  /// All categories in creation order.
  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  fn get_category_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send + 'a;

  // ── Teams ─────────────────────────────────────────────────────────────

  fn add_team(
    &self,
    input: NewTeam,
  ) -> impl Future<Output = Result<Team, Self::Error>> + Send + '_;

  /// Every team with aggregates computed from its personas.
  fn list_team_standings(
    &self,
  ) -> impl Future<Output = Result<Vec<TeamStanding>, Self::Error>> + Send + '_;

  // ── Personas ──────────────────────────────────────────────────────────

  /// Persist a new, active persona rated [`crate::persona::DEFAULT_ELO`].
  fn add_persona(
    &self,
    input: NewPersona,
  ) -> impl Future<Output = Result<Persona, Self::Error>> + Send + '_;

  fn get_persona(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Persona>, Self::Error>> + Send + '_;

  fn get_persona_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Persona>, Self::Error>> + Send + 'a;

  /// Personas in creation order, optionally restricted to active ones.
  fn list_personas(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<Persona>, Self::Error>> + Send + '_;

  /// Apply an admin edit. Returns the updated persona, or `None` if it does
  /// not exist.
  fn update_persona(
    &self,
    id: Uuid,
    patch: PersonaPatch,
  ) -> impl Future<Output = Result<Option<Persona>, Self::Error>> + Send + '_;

  fn adjust_persona_elo(
    &self,
    id: Uuid,
    delta: i32,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn add_persona_upvotes(
    &self,
    id: Uuid,
    upvotes: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Increment the won/lost/drawn counter matching `result`.
  fn record_debate_result(
    &self,
    id: Uuid,
    result: DebateResult,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Fold one debate's total score into the persona's best and running
  /// average debate scores.
  fn record_debate_score(
    &self,
    id: Uuid,
    score: f64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Threads ───────────────────────────────────────────────────────────

  /// Insert a thread with zero posts and count it on its category. Fails if
  /// the slug is taken.
  fn insert_thread(
    &self,
    input: NewThread,
  ) -> impl Future<Output = Result<Thread, Self::Error>> + Send + '_;

  fn get_thread(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Thread>, Self::Error>> + Send + '_;

  fn get_thread_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Thread>, Self::Error>> + Send + 'a;

  /// Threads ordered by most recent activity first.
  fn list_threads<'a>(
    &'a self,
    query: &'a ThreadQuery,
  ) -> impl Future<Output = Result<Vec<Thread>, Self::Error>> + Send + 'a;

  /// Every thread title; used for duplicate-topic rejection.
  fn list_thread_titles(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  fn increment_thread_views(
    &self,
    thread_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn link_thread_debate(
    &self,
    thread_id: Uuid,
    debate_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Insert a post and, in the same transaction, count it on its thread,
  /// category and author, moving the thread's `last_activity_at` forward.
  fn insert_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  fn get_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// All posts of a thread in insertion order.
  fn list_thread_posts(
    &self,
    thread_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  /// Overwrite the judge's score, comment and warning on a post.
  fn record_post_evaluation(
    &self,
    post_id: Uuid,
    evaluation: PostEvaluation,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Debates ───────────────────────────────────────────────────────────

  fn insert_debate(
    &self,
    input: NewDebate,
  ) -> impl Future<Output = Result<Debate, Self::Error>> + Send + '_;

  fn get_debate(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Debate>, Self::Error>> + Send + '_;

  /// Debates newest first, optionally filtered by status.
  fn list_debates(
    &self,
    status: Option<DebateStatus>,
  ) -> impl Future<Output = Result<Vec<Debate>, Self::Error>> + Send + '_;

  /// Append a round and advance the debate's `current_round`. Fails if the
  /// round number already exists for the debate.
  fn insert_debate_round(
    &self,
    input: NewDebateRound,
  ) -> impl Future<Output = Result<DebateRound, Self::Error>> + Send + '_;

  /// Rounds of a debate in round-number order.
  fn list_debate_rounds(
    &self,
    debate_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DebateRound>, Self::Error>> + Send + '_;

  /// Compare-and-set the status. Returns `false` if the debate was not in
  /// `from`.
  fn transition_debate(
    &self,
    id: Uuid,
    from: DebateStatus,
    to: DebateStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Mark the debate `completed` and record its outcome, unless it is
  /// already completed. Returns `false` (and writes nothing) in that case.
  fn finalize_debate(
    &self,
    id: Uuid,
    outcome: DebateFinalization,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Topic ledger ──────────────────────────────────────────────────────

  fn is_topic_used<'a>(
    &'a self,
    title_hash: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert-or-ignore on `title_hash`. Returns `true` if a row was written.
  fn mark_topic_used(
    &self,
    input: NewUsedTopic,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Upsert-or-delete the visitor's vote and adjust the derived counters in
  /// the same transaction.
  fn cast_vote(
    &self,
    input: NewVote,
  ) -> impl Future<Output = Result<VoteOutcome, Self::Error>> + Send + '_;

  fn get_vote<'a>(
    &'a self,
    visitor_id: &'a str,
    votable_type: VotableType,
    votable_id: Uuid,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + 'a;
}
