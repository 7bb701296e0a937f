//! Engine scenarios against an in-memory SQLite store and a scripted
//! completion backend.

use std::sync::{
  Arc, Mutex,
  atomic::{AtomicUsize, Ordering},
};

use agora_core::{
  debate::{DebateStatus, Stance},
  forum::{NewCategory, NewThread, ThreadQuery},
  persona::{DEFAULT_ELO, NewPersona, Persona},
  store::ForumStore,
  topic::TopicUse,
  vote::{NewVote, VotableType, VoteValue},
};
use agora_llm::{Completed, Completion, CompletionRequest};
use agora_store_sqlite::SqliteStore;
use serde_json::json;
use uuid::Uuid;

use crate::{
  Engine, EngineConfig, Error,
  cron::CycleAction,
  orchestrator::DebateCompletion,
  topics::{TopicKind, TopicOrigin},
};

// ─── Scripted completion ─────────────────────────────────────────────────────

/// Answers topic prompts with canned JSON, judge prompts with whatever the
/// test set last, and post prompts with numbered arguments.
#[derive(Default)]
struct Scripted {
  trending: Mutex<String>,
  single:   Mutex<String>,
  judge:    Mutex<String>,
  /// When set, the judge scores every post it is shown with this value.
  judge_all: Mutex<Option<i64>>,
  posts:    AtomicUsize,
  /// 1-based index of a post completion that fails upstream.
  fail_post: Mutex<Option<usize>>,
  calls:    Mutex<Vec<CompletionRequest>>,
}

impl Scripted {
  fn with_topic(topic: serde_json::Value) -> Self {
    let scripted = Self::default();
    scripted.set_trending(json!([topic.clone()]));
    scripted.set_single(topic);
    scripted.set_judge("not JSON at all");
    scripted
  }

  fn set_trending(&self, value: serde_json::Value) {
    *self.trending.lock().unwrap() = value.to_string();
  }

  fn set_single(&self, value: serde_json::Value) {
    *self.single.lock().unwrap() = value.to_string();
  }

  fn set_judge(&self, raw: impl Into<String>) {
    *self.judge.lock().unwrap() = raw.into();
  }

  fn judge_everything(&self, score: i64) {
    *self.judge_all.lock().unwrap() = Some(score);
  }

  fn fail_post_number(&self, n: usize) {
    *self.fail_post.lock().unwrap() = Some(n);
  }

  /// Prompts of every post completion, in call order.
  fn post_prompts(&self) -> Vec<String> {
    self
      .calls
      .lock()
      .unwrap()
      .iter()
      .filter(|r| r.system_prompt.is_some())
      .map(|r| r.prompt.clone())
      .collect()
  }
}

impl Completion for Scripted {
  async fn complete(
    &self,
    request: CompletionRequest,
  ) -> agora_llm::Result<Completed> {
    let text = if request.prompt.contains("admin judge") {
      match *self.judge_all.lock().unwrap() {
        Some(score) => {
          let ids: Vec<Uuid> = request
            .prompt
            .lines()
            .filter_map(|l| l.strip_prefix("--- post_id: "))
            .filter_map(|id| id.trim().parse().ok())
            .collect();
          verdict(&ids, score, None)
        }
        None => self.judge.lock().unwrap().clone(),
      }
    } else if request.prompt.contains("JSON array") {
      self.trending.lock().unwrap().clone()
    } else if request.prompt.contains("one JSON object shaped like") {
      self.single.lock().unwrap().clone()
    } else {
      let n = self.posts.fetch_add(1, Ordering::SeqCst) + 1;
      if *self.fail_post.lock().unwrap() == Some(n) {
        self.calls.lock().unwrap().push(request);
        return Err(agora_llm::Error::EmptyResponse);
      }
      format!("Argument number {n}.")
    };
    self.calls.lock().unwrap().push(request);
    Ok(Completed { text, model: String::from("scripted/model") })
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn config() -> EngineConfig {
  let mut config = EngineConfig::default();
  config.seed = Some(7);
  config.orchestrator.reply_delay_ms = [0, 0];
  config
}

fn topic(title: &str) -> serde_json::Value {
  json!({
    "title": title,
    "summary": "Y",
    "categorySlug": "trading",
    "suggestedPersonas": ["mike-trades"],
    "debate": { "pro": "yes", "con": "no" },
  })
}

struct Harness {
  engine: Engine<SqliteStore, Scripted>,
  llm:    Arc<Scripted>,
  store:  Arc<SqliteStore>,
}

async fn harness(personas: &[&str], config: EngineConfig) -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  store
    .add_category(NewCategory {
      slug:        "trading".into(),
      name:        "Trading".into(),
      description: None,
    })
    .await
    .unwrap();
  for slug in personas {
    store
      .add_persona(NewPersona::new(*slug, *slug, "Short, punchy takes."))
      .await
      .unwrap();
  }
  let llm = Arc::new(Scripted::with_topic(topic("X")));
  Harness {
    engine: Engine::new(store.clone(), llm.clone(), config),
    llm,
    store,
  }
}

impl Harness {
  async fn persona(&self, slug: &str) -> Persona {
    self.store.get_persona_by_slug(slug).await.unwrap().unwrap()
  }

  async fn vote(&self, visitor: &str, debate_id: Uuid, favors: Uuid) {
    self
      .store
      .cast_vote(NewVote {
        visitor_id: visitor.into(),
        votable_type: VotableType::Debate,
        votable_id: debate_id,
        value: VoteValue::Up,
        favors: Some(favors),
      })
      .await
      .unwrap();
  }
}

/// A judge answer giving every listed post `score`.
fn verdict(post_ids: &[Uuid], score: i64, winner: Option<&str>) -> String {
  let evaluations: Vec<_> = post_ids
    .iter()
    .map(|id| json!({ "post_id": id, "score": score, "comment": "ok", "warning": null }))
    .collect();
  json!({ "evaluations": evaluations, "winner": winner, "summary": "Close one." })
    .to_string()
}

// ─── Threads ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_thread_with_single_persona() {
  let h = harness(&["mike-trades"], config()).await;

  let outcome = h.engine.generate_thread().await.unwrap();

  let threads = h.store.list_threads(&ThreadQuery::default()).await.unwrap();
  assert_eq!(threads.len(), 1);
  assert_eq!(threads[0].post_count, 1);
  assert_eq!(threads[0].title, "X");

  let mike = h.persona("mike-trades").await;
  let posts = h.store.list_thread_posts(threads[0].thread_id).await.unwrap();
  assert_eq!(posts.len(), 1);
  assert_eq!(posts[0].persona_id, mike.persona_id);
  assert_eq!(posts[0].metadata["kind"], "opener");
  assert_eq!(outcome.posts.len(), 1);
  assert_eq!(mike.stats.posts, 1);

  assert!(h.engine.is_topic_used("x!").await.unwrap());
}

#[tokio::test]
async fn generate_thread_invites_other_personas() {
  let h = harness(&["mike-trades", "ana", "bo", "cy", "di"], config()).await;

  let outcome = h.engine.generate_thread().await.unwrap();

  assert_eq!(outcome.thread.post_count, 4);
  let mike = h.persona("mike-trades").await;
  assert_eq!(outcome.posts[0].persona_id, mike.persona_id);
  let mut authors: Vec<_> = outcome.posts.iter().map(|p| p.persona_id).collect();
  authors.sort();
  authors.dedup();
  assert_eq!(authors.len(), 4, "no persona replies twice");

  // Each reply saw every earlier post.
  let prompts = h.llm.post_prompts();
  assert!(prompts[3].contains("Argument number 1."));
  assert!(prompts[3].contains("Argument number 3."));
}

#[tokio::test]
async fn unknown_slugs_fall_back() {
  let h = harness(&["ana"], config()).await;
  h.llm.set_trending(json!([{
    "title": "Z",
    "categorySlug": "knitting",
    "suggestedPersonas": ["nobody"],
  }]));

  let outcome = h.engine.generate_thread().await.unwrap();

  let ana = h.persona("ana").await;
  assert_eq!(outcome.thread.starter_id, ana.persona_id);
  let trading = h.store.get_category_by_slug("trading").await.unwrap().unwrap();
  assert_eq!(outcome.thread.category_id, trading.category_id);
  assert_eq!(trading.thread_count, 1);
  assert_eq!(trading.post_count, 1);
}

#[tokio::test]
async fn thread_needs_a_persona() {
  let h = harness(&[], config()).await;
  let err = h.engine.generate_thread().await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(agora_core::Error::NotEnoughPersonas { needed: 1, .. })
  ));
}

#[tokio::test]
async fn failed_follow_up_is_skipped() {
  let h = harness(&["mike-trades", "ana", "bo", "cy", "di"], config()).await;
  // Opener is post 1; the second follow-up fails.
  h.llm.fail_post_number(3);

  let outcome = h.engine.generate_thread().await.unwrap();

  assert_eq!(outcome.posts.len(), 3);
  assert_eq!(outcome.thread.post_count, 3);
  let contents: Vec<&str> = outcome.posts.iter().map(|p| p.content.as_str()).collect();
  assert_eq!(
    contents,
    ["Argument number 1.", "Argument number 2.", "Argument number 4."]
  );
}

#[tokio::test]
async fn reply_avoids_latest_author() {
  let mut config = config();
  config.orchestrator.max_follow_ups = 0;
  let h = harness(&["mike-trades", "ana"], config).await;
  let outcome = h.engine.generate_thread().await.unwrap();

  let reply = h.engine.reply_to_thread(outcome.thread.thread_id).await.unwrap();

  assert_eq!(reply.persona_id, h.persona("ana").await.persona_id);
  let thread = h
    .store
    .get_thread(outcome.thread.thread_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(thread.post_count, 2);
}

// ─── Topics ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn trending_skips_used_topics() {
  let h = harness(&["ana"], config()).await;
  h.engine
    .mark_topic_used("X", TopicOrigin::Trending, None, TopicUse::Thread(Uuid::new_v4()))
    .await
    .unwrap();
  h.llm.set_trending(json!([{ "title": "x?" }, { "title": "Fresh" }, { "title": "Other" }]));

  let trading = h.store.get_category_by_slug("trading").await.unwrap().unwrap();
  let topics = h
    .engine
    .trending_topics(&trading, 1, TopicKind::Thread)
    .await
    .unwrap();

  assert_eq!(topics.len(), 1);
  assert_eq!(topics[0].title, "Fresh");
  assert_eq!(topics[0].origin, TopicOrigin::Trending);
  assert_eq!(topics[0].category_slug.as_deref(), Some("trading"));
}

#[tokio::test]
async fn malformed_trends_yield_nothing() {
  let h = harness(&["ana"], config()).await;
  *h.llm.trending.lock().unwrap() = String::from("sorry, no trends today");

  let trading = h.store.get_category_by_slug("trading").await.unwrap().unwrap();
  let topics = h
    .engine
    .trending_topics(&trading, 3, TopicKind::Thread)
    .await
    .unwrap();
  assert!(topics.is_empty());
}

#[tokio::test]
async fn generate_topic_salts_after_repeated_collisions() {
  let h = harness(&["ana"], config()).await;
  h.engine
    .mark_topic_used("X", TopicOrigin::Generated, None, TopicUse::Thread(Uuid::new_v4()))
    .await
    .unwrap();

  let topic = h.engine.generate_topic(TopicKind::Thread).await.unwrap();

  assert_eq!(topic.origin, TopicOrigin::Salted);
  assert!(topic.title.ends_with(')'));
  assert!(!h.engine.is_topic_used(&topic.title).await.unwrap());
  // Trending and single-topic prompts for every attempt.
  let topic_calls = h
    .llm
    .calls
    .lock()
    .unwrap()
    .iter()
    .filter(|r| r.system_prompt.is_none())
    .count();
  assert_eq!(topic_calls, 2 * 5);
}

// ─── Debates ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn debate_generates_every_round() {
  let h = harness(&["alice", "bob", "carol"], config()).await;

  let outcome = h.engine.create_debate(Some(2)).await.unwrap();

  assert_eq!(outcome.debate.status, DebateStatus::Active);
  assert_ne!(outcome.debate.persona1_id, outcome.debate.persona2_id);
  assert_eq!(outcome.debate.current_round, 2);
  assert_eq!(outcome.thread.debate_id, Some(outcome.debate.debate_id));
  assert!(outcome.thread.is_debate);
  assert_eq!(outcome.thread.post_count, 4);

  let numbers: Vec<u32> = outcome.rounds.iter().map(|r| r.round_number).collect();
  assert_eq!(numbers, [1, 2]);

  let posts = h
    .store
    .list_thread_posts(outcome.thread.thread_id)
    .await
    .unwrap();
  assert_eq!(posts.len(), 4);
  for (post, stance) in posts.iter().zip([Stance::Pro, Stance::Con, Stance::Pro, Stance::Con]) {
    assert_eq!(post.persona_id, outcome.debate.persona_for(stance));
  }
  assert_eq!(outcome.rounds[0].pro_post_id, posts[0].post_id);
  assert_eq!(outcome.rounds[0].con_post_id, posts[1].post_id);

  // Con always answers the freshest pro argument.
  let prompts = h.llm.post_prompts();
  assert!(!prompts[0].contains("Argument number"));
  assert!(prompts[1].contains("Argument number 1."));
  assert!(prompts[3].contains("Argument number 3."));
}

#[tokio::test]
async fn debate_needs_two_personas() {
  let h = harness(&["alice"], config()).await;
  let err = h.engine.create_debate(None).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(agora_core::Error::NotEnoughPersonas { needed: 2, available: 1 })
  ));
}

#[tokio::test]
async fn failed_argument_skips_only_its_round() {
  let h = harness(&["alice", "bob"], config()).await;
  // Round 1's con argument is the second post completion.
  h.llm.fail_post_number(2);

  let outcome = h.engine.create_debate(Some(3)).await.unwrap();

  let numbers: Vec<u32> = outcome.rounds.iter().map(|r| r.round_number).collect();
  assert_eq!(numbers, [2, 3]);
  let posts = h
    .store
    .list_thread_posts(outcome.thread.thread_id)
    .await
    .unwrap();
  // The pro argument of the failed round stays in the thread.
  assert_eq!(posts.len(), 5);
  assert_eq!(posts[0].persona_id, outcome.debate.persona1_id);
  assert_eq!(posts[0].content, "Argument number 1.");
  assert_eq!(outcome.rounds[0].pro_post_id, posts[1].post_id);
  assert_eq!(outcome.debate.status, DebateStatus::Active);
}

#[tokio::test]
async fn debate_without_arguments_is_not_judged() {
  let h = harness(&["alice", "bob"], config()).await;
  h.llm.fail_post_number(1);
  let outcome = h.engine.create_debate(Some(1)).await.unwrap();
  assert!(outcome.rounds.is_empty());
  h.llm.judge_everything(2);

  let err = h
    .engine
    .evaluate_debate(outcome.debate.debate_id)
    .await
    .unwrap_err();

  assert!(matches!(err, Error::EvaluationMismatch(_)));
  let judge_calls = h
    .llm
    .calls
    .lock()
    .unwrap()
    .iter()
    .filter(|r| r.prompt.contains("admin judge"))
    .count();
  assert_eq!(judge_calls, 0);
  let debate = h
    .store
    .get_debate(outcome.debate.debate_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(debate.status, DebateStatus::Active);
  for id in [debate.persona1_id, debate.persona2_id] {
    assert_eq!(h.store.get_persona(id).await.unwrap().unwrap().elo, DEFAULT_ELO);
  }
}

#[tokio::test]
async fn completing_twice_is_a_no_op() {
  let h = harness(&["alice", "bob"], config()).await;
  let debate = h.engine.create_debate(Some(1)).await.unwrap().debate;
  let pro = debate.persona1_id;
  let con = debate.persona2_id;
  h.vote("v1", debate.debate_id, pro).await;
  h.vote("v2", debate.debate_id, pro).await;
  h.vote("v3", debate.debate_id, con).await;

  let first = h.engine.complete_debate(debate.debate_id).await.unwrap();
  let DebateCompletion::Finalized { winner_id, elo_delta, debate: done } = first else {
    panic!("expected the first call to finalise");
  };
  assert_eq!(winner_id, Some(pro));
  assert!(elo_delta > 0);
  assert_eq!(done.status, DebateStatus::Completed);
  assert_eq!(done.elo_delta, Some(elo_delta));

  let winner = h.store.get_persona(pro).await.unwrap().unwrap();
  let loser = h.store.get_persona(con).await.unwrap().unwrap();
  assert_eq!(winner.elo - DEFAULT_ELO, DEFAULT_ELO - loser.elo);
  assert_eq!(winner.stats.debates_won, 1);
  assert_eq!(loser.stats.debates_lost, 1);

  let second = h.engine.complete_debate(debate.debate_id).await.unwrap();
  assert!(matches!(second, DebateCompletion::AlreadyCompleted { .. }));
  let again = h.store.get_persona(pro).await.unwrap().unwrap();
  assert_eq!(again.elo, winner.elo);
  assert_eq!(again.stats.debates_won, 1);
}

#[tokio::test]
async fn tied_votes_draw_without_rating_change() {
  let h = harness(&["alice", "bob"], config()).await;
  let debate = h.engine.create_debate(Some(1)).await.unwrap().debate;

  let outcome = h.engine.complete_debate(debate.debate_id).await.unwrap();

  assert!(matches!(
    outcome,
    DebateCompletion::Finalized { winner_id: None, elo_delta: 0, .. }
  ));
  for id in [debate.persona1_id, debate.persona2_id] {
    let persona = h.store.get_persona(id).await.unwrap().unwrap();
    assert_eq!(persona.elo, DEFAULT_ELO);
    assert_eq!(persona.stats.debates_drawn, 1);
  }
}

#[tokio::test]
async fn voting_opens_once() {
  let h = harness(&["alice", "bob"], config()).await;
  let debate = h.engine.create_debate(Some(1)).await.unwrap().debate;

  let voting = h.engine.open_voting(debate.debate_id).await.unwrap();
  assert_eq!(voting.status, DebateStatus::Voting);

  let err = h.engine.open_voting(debate.debate_id).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(agora_core::Error::IllegalTransition { .. })
  ));

  // Voting debates still complete.
  let done = h.engine.complete_debate(debate.debate_id).await.unwrap();
  assert!(matches!(done, DebateCompletion::Finalized { .. }));
}

// ─── Evaluation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_judge_output_writes_nothing() {
  let h = harness(&["mike-trades", "ana"], config()).await;
  let thread = h.engine.generate_thread().await.unwrap().thread;

  let err = h.engine.evaluate_thread(thread.thread_id).await.unwrap_err();

  assert!(matches!(
    err,
    Error::Completion(agora_llm::Error::InvalidJson { .. })
  ));
  let posts = h.store.list_thread_posts(thread.thread_id).await.unwrap();
  assert!(posts.iter().all(|p| p.evaluation.is_none()));
  assert_eq!(h.persona("ana").await.elo, DEFAULT_ELO);
}

#[tokio::test]
async fn judge_scores_move_ratings_by_difference() {
  let mut config = config();
  config.orchestrator.max_follow_ups = 0;
  let h = harness(&["mike-trades"], config).await;
  let thread = h.engine.generate_thread().await.unwrap().thread;
  let posts = h.store.list_thread_posts(thread.thread_id).await.unwrap();
  let ids: Vec<Uuid> = posts.iter().map(|p| p.post_id).collect();

  h.llm.set_judge(verdict(&ids, 2, None));
  let first = h.engine.evaluate_thread(thread.thread_id).await.unwrap();
  assert_eq!(first.posts[0].elo_delta, 16);
  assert_eq!(h.persona("mike-trades").await.elo, DEFAULT_ELO + 16);

  h.llm.set_judge(verdict(&ids, -1, None));
  h.engine.evaluate_thread(thread.thread_id).await.unwrap();
  assert_eq!(h.persona("mike-trades").await.elo, DEFAULT_ELO - 8);

  let post = h.store.get_post(ids[0]).await.unwrap().unwrap();
  assert_eq!(post.evaluation.map(|e| e.score.get()), Some(-1));
}

#[tokio::test]
async fn mismatched_verdict_is_rejected() {
  let h = harness(&["mike-trades", "ana"], config()).await;
  let thread = h.engine.generate_thread().await.unwrap().thread;
  let posts = h.store.list_thread_posts(thread.thread_id).await.unwrap();
  assert!(posts.len() > 1);

  h.llm.set_judge(verdict(&[posts[0].post_id], 2, None));
  let err = h.engine.evaluate_thread(thread.thread_id).await.unwrap_err();

  assert!(matches!(err, Error::EvaluationMismatch(_)));
  let judge_calls = h
    .llm
    .calls
    .lock()
    .unwrap()
    .iter()
    .filter(|r| r.prompt.contains("admin judge"))
    .count();
  assert_eq!(judge_calls, 2);
  let posts = h.store.list_thread_posts(thread.thread_id).await.unwrap();
  assert!(posts.iter().all(|p| p.evaluation.is_none()));
  assert_eq!(h.persona("mike-trades").await.elo, DEFAULT_ELO);
}

#[tokio::test]
async fn judge_finalises_debate_with_bonus() {
  let h = harness(&["alice", "bob"], config()).await;
  let outcome = h.engine.create_debate(Some(1)).await.unwrap();
  let debate = outcome.debate;
  let pro = h.store.get_persona(debate.persona1_id).await.unwrap().unwrap();
  let posts = h
    .store
    .list_thread_posts(outcome.thread.thread_id)
    .await
    .unwrap();
  let pro_post = posts[0].post_id;
  let con_post = posts[1].post_id;

  h.llm.set_judge(
    json!({
      "evaluations": [
        { "post_id": pro_post, "score": 2, "comment": "sharp" },
        { "post_id": con_post, "score": 0, "comment": "flat" },
      ],
      "winner": pro.slug,
      "summary": "Pro carried it.",
    })
    .to_string(),
  );
  let evaluation = h.engine.evaluate_debate(debate.debate_id).await.unwrap();

  assert!(evaluation.finalized);
  assert_eq!(evaluation.winner_id, Some(pro.persona_id));
  assert_eq!(evaluation.persona1_score, 2);
  assert_eq!(evaluation.persona2_score, 0);

  let pro = h.store.get_persona(debate.persona1_id).await.unwrap().unwrap();
  let con = h.store.get_persona(debate.persona2_id).await.unwrap().unwrap();
  assert_eq!(pro.elo, DEFAULT_ELO + 2 * 10 + 25);
  assert_eq!(con.elo, DEFAULT_ELO);
  assert_eq!(pro.stats.debates_won, 1);
  assert_eq!(con.stats.debates_lost, 1);
  assert_eq!(pro.stats.upvotes, 2);
  assert_eq!(pro.stats.best_debate_score, Some(2.0));

  let stored = h.store.get_debate(debate.debate_id).await.unwrap().unwrap();
  assert_eq!(stored.status, DebateStatus::Completed);
  assert_eq!(stored.summary.as_deref(), Some("Pro carried it."));

  // Votes arriving later cannot finalise it again.
  let late = h.engine.complete_debate(debate.debate_id).await.unwrap();
  assert!(matches!(late, DebateCompletion::AlreadyCompleted { .. }));
}

#[tokio::test]
async fn judge_rescores_completed_debate_without_refinalising() {
  let h = harness(&["alice", "bob"], config()).await;
  let outcome = h.engine.create_debate(Some(1)).await.unwrap();
  let debate = outcome.debate;
  h.engine.complete_debate(debate.debate_id).await.unwrap();

  let posts = h
    .store
    .list_thread_posts(outcome.thread.thread_id)
    .await
    .unwrap();
  let ids: Vec<Uuid> = posts.iter().map(|p| p.post_id).collect();
  h.llm.set_judge(verdict(&ids, 1, Some("alice")));

  let evaluation = h.engine.evaluate_debate(debate.debate_id).await.unwrap();

  assert!(!evaluation.finalized);
  let alice = h.persona("alice").await;
  assert_eq!(alice.elo, DEFAULT_ELO + 10);
  assert_eq!(alice.stats.debates_won, 0);
}

// ─── Cron ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_cycle_starts_a_thread() {
  let h = harness(&["mike-trades"], config()).await;

  let report = h.engine.run_cycle().await.unwrap();

  assert!(matches!(report.action, CycleAction::CreatedThread { posts: 1, .. }));
  assert!(!report.evaluated);
}

#[tokio::test]
async fn cycle_replies_when_new_threads_are_off() {
  let mut config = config();
  config.orchestrator.max_follow_ups = 0;
  config.cron.new_thread_weight = 0.0;
  config.cron.evaluation_chance = 0.0;
  let h = harness(&["mike-trades", "ana"], config).await;
  let thread = h.engine.generate_thread().await.unwrap().thread;

  let report = h.engine.run_cycle().await.unwrap();

  let CycleAction::Replied { thread_id, .. } = report.action else {
    panic!("expected a reply");
  };
  assert_eq!(thread_id, thread.thread_id);
  assert!(!report.evaluated);
}

#[tokio::test]
async fn cycle_sees_past_a_run_of_debates() {
  let mut config = config();
  config.orchestrator.max_follow_ups = 0;
  config.cron.new_thread_weight = 0.0;
  config.cron.evaluation_chance = 0.0;
  let recent = config.cron.recent_threads;
  let h = harness(&["mike-trades", "ana"], config).await;
  let ordinary = h.engine.generate_thread().await.unwrap().thread;

  let mike = h.persona("mike-trades").await;
  for i in 0..=recent {
    h.store
      .insert_thread(NewThread {
        slug:        format!("debate-{i}"),
        title:       format!("Debate {i}"),
        summary:     String::new(),
        category_id: ordinary.category_id,
        starter_id:  mike.persona_id,
        is_debate:   true,
      })
      .await
      .unwrap();
  }

  let report = h.engine.run_cycle().await.unwrap();

  let CycleAction::Replied { thread_id, .. } = report.action else {
    panic!("expected a reply to the ordinary thread");
  };
  assert_eq!(thread_id, ordinary.thread_id);
}

#[tokio::test]
async fn cycle_can_judge_after_replying() {
  let mut config = config();
  config.orchestrator.max_follow_ups = 1;
  config.cron.new_thread_weight = 0.0;
  config.cron.evaluation_chance = 1.0;
  let h = harness(&["mike-trades", "ana"], config).await;
  let thread = h.engine.generate_thread().await.unwrap().thread;
  assert_eq!(thread.post_count, 2);
  h.llm.judge_everything(1);

  let report = h.engine.run_cycle().await.unwrap();

  assert!(matches!(report.action, CycleAction::Replied { .. }));
  assert!(report.evaluated);
  let posts = h.store.list_thread_posts(thread.thread_id).await.unwrap();
  assert_eq!(posts.len(), 3);
  assert!(
    posts
      .iter()
      .all(|p| p.evaluation.as_ref().map(|e| e.score.get()) == Some(1))
  );
}
