//! Router tests against an in-memory SQLite store.

use std::{sync::Arc, time::Duration};

use agora_core::{
  debate::{DebateStatus, NewDebate},
  forum::{NewCategory, NewPost, NewThread},
  persona::{NewPersona, NewTeam, PersonaPatch},
  store::ForumStore,
};
use agora_store_sqlite::SqliteStore;
use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use crate::api_router;

struct Seeded {
  store:  Arc<SqliteStore>,
  alice:  Uuid,
  bob:    Uuid,
  post:   Uuid,
  debate: Uuid,
}

async fn seeded() -> Seeded {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let category = store
    .add_category(NewCategory {
      slug:        "trading".into(),
      name:        "Trading".into(),
      description: Some("Markets and money".into()),
    })
    .await
    .unwrap();
  let team = store
    .add_team(NewTeam {
      slug:     "claude".into(),
      name:     "Team Claude".into(),
      provider: "anthropic".into(),
    })
    .await
    .unwrap();
  let mut alice = NewPersona::new("alice", "Alice", "Terse.");
  alice.team_id = Some(team.team_id);
  let alice = store.add_persona(alice).await.unwrap();
  let bob = store
    .add_persona(NewPersona::new("bob", "Bob", "Verbose."))
    .await
    .unwrap();
  let carol = store
    .add_persona(NewPersona::new("carol", "Carol", "Retired."))
    .await
    .unwrap();
  store
    .update_persona(carol.persona_id, PersonaPatch {
      active: Some(false),
      ..PersonaPatch::default()
    })
    .await
    .unwrap();

  let thread = store
    .insert_thread(NewThread {
      slug:        "rate-cuts-abc123".into(),
      title:       "Rate cuts".into(),
      summary:     "Will they?".into(),
      category_id: category.category_id,
      starter_id:  alice.persona_id,
      is_debate:   false,
    })
    .await
    .unwrap();
  let post = store
    .insert_post(NewPost {
      thread_id:  thread.thread_id,
      persona_id: alice.persona_id,
      parent_id:  None,
      content:    "Not this year.".into(),
      metadata:   json!({ "kind": "opener" }),
    })
    .await
    .unwrap();

  let debate_thread = store
    .insert_thread(NewThread {
      slug:        "cash-is-trash-def456".into(),
      title:       "Cash is trash".into(),
      summary:     String::new(),
      category_id: category.category_id,
      starter_id:  alice.persona_id,
      is_debate:   true,
    })
    .await
    .unwrap();
  let debate = store
    .insert_debate(NewDebate {
      slug:         "cash-is-trash-def456".into(),
      topic:        "Cash is trash".into(),
      thread_id:    Some(debate_thread.thread_id),
      persona1_id:  alice.persona_id,
      persona2_id:  bob.persona_id,
      total_rounds: 3,
      status:       DebateStatus::Active,
    })
    .await
    .unwrap();

  Seeded {
    store,
    alice: alice.persona_id,
    bob: bob.persona_id,
    post: post.post_id,
    debate: debate.debate_id,
  }
}

async fn get(s: &Seeded, uri: &str) -> (StatusCode, Value) {
  let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
  send(s, req).await
}

async fn post_json(s: &Seeded, uri: &str, body: Value) -> (StatusCode, Value) {
  let req = Request::builder()
    .method("POST")
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap();
  send(s, req).await
}

async fn send(s: &Seeded, req: Request<Body>) -> (StatusCode, Value) {
  let resp = api_router(s.store.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, value)
}

// ── Catalogue ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn lists_categories_with_counters() {
  let s = seeded().await;
  let (status, body) = get(&s, "/categories").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body[0]["slug"], "trading");
  assert_eq!(body[0]["thread_count"], 2);
  assert_eq!(body[0]["post_count"], 1);
}

#[tokio::test]
async fn personas_hide_retired_unless_asked() {
  let s = seeded().await;
  let (_, active) = get(&s, "/personas").await;
  assert_eq!(active.as_array().unwrap().len(), 2);
  let (_, all) = get(&s, "/personas?all=true").await;
  assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn persona_by_slug() {
  let s = seeded().await;
  let (status, body) = get(&s, "/personas/alice").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["display_name"], "Alice");
  assert_eq!(body["stats"]["posts"], 1);

  let (status, body) = get(&s, "/personas/nobody").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("nobody"));
}

#[tokio::test]
async fn teams_roll_up_members() {
  let s = seeded().await;
  let (status, body) = get(&s, "/teams").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body[0]["team"]["slug"], "claude");
  assert_eq!(body[0]["personas"], 1);
  assert_eq!(body[0]["posts"], 1);
}

// ── Threads ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn thread_list_filters_by_category() {
  let s = seeded().await;
  let (status, body) = get(&s, "/threads?category=trading&limit=1").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);

  let (status, _) = get(&s, "/threads?category=knitting").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn thread_detail_includes_posts_and_counts_views() {
  let s = seeded().await;
  let (status, body) = get(&s, "/threads/rate-cuts-abc123").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["title"], "Rate cuts");
  assert_eq!(body["posts"][0]["content"], "Not this year.");

  // The view is counted off the request path.
  let mut views = 0;
  for _ in 0..50 {
    let thread = s
      .store
      .get_thread_by_slug("rate-cuts-abc123")
      .await
      .unwrap()
      .unwrap();
    views = thread.view_count;
    if views > 0 {
      break;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  assert_eq!(views, 1);

  let (status, _) = get(&s, "/threads/missing").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Debates ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn debates_filter_by_status() {
  let s = seeded().await;
  let (_, active) = get(&s, "/debates?status=active").await;
  assert_eq!(active.as_array().unwrap().len(), 1);
  let (_, done) = get(&s, "/debates?status=completed").await;
  assert!(done.as_array().unwrap().is_empty());
  let (status, _) = get(&s, "/debates?status=bogus").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn debate_detail_and_missing_debate() {
  let s = seeded().await;
  let (status, body) = get(&s, &format!("/debates/{}", s.debate)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "active");
  assert!(body["rounds"].as_array().unwrap().is_empty());

  let (status, _) = get(&s, &format!("/debates/{}", Uuid::new_v4())).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Votes ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn post_vote_is_idempotent() {
  let s = seeded().await;
  let vote = json!({
    "visitor_id": "v1",
    "votable_type": "post",
    "votable_id": s.post,
    "value": 1,
  });

  let (status, body) = post_json(&s, "/votes", vote.clone()).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["outcome"], "created");
  let (_, body) = post_json(&s, "/votes", vote).await;
  assert_eq!(body["outcome"], "unchanged");

  let post = s.store.get_post(s.post).await.unwrap().unwrap();
  assert_eq!(post.upvotes, 1);

  let (_, body) = post_json(
    &s,
    "/votes",
    json!({ "visitor_id": "v1", "votable_type": "post", "votable_id": s.post, "value": 0 }),
  )
  .await;
  assert_eq!(body["outcome"], "removed");
  let post = s.store.get_post(s.post).await.unwrap().unwrap();
  assert_eq!(post.upvotes, 0);
}

#[tokio::test]
async fn debate_votes_count_for_the_favoured_side() {
  let s = seeded().await;
  let (status, _) = post_json(
    &s,
    "/votes",
    json!({
      "visitor_id": "v1",
      "votable_type": "debate",
      "votable_id": s.debate,
      "value": 1,
      "favors": s.bob,
    }),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let debate = s.store.get_debate(s.debate).await.unwrap().unwrap();
  assert_eq!(debate.persona1_votes, 0);
  assert_eq!(debate.persona2_votes, 1);
  assert_ne!(debate.persona1_id, s.bob);
  assert_eq!(debate.persona1_id, s.alice);
}

#[tokio::test]
async fn malformed_votes_are_rejected() {
  let s = seeded().await;

  let (status, _) = post_json(
    &s,
    "/votes",
    json!({ "visitor_id": "v1", "votable_type": "post", "votable_id": s.post, "value": 2 }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = post_json(
    &s,
    "/votes",
    json!({ "visitor_id": "v1", "votable_type": "debate", "votable_id": s.debate, "value": 1 }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = post_json(
    &s,
    "/votes",
    json!({
      "visitor_id": "v1",
      "votable_type": "debate",
      "votable_id": s.debate,
      "value": 1,
      "favors": Uuid::new_v4(),
    }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = post_json(
    &s,
    "/votes",
    json!({ "visitor_id": "v1", "votable_type": "post", "votable_id": Uuid::new_v4(), "value": 1 }),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
