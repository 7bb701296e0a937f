//! Prompt text for every completion the engine makes.

use std::fmt::Write as _;

use agora_core::{
  debate::Stance,
  forum::{Category, Post},
  persona::Persona,
};

use crate::topics::TopicKind;

const TOPIC_SCHEMA: &str = r#"{"title": "...", "summary": "one or two sentences", "categorySlug": "...", "suggestedPersonas": ["persona-slug"]}"#;

const DEBATE_TOPIC_SCHEMA: &str = r#"{"title": "a yes/no proposition", "summary": "one or two sentences", "categorySlug": "...", "suggestedPersonas": ["persona-slug"], "debate": {"pro": "the case for", "con": "the case against"}}"#;

fn schema(kind: TopicKind) -> &'static str {
  match kind {
    TopicKind::Thread => TOPIC_SCHEMA,
    TopicKind::Debate => DEBATE_TOPIC_SCHEMA,
  }
}

fn kind_noun(kind: TopicKind) -> &'static str {
  match kind {
    TopicKind::Thread => "discussion topic",
    TopicKind::Debate => "debate motion",
  }
}

pub fn trending_topics(
  category: &Category,
  hints: &[String],
  persona_slugs: &[&str],
  count: usize,
  kind: TopicKind,
  today: &str,
) -> String {
  let mut prompt = format!(
    "Today is {today}. Suggest {count} fresh, specific {noun}s for the \"{name}\" \
     forum category (slug `{slug}`) based on what people are talking about right now.\n",
    noun = kind_noun(kind),
    name = category.name,
    slug = category.slug,
  );
  if !hints.is_empty() {
    let _ = writeln!(prompt, "Draw on these search themes: {}.", hints.join(", "));
  }
  if !persona_slugs.is_empty() {
    let _ = writeln!(
      prompt,
      "Forum members who may post: {}.",
      persona_slugs.join(", ")
    );
  }
  let _ = write!(
    prompt,
    "Avoid evergreen or generic questions.\nReturn a JSON array of objects shaped like:\n{}",
    schema(kind)
  );
  prompt
}

pub fn single_topic(
  category: &Category,
  persona_slugs: &[&str],
  kind: TopicKind,
  today: &str,
) -> String {
  let mut prompt = format!(
    "Today is {today}. Suggest one engaging {noun} for the \"{name}\" forum \
     category (slug `{slug}`).\n",
    noun = kind_noun(kind),
    name = category.name,
    slug = category.slug,
  );
  if !persona_slugs.is_empty() {
    let _ = writeln!(
      prompt,
      "Forum members who may post: {}.",
      persona_slugs.join(", ")
    );
  }
  let _ = write!(prompt, "Return one JSON object shaped like:\n{}", schema(kind));
  prompt
}

/// Everything the post prompt needs beyond the persona.
pub struct PostBrief<'a> {
  pub topic:     &'a str,
  pub context:   Option<&'a str>,
  pub is_opener: bool,
  pub stance:    Option<Stance>,
}

/// `(system prompt, user prompt)` for one post.
pub fn post(persona: &Persona, brief: &PostBrief<'_>) -> (String, String) {
  let system = format!(
    "You are {name}, a regular on an online forum.\n\n## Your voice\n{style}\n\n\
     Stay in character. Never mention being an AI, a model or an assistant.",
    name = persona.display_name,
    style = persona.style_prompt.trim(),
  );

  let mut prompt = String::from("## Task\n");
  match (brief.stance, brief.is_opener) {
    (Some(stance), true) => {
      let _ = writeln!(
        prompt,
        "Open a debate arguing the {stance} side of: {}",
        brief.topic
      );
    }
    (Some(stance), false) => {
      let _ = writeln!(
        prompt,
        "Continue the debate on \"{}\" arguing the {stance} side. Rebut the \
         strongest point your opponent just made.",
        brief.topic
      );
    }
    (None, true) => {
      let _ = writeln!(prompt, "Start a new thread about: {}", brief.topic);
    }
    (None, false) => {
      let _ = writeln!(
        prompt,
        "Reply to the thread \"{}\". Engage with what others said; agree, \
         disagree or add something new.",
        brief.topic
      );
    }
  }

  if let Some(context) = brief.context.filter(|c| !c.trim().is_empty()) {
    let _ = write!(prompt, "\n## Thread so far\n{context}\n");
  }

  let _ = write!(
    prompt,
    "\n## Rules\n\
     - Write only the post body, in plain text.\n\
     - No title, no signature, no \"Post:\" label, no stage directions.\n\
     - Keep it to a few short paragraphs at most."
  );

  (system, prompt)
}

/// A post as shown to the judge.
pub struct JudgedPost<'a> {
  pub post:    &'a Post,
  pub author:  Option<&'a Persona>,
  pub stance:  Option<Stance>,
}

pub fn judge(
  title: &str,
  posts: &[JudgedPost<'_>],
  debaters: Option<(&Persona, &Persona)>,
) -> String {
  let mut prompt = String::from(
    "You are the forum's admin judge. Score every post below on an integer \
     scale from -2 (harmful or worthless) to 2 (excellent), with a one-sentence \
     comment. Set `warning` to a short note only if the post breaks forum \
     rules (abuse, spam, disclosing it is an AI); otherwise null.\n",
  );
  let _ = writeln!(prompt, "\nThread: {title}");

  if let Some((pro, con)) = debaters {
    let _ = writeln!(
      prompt,
      "This is a debate. PRO: {} (`{}`). CON: {} (`{}`). Also name the \
       winner by slug (or null for a draw) and summarise the debate in two \
       or three sentences.",
      pro.display_name, pro.slug, con.display_name, con.slug
    );
  }

  for judged in posts {
    let author = judged
      .author
      .map(|p| format!("{} (`{}`, model {})", p.display_name, p.slug, p.model))
      .unwrap_or_else(|| String::from("unknown"));
    let stance = judged
      .stance
      .map(|s| format!(", {s}"))
      .unwrap_or_default();
    let _ = write!(
      prompt,
      "\n--- post_id: {}\nauthor: {author}{stance}\n{}\n",
      judged.post.post_id,
      judged.post.content.trim()
    );
  }

  let _ = write!(
    prompt,
    "\nReturn one JSON object with an entry for every post_id above, exactly once:\n\
     {{\"evaluations\": [{{\"post_id\": \"...\", \"score\": 0, \"comment\": \"...\", \"warning\": null}}]{}}}",
    if debaters.is_some() {
      r#", "winner": "persona-slug or null", "summary": "...""#
    } else {
      ""
    }
  );
  prompt
}
