//! Post generator: one persona, one prompt, one cleaned-up post body.

use agora_core::{debate::Stance, persona::Persona, store::ForumStore};
use agora_llm::{Completion, CompletionRequest};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Engine, Error, Result,
  prompts::{self, PostBrief},
  text::clean_post,
};

/// Input to [`Engine::generate_post`].
#[derive(Debug, Clone)]
pub struct PostRequest {
  pub persona_id:    Uuid,
  pub topic:         String,
  /// Prior posts rendered as `Name: content` blocks.
  pub context:       Option<String>,
  pub is_opener:     bool,
  pub debate_stance: Option<Stance>,
  /// Debate round this post belongs to, recorded in its metadata.
  pub round:         Option<u32>,
}

impl PostRequest {
  pub fn opener(persona_id: Uuid, topic: impl Into<String>) -> Self {
    Self {
      persona_id,
      topic: topic.into(),
      context: None,
      is_opener: true,
      debate_stance: None,
      round: None,
    }
  }

  pub fn reply(
    persona_id: Uuid,
    topic: impl Into<String>,
    context: impl Into<String>,
  ) -> Self {
    Self {
      persona_id,
      topic: topic.into(),
      context: Some(context.into()),
      is_opener: false,
      debate_stance: None,
      round: None,
    }
  }
}

/// How a post was produced. Stored as the post's metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationMetadata {
  pub kind:        &'static str,
  pub tier:        String,
  /// Model that actually answered, after any tier fallback.
  pub model:       String,
  pub temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stance:      Option<Stance>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub round:       Option<u32>,
}

/// A generated post body, not yet persisted.
#[derive(Debug, Clone)]
pub struct GeneratedPost {
  pub persona:  Persona,
  pub content:  String,
  pub metadata: GenerationMetadata,
}

impl GeneratedPost {
  pub fn metadata_json(&self) -> serde_json::Value {
    serde_json::to_value(&self.metadata).unwrap_or_default()
  }
}

/// Render posts as prompt context, oldest first.
pub fn render_context<'a>(
  posts: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
  posts
    .into_iter()
    .map(|(name, content)| format!("{name}: {}", content.trim()))
    .collect::<Vec<_>>()
    .join("\n\n")
}

impl<S, C> Engine<S, C>
where
  S: ForumStore,
  C: Completion,
{
  /// Generate one post in the voice of `request.persona_id`.
  pub async fn generate_post(&self, request: PostRequest) -> Result<GeneratedPost> {
    let persona = self.require_persona(request.persona_id).await?;
    let brief = PostBrief {
      topic:     &request.topic,
      context:   request.context.as_deref(),
      is_opener: request.is_opener,
      stance:    request.debate_stance,
    };
    let (system, prompt) = prompts::post(&persona, &brief);

    let tier = self.config.posts.tier;
    let temperature = persona.sampling_temperature();
    tracing::debug!(
      persona = %persona.slug,
      %tier,
      temperature,
      opener = request.is_opener,
      "generating post"
    );

    let completed = self
      .llm
      .complete(
        CompletionRequest::new(prompt)
          .tier(tier)
          .temperature(temperature)
          .max_tokens(persona.max_length)
          .system_prompt(system),
      )
      .await?;

    let content = clean_post(&completed.text, &persona.display_name);
    if content.is_empty() {
      return Err(Error::Completion(agora_llm::Error::EmptyResponse));
    }

    let kind = match (request.debate_stance, request.is_opener) {
      (Some(_), _) => "debate_argument",
      (None, true) => "opener",
      (None, false) => "reply",
    };
    Ok(GeneratedPost {
      metadata: GenerationMetadata {
        kind,
        tier: tier.to_string(),
        model: completed.model,
        temperature,
        stance: request.debate_stance,
        round: request.round,
      },
      persona,
      content,
    })
  }

  /// A debate argument for `persona_id` arguing `stance`. Without a
  /// previous argument the post opens the debate.
  pub async fn generate_debate_argument(
    &self,
    persona_id: Uuid,
    topic: &str,
    stance: Stance,
    round: u32,
    previous: Option<String>,
  ) -> Result<GeneratedPost> {
    let is_opener = previous.is_none();
    self
      .generate_post(PostRequest {
        persona_id,
        topic: topic.to_owned(),
        context: previous,
        is_opener,
        debate_stance: Some(stance),
        round: Some(round),
      })
      .await
  }
}
