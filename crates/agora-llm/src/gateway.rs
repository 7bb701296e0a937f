//! [`Gateway`]: tier resolution and cheap-tier fallback over a
//! [`ChatTransport`].

use std::future::Future;

use crate::{
  Error, Result,
  completion::{Completed, Completion},
  config::LlmConfig,
  openrouter::OpenRouterTransport,
  request::{CompletionRequest, ModelChoice},
  tier::{ModelTable, ModelTier},
};

/// A fully-resolved call handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCall {
  pub model:         String,
  pub system_prompt: Option<String>,
  pub prompt:        String,
  pub max_tokens:    u32,
  pub temperature:   f32,
}

/// Wire-level access to a chat-completion provider.
pub trait ChatTransport: Send + Sync {
  fn chat<'a>(
    &'a self,
    call: &'a ChatCall,
  ) -> impl Future<Output = Result<String>> + Send + 'a;
}

/// The production [`Completion`] implementation.
#[derive(Debug, Clone)]
pub struct Gateway<T> {
  transport:     T,
  models:        ModelTable,
  json_attempts: u32,
}

impl<T: ChatTransport> Gateway<T> {
  pub fn new(transport: T, models: ModelTable, json_attempts: u32) -> Self {
    Self { transport, models, json_attempts: json_attempts.max(1) }
  }

  pub fn models(&self) -> &ModelTable { &self.models }

  async fn call(&self, model: &str, request: &CompletionRequest) -> Result<Completed> {
    let call = ChatCall {
      model:         model.to_owned(),
      system_prompt: request.system_prompt.clone(),
      prompt:        request.prompt.clone(),
      max_tokens:    request.max_tokens,
      temperature:   request.temperature,
    };
    tracing::debug!(model, max_tokens = call.max_tokens, "completion call");

    let text = self.transport.chat(&call).await?;
    if text.trim().is_empty() {
      return Err(Error::EmptyResponse);
    }
    Ok(Completed { text, model: call.model })
  }

  async fn complete_tier(
    &self,
    tier: ModelTier,
    request: &CompletionRequest,
  ) -> Result<Completed> {
    let model = self.models.model_for(tier);
    match self.call(model, request).await {
      Ok(done) => Ok(done),
      Err(e) if e.is_upstream() => {
        let Some(fallback) = tier.fallback() else {
          return Err(e);
        };
        tracing::warn!(
          %tier,
          %fallback,
          error = %e,
          "completion failed; retrying at cheaper tier"
        );
        self.call(self.models.model_for(fallback), request).await
      }
      Err(e) => Err(e),
    }
  }
}

impl Gateway<OpenRouterTransport> {
  /// Build the HTTP-backed gateway from configuration.
  pub fn from_config(config: &LlmConfig) -> Result<Self> {
    let transport = OpenRouterTransport::new(
      &config.api_key,
      &config.base_url,
      config.timeout(),
    )?;
    Ok(Self::new(transport, config.models.clone(), config.json_attempts))
  }
}

impl<T: ChatTransport> Completion for Gateway<T> {
  async fn complete(&self, request: CompletionRequest) -> Result<Completed> {
    match &request.model {
      ModelChoice::Tier(tier) => self.complete_tier(*tier, &request).await,
      ModelChoice::Model(model) => self.call(model, &request).await,
    }
  }

  fn json_attempts(&self) -> u32 { self.json_attempts }
}
