//! [`CompletionRequest`] and its builder methods.

use serde::{Deserialize, Serialize};

use crate::tier::ModelTier;

/// Either a tier resolved through the gateway's model table, or an explicit
/// provider model id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
  Tier(ModelTier),
  Model(String),
}

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
  pub prompt:        String,
  pub model:         ModelChoice,
  pub max_tokens:    u32,
  /// Sampling temperature in `0.0..=1.0`.
  pub temperature:   f32,
  pub system_prompt: Option<String>,
}

impl CompletionRequest {
  pub const DEFAULT_MAX_TOKENS: u32 = 1_024;
  pub const DEFAULT_TEMPERATURE: f32 = 0.7;

  /// A balanced-tier request with default bounds.
  pub fn new(prompt: impl Into<String>) -> Self {
    Self {
      prompt:        prompt.into(),
      model:         ModelChoice::Tier(ModelTier::Balanced),
      max_tokens:    Self::DEFAULT_MAX_TOKENS,
      temperature:   Self::DEFAULT_TEMPERATURE,
      system_prompt: None,
    }
  }

  pub fn tier(mut self, tier: ModelTier) -> Self {
    self.model = ModelChoice::Tier(tier);
    self
  }

  /// Use an explicit model id instead of a tier.
  pub fn model(mut self, model: impl Into<String>) -> Self {
    self.model = ModelChoice::Model(model.into());
    self
  }

  pub fn max_tokens(mut self, max_tokens: u32) -> Self {
    self.max_tokens = max_tokens;
    self
  }

  /// Clamped to `0.0..=1.0`.
  pub fn temperature(mut self, temperature: f32) -> Self {
    self.temperature = temperature.clamp(0.0, 1.0);
    self
  }

  pub fn system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
    self.system_prompt = Some(system_prompt.into());
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builder_overrides_defaults() {
    let req = CompletionRequest::new("hi")
      .tier(ModelTier::Quality)
      .max_tokens(50)
      .temperature(3.0)
      .system_prompt("be brief");
    assert_eq!(req.model, ModelChoice::Tier(ModelTier::Quality));
    assert_eq!(req.max_tokens, 50);
    assert_eq!(req.temperature, 1.0);
    assert_eq!(req.system_prompt.as_deref(), Some("be brief"));
  }

  #[test]
  fn explicit_model_replaces_tier() {
    let req = CompletionRequest::new("hi").model("acme/judge");
    assert_eq!(req.model, ModelChoice::Model("acme/judge".into()));
  }
}
