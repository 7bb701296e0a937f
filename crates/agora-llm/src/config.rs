//! Gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::tier::ModelTable;

/// Connection and model settings for [`crate::Gateway::from_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
  pub api_key:       String,
  /// Base URL of an OpenAI-compatible API, without the `/chat/completions`
  /// suffix.
  pub base_url:      String,
  pub timeout_secs:  u64,
  pub models:        ModelTable,
  /// Total attempts for a JSON completion before it is reported invalid.
  pub json_attempts: u32,
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      api_key:       String::new(),
      base_url:      "https://openrouter.ai/api/v1".into(),
      timeout_secs:  120,
      models:        ModelTable::default(),
      json_attempts: 2,
    }
  }
}

impl LlmConfig {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}
