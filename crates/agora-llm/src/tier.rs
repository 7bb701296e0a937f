//! Model tiers and the table mapping them to provider model ids.

use serde::{Deserialize, Serialize};

/// Cost/quality tier of a completion.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModelTier {
  Free,
  Cheap,
  Balanced,
  Quality,
}

impl ModelTier {
  /// The tier a failed call is retried at, if any. Only the two upper tiers
  /// fall back, and always to [`ModelTier::Cheap`].
  pub fn fallback(self) -> Option<ModelTier> {
    match self {
      Self::Balanced | Self::Quality => Some(Self::Cheap),
      Self::Free | Self::Cheap => None,
    }
  }
}

/// Model id per tier. Every entry can be overridden from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelTable {
  pub free:     String,
  pub cheap:    String,
  pub balanced: String,
  pub quality:  String,
}

impl Default for ModelTable {
  fn default() -> Self {
    Self {
      free:     "meta-llama/llama-3.3-70b-instruct:free".into(),
      cheap:    "openai/gpt-4o-mini".into(),
      balanced: "anthropic/claude-3.5-haiku".into(),
      quality:  "anthropic/claude-sonnet-4".into(),
    }
  }
}

impl ModelTable {
  pub fn model_for(&self, tier: ModelTier) -> &str {
    match tier {
      ModelTier::Free => &self.free,
      ModelTier::Cheap => &self.cheap,
      ModelTier::Balanced => &self.balanced,
      ModelTier::Quality => &self.quality,
    }
  }
}
