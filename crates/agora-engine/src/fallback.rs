//! Default choices used when a suggested category or persona cannot be
//! resolved.

use agora_core::{forum::Category, persona::Persona};
use uuid::Uuid;

/// Picks a default category or persona. Injected into the engine so tests
/// can pin the choice.
pub trait FallbackPolicy: Send + Sync {
  fn category<'a>(&self, categories: &'a [Category]) -> Option<&'a Category>;

  /// Pick a persona not listed in `exclude`.
  fn persona<'a>(
    &self,
    personas: &'a [Persona],
    exclude: &[Uuid],
  ) -> Option<&'a Persona>;
}

/// First row wins, in store order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstAvailable;

impl FallbackPolicy for FirstAvailable {
  fn category<'a>(&self, categories: &'a [Category]) -> Option<&'a Category> {
    categories.first()
  }

  fn persona<'a>(
    &self,
    personas: &'a [Persona],
    exclude: &[Uuid],
  ) -> Option<&'a Persona> {
    personas
      .iter()
      .find(|p| p.active && !exclude.contains(&p.persona_id))
  }
}
