//! In-process cron: one generation cycle per interval.

use std::{sync::Arc, time::Duration};

use agora_core::store::ForumStore;
use agora_engine::Engine;
use agora_llm::Completion;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Spawn a task that runs [`Engine::run_cycle`] every `every`.
///
/// The first cycle runs one full interval after startup. A failed cycle is
/// logged and the loop carries on; ticks missed while a slow cycle was
/// running are skipped rather than bunched up.
pub fn spawn_cycle_loop<S, C>(
  engine: Arc<Engine<S, C>>,
  every: Duration,
) -> JoinHandle<()>
where
  S: ForumStore + 'static,
  C: Completion + 'static,
{
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    interval.tick().await;
    loop {
      interval.tick().await;
      match engine.run_cycle().await {
        Ok(report) => tracing::info!(
          report = %serde_json::to_string(&report).unwrap_or_default(),
          "scheduled cycle finished"
        ),
        Err(e) => tracing::warn!(error = %e, "scheduled cycle failed"),
      }
    }
  })
}
