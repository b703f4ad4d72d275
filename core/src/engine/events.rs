//! Coalesced event intake for the engine.
//!
//! External notifications arrive on a bounded channel; a short quiet
//! window collapses bursts into a single evaluation round so rapid
//! context changes do not thrash the host. Superseded work is simply
//! dropped — there is no cooperative preemption, and a prior round's
//! already-issued state changes are never undone.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::host::ExtensionHost;

use super::Engine;
use super::context::ContextProvider;
use super::guards::on_extension_enabled;

/// Quiet window used to coalesce event bursts into one round.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(20);

/// Bound on pending events; senders block (async) when the engine
/// falls behind, which is itself a form of coalescing pressure.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// External happenings that can start an evaluation round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Active or open document set changed
    Navigation,
    /// User switched the active scene
    SceneChanged,
    /// An extension was switched on (also fires the mutex guard)
    ExtensionEnabled(String),
    /// An extension was switched off
    ExtensionDisabled(String),
    /// Rule set mutated in the configuration store
    RulesChanged,
    /// Periodic timer tick, driving period triggers
    Tick,
}

/// Create the bounded engine event channel.
pub fn event_channel() -> (mpsc::Sender<EngineEvent>, mpsc::Receiver<EngineEvent>) {
    mpsc::channel(EVENT_QUEUE_CAPACITY)
}

/// Drive the engine from an event stream until the channel closes.
///
/// Each received event opens a coalescing window; everything arriving
/// inside it folds into the same round. Mutex guard work for
/// `ExtensionEnabled` runs before the round so rule evaluation sees the
/// post-guard state where possible.
pub async fn run_event_loop<H, C>(
    engine: &mut Engine,
    rx: &mut mpsc::Receiver<EngineEvent>,
    host: &H,
    contexts: &C,
) where
    H: ExtensionHost,
    C: ContextProvider,
{
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        let mut closed = false;

        loop {
            match timeout(DEBOUNCE_WINDOW, rx.recv()).await {
                Ok(Some(event)) => batch.push(event),
                Ok(None) => {
                    closed = true;
                    break;
                }
                // Quiet window elapsed
                Err(_) => break,
            }
        }

        handle_batch(engine, batch, host, contexts).await;

        if closed {
            return;
        }
    }
}

async fn handle_batch<H, C>(engine: &mut Engine, batch: Vec<EngineEvent>, host: &H, contexts: &C)
where
    H: ExtensionHost,
    C: ContextProvider,
{
    debug!(events = batch.len(), "coalesced event batch");

    for event in batch {
        match event {
            EngineEvent::RulesChanged => engine.invalidate_index(),
            EngineEvent::ExtensionEnabled(id) => {
                if let Err(e) = on_extension_enabled(&id, engine.book(), host, engine.controller_id()).await
                {
                    warn!(extension_id = %id, error = %e, "mutex guard failed");
                }
            }
            EngineEvent::Navigation
            | EngineEvent::SceneChanged
            | EngineEvent::ExtensionDisabled(_)
            | EngineEvent::Tick => {}
        }
    }

    let ctx = contexts.snapshot();
    match engine.evaluate_round(&ctx, host).await {
        Ok(outcome) => {
            debug!(
                applied = outcome.applied.len(),
                failed = outcome.failed.len(),
                reloaded = outcome.reloaded,
                "round complete"
            );
        }
        Err(e) => {
            // Without a directory listing there is nothing to diff
            // against; the next event will retry naturally.
            warn!(error = %e, "round aborted, extension listing unavailable");
        }
    }
}
