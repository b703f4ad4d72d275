//! Standing invariant enforcement: always-on groups and mutex groups.
//!
//! Both guards operate at the host boundary, outside ordinary rule
//! evaluation. Always-on enforcement runs as an unprioritized round
//! through the accumulator; the mutex guard reacts synchronously to
//! enable notifications and may race with an in-flight round, which is
//! tolerated because a double-disable is idempotent at the host.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::host::{ExtensionHost, HostError};
use crate::rules::RuleBook;

use super::accumulator::{RoundOutcome, TaskAccumulator};
use super::resolver::Priority;

/// Re-enable every member of an always-on group that is currently off.
///
/// Called on startup and on scene change. This is proactive, not
/// protective: it does not prevent a later rule-driven disable. Members
/// already enabled produce zero host calls.
pub async fn enforce_always_on<H: ExtensionHost>(
    book: &RuleBook,
    host: &H,
    controller_id: &str,
) -> Result<RoundOutcome, HostError> {
    let members: BTreeSet<String> = book
        .groups
        .values()
        .filter(|group| group.always_on)
        .flat_map(|group| group.members.iter().cloned())
        .collect();

    let mut accumulator = TaskAccumulator::new(controller_id);
    if !members.is_empty() {
        accumulator.open(
            members,
            false,
            Priority {
                level: 0,
                is_fallback: false,
            },
        );
    }
    // The executor diffs against host state, so already-enabled members
    // are skipped without a call.
    accumulator.execute(host).await
}

/// Disable every other enabled member of any mutex group containing
/// `enabled_id`. Fired per extension-enabled notification, independent
/// of evaluation rounds.
pub async fn on_extension_enabled<H: ExtensionHost>(
    enabled_id: &str,
    book: &RuleBook,
    host: &H,
    controller_id: &str,
) -> Result<(), HostError> {
    let siblings: BTreeSet<&str> = book
        .groups
        .values()
        .filter(|group| group.is_mutex && group.members.iter().any(|m| m == enabled_id))
        .flat_map(|group| group.members.iter().map(String::as_str))
        .filter(|member| *member != enabled_id && *member != controller_id)
        .collect();

    if siblings.is_empty() {
        return Ok(());
    }

    let installed = host.list_extensions().await?;
    for ext in installed
        .iter()
        .filter(|ext| ext.enabled && siblings.contains(ext.id.as_str()))
    {
        match host.set_enabled(&ext.id, false).await {
            Ok(()) => {
                debug!(extension_id = %ext.id, sibling_of = %enabled_id, "mutex sibling disabled");
            }
            Err(e) => {
                warn!(extension_id = %ext.id, error = %e, "mutex disable failed");
            }
        }
    }

    Ok(())
}
