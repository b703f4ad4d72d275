//! Rule evaluation engine
//!
//! One **round** is a complete evaluate-and-execute pass triggered by a
//! single coalesced event:
//!
//! ```text
//! event burst ──► coalesce (20 ms) ──► round
//!                                        │
//!                       RuleIndex narrows candidates
//!                                        │
//!             per rule, ascending priority:
//!                 match → targets → actions
//!                                        │
//!                                        ▼
//!                  TaskAccumulator (conflict resolution)
//!                                        │
//!                                        ▼
//!                minimal enable/disable batch via ExtensionHost
//! ```
//!
//! Rules are read-only inside a round; mutation happens between rounds
//! through the configuration store, followed by `invalidate_index`.

mod accumulator;
mod context;
mod events;
mod guards;
mod matcher;
mod resolver;


pub use accumulator::{ExecuteTask, PlannedChange, RoundOutcome, TaskAccumulator, TaskKind};
pub use context::{ContextProvider, DocumentView, EvalContext};
pub use events::{DEBOUNCE_WINDOW, EVENT_QUEUE_CAPACITY, EngineEvent, event_channel, run_event_loop};
pub use guards::{enforce_always_on, on_extension_enabled};
pub use matcher::{MatchResult, evaluate};
pub use resolver::{Priority, TaskRequest, resolve_actions, resolve_targets};

use std::collections::HashSet;

use tracing::debug;

use crate::host::{ExtensionHost, HostError};
use crate::rules::{INDEX_MIN_RULES, Rule, RuleBook, RuleIndex};

/// The rule matching and batched execution engine.
///
/// Owns a snapshot of the rule set plus the derived candidate index.
/// Context is injected per round; there is no global registry.
pub struct Engine {
    controller_id: String,
    book: RuleBook,
    index: RuleIndex,
    index_dirty: bool,
}

impl Engine {
    pub fn new(controller_id: impl Into<String>, book: RuleBook) -> Self {
        Self {
            controller_id: controller_id.into(),
            book,
            index: RuleIndex::new(),
            index_dirty: true,
        }
    }

    pub fn controller_id(&self) -> &str {
        &self.controller_id
    }

    pub fn book(&self) -> &RuleBook {
        &self.book
    }

    /// Swap in a new rule set; the index is rebuilt lazily on first use.
    pub fn replace_rules(&mut self, book: RuleBook) {
        self.book = book;
        self.invalidate_index();
    }

    /// Mark the candidate index stale after a rule-set mutation.
    pub fn invalidate_index(&mut self) {
        self.index_dirty = true;
    }

    fn ensure_index(&mut self) {
        if self.index_dirty {
            self.index.rebuild(self.book.rules());
            self.index_dirty = false;
            debug!(indexed = self.index.len(), "rule index rebuilt");
        }
    }

    /// Candidate rule ids for this context: every id the index surfaces
    /// for the open documents, active scene, and host OS, unioned with
    /// the rules the index cannot discover.
    fn candidate_ids(&self, ctx: &EvalContext) -> HashSet<String> {
        let mut ids = HashSet::new();

        if let Some(doc) = &ctx.current_document {
            ids.extend(self.index.candidates_for_url(&doc.url));
        }
        for doc in &ctx.open_documents {
            ids.extend(self.index.candidates_for_url(&doc.url));
        }
        if let Some(scene) = &ctx.active_scene {
            ids.extend(self.index.candidates_for_scene(scene));
        }
        ids.extend(self.index.candidates_for_os(ctx.os));
        ids.extend(self.index.unindexed().iter().cloned());

        ids
    }

    /// Run the collection phase of one round: narrow, match, resolve,
    /// accumulate. Rules are processed in ascending effective-level
    /// order so later-priority rules override earlier ones.
    fn collect(&mut self, ctx: &EvalContext) -> TaskAccumulator {
        self.ensure_index();

        let enabled = self.book.enabled_rules();
        let selected: Vec<&Rule> = if enabled.len() < INDEX_MIN_RULES {
            enabled
        } else {
            let ids = self.candidate_ids(ctx);
            enabled
                .into_iter()
                .filter(|rule| ids.contains(&rule.id))
                .collect()
        };

        let mut accumulator = TaskAccumulator::new(&self.controller_id);
        for rule in selected {
            let result = matcher::evaluate(rule, ctx);
            let requests = resolver::resolve_actions(rule, &result);
            if requests.is_empty() {
                continue;
            }

            let targets = resolver::resolve_targets(rule, &self.book, &self.controller_id);
            if targets.is_empty() {
                debug!(rule_id = %rule.id, "rule resolves no targets, skipped");
                continue;
            }

            for request in requests {
                accumulator.push(request.kind, targets.clone(), request.reload, request.priority);
            }
        }

        accumulator
    }

    /// Resolve one round without touching the host: the winning change
    /// set the executor would apply. Used by dry-run tooling and tests.
    pub fn plan_round(&mut self, ctx: &EvalContext) -> Vec<PlannedChange> {
        self.collect(ctx).resolve()
    }

    /// Run one full evaluation round against a context snapshot.
    ///
    /// Only the initial directory listing can fail the round; per-rule
    /// and per-target failures degrade to "contributes nothing" plus a
    /// log record.
    pub async fn evaluate_round<H: ExtensionHost>(
        &mut self,
        ctx: &EvalContext,
        host: &H,
    ) -> Result<RoundOutcome, HostError> {
        self.collect(ctx).execute(host).await
    }

    /// Re-enable members of always-on groups, as an ordinary round.
    pub async fn enforce_always_on<H: ExtensionHost>(
        &self,
        host: &H,
    ) -> Result<RoundOutcome, HostError> {
        guards::enforce_always_on(&self.book, host, &self.controller_id).await
    }

    /// Extension-enabled hook: disable mutex siblings of `enabled_id`.
    pub async fn on_extension_enabled<H: ExtensionHost>(
        &self,
        enabled_id: &str,
        host: &H,
    ) -> Result<(), HostError> {
        guards::on_extension_enabled(enabled_id, &self.book, host, &self.controller_id).await
    }
}
