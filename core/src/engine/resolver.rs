//! Target and action resolution.
//!
//! Turns a rule's configured target and action, plus the round's match
//! result, into concrete open/close requests for the accumulator. A
//! missing group or an empty target set makes the rule contribute
//! nothing; it never aborts the round.

use std::collections::BTreeSet;

use tracing::debug;

use stagehand_types::{GateScope, GateTiming, SimpleAction};

use crate::rules::{ActionGate, Rule, RuleAction, RuleBook};

use super::accumulator::TaskKind;
use super::matcher::MatchResult;

/// Priority carried by every task request.
///
/// `level` mirrors the owning rule's effective level. `is_fallback`
/// marks requests from the "otherwise" branch of an Only-mode action;
/// they lose ties against a matched branch at the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority {
    pub level: i32,
    pub is_fallback: bool,
}

impl Priority {
    /// Lexicographic strength: higher level wins, then matched branch
    /// beats fallback.
    pub fn strength(&self) -> (i32, bool) {
        (self.level, !self.is_fallback)
    }
}

/// One desired open/close request produced by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRequest {
    pub kind: TaskKind,
    pub reload: bool,
    pub priority: Priority,
}

/// Expand a rule's target into concrete extension ids.
///
/// Direct ids are unioned with the members of every referenced group;
/// unknown groups contribute nothing. The controller's own id is always
/// excluded — a rule may never target itself.
pub fn resolve_targets(rule: &Rule, book: &RuleBook, controller_id: &str) -> BTreeSet<String> {
    let mut out: BTreeSet<String> = rule.target.extensions.iter().cloned().collect();

    for group_id in &rule.target.groups {
        match book.get_group(group_id) {
            Some(group) => out.extend(group.members.iter().cloned()),
            None => {
                debug!(rule_id = %rule.id, group_id = %group_id, "unknown group in rule target");
            }
        }
    }

    out.remove(controller_id);
    out
}

/// Map a rule's action and match result to zero or more task requests.
pub fn resolve_actions(rule: &Rule, result: &MatchResult) -> Vec<TaskRequest> {
    let level = rule.effective_level();

    match &rule.action {
        RuleAction::Simple { action, reload } => simple_requests(*action, *reload, result, level),
        RuleAction::Custom { enable, disable } => {
            // Both gates may fire in the same round; a rule is allowed
            // to emit an open and a close against different subsets.
            let mut out = Vec::new();
            if let Some(gate) = enable {
                if let Some(request) = gate_request(gate, TaskKind::Open, result, level) {
                    out.push(request);
                }
            }
            if let Some(gate) = disable {
                if let Some(request) = gate_request(gate, TaskKind::Close, result, level) {
                    out.push(request);
                }
            }
            out
        }
    }
}

fn simple_requests(
    action: SimpleAction,
    reload: bool,
    result: &MatchResult,
    level: i32,
) -> Vec<TaskRequest> {
    let matched = result.is_current_match;
    let request = |kind, is_fallback| TaskRequest {
        kind,
        reload,
        priority: Priority { level, is_fallback },
    };

    match action {
        SimpleAction::None => vec![],
        SimpleAction::OpenWhenMatched if matched => vec![request(TaskKind::Open, false)],
        SimpleAction::CloseWhenMatched if matched => vec![request(TaskKind::Close, false)],
        SimpleAction::OpenWhenMatched | SimpleAction::CloseWhenMatched => vec![],
        // The Only-variants always fire: primary branch on match,
        // opposite-kind fallback branch otherwise.
        SimpleAction::OpenOnlyWhenMatched => {
            if matched {
                vec![request(TaskKind::Open, false)]
            } else {
                vec![request(TaskKind::Close, true)]
            }
        }
        SimpleAction::CloseOnlyWhenMatched => {
            if matched {
                vec![request(TaskKind::Close, false)]
            } else {
                vec![request(TaskKind::Open, true)]
            }
        }
    }
}

/// A custom gate fires only when both its timing and scope conditions
/// hold. Not-match timing marks the request as a fallback.
fn gate_request(
    gate: &ActionGate,
    kind: TaskKind,
    result: &MatchResult,
    level: i32,
) -> Option<TaskRequest> {
    let timing_ok = match gate.timing {
        GateTiming::Match => result.is_any_match,
        GateTiming::NotMatch => !result.is_any_match,
    };
    let scope_ok = match gate.scope {
        GateScope::CurrentMatch => result.is_current_match,
        GateScope::AnyMatch => result.is_any_match,
        GateScope::CurrentNotMatch => !result.is_current_match,
        GateScope::AllNotMatch => !result.is_any_match,
    };

    (timing_ok && scope_ok).then_some(TaskRequest {
        kind,
        reload: gate.reload,
        priority: Priority {
            level,
            is_fallback: gate.timing == GateTiming::NotMatch,
        },
    })
}
