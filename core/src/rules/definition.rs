//! Rule and group definition types
//!
//! Definitions are templates loaded from TOML config files that describe
//! when managed extensions should be switched on or off. A `Rule` is
//! immutable once handed to an evaluation round; edits happen in the
//! configuration store between rounds.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use stagehand_types::{
    GateScope, GateTiming, OsKind, RuleSource, SimpleAction, TriggerRelation, UrlMatchKind,
};

/// Fixed effective level for domain-auto rules. User rule levels come
/// from their `priority` field and are expected to stay well below this.
pub const DOMAIN_RULE_LEVEL: i32 = 1_000;

// ═══════════════════════════════════════════════════════════════════════════
// Triggers
// ═══════════════════════════════════════════════════════════════════════════

/// One testable contextual condition.
///
/// A trigger with an empty pattern/id list never matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Trigger {
    /// Active or any open document URL satisfies one of the patterns
    Url {
        #[serde(default)]
        patterns: Vec<String>,
        #[serde(default)]
        match_kind: UrlMatchKind,
    },

    /// Active scene is one of the listed ids
    Scene {
        #[serde(default)]
        scene_ids: Vec<String>,
    },

    /// Host OS is one of the listed kinds
    Os {
        #[serde(default)]
        os_kinds: Vec<OsKind>,
    },

    /// Wall-clock time falls inside one of the windows
    Period {
        #[serde(default)]
        windows: Vec<TimeWindow>,
    },
}

/// A daily time window. A window with `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Whether a wall-clock time falls inside this window (inclusive).
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= t && t <= self.end
        } else {
            t >= self.start || t <= self.end
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Rules
// ═══════════════════════════════════════════════════════════════════════════

/// Which extensions a rule controls.
///
/// Direct ids are unioned with the members of every referenced group;
/// the controller's own id is always removed from the result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleTarget {
    /// Group ids whose members are targeted
    #[serde(default)]
    pub groups: Vec<String>,

    /// Extension ids targeted directly
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl RuleTarget {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.extensions.is_empty()
    }
}

/// A gate in a custom-mode action: fires when both its timing and scope
/// conditions hold against the round's match result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGate {
    pub timing: GateTiming,
    pub scope: GateScope,

    /// Reload the affected document after the transition
    #[serde(default)]
    pub reload: bool,
}

/// What a rule does when evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum RuleAction {
    /// One of the five fixed simple actions
    Simple {
        #[serde(default)]
        action: SimpleAction,

        /// Reload the affected document after a transition
        #[serde(default)]
        reload: bool,
    },

    /// Two independent gates; both may fire in the same round
    Custom {
        /// Gate producing enable (open) requests
        #[serde(default)]
        enable: Option<ActionGate>,

        /// Gate producing disable (close) requests
        #[serde(default)]
        disable: Option<ActionGate>,
    },
}

impl RuleAction {
    /// Whether this action can emit a request while the rule's triggers
    /// match nothing in the context. Such rules must be evaluated every
    /// round; narrowing them away by trigger key would suppress their
    /// fallback branch.
    pub fn fires_when_unmatched(&self) -> bool {
        match self {
            Self::Simple { action, .. } => matches!(
                action,
                SimpleAction::OpenOnlyWhenMatched | SimpleAction::CloseOnlyWhenMatched
            ),
            Self::Custom { enable, disable } => [enable, disable].into_iter().flatten().any(
                |gate| {
                    gate.timing == GateTiming::NotMatch
                        || matches!(
                            gate.scope,
                            GateScope::CurrentNotMatch | GateScope::AllNotMatch
                        )
                },
            ),
        }
    }
}

impl Default for RuleAction {
    fn default() -> Self {
        Self::Simple {
            action: SimpleAction::None,
            reload: false,
        }
    }
}

/// Declarative if-trigger/then-action configuration unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier for this rule
    pub id: String,

    /// Display name shown in front-ends
    #[serde(default)]
    pub name: String,

    /// Whether this rule participates in evaluation
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Evaluation priority; higher values are evaluated later and win
    /// conflicts against lower ones
    #[serde(default)]
    pub priority: i32,

    /// Origin of the rule (user vs generated domain rule)
    #[serde(default)]
    pub source: RuleSource,

    /// How the triggers combine
    #[serde(default)]
    pub relation: TriggerRelation,

    /// Contextual conditions; a rule with none is vacuously matched
    #[serde(default, rename = "trigger")]
    pub triggers: Vec<Trigger>,

    /// Extensions this rule controls
    #[serde(default)]
    pub target: RuleTarget,

    /// What to do with the targets
    #[serde(default)]
    pub action: RuleAction,
}

impl Rule {
    /// Priority level used for conflict resolution and evaluation order.
    /// Domain-auto rules sit at a fixed elevated level.
    pub fn effective_level(&self) -> i32 {
        match self.source {
            RuleSource::User => self.priority,
            RuleSource::DomainAuto => DOMAIN_RULE_LEVEL,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Groups
// ═══════════════════════════════════════════════════════════════════════════

/// A named set of extensions, referenced by rule targets and by the
/// always-on / mutex invariant guards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDefinition {
    /// Unique identifier for this group
    pub id: String,

    /// Display name shown in front-ends
    #[serde(default)]
    pub name: String,

    /// Member extension ids
    #[serde(default)]
    pub members: Vec<String>,

    /// Members are proactively re-enabled on startup and scene change
    #[serde(default)]
    pub always_on: bool,

    /// Enabling one member forces all siblings off
    #[serde(default)]
    pub is_mutex: bool,
}

// ═══════════════════════════════════════════════════════════════════════════
// Config File Structure
// ═══════════════════════════════════════════════════════════════════════════

/// Root structure for rule/group config files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Rule definitions in this file
    #[serde(default, rename = "rule")]
    pub rules: Vec<Rule>,

    /// Group definitions in this file
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupDefinition>,
}

fn default_true() -> bool {
    true
}
