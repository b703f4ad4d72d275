//! Selector enums used by rule definitions.
//!
//! All of these serialize as `snake_case` strings so rule TOML stays
//! readable and hand-editable.

use serde::{Deserialize, Serialize};

/// Host operating system kinds a rule can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsKind {
    Windows,
    Macos,
    Linux,
    ChromeOs,
    Android,
    OpenBsd,
}

impl OsKind {
    /// The kind this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Macos
        } else if cfg!(target_os = "android") {
            Self::Android
        } else if cfg!(target_os = "openbsd") {
            Self::OpenBsd
        } else {
            Self::Linux
        }
    }
}

/// How URL trigger patterns are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlMatchKind {
    /// Glob-style: `*` matches any run of characters, `?` a single one.
    /// A pattern without wildcards matches as a plain substring.
    #[default]
    Wildcard,
    /// Raw regular expression
    Regex,
}

/// How a rule combines multiple triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerRelation {
    /// Every trigger must hold
    #[default]
    And,
    /// At least one trigger must hold
    Or,
}

/// Where a rule came from.
///
/// Domain-auto rules are generated per site and always outrank user
/// rules; their stored `priority` field is ignored in favor of a fixed
/// elevated level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    #[default]
    User,
    DomainAuto,
}

/// Simple-mode action table.
///
/// The `..OnlyWhenMatched` variants always fire: the primary branch
/// when the rule matches, the opposite-kind fallback branch when it
/// does not. Fallback requests lose priority ties against matched
/// requests at the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleAction {
    /// Enable targets while the rule matches the current context
    OpenWhenMatched,
    /// Disable targets while the rule matches the current context
    CloseWhenMatched,
    /// Enable on match, disable (as fallback) otherwise
    OpenOnlyWhenMatched,
    /// Disable on match, enable (as fallback) otherwise
    CloseOnlyWhenMatched,
    /// Produce no requests at all
    #[default]
    None,
}

/// Timing condition for a custom action gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateTiming {
    /// Gate is consulted while the rule matches somewhere
    Match,
    /// Gate is consulted while the rule matches nowhere (fallback branch)
    NotMatch,
}

/// Scope condition for a custom action gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateScope {
    /// The active document/scene matches
    CurrentMatch,
    /// Any open document matches
    AnyMatch,
    /// The active document/scene does not match
    CurrentNotMatch,
    /// No open document matches
    AllNotMatch,
}
