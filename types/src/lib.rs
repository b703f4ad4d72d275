//! Shared configuration types for Stagehand.
//!
//! These enums are the vocabulary shared between the engine core and any
//! front-end that edits rule files: which OS a rule targets, how URL
//! patterns are interpreted, and how actions gate on match results.

pub mod selectors;

pub use selectors::{
    GateScope, GateTiming, OsKind, RuleSource, SimpleAction, TriggerRelation, UrlMatchKind,
};
