pub mod engine;
pub mod host;
pub mod rules;

// Re-exports for convenience
pub use engine::{
    Engine, EngineEvent, EvalContext, MatchResult, PlannedChange, RoundOutcome, TaskAccumulator,
};
pub use host::{ExtensionHost, ExtensionInfo, HostError};
pub use rules::{GroupDefinition, Rule, RuleBook, RuleIndex, Trigger};
