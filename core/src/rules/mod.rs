//! Rule and group definitions, configuration loading, and candidate indexing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Rule files (TOML config)                    │
//! │  "While a docs.rs tab is open, enable the dev-tools group"      │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                         load_rules()
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │             RuleBook (merged rules + groups, by id)              │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                       RuleIndex::rebuild
//!                              │
//!                              ▼
//!                  Engine evaluation round (crate::engine)
//! ```

mod book;
mod config;
mod definition;
mod index;

pub use book::RuleBook;
pub use config::{ConfigError, default_custom_dir, load_file, load_rules, save_file};
pub use definition::{
    ActionGate, DOMAIN_RULE_LEVEL, GroupDefinition, Rule, RuleAction, RuleConfig, RuleTarget,
    TimeWindow, Trigger,
};
pub use index::{INDEX_MIN_RULES, RuleIndex};
