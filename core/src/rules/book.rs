//! Merged rule and group store.
//!
//! Rules keep their configuration insertion order; among equal
//! priorities the later-inserted rule is evaluated later and therefore
//! wins conflicts (last-write-wins at the accumulator).

use std::collections::HashMap;

use tracing::warn;

use super::definition::{GroupDefinition, Rule, RuleConfig};

/// Combined set of rule and group definitions.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    /// Rules in configuration insertion order
    rules: Vec<Rule>,
    /// Rule id -> position in `rules`
    by_id: HashMap<String, usize>,

    /// All group definitions, keyed by id
    pub groups: HashMap<String, GroupDefinition>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add definitions from a config, returns ids of any duplicates.
    /// A duplicate rule replaces the earlier one in place, keeping its
    /// original evaluation position; a duplicate group is replaced.
    pub fn add_config(&mut self, config: RuleConfig) -> Vec<String> {
        let mut duplicates = Vec::new();

        for rule in config.rules {
            if rule.id.is_empty() {
                warn!(rule_name = %rule.name, "rule without id skipped");
                continue;
            }
            match self.by_id.get(&rule.id) {
                Some(&idx) => {
                    duplicates.push(rule.id.clone());
                    self.rules[idx] = rule;
                }
                None => {
                    self.by_id.insert(rule.id.clone(), self.rules.len());
                    self.rules.push(rule);
                }
            }
        }

        for group in config.groups {
            if group.id.is_empty() {
                warn!(group_name = %group.name, "group without id skipped");
                continue;
            }
            if self.groups.contains_key(&group.id) {
                duplicates.push(group.id.clone());
            }
            self.groups.insert(group.id.clone(), group);
        }

        duplicates
    }

    /// Insert or replace a single rule.
    pub fn insert_rule(&mut self, rule: Rule) {
        match self.by_id.get(&rule.id) {
            Some(&idx) => self.rules[idx] = rule,
            None => {
                self.by_id.insert(rule.id.clone(), self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    /// Insert or replace a single group.
    pub fn insert_group(&mut self, group: GroupDefinition) {
        self.groups.insert(group.id.clone(), group);
    }

    /// Get a rule definition by id.
    pub fn get_rule(&self, id: &str) -> Option<&Rule> {
        self.by_id.get(id).map(|&idx| &self.rules[idx])
    }

    /// Get a group definition by id.
    pub fn get_group(&self, id: &str) -> Option<&GroupDefinition> {
        self.groups.get(id)
    }

    /// All rules in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Enabled rules in ascending effective-level order. The sort is
    /// stable, so equal levels keep configuration insertion order.
    pub fn enabled_rules(&self) -> Vec<&Rule> {
        let mut out: Vec<&Rule> = self.rules.iter().filter(|r| r.enabled).collect();
        out.sort_by_key(|r| r.effective_level());
        out
    }
}
