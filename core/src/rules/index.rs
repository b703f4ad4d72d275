//! Candidate narrowing index over the enabled rule set.
//!
//! The index is a pure cache: it is rebuilt whenever the rule set
//! changes and carries no lifecycle of its own. Lookups return rule-id
//! sets so one triggering event only evaluates candidate rules instead
//! of the whole set.
//!
//! Domain extraction from wildcard/regex patterns is best-effort and
//! lossy; it is an index *hint* only. Rules that cannot be indexed at
//! all land in the `unindexed` set, which callers must union into every
//! candidate set to avoid false negatives.

use std::collections::{HashMap, HashSet};

use stagehand_types::OsKind;

use super::definition::{Rule, Trigger};

/// Below this many enabled rules a full scan beats index upkeep;
/// callers are expected to skip the index entirely.
pub const INDEX_MIN_RULES: usize = 10;

/// Lookup structures over the enabled rule set.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    /// Second-level domain -> rule ids with a URL trigger on it
    by_domain: HashMap<String, HashSet<String>>,
    /// Scene id -> rule ids with a scene trigger on it
    by_scene: HashMap<String, HashSet<String>>,
    /// OS kind -> rule ids with an OS trigger on it
    by_os: HashMap<OsKind, HashSet<String>>,
    /// Rules not discoverable through the maps above, plus rules with a
    /// fallback branch that fires while unmatched
    unindexed: HashSet<String>,
    /// Full rule lookup by id
    rules: HashMap<String, Rule>,
}

impl RuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard prior indices and re-record every enabled rule.
    ///
    /// A rule is recorded under every domain hint from its URL triggers,
    /// every scene id, and every OS kind. A rule with no indexable
    /// trigger, with a URL pattern that yields no domain hint, or with
    /// an action that fires while unmatched is also added to the
    /// unindexed set so it stays reachable.
    pub fn rebuild<'a>(&mut self, rules: impl IntoIterator<Item = &'a Rule>) {
        *self = Self::default();

        for rule in rules {
            if !rule.enabled || rule.id.is_empty() {
                continue;
            }

            let mut indexed = false;
            let mut lossy = false;

            for trigger in &rule.triggers {
                match trigger {
                    Trigger::Url { patterns, .. } => {
                        for pattern in patterns {
                            match domain_hint(pattern) {
                                Some(domain) => {
                                    self.by_domain
                                        .entry(domain)
                                        .or_default()
                                        .insert(rule.id.clone());
                                    indexed = true;
                                }
                                None => lossy = true,
                            }
                        }
                    }
                    Trigger::Scene { scene_ids } => {
                        for scene in scene_ids {
                            self.by_scene
                                .entry(scene.clone())
                                .or_default()
                                .insert(rule.id.clone());
                            indexed = true;
                        }
                    }
                    Trigger::Os { os_kinds } => {
                        for kind in os_kinds {
                            self.by_os.entry(*kind).or_default().insert(rule.id.clone());
                            indexed = true;
                        }
                    }
                    // No per-event key to index on
                    Trigger::Period { .. } => {}
                }
            }

            // Rules whose action has a fallback branch fire even when
            // nothing matches, so trigger keys cannot narrow them out.
            if !indexed || lossy || rule.action.fires_when_unmatched() {
                self.unindexed.insert(rule.id.clone());
            }
            self.rules.insert(rule.id.clone(), rule.clone());
        }
    }

    /// Rule ids whose URL triggers point at the url's domain.
    /// Malformed URLs yield an empty set, never an error.
    pub fn candidates_for_url(&self, url: &str) -> HashSet<String> {
        let Some(domain) = url_domain(url) else {
            return HashSet::new();
        };
        self.by_domain.get(&domain).cloned().unwrap_or_default()
    }

    /// Rule ids with a scene trigger on this scene id.
    pub fn candidates_for_scene(&self, scene_id: &str) -> HashSet<String> {
        self.by_scene.get(scene_id).cloned().unwrap_or_default()
    }

    /// Rule ids with an OS trigger on this kind.
    pub fn candidates_for_os(&self, kind: OsKind) -> HashSet<String> {
        self.by_os.get(&kind).cloned().unwrap_or_default()
    }

    /// Get an indexed rule by id.
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.get(id)
    }

    /// Rules that must always be evaluated alongside indexed candidates.
    pub fn unindexed(&self) -> &HashSet<String> {
        &self.unindexed
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Second-level domain of a concrete URL.
fn url_domain(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    let host = parsed.host_str()?;
    Some(last_two_labels(host))
}

/// Best-effort second-level domain from a wildcard/regex pattern.
///
/// Strips wildcard/regex delimiters and the scheme, cuts the path and
/// port, and keeps the hostname's last two dot-separated labels.
/// Returns `None` when no plausible hostname survives.
fn domain_hint(pattern: &str) -> Option<String> {
    let stripped: String = pattern
        .chars()
        .filter(|c| !matches!(c, '^' | '$' | '\\' | '*' | '?' | '(' | ')' | '[' | ']' | '+' | '|'))
        .collect();

    let after_scheme = match stripped.find("://") {
        Some(idx) => &stripped[idx + 3..],
        None => stripped.as_str(),
    };

    let host = after_scheme
        .split(['/', ':'])
        .next()
        .unwrap_or_default()
        .trim_matches('.');

    if host.is_empty() || !host.contains('.') {
        return None;
    }
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return None;
    }

    Some(last_two_labels(host))
}

/// Keep the last two dot-separated labels of a hostname.
fn last_two_labels(host: &str) -> String {
    let mut labels: Vec<&str> = host.rsplit('.').take(2).collect();
    labels.reverse();
    labels.join(".")
}
