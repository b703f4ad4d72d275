//! Match evaluation: does a rule's trigger expression hold right now?
//!
//! Every trigger is evaluated twice, against the active ("current")
//! context element and against the full open set ("any"), then the
//! per-trigger outcomes are combined with the rule's and/or relation
//! separately for both scopes.

use regex::Regex;
use tracing::warn;

use stagehand_types::{TriggerRelation, UrlMatchKind};

use crate::rules::{Rule, Trigger};

use super::context::EvalContext;

/// Outcome of evaluating one rule against a context snapshot.
///
/// `is_current_match` implies `is_any_match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchResult {
    /// Satisfied by the active document/scene
    pub is_current_match: bool,
    /// Satisfied by any open document (or by a scopeless trigger)
    pub is_any_match: bool,
}

/// Evaluate a rule's trigger expression.
///
/// A rule with zero triggers passes vacuously, so rules can be scoped
/// purely by target without any contextual gate.
pub fn evaluate(rule: &Rule, ctx: &EvalContext) -> MatchResult {
    if rule.triggers.is_empty() {
        return MatchResult {
            is_current_match: true,
            is_any_match: true,
        };
    }

    let per_trigger: Vec<(bool, bool)> = rule
        .triggers
        .iter()
        .map(|trigger| trigger_match(trigger, ctx))
        .collect();

    let (is_current_match, is_any_match) = match rule.relation {
        TriggerRelation::And => (
            per_trigger.iter().all(|&(current, _)| current),
            per_trigger.iter().all(|&(_, any)| any),
        ),
        TriggerRelation::Or => (
            per_trigger.iter().any(|&(current, _)| current),
            per_trigger.iter().any(|&(_, any)| any),
        ),
    };

    MatchResult {
        is_current_match,
        is_any_match,
    }
}

/// Evaluate one trigger, returning `(current, any)` satisfaction.
fn trigger_match(trigger: &Trigger, ctx: &EvalContext) -> (bool, bool) {
    match trigger {
        Trigger::Url {
            patterns,
            match_kind,
        } => {
            if patterns.is_empty() {
                return (false, false);
            }
            let current = ctx
                .current_document
                .as_ref()
                .is_some_and(|doc| url_matches(&doc.url, patterns, *match_kind));
            let any = current
                || ctx
                    .open_documents
                    .iter()
                    .any(|doc| url_matches(&doc.url, patterns, *match_kind));
            (current, any)
        }

        Trigger::Scene { scene_ids } => {
            let hit = ctx
                .active_scene
                .as_deref()
                .is_some_and(|scene| scene_ids.iter().any(|id| id == scene));
            (hit, hit)
        }

        Trigger::Os { os_kinds } => {
            let hit = os_kinds.contains(&ctx.os);
            (hit, hit)
        }

        // No per-document notion; current and any are identical.
        Trigger::Period { windows } => {
            let time = ctx.now.time();
            let hit = windows.iter().any(|window| window.contains(time));
            (hit, hit)
        }
    }
}

fn url_matches(url: &str, patterns: &[String], kind: UrlMatchKind) -> bool {
    patterns
        .iter()
        .any(|pattern| pattern_matches(url, pattern, kind))
}

/// Test one pattern. Invalid patterns are logged and never match.
fn pattern_matches(url: &str, pattern: &str, kind: UrlMatchKind) -> bool {
    let source = match kind {
        UrlMatchKind::Wildcard => wildcard_to_regex(pattern),
        UrlMatchKind::Regex => pattern.to_string(),
    };

    match Regex::new(&source) {
        Ok(re) => re.is_match(url),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "invalid URL pattern");
            false
        }
    }
}

/// Translate a glob-style pattern to a regex.
///
/// Patterns containing wildcards are anchored; a bare pattern matches
/// as a plain substring anywhere in the URL.
fn wildcard_to_regex(pattern: &str) -> String {
    let has_wildcards = pattern.contains('*') || pattern.contains('?');
    let mut out = String::with_capacity(pattern.len() + 8);

    if has_wildcards {
        out.push('^');
    }
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    if has_wildcards {
        out.push('$');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RuleAction, RuleTarget, TimeWindow};
    use chrono::{NaiveDate, NaiveTime};
    use stagehand_types::{OsKind, RuleSource};

    fn rule(relation: TriggerRelation, triggers: Vec<Trigger>) -> Rule {
        Rule {
            id: "r".into(),
            name: String::new(),
            enabled: true,
            priority: 0,
            source: RuleSource::User,
            relation,
            triggers,
            target: RuleTarget::default(),
            action: RuleAction::default(),
        }
    }

    fn ctx_with_urls(current: Option<&str>, open: &[&str]) -> EvalContext {
        EvalContext {
            current_document: current.map(super::super::context::DocumentView::new),
            open_documents: open
                .iter()
                .map(|u| super::super::context::DocumentView::new(*u))
                .collect(),
            active_scene: None,
            os: OsKind::Linux,
            now: NaiveDate::from_ymd_opt(2026, 8, 24)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    fn url_trigger(patterns: &[&str]) -> Trigger {
        Trigger::Url {
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            match_kind: UrlMatchKind::Wildcard,
        }
    }

    #[test]
    fn test_zero_triggers_vacuously_match() {
        let r = rule(TriggerRelation::And, vec![]);
        let result = evaluate(&r, &ctx_with_urls(None, &[]));
        assert!(result.is_current_match);
        assert!(result.is_any_match);
    }

    #[test]
    fn test_substring_pattern_matches_current() {
        let r = rule(TriggerRelation::And, vec![url_trigger(&["example.com"])]);
        let ctx = ctx_with_urls(Some("https://example.com/page"), &["https://example.com/page"]);
        let result = evaluate(&r, &ctx);
        assert!(result.is_current_match);
        assert!(result.is_any_match);
    }

    #[test]
    fn test_any_without_current() {
        let r = rule(TriggerRelation::And, vec![url_trigger(&["*example.com*"])]);
        let ctx = ctx_with_urls(
            Some("https://other.net/"),
            &["https://other.net/", "https://example.com/"],
        );
        let result = evaluate(&r, &ctx);
        assert!(!result.is_current_match);
        assert!(result.is_any_match);
    }

    #[test]
    fn test_empty_pattern_list_never_matches() {
        let r = rule(TriggerRelation::And, vec![url_trigger(&[])]);
        let ctx = ctx_with_urls(Some("https://example.com/"), &["https://example.com/"]);
        assert_eq!(evaluate(&r, &ctx), MatchResult::default());
    }

    #[test]
    fn test_invalid_regex_never_matches() {
        let r = rule(
            TriggerRelation::And,
            vec![Trigger::Url {
                patterns: vec!["[unclosed".into()],
                match_kind: UrlMatchKind::Regex,
            }],
        );
        let ctx = ctx_with_urls(Some("https://example.com/"), &[]);
        assert_eq!(evaluate(&r, &ctx), MatchResult::default());
    }

    #[test]
    fn test_and_or_relations() {
        let triggers = vec![
            url_trigger(&["*example.com*"]),
            Trigger::Os {
                os_kinds: vec![OsKind::Windows],
            },
        ];
        let ctx = ctx_with_urls(Some("https://example.com/"), &["https://example.com/"]);

        let and_result = evaluate(&rule(TriggerRelation::And, triggers.clone()), &ctx);
        assert!(!and_result.is_current_match);

        let or_result = evaluate(&rule(TriggerRelation::Or, triggers), &ctx);
        assert!(or_result.is_current_match);
    }

    #[test]
    fn test_period_trigger_scopeless() {
        let window = TimeWindow {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        };
        let r = rule(
            TriggerRelation::And,
            vec![Trigger::Period {
                windows: vec![window],
            }],
        );
        // Context time is 12:00, no documents open at all.
        let result = evaluate(&r, &ctx_with_urls(None, &[]));
        assert!(result.is_current_match);
        assert!(result.is_any_match);
    }

    #[test]
    fn test_scene_trigger() {
        let r = rule(
            TriggerRelation::And,
            vec![Trigger::Scene {
                scene_ids: vec!["work".into()],
            }],
        );
        let mut ctx = ctx_with_urls(None, &[]);
        ctx.active_scene = Some("work".into());
        assert!(evaluate(&r, &ctx).is_current_match);

        ctx.active_scene = Some("home".into());
        assert!(!evaluate(&r, &ctx).is_current_match);
    }

    #[test]
    fn test_wildcard_translation() {
        assert_eq!(wildcard_to_regex("example.com"), r"example\.com");
        assert_eq!(wildcard_to_regex("*.rs"), r"^.*\.rs$");
        assert_eq!(wildcard_to_regex("a?c"), "^a.c$");
    }
}
