//! Configuration loading for rule and group definitions
//!
//! Definitions are loaded from TOML files in two locations:
//! - **Builtin**: Shipped with the application (read-only)
//! - **Custom**: User-created rules (editable)
//!
//! Custom definitions with the same id override builtins.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use super::book::RuleBook;
use super::definition::RuleConfig;

/// Load rule definitions from builtin and custom config directories.
///
/// Builtin definitions are loaded first, then custom definitions, so a
/// custom rule with a builtin's id replaces it. A file that fails to
/// parse is logged and skipped; it never aborts the rest of the load.
pub fn load_rules(
    builtin_dir: Option<&Path>,
    custom_dir: Option<&Path>,
) -> Result<RuleBook, ConfigError> {
    let mut book = RuleBook::new();

    if let Some(dir) = builtin_dir {
        if dir.exists() {
            load_directory(&mut book, dir, "builtin")?;
        }
    }

    if let Some(dir) = custom_dir {
        if dir.exists() {
            load_directory(&mut book, dir, "custom")?;
        }
    }

    Ok(book)
}

/// Load all TOML files from a directory into the book.
fn load_directory(book: &mut RuleBook, dir: &Path, source: &str) -> Result<(), ConfigError> {
    let entries = fs::read_dir(dir).map_err(|e| ConfigError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();

        if path.extension().is_some_and(|ext| ext == "toml") {
            match load_file(&path) {
                Ok(config) => {
                    let duplicates = book.add_config(config);
                    if !duplicates.is_empty() {
                        warn!(
                            source,
                            file = ?path.file_name(),
                            ids = ?duplicates,
                            "duplicate definition ids, later entries replaced earlier ones"
                        );
                    }
                }
                Err(e) => {
                    warn!(source, file = ?path.file_name(), error = %e, "failed to load rule file");
                }
            }
        }
    }

    Ok(())
}

/// Load a single TOML config file.
pub fn load_file(path: &Path) -> Result<RuleConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Save a config to a TOML file.
pub fn save_file(path: &Path, config: &RuleConfig) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;

    fs::write(path, contents).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Get the default custom rules directory.
pub fn default_custom_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stagehand").join("rules"))
}

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("serialize error for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::definition::{Rule, RuleAction, Trigger};
    use stagehand_types::{SimpleAction, UrlMatchKind};

    #[test]
    fn test_parse_rule_toml() {
        let toml = r#"
[[rule]]
id = "docs_tools"
name = "Docs tooling"
priority = 2

[[rule.trigger]]
type = "url"
patterns = ["*docs.rs*", "*doc.rust-lang.org*"]

[rule.target]
groups = ["dev_tools"]
extensions = ["ext_rustdoc_helper"]

[rule.action]
mode = "simple"
action = "open_only_when_matched"
reload = true
"#;

        let config: RuleConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.rules.len(), 1);

        let rule: &Rule = &config.rules[0];
        assert_eq!(rule.id, "docs_tools");
        assert!(rule.enabled);
        assert_eq!(rule.priority, 2);
        assert_eq!(rule.target.groups, vec!["dev_tools"]);
        match &rule.triggers[0] {
            Trigger::Url { patterns, match_kind } => {
                assert_eq!(patterns.len(), 2);
                assert_eq!(*match_kind, UrlMatchKind::Wildcard);
            }
            other => panic!("unexpected trigger: {other:?}"),
        }
        assert_eq!(
            rule.action,
            RuleAction::Simple {
                action: SimpleAction::OpenOnlyWhenMatched,
                reload: true
            }
        );
    }

    #[test]
    fn test_parse_group_toml() {
        let toml = r#"
[[group]]
id = "social"
name = "Social blockers"
members = ["ext_a", "ext_b"]
is_mutex = true
"#;

        let config: RuleConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.groups.len(), 1);
        assert_eq!(config.groups[0].members, vec!["ext_a", "ext_b"]);
        assert!(config.groups[0].is_mutex);
        assert!(!config.groups[0].always_on);
    }

    #[test]
    fn test_parse_custom_action_toml() {
        let toml = r#"
[[rule]]
id = "split"

[rule.action]
mode = "custom"

[rule.action.enable]
timing = "match"
scope = "any_match"

[rule.action.disable]
timing = "not_match"
scope = "all_not_match"
reload = true
"#;

        let config: RuleConfig = toml::from_str(toml).unwrap();
        match &config.rules[0].action {
            RuleAction::Custom { enable, disable } => {
                assert!(enable.is_some());
                assert!(disable.as_ref().unwrap().reload);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_custom_overrides_builtin() {
        let builtin = tempfile::tempdir().unwrap();
        let custom = tempfile::tempdir().unwrap();

        fs::write(
            builtin.path().join("rules.toml"),
            "[[rule]]\nid = \"a\"\npriority = 1\n",
        )
        .unwrap();
        fs::write(
            custom.path().join("rules.toml"),
            "[[rule]]\nid = \"a\"\npriority = 7\n",
        )
        .unwrap();

        let book = load_rules(Some(builtin.path()), Some(custom.path())).unwrap();
        assert_eq!(book.rule_count(), 1);
        assert_eq!(book.get_rule("a").unwrap().priority, 7);
    }

    #[test]
    fn test_malformed_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.toml"), "[[rule\nnot toml").unwrap();
        fs::write(dir.path().join("good.toml"), "[[rule]]\nid = \"ok\"\n").unwrap();

        let book = load_rules(Some(dir.path()), None).unwrap();
        assert_eq!(book.rule_count(), 1);
        assert!(book.get_rule("ok").is_some());
    }
}
