use crate::config::schema::{RuleSet, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the current directory when no rule file is given.
pub const DEFAULT_RULES_FILE: &str = "reminder-fixer.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read rule file {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse rule file TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse rule file TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid rule file ({}): {}", path.display(), source),
                None => write!(f, "invalid rule file: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<RuleSet, ConfigError> {
    let rules: RuleSet = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    rules
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(rules)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleSet, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Load the rule set to run.
///
/// An explicit path must load. Otherwise `reminder-fixer.toml` in `dir` is
/// used when present, and the built-in rule set when not.
pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<RuleSet, ConfigError> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }

    let candidate = dir.join(DEFAULT_RULES_FILE);
    if candidate.is_file() {
        tracing::debug!(path = %candidate.display(), "using discovered rule file");
        return load_from_path(&candidate);
    }

    tracing::debug!("no rule file found, using built-in rule set");
    Ok(RuleSet::builtin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RuleDefinition, ScanMode};

    #[test]
    fn test_load_minimal() {
        let rules = load_from_str(
            r#"
[[rules]]
type = "rename-field"
from = "oldName"
to = "newName"
"#,
        )
        .unwrap();

        assert_eq!(rules.meta.extension, ".dart");
        assert_eq!(rules.meta.scan, ScanMode::Balanced);
        assert_eq!(
            rules.rules,
            vec![RuleDefinition::RenameField {
                from: "oldName".to_string(),
                to: "newName".to_string(),
            }]
        );
    }

    #[test]
    fn test_inject_value_defaults_to_empty_string_literal() {
        let rules = load_from_str(
            r#"
[meta]
scan = "heuristic"
extension = ".kt"

[[rules]]
type = "inject-argument"
constructor = "Visit"
anchor = "patientId"
field = "caregiverId"
"#,
        )
        .unwrap();

        assert_eq!(rules.meta.scan, ScanMode::Heuristic);
        assert_eq!(rules.meta.extension, ".kt");
        match &rules.rules[0] {
            RuleDefinition::InjectArgument { value, .. } => assert_eq!(value, "''"),
            other => panic!("unexpected rule: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_rule_type_is_toml_error() {
        let err = load_from_str(
            r#"
[[rules]]
type = "delete-everything"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: None, .. }));
    }

    #[test]
    fn test_path_attached_to_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        fs::write(&path, "[meta]\nname = \"nothing\"\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        match &err {
            ConfigError::Validation { path: Some(p), .. } => assert_eq!(p, &path),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("rule set contains no rules"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_path(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_discover_prefers_local_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(discover(None, dir.path()).unwrap(), RuleSet::builtin());

        fs::write(
            dir.path().join(DEFAULT_RULES_FILE),
            r#"
[[rules]]
type = "rename-field"
from = "a"
to = "b"
"#,
        )
        .unwrap();
        let rules = discover(None, dir.path()).unwrap();
        assert_eq!(rules.rules.len(), 1);
    }
}
