use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_EXTENSION: &str = ".dart";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RuleSet {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl RuleSet {
    /// The `remindAt` → `reminderTime` migration with `caregiverId` injection
    /// into `Reminder(...)` calls.
    pub fn builtin() -> Self {
        Self {
            meta: Metadata {
                name: "reminder-time-migration".to_string(),
                description: Some(
                    "Rename remindAt to reminderTime and add caregiverId to Reminder calls"
                        .to_string(),
                ),
                ..Metadata::default()
            },
            rules: vec![
                RuleDefinition::RenameField {
                    from: "remindAt".to_string(),
                    to: "reminderTime".to_string(),
                },
                RuleDefinition::InjectArgument {
                    constructor: "Reminder".to_string(),
                    anchor: "patientId".to_string(),
                    field: "caregiverId".to_string(),
                    value: default_value(),
                },
            ],
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        if self.meta.extension.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                rule: None,
                field: "meta.extension",
            });
        }

        for (idx, rule) in self.rules.iter().enumerate() {
            match rule {
                RuleDefinition::RenameField { from, to } => {
                    check_identifier(&mut issues, idx, "from", from);
                    check_identifier(&mut issues, idx, "to", to);
                    if !from.is_empty() && from == to {
                        issues.push(ValidationIssue::InvalidCombo {
                            rule: Some(idx),
                            message: format!("rename-field maps '{from}' onto itself"),
                        });
                    }
                }
                RuleDefinition::InjectArgument {
                    constructor,
                    anchor,
                    field,
                    value,
                } => {
                    check_identifier(&mut issues, idx, "constructor", constructor);
                    check_identifier(&mut issues, idx, "anchor", anchor);
                    check_identifier(&mut issues, idx, "field", field);
                    if value.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            rule: Some(idx),
                            field: "value",
                        });
                    }
                    if !anchor.is_empty() && anchor == field {
                        issues.push(ValidationIssue::InvalidCombo {
                            rule: Some(idx),
                            message: "anchor and field must differ".to_string(),
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

fn check_identifier(
    issues: &mut Vec<ValidationIssue>,
    idx: usize,
    field: &'static str,
    value: &str,
) {
    if value.trim().is_empty() {
        issues.push(ValidationIssue::MissingField {
            rule: Some(idx),
            field,
        });
    } else if !is_identifier(value) {
        issues.push(ValidationIssue::NotAnIdentifier {
            rule: idx,
            field,
            value: value.to_string(),
        });
    }
}

/// ASCII identifier as accepted by the call scanner: `[A-Za-z_$][A-Za-z0-9_$]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' || b == b'$' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Directory to rewrite. Relative paths resolve against the current directory.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// File name suffix selecting the files to rewrite.
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub scan: ScanMode,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            root: None,
            extension: default_extension(),
            scan: ScanMode::default(),
        }
    }
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn default_value() -> String {
    "''".to_string()
}

/// How constructor calls are delimited for argument injection.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// One pass with a bracket-balancing scanner that skips strings and comments.
    #[default]
    Balanced,
    /// Two regex passes: single-line up to the next `)`, then multi-line up to
    /// the first `)`.
    Heuristic,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Balanced => write!(f, "balanced"),
            ScanMode::Heuristic => write!(f, "heuristic"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleDefinition {
    /// Rename every whole-word use of a field, both bare and as a `key:`.
    RenameField { from: String, to: String },
    /// Add `field: value` to constructor calls that pass `anchor:` but not `field:`.
    InjectArgument {
        constructor: String,
        anchor: String,
        field: String,
        #[serde(default = "default_value")]
        value: String,
    },
}

impl fmt::Display for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleDefinition::RenameField { from, to } => write!(f, "rename {from} -> {to}"),
            RuleDefinition::InjectArgument {
                constructor,
                anchor,
                field,
                value,
            } => write!(
                f,
                "inject {field}: {value} into {constructor}(...) before {anchor}:"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyRuleList,
    MissingField {
        rule: Option<usize>,
        field: &'static str,
    },
    NotAnIdentifier {
        rule: usize,
        field: &'static str,
        value: String,
    },
    InvalidCombo {
        rule: Option<usize>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "rule set contains no rules"),
            ValidationIssue::MissingField { rule, field } => match rule {
                Some(idx) => write!(f, "rule #{} missing required field '{field}'", idx + 1),
                None => write!(f, "rule set missing required field '{field}'"),
            },
            ValidationIssue::NotAnIdentifier { rule, field, value } => write!(
                f,
                "rule #{} field '{field}' is not an identifier: {value:?}",
                rule + 1
            ),
            ValidationIssue::InvalidCombo { rule, message } => match rule {
                Some(idx) => write!(f, "rule #{} has invalid configuration: {message}", idx + 1),
                None => write!(f, "invalid rule configuration: {message}"),
            },
        }
    }
}
