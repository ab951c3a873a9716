//! Content rewriting: an ordered list of text passes compiled from a rule set.
//!
//! Each [`RuleDefinition`] expands into one or more [`Pass`]es:
//!
//! - `rename-field` → bare rename, then keyed rename
//! - `inject-argument` → one balanced pass, or narrow then wide regex passes
//!   in [`ScanMode::Heuristic`]
//!
//! Passes run in order, each on the previous pass's output.

pub mod calls;
pub mod inject;
pub mod rename;

use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

use crate::config::{RuleDefinition, RuleSet, ScanMode};
pub use calls::{CallScanner, CallSite};
pub use inject::{BalancedInjection, SpanInjection, SpanWidth};
pub use rename::{BareRename, KeyedRename};

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("Failed to compile rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One full-text transformation.
#[derive(Debug, Clone)]
pub enum Pass {
    BareRename(BareRename),
    KeyedRename(KeyedRename),
    Balanced(BalancedInjection),
    Span(SpanInjection),
}

impl Pass {
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match self {
            Pass::BareRename(pass) => pass.apply(text),
            Pass::KeyedRename(pass) => pass.apply(text),
            Pass::Balanced(pass) => pass.apply(text),
            Pass::Span(pass) => pass.apply(text),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Pass::BareRename(_) => "bare-rename",
            Pass::KeyedRename(_) => "keyed-rename",
            Pass::Balanced(_) => "balanced-inject",
            Pass::Span(pass) => match pass.width() {
                SpanWidth::Narrow => "narrow-inject",
                SpanWidth::Wide => "wide-inject",
            },
        }
    }
}

/// A pass together with the rule it came from.
#[derive(Debug, Clone)]
pub struct CompiledPass {
    pub rule: usize,
    pub pass: Pass,
}

impl fmt::Display for CompiledPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule #{} {}", self.rule + 1, self.pass.kind())
    }
}

/// Output of [`Rewriter::rewrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite<'t> {
    pub text: Cow<'t, str>,
    /// Passes that changed the text, by display name.
    pub changed_by: Vec<String>,
}

impl Rewrite<'_> {
    pub fn is_changed(&self) -> bool {
        matches!(self.text, Cow::Owned(_))
    }
}

#[derive(Debug, Clone)]
pub struct Rewriter {
    passes: Vec<CompiledPass>,
}

impl Rewriter {
    /// Compile `rules` using the scan mode recorded in its metadata.
    pub fn new(rules: &RuleSet) -> Result<Self, RewriteError> {
        Self::with_scan(rules, rules.meta.scan)
    }

    pub fn with_scan(rules: &RuleSet, scan: ScanMode) -> Result<Self, RewriteError> {
        let mut passes = Vec::new();

        for (rule, definition) in rules.rules.iter().enumerate() {
            match definition {
                RuleDefinition::RenameField { from, to } => {
                    passes.push(CompiledPass {
                        rule,
                        pass: Pass::BareRename(BareRename::new(from, to)?),
                    });
                    passes.push(CompiledPass {
                        rule,
                        pass: Pass::KeyedRename(KeyedRename::new(from, to)?),
                    });
                }
                RuleDefinition::InjectArgument {
                    constructor,
                    anchor,
                    field,
                    value,
                } => match scan {
                    ScanMode::Balanced => passes.push(CompiledPass {
                        rule,
                        pass: Pass::Balanced(BalancedInjection::new(
                            constructor,
                            anchor,
                            field,
                            value,
                        )),
                    }),
                    ScanMode::Heuristic => {
                        for width in [SpanWidth::Narrow, SpanWidth::Wide] {
                            passes.push(CompiledPass {
                                rule,
                                pass: Pass::Span(SpanInjection::new(
                                    width,
                                    constructor,
                                    anchor,
                                    field,
                                    value,
                                )?),
                            });
                        }
                    }
                },
            }
        }

        Ok(Self { passes })
    }

    pub fn passes(&self) -> &[CompiledPass] {
        &self.passes
    }

    /// Run every pass in order over `text`.
    ///
    /// The result borrows `text` when no pass changed anything.
    pub fn rewrite<'t>(&self, text: &'t str) -> Rewrite<'t> {
        let mut current: Cow<'t, str> = Cow::Borrowed(text);
        let mut changed_by = Vec::new();

        for compiled in &self.passes {
            let next = match compiled.pass.apply(&current) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(next) => next,
            };
            if next == *current {
                continue;
            }
            tracing::trace!(pass = %compiled, "pass changed text");
            changed_by.push(compiled.to_string());
            current = Cow::Owned(next);
        }

        // A sequence of passes can restore the original text.
        if let Cow::Owned(ref owned) = current {
            if owned == text {
                current = Cow::Borrowed(text);
            }
        }

        Rewrite {
            text: current,
            changed_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSet;

    fn builtin(scan: ScanMode) -> Rewriter {
        Rewriter::with_scan(&RuleSet::builtin(), scan).unwrap()
    }

    #[test]
    fn test_pass_order_balanced() {
        let names: Vec<String> = builtin(ScanMode::Balanced)
            .passes()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            names,
            vec![
                "rule #1 bare-rename",
                "rule #1 keyed-rename",
                "rule #2 balanced-inject"
            ]
        );
    }

    #[test]
    fn test_pass_order_heuristic() {
        let names: Vec<String> = builtin(ScanMode::Heuristic)
            .passes()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            names,
            vec![
                "rule #1 bare-rename",
                "rule #1 keyed-rename",
                "rule #2 narrow-inject",
                "rule #2 wide-inject"
            ]
        );
    }

    #[test]
    fn test_untouched_text_is_borrowed() {
        let rewrite = builtin(ScanMode::Balanced).rewrite("class Task { String title; }");
        assert!(!rewrite.is_changed());
        assert!(rewrite.changed_by.is_empty());
    }

    #[test]
    fn test_full_rewrite_both_modes() {
        let input = "final r = Reminder(remindAt: t, patientId: 'p1');\nprint(r.remindAt);\n";
        let expected = "final r = Reminder(reminderTime: t, caregiverId: '', \npatientId: 'p1');\nprint(r.reminderTime);\n";

        for scan in [ScanMode::Balanced, ScanMode::Heuristic] {
            let rewrite = builtin(scan).rewrite(input);
            assert!(rewrite.is_changed());
            assert_eq!(rewrite.text, expected, "scan mode {scan}");
        }
    }

    #[test]
    fn test_changed_by_lists_only_effective_passes() {
        let rewrite = builtin(ScanMode::Balanced).rewrite("x.remindAt");
        assert_eq!(rewrite.changed_by, vec!["rule #1 bare-rename"]);
    }

    #[test]
    fn test_second_run_is_fixed_point() {
        let rewriter = builtin(ScanMode::Balanced);
        let input = "Reminder(\n  remindAt: t,\n  patientId: id(x),\n)";
        let first = rewriter.rewrite(input).text.into_owned();
        assert!(!rewriter.rewrite(&first).is_changed());
    }

    #[test]
    fn test_heuristic_multi_line_goes_through_wide_pass() {
        let rewrite = builtin(ScanMode::Heuristic).rewrite("Reminder(\n  patientId: 'p1',\n)");
        assert_eq!(rewrite.text, "Reminder(\n  caregiverId: '', \npatientId: 'p1',\n)");
        assert_eq!(rewrite.changed_by, vec!["rule #2 wide-inject"]);
    }
}
