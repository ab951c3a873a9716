//! Constructor-argument injection.
//!
//! Two strategies share one insertion text, `<field>: <value>, \n`, placed
//! immediately before the anchor key:
//!
//! - [`BalancedInjection`] finds each call's real closing parenthesis with
//!   [`CallScanner`] and looks at keys on the call's own argument depth.
//! - [`SpanInjection`] is the regex heuristic. Its narrow form stops at the
//!   next `)` on the same line; its wide form stops at the first `)` anywhere.

use regex::{Captures, Regex};
use std::borrow::Cow;

use super::calls::CallScanner;
use super::RewriteError;

fn insertion_text(field: &str, value: &str) -> String {
    format!("{field}: {value}, \n")
}

/// Single-pass injection anchored on balanced call boundaries.
#[derive(Debug, Clone)]
pub struct BalancedInjection {
    constructor: String,
    anchor: String,
    field: String,
    insertion: String,
}

impl BalancedInjection {
    pub fn new(constructor: &str, anchor: &str, field: &str, value: &str) -> Self {
        Self {
            constructor: constructor.to_string(),
            anchor: anchor.to_string(),
            field: field.to_string(),
            insertion: insertion_text(field, value),
        }
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let scanner = CallScanner::new(&self.constructor, &self.anchor, &self.field);
        let mut points: Vec<usize> = scanner
            .scan(text)
            .iter()
            .filter_map(|site| site.insertion_point())
            .collect();

        if points.is_empty() {
            return Cow::Borrowed(text);
        }

        // Sites arrive in closing order; nested calls close first.
        points.sort_unstable();

        let mut out = String::with_capacity(text.len() + points.len() * self.insertion.len());
        let mut last = 0;
        for point in points {
            out.push_str(&text[last..point]);
            out.push_str(&self.insertion);
            last = point;
        }
        out.push_str(&text[last..]);
        Cow::Owned(out)
    }
}

/// Which regex span a [`SpanInjection`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanWidth {
    /// `Ctor\s*\(` then anything except `)` or newline, then `)`.
    Narrow,
    /// `Ctor\s*\(` then lazily anything, newlines included, up to the first `)`.
    Wide,
}

/// Regex-delimited injection.
#[derive(Debug, Clone)]
pub struct SpanInjection {
    width: SpanWidth,
    pattern: Regex,
    anchor_key: String,
    field_key: String,
    replacement: String,
}

impl SpanInjection {
    pub fn new(
        width: SpanWidth,
        constructor: &str,
        anchor: &str,
        field: &str,
        value: &str,
    ) -> Result<Self, RewriteError> {
        let ctor = regex::escape(constructor);
        let source = match width {
            SpanWidth::Narrow => format!(r"{ctor}\s*\([^)\n]*\)"),
            SpanWidth::Wide => format!(r"(?s){ctor}\s*\(.*?\)"),
        };
        let anchor_key = format!("{anchor}:");
        Ok(Self {
            width,
            pattern: Regex::new(&source)?,
            replacement: format!("{}{anchor_key}", insertion_text(field, value)),
            field_key: format!("{field}:"),
            anchor_key,
        })
    }

    pub fn width(&self) -> SpanWidth {
        self.width
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, |caps: &Captures<'_>| {
            let span = caps.get(0).map_or("", |m| m.as_str());
            if span.contains(&self.field_key) || !span.contains(&self.anchor_key) {
                span.to_string()
            } else {
                span.replace(&self.anchor_key, &self.replacement)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced() -> BalancedInjection {
        BalancedInjection::new("Reminder", "patientId", "caregiverId", "''")
    }

    fn span(width: SpanWidth) -> SpanInjection {
        SpanInjection::new(width, "Reminder", "patientId", "caregiverId", "''").unwrap()
    }

    #[test]
    fn test_balanced_single_line() {
        assert_eq!(
            balanced().apply("Reminder(patientId: 'p1')"),
            "Reminder(caregiverId: '', \npatientId: 'p1')"
        );
    }

    #[test]
    fn test_balanced_already_present() {
        let text = "Reminder(caregiverId: 'c1', patientId: 'p1')";
        assert!(matches!(balanced().apply(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_balanced_multi_line_with_nested_call() {
        let text = "Reminder(\n  at: now(),\n  patientId: 'p1',\n)";
        assert_eq!(
            balanced().apply(text),
            "Reminder(\n  at: now(),\n  caregiverId: '', \npatientId: 'p1',\n)"
        );
    }

    #[test]
    fn test_balanced_nested_reminders_both_fixed() {
        let text = "Reminder(patientId: a, next: Reminder(patientId: b))";
        assert_eq!(
            balanced().apply(text),
            "Reminder(caregiverId: '', \npatientId: a, next: Reminder(caregiverId: '', \npatientId: b))"
        );
    }

    #[test]
    fn test_balanced_is_stable() {
        let once = balanced()
            .apply("Reminder(\n  patientId: 'p1',\n)")
            .into_owned();
        assert!(matches!(balanced().apply(&once), Cow::Borrowed(_)));
    }

    #[test]
    fn test_narrow_single_line() {
        assert_eq!(
            span(SpanWidth::Narrow).apply("Reminder(patientId: 'p1')"),
            "Reminder(caregiverId: '', \npatientId: 'p1')"
        );
    }

    #[test]
    fn test_narrow_inserts_before_every_anchor() {
        assert_eq!(
            span(SpanWidth::Narrow).apply("Reminder(patientId: a, patientId: b)"),
            "Reminder(caregiverId: '', \npatientId: a, caregiverId: '', \npatientId: b)"
        );
    }

    #[test]
    fn test_narrow_skips_multi_line() {
        let text = "Reminder(\n  patientId: 'p1',\n)";
        assert_eq!(span(SpanWidth::Narrow).apply(text), text);
    }

    #[test]
    fn test_wide_multi_line() {
        assert_eq!(
            span(SpanWidth::Wide).apply("Reminder(\n  patientId: 'p1',\n)"),
            "Reminder(\n  caregiverId: '', \npatientId: 'p1',\n)"
        );
    }

    #[test]
    fn test_wide_stops_at_first_paren() {
        // The nested `)` ends the span before the anchor is reached.
        let text = "Reminder(\n  at: now(),\n  patientId: 'p1',\n)";
        assert_eq!(span(SpanWidth::Wide).apply(text), text);
    }

    #[test]
    fn test_span_already_present() {
        let text = "Reminder(caregiverId: 'c1', patientId: 'p1')";
        assert_eq!(span(SpanWidth::Narrow).apply(text), text);
        assert_eq!(span(SpanWidth::Wide).apply(text), text);
    }

    #[test]
    fn test_span_has_no_boundary_before_constructor() {
        assert_eq!(
            span(SpanWidth::Narrow).apply("SnoozedReminder(patientId: p)"),
            "SnoozedReminder(caregiverId: '', \npatientId: p)"
        );
    }
}
