//! Whole-word field renames.
//!
//! A rename runs as two passes over the same text: bare uses first, then
//! `key:` uses. The `regex` crate has no look-ahead, so the bare pass
//! inspects the byte after each match itself.

use regex::{Captures, Regex};
use std::borrow::Cow;

use super::RewriteError;

/// Renames `from` wherever it is not immediately followed by `:`.
#[derive(Debug, Clone)]
pub struct BareRename {
    pattern: Regex,
    from: String,
    to: String,
}

impl BareRename {
    pub fn new(from: &str, to: &str) -> Result<Self, RewriteError> {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(from)))?;
        Ok(Self {
            pattern,
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, |caps: &Captures<'_>| {
            let end = caps.get(0).map_or(0, |m| m.end());
            if text[end..].starts_with(':') {
                self.from.clone()
            } else {
                self.to.clone()
            }
        })
    }
}

/// Renames `from` followed by optional whitespace and `:` to `to:`.
#[derive(Debug, Clone)]
pub struct KeyedRename {
    pattern: Regex,
    replacement: String,
}

impl KeyedRename {
    pub fn new(from: &str, to: &str) -> Result<Self, RewriteError> {
        let pattern = Regex::new(&format!(r"\b{}\s*:", regex::escape(from)))?;
        Ok(Self {
            pattern,
            replacement: format!("{to}:"),
        })
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern
            .replace_all(text, regex::NoExpand(&self.replacement))
    }
}
