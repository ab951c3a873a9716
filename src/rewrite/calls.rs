//! Bracket-balancing scanner for constructor calls.
//!
//! The scanner walks source text byte by byte, skipping comments and string
//! literals (including `${...}` interpolations), and tracks `()`, `[]` and
//! `{}` nesting. For every call to the target constructor it records which
//! named keys appear at the call's own argument depth.
//!
//! Only ASCII bytes are structural, so multi-byte UTF-8 sequences pass
//! through untouched and every recorded offset is a char boundary.

/// A constructor call whose argument list was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Offset of the first byte of the constructor name.
    pub start: usize,
    /// Offset one past the closing `)`.
    pub end: usize,
    /// Offset of the first `anchor:` key at argument depth.
    pub anchor: Option<usize>,
    /// Whether a `field:` key appears at argument depth.
    pub has_field: bool,
}

impl CallSite {
    /// Offset to insert the missing field at, if this call needs it.
    pub fn insertion_point(&self) -> Option<usize> {
        if self.has_field {
            None
        } else {
            self.anchor
        }
    }
}

#[derive(Debug)]
struct Frame {
    call_start: Option<usize>,
    anchor: Option<usize>,
    has_field: bool,
}

impl Frame {
    fn plain() -> Self {
        Self {
            call_start: None,
            anchor: None,
            has_field: false,
        }
    }
}

/// Finds calls to `constructor` and records `anchor:`/`field:` keys inside them.
#[derive(Debug, Clone)]
pub struct CallScanner<'a> {
    constructor: &'a str,
    anchor: &'a str,
    field: &'a str,
}

impl<'a> CallScanner<'a> {
    pub fn new(constructor: &'a str, anchor: &'a str, field: &'a str) -> Self {
        Self {
            constructor,
            anchor,
            field,
        }
    }

    /// Scan `text` and return every closed call site in order of their
    /// closing parenthesis.
    pub fn scan(&self, text: &str) -> Vec<CallSite> {
        let bytes = text.as_bytes();
        let mut stack: Vec<Frame> = Vec::new();
        let mut sites = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            match b {
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    i = skip_line_comment(bytes, i);
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = skip_block_comment(bytes, i);
                }
                b'\'' | b'"' => {
                    i = skip_string(bytes, i, false);
                }
                b'(' | b'[' | b'{' => {
                    stack.push(Frame::plain());
                    i += 1;
                }
                b')' | b']' | b'}' => {
                    if let Some(frame) = stack.pop() {
                        if let (b')', Some(start)) = (b, frame.call_start) {
                            sites.push(CallSite {
                                start,
                                end: i + 1,
                                anchor: frame.anchor,
                                has_field: frame.has_field,
                            });
                        }
                    }
                    i += 1;
                }
                _ if is_ident_start(b) => {
                    let end = ident_end(bytes, i);
                    let ident = &text[i..end];

                    if ident == "r" && matches!(bytes.get(end), Some(b'\'' | b'"')) {
                        i = skip_string(bytes, end, true);
                        continue;
                    }

                    if ident == self.constructor {
                        let after = skip_whitespace(bytes, end);
                        if bytes.get(after) == Some(&b'(') {
                            stack.push(Frame {
                                call_start: Some(i),
                                ..Frame::plain()
                            });
                            i = after + 1;
                            continue;
                        }
                    }

                    if bytes.get(end) == Some(&b':') {
                        if let Some(frame) = stack.last_mut().filter(|f| f.call_start.is_some()) {
                            if ident == self.anchor && frame.anchor.is_none() {
                                frame.anchor = Some(i);
                            } else if ident == self.field {
                                frame.has_field = true;
                            }
                        }
                    }

                    i = end;
                }
                _ if b.is_ascii_digit() => {
                    // Keeps `1e5` and `0xFF` from starting an identifier.
                    i = ident_end(bytes, i);
                }
                _ => i += 1,
            }
        }

        sites
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn ident_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && is_ident_continue(bytes[i]) {
        i += 1;
    }
    i
}

fn skip_whitespace(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    let mut depth = 1usize;
    while i < bytes.len() {
        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return i;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

/// Skip the string literal opening at `start`, returning the offset after it.
///
/// Single-quoted and double-quoted strings end at an unescaped matching quote
/// or at a newline when unterminated. Triple-quoted strings may span lines.
fn skip_string(bytes: &[u8], start: usize, raw: bool) -> usize {
    let quote = bytes[start];
    let triple = bytes.get(start + 1) == Some(&quote) && bytes.get(start + 2) == Some(&quote);
    let mut i = if triple { start + 3 } else { start + 1 };

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && !raw {
            i += 2;
            continue;
        }
        if b == b'$' && !raw && bytes.get(i + 1) == Some(&b'{') {
            i = skip_interpolation(bytes, i + 2);
            continue;
        }
        if b == quote {
            if !triple {
                return i + 1;
            }
            if bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote) {
                return i + 3;
            }
        }
        if b == b'\n' && !triple {
            return i;
        }
        i += 1;
    }

    bytes.len()
}

/// Skip a `${ ... }` body starting just after the `{`.
fn skip_interpolation(bytes: &[u8], start: usize) -> usize {
    let mut depth = 1usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                i = skip_string(bytes, i, false);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> Vec<CallSite> {
        CallScanner::new("Reminder", "patientId", "caregiverId").scan(text)
    }

    #[test]
    fn test_single_line_call() {
        let text = "Reminder(patientId: 'p1')";
        let sites = scan(text);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].start, 0);
        assert_eq!(sites[0].end, text.len());
        assert_eq!(sites[0].anchor, Some(9));
        assert!(!sites[0].has_field);
        assert_eq!(sites[0].insertion_point(), Some(9));
    }

    #[test]
    fn test_field_present_blocks_insertion() {
        let sites = scan("Reminder(caregiverId: 'c1', patientId: 'p1')");
        assert!(sites[0].has_field);
        assert_eq!(sites[0].insertion_point(), None);
    }

    #[test]
    fn test_nested_parens_do_not_end_call() {
        let text = "Reminder(\n  time: DateTime.now().add(d),\n  patientId: id(),\n)";
        let sites = scan(text);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].end, text.len());
        assert_eq!(sites[0].anchor, text.find("patientId"));
    }

    #[test]
    fn test_keys_in_nested_arguments_are_ignored() {
        let sites = scan("Reminder(meta: {patientId: 1}, other: Visit(caregiverId: 2))");
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].anchor, None);
        assert!(!sites[0].has_field);
    }

    #[test]
    fn test_strings_and_comments_are_opaque() {
        let text = "Reminder(title: 'patientId: )', // patientId: )\n /* ) */ note: \"(\")";
        let sites = scan(text);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].anchor, None);
        assert_eq!(sites[0].end, text.len());
    }

    #[test]
    fn test_interpolation_with_nested_quotes() {
        let text = "Reminder(title: '${map['k']})', patientId: p)";
        let sites = scan(text);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].anchor, text.find("patientId"));
    }

    #[test]
    fn test_raw_and_triple_quoted_strings() {
        let text = "Reminder(a: r'\\', b: '''\n)\n''', patientId: p)";
        let sites = scan(text);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].anchor, text.find("patientId"));
    }

    #[test]
    fn test_constructor_name_needs_identifier_boundary() {
        assert!(scan("SnoozedReminder(patientId: p)").is_empty());
        assert!(scan("Reminders(patientId: p)").is_empty());
        assert_eq!(scan("new Reminder (patientId: p)").len(), 1);
    }

    #[test]
    fn test_nested_constructor_calls_reported_separately() {
        let text = "Reminder(patientId: a, next: Reminder(patientId: b))";
        let sites = scan(text);
        assert_eq!(sites.len(), 2);
        // Inner call closes first.
        assert_eq!(sites[0].anchor, text.rfind("patientId"));
        assert_eq!(sites[1].anchor, text.find("patientId"));
    }

    #[test]
    fn test_unclosed_call_is_not_reported() {
        assert!(scan("Reminder(patientId: p,").is_empty());
    }

    #[test]
    fn test_only_first_anchor_recorded() {
        let text = "Reminder(patientId: a, patientId: b)";
        assert_eq!(scan(text)[0].anchor, Some(9));
    }

    #[test]
    fn test_non_ascii_text() {
        let text = "// café\nReminder(title: 'héllo', patientId: p)";
        let sites = scan(text);
        assert_eq!(sites[0].anchor, text.find("patientId"));
    }
}
