//! Variable reference scanning.
//!
//! A variable reference is `$name;` in running text. This core only
//! validates the placeholder; value substitution happens downstream. Text
//! that looks like a variable but has no terminating `;` is inert — `$foo`
//! alone is neither a reference nor a diagnostic.

use std::sync::LazyLock;

use mdpp_diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, SourceSpan};
use regex::Regex;

use crate::scanner::Token;

/// Anything between `$` and `;` on one line is a candidate; the name rule
/// decides validity afterwards, mirroring how authors actually mistype them.
static CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([^;\n$]*);").expect("valid regex"));

static VALID_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid regex"));

/// A validated `$name;` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRef {
    /// Name between `$` and `;`.
    pub name: String,
    /// Location of the whole reference.
    pub span: SourceSpan,
}

/// Scan the text tokens of an expanded stream for variable references.
///
/// Candidates with an invalid name yield MDPP002.
#[must_use]
pub fn scan_variables(tokens: &[Token]) -> (Vec<VariableRef>, Diagnostics) {
    let mut references = Vec::new();
    let mut diagnostics = Diagnostics::new();

    for token in tokens {
        let Token::Text { text, span } = token else {
            continue;
        };
        for captures in CANDIDATE.captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let name = &captures[1];
            let reference_span = offset_span(span, text, whole.start(), whole.end());

            if VALID_NAME.is_match(name) {
                references.push(VariableRef {
                    name: name.to_owned(),
                    span: reference_span,
                });
            } else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticCode::InvalidVariableName,
                    format!("invalid variable name: `${name};`"),
                    reference_span,
                ));
            }
        }
    }

    (references, diagnostics)
}

/// Span of a byte range within a text token, relative to the token's start.
fn offset_span(base: &SourceSpan, text: &str, start: usize, end: usize) -> SourceSpan {
    let (line, column) = advance(base, text, start);
    let (end_line, end_column) = advance(base, text, end);
    SourceSpan::new(base.file.clone(), line, column, end_line, end_column)
}

fn advance(base: &SourceSpan, text: &str, offset: usize) -> (usize, usize) {
    let prefix = &text[..offset];
    let newlines = prefix.bytes().filter(|&b| b == b'\n').count();
    if newlines == 0 {
        (base.line, base.column + offset)
    } else {
        let last_line_len = prefix.rsplit('\n').next().map_or(0, str::len);
        (base.line + newlines, last_line_len + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn scan_text(text: &str) -> (Vec<VariableRef>, Diagnostics) {
        let (tokens, scan_diagnostics) = scan(text, Path::new("doc.md"));
        assert!(scan_diagnostics.is_empty());
        scan_variables(&tokens)
    }

    #[test]
    fn test_valid_reference() {
        let (references, diagnostics) = scan_text("Version $product-version; ships today.\n");
        assert!(diagnostics.is_empty());
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].name, "product-version");
    }

    #[test]
    fn test_missing_semicolon_is_inert() {
        let (references, diagnostics) = scan_text("price is $foo and rising\n");
        assert!(references.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_name_is_diagnostic() {
        let (references, diagnostics) = scan_text("bad $two words; here\n");
        assert!(references.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.iter().next().unwrap().code,
            DiagnosticCode::InvalidVariableName
        );
    }

    #[test]
    fn test_name_starting_with_digit_is_invalid() {
        let (_, diagnostics) = scan_text("$2nd-try;\n");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_multiple_references_on_one_line() {
        let (references, _) = scan_text("$a; and $b;\n");
        let names: Vec<&str> = references.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_span_tracks_line_within_token() {
        let (references, _) = scan_text("first line\nsee $var; here\n");
        assert_eq!(references[0].span.line, 2);
        assert_eq!(references[0].span.column, 5);
    }
}
