//! Per-kind directive parsing.
//!
//! Each parser consumes one raw clause (the text between `<!--` and `-->`,
//! or one `;`-separated part of it) and yields directives or a diagnostic.
//! A malformed directive never aborts the pass: it produces exactly one
//! diagnostic and is dropped from the expanded stream.

use std::path::Path;

use mdpp_diagnostics::{Diagnostic, DiagnosticCode, SourceSpan};

use crate::condition::ConditionExpr;

use super::Directive;

/// Result of parsing one clause.
#[derive(Debug)]
pub(crate) enum ParseOutcome {
    /// One or more directives (`markers:{...}` yields one per pair).
    Directives(Vec<Directive>),
    /// The clause does not start with a known directive prefix.
    NotADirective,
    /// Known prefix but malformed body; the directive is dropped.
    Invalid(Diagnostic),
}

/// Parse one clause into directives.
pub(crate) fn parse_clause(clause: &str, span: &SourceSpan) -> ParseOutcome {
    let trimmed = clause.trim();

    if let Some(rest) = trimmed.strip_prefix("style:") {
        return parse_style(rest, span);
    }
    if let Some(rest) = trimmed.strip_prefix("markers:") {
        return parse_markers_object(rest, span);
    }
    if let Some(rest) = trimmed.strip_prefix("marker:") {
        return parse_marker(rest, span);
    }
    if let Some(rest) = trimmed.strip_prefix("condition:") {
        return parse_condition(rest, span);
    }
    if let Some(rest) = trimmed.strip_prefix("include:") {
        return parse_include(rest, span);
    }
    if trimmed == "multiline" {
        return ParseOutcome::Directives(vec![Directive::Multiline]);
    }
    if trimmed == "/condition" {
        return ParseOutcome::Directives(vec![Directive::ConditionClose]);
    }
    if let Some(name) = alias_name(trimmed) {
        return ParseOutcome::Directives(vec![Directive::Alias { name }]);
    }

    ParseOutcome::NotADirective
}

/// Extract an alias name from a `#name` clause.
///
/// The name ends at the first character outside `[A-Za-z0-9_-]`; a `#` with
/// no valid name characters is not an alias directive.
fn alias_name(clause: &str) -> Option<String> {
    let rest = clause.trim().strip_prefix('#')?;
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(rest[..end].to_owned())
}

fn parse_style(rest: &str, span: &SourceSpan) -> ParseOutcome {
    let name = rest.trim();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return ParseOutcome::Invalid(Diagnostic::new(
            DiagnosticCode::InvalidStylePlacement,
            format!("invalid style name: `{name}`"),
            span.clone(),
        ));
    }
    ParseOutcome::Directives(vec![Directive::Style {
        name: name.to_owned(),
    }])
}

/// Parse `Key="Value"`. The value must be double-quoted.
fn parse_marker(rest: &str, span: &SourceSpan) -> ParseOutcome {
    let malformed = |why: &str| {
        ParseOutcome::Invalid(Diagnostic::new(
            DiagnosticCode::MalformedMarker,
            format!("malformed marker value: {why}"),
            span.clone(),
        ))
    };

    let Some(eq) = rest.find('=') else {
        return malformed("expected `Key=\"Value\"`");
    };
    let key = rest[..eq].trim();
    if key.is_empty() {
        return malformed("empty marker key");
    }

    let value = rest[eq + 1..].trim();
    let Some(inner) = value.strip_prefix('"') else {
        return malformed("value must be double-quoted");
    };
    let Some(inner) = inner.strip_suffix('"') else {
        return malformed("unterminated quoted value");
    };
    if inner.contains('"') {
        return malformed("unescaped quote in value");
    }

    ParseOutcome::Directives(vec![Directive::Marker {
        key: key.to_owned(),
        value: inner.to_owned(),
    }])
}

/// Parse `markers:{...}` as a JSON object of string-to-string pairs.
fn parse_markers_object(rest: &str, span: &SourceSpan) -> ParseOutcome {
    let malformed = |why: String| {
        ParseOutcome::Invalid(Diagnostic::new(
            DiagnosticCode::MalformedMarker,
            format!("malformed marker JSON: {why}"),
            span.clone(),
        ))
    };

    let object: serde_json::Map<String, serde_json::Value> =
        match serde_json::from_str(rest.trim()) {
            Ok(object) => object,
            Err(err) => return malformed(err.to_string()),
        };

    let mut directives = Vec::with_capacity(object.len());
    for (key, value) in object {
        match value {
            serde_json::Value::String(value) => {
                directives.push(Directive::Marker { key, value });
            }
            other => {
                return malformed(format!("value for `{key}` must be a string, got {other}"));
            }
        }
    }

    if directives.is_empty() {
        return malformed("empty marker object".to_owned());
    }
    ParseOutcome::Directives(directives)
}

fn parse_condition(rest: &str, span: &SourceSpan) -> ParseOutcome {
    match ConditionExpr::parse(rest) {
        Ok(expr) => ParseOutcome::Directives(vec![Directive::ConditionOpen { expr }]),
        Err(err) => ParseOutcome::Invalid(Diagnostic::new(
            DiagnosticCode::InvalidConditionSyntax,
            format!("invalid condition syntax: {err}"),
            span.clone(),
        )),
    }
}

/// Parse `include:path`. The path must be non-empty and relative; the
/// project-root check happens at resolution time.
fn parse_include(rest: &str, span: &SourceSpan) -> ParseOutcome {
    let path = rest.trim();
    if path.is_empty() {
        return ParseOutcome::Invalid(Diagnostic::new(
            DiagnosticCode::IncludeOutsideRoot,
            "include path is empty",
            span.clone(),
        ));
    }
    if Path::new(path).is_absolute() {
        return ParseOutcome::Invalid(Diagnostic::new(
            DiagnosticCode::IncludeOutsideRoot,
            format!("include path must be relative: `{path}`"),
            span.clone(),
        ));
    }
    ParseOutcome::Directives(vec![Directive::Include {
        path: path.to_owned(),
    }])
}
