//! Diagnostic types and source spans for the Markdown++ preprocessor.
//!
//! Every finding produced by the preprocessor is a [`Diagnostic`]: a stable
//! [`DiagnosticCode`], a [`Severity`], a human-readable message, and the
//! [`SourceSpan`] it refers to. External tooling matches on the code, so code
//! numbering and trigger conditions are stable across versions; only message
//! wording may evolve.
//!
//! The [`Diagnostics`] collection aggregates findings across a whole document
//! pass and ranks them for reporting (errors before warnings, then by source
//! location).

mod span;

pub use span::SourceSpan;

use std::fmt;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    /// Recoverable finding; processing continues with a best-effort fallback.
    Warning,
    /// The offending directive is dropped; processing continues.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Stable diagnostic codes.
///
/// MDPP000–MDPP008 mirror the historical validator; MDPP009–MDPP011 cover
/// findings the original reported without a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticCode {
    /// MDPP000: file not found or not readable.
    #[cfg_attr(feature = "serde", serde(rename = "MDPP000"))]
    FileError,
    /// MDPP001: unclosed condition block, or a close with no matching open.
    #[cfg_attr(feature = "serde", serde(rename = "MDPP001"))]
    UnclosedCondition,
    /// MDPP002: invalid variable name in a `$name;` reference.
    #[cfg_attr(feature = "serde", serde(rename = "MDPP002"))]
    InvalidVariableName,
    /// MDPP003: malformed marker value or marker JSON.
    #[cfg_attr(feature = "serde", serde(rename = "MDPP003"))]
    MalformedMarker,
    /// MDPP004: invalid style name or unusual style placement.
    #[cfg_attr(feature = "serde", serde(rename = "MDPP004"))]
    InvalidStylePlacement,
    /// MDPP005: include cycle back to an ancestor document.
    #[cfg_attr(feature = "serde", serde(rename = "MDPP005"))]
    CircularInclude,
    /// MDPP006: include target does not exist.
    #[cfg_attr(feature = "serde", serde(rename = "MDPP006"))]
    MissingInclude,
    /// MDPP007: invalid condition expression syntax.
    #[cfg_attr(feature = "serde", serde(rename = "MDPP007"))]
    InvalidConditionSyntax,
    /// MDPP008: alias defined more than once in the expanded document.
    #[cfg_attr(feature = "serde", serde(rename = "MDPP008"))]
    DuplicateAlias,
    /// MDPP009: continuation row column count differs from the row it continues.
    #[cfg_attr(feature = "serde", serde(rename = "MDPP009"))]
    TableColumnMismatch,
    /// MDPP010: include path is absolute or escapes the project root.
    #[cfg_attr(feature = "serde", serde(rename = "MDPP010"))]
    IncludeOutsideRoot,
    /// MDPP011: include depth or total include count limit exceeded.
    #[cfg_attr(feature = "serde", serde(rename = "MDPP011"))]
    IncludeLimitExceeded,
}

impl DiagnosticCode {
    /// Stable code string, e.g. `MDPP001`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FileError => "MDPP000",
            Self::UnclosedCondition => "MDPP001",
            Self::InvalidVariableName => "MDPP002",
            Self::MalformedMarker => "MDPP003",
            Self::InvalidStylePlacement => "MDPP004",
            Self::CircularInclude => "MDPP005",
            Self::MissingInclude => "MDPP006",
            Self::InvalidConditionSyntax => "MDPP007",
            Self::DuplicateAlias => "MDPP008",
            Self::TableColumnMismatch => "MDPP009",
            Self::IncludeOutsideRoot => "MDPP010",
            Self::IncludeLimitExceeded => "MDPP011",
        }
    }

    /// Severity this code is reported at.
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::FileError
            | Self::UnclosedCondition
            | Self::InvalidVariableName
            | Self::MalformedMarker
            | Self::CircularInclude
            | Self::InvalidConditionSyntax
            | Self::DuplicateAlias
            | Self::IncludeOutsideRoot => Severity::Error,
            Self::InvalidStylePlacement
            | Self::MissingInclude
            | Self::TableColumnMismatch
            | Self::IncludeLimitExceeded => Severity::Warning,
        }
    }

    /// Whether this code marks the enclosing document as failed.
    ///
    /// Fatal findings invalidate the document; traversal is still best-effort
    /// (siblings continue to be processed) so authors see every finding.
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::FileError
                | Self::UnclosedCondition
                | Self::CircularInclude
                | Self::IncludeOutsideRoot
        )
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Stable code external tooling matches on.
    pub code: DiagnosticCode,
    /// Severity the finding is reported at.
    pub severity: Severity,
    /// Human-readable message. Wording may change between versions.
    pub message: String,
    /// Location the finding refers to.
    pub span: SourceSpan,
    /// Secondary location, e.g. the first definition of a duplicate alias.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub related: Option<SourceSpan>,
}

impl Diagnostic {
    /// Create a diagnostic at the code's default severity.
    #[must_use]
    pub fn new(code: DiagnosticCode, message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: message.into(),
            span,
            related: None,
        }
    }

    /// Attach a secondary span.
    #[must_use]
    pub fn with_related(mut self, related: SourceSpan) -> Self {
        self.related = Some(related);
        self
    }

    /// Whether this finding marks the document as failed.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.code.is_fatal()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {} ({})",
            self.span, self.severity, self.message, self.code
        )
    }
}

/// Ordered collection of findings for one document pass.
///
/// Findings are recorded in discovery order and ranked on demand.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Append all findings from another collection.
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Findings in discovery order.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Number of findings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no findings were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of error-severity findings.
    ///
    /// In strict mode warnings count as errors for validity purposes; the
    /// findings themselves are unchanged.
    #[must_use]
    pub fn error_count(&self, strict: bool) -> usize {
        if strict {
            self.items.len()
        } else {
            self.items
                .iter()
                .filter(|d| d.severity == Severity::Error)
                .count()
        }
    }

    /// Number of warning-severity findings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Whether any finding is fatal to the document.
    #[must_use]
    pub fn has_fatal(&self) -> bool {
        self.items.iter().any(Diagnostic::is_fatal)
    }

    /// Findings ranked for reporting: errors first, then by file, line, column.
    #[must_use]
    pub fn ranked(&self) -> Vec<&Diagnostic> {
        let mut ranked: Vec<&Diagnostic> = self.items.iter().collect();
        ranked.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.span.file.cmp(&b.span.file))
                .then_with(|| a.span.line.cmp(&b.span.line))
                .then_with(|| a.span.column.cmp(&b.span.column))
        });
        ranked
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
