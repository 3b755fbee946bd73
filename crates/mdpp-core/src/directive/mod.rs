//! Directive types for Markdown++ HTML-comment annotations.
//!
//! A directive is one parsed instruction from a `<!-- ... -->` comment. A
//! single comment may carry several directives separated by `;` (the
//! combined form), e.g. `<!--style:Note;#intro-->`.

mod parser;

pub(crate) use parser::{ParseOutcome, parse_clause};

use std::fmt;

use mdpp_diagnostics::SourceSpan;

use crate::condition::ConditionExpr;

/// One parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `style:Name` — paragraph/block style for the following element.
    Style {
        /// Style name; mapping to presentation rules is external.
        name: String,
    },
    /// `#name` — stable link anchor.
    Alias {
        /// Anchor name, unique across the expanded document.
        name: String,
    },
    /// `marker:Key="Value"` or one pair of `markers:{...}` — searchable metadata.
    Marker {
        key: String,
        value: String,
    },
    /// `multiline` — the next table folds continuation rows into logical cells.
    Multiline,
    /// `condition:expr` — opens a conditional text block.
    ConditionOpen {
        expr: ConditionExpr,
    },
    /// `/condition` — closes the innermost open condition block.
    ConditionClose,
    /// `include:path` — splice another file at this position.
    Include {
        /// Path relative to the directory of the containing file.
        path: String,
    },
}

impl Directive {
    /// Position of this directive kind in canonical combined-comment order:
    /// style, multiline, marker(s), alias.
    ///
    /// Returns `None` for kinds that do not take part in canonical
    /// reordering (conditions and includes keep parse order).
    #[must_use]
    pub fn canonical_rank(&self) -> Option<usize> {
        match self {
            Self::Style { .. } => Some(0),
            Self::Multiline => Some(1),
            Self::Marker { .. } => Some(2),
            Self::Alias { .. } => Some(3),
            Self::ConditionOpen { .. } | Self::ConditionClose | Self::Include { .. } => None,
        }
    }
}

impl fmt::Display for Directive {
    /// Canonical directive text, without the surrounding comment delimiters.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Style { name } => write!(f, "style:{name}"),
            Self::Alias { name } => write!(f, "#{name}"),
            Self::Marker { key, value } => write!(f, "marker:{key}=\"{value}\""),
            Self::Multiline => f.write_str("multiline"),
            Self::ConditionOpen { expr } => write!(f, "condition:{expr}"),
            Self::ConditionClose => f.write_str("/condition"),
            Self::Include { path } => write!(f, "include:{path}"),
        }
    }
}

/// A directive plus the span of the clause it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedDirective {
    pub directive: Directive,
    pub span: SourceSpan,
}

impl SpannedDirective {
    #[must_use]
    pub fn new(directive: Directive, span: SourceSpan) -> Self {
        Self { directive, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_forms() {
        assert_eq!(
            Directive::Style {
                name: "Note".to_owned()
            }
            .to_string(),
            "style:Note"
        );
        assert_eq!(
            Directive::Alias {
                name: "intro".to_owned()
            }
            .to_string(),
            "#intro"
        );
        assert_eq!(
            Directive::Marker {
                key: "Keywords".to_owned(),
                value: "a, b".to_owned()
            }
            .to_string(),
            r#"marker:Keywords="a, b""#
        );
        assert_eq!(Directive::Multiline.to_string(), "multiline");
        assert_eq!(Directive::ConditionClose.to_string(), "/condition");
        assert_eq!(
            Directive::Include {
                path: "parts/intro.md".to_owned()
            }
            .to_string(),
            "include:parts/intro.md"
        );
    }

    #[test]
    fn test_canonical_rank_order() {
        let style = Directive::Style {
            name: "Note".to_owned(),
        };
        let alias = Directive::Alias {
            name: "intro".to_owned(),
        };
        assert!(style.canonical_rank() < alias.canonical_rank());
        assert_eq!(Directive::ConditionClose.canonical_rank(), None);
    }
}
