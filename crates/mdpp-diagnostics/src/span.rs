//! Source locations for diagnostics.

use std::fmt;
use std::path::{Path, PathBuf};

/// A location range within one source file.
///
/// Lines and columns are 1-indexed. Every node produced by the preprocessor
/// carries the span of the text it was parsed from; spans survive include
/// expansion unchanged, so a diagnostic always points into the file the
/// offending text physically lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceSpan {
    /// File the span refers to.
    pub file: PathBuf,
    /// Start line (1-indexed).
    pub line: usize,
    /// Start column (1-indexed).
    pub column: usize,
    /// End line (inclusive).
    pub end_line: usize,
    /// End column (exclusive).
    pub end_column: usize,
}

impl SourceSpan {
    /// Create a span covering a range.
    #[must_use]
    pub fn new(
        file: impl Into<PathBuf>,
        line: usize,
        column: usize,
        end_line: usize,
        end_column: usize,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            end_line,
            end_column,
        }
    }

    /// Create a zero-width span at a single position.
    #[must_use]
    pub fn point(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self::new(file, line, column, line, column)
    }

    /// File the span refers to.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_point_span() {
        let span = SourceSpan::point("guide.md", 12, 5);
        assert_eq!(span.line, 12);
        assert_eq!(span.end_line, 12);
        assert_eq!(span.column, 5);
        assert_eq!(span.end_column, 5);
    }

    #[test]
    fn test_display() {
        let span = SourceSpan::new("docs/guide.md", 3, 7, 3, 20);
        assert_eq!(span.to_string(), "docs/guide.md:3:7");
    }
}
