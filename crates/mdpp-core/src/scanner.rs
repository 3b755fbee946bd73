//! Directive comment scanner.
//!
//! Tokenizes HTML-comment spans in raw document text. Comment interiors are
//! extracted verbatim, split on top-level `;` into clauses, and handed to the
//! directive parsers. Comments that match no known directive prefix pass
//! through unchanged; not every comment is a directive.

use std::path::Path;

use mdpp_diagnostics::{Diagnostics, SourceSpan};

use crate::directive::{ParseOutcome, SpannedDirective, parse_clause};
use crate::fence::FenceTracker;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Where a directive comment sits relative to surrounding text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The comment occupies its own line(s); it annotates the following block.
    Block,
    /// The comment shares a line with other text; it annotates inline content.
    Inline,
}

/// All directives parsed from one comment, in parse order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveGroup {
    /// Parsed directives, left to right.
    pub items: Vec<SpannedDirective>,
    /// Block or inline placement of the owning comment.
    pub placement: Placement,
    /// Span of the whole comment, delimiters included.
    pub span: SourceSpan,
}

/// One scanned unit of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Verbatim text between comments.
    Text { text: String, span: SourceSpan },
    /// A comment that is not a directive, interior verbatim.
    Comment { text: String, span: SourceSpan },
    /// A directive comment.
    Directives(DirectiveGroup),
}

impl Token {
    /// Span of the token.
    #[must_use]
    pub fn span(&self) -> &SourceSpan {
        match self {
            Self::Text { span, .. } | Self::Comment { span, .. } => span,
            Self::Directives(group) => &group.span,
        }
    }
}

/// Scan raw document text into a token stream.
///
/// Malformed directives yield diagnostics and are dropped from the stream;
/// scanning itself never fails.
#[must_use]
pub fn scan(text: &str, file: &Path) -> (Vec<Token>, Diagnostics) {
    Scanner::new(text, file).run()
}

struct Scanner<'a> {
    text: &'a str,
    file: &'a Path,
    /// Byte offset of each line start.
    line_starts: Vec<usize>,
    /// Per line: whether the line belongs to a fenced code block.
    fenced: Vec<bool>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, file: &'a Path) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }

        let mut tracker = FenceTracker::new();
        let fenced = text.lines().map(|line| tracker.feed(line)).collect();

        Self {
            text,
            file,
            line_starts,
            fenced,
        }
    }

    fn run(&self) -> (Vec<Token>, Diagnostics) {
        let mut tokens = Vec::new();
        let mut diagnostics = Diagnostics::new();
        let mut pos = 0;

        while let Some(start) = self.next_comment_start(pos) {
            let interior_start = start + COMMENT_OPEN.len();
            let Some(close) = self.text[interior_start..].find(COMMENT_CLOSE) else {
                // Unterminated comment: the rest of the document is text.
                break;
            };
            let interior_end = interior_start + close;
            let end = interior_end + COMMENT_CLOSE.len();

            if start > pos {
                tokens.push(self.text_token(pos, start));
            }

            let interior = &self.text[interior_start..interior_end];
            self.scan_comment(
                interior,
                interior_start,
                self.span_of(start, end),
                self.placement_of(start, end),
                &mut tokens,
                &mut diagnostics,
            );

            pos = end;
        }

        if pos < self.text.len() {
            tokens.push(self.text_token(pos, self.text.len()));
        }

        (tokens, diagnostics)
    }

    /// Next comment opener at or after `from`, skipping fenced lines.
    fn next_comment_start(&self, from: usize) -> Option<usize> {
        let mut search = from;
        while let Some(rel) = self.text[search..].find(COMMENT_OPEN) {
            let start = search + rel;
            let (line, _) = self.position(start);
            if self.fenced.get(line - 1).copied().unwrap_or(false) {
                search = start + COMMENT_OPEN.len();
            } else {
                return Some(start);
            }
        }
        None
    }

    fn scan_comment(
        &self,
        interior: &str,
        interior_offset: usize,
        span: SourceSpan,
        placement: Placement,
        tokens: &mut Vec<Token>,
        diagnostics: &mut Diagnostics,
    ) {
        let mut items = Vec::new();
        let mut invalid = Vec::new();
        let mut recognized_any = false;

        for (clause_offset, clause) in split_clauses(interior) {
            let lead = clause.len() - clause.trim_start().len();
            let abs = interior_offset + clause_offset + lead;
            let clause_span = self.span_of(abs, abs + clause.trim().len());

            match parse_clause(clause, &clause_span) {
                ParseOutcome::Directives(directives) => {
                    recognized_any = true;
                    for directive in directives {
                        items.push(SpannedDirective::new(directive, clause_span.clone()));
                    }
                }
                ParseOutcome::Invalid(diagnostic) => {
                    recognized_any = true;
                    invalid.push(diagnostic);
                }
                ParseOutcome::NotADirective => {}
            }
        }

        if recognized_any {
            for diagnostic in invalid {
                diagnostics.push(diagnostic);
            }
            if !items.is_empty() {
                tokens.push(Token::Directives(DirectiveGroup {
                    items,
                    placement,
                    span,
                }));
            }
        } else {
            tokens.push(Token::Comment {
                text: interior.to_owned(),
                span,
            });
        }
    }

    fn text_token(&self, start: usize, end: usize) -> Token {
        Token::Text {
            text: self.text[start..end].to_owned(),
            span: self.span_of(start, end),
        }
    }

    /// Block placement: nothing but whitespace around the comment on its
    /// first and last lines.
    fn placement_of(&self, start: usize, end: usize) -> Placement {
        let (start_line, _) = self.position(start);
        let line_start = self.line_starts[start_line - 1];
        let before = &self.text[line_start..start];

        let after_end = self.text[end..]
            .find('\n')
            .map_or(self.text.len(), |n| end + n);
        let after = &self.text[end..after_end];

        if before.trim().is_empty() && after.trim().is_empty() {
            Placement::Block
        } else {
            Placement::Inline
        }
    }

    fn span_of(&self, start: usize, end: usize) -> SourceSpan {
        let (line, column) = self.position(start);
        let (end_line, end_column) = self.position(end);
        SourceSpan::new(self.file, line, column, end_line, end_column)
    }

    /// Byte offset to 1-indexed line/column.
    fn position(&self, offset: usize) -> (usize, usize) {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset);
        (line, offset - self.line_starts[line - 1] + 1)
    }
}

/// Split a comment interior on top-level `;`.
///
/// Separators inside double-quoted marker values or `{...}` marker objects
/// do not split. Returns `(byte_offset, clause)` pairs in left-to-right
/// order; empty clauses are skipped.
fn split_clauses(interior: &str) -> Vec<(usize, &str)> {
    let mut clauses = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut clause_start = 0;

    for (offset, c) in interior.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '{' if !in_quotes => depth += 1,
            '}' if !in_quotes => depth = depth.saturating_sub(1),
            ';' if !in_quotes && depth == 0 => {
                if !interior[clause_start..offset].trim().is_empty() {
                    clauses.push((clause_start, &interior[clause_start..offset]));
                }
                clause_start = offset + 1;
            }
            _ => {}
        }
    }
    if !interior[clause_start..].trim().is_empty() {
        clauses.push((clause_start, &interior[clause_start..]));
    }

    clauses
}
