//! Expanded document emission.
//!
//! Writes a token stream back to Markdown++ text. Directives are annotated,
//! not removed, so a downstream renderer still sees them; includes have
//! already been spliced by the resolver. Combined comments consisting only
//! of style/multiline/marker/alias directives are re-emitted in canonical
//! order: style, multiline, marker(s), alias.

use std::fmt::Write as _;

use crate::directive::SpannedDirective;
use crate::scanner::Token;

/// Render an expanded token stream as document text.
#[must_use]
pub fn write_expanded(tokens: &[Token]) -> String {
    let mut output = String::new();
    for token in tokens {
        match token {
            Token::Text { text, .. } => output.push_str(text),
            Token::Comment { text, .. } => {
                let _ = write!(output, "<!--{text}-->");
            }
            Token::Directives(group) => {
                let clauses: Vec<String> = canonical_order(&group.items)
                    .iter()
                    .map(|item| item.directive.to_string())
                    .collect();
                let _ = write!(output, "<!--{}-->", clauses.join(";"));
            }
        }
    }
    output
}

/// Canonical order for combinable groups; groups containing condition or
/// include directives keep parse order, since reordering them would change
/// meaning.
fn canonical_order(items: &[SpannedDirective]) -> Vec<&SpannedDirective> {
    let mut ordered: Vec<&SpannedDirective> = items.iter().collect();
    if items.iter().all(|i| i.directive.canonical_rank().is_some()) {
        ordered.sort_by_key(|i| i.directive.canonical_rank());
    }
    ordered
}
