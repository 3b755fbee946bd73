//! Alias uniqueness validation.
//!
//! Aliases are author-assigned link anchors; uniqueness is enforced over the
//! fully expanded document (after include splicing), so two files that each
//! define `#intro` collide once one includes the other. The registry is
//! built once per traversal and read-only afterwards; cross-reference
//! resolution for links is a downstream concern.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use mdpp_diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, SourceSpan};

use crate::directive::Directive;
use crate::scanner::Token;

/// First definition of an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    /// Alias name without the leading `#`.
    pub name: String,
    /// Where the alias was first defined.
    pub span: SourceSpan,
}

/// Registry of alias definitions for one expanded document.
#[derive(Debug, Default)]
pub struct AliasRegistry {
    entries: HashMap<String, AliasEntry>,
}

impl AliasRegistry {
    /// Walk an expanded token stream and record every alias definition.
    ///
    /// A second definition of an existing name yields one MDPP008 diagnostic
    /// referencing both the duplicate and the original span.
    #[must_use]
    pub fn build(tokens: &[Token]) -> (Self, Diagnostics) {
        let mut registry = Self::default();
        let mut diagnostics = Diagnostics::new();

        for token in tokens {
            let Token::Directives(group) = token else {
                continue;
            };
            for item in &group.items {
                if let Directive::Alias { name } = &item.directive {
                    if let Some(existing) = registry.record(name, item.span.clone()) {
                        diagnostics.push(
                            Diagnostic::new(
                                DiagnosticCode::DuplicateAlias,
                                format!(
                                    "duplicate alias `#{name}`, first defined at {}",
                                    existing.span
                                ),
                                item.span.clone(),
                            )
                            .with_related(existing.span.clone()),
                        );
                    }
                }
            }
        }

        (registry, diagnostics)
    }

    /// Record a definition. Returns the existing entry if the name is taken.
    fn record(&mut self, name: &str, span: SourceSpan) -> Option<AliasEntry> {
        match self.entries.entry(name.to_owned()) {
            Entry::Occupied(occupied) => Some(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                vacant.insert(AliasEntry {
                    name: name.to_owned(),
                    span,
                });
                None
            }
        }
    }

    /// Whether an alias is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// First definition of an alias, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AliasEntry> {
        self.entries.get(name)
    }

    /// Number of distinct aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document defines no aliases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &AliasEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn build(text: &str) -> (AliasRegistry, Diagnostics) {
        let (tokens, scan_diagnostics) = scan(text, Path::new("doc.md"));
        assert!(scan_diagnostics.is_empty());
        AliasRegistry::build(&tokens)
    }

    #[test]
    fn test_distinct_aliases_are_clean() {
        let (registry, diagnostics) = build("<!--#intro-->\n<!--#outro-->\n");
        assert!(diagnostics.is_empty());
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("intro"));
        assert!(registry.contains("outro"));
    }

    #[test]
    fn test_duplicate_yields_one_diagnostic_with_both_spans() {
        let (registry, diagnostics) = build("<!--#intro-->\ntext\n<!--#intro-->\n");
        assert_eq!(registry.len(), 1);
        assert_eq!(diagnostics.len(), 1);

        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.code, DiagnosticCode::DuplicateAlias);
        assert_eq!(diagnostic.span.line, 3);
        assert_eq!(diagnostic.related.as_ref().unwrap().line, 1);
    }

    #[test]
    fn test_first_definition_wins() {
        let (registry, _) = build("<!--#intro-->\n<!--#intro-->\n");
        assert_eq!(registry.get("intro").unwrap().span.line, 1);
    }

    #[test]
    fn test_alias_in_combined_comment() {
        let (registry, diagnostics) = build("<!--style:Note;#combined-->\n");
        assert!(diagnostics.is_empty());
        assert!(registry.contains("combined"));
    }
}
