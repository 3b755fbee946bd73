//! Single-pass document processing pipeline.
//!
//! Scan, include-expand, match conditions, register aliases, scan variables,
//! and reconstruct multiline tables, collecting every diagnostic along the
//! way. All state is owned per traversal, so independent documents can be
//! processed in parallel without shared mutable state.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mdpp_diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, SourceSpan};
use tracing::debug;

use crate::alias::AliasRegistry;
use crate::directive::Directive;
use crate::include::{Expansion, IncludeNode, IncludeResolver, ReadFileFn};
use crate::scanner::{Placement, Token};
use crate::table::{MultilineTable, parse_grid};
use crate::variables::{VariableRef, scan_variables};

/// Configuration for document processing.
pub struct ProcessorConfig {
    /// Project root; includes resolving outside it are rejected.
    pub project_root: PathBuf,
    /// Maximum include nesting depth.
    pub max_include_depth: usize,
    /// Maximum total include expansions per document.
    pub max_includes: usize,
    /// File reading callback; defaults to [`std::fs::read_to_string`].
    read_file: Option<Arc<ReadFileFn>>,
}

impl ProcessorConfig {
    /// Create a configuration rooted at `project_root`.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            max_include_depth: 10,
            max_includes: 256,
            read_file: None,
        }
    }

    /// Set the maximum include nesting depth.
    #[must_use]
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Set the maximum total include expansions per document.
    #[must_use]
    pub fn with_max_includes(mut self, count: usize) -> Self {
        self.max_includes = count;
        self
    }

    /// Replace the file reading callback.
    #[must_use]
    pub fn with_read_file<F>(mut self, read_file: F) -> Self
    where
        F: Fn(&Path) -> io::Result<String> + Send + Sync + 'static,
    {
        self.read_file = Some(Arc::new(read_file));
        self
    }

    fn resolver(&self) -> IncludeResolver {
        let resolver = IncludeResolver::new(&self.project_root)
            .with_max_depth(self.max_include_depth)
            .with_max_includes(self.max_includes);
        match &self.read_file {
            Some(read_file) => {
                let read_file = Arc::clone(read_file);
                resolver.with_read_file(move |path| read_file(path))
            }
            None => resolver,
        }
    }
}

/// Everything produced by one document pass.
#[derive(Debug)]
pub struct ProcessResult {
    /// Expanded token stream: includes spliced, directives annotated.
    pub tokens: Vec<Token>,
    /// All findings, in discovery order.
    pub diagnostics: Diagnostics,
    /// Alias definitions of the expanded document.
    pub aliases: AliasRegistry,
    /// Validated variable placeholders.
    pub variables: Vec<VariableRef>,
    /// Reconstructed multiline tables, in document order.
    pub tables: Vec<MultilineTable>,
    /// Include graph rooted at the top-level document.
    pub include_graph: IncludeNode,
    /// Whether a fatal finding invalidated the document.
    pub fatal: bool,
}

impl ProcessResult {
    /// Whether the document passed validation.
    ///
    /// Strict mode counts warnings as errors; the diagnostics themselves are
    /// unchanged either way.
    #[must_use]
    pub fn is_valid(&self, strict: bool) -> bool {
        !self.fatal && self.diagnostics.error_count(strict) == 0
    }
}

/// Directive processing pipeline for Markdown++ documents.
///
/// One processor can serve many documents; each call owns its traversal
/// state (visited-path stack, alias registry, diagnostics), so callers may
/// process independent documents from parallel workers.
pub struct Processor {
    config: ProcessorConfig,
}

impl Processor {
    /// Create a processor with the given configuration.
    #[must_use]
    pub fn with_config(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// Process a top-level document from the filesystem.
    #[must_use]
    pub fn process_file(&self, document: &Path) -> ProcessResult {
        let expansion = self.config.resolver().resolve(document);
        self.finish(expansion)
    }

    /// Process a document whose text is already in memory.
    #[must_use]
    pub fn process_str(&self, text: &str, document: &Path) -> ProcessResult {
        let expansion = self.config.resolver().resolve_str(text, document);
        self.finish(expansion)
    }

    /// Run the post-expansion stages over the merged stream.
    fn finish(&self, expansion: Expansion) -> ProcessResult {
        let Expansion {
            tokens,
            mut diagnostics,
            root,
        } = expansion;

        diagnostics.extend(match_conditions(&tokens));
        diagnostics.extend(check_style_placement(&tokens));

        let (aliases, alias_diagnostics) = AliasRegistry::build(&tokens);
        diagnostics.extend(alias_diagnostics);

        let (variables, variable_diagnostics) = scan_variables(&tokens);
        diagnostics.extend(variable_diagnostics);

        let (tables, table_diagnostics) = reconstruct_tables(&tokens);
        diagnostics.extend(table_diagnostics);

        let fatal = diagnostics.has_fatal();
        debug!(
            document = %root.resolved.display(),
            diagnostics = diagnostics.len(),
            fatal,
            "document processed"
        );

        ProcessResult {
            tokens,
            diagnostics,
            aliases,
            variables,
            tables,
            include_graph: root,
            fatal,
        }
    }
}

/// Match `condition:` opens against `/condition` closes over the expanded
/// stream. Includes are already spliced, so blocks may span file boundaries.
fn match_conditions(tokens: &[Token]) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    let mut open: Vec<(SourceSpan, String)> = Vec::new();

    for token in tokens {
        let Token::Directives(group) = token else {
            continue;
        };
        for item in &group.items {
            match &item.directive {
                Directive::ConditionOpen { expr } => {
                    open.push((item.span.clone(), expr.to_string()));
                }
                Directive::ConditionClose => {
                    if open.pop().is_none() {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticCode::UnclosedCondition,
                            "closing condition tag without matching opening tag",
                            item.span.clone(),
                        ));
                    }
                }
                _ => {}
            }
        }
    }

    for (span, expr) in open {
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::UnclosedCondition,
            format!("unclosed condition block: {expr}"),
            span,
        ));
    }

    diagnostics
}

/// A style directive annotates the following block; one buried inside a
/// line of text is probably a mistake.
fn check_style_placement(tokens: &[Token]) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for token in tokens {
        let Token::Directives(group) = token else {
            continue;
        };
        if group.placement == Placement::Block {
            continue;
        }
        for item in &group.items {
            if let Directive::Style { name } = &item.directive {
                diagnostics.push(Diagnostic::new(
                    DiagnosticCode::InvalidStylePlacement,
                    format!("style `{name}` placed inline; styles apply to the following block"),
                    item.span.clone(),
                ));
            }
        }
    }
    diagnostics
}

/// Reconstruct the table following each `multiline` directive.
fn reconstruct_tables(tokens: &[Token]) -> (Vec<MultilineTable>, Diagnostics) {
    let mut tables = Vec::new();
    let mut diagnostics = Diagnostics::new();
    let mut pending = false;

    for token in tokens {
        match token {
            Token::Directives(group) => {
                if group
                    .items
                    .iter()
                    .any(|i| i.directive == Directive::Multiline)
                {
                    pending = true;
                }
            }
            Token::Text { text, span } => {
                if !pending {
                    continue;
                }
                if let Some(grid_lines) = table_lines(text, span) {
                    let grid = parse_grid(&grid_lines);
                    let (table, fold_diagnostics) = MultilineTable::fold(&grid);
                    diagnostics.extend(fold_diagnostics);
                    if let Some(table) = table {
                        tables.push(table);
                    }
                    pending = false;
                } else if !text.trim().is_empty() {
                    // Non-table content cancels the flag.
                    pending = false;
                }
            }
            Token::Comment { .. } => {}
        }
    }

    (tables, diagnostics)
}

/// Leading pipe-table lines of a text token, with per-line spans.
fn table_lines<'a>(
    text: &'a str,
    base: &SourceSpan,
) -> Option<Vec<(&'a str, SourceSpan)>> {
    let mut lines = Vec::new();
    let mut line_number = base.line;
    let mut seen_table = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('|') {
            seen_table = true;
            lines.push((
                line,
                SourceSpan::point(base.file.clone(), line_number, 1),
            ));
        } else if seen_table || !trimmed.is_empty() {
            break;
        }
        line_number += 1;
    }

    seen_table.then_some(lines)
}
