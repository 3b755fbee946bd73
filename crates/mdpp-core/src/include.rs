//! Include resolution with cycle detection.
//!
//! For each `include:path` directive the resolver loads the target relative
//! to the directory of the file containing the directive, scans it, and
//! splices the child token stream in place. A per-traversal visited-path
//! stack makes cycle detection explicit and testable independent of call
//! stack depth; depth and total-count limits bound pathological graphs that
//! are deep or wide without being literally cyclic.

use std::io;
use std::path::{Component, Path, PathBuf};

use mdpp_diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, SourceSpan};
use tracing::debug;

use crate::directive::{Directive, SpannedDirective};
use crate::scanner::{DirectiveGroup, Token, scan};

/// File reading callback, defaulting to [`std::fs::read_to_string`].
pub type ReadFileFn = dyn Fn(&Path) -> io::Result<String> + Send + Sync;

/// One node of the include graph rooted at a top-level document.
///
/// Well-formed documents produce a DAG; a cycle back to an ancestor is
/// reported as MDPP005 and the offending edge is not descended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeNode {
    /// Path as referenced by the including document (top document: as given).
    pub document: PathBuf,
    /// Lexically normalized path the document was loaded from.
    pub resolved: PathBuf,
    /// Successfully expanded child includes, in document order.
    pub children: Vec<IncludeNode>,
}

/// Result of expanding a top-level document.
#[derive(Debug)]
pub struct Expansion {
    /// Merged token stream with includes spliced in place. Child tokens keep
    /// their own file's spans.
    pub tokens: Vec<Token>,
    /// Diagnostics from scanning and resolution, in discovery order.
    pub diagnostics: Diagnostics,
    /// Include graph rooted at the top-level document.
    pub root: IncludeNode,
}

/// Recursive include resolver for one document traversal.
pub struct IncludeResolver {
    project_root: PathBuf,
    max_depth: usize,
    max_includes: usize,
    read_file: Box<ReadFileFn>,
}

impl IncludeResolver {
    /// Create a resolver rooted at `project_root`. Includes resolving outside
    /// the root are rejected.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: normalize(&project_root.into()),
            max_depth: 10,
            max_includes: 256,
            read_file: Box::new(|path| std::fs::read_to_string(path)),
        }
    }

    /// Set the maximum include nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum total number of expanded includes per document.
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
        self.read_file = Box::new(read_file);
        self
    }

    /// Expand a top-level document and everything it transitively includes.
    ///
    /// An unreadable top-level document is MDPP000; the result then carries
    /// an empty token stream and that single diagnostic.
    #[must_use]
    pub fn resolve(&self, document: &Path) -> Expansion {
        let resolved = normalize(document);
        let mut state = Traversal {
            visited: vec![resolved.clone()],
            total: 0,
            diagnostics: Diagnostics::new(),
        };

        let text = match (self.read_file)(&resolved) {
            Ok(text) => text,
            Err(err) => {
                state.diagnostics.push(Diagnostic::new(
                    DiagnosticCode::FileError,
                    format!("cannot read `{}`: {err}", resolved.display()),
                    SourceSpan::point(document, 1, 1),
                ));
                return Expansion {
                    tokens: Vec::new(),
                    diagnostics: state.diagnostics,
                    root: IncludeNode {
                        document: document.to_path_buf(),
                        resolved,
                        children: Vec::new(),
                    },
                };
            }
        };

        let mut root = IncludeNode {
            document: document.to_path_buf(),
            resolved: resolved.clone(),
            children: Vec::new(),
        };
        let tokens = self.expand_text(&text, &resolved, &mut root, &mut state);

        Expansion {
            tokens,
            diagnostics: state.diagnostics,
            root,
        }
    }

    /// Expand a document whose text is already in memory (e.g. an editor
    /// buffer); includes it references are still loaded through the
    /// callback.
    #[must_use]
    pub fn resolve_str(&self, text: &str, document: &Path) -> Expansion {
        let resolved = normalize(document);
        let mut state = Traversal {
            visited: vec![resolved.clone()],
            total: 0,
            diagnostics: Diagnostics::new(),
        };
        let mut root = IncludeNode {
            document: document.to_path_buf(),
            resolved: resolved.clone(),
            children: Vec::new(),
        };
        let tokens = self.expand_text(text, &resolved, &mut root, &mut state);
        Expansion {
            tokens,
            diagnostics: state.diagnostics,
            root,
        }
    }

    /// Scan `text` and splice every include it contains.
    fn expand_text(
        &self,
        text: &str,
        file: &Path,
        node: &mut IncludeNode,
        state: &mut Traversal,
    ) -> Vec<Token> {
        let (scanned, scan_diagnostics) = scan(text, file);
        state.diagnostics.extend(scan_diagnostics);

        let mut tokens = Vec::with_capacity(scanned.len());
        for token in scanned {
            match token {
                Token::Directives(group) => self.expand_group(group, file, node, state, &mut tokens),
                other => tokens.push(other),
            }
        }
        tokens
    }

    /// Expand the include directives of one comment group in place: child
    /// tokens replace each include at its own position, and the directives
    /// around it keep their left-to-right order.
    fn expand_group(
        &self,
        group: DirectiveGroup,
        file: &Path,
        node: &mut IncludeNode,
        state: &mut Traversal,
        tokens: &mut Vec<Token>,
    ) {
        let has_include = group
            .items
            .iter()
            .any(|item| matches!(item.directive, Directive::Include { .. }));
        if !has_include {
            tokens.push(Token::Directives(group));
            return;
        }

        let DirectiveGroup {
            items,
            placement,
            span,
        } = group;
        let mut pending: Vec<SpannedDirective> = Vec::new();
        let flush = |pending: &mut Vec<SpannedDirective>, tokens: &mut Vec<Token>| {
            if !pending.is_empty() {
                tokens.push(Token::Directives(DirectiveGroup {
                    items: std::mem::take(pending),
                    placement,
                    span: span.clone(),
                }));
            }
        };

        for item in items {
            if let Directive::Include { ref path } = item.directive {
                match self.expand_include(path, &item.span, file, node, state) {
                    Some(child_tokens) => {
                        flush(&mut pending, tokens);
                        tokens.extend(child_tokens);
                    }
                    // Unresolvable include passes through unexpanded so
                    // downstream tooling still sees the intent.
                    None => pending.push(item),
                }
            } else {
                pending.push(item);
            }
        }
        flush(&mut pending, tokens);
    }

    /// Expand one include directive.
    ///
    /// `Some(tokens)` replaces the directive (empty for a skipped cycle or
    /// root escape); `None` keeps the directive in the stream unexpanded.
    fn expand_include(
        &self,
        path: &str,
        span: &SourceSpan,
        containing: &Path,
        node: &mut IncludeNode,
        state: &mut Traversal,
    ) -> Option<Vec<Token>> {
        let base = containing.parent().unwrap_or_else(|| Path::new("."));
        let resolved = normalize(&base.join(path));

        if !resolved.starts_with(&self.project_root) {
            state.diagnostics.push(Diagnostic::new(
                DiagnosticCode::IncludeOutsideRoot,
                format!(
                    "include `{path}` resolves outside the project root `{}`",
                    self.project_root.display()
                ),
                span.clone(),
            ));
            return Some(Vec::new());
        }

        if state.visited.contains(&resolved) {
            state.diagnostics.push(Diagnostic::new(
                DiagnosticCode::CircularInclude,
                format!("circular include: {}", cycle_chain(&state.visited, &resolved)),
                span.clone(),
            ));
            return Some(Vec::new());
        }

        // visited holds the top document plus every open include.
        if state.visited.len() > self.max_depth {
            state.diagnostics.push(Diagnostic::new(
                DiagnosticCode::IncludeLimitExceeded,
                format!("include depth limit ({}) exceeded", self.max_depth),
                span.clone(),
            ));
            return None;
        }
        if state.total >= self.max_includes {
            state.diagnostics.push(Diagnostic::new(
                DiagnosticCode::IncludeLimitExceeded,
                format!("include count limit ({}) exceeded", self.max_includes),
                span.clone(),
            ));
            return None;
        }

        let text = match (self.read_file)(&resolved) {
            Ok(text) => text,
            Err(err) => {
                state.diagnostics.push(Diagnostic::new(
                    DiagnosticCode::MissingInclude,
                    format!("include file not found: `{path}` ({err})"),
                    span.clone(),
                ));
                return None;
            }
        };

        debug!(include = %resolved.display(), from = %containing.display(), "expanding include");
        state.total += 1;
        state.visited.push(resolved.clone());
        let mut child = IncludeNode {
            document: PathBuf::from(path),
            resolved: resolved.clone(),
            children: Vec::new(),
        };
        let tokens = self.expand_text(&text, &resolved, &mut child, state);
        state.visited.pop();
        node.children.push(child);

        Some(tokens)
    }
}

struct Traversal {
    /// Stack of open documents, top-level first.
    visited: Vec<PathBuf>,
    /// Total includes expanded in this traversal.
    total: usize,
    diagnostics: Diagnostics,
}

/// Describe a cycle as `a.md -> b.md -> a.md`, starting at the first
/// occurrence of the repeated path.
fn cycle_chain(visited: &[PathBuf], repeated: &Path) -> String {
    let start = visited
        .iter()
        .position(|p| p == repeated)
        .unwrap_or(0);
    let mut parts: Vec<String> = visited[start..]
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    parts.push(repeated.display().to_string());
    parts.join(" -> ")
}

/// Lexical path normalization: resolves `.` and `..` without touching the
/// filesystem, so unreadable paths still normalize for cycle detection.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
