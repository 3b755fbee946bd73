//! Directive processing core for Markdown++.
//!
//! Markdown++ is plain CommonMark annotated with HTML-comment directives:
//! variables (`$name;`), conditional text (`<!--condition:expr-->` ...
//! `<!--/condition-->`), file includes (`<!--include:path-->`), stable link
//! anchors (`<!--#alias-->`), searchable metadata (`<!--marker:Key="V"-->`,
//! `<!--markers:{...}-->`), paragraph styles (`<!--style:Name-->`), and
//! block-spanning table cells (`<!--multiline-->`).
//!
//! This crate scans directive comments, parses each directive grammar,
//! resolves includes with cycle detection, enforces alias uniqueness, and
//! reconstructs multiline table cells. It does not render output or
//! substitute values; downstream tooling consumes the expanded token stream
//! plus diagnostics.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use mdpp_core::{Processor, ProcessorConfig};
//!
//! let config = ProcessorConfig::new("/docs")
//!     .with_read_file(|_path| Ok("<!--#intro-->\n# Intro\n".to_owned()));
//! let result = Processor::with_config(config).process_file(Path::new("/docs/guide.md"));
//!
//! assert!(result.diagnostics.is_empty());
//! assert!(result.aliases.contains("intro"));
//! ```

mod alias;
mod condition;
mod directive;
mod emit;
mod fence;
mod include;
mod processor;
mod scanner;
mod slug;
mod table;
mod variables;

pub use alias::{AliasEntry, AliasRegistry};
pub use condition::{ConditionExpr, ConditionParseError};
pub use directive::{Directive, SpannedDirective};
pub use emit::write_expanded;
pub use include::{Expansion, IncludeNode, IncludeResolver, ReadFileFn};
pub use processor::{ProcessResult, Processor, ProcessorConfig};
pub use scanner::{DirectiveGroup, Placement, Token, scan};
pub use slug::{make_unique_alias, slugify};
pub use table::{Cell, LogicalRow, MultilineTable, PhysicalRow, parse_grid};
pub use variables::{VariableRef, scan_variables};
