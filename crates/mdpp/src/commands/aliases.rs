//! `mdpp add-aliases` command implementation.
//!
//! Inserts `<!--#alias-->` anchors before headings so links stay stable when
//! heading text changes. Aliases are slugified from the heading text, made
//! unique against every alias already in the file, and skipped for headings
//! that already carry an anchor on the line above.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Args;

use mdpp_config::{CliSettings, Config};
use mdpp_core::{AliasRegistry, make_unique_alias, scan, slugify};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the add-aliases command.
#[derive(Args)]
pub(crate) struct AddAliasesArgs {
    /// Markdown++ files to annotate.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Heading levels to annotate, e.g. `--levels 1,2,3` (overrides config).
    #[arg(long, value_delimiter = ',')]
    levels: Option<Vec<u8>>,

    /// Prefix prepended to every generated alias (overrides config).
    #[arg(long)]
    prefix: Option<String>,

    /// Show planned insertions without modifying any file.
    #[arg(long)]
    dry_run: bool,

    /// Write the annotated document here instead of in place
    /// (single input file only).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdpp.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// One planned anchor insertion.
#[derive(Debug, PartialEq, Eq)]
struct Insertion {
    /// 1-indexed line of the heading the anchor goes before.
    line: usize,
    /// Alias name without the leading `#`.
    alias: String,
}

impl AddAliasesArgs {
    /// Execute the add-aliases command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or file I/O fails.
    pub(crate) fn execute(self) -> Result<i32, CliError> {
        let output = Output::new();

        if self.output.is_some() && self.files.len() > 1 {
            return Err(CliError::Validation(
                "--output requires a single input file".to_owned(),
            ));
        }

        let config = Config::load(self.config.as_deref(), Some(&CliSettings::default()))?;
        let levels = self.levels.unwrap_or_else(|| config.aliases.levels.clone());
        let prefix = self.prefix.unwrap_or_else(|| config.aliases.prefix.clone());

        for file in &self.files {
            let text = std::fs::read_to_string(file)?;
            let insertions = plan_insertions(&text, file, &levels, &prefix);

            if self.dry_run {
                for insertion in &insertions {
                    output.info(&format!(
                        "{}:{}: <!--#{}-->",
                        file.display(),
                        insertion.line,
                        insertion.alias
                    ));
                }
                continue;
            }

            if !insertions.is_empty() || self.output.is_some() {
                let annotated = apply_insertions(&text, &insertions);
                let target = self.output.as_ref().unwrap_or(file);
                std::fs::write(target, annotated).map_err(|source| CliError::Write {
                    path: target.clone(),
                    source,
                })?;
            }
            output.success(&format!(
                "{}: added {} alias(es)",
                file.display(),
                insertions.len()
            ));
        }

        Ok(0)
    }
}

/// Compute the anchors to insert for headings at the given levels.
///
/// Headings inside fenced code blocks and headings already anchored on the
/// line above are skipped; headings whose text slugifies to nothing get no
/// anchor.
fn plan_insertions(
    text: &str,
    file: &std::path::Path,
    levels: &[u8],
    prefix: &str,
) -> Vec<Insertion> {
    let (tokens, _) = scan(text, file);
    let (registry, _) = AliasRegistry::build(&tokens);
    let mut taken: HashSet<String> = registry.iter().map(|entry| entry.name.clone()).collect();

    let lines: Vec<&str> = text.lines().collect();
    let mut insertions = Vec::new();
    let mut fenced = false;

    for (index, line) in lines.iter().enumerate() {
        if is_fence_delimiter(line) {
            fenced = !fenced;
            continue;
        }
        if fenced {
            continue;
        }
        let Some((level, heading)) = parse_heading(line) else {
            continue;
        };
        if !levels.contains(&level) {
            continue;
        }
        if index > 0 && is_alias_comment(lines[index - 1]) {
            continue;
        }

        let base = format!("{prefix}{}", slugify(heading));
        if base.len() == prefix.len() {
            continue;
        }
        let alias = make_unique_alias(&base, &taken);
        taken.insert(alias.clone());
        insertions.push(Insertion {
            line: index + 1,
            alias,
        });
    }

    insertions
}

/// Rebuild the document with anchor lines inserted before their headings.
fn apply_insertions(text: &str, insertions: &[Insertion]) -> String {
    use std::fmt::Write as _;

    let trailing_newline = text.ends_with('\n');
    let mut rebuilt = String::with_capacity(text.len() + insertions.len() * 16);
    let mut remaining = insertions.iter().peekable();

    for (index, line) in text.lines().enumerate() {
        while remaining.peek().is_some_and(|i| i.line == index + 1) {
            if let Some(insertion) = remaining.next() {
                let _ = writeln!(rebuilt, "<!--#{}-->", insertion.alias);
            }
        }
        rebuilt.push_str(line);
        rebuilt.push('\n');
    }
    if !trailing_newline {
        rebuilt.pop();
    }
    rebuilt
}

/// Whether a line opens or closes a fenced code block.
fn is_fence_delimiter(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Parse an ATX heading, returning its level and text.
fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim();
    // Strip an optional closing hash sequence (`## Title ##`).
    let without_closer = text.trim_end_matches('#');
    let text = if without_closer.len() < text.len() && without_closer.ends_with(' ') {
        without_closer.trim_end()
    } else {
        text
    };
    let level = u8::try_from(hashes).ok()?;
    Some((level, text))
}

/// Whether a line is an alias anchor comment.
fn is_alias_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with("<!--#") && trimmed.ends_with("-->")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn plan(text: &str, levels: &[u8], prefix: &str) -> Vec<Insertion> {
        plan_insertions(text, Path::new("doc.md"), levels, prefix)
    }

    #[test]
    fn test_plan_inserts_before_configured_levels() {
        let text = "# Intro\n\n## Getting Started\n\n### Deep Dive\n";
        let insertions = plan(text, &[1, 2], "");

        assert_eq!(
            insertions,
            vec![
                Insertion {
                    line: 1,
                    alias: "intro".to_owned()
                },
                Insertion {
                    line: 3,
                    alias: "getting-started".to_owned()
                },
            ]
        );
    }

    #[test]
    fn test_plan_skips_already_anchored_heading() {
        let text = "<!--#intro-->\n# Intro\n\n## Setup\n";
        let insertions = plan(text, &[1, 2], "");

        assert_eq!(insertions.len(), 1);
        assert_eq!(insertions[0].alias, "setup");
    }

    #[test]
    fn test_plan_uniquifies_against_existing_aliases() {
        let text = "<!--#setup-->\nIntro text.\n\n## Setup\n";
        let insertions = plan(text, &[2], "");

        assert_eq!(insertions[0].alias, "setup-2");
    }

    #[test]
    fn test_plan_uniquifies_repeated_headings() {
        let text = "## Usage\n\n## Usage\n";
        let insertions = plan(text, &[2], "");

        assert_eq!(insertions[0].alias, "usage");
        assert_eq!(insertions[1].alias, "usage-2");
    }

    #[test]
    fn test_plan_applies_prefix() {
        let text = "# Intro\n";
        let insertions = plan(text, &[1], "doc-");

        assert_eq!(insertions[0].alias, "doc-intro");
    }

    #[test]
    fn test_plan_skips_fenced_and_empty_headings() {
        let text = "```\n# not a heading\n```\n# ???\n# Real\n";
        let insertions = plan(text, &[1], "");

        assert_eq!(insertions.len(), 1);
        assert_eq!(insertions[0].alias, "real");
    }

    #[test]
    fn test_apply_insertions() {
        let text = "# Intro\n\n## Setup\n";
        let insertions = plan(text, &[1, 2], "");
        let annotated = apply_insertions(text, &insertions);

        assert_eq!(
            annotated,
            "<!--#intro-->\n# Intro\n\n<!--#setup-->\n## Setup\n"
        );
    }

    #[test]
    fn test_apply_preserves_missing_trailing_newline() {
        let text = "# Intro";
        let insertions = plan(text, &[1], "");
        let annotated = apply_insertions(text, &insertions);

        assert_eq!(annotated, "<!--#intro-->\n# Intro");
    }

    #[test]
    fn test_parse_heading_closing_hashes() {
        assert_eq!(parse_heading("## Title ##"), Some((2, "Title")));
        assert_eq!(parse_heading("# C#"), Some((1, "C#")));
        assert_eq!(parse_heading("#NoSpace"), None);
    }
}
