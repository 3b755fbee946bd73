//! End-to-end pipeline tests against a real directory tree.

use std::fs;
use std::path::Path;

use mdpp_core::{Processor, ProcessorConfig, write_expanded};
use mdpp_diagnostics::DiagnosticCode;
use pretty_assertions::assert_eq;

fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_nested_includes_expand_with_stable_spans() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "book.md",
        "# Book\n\n<!--include:chapters/one.md-->\nThe end.\n",
    );
    write(
        root,
        "chapters/one.md",
        "## Chapter One\n\n<!--include:shared/note.md-->\n",
    );
    write(root, "chapters/shared/note.md", "> A shared note.\n");

    let processor = Processor::with_config(ProcessorConfig::new(root));
    let result = processor.process_file(&root.join("book.md"));

    assert!(result.diagnostics.is_empty());
    assert!(result.is_valid(true));

    let expanded = write_expanded(&result.tokens);
    assert!(expanded.contains("## Chapter One"));
    assert!(expanded.contains("> A shared note."));
    assert!(!expanded.contains("include:"));

    // Include graph mirrors the nesting.
    assert_eq!(result.include_graph.children.len(), 1);
    assert_eq!(result.include_graph.children[0].children.len(), 1);
}

#[test]
fn test_cycle_and_missing_include_reported_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "a.md",
        "<!--include:b.md-->\n<!--include:gone.md-->\n",
    );
    write(root, "b.md", "<!--include:a.md-->\n");

    let processor = Processor::with_config(ProcessorConfig::new(root));
    let result = processor.process_file(&root.join("a.md"));

    let codes: Vec<DiagnosticCode> = result.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&DiagnosticCode::CircularInclude));
    assert!(codes.contains(&DiagnosticCode::MissingInclude));
    assert!(result.fatal);
    assert!(!result.is_valid(false));

    let cycle = result
        .diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::CircularInclude)
        .unwrap();
    assert_eq!(cycle.span.file, root.join("b.md"));
}

#[test]
fn test_validation_spans_point_into_included_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "main.md",
        "<!--#intro-->\n<!--include:part.md-->\n",
    );
    write(root, "part.md", "Some text.\n<!--#intro-->\n");

    let processor = Processor::with_config(ProcessorConfig::new(root));
    let result = processor.process_file(&root.join("main.md"));

    assert_eq!(result.diagnostics.len(), 1);
    let duplicate = result.diagnostics.iter().next().unwrap();
    assert_eq!(duplicate.code, DiagnosticCode::DuplicateAlias);
    assert_eq!(duplicate.span.file, root.join("part.md"));
    assert_eq!(duplicate.span.line, 2);
    assert_eq!(
        duplicate.related.as_ref().unwrap().file,
        root.join("main.md")
    );
}

#[test]
fn test_full_document_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "guide.md",
        concat!(
            "<!--#guide-->\n",
            "# Guide\n\n",
            "Hello $user;!\n\n",
            "<!--condition:web-->\nWeb only.\n<!--/condition-->\n\n",
            "<!--multiline-->\n",
            "| Name | Notes |\n",
            "| --- | --- |\n",
            "| Bob | Lives in Dallas. |\n",
            "|  | - cycling |\n",
        ),
    );

    let processor = Processor::with_config(ProcessorConfig::new(root));
    let result = processor.process_file(&root.join("guide.md"));

    assert!(result.diagnostics.is_empty());
    assert!(result.aliases.contains("guide"));
    assert_eq!(result.variables.len(), 1);
    assert_eq!(result.variables[0].name, "user");
    assert_eq!(result.tables.len(), 1);
    // Row 0 is the header; row 1 is the folded Bob row.
    assert_eq!(
        result.tables[0].rows[1].cells[1].lines,
        vec!["Lives in Dallas.", "- cycling"]
    );
}

#[test]
fn test_missing_top_level_document() {
    let dir = tempfile::tempdir().unwrap();
    let processor = Processor::with_config(ProcessorConfig::new(dir.path()));
    let result = processor.process_file(&dir.path().join("absent.md"));

    assert!(result.fatal);
    assert_eq!(
        result.diagnostics.iter().next().unwrap().code,
        DiagnosticCode::FileError
    );
}
