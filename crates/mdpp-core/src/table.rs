//! Multiline table reconstruction.
//!
//! A table preceded by a `multiline` directive folds physical rows into
//! logical rows: a physical row whose first cell is empty continues the
//! previous logical row (its cells append as new lines), and a row whose
//! every cell is empty separates logical rows. Cell boundary tokenization is
//! the job of the surrounding table syntax; this module only splits simple
//! pipe rows and folds the resulting grid.

use mdpp_diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, SourceSpan};

/// One cell of a logical row; content lines may contain nested block markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    /// Content lines, in order.
    pub lines: Vec<String>,
}

impl Cell {
    fn new(content: &str) -> Self {
        Self {
            lines: vec![content.to_owned()],
        }
    }
}

/// One reconstructed row spanning one or more physical rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalRow {
    /// Cells in column order.
    pub cells: Vec<Cell>,
}

/// A table as folded from its physical grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultilineTable {
    /// Logical rows in order.
    pub rows: Vec<LogicalRow>,
    /// Span of the first physical row.
    pub span: SourceSpan,
}

/// One physical table row with already-known cell boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalRow {
    /// Cell contents, trimmed.
    pub cells: Vec<String>,
    /// Location of the row.
    pub span: SourceSpan,
}

impl MultilineTable {
    /// Fold physical rows into logical rows.
    ///
    /// A continuation row with more or fewer cells than the row it continues
    /// yields MDPP009; the shorter side is padded with empty content.
    #[must_use]
    pub fn fold(rows: &[PhysicalRow]) -> (Option<Self>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let Some(first) = rows.first() else {
            return (None, diagnostics);
        };

        let mut logical: Vec<LogicalRow> = Vec::new();
        let mut current: Option<LogicalRow> = None;

        for row in rows {
            let all_empty = row.cells.iter().all(|cell| cell.is_empty());
            let continuation = !all_empty
                && row.cells.first().is_some_and(String::is_empty);

            if all_empty {
                // Separator: close the current logical row.
                if let Some(finished) = current.take() {
                    logical.push(finished);
                }
            } else if continuation {
                match current.as_mut() {
                    Some(open) => append_continuation(open, row, &mut diagnostics),
                    // Continuation with nothing to continue starts a row.
                    None => current = Some(start_row(row)),
                }
            } else {
                if let Some(finished) = current.take() {
                    logical.push(finished);
                }
                current = Some(start_row(row));
            }
        }
        if let Some(finished) = current.take() {
            logical.push(finished);
        }

        (
            Some(Self {
                rows: logical,
                span: first.span.clone(),
            }),
            diagnostics,
        )
    }
}

fn start_row(row: &PhysicalRow) -> LogicalRow {
    LogicalRow {
        cells: row.cells.iter().map(|c| Cell::new(c)).collect(),
    }
}

/// Append a continuation row's cells (beyond the empty first cell) as new
/// lines of the open logical row's corresponding cells.
fn append_continuation(open: &mut LogicalRow, row: &PhysicalRow, diagnostics: &mut Diagnostics) {
    if row.cells.len() != open.cells.len() {
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::TableColumnMismatch,
            format!(
                "continuation row has {} cells, expected {}",
                row.cells.len(),
                open.cells.len()
            ),
            row.span.clone(),
        ));
    }

    // Pad the logical row if the continuation is wider.
    while open.cells.len() < row.cells.len() {
        open.cells.push(Cell::default());
    }

    for (index, content) in row.cells.iter().enumerate().skip(1) {
        if !content.is_empty() {
            open.cells[index].lines.push(content.clone());
        }
    }
}

/// Split raw pipe-table lines into a physical grid.
///
/// Outer pipes are stripped, cells trimmed, and the `---`/`:--:` alignment
/// separator row is skipped. Lines not shaped like table rows end the grid.
#[must_use]
pub fn parse_grid(lines: &[(&str, SourceSpan)]) -> Vec<PhysicalRow> {
    let mut rows = Vec::new();
    for (line, span) in lines {
        let trimmed = line.trim();
        if !trimmed.starts_with('|') {
            break;
        }
        if is_alignment_row(trimmed) {
            continue;
        }
        let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
        let inner = inner.strip_suffix('|').unwrap_or(inner);
        rows.push(PhysicalRow {
            cells: inner
                .split('|')
                .map(|cell| cell.trim().to_owned())
                .collect(),
            span: span.clone(),
        });
    }
    rows
}

fn is_alignment_row(trimmed: &str) -> bool {
    let inner: String = trimmed.chars().filter(|&c| c != '|').collect();
    !inner.trim().is_empty()
        && inner
            .chars()
            .all(|c| c == '-' || c == ':' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn row(line: usize, cells: &[&str]) -> PhysicalRow {
        PhysicalRow {
            cells: cells.iter().map(|c| (*c).to_owned()).collect(),
            span: SourceSpan::point(Path::new("doc.md"), line, 1),
        }
    }

    #[test]
    fn test_continuation_and_separator_folding() {
        let rows = vec![
            row(1, &["Bob", "Lives in Dallas."]),
            row(2, &["", "- cycling"]),
            row(3, &["", ""]),
            row(4, &["Mary", "Lives in El Paso."]),
        ];
        let (table, diagnostics) = MultilineTable::fold(&rows);
        let table = table.unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[0].cells[1].lines,
            vec!["Lives in Dallas.", "- cycling"]
        );
        assert_eq!(table.rows[1].cells[0].lines, vec!["Mary"]);
    }

    #[test]
    fn test_plain_rows_without_continuations() {
        let rows = vec![row(1, &["a", "b"]), row(2, &["c", "d"])];
        let (table, diagnostics) = MultilineTable::fold(&rows);

        assert!(diagnostics.is_empty());
        assert_eq!(table.unwrap().rows.len(), 2);
    }

    #[test]
    fn test_column_mismatch_warns_and_pads() {
        let rows = vec![
            row(1, &["Bob", "notes"]),
            row(2, &["", "more", "extra"]),
        ];
        let (table, diagnostics) = MultilineTable::fold(&rows);
        let table = table.unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.iter().next().unwrap().code,
            DiagnosticCode::TableColumnMismatch
        );
        assert_eq!(table.rows[0].cells.len(), 3);
        assert_eq!(table.rows[0].cells[2].lines, vec!["extra"]);
    }

    #[test]
    fn test_empty_grid() {
        let (table, diagnostics) = MultilineTable::fold(&[]);
        assert!(table.is_none());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_parse_grid_skips_alignment_row() {
        let span = SourceSpan::point(Path::new("doc.md"), 1, 1);
        let lines = vec![
            ("| Name | Notes |", span.clone()),
            ("| --- | :---: |", span.clone()),
            ("| Bob | Lives in Dallas. |", span.clone()),
            ("|  | - cycling |", span.clone()),
            ("not a table row", span),
        ];
        let grid = parse_grid(&lines);

        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0].cells, vec!["Name", "Notes"]);
        assert_eq!(grid[2].cells, vec!["", "- cycling"]);
    }
}
