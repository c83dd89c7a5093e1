//! Table extraction
//!
//! Converts docx-rs tables into `TableData`, using the first row as the
//! header row when it looks like one.

use super::super::models::*;
use super::formatting::{extract_run_formatting, extract_run_text};

/// Extract table data from a docx-rs Table
pub(crate) fn extract_table_data(table: &docx_rs::Table) -> Option<Block> {
    let mut rows: Vec<Vec<TableCell>> = Vec::new();

    for table_child in &table.rows {
        let docx_rs::TableChild::TableRow(row) = table_child;
        let mut row_cells = Vec::new();

        for row_child in &row.cells {
            let docx_rs::TableRowChild::TableCell(cell) = row_child;
            let mut cell_text = String::new();
            let mut cell_formatting = None;

            for content in &cell.children {
                if let docx_rs::TableCellContent::Paragraph(para) = content {
                    for para_child in &para.children {
                        if let docx_rs::ParagraphChild::Run(run) = para_child {
                            // The first run decides the cell formatting
                            cell_formatting.get_or_insert_with(|| extract_run_formatting(run));

                            let text = extract_run_text(run);
                            if text.is_empty() {
                                continue;
                            }
                            if !cell_text.is_empty() && !cell_text.ends_with(' ') {
                                cell_text.push(' ');
                            }
                            cell_text.push_str(&text);
                        }
                    }
                }
            }

            row_cells.push(
                TableCell::new(cell_text.trim()).with_formatting(cell_formatting.unwrap_or_default()),
            );
        }

        if !row_cells.is_empty() {
            rows.push(row_cells);
        }
    }

    if rows.is_empty() {
        return None;
    }

    let first: Vec<String> = rows[0].iter().map(|cell| cell.content.clone()).collect();
    let headers = if appears_to_be_header(&first) || rows.len() == 1 {
        rows.remove(0)
    } else {
        Vec::new()
    };

    Some(Block::Table {
        table: TableData::new(headers, rows),
    })
}

/// Detect if a row appears to be a header based on heuristics
fn appears_to_be_header(row: &[String]) -> bool {
    if row.is_empty() {
        return false;
    }

    let total_chars: usize = row.iter().map(|cell| cell.len()).sum();
    // Headers tend to be shorter and more concise
    if total_chars / row.len() > 50 {
        return false;
    }

    let header_indicators = row
        .iter()
        .filter(|cell| {
            let cell_lower = cell.to_lowercase();
            let word_count = cell.split_whitespace().count();

            (word_count <= 3 && !cell.trim().is_empty())
                || ["name", "date", "amount", "type", "status", "id", "description", "count"]
                    .iter()
                    .any(|word| cell_lower.contains(word))
        })
        .count();

    header_indicators > row.len() / 2
}
