//! Document search and navigation operations
//!
//! This module provides read-only querying operations on documents:
//! regex search producing text ranges, outline generation and simple
//! counters used by the counter macros.

use regex::Regex;

use super::models::*;
use super::range::TextRange;

/// Find every match of `pattern` in paragraph and table cell text, in
/// document order
///
/// Matches never span two paragraphs or two cells. Objects and generated
/// tables of contents are not searched.
pub fn search_document(document: &Document, pattern: &Regex) -> Vec<TextRange> {
    let mut results = Vec::new();

    for block in &document.blocks {
        match block {
            Block::Paragraph(paragraph) => {
                let text = paragraph.text();
                for found in pattern.find_iter(&text) {
                    results.push(TextRange::in_paragraph(
                        paragraph.id,
                        found.start(),
                        found.end(),
                    ));
                }
            }
            Block::Table { table } => {
                for (at, cell) in table.cells() {
                    for found in pattern.find_iter(&cell.content) {
                        results.push(TextRange::in_cell(table.id, at, found.start(), found.end()));
                    }
                }
            }
            _ => {}
        }
    }

    results
}

pub fn generate_outline(document: &Document) -> Vec<OutlineItem> {
    let mut outline = Vec::new();

    for (index, block) in document.blocks.iter().enumerate() {
        if let Block::Paragraph(paragraph) = block {
            if let Some(level) = paragraph.outline_level {
                let title = paragraph.text().trim().to_string();
                if title.is_empty() {
                    continue;
                }
                outline.push(OutlineItem {
                    title,
                    level,
                    block_index: index,
                });
            }
        }
    }

    outline
}

impl Document {
    pub fn search(&self, pattern: &Regex) -> Vec<TextRange> {
        search_document(self, pattern)
    }

    pub fn outline(&self) -> Vec<OutlineItem> {
        generate_outline(self)
    }
}

/// Counts backing the `N_*` counter macros
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentCounts {
    pub pages: usize,
    pub figures: usize,
    pub tables: usize,
    pub formulas: usize,
}

pub fn count_objects(document: &Document) -> DocumentCounts {
    DocumentCounts {
        pages: super::cleanup::estimate_page_count(document.word_count()).max(1),
        figures: document.embedded_objects(ObjectKind::Image).len(),
        tables: document.tables().count(),
        formulas: document.embedded_objects(ObjectKind::Formula).len(),
    }
}
