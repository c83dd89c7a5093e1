//! Text ranges and in-place edits
//!
//! A `TextRange` addresses a byte span of one paragraph's text, or of one
//! table cell when `cell` is set. Every
//! mutation returns an `Edit`, and ranges found before the mutation are
//! carried across it with `TextRange::rebase`, so a list of ranges taken
//! from one search stays valid while its entries are replaced one by one.

use serde::{Deserialize, Serialize};

use super::models::*;
use crate::error::TemplaterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub block: BlockId,
    #[serde(default)]
    pub cell: Option<CellRef>,
    pub start: usize,
    pub end: usize,
}

/// Description of one mutation, used to rebase outstanding ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub block: BlockId,
    pub cell: Option<CellRef>,
    pub start: usize,
    pub end: usize,
    pub kind: EditKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// The span was replaced by `inserted` bytes of text
    Text { inserted: usize },
    /// The paragraph was cut at the span and blocks were inserted in between;
    /// the text after the span now lives in `tail`
    Split { tail: Option<BlockId> },
}

impl TextRange {
    pub fn in_paragraph(block: BlockId, start: usize, end: usize) -> Self {
        TextRange {
            block,
            cell: None,
            start,
            end,
        }
    }

    pub fn in_cell(block: BlockId, cell: CellRef, start: usize, end: usize) -> Self {
        TextRange {
            block,
            cell: Some(cell),
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Follow this range through `edit`; `None` if the edit overlapped it
    pub fn rebase(self, edit: &Edit) -> Option<TextRange> {
        if self.block != edit.block || self.cell != edit.cell || self.end <= edit.start {
            return Some(self);
        }
        if self.start < edit.end {
            return None;
        }

        match edit.kind {
            EditKind::Text { inserted } => {
                let removed = edit.end - edit.start;
                let shift = |offset: usize| offset - removed + inserted;
                Some(TextRange {
                    block: self.block,
                    cell: self.cell,
                    start: shift(self.start),
                    end: shift(self.end),
                })
            }
            EditKind::Split { tail } => tail.map(|tail| TextRange {
                block: tail,
                cell: None,
                start: self.start - edit.end,
                end: self.end - edit.end,
            }),
        }
    }
}

impl Document {
    pub fn range_text(&self, range: &TextRange) -> Result<String, TemplaterError> {
        let text = match range.cell {
            Some(at) => self
                .table(range.block)
                .and_then(|table| table.cell(at))
                .map(|cell| cell.content.clone()),
            None => self.paragraph(range.block).map(Paragraph::text),
        }
        .ok_or(TemplaterError::StaleRange(*range))?;
        text.get(range.start..range.end)
            .map(str::to_string)
            .ok_or(TemplaterError::StaleRange(*range))
    }

    /// Replace the range with plain text, keeping the formatting of the run
    /// where the range starts
    pub fn replace_text(
        &mut self,
        range: &TextRange,
        replacement: &str,
    ) -> Result<Edit, TemplaterError> {
        if range.cell.is_some() {
            return self.replace_in_cell(range, replacement);
        }
        let index = self.checked_position(range)?;
        if let Block::Paragraph(paragraph) = &mut self.blocks[index] {
            paragraph.runs = replace_in_runs(
                std::mem::take(&mut paragraph.runs),
                range.start,
                range.end,
                replacement,
            );
        }

        Ok(Edit {
            block: range.block,
            cell: None,
            start: range.start,
            end: range.end,
            kind: EditKind::Text {
                inserted: replacement.len(),
            },
        })
    }

    /// Replace the range with whole blocks, splitting its paragraph in two
    ///
    /// The text before the range keeps the paragraph identifier, the text
    /// after it moves to a new paragraph with the same style. Halves that
    /// contain only whitespace are dropped.
    ///
    /// A cell cannot hold blocks: inside a table the range is replaced by
    /// the plain text of `blocks` instead.
    pub fn splice_blocks(
        &mut self,
        range: &TextRange,
        blocks: Vec<Block>,
    ) -> Result<Edit, TemplaterError> {
        if range.cell.is_some() {
            let text = blocks
                .iter()
                .map(Block::plain_text)
                .filter(|text| !text.trim().is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            return self.replace_in_cell(range, &text);
        }

        let index = self.checked_position(range)?;
        let Block::Paragraph(paragraph) = self.blocks.remove(index) else {
            return Err(TemplaterError::StaleRange(*range));
        };

        let Paragraph {
            id,
            style,
            outline_level,
            runs,
        } = paragraph;
        let (head_runs, rest) = split_runs(runs, range.start);
        let (_, tail_runs) = split_runs(rest, range.end - range.start);

        let mut replacement = Vec::with_capacity(blocks.len() + 2);
        let head = Paragraph {
            id,
            style: style.clone(),
            outline_level,
            runs: head_runs,
        };
        if !head.text().trim().is_empty() {
            replacement.push(Block::Paragraph(head));
        }

        replacement.extend(self.adopt(blocks));

        let mut tail_id = None;
        let tail = Paragraph {
            id: self.allocate_id(),
            style,
            outline_level,
            runs: tail_runs,
        };
        if !tail.text().trim().is_empty() {
            tail_id = Some(tail.id);
            replacement.push(Block::Paragraph(tail));
        }

        self.blocks.splice(index..index, replacement);

        Ok(Edit {
            block: range.block,
            cell: None,
            start: range.start,
            end: range.end,
            kind: EditKind::Split { tail: tail_id },
        })
    }

    fn replace_in_cell(
        &mut self,
        range: &TextRange,
        replacement: &str,
    ) -> Result<Edit, TemplaterError> {
        let cell = match range.cell {
            Some(at) => self
                .table_mut(range.block)
                .and_then(|table| table.cell_mut(at)),
            None => None,
        }
        .ok_or(TemplaterError::StaleRange(*range))?;
        if cell.content.get(range.start..range.end).is_none() {
            return Err(TemplaterError::StaleRange(*range));
        }
        cell.content.replace_range(range.start..range.end, replacement);

        Ok(Edit {
            block: range.block,
            cell: range.cell,
            start: range.start,
            end: range.end,
            kind: EditKind::Text {
                inserted: replacement.len(),
            },
        })
    }

    fn checked_position(&self, range: &TextRange) -> Result<usize, TemplaterError> {
        let index = self
            .position_of(range.block)
            .ok_or(TemplaterError::StaleRange(*range))?;
        match &self.blocks[index] {
            Block::Paragraph(p) if p.text().get(range.start..range.end).is_some() => Ok(index),
            _ => Err(TemplaterError::StaleRange(*range)),
        }
    }
}

fn replace_in_runs(
    runs: Vec<FormattedRun>,
    start: usize,
    end: usize,
    replacement: &str,
) -> Vec<FormattedRun> {
    let mut result = Vec::with_capacity(runs.len());
    let mut offset = 0;
    let mut inserted = false;

    for run in runs {
        let run_start = offset;
        let run_end = offset + run.text.len();
        offset = run_end;

        let len = run.text.len();
        let cut_from = start.saturating_sub(run_start).min(len);
        let cut_to = end.saturating_sub(run_start).min(len);

        let mut text = String::with_capacity(len + replacement.len());
        text.push_str(&run.text[..cut_from]);
        if !inserted && run_start <= start && start < run_end {
            text.push_str(replacement);
            inserted = true;
        }
        text.push_str(&run.text[cut_to..]);

        if !text.is_empty() {
            result.push(FormattedRun {
                text,
                formatting: run.formatting,
            });
        }
    }

    if !inserted && !replacement.is_empty() {
        match result.last_mut() {
            Some(last) => last.text.push_str(replacement),
            None => result.push(FormattedRun::plain(replacement)),
        }
    }

    result
}

fn split_runs(runs: Vec<FormattedRun>, at: usize) -> (Vec<FormattedRun>, Vec<FormattedRun>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut offset = 0;

    for run in runs {
        let run_start = offset;
        offset += run.text.len();

        if offset <= at {
            before.push(run);
        } else if run_start >= at {
            after.push(run);
        } else {
            let (left, right) = run.text.split_at(at - run_start);
            before.push(FormattedRun {
                text: left.to_string(),
                formatting: run.formatting.clone(),
            });
            after.push(FormattedRun {
                text: right.to_string(),
                formatting: run.formatting,
            });
        }
    }

    (before, after)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(text: &str) -> FormattedRun {
        FormattedRun {
            text: text.to_string(),
            formatting: TextFormatting {
                bold: true,
                ..Default::default()
            },
        }
    }

    fn paragraph_doc(runs: Vec<FormattedRun>) -> (Document, BlockId) {
        let mut document = Document::new("doc");
        document.push(Block::Paragraph(Paragraph::new(runs)));
        let id = document.paragraphs().next().unwrap().id;
        (document, id)
    }

    #[test]
    fn test_replace_text_across_runs_keeps_first_run_formatting() {
        let (mut document, id) =
            paragraph_doc(vec![FormattedRun::plain("Year %YE"), bold("AR% end")]);
        let range = TextRange {
            block: id,
            cell: None,
            start: 5,
            end: 11,
        };
        assert_eq!(document.range_text(&range).unwrap(), "%YEAR%");

        document.replace_text(&range, "2024").unwrap();
        let paragraph = document.paragraph(id).unwrap();
        assert_eq!(paragraph.text(), "Year 2024 end");
        assert_eq!(paragraph.runs[0].text, "Year 2024");
        assert!(paragraph.runs[1].formatting.bold);
    }

    #[test]
    fn test_rebase_after_text_edit() {
        let (mut document, id) = paragraph_doc(vec![FormattedRun::plain("%A% then %BB%")]);
        let first = TextRange {
            block: id,
            cell: None,
            start: 0,
            end: 3,
        };
        let second = TextRange {
            block: id,
            cell: None,
            start: 9,
            end: 13,
        };

        let edit = document.replace_text(&first, "longer value").unwrap();
        let moved = second.rebase(&edit).unwrap();
        assert_eq!(document.range_text(&moved).unwrap(), "%BB%");
    }

    #[test]
    fn test_splice_moves_trailing_ranges_to_tail() {
        let (mut document, id) =
            paragraph_doc(vec![FormattedRun::plain("before %X% middle %Y% after")]);
        let first = TextRange {
            block: id,
            cell: None,
            start: 7,
            end: 10,
        };
        let second = TextRange {
            block: id,
            cell: None,
            start: 18,
            end: 21,
        };

        let edit = document
            .splice_blocks(&first, vec![Block::PageBreak])
            .unwrap();
        assert_eq!(document.blocks.len(), 3);
        assert!(matches!(document.blocks[1], Block::PageBreak));

        let moved = second.rebase(&edit).unwrap();
        assert_ne!(moved.block, id);
        assert_eq!(document.range_text(&moved).unwrap(), "%Y%");
        assert_eq!(document.paragraph(id).unwrap().text(), "before ");
    }

    #[test]
    fn test_splice_whole_paragraph_drops_it() {
        let (mut document, id) = paragraph_doc(vec![FormattedRun::plain("%MAIN_TEXT%")]);
        let range = TextRange {
            block: id,
            cell: None,
            start: 0,
            end: 11,
        };
        let edit = document
            .splice_blocks(
                &range,
                vec![Block::Paragraph(Paragraph::new(vec![FormattedRun::plain(
                    "body",
                )]))],
            )
            .unwrap();

        assert_eq!(edit.kind, EditKind::Split { tail: None });
        assert_eq!(document.blocks.len(), 1);
        assert!(document.paragraph(id).is_none());
        assert_eq!(document.paragraphs().next().unwrap().text(), "body");
    }

    #[test]
    fn test_overlapping_range_is_invalidated() {
        let edit = Edit {
            block: 1,
            cell: None,
            start: 2,
            end: 6,
            kind: EditKind::Text { inserted: 1 },
        };
        let overlapping = TextRange {
            block: 1,
            cell: None,
            start: 4,
            end: 8,
        };
        assert!(overlapping.rebase(&edit).is_none());

        let other_block = TextRange {
            block: 2,
            cell: None,
            start: 4,
            end: 8,
        };
        assert_eq!(other_block.rebase(&edit), Some(other_block));
    }

    #[test]
    fn test_cell_edits_rebase_only_within_the_cell() {
        let mut document = Document::new("doc");
        document.push(Block::Table {
            table: TableData::new(
                vec![TableCell::new("%A% and %B%"), TableCell::new("%C%")],
                vec![],
            ),
        });
        let id = document.tables().next().unwrap().id;
        let first_cell = CellRef { row: 0, column: 0 };
        let second_cell = CellRef { row: 0, column: 1 };

        let a = TextRange::in_cell(id, first_cell, 0, 3);
        let b = TextRange::in_cell(id, first_cell, 8, 11);
        let c = TextRange::in_cell(id, second_cell, 0, 3);
        assert_eq!(document.range_text(&b).unwrap(), "%B%");

        let edit = document.replace_text(&a, "alpha").unwrap();
        assert_eq!(c.rebase(&edit), Some(c));
        let b = b.rebase(&edit).unwrap();
        assert_eq!(document.range_text(&b).unwrap(), "%B%");

        let section = vec![
            Block::Paragraph(Paragraph::new(vec![FormattedRun::plain("one")])),
            Block::PageBreak,
            Block::Paragraph(Paragraph::new(vec![FormattedRun::plain("two")])),
        ];
        document.splice_blocks(&b, section).unwrap();
        let table = document.table(id).unwrap();
        assert_eq!(table.cell(first_cell).unwrap().content, "alpha and one two");
        assert_eq!(document.blocks.len(), 1);
    }

    #[test]
    fn test_stale_range_is_an_error() {
        let (document, id) = paragraph_doc(vec![FormattedRun::plain("short")]);
        let range = TextRange {
            block: id,
            cell: None,
            start: 2,
            end: 40,
        };
        assert!(document.range_text(&range).is_err());
    }
}
