//! Core data structures for document representation
//!
//! This module defines the in-memory document model the macro engine and the
//! formula fixer operate on: paragraphs made of formatted runs, tables,
//! embedded objects with property bags, and generated tables of contents.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::TemplaterError;

/// Stable identifier of a paragraph or table inside one document.
pub type BlockId = u64;

/// Name of the property holding a formula's raw notation.
pub const FORMULA_PROPERTY: &str = "Formula";

/// Name of the property holding an object's anchoring mode.
pub const ANCHOR_PROPERTY: &str = "AnchorType";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub metadata: DocumentMetadata,
    pub blocks: Vec<Block>,
    #[serde(skip)]
    next_block_id: BlockId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_path: String,
    pub file_size: u64,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Block {
    Paragraph(Paragraph),
    Table { table: TableData },
    Object(EmbeddedObject),
    TableOfContents(TableOfContents),
    PageBreak,
}

impl Block {
    /// Text of the block without any structure, as it would read inline
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph(paragraph) => paragraph.text(),
            Block::Table { table } => table
                .cells()
                .map(|(_, cell)| cell.content.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            Block::TableOfContents(toc) => toc.title.clone(),
            Block::Object(_) | Block::PageBreak => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(skip)]
    pub id: BlockId,
    #[serde(default)]
    pub style: Option<String>,
    /// Heading level when the paragraph takes part in the outline
    #[serde(default)]
    pub outline_level: Option<u8>,
    pub runs: Vec<FormattedRun>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextFormatting {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub font_size: Option<f32>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedRun {
    pub text: String,
    pub formatting: TextFormatting,
}

impl FormattedRun {
    pub fn plain(text: impl Into<String>) -> Self {
        FormattedRun {
            text: text.into(),
            formatting: TextFormatting::default(),
        }
    }

    /// Consolidate adjacent runs with identical formatting into single runs
    pub fn consolidate_runs(runs: Vec<FormattedRun>) -> Vec<FormattedRun> {
        if runs.is_empty() {
            return runs;
        }

        let mut consolidated = Vec::new();
        let mut current_run = runs[0].clone();

        for run in runs.into_iter().skip(1) {
            if current_run.formatting == run.formatting {
                current_run.text.push_str(&run.text);
            } else {
                consolidated.push(current_run);
                current_run = run;
            }
        }

        consolidated.push(current_run);
        consolidated
    }
}

impl Paragraph {
    pub fn new(runs: Vec<FormattedRun>) -> Self {
        Paragraph {
            runs,
            ..Default::default()
        }
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Paragraph {
            style: Some(format!("Heading {level}")),
            outline_level: Some(level),
            runs: vec![FormattedRun::plain(text)],
            ..Default::default()
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableData {
    #[serde(skip)]
    pub id: BlockId,
    pub headers: Vec<TableCell>,
    pub rows: Vec<Vec<TableCell>>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCell {
    pub content: String,
    #[serde(default)]
    pub formatting: TextFormatting,
}

/// Position of a cell; row 0 is the header row, data rows start at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub column: usize,
}

impl TableData {
    pub fn new(headers: Vec<TableCell>, rows: Vec<Vec<TableCell>>) -> Self {
        TableData {
            id: 0,
            headers,
            rows,
            title: None,
        }
    }

    fn row(&self, row: usize) -> Option<&Vec<TableCell>> {
        match row {
            0 => Some(&self.headers),
            n => self.rows.get(n - 1),
        }
    }

    pub fn cell(&self, at: CellRef) -> Option<&TableCell> {
        self.row(at.row)?.get(at.column)
    }

    pub fn cell_mut(&mut self, at: CellRef) -> Option<&mut TableCell> {
        let row = match at.row {
            0 => &mut self.headers,
            n => self.rows.get_mut(n - 1)?,
        };
        row.get_mut(at.column)
    }

    /// Every cell with its position, header row first
    pub fn cells(&self) -> impl Iterator<Item = (CellRef, &TableCell)> {
        std::iter::once(&self.headers)
            .chain(self.rows.iter())
            .enumerate()
            .flat_map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .map(move |(column, cell)| (CellRef { row, column }, cell))
            })
    }
}

impl TableCell {
    pub fn new(content: impl Into<String>) -> Self {
        TableCell {
            content: content.into(),
            formatting: TextFormatting::default(),
        }
    }

    pub fn with_formatting(mut self, formatting: TextFormatting) -> Self {
        self.formatting = formatting;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Formula,
    Image,
    Chart,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

/// An object embedded in the text flow: a formula, an image, a chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedObject {
    pub name: String,
    pub kind: ObjectKind,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl EmbeddedObject {
    pub fn formula(name: impl Into<String>, notation: impl Into<String>) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(
            FORMULA_PROPERTY.to_string(),
            PropertyValue::Text(notation.into()),
        );
        EmbeddedObject {
            name: name.into(),
            kind: ObjectKind::Formula,
            properties,
        }
    }

    pub fn image(name: impl Into<String>, description: impl Into<String>) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(
            "Description".to_string(),
            PropertyValue::Text(description.into()),
        );
        EmbeddedObject {
            name: name.into(),
            kind: ObjectKind::Image,
            properties,
        }
    }

    pub fn get_property(&self, property: &str) -> Result<&PropertyValue, TemplaterError> {
        self.properties
            .get(property)
            .ok_or_else(|| TemplaterError::PropertyAccess {
                object: self.name.clone(),
                property: property.to_string(),
                problem: "missing".to_string(),
            })
    }

    pub fn get_text_property(&self, property: &str) -> Result<&str, TemplaterError> {
        match self.get_property(property)? {
            PropertyValue::Text(text) => Ok(text),
            other => Err(TemplaterError::PropertyAccess {
                object: self.name.clone(),
                property: property.to_string(),
                problem: format!("not text ({other:?})"),
            }),
        }
    }

    pub fn set_property(&mut self, property: &str, value: PropertyValue) {
        self.properties.insert(property.to_string(), value);
    }
}

/// A generated table of contents; entries are rebuilt by `Document::update_indexes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOfContents {
    pub title: String,
    #[serde(default)]
    pub entries: Vec<OutlineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutlineItem {
    pub title: String,
    pub level: u8,
    pub block_index: usize,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Document {
            title: title.into(),
            metadata: DocumentMetadata::default(),
            blocks: Vec::new(),
            next_block_id: 1,
        }
    }

    pub fn with_blocks(title: impl Into<String>, blocks: Vec<Block>) -> Self {
        let mut document = Document::new(title);
        document.blocks = blocks;
        document.renumber();
        document
    }

    /// Append a block, giving paragraphs a fresh identifier
    pub fn push(&mut self, mut block: Block) {
        self.assign_id(&mut block);
        self.blocks.push(block);
    }

    pub fn push_paragraph(&mut self, text: impl Into<String>) {
        self.push(Block::Paragraph(Paragraph::new(vec![FormattedRun::plain(
            text,
        )])));
    }

    /// Reassign every paragraph identifier, e.g. after deserialization
    pub fn renumber(&mut self) {
        self.next_block_id = 1;
        let mut blocks = std::mem::take(&mut self.blocks);
        for block in &mut blocks {
            self.assign_id(block);
        }
        self.blocks = blocks;
    }

    pub(crate) fn allocate_id(&mut self) -> BlockId {
        let id = self.next_block_id.max(1);
        self.next_block_id = id + 1;
        id
    }

    fn assign_id(&mut self, block: &mut Block) {
        match block {
            Block::Paragraph(paragraph) => paragraph.id = self.allocate_id(),
            Block::Table { table } => table.id = self.allocate_id(),
            _ => {}
        }
    }

    pub(crate) fn position_of(&self, id: BlockId) -> Option<usize> {
        self.blocks
            .iter()
            .position(|block| matches!(block, Block::Paragraph(p) if p.id == id))
    }

    pub fn paragraph(&self, id: BlockId) -> Option<&Paragraph> {
        self.blocks.iter().find_map(|block| match block {
            Block::Paragraph(p) if p.id == id => Some(p),
            _ => None,
        })
    }

    pub fn table(&self, id: BlockId) -> Option<&TableData> {
        self.tables().find(|table| table.id == id)
    }

    pub fn table_mut(&mut self, id: BlockId) -> Option<&mut TableData> {
        self.blocks.iter_mut().find_map(|block| match block {
            Block::Table { table } if table.id == id => Some(table),
            _ => None,
        })
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Make foreign blocks safe to insert: fresh paragraph ids and object
    /// names that do not collide with the ones already present
    pub(crate) fn adopt(&mut self, mut blocks: Vec<Block>) -> Vec<Block> {
        let mut taken: HashSet<String> = self
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Object(object) => Some(object.name.clone()),
                _ => None,
            })
            .collect();

        for block in &mut blocks {
            match block {
                Block::Paragraph(paragraph) => paragraph.id = self.allocate_id(),
                Block::Table { table } => table.id = self.allocate_id(),
                Block::Object(object) => {
                    if taken.contains(&object.name) {
                        let mut suffix = 2;
                        while taken.contains(&format!("{}_{suffix}", object.name)) {
                            suffix += 1;
                        }
                        object.name = format!("{}_{suffix}", object.name);
                    }
                    taken.insert(object.name.clone());
                }
                _ => {}
            }
        }
        blocks
    }

    /// Embedded objects of one kind, in document order
    pub fn embedded_objects(&self, kind: ObjectKind) -> Vec<&EmbeddedObject> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Object(object) if object.kind == kind => Some(object),
                _ => None,
            })
            .collect()
    }

    pub fn embedded_objects_mut(&mut self, kind: ObjectKind) -> Vec<&mut EmbeddedObject> {
        self.blocks
            .iter_mut()
            .filter_map(|block| match block {
                Block::Object(object) if object.kind == kind => Some(object),
                _ => None,
            })
            .collect()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableData> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table { table } => Some(table),
            _ => None,
        })
    }

    /// Rebuild the entries of every table of contents from the current outline
    pub fn update_indexes(&mut self) -> usize {
        let outline = super::query::generate_outline(self);
        let mut updated = 0;
        for block in &mut self.blocks {
            if let Block::TableOfContents(toc) = block {
                toc.entries = outline.clone();
                updated += 1;
            }
        }
        updated
    }

    pub fn word_count(&self) -> usize {
        self.paragraphs()
            .map(|p| p.text().split_whitespace().count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consolidate_runs_merges_equal_formatting() {
        let runs = vec![
            FormattedRun::plain("Hello "),
            FormattedRun::plain("world"),
            FormattedRun {
                text: "!".to_string(),
                formatting: TextFormatting {
                    bold: true,
                    ..Default::default()
                },
            },
        ];
        let merged = FormattedRun::consolidate_runs(runs);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "Hello world");
    }

    #[test]
    fn test_adopt_renames_colliding_objects() {
        let mut document = Document::new("host");
        document.push(Block::Object(EmbeddedObject::formula("Formula1", "a")));

        let adopted = document.adopt(vec![
            Block::Object(EmbeddedObject::formula("Formula1", "b")),
            Block::Paragraph(Paragraph::new(vec![FormattedRun::plain("x")])),
        ]);

        match &adopted[0] {
            Block::Object(object) => assert_eq!(object.name, "Formula1_2"),
            other => panic!("unexpected block {other:?}"),
        }
        match &adopted[1] {
            Block::Paragraph(p) => assert!(p.id > 0),
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[test]
    fn test_table_cells_are_addressable() {
        let mut document = Document::new("doc");
        document.push(Block::Table {
            table: TableData::new(
                vec![TableCell::new("Name"), TableCell::new("Value")],
                vec![vec![TableCell::new("author"), TableCell::new("%AUTHOR%")]],
            ),
        });
        let id = document.tables().next().unwrap().id;
        assert!(id > 0);

        let positions: Vec<CellRef> = document
            .table(id)
            .unwrap()
            .cells()
            .map(|(at, _)| at)
            .collect();
        assert_eq!(positions.len(), 4);
        assert_eq!(positions[3], CellRef { row: 1, column: 1 });

        let cell = document
            .table_mut(id)
            .unwrap()
            .cell_mut(CellRef { row: 1, column: 1 })
            .unwrap();
        cell.content = "R. Writer".to_string();
        assert_eq!(
            document
                .table(id)
                .unwrap()
                .cell(CellRef { row: 1, column: 1 })
                .unwrap()
                .content,
            "R. Writer"
        );
        assert!(document.table(id).unwrap().cell(CellRef { row: 2, column: 0 }).is_none());
    }

    #[test]
    fn test_property_access_errors() {
        let mut object = EmbeddedObject::formula("Formula1", "a + b");
        assert_eq!(object.get_text_property(FORMULA_PROPERTY).unwrap(), "a + b");

        object.set_property(FORMULA_PROPERTY, PropertyValue::Integer(3));
        assert!(object.get_text_property(FORMULA_PROPERTY).is_err());
        assert!(object.get_property("Missing").is_err());
    }

    #[test]
    fn test_update_indexes_fills_entries() {
        let mut document = Document::with_blocks(
            "doc",
            vec![
                Block::TableOfContents(TableOfContents {
                    title: "Contents".to_string(),
                    entries: vec![],
                }),
                Block::Paragraph(Paragraph::heading(1, "Intro")),
                Block::Paragraph(Paragraph::heading(2, "Details")),
            ],
        );
        assert_eq!(document.update_indexes(), 1);
        match &document.blocks[0] {
            Block::TableOfContents(toc) => {
                assert_eq!(toc.entries.len(), 2);
                assert_eq!(toc.entries[1].title, "Details");
                assert_eq!(toc.entries[1].level, 2);
            }
            other => panic!("unexpected block {other:?}"),
        }
    }
}
