//! Word document import
//!
//! Paragraphs keep their run formatting, heading styles become outline
//! levels, tables become table blocks and every drawing becomes an image
//! object placed after the paragraph that anchors it.

use anyhow::Result;
use std::path::Path;
use tracing::debug;

use super::io::validate_docx_file;
use super::models::*;
use super::parsing::formatting::{count_run_drawings, extract_run_formatting, extract_run_text};
use super::parsing::heading::detect_heading_from_paragraph_style;
use super::parsing::table::extract_table_data;

pub(crate) fn load_docx(file_path: &Path) -> Result<Document> {
    validate_docx_file(file_path)?;

    let file_data = std::fs::read(file_path)?;
    let docx = docx_rs::read_docx(&file_data)?;

    let title = file_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled Document")
        .to_string();

    let mut blocks = Vec::new();
    let mut image_count = 0;

    for child in &docx.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(para) => {
                let mut formatted_runs = Vec::new();
                let mut drawings = 0;

                for child in &para.children {
                    let runs: Vec<&docx_rs::Run> = match child {
                        docx_rs::ParagraphChild::Run(run) => vec![run.as_ref()],
                        docx_rs::ParagraphChild::Insert(insert) => insert
                            .children
                            .iter()
                            .filter_map(|child| match child {
                                docx_rs::InsertChild::Run(run) => Some(run.as_ref()),
                                _ => None,
                            })
                            .collect(),
                        _ => Vec::new(),
                    };

                    for run in runs {
                        drawings += count_run_drawings(run);
                        let text = extract_run_text(run);
                        if !text.is_empty() {
                            formatted_runs.push(FormattedRun {
                                text,
                                formatting: extract_run_formatting(run),
                            });
                        }
                    }
                }

                let runs = FormattedRun::consolidate_runs(formatted_runs);
                let has_text = runs.iter().any(|run| !run.text.trim().is_empty());
                if has_text {
                    let outline_level = detect_heading_from_paragraph_style(para);
                    blocks.push(Block::Paragraph(Paragraph {
                        style: para.property.style.as_ref().map(|style| style.val.clone()),
                        outline_level,
                        runs,
                        ..Default::default()
                    }));
                }

                for _ in 0..drawings {
                    image_count += 1;
                    blocks.push(Block::Object(EmbeddedObject::image(
                        format!("Image{image_count}"),
                        format!("Image {image_count}"),
                    )));
                }
            }
            docx_rs::DocumentChild::Table(table) => {
                if let Some(table_block) = extract_table_data(table) {
                    blocks.push(table_block);
                }
            }
            _ => {}
        }
    }

    let mut document = Document::with_blocks(title, blocks);
    document.metadata = DocumentMetadata {
        file_path: file_path.to_string_lossy().to_string(),
        file_size: std::fs::metadata(file_path)?.len(),
        author: None,
    };
    debug!(
        blocks = document.blocks.len(),
        images = image_count,
        "imported {}",
        file_path.display()
    );

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_built_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.docx");
        let file = std::fs::File::create(&path).unwrap();

        docx_rs::Docx::new()
            .add_paragraph(
                docx_rs::Paragraph::new()
                    .add_run(docx_rs::Run::new().add_text("Overview"))
                    .style("Heading1"),
            )
            .add_paragraph(
                docx_rs::Paragraph::new()
                    .add_run(docx_rs::Run::new().add_text("Written in "))
                    .add_run(docx_rs::Run::new().add_text("%YEAR%").bold()),
            )
            .build()
            .pack(file)
            .unwrap();

        let document = load_docx(&path).unwrap();
        let paragraphs: Vec<&Paragraph> = document.paragraphs().collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].outline_level, Some(1));
        assert!(paragraphs[1].text().starts_with("Written in"));
        assert!(paragraphs[1].text().ends_with("%YEAR%"));
        assert!(paragraphs[1].runs[1].formatting.bold);
        assert_eq!(document.title, "part");
    }
}
