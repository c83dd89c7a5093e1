//! Rendering documents as Markdown or plain text
//!
//! The Markdown form is readable back with the fragment parser: formulas
//! stay `$$ ... $$` paragraphs and images stay `![description](path)` lines.

use anyhow::Result;
use std::fmt::Write;

use super::models::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Text,
}

pub fn export_document(document: &Document, format: ExportFormat) -> Result<String> {
    let mut output = String::new();

    for (index, block) in document.blocks.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        match block {
            Block::Paragraph(paragraph) => write_paragraph(&mut output, paragraph, format)?,
            Block::Table { table } => write_table(&mut output, table, format)?,
            Block::Object(object) => write_object(&mut output, object, format)?,
            Block::TableOfContents(toc) => write_contents(&mut output, toc, format)?,
            Block::PageBreak => match format {
                ExportFormat::Markdown => writeln!(output, "---")?,
                ExportFormat::Text => writeln!(output, "\u{c}")?,
            },
        }
    }

    Ok(output)
}

fn write_paragraph(output: &mut String, paragraph: &Paragraph, format: ExportFormat) -> Result<()> {
    match (paragraph.outline_level, format) {
        (Some(level), ExportFormat::Markdown) => {
            writeln!(output, "{} {}", "#".repeat(level as usize), paragraph.text())?;
        }
        (Some(_), ExportFormat::Text) => {
            let text = paragraph.text();
            writeln!(output, "{text}")?;
            writeln!(output, "{}", "-".repeat(text.chars().count()))?;
        }
        (None, ExportFormat::Markdown) => {
            for run in &paragraph.runs {
                output.push_str(&markdown_run(run));
            }
            output.push('\n');
        }
        (None, ExportFormat::Text) => writeln!(output, "{}", paragraph.text())?,
    }
    Ok(())
}

fn markdown_run(run: &FormattedRun) -> String {
    let text = run.text.as_str();
    if text.trim().is_empty() {
        return text.to_string();
    }

    let mut marker = String::new();
    if run.formatting.bold {
        marker.push_str("**");
    }
    if run.formatting.italic {
        marker.push('*');
    }
    let mut formatted = format!("{marker}{text}{marker}");
    if run.formatting.strikethrough {
        formatted = format!("~~{formatted}~~");
    }
    formatted
}

fn write_table(output: &mut String, table: &TableData, format: ExportFormat) -> Result<()> {
    if let Some(title) = &table.title {
        writeln!(output, "{title}")?;
    }

    let row_text = |cells: &[TableCell]| -> Vec<String> {
        cells.iter().map(|cell| cell.content.clone()).collect()
    };

    match format {
        ExportFormat::Markdown => {
            writeln!(output, "| {} |", row_text(table.headers.as_slice()).join(" | "))?;
            writeln!(output, "|{}", " --- |".repeat(table.headers.len()))?;
            for row in &table.rows {
                writeln!(output, "| {} |", row_text(row.as_slice()).join(" | "))?;
            }
        }
        ExportFormat::Text => {
            writeln!(output, "{}", row_text(table.headers.as_slice()).join("\t"))?;
            for row in &table.rows {
                writeln!(output, "{}", row_text(row.as_slice()).join("\t"))?;
            }
        }
    }
    Ok(())
}

fn write_object(output: &mut String, object: &EmbeddedObject, format: ExportFormat) -> Result<()> {
    let text = |property: &str| object.get_text_property(property).unwrap_or_default();

    match object.kind {
        ObjectKind::Formula => match format {
            ExportFormat::Markdown => writeln!(output, "$$ {} $$", text(FORMULA_PROPERTY))?,
            ExportFormat::Text => writeln!(output, "{}", text(FORMULA_PROPERTY))?,
        },
        ObjectKind::Image => match format {
            ExportFormat::Markdown => {
                writeln!(output, "![{}]({})", text("Description"), text("Path"))?
            }
            ExportFormat::Text => writeln!(output, "[Image: {}]", text("Description"))?,
        },
        ObjectKind::Chart => writeln!(output, "[Chart: {}]", object.name)?,
    }
    Ok(())
}

fn write_contents(output: &mut String, toc: &TableOfContents, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Markdown => writeln!(output, "**{}**", toc.title)?,
        ExportFormat::Text => writeln!(output, "{}", toc.title)?,
    }
    output.push('\n');
    for entry in &toc.entries {
        let indent = "  ".repeat(entry.level.saturating_sub(1) as usize);
        writeln!(output, "{indent}- {}", entry.title)?;
    }
    Ok(())
}
