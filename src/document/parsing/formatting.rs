//! Text extraction and formatting utilities
//!
//! This module handles extraction of text and formatting information
//! from docx-rs run elements.

use super::super::models::*;

/// Extract text from a run; drawings are reported separately by the loader
pub(crate) fn extract_run_text(run: &docx_rs::Run) -> String {
    let mut text = String::new();

    for child in &run.children {
        match child {
            docx_rs::RunChild::Text(text_elem) => {
                text.push_str(&text_elem.text);
            }
            docx_rs::RunChild::Tab(_) => {
                text.push('\t');
            }
            docx_rs::RunChild::Break(_) => {
                text.push('\n');
            }
            _ => {}
        }
    }

    text
}

/// Number of drawings (pictures, charts) anchored in a run
pub(crate) fn count_run_drawings(run: &docx_rs::Run) -> usize {
    run.children
        .iter()
        .filter(|child| matches!(child, docx_rs::RunChild::Drawing(_)))
        .count()
}

/// Extract formatting information from a run
pub(crate) fn extract_run_formatting(run: &docx_rs::Run) -> TextFormatting {
    let props = &run.run_property;
    let mut formatting = TextFormatting {
        bold: props.bold.is_some(),
        italic: props.italic.is_some(),
        underline: props.underline.is_some(),
        strikethrough: props.strike.is_some() || props.dstrike.is_some(),
        ..Default::default()
    };

    if let Some(color) = &props.color {
        // the value field is private; read it from the debug representation
        let color_debug = format!("{color:?}");
        if let Some(start) = color_debug.find("val: \"") {
            let search_from = start + 6;
            if let Some(end) = color_debug[search_from..].find('"') {
                formatting.color = Some(color_debug[search_from..search_from + end].to_string());
            }
        }
    }

    formatting
}
