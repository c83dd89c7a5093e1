//! Post-processing and cleanup utilities
//!
//! Helpers applied to documents after loading: page estimation and
//! normalization of embedded objects before they are spliced elsewhere.

use tracing::debug;

use super::models::*;

pub(crate) fn estimate_page_count(word_count: usize) -> usize {
    // Rough estimate: 250 words per page
    (word_count as f32 / 250.0).ceil() as usize
}

/// Anchor every formula and image as a character so it travels with the
/// surrounding text once the content is inserted into a template
pub fn anchor_objects_as_characters(document: &mut Document) -> usize {
    let mut anchored = 0;
    for kind in [ObjectKind::Formula, ObjectKind::Image] {
        for object in document.embedded_objects_mut(kind) {
            object.set_property(
                ANCHOR_PROPERTY,
                PropertyValue::Text("AsCharacter".to_string()),
            );
            anchored += 1;
        }
    }
    debug!(anchored, "anchored objects as characters");
    anchored
}

/// Drop paragraphs that contain nothing but whitespace
pub(crate) fn drop_blank_paragraphs(blocks: Vec<Block>) -> Vec<Block> {
    blocks
        .into_iter()
        .filter(|block| match block {
            Block::Paragraph(p) => !p.text().trim().is_empty(),
            _ => true,
        })
        .collect()
}
