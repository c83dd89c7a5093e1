//! Heading detection from Word paragraph styles

const MAX_OUTLINE_LEVEL: u32 = 9;

/// Outline level of a paragraph styled `Heading1`, `heading 2`, ...
pub(crate) fn detect_heading_from_paragraph_style(para: &docx_rs::Paragraph) -> Option<u8> {
    let style = para.property.style.as_ref()?;
    heading_level_from_style(&style.val)
}

pub(crate) fn heading_level_from_style(style: &str) -> Option<u8> {
    if !(style.starts_with("Heading") || style.starts_with("heading")) {
        return None;
    }

    let digits: String = style.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u32>() {
        Ok(level) if level >= 1 => Some(level.min(MAX_OUTLINE_LEVEL) as u8),
        // Default to level 1 for unnumbered heading styles
        _ => Some(1),
    }
}
