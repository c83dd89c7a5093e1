//! Plain-text fragment format
//!
//! Paragraphs are separated by blank lines and consecutive lines are joined
//! with a space. A line starting with `#` is a heading whose level is the
//! number of `#`. A paragraph wrapped in `$$ ... $$` becomes a formula object
//! and a line of the form `![description](path)` an image object.

use once_cell::sync::Lazy;
use regex::Regex;

use super::models::*;

static IMAGE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!\[(.*)\]\((.*)\)$").expect("image line pattern"));

const MAX_HEADING_LEVEL: usize = 6;

pub fn parse_fragment(title: &str, content: &str) -> Document {
    let mut parser = FragmentParser::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            parser.flush();
        } else if let Some(level) = heading_level(line) {
            parser.flush();
            let text = line[level..].trim();
            parser
                .blocks
                .push(Block::Paragraph(Paragraph::heading(level as u8, text)));
        } else if let Some(captures) = IMAGE_LINE.captures(line) {
            parser.flush();
            parser.push_image(&captures[1], &captures[2]);
        } else {
            parser.lines.push(line.to_string());
        }
    }
    parser.flush();

    Document::with_blocks(title, parser.blocks)
}

fn heading_level(line: &str) -> Option<usize> {
    let level = line.chars().take_while(|&c| c == '#').count();
    let rest = &line[level..];
    if (1..=MAX_HEADING_LEVEL).contains(&level) && (rest.is_empty() || rest.starts_with(' ')) {
        Some(level)
    } else {
        None
    }
}

#[derive(Default)]
struct FragmentParser {
    blocks: Vec<Block>,
    lines: Vec<String>,
    formulas: usize,
    images: usize,
}

impl FragmentParser {
    fn flush(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.lines).join(" ");

        let formula = text
            .strip_prefix("$$")
            .and_then(|rest| rest.strip_suffix("$$"))
            .filter(|_| text.len() >= 4);
        match formula {
            Some(notation) => {
                self.formulas += 1;
                self.blocks.push(Block::Object(EmbeddedObject::formula(
                    format!("Formula{}", self.formulas),
                    notation.trim(),
                )));
            }
            None => self
                .blocks
                .push(Block::Paragraph(Paragraph::new(vec![FormattedRun::plain(
                    text,
                )]))),
        }
    }

    fn push_image(&mut self, description: &str, path: &str) {
        self.images += 1;
        let mut image = EmbeddedObject::image(format!("Image{}", self.images), description);
        image.set_property("Path", PropertyValue::Text(path.to_string()));
        self.blocks.push(Block::Object(image));
    }
}
