//! Macro token grammar: `%NAME%` or `%NAME(ARG)%`

use once_cell::sync::Lazy;
use regex::Regex;

/// Every macro occurrence, whatever its name
pub static MACRO_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([A-Za-z0-9_]+?)(?:\((.*?)\))?%").expect("macro pattern"));

/// Only `%INCLUDE(path)%` occurrences
pub static INCLUDE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(INCLUDE)\((.*?)\)%").expect("include pattern"));

/// Only `%MAIN_TEXT%` occurrences
pub static MAIN_TEXT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(MAIN_TEXT)%").expect("main text pattern"));

static WHOLE_MACRO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%([A-Za-z0-9_]+?)(?:\((.*?)\))?%$").expect("macro pattern"));

pub const INCLUDE: &str = "INCLUDE";
pub const MAIN_TEXT: &str = "MAIN_TEXT";
pub const TOC: &str = "TOC";

/// Names owned by structural handlers; user key/value pairs never resolve them
const RESERVED_NAMES: [&str; 3] = [TOC, MAIN_TEXT, INCLUDE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    /// The occurrence as it appears in the text, delimiters included
    pub raw: String,
    pub name: String,
    pub argument: Option<String>,
}

impl Macro {
    /// Parse one complete occurrence such as `%DATETIME(yyyy)%`
    pub fn parse(raw: &str) -> Option<Macro> {
        let captures = WHOLE_MACRO.captures(raw)?;
        Some(Macro {
            raw: raw.to_string(),
            name: captures.get(1)?.as_str().to_string(),
            argument: captures.get(2).map(|arg| arg.as_str().to_string()),
        })
    }

    /// Key used against the lookup table: `NAME` or `NAME(ARG)`
    pub fn key(&self) -> String {
        match &self.argument {
            Some(argument) => format!("{}({argument})", self.name),
            None => self.name.clone(),
        }
    }

    pub fn is_forbidden(&self) -> bool {
        is_reserved_name(&self.name)
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name && self.argument.is_none()
    }
}

pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Name part of a lookup key, `DATETIME(yy)` -> `DATETIME`
pub fn key_name(key: &str) -> &str {
    key.split_once('(').map_or(key, |(name, _)| name)
}
