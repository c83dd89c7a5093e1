//! Name to replacement-string resolution
//!
//! Three layers are consulted in a fixed order: built-in date and time
//! functions, document counters, then the user's static key/value pairs.
//! Reserved names are never answered by the static layer.

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local, NaiveDateTime};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::token::{is_reserved_name, key_name};
use crate::Locale;
use crate::document::DocumentCounts;

#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    statics: HashMap<String, String>,
    counters: HashMap<String, String>,
    locale: Locale,
    clock: Option<NaiveDateTime>,
}

impl LookupTable {
    pub fn new(locale: Locale) -> Self {
        LookupTable {
            locale,
            ..Default::default()
        }
    }

    /// Freeze the clock used by the date and time functions
    pub fn with_clock(mut self, clock: NaiveDateTime) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.statics.insert(key.into(), value.into());
    }

    /// Merge key/value pairs; later loads override earlier ones
    pub fn load_map<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.insert(key, value);
        }
    }

    /// Load a macro file in `java.util.Properties` format
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read macro file {}", path.display()))?;
        let pairs = parse_properties(&content);
        let count = pairs.len();
        self.load_map(pairs);
        debug!(count, file = %path.display(), "loaded static macros");
        Ok(count)
    }

    pub fn set_counters(&mut self, counts: DocumentCounts) {
        self.counters = HashMap::from([
            ("N_PAGES".to_string(), counts.pages.to_string()),
            ("N_FIGURES".to_string(), counts.figures.to_string()),
            ("N_TABLES".to_string(), counts.tables.to_string()),
            ("N_FORMULAS".to_string(), counts.formulas.to_string()),
        ]);
    }

    /// Whether the user supplied a value for this exact key
    pub fn contains_static(&self, key: &str) -> bool {
        self.statics.contains_key(key)
    }

    pub fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = self.builtin(key) {
            return Some(value);
        }
        if let Some(value) = self.counters.get(key) {
            return Some(value.clone());
        }
        if is_reserved_name(key_name(key)) {
            return None;
        }
        self.statics.get(key).cloned()
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.unwrap_or_else(|| Local::now().naive_local())
    }

    fn builtin(&self, key: &str) -> Option<String> {
        let now = self.now();
        let pattern = match key {
            "YEAR" => return Some(now.year().to_string()),
            "DATE" => self.locale.date_pattern().to_string(),
            "TIME" => self.locale.time_pattern().to_string(),
            "DATETIME" => format!(
                "{}, {}",
                self.locale.date_pattern(),
                self.locale.time_pattern()
            ),
            _ => key.strip_prefix("DATETIME(")?.strip_suffix(')')?.to_string(),
        };

        match format_date(&now, &pattern) {
            Ok(formatted) => Some(formatted),
            Err(error) => {
                debug!(key, %error, "date pattern rejected");
                None
            }
        }
    }
}

/// Parse `java.util.Properties` text: `=`, `:` or whitespace between key
/// and value, `#`/`!` comments, trailing `\` continues the line, and
/// backslash escapes including `\uXXXX`
fn parse_properties(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = line.to_string();
        while continues(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }
        pairs.push(split_property(&logical));
    }

    pairs
}

/// An odd number of trailing backslashes joins the next line
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_property(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut escaped = false;

    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = index;
                value_start = index + 1;
                break;
            }
            c if c.is_whitespace() => {
                key_end = index;
                let rest = line[index..].trim_start();
                value_start = line.len() - rest.len();
                if rest.starts_with(['=', ':']) {
                    value_start += 1;
                }
                break;
            }
            _ => {}
        }
    }

    (
        unescape(&line[..key_end]),
        unescape(line[value_start..].trim_start()),
    )
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{0C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

/// Format with a `SimpleDateFormat`-style pattern (`dd.MM.yyyy HH:mm`)
pub fn format_date(moment: &NaiveDateTime, pattern: &str) -> Result<String> {
    let strftime = translate_date_pattern(pattern)?;
    Ok(moment.format(&strftime).to_string())
}

/// Translate pattern letters into chrono's strftime syntax
pub fn translate_date_pattern(pattern: &str) -> Result<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            loop {
                match chars.get(i) {
                    None => bail!("unterminated quote in date pattern '{pattern}'"),
                    Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                        out.push('\'');
                        i += 2;
                    }
                    Some('\'') => {
                        i += 1;
                        break;
                    }
                    Some(&literal) => {
                        push_literal(&mut out, literal);
                        i += 1;
                    }
                }
            }
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while chars.get(i + run) == Some(&c) {
            run += 1;
        }
        i += run;

        let spec = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('S', _) => "%3f",
            ('a', _) => "%p",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            _ => bail!("unsupported letter '{c}' in date pattern '{pattern}'"),
        };
        out.push_str(spec);
    }

    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 9)
            .unwrap()
    }

    #[test]
    fn test_builtins_follow_locale() {
        let english = LookupTable::new(Locale::En).with_clock(clock());
        assert_eq!(english.lookup("YEAR").as_deref(), Some("2024"));
        assert_eq!(english.lookup("DATE").as_deref(), Some("3/5/24"));
        assert_eq!(english.lookup("TIME").as_deref(), Some("2:07 PM"));
        assert_eq!(english.lookup("DATETIME").as_deref(), Some("3/5/24, 2:07 PM"));

        let russian = LookupTable::new(Locale::Ru).with_clock(clock());
        assert_eq!(russian.lookup("DATE").as_deref(), Some("05.03.2024"));
        assert_eq!(russian.lookup("TIME").as_deref(), Some("14:07"));
    }

    #[test]
    fn test_datetime_with_pattern() {
        let table = LookupTable::new(Locale::En).with_clock(clock());
        assert_eq!(
            table.lookup("DATETIME(yyyy-MM-dd HH:mm:ss)").as_deref(),
            Some("2024-03-05 14:07:09")
        );
        assert_eq!(
            table.lookup("DATETIME(EEEE, d MMMM yyyy)").as_deref(),
            Some("Tuesday, 5 March 2024")
        );
        assert_eq!(
            table.lookup("DATETIME('week of' dd.MM, 100%)").as_deref(),
            Some("week of 05.03, 100%")
        );
        assert_eq!(table.lookup("DATETIME(zzz)"), None);
    }

    #[test]
    fn test_builtins_win_over_statics() {
        let mut table = LookupTable::new(Locale::En).with_clock(clock());
        table.insert("YEAR", "1999");
        table.insert("AUTHOR", "A. Author");
        assert_eq!(table.lookup("YEAR").as_deref(), Some("2024"));
        assert_eq!(table.lookup("AUTHOR").as_deref(), Some("A. Author"));
        assert_eq!(table.lookup("MISSING"), None);
    }

    #[test]
    fn test_counters_win_over_statics() {
        let mut table = LookupTable::new(Locale::En);
        table.insert("N_TABLES", "99");
        table.set_counters(DocumentCounts {
            pages: 3,
            figures: 2,
            tables: 1,
            formulas: 0,
        });
        assert_eq!(table.lookup("N_TABLES").as_deref(), Some("1"));
        assert_eq!(table.lookup("N_PAGES").as_deref(), Some("3"));
    }

    #[test]
    fn test_reserved_names_never_resolve_from_statics() {
        let mut table = LookupTable::new(Locale::En);
        table.insert("TOC", "fake");
        table.insert("MAIN_TEXT", "fake");
        table.insert("INCLUDE(a.txt)", "fake");

        assert!(table.contains_static("TOC"));
        assert_eq!(table.lookup("TOC"), None);
        assert_eq!(table.lookup("MAIN_TEXT"), None);
        assert_eq!(table.lookup("INCLUDE(a.txt)"), None);
    }

    #[test]
    fn test_properties_file_format() {
        let pairs = parse_properties(
            "# comment\n! also comment\n\nTITLE = Annual report\nEMPTY=\nURL=a=b\nbroken line\n",
        );
        assert_eq!(
            pairs,
            vec![
                ("TITLE".to_string(), "Annual report".to_string()),
                ("EMPTY".to_string(), String::new()),
                ("URL".to_string(), "a=b".to_string()),
                ("broken".to_string(), "line".to_string()),
            ]
        );
    }

    #[test]
    fn test_properties_separators_continuations_and_escapes() {
        let pairs = parse_properties(concat!(
            "AUTHOR: R. Writer\n",
            "TITLE=Annual \\\n",
            "    report\n",
            "PATH=C\\:\\\\docs\n",
            "GREEK=\\u03B1\\tb\n",
            "key\\ with\\ space = v\n",
        ));
        assert_eq!(
            pairs,
            vec![
                ("AUTHOR".to_string(), "R. Writer".to_string()),
                ("TITLE".to_string(), "Annual report".to_string()),
                ("PATH".to_string(), "C:\\docs".to_string()),
                ("GREEK".to_string(), "\u{03B1}\tb".to_string()),
                ("key with space".to_string(), "v".to_string()),
            ]
        );
    }

    #[test]
    fn test_load_file_later_loads_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.properties");
        fs::write(&path, "AUTHOR=First\nTITLE=Report\n").unwrap();

        let mut table = LookupTable::new(Locale::En);
        assert_eq!(table.load_file(&path).unwrap(), 2);
        table.load_map([("AUTHOR", "Second")]);
        assert_eq!(table.lookup("AUTHOR").as_deref(), Some("Second"));
        assert_eq!(table.lookup("TITLE").as_deref(), Some("Report"));
    }
}
