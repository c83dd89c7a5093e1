//! StarMath formula repair
//!
//! Formulas converted from LaTeX arrive with two kinds of damage: expressions
//! cut at line wraps leave binary operators without an operand next to a
//! `#` or brace, and styled letters arrive as raw Unicode code points instead
//! of StarMath control words. `fix_formula` undoes both.
//!
//! The phases run in a fixed order. Accents are rewritten while their base is
//! still the raw code point, and operator repair runs last because it only
//! recognizes the ASCII tokens produced by the phases before it.

mod charmap;
mod processor;

pub use charmap::canonicalize_characters;
pub use processor::fix_document_formulas;

use once_cell::sync::Lazy;
use regex::Regex;

/// A compiled rewrite applied with `Regex::replace_all`
pub struct ReplacementRule {
    pattern: Regex,
    rewrite: String,
}

impl ReplacementRule {
    fn new(pattern: &str, rewrite: impl Into<String>) -> Self {
        ReplacementRule {
            pattern: Regex::new(pattern).expect("replacement rule pattern must compile"),
            rewrite: rewrite.into(),
        }
    }

    pub fn apply(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.rewrite.as_str())
            .into_owned()
    }
}

/// Combining marks and the accent attribute StarMath uses for them
const ACCENTS: &[(char, &str)] = &[
    ('\u{0300}', "grave"),
    ('\u{0301}', "acute"),
    ('\u{0302}', "hat"),
    ('\u{0303}', "tilde"),
    ('\u{0304}', "bar"),
    ('\u{0305}', "widebar"),
    ('\u{0306}', "breve"),
    ('\u{0307}', "dot"),
    ('\u{0308}', "ddot"),
    ('\u{030A}', "circle"),
    ('\u{030C}', "check"),
    ('\u{035E}', "overline"),
    ('\u{035F}', "underline"),
    ('\u{0360}', "widetilde"),
];

static ACCENT_RULES: Lazy<Vec<ReplacementRule>> = Lazy::new(|| {
    ACCENTS
        .iter()
        .map(|&(mark, accent)| {
            ReplacementRule::new(
                &format!(r"(\S{{1,2}})\s*csup\s*\x{{{:04X}}}", mark as u32),
                format!("{{{accent} ${{1}}}}"),
            )
        })
        .collect()
});

static KEYWORD_RULES: Lazy<Vec<ReplacementRule>> = Lazy::new(|| {
    vec![
        ReplacementRule::new(r"left\s+mline", "left lline"),
        ReplacementRule::new(r"right\s+mline", "right rline"),
    ]
});

/// A wrap boundary or opening brace directly followed by a binary operator
static LEFT_CONTINUATION: Lazy<ReplacementRule> = Lazy::new(|| {
    ReplacementRule::new(r"([#{])\s*([*/&|=<>,]|cdot|times|div)", "${1} {} ${2}")
});

/// A binary operator directly followed by a wrap boundary or closing brace
static RIGHT_CONTINUATION: Lazy<ReplacementRule> = Lazy::new(|| {
    ReplacementRule::new(
        r"([+\-/&|=<>]|cdot|times|div|plusminus|minusplus)\s*([#}])",
        "${1} {} ${2}",
    )
});

fn apply_all(rules: &[ReplacementRule], input: &str) -> String {
    rules
        .iter()
        .fold(input.to_string(), |text, rule| rule.apply(&text))
}

/// Rewrite `base csup <combining mark>` into the matching accent attribute
///
/// Stacked accents need one round per level, since a match consumes the
/// base the next accent applies to. Every round removes a `csup`.
pub fn fix_accents(formula: &str) -> String {
    let mut text = formula.to_string();
    loop {
        let next = apply_all(&ACCENT_RULES, &text);
        if next == text {
            return text;
        }
        text = next;
    }
}

/// Correct bracket keywords the converter spells wrong
pub fn fix_keywords(formula: &str) -> String {
    apply_all(&KEYWORD_RULES, formula)
}

/// Insert empty groups where a wrap left an operator without an operand
pub fn fix_operators(formula: &str) -> String {
    let left = LEFT_CONTINUATION.apply(formula);
    RIGHT_CONTINUATION.apply(&left)
}

/// Repair one formula; applying it twice gives the same result as once
pub fn fix_formula(formula: &str) -> String {
    let text = fix_accents(formula);
    let text = fix_keywords(&text);
    let text = canonicalize_characters(&text);
    fix_operators(&text)
}
