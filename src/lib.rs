//! templater: composes generated documents from templates
//!
//! This library expands the `%NAME%` macro language inside documents,
//! splices included files and the main text into a template, and repairs
//! StarMath formulas damaged by an upstream conversion.

pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod formula;
pub mod macros;
pub mod progress;
pub mod templater;

use serde::{Deserialize, Serialize};

/// Locale of the date/time macros and generated titles
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
    De,
}

impl Locale {
    /// Short date pattern, in `SimpleDateFormat` letters
    pub fn date_pattern(&self) -> &'static str {
        match self {
            Locale::En => "M/d/yy",
            Locale::Ru => "dd.MM.yyyy",
            Locale::De => "dd.MM.yy",
        }
    }

    pub fn time_pattern(&self) -> &'static str {
        match self {
            Locale::En => "h:mm a",
            Locale::Ru | Locale::De => "HH:mm",
        }
    }

    pub fn toc_title(&self) -> &'static str {
        match self {
            Locale::En => "Contents",
            Locale::Ru => "Оглавление",
            Locale::De => "Inhaltsverzeichnis",
        }
    }
}

// Re-export commonly used types
pub use config::Config;
pub use context::{Diagnostic, DiagnosticKind, RunContext};
pub use document::Document;
pub use error::TemplaterError;
pub use formula::fix_formula;
pub use macros::{DEFAULT_INCLUDE_DEPTH_LIMIT, LookupTable, MacroSubstitutionEngine};
pub use templater::{RunOutcome, Templater};
