//! Document model, I/O and text addressing
//!
//! This module provides the in-memory document the macro engine and the
//! formula fixer work on, plus loading from `.docx`, `.json` snapshots and
//! plain-text fragments, and saving back to text, Markdown or JSON.

pub mod cleanup;
pub mod export;
pub mod io;
pub(crate) mod loader;
pub mod models;
pub(crate) mod parsing;
pub mod query;
pub mod range;
pub mod text;

// Re-export all models and query functions
pub use cleanup::anchor_objects_as_characters;
pub use export::{ExportFormat, export_document};
pub use io::{DocumentLoader, ScopedDocument, load_document, save_document};
pub use models::*;
pub use query::*;
pub use range::{Edit, EditKind, TextRange};
pub use text::parse_fragment;
