//! File I/O operations and validation
//!
//! Loading dispatches on the file extension, saving picks the output format
//! the same way. `DocumentLoader` resolves include paths and hands out
//! documents that count as open until they are dropped.

use anyhow::{Context, Result, bail};
use std::cell::Cell;
use std::fs::{self, File};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

use super::export::{ExportFormat, export_document};
use super::models::Document;
use super::text::parse_fragment;
use crate::error::TemplaterError;

/// Validates that the file is a legitimate .docx file
pub(crate) fn validate_docx_file(file_path: &Path) -> Result<()> {
    let extension = extension_of(file_path);
    if extension != "docx" {
        bail!(
            "Invalid file format. Expected .docx file, got .{}\n\
            Note: only Word .docx files are supported (not .doc, .xlsx, .zip, etc.)",
            extension
        );
    }

    // Check ZIP structure contains word/document.xml
    let file = File::open(file_path)?;
    let mut archive = ZipArchive::new(file)?;

    if archive.by_name("word/document.xml").is_err() {
        if archive.by_name("xl/workbook.xml").is_ok() {
            bail!(
                "This appears to be an Excel file (.xlsx).\n\
                Only Word documents (.docx) can be imported."
            );
        }

        bail!(
            "Invalid .docx file: missing word/document.xml\n\
            This file may be corrupted or is not a valid Word document."
        );
    }

    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Load a document: `.json` snapshot, `.docx` import, anything else plain text
pub fn load_document(file_path: &Path) -> Result<Document> {
    let load_error = |reason: String| TemplaterError::Load {
        path: file_path.to_path_buf(),
        reason,
    };

    let document = match extension_of(file_path).as_str() {
        "json" => {
            let content = fs::read_to_string(file_path)
                .map_err(|error| load_error(error.to_string()))?;
            let mut document: Document = serde_json::from_str(&content)
                .map_err(|error| load_error(error.to_string()))?;
            document.renumber();
            document
        }
        "docx" => {
            super::loader::load_docx(file_path).map_err(|error| load_error(format!("{error:#}")))?
        }
        _ => {
            let content = fs::read_to_string(file_path)
                .map_err(|error| load_error(error.to_string()))?;
            let title = file_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled Document");
            let mut document = parse_fragment(title, &content);
            document.metadata.file_path = file_path.to_string_lossy().to_string();
            document.metadata.file_size = content.len() as u64;
            document
        }
    };

    Ok(document)
}

/// Save a document: `.json` snapshot, `.md` Markdown, anything else plain text
pub fn save_document(document: &Document, file_path: &Path) -> Result<()> {
    let content = match extension_of(file_path).as_str() {
        "json" => serde_json::to_string_pretty(document)?,
        "md" | "markdown" => export_document(document, ExportFormat::Markdown)?,
        _ => export_document(document, ExportFormat::Text)?,
    };

    fs::write(file_path, content)
        .with_context(|| format!("cannot write {}", file_path.display()))?;
    debug!("saved {}", file_path.display());
    Ok(())
}

/// Opens documents relative to a base directory and tracks how many are open
#[derive(Debug)]
pub struct DocumentLoader {
    base_dir: PathBuf,
    open: Cell<usize>,
}

impl DocumentLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        DocumentLoader {
            base_dir: base_dir.into(),
            open: Cell::new(0),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Absolute form of `path`; relative paths hang off the base directory
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path.trim());
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };
        std::path::absolute(&joined).unwrap_or(joined)
    }

    /// Load a document that stays open until the returned guard is dropped
    pub fn open_scoped(&self, path: &Path) -> Result<ScopedDocument<'_>> {
        let document = load_document(path)?;
        self.open.set(self.open.get() + 1);
        debug!(open = self.open.get(), "opened {}", path.display());
        Ok(ScopedDocument {
            document,
            loader: self,
        })
    }

    /// Documents opened through this loader and not yet closed
    pub fn open_documents(&self) -> usize {
        self.open.get()
    }
}

/// A secondary document that is closed on drop, on every exit path
#[derive(Debug)]
pub struct ScopedDocument<'a> {
    document: Document,
    loader: &'a DocumentLoader,
}

impl Deref for ScopedDocument<'_> {
    type Target = Document;

    fn deref(&self) -> &Document {
        &self.document
    }
}

impl DerefMut for ScopedDocument<'_> {
    fn deref_mut(&mut self) -> &mut Document {
        &mut self.document
    }
}

impl Drop for ScopedDocument<'_> {
    fn drop(&mut self) {
        let open = self.loader.open.get().saturating_sub(1);
        self.loader.open.set(open);
        debug!(open, "closed {}", self.document.title);
    }
}
