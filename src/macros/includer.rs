//! Recursive expansion of `%INCLUDE(path)%` and `%MAIN_TEXT%`
//!
//! Included files may include further files. Every pass splices one more
//! level of nesting, so the number of passes bounds the nesting depth; a
//! directive that survives the last pass means the nesting is too deep or
//! cyclic and the run is aborted.

use anyhow::Result;
use regex::Regex;
use tracing::{debug, info};

use super::engine::MacroSubstitutionEngine;
use super::substitutor::Substitutor;
use super::token::{INCLUDE_PATTERN, MAIN_TEXT_PATTERN};
use crate::context::{DiagnosticKind, RunContext};
use crate::document::{Block, Document, DocumentLoader, search_document};
use crate::error::TemplaterError;
use crate::progress::ProgressInformer;

pub const DEFAULT_INCLUDE_DEPTH_LIMIT: usize = 16;

pub struct DocumentIncluder<'a> {
    loader: &'a DocumentLoader,
    depth_limit: usize,
}

impl<'a> DocumentIncluder<'a> {
    pub fn new(loader: &'a DocumentLoader) -> Self {
        Self::with_depth_limit(loader, DEFAULT_INCLUDE_DEPTH_LIMIT)
    }

    pub fn with_depth_limit(loader: &'a DocumentLoader, depth_limit: usize) -> Self {
        DocumentIncluder {
            loader,
            depth_limit,
        }
    }

    /// Splice the main text, then expand includes to a fixed point
    ///
    /// Returns the number of include passes that found work to do.
    pub fn process(
        &self,
        document: &mut Document,
        main_text: Option<Vec<Block>>,
        context: &mut RunContext,
        progress: &mut dyn ProgressInformer,
    ) -> Result<usize> {
        if let Some(content) = main_text {
            progress.set_stage("Inserting main text");
            let mut engine = MacroSubstitutionEngine::with_pattern(
                MAIN_TEXT_PATTERN.clone(),
                vec![Substitutor::main_text(content)],
            );
            let report = engine.run(document, context, progress)?;
            if report.scanned == 0 {
                context.warn(
                    DiagnosticKind::MissingMainText,
                    "%MAIN_TEXT%",
                    "the template has no place for the main text",
                );
            }
        }

        progress.set_stage("Including documents");
        for pass in 0..self.depth_limit {
            if self.pending_includes(document, context)?.is_empty() {
                info!(passes = pass, "includes resolved");
                return Ok(pass);
            }

            let mut engine = MacroSubstitutionEngine::with_pattern(
                INCLUDE_PATTERN.clone(),
                vec![Substitutor::DocumentInclude {
                    loader: self.loader,
                }],
            );
            let report = engine.run(document, context, progress)?;
            debug!(pass = pass + 1, ?report, "include pass");
        }

        let pending = self.pending_includes(document, context)?;
        if let Some(first) = pending.into_iter().next() {
            return Err(TemplaterError::IncludeDepthExceeded {
                limit: self.depth_limit,
                pending: first,
            }
            .into());
        }
        Ok(self.depth_limit)
    }

    /// Include directives still in the text that are not known to be missing
    fn pending_includes(&self, document: &Document, context: &RunContext) -> Result<Vec<String>> {
        pending_matches(document, &INCLUDE_PATTERN, context)
    }
}

fn pending_matches(
    document: &Document,
    pattern: &Regex,
    context: &RunContext,
) -> Result<Vec<String>> {
    let mut pending = Vec::new();
    for range in search_document(document, pattern) {
        let raw = document.range_text(&range)?;
        if !context.is_known_missing(&raw) {
            pending.push(raw);
        }
    }
    Ok(pending)
}
