use anyhow::Result;
use regex::Regex;
use tracing::debug;

use super::substitutor::{Substitution, Substitutor, Verdict};
use super::token::{MACRO_PATTERN, Macro};
use crate::context::{DiagnosticKind, RunContext};
use crate::document::{Document, TextRange, search_document};
use crate::progress::ProgressInformer;

/// Outcome of one scan-and-substitute pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub scanned: usize,
    pub substituted: usize,
    pub skipped: usize,
}

/// Scans a document for macro occurrences and hands each one to the first
/// accepting handler
///
/// All occurrences are found up front; the remaining ones are rebased
/// after every edit so they keep pointing at their text.
pub struct MacroSubstitutionEngine<'a> {
    handlers: Vec<Substitutor<'a>>,
    pattern: Regex,
}

impl<'a> MacroSubstitutionEngine<'a> {
    pub fn new(handlers: Vec<Substitutor<'a>>) -> Self {
        Self::with_pattern(MACRO_PATTERN.clone(), handlers)
    }

    /// Restrict the scan to occurrences matching `pattern`
    pub fn with_pattern(pattern: Regex, handlers: Vec<Substitutor<'a>>) -> Self {
        MacroSubstitutionEngine { handlers, pattern }
    }

    pub fn run(
        &mut self,
        document: &mut Document,
        context: &mut RunContext,
        progress: &mut dyn ProgressInformer,
    ) -> Result<PassReport> {
        let mut pending: Vec<Option<TextRange>> = search_document(document, &self.pattern)
            .into_iter()
            .map(Some)
            .collect();
        let total = pending.len();
        let mut report = PassReport {
            scanned: total,
            ..Default::default()
        };

        for index in 0..total {
            progress.inform(Some(index + 1), Some(total));

            let Some(range) = pending[index] else {
                report.skipped += 1;
                continue;
            };
            let raw = document.range_text(&range)?;
            let Some(token) = Macro::parse(&raw) else {
                report.skipped += 1;
                continue;
            };

            match self.dispatch(document, context, &range, &token)? {
                Some(Substitution::Applied(edit)) => {
                    report.substituted += 1;
                    for later in pending[index + 1..].iter_mut() {
                        *later = later.and_then(|range| range.rebase(&edit));
                    }
                }
                Some(Substitution::Skipped) => report.skipped += 1,
                None => {
                    report.skipped += 1;
                    if !token.is_forbidden() {
                        context.warn(
                            DiagnosticKind::UnresolvedMacro,
                            &token.raw,
                            "no substitution is defined",
                        );
                    }
                }
            }
        }

        debug!(?report, "macro pass finished");
        Ok(report)
    }

    fn dispatch(
        &mut self,
        document: &mut Document,
        context: &mut RunContext,
        range: &TextRange,
        token: &Macro,
    ) -> Result<Option<Substitution>> {
        for handler in &mut self.handlers {
            match handler.check(token) {
                Verdict::Accept => {
                    return handler.substitute(document, context, range, token).map(Some);
                }
                Verdict::Decline => {}
                Verdict::Refuse { kind, detail } => context.warn(kind, &token.raw, detail),
            }
        }
        Ok(None)
    }
}
