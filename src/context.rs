//! Per-run state
//!
//! Everything that must not leak from one processed document into the next
//! lives here: the memo of include directives whose files are missing, the
//! soft diagnostics gathered so far and the registry of fixed formulas.

use std::collections::HashSet;
use std::fmt;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// An `%INCLUDE(...)%` points at a file that does not exist
    MissingInclude,
    /// No handler knows the macro and it is not a reserved name
    UnresolvedMacro,
    /// A user-defined key tries to shadow a reserved macro
    ForbiddenOverride,
    /// A main text was given but the template has no `%MAIN_TEXT%`
    MissingMainText,
    /// `%MAIN_TEXT%` occurs more than once
    ExtraMainText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub macro_text: String,
    pub detail: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.macro_text.is_empty() {
            write!(f, "{}", self.detail)
        } else {
            write!(f, "{}: {}", self.macro_text, self.detail)
        }
    }
}

#[derive(Debug, Default)]
pub struct RunContext {
    known_missing: HashSet<String>,
    diagnostics: Vec<Diagnostic>,
    formulas: Vec<String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a soft problem and log it
    pub fn warn(
        &mut self,
        kind: DiagnosticKind,
        macro_text: impl Into<String>,
        detail: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            macro_text: macro_text.into(),
            detail: detail.into(),
        };
        warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn is_known_missing(&self, raw: &str) -> bool {
        self.known_missing.contains(raw)
    }

    /// Returns `false` if the directive was already memoized
    pub fn mark_missing(&mut self, raw: &str) -> bool {
        self.known_missing.insert(raw.to_string())
    }

    pub fn register_formula(&mut self, name: &str) {
        self.formulas.push(name.to_string());
    }

    pub fn formulas(&self) -> &[String] {
        &self.formulas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_memo_reports_first_insert_only() {
        let mut context = RunContext::new();
        assert!(context.mark_missing("%INCLUDE(a.txt)%"));
        assert!(!context.mark_missing("%INCLUDE(a.txt)%"));
        assert!(context.is_known_missing("%INCLUDE(a.txt)%"));
        assert!(!context.is_known_missing("%INCLUDE(b.txt)%"));
    }

    #[test]
    fn test_diagnostics_are_filtered_by_kind() {
        let mut context = RunContext::new();
        context.warn(DiagnosticKind::UnresolvedMacro, "%X%", "not defined");
        context.warn(DiagnosticKind::MissingInclude, "%INCLUDE(a)%", "not found");

        assert_eq!(context.diagnostics().len(), 2);
        assert_eq!(
            context
                .diagnostics_of(DiagnosticKind::UnresolvedMacro)
                .count(),
            1
        );
        assert_eq!(
            context.diagnostics()[0].to_string(),
            "%X%: not defined"
        );
    }
}
