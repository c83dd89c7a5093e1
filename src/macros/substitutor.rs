//! Handlers the engine dispatches macro occurrences to
//!
//! A handler first judges an occurrence (`check`) and, if it accepts, gets
//! to rewrite it (`substitute`). The engine tries handlers in list order and
//! stops at the first one that accepts.

use anyhow::Result;
use tracing::{debug, info};

use super::lookup::LookupTable;
use super::token::{INCLUDE, MAIN_TEXT, Macro, TOC};
use crate::context::{DiagnosticKind, RunContext};
use crate::document::{Block, Document, DocumentLoader, Edit, TableOfContents, TextRange};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Decline,
    /// Declined, and the occurrence deserves a warning of its own
    Refuse { kind: DiagnosticKind, detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substitution {
    Applied(Edit),
    /// Accepted but deliberately left in place
    Skipped,
}

pub enum Substitutor<'a> {
    /// `%INCLUDE(path)%`: splice another document
    DocumentInclude { loader: &'a DocumentLoader },
    /// `%MAIN_TEXT%`: splice the main content, once
    MainTextInclude { content: Vec<Block>, used: bool },
    /// Any key the lookup table resolves
    StringMacro { lookup: &'a LookupTable },
    /// `%TOC%`: insert a generated table of contents
    TableOfContents { title: String },
}

impl<'a> Substitutor<'a> {
    pub fn main_text(content: Vec<Block>) -> Self {
        Substitutor::MainTextInclude {
            content,
            used: false,
        }
    }

    pub fn check(&self, token: &Macro) -> Verdict {
        let accepted = match self {
            Substitutor::DocumentInclude { .. } => {
                token.name == INCLUDE && token.argument.is_some()
            }
            Substitutor::MainTextInclude { .. } => token.is(MAIN_TEXT),
            Substitutor::TableOfContents { .. } => token.is(TOC),
            Substitutor::StringMacro { lookup } => {
                let key = token.key();
                if token.is_forbidden() {
                    if lookup.contains_static(&key) || lookup.contains_static(&token.name) {
                        return Verdict::Refuse {
                            kind: DiagnosticKind::ForbiddenOverride,
                            detail: format!("'{key}' is reserved and cannot be redefined"),
                        };
                    }
                    false
                } else {
                    lookup.lookup(&key).is_some()
                }
            }
        };

        if accepted {
            Verdict::Accept
        } else {
            Verdict::Decline
        }
    }

    pub fn substitute(
        &mut self,
        document: &mut Document,
        context: &mut RunContext,
        range: &TextRange,
        token: &Macro,
    ) -> Result<Substitution> {
        match self {
            Substitutor::DocumentInclude { loader } => {
                include_file(loader, document, context, range, token)
            }
            Substitutor::MainTextInclude { content, used } => {
                if *used {
                    context.warn(
                        DiagnosticKind::ExtraMainText,
                        &token.raw,
                        "main text is already inserted; occurrence left as is",
                    );
                    return Ok(Substitution::Skipped);
                }
                *used = true;
                let edit = document.splice_blocks(range, std::mem::take(content))?;
                info!("inserted main text");
                Ok(Substitution::Applied(edit))
            }
            Substitutor::StringMacro { lookup } => match lookup.lookup(&token.key()) {
                Some(value) => {
                    debug!(token = %token.raw, value = %value, "substituted");
                    Ok(Substitution::Applied(document.replace_text(range, &value)?))
                }
                None => Ok(Substitution::Skipped),
            },
            Substitutor::TableOfContents { title } => {
                let toc = Block::TableOfContents(TableOfContents {
                    title: title.clone(),
                    entries: Vec::new(),
                });
                let edit = document.splice_blocks(range, vec![toc])?;
                document.update_indexes();
                Ok(Substitution::Applied(edit))
            }
        }
    }
}

fn include_file(
    loader: &DocumentLoader,
    document: &mut Document,
    context: &mut RunContext,
    range: &TextRange,
    token: &Macro,
) -> Result<Substitution> {
    if context.is_known_missing(&token.raw) {
        return Ok(Substitution::Skipped);
    }

    let path = loader.resolve(token.argument.as_deref().unwrap_or_default());
    if !path.is_file() {
        if context.mark_missing(&token.raw) {
            context.warn(
                DiagnosticKind::MissingInclude,
                &token.raw,
                format!("file {} does not exist", path.display()),
            );
        }
        return Ok(Substitution::Skipped);
    }

    let included = loader.open_scoped(&path)?;
    let edit = document.splice_blocks(range, included.blocks.clone())?;
    info!("included {}", path.display());
    Ok(Substitution::Applied(edit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Locale;

    fn token(raw: &str) -> Macro {
        Macro::parse(raw).unwrap()
    }

    #[test]
    fn test_structural_handlers_accept_only_their_name() {
        let toc = Substitutor::TableOfContents {
            title: "Contents".to_string(),
        };
        assert_eq!(toc.check(&token("%TOC%")), Verdict::Accept);
        assert_eq!(toc.check(&token("%TOC(x)%")), Verdict::Decline);

        let main = Substitutor::main_text(Vec::new());
        assert_eq!(main.check(&token("%MAIN_TEXT%")), Verdict::Accept);
        assert_eq!(main.check(&token("%YEAR%")), Verdict::Decline);

        let loader = DocumentLoader::new(".");
        let include = Substitutor::DocumentInclude { loader: &loader };
        assert_eq!(include.check(&token("%INCLUDE(a.txt)%")), Verdict::Accept);
        assert_eq!(include.check(&token("%INCLUDE%")), Verdict::Decline);
    }

    #[test]
    fn test_string_macro_refuses_reserved_keys() {
        let mut lookup = LookupTable::new(Locale::En);
        lookup.insert("TOC", "fake");
        lookup.insert("AUTHOR", "me");
        let handler = Substitutor::StringMacro { lookup: &lookup };

        assert!(matches!(
            handler.check(&token("%TOC%")),
            Verdict::Refuse {
                kind: DiagnosticKind::ForbiddenOverride,
                ..
            }
        ));
        assert_eq!(handler.check(&token("%MAIN_TEXT%")), Verdict::Decline);
        assert_eq!(handler.check(&token("%AUTHOR%")), Verdict::Accept);
        assert_eq!(handler.check(&token("%NOBODY%")), Verdict::Decline);
    }

    #[test]
    fn test_bare_reserved_key_refuses_every_argument() {
        let mut lookup = LookupTable::new(Locale::En);
        lookup.insert("INCLUDE", "fake");
        let handler = Substitutor::StringMacro { lookup: &lookup };

        for raw in ["%INCLUDE(a.txt)%", "%INCLUDE(b/c.txt)%"] {
            assert!(matches!(
                handler.check(&token(raw)),
                Verdict::Refuse {
                    kind: DiagnosticKind::ForbiddenOverride,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_second_main_text_is_skipped() {
        let mut document = Document::new("template");
        document.push_paragraph("%MAIN_TEXT%");
        document.push_paragraph("%MAIN_TEXT%");
        let ids: Vec<_> = document.paragraphs().map(|p| p.id).collect();

        let mut context = RunContext::new();
        let mut handler = Substitutor::main_text(vec![Block::PageBreak]);
        let first = TextRange::in_paragraph(ids[0], 0, 11);
        let second = TextRange::in_paragraph(ids[1], 0, 11);

        let applied = handler
            .substitute(&mut document, &mut context, &first, &token("%MAIN_TEXT%"))
            .unwrap();
        assert!(matches!(applied, Substitution::Applied(_)));

        let skipped = handler
            .substitute(&mut document, &mut context, &second, &token("%MAIN_TEXT%"))
            .unwrap();
        assert_eq!(skipped, Substitution::Skipped);
        assert_eq!(
            context
                .diagnostics_of(DiagnosticKind::ExtraMainText)
                .count(),
            1
        );
    }
}
