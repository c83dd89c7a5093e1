//! One templating run, end to end
//!
//! Validate paths, open the main text as a scoped secondary document and
//! normalize it, load the template, expand includes and the main text,
//! substitute the remaining macros, repair formulas, refresh tables of
//! contents, save. Any hard error aborts before the output is written.

use anyhow::Result;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Config;
use crate::context::{Diagnostic, RunContext};
use crate::document::cleanup::drop_blank_paragraphs;
use crate::document::{
    Document, DocumentLoader, anchor_objects_as_characters, count_objects, load_document,
    save_document,
};
use crate::error::TemplaterError;
use crate::formula::fix_document_formulas;
use crate::macros::{DocumentIncluder, LookupTable, MacroSubstitutionEngine, Substitutor};
use crate::progress::{DefaultProgressInformer, ProgressInformer};

/// Result of a successful run
#[derive(Debug)]
pub struct RunOutcome {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
    pub include_passes: usize,
    /// Formula objects, in document order
    pub formulas: Vec<String>,
    /// How many of them the repair actually changed
    pub formulas_fixed: usize,
}

pub struct Templater {
    config: Config,
    lookup: LookupTable,
    base_dir: PathBuf,
}

impl Templater {
    pub fn new(config: Config) -> Self {
        Templater {
            lookup: LookupTable::new(config.locale),
            config,
            base_dir: PathBuf::from("."),
        }
    }

    /// Directory relative include paths are resolved against
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_clock(mut self, clock: NaiveDateTime) -> Self {
        self.lookup = self.lookup.with_clock(clock);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn load_macros_from_file(&mut self, path: &Path) -> Result<usize> {
        self.lookup.load_file(path)
    }

    pub fn load_macros_from_map<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.lookup.load_map(pairs);
    }

    /// Template and main text must exist, and the three paths must differ
    pub fn check_paths(template: &Path, main: &Path, output: &Path, overwrite: bool) -> Result<()> {
        for (role, path) in [("template", template), ("main text", main)] {
            if !path.is_file() {
                return Err(TemplaterError::InvalidPaths(format!(
                    "{role} file {} does not exist",
                    path.display()
                ))
                .into());
            }
        }

        let absolute = |path: &Path| std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let (template_abs, main_abs, output_abs) =
            (absolute(template), absolute(main), absolute(output));
        if template_abs == main_abs || template_abs == output_abs || main_abs == output_abs {
            return Err(TemplaterError::InvalidPaths(
                "template, main text and output must be three different files".to_string(),
            )
            .into());
        }

        if output.exists() && !overwrite {
            return Err(TemplaterError::InvalidPaths(format!(
                "output file {} already exists; use --force to overwrite it",
                output.display()
            ))
            .into());
        }

        Ok(())
    }

    /// Build the composed document without writing anything
    pub fn process(&mut self, template: &Path, main: &Path) -> Result<RunOutcome> {
        let loader = DocumentLoader::new(&self.base_dir);
        let mut context = RunContext::new();
        let mut progress = DefaultProgressInformer::new("Loading main text");
        progress.set_silent(!self.config.verbose);

        let main_text = {
            let mut main_document = loader.open_scoped(main)?;
            anchor_objects_as_characters(&mut main_document);
            drop_blank_paragraphs(main_document.blocks.clone())
        };

        let mut document = load_document(template)?;
        info!("loaded template {}", template.display());

        let include_passes = DocumentIncluder::with_depth_limit(
            &loader,
            self.config.include_depth_limit,
        )
        .process(&mut document, Some(main_text), &mut context, &mut progress)?;

        self.lookup.set_counters(count_objects(&document));
        progress.set_stage("Substituting macros");
        let mut engine = MacroSubstitutionEngine::new(vec![
            Substitutor::StringMacro {
                lookup: &self.lookup,
            },
            Substitutor::TableOfContents {
                title: self.config.toc_title(),
            },
        ]);
        let report = engine.run(&mut document, &mut context, &mut progress)?;
        debug!(?report, "string macros substituted");

        progress.set_stage("Fixing formulas");
        let formulas_fixed = fix_document_formulas(&mut document, &mut context, &mut progress)?;

        progress.set_stage("Updating indexes");
        document.update_indexes();
        debug!(open = loader.open_documents(), "secondary documents still open");

        Ok(RunOutcome {
            formulas: context.formulas().to_vec(),
            diagnostics: context.take_diagnostics(),
            document,
            include_passes,
            formulas_fixed,
        })
    }

    /// Check paths, process and save
    pub fn run(
        &mut self,
        template: &Path,
        main: &Path,
        output: &Path,
        overwrite: bool,
    ) -> Result<RunOutcome> {
        Self::check_paths(template, main, output, overwrite)?;
        let outcome = self.process(template, main)?;
        save_document(&outcome.document, output)?;
        info!(
            warnings = outcome.diagnostics.len(),
            "saved {}",
            output.display()
        );
        Ok(outcome)
    }
}
