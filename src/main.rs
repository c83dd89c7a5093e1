use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use templater::{Config, Locale, Templater};

/// Compose a document from a template and a main text
#[derive(Parser, Debug)]
#[command(name = "templater", version, about)]
struct Cli {
    /// Template document containing %MAIN_TEXT%, %INCLUDE(...)% and other macros
    #[arg(short, long, required_unless_present = "init_config")]
    template: Option<PathBuf>,

    /// Main text inserted at %MAIN_TEXT%
    #[arg(short, long, required_unless_present = "init_config")]
    main: Option<PathBuf>,

    /// Output file (.json, .md or plain text)
    #[arg(short, long, required_unless_present = "init_config")]
    output: Option<PathBuf>,

    /// File with KEY=VALUE macro definitions
    #[arg(short = 'M', long = "macros")]
    macros: Option<PathBuf>,

    /// Define a macro, overriding the macro file
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    defines: Vec<String>,

    /// Overwrite the output file if it exists
    #[arg(short, long)]
    force: bool,

    /// Report progress and debug details
    #[arg(short, long)]
    verbose: bool,

    /// Locale for date/time macros and the table of contents title
    #[arg(long, value_enum)]
    locale: Option<Locale>,

    /// Write the default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

fn parse_define(define: &str) -> Result<(String, String)> {
    match define.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("invalid macro definition '{define}', expected KEY=VALUE"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.init_config {
        Config::init_default()?;
        if let Some(path) = Config::get_config_path() {
            println!("Wrote default configuration to {}", path.display());
        }
        return Ok(());
    }

    let mut config = Config::load().context("cannot read configuration")?;
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    config.verbose |= cli.verbose;

    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let (Some(template), Some(main), Some(output)) = (cli.template, cli.main, cli.output) else {
        bail!("--template, --main and --output are required");
    };

    let mut templater = Templater::new(config);
    if let Some(macros) = &cli.macros {
        templater.load_macros_from_file(macros)?;
    }
    let defines = cli
        .defines
        .iter()
        .map(|define| parse_define(define))
        .collect::<Result<Vec<_>>>()?;
    templater.load_macros_from_map(defines);

    let outcome = templater.run(&template, &main, &output, cli.force)?;
    if !outcome.diagnostics.is_empty() {
        eprintln!("Finished with {} warning(s):", outcome.diagnostics.len());
        for diagnostic in &outcome.diagnostics {
            eprintln!("  {diagnostic}");
        }
    }

    Ok(())
}
