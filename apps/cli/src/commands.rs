//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use bookstruct_core::{DocumentModel, ProgressReporter, SilentProgress};
use bookstruct_markup::SegmentOptions;
use bookstruct_package::Package;
use bookstruct_shared::paths::normalize_path;
use bookstruct_shared::{AppConfig, EngineConfig, init_config, load_config, load_config_from};

use crate::render;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// bookstruct — recover the structure of unpacked e-books.
#[derive(Parser)]
#[command(
    name = "bookstruct",
    version,
    about = "Infer sections, content types and the table of contents of unpacked e-book packages.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format for command results.
    #[arg(long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Config file to use instead of ~/.bookstruct/bookstruct.toml.
    #[arg(long, global = true, env = "BOOKSTRUCT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Segment documents one at a time instead of in parallel.
    #[arg(long, global = true)]
    pub sequential: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Result output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Analyze a whole package and summarize or export the document model.
    Analyze {
        /// Unpacked package directory.
        dir: PathBuf,

        /// Write the document model as JSON to this file.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show the sections of one document.
    Sections {
        /// Unpacked package directory.
        dir: PathBuf,

        /// Package-relative path of the document.
        doc: String,
    },

    /// List manifest entries with their inferred content types.
    Manifest {
        /// Unpacked package directory.
        dir: PathBuf,
    },

    /// Show the classified table of contents.
    Toc {
        /// Unpacked package directory.
        dir: PathBuf,

        /// Print a depth-tagged list instead of a tree.
        #[arg(long)]
        flat: bool,
    },

    /// List the images of a package and their roles.
    Images {
        /// Unpacked package directory.
        dir: PathBuf,
    },

    /// Show the cover image and how it was found.
    Cover {
        /// Unpacked package directory.
        dir: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "bookstruct=info",
        1 => "bookstruct=debug",
        _ => "bookstruct=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so JSON results on stdout stay machine-readable.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let format = cli.format;

    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        };
    }

    let app_config = resolve_config(cli.config.as_deref())?;
    let mut engine = EngineConfig::from(&app_config);
    if cli.sequential {
        engine.parallel = false;
    }

    match cli.command {
        Command::Analyze { dir, out } => cmd_analyze(&dir, out.as_deref(), &engine, format),
        Command::Sections { dir, doc } => cmd_sections(&dir, &doc, &engine, format),
        Command::Manifest { dir } => cmd_manifest(&dir, &engine, format),
        Command::Toc { dir, flat } => cmd_toc(&dir, flat, &engine, format),
        Command::Images { dir } => cmd_images(&dir, &engine, format),
        Command::Cover { dir } => cmd_cover(&dir, &engine, format),
        Command::Config { .. } => Ok(()),
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_analyze(dir: &Path, out: Option<&Path>, engine: &EngineConfig, format: OutputFormat) -> Result<()> {
    info!(dir = %dir.display(), "analyzing package");

    let model = if format == OutputFormat::Json && out.is_none() {
        bookstruct_core::analyze_package(dir, engine, &SilentProgress)?
    } else {
        let reporter = CliProgress::new();
        bookstruct_core::analyze_package(dir, engine, &reporter)?
    };

    if let Some(out) = out {
        bookstruct_core::write_json(&model, out)?;
    }

    match format {
        OutputFormat::Json if out.is_none() => print_json(&model),
        _ => {
            print!("{}", render::summary(&model));
            if let Some(out) = out {
                println!("  Output:    {}", out.display());
                println!();
            }
            Ok(())
        }
    }
}

fn cmd_sections(dir: &Path, doc: &str, engine: &EngineConfig, format: OutputFormat) -> Result<()> {
    let package = Package::open(dir, engine)?;
    let doc = normalize_path(doc);
    if !package.root().join(&doc).is_file() {
        return Err(eyre!("document '{doc}' not found in {}", dir.display()));
    }

    let result = bookstruct_core::analyze_document(&package, &doc, &SegmentOptions::from(engine))?;
    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Text => {
            print!("{}", render::sections(&result.sections));
            Ok(())
        }
    }
}

fn cmd_manifest(dir: &Path, engine: &EngineConfig, format: OutputFormat) -> Result<()> {
    let package = Package::open(dir, engine)?;
    let items = bookstruct_core::classify_manifest(&package);
    match format {
        OutputFormat::Json => print_json(&items),
        OutputFormat::Text => {
            print!("{}", render::manifest(&items));
            Ok(())
        }
    }
}

fn cmd_toc(dir: &Path, flat: bool, engine: &EngineConfig, format: OutputFormat) -> Result<()> {
    let package = Package::open(dir, engine)?;
    let nodes = bookstruct_classify::build(package.navigation());

    if nodes.is_empty() {
        info!("package has no table of contents");
    }

    match (format, flat) {
        (OutputFormat::Json, true) => print_json(&bookstruct_classify::flatten(&nodes)),
        (OutputFormat::Json, false) => print_json(&nodes),
        (OutputFormat::Text, true) => {
            print!("{}", render::flat_toc(&bookstruct_classify::flatten(&nodes)));
            Ok(())
        }
        (OutputFormat::Text, false) => {
            print!("{}", render::toc(&nodes));
            Ok(())
        }
    }
}

fn cmd_images(dir: &Path, engine: &EngineConfig, format: OutputFormat) -> Result<()> {
    let package = Package::open(dir, engine)?;
    let images = bookstruct_core::classify_images(&package);
    match format {
        OutputFormat::Json => print_json(&images),
        OutputFormat::Text => {
            print!("{}", render::images(&images));
            Ok(())
        }
    }
}

fn cmd_cover(dir: &Path, engine: &EngineConfig, format: OutputFormat) -> Result<()> {
    let package = Package::open(dir, engine)?;
    let cover = package.cover();
    match (format, cover) {
        (OutputFormat::Json, cover) => print_json(&cover),
        (OutputFormat::Text, Some(cover)) => {
            println!("{}  ({})", cover.path, render::cover_source(cover.source));
            Ok(())
        }
        (OutputFormat::Text, None) => {
            println!("no cover image found");
            Ok(())
        }
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_done(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Segmenting [{current}/{total}] {path}"));
    }

    fn done(&self, _model: &DocumentModel) {
        self.spinner.finish_and_clear();
    }
}
