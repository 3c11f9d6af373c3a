//! mcqdigest - comparison artifacts for per-type MCQ generation runs
//!
//! A CLI tool that merges the JSONL outputs of several prompt types into
//! one article catalog, and separates the prompt instructions every type
//! shares from the ones specific to each type.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Fatal error (configuration, no extractable instructions, write failure)
//!   2 - Partial result: one or more sources could not be used

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod sources;

use anyhow::{bail, Context, Result};
use cli::{Args, ArticlesArgs, Command, InstructionsArgs, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{ArticleCatalog, TypeLabel};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let (mut config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("mcqdigest v{}", env!("CARGO_PKG_VERSION"));
    match config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
    debug!("Arguments: {:?}", args);

    let result = match args.command.clone() {
        Some(Command::Articles(a)) => run_articles(&a, &config, !args.quiet).await,
        Some(Command::Instructions(i)) => run_instructions(&i, &config, !args.quiet).await,
        None => Ok(0),
    };

    match result {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .mcqdigest.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize source directories, patterns, and outputs.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` directives apply unless `--verbose`, `--quiet` or
/// `general.verbose` chose a level.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };
    let rust_log = if config.general.verbose || args.quiet {
        None
    } else {
        std::env::var("RUST_LOG").ok()
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(level, rust_log.as_deref()))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Build the log filter: valid `RUST_LOG` directives, else the given level.
fn log_filter(level: tracing::Level, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(level.into()))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => Ok((config, Some(PathBuf::from(CONFIG_FILE_NAME)))),
        None => Ok((Config::default(), None)),
    }
}

/// Output path for a run: Markdown digests default next to the JSON artifact.
fn output_path(explicit: Option<&PathBuf>, configured: &Path, format: OutputFormat) -> PathBuf {
    match (explicit, format) {
        (Some(path), _) => path.clone(),
        (None, OutputFormat::Json) => configured.to_path_buf(),
        (None, OutputFormat::Markdown) => configured.with_extension("md"),
    }
}

fn join_labels(labels: &[TypeLabel]) -> String {
    labels
        .iter()
        .map(TypeLabel::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Merge per-type JSONL files into the article catalog. Returns exit code.
async fn run_articles(args: &ArticlesArgs, config: &Config, show_progress: bool) -> Result<i32> {
    let start_time = Instant::now();
    let cfg = &config.articles;

    let specs = sources::resolve_sources(&cfg.sources, &cfg.data_dir, &cfg.file_pattern)?;
    if specs.is_empty() {
        bail!(
            "No article sources found in {} matching '{}'",
            cfg.data_dir.display(),
            cfg.file_pattern
        );
    }

    let types: Vec<TypeLabel> = specs.iter().map(|s| s.label.clone()).collect();
    println!("📥 Loading {} article sources: {}", specs.len(), join_labels(&types));

    let loaded = sources::load_sources(specs, show_progress).await;

    println!("🔀 Merging records (policy: {})...", cfg.merge_policy);
    let mut outcome = analysis::merge_sources(&loaded, cfg.merge_policy, &cfg.payload_prefix);
    analysis::sort_articles(&mut outcome.articles, cfg.sort);

    let partial = outcome.is_partial();
    let stats = outcome.stats.clone();
    let failed_sources = outcome.failed_sources.clone();
    let catalog = ArticleCatalog::new(types, outcome.articles);

    let output = match args.format {
        OutputFormat::Json => report::generate_json(&catalog)?,
        OutputFormat::Markdown => report::generate_catalog_markdown(&catalog),
    };
    let out_path = output_path(args.output.as_ref(), &cfg.output, args.format);
    report::write_artifact(&out_path, &output)?;

    println!("\n📊 Merge Summary:");
    println!(
        "   Sources merged: {} | failed: {}",
        stats.sources_merged, stats.sources_failed
    );
    println!("   Records merged: {}", stats.records_merged);
    if stats.skipped() > 0 {
        println!(
            "   Skipped: {} malformed lines, {} records without id",
            stats.malformed_lines, stats.missing_keys
        );
    }
    println!("   Articles: {}", catalog.article_count);
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Wrote {} articles to {}",
        catalog.article_count,
        out_path.display()
    );

    if partial {
        warn!("Missing sources: {}", join_labels(&failed_sources));
        eprintln!(
            "\n⚠️  {} source(s) could not be read ({}). Result is partial (exit code 2).",
            failed_sources.len(),
            join_labels(&failed_sources)
        );
        return Ok(2);
    }

    Ok(0)
}

/// Extract common and type-specific instructions. Returns exit code.
async fn run_instructions(
    args: &InstructionsArgs,
    config: &Config,
    show_progress: bool,
) -> Result<i32> {
    let cfg = &config.instructions;

    let specs = sources::resolve_sources(&cfg.sources, &cfg.source_dir, &cfg.file_pattern)?;
    if specs.is_empty() {
        warn!(
            "No instruction sources found in {} matching '{}'",
            cfg.source_dir.display(),
            cfg.file_pattern
        );
    }

    println!("📥 Loading {} instruction sources...", specs.len());
    let loaded = sources::load_sources(specs, show_progress).await;

    let (texts, mut failed) = analysis::gather_texts(loaded, cfg.format, &cfg.block_name);
    let splitter = analysis::SentenceSplitter::new(&cfg.terminators);
    let extraction = analysis::extract_instructions(texts, &splitter)?;
    failed.extend(extraction.excluded.iter().cloned());

    let summary = extraction.into_summary();

    let output = match args.format {
        OutputFormat::Json => report::generate_json(&summary)?,
        OutputFormat::Markdown => report::generate_instructions_markdown(&summary),
    };
    let out_path = output_path(args.output.as_ref(), &cfg.output, args.format);
    report::write_artifact(&out_path, &output)?;

    println!("\n📊 Instruction Summary:");
    println!("   Common sentences: {}", summary.common_instructions.len());
    for (label, set) in &summary.types {
        println!(
            "   - Type {}: {} sentences, {} specific",
            label,
            set.sentences.len(),
            set.type_specific_instructions.len()
        );
    }
    println!(
        "\n✅ Wrote instruction summary for {} types to {}",
        summary.types.len(),
        out_path.display()
    );

    if !failed.is_empty() {
        eprintln!(
            "\n⚠️  {} type(s) excluded ({}). Result is partial (exit code 2).",
            failed.len(),
            join_labels(&failed)
        );
        return Ok(2);
    }

    Ok(0)
}
