//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::SourceEntry;
use crate::models::{MergePolicy, SortOrder};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;

/// mcqdigest - build comparison artifacts from per-type MCQ outputs
///
/// Merges the JSONL files produced by each prompt type into one article
/// catalog, and separates the instructions shared by every prompt type
/// from the type-specific ones.
///
/// Examples:
///   mcqdigest articles --data-dir public/data
///   mcqdigest articles --source 1=out/type1.jsonl --source 7=out/type7.jsonl
///   mcqdigest instructions --source-dir ../generators --format markdown -o prompts.md
///   mcqdigest --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .mcqdigest.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true, env = "MCQDIGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .mcqdigest.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Merge per-type JSONL files into one article catalog
    Articles(ArticlesArgs),
    /// Extract common and type-specific prompt instructions
    Instructions(InstructionsArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ArticlesArgs {
    /// Directory scanned for per-type JSONL files
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Explicit source as LABEL=PATH (repeatable, order is merge order)
    #[arg(short, long = "source", value_name = "LABEL=PATH", value_parser = parse_source)]
    pub sources: Vec<SourceEntry>,

    /// Output file path for the catalog
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// How conflicting descriptive fields are resolved
    #[arg(long, value_name = "POLICY")]
    pub merge_policy: Option<MergePolicy>,

    /// Article order in the catalog
    #[arg(long, value_name = "ORDER")]
    pub sort: Option<SortOrder>,

    /// Output format (json, markdown)
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct InstructionsArgs {
    /// Directory scanned for per-type generator sources
    #[arg(long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Explicit source as LABEL=PATH (repeatable)
    #[arg(short, long = "source", value_name = "LABEL=PATH", value_parser = parse_source)]
    pub sources: Vec<SourceEntry>,

    /// Output file path for the summary
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Name of the constant holding the instruction text
    #[arg(long, value_name = "NAME")]
    pub block_name: Option<String>,

    /// Characters that end a sentence
    ///
    /// Example: --terminators "。！？"
    #[arg(long, value_name = "CHARS")]
    pub terminators: Option<String>,

    /// Treat each source file as plain instruction text
    #[arg(long)]
    pub plain: bool,

    /// Output format (json, markdown)
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,
}

/// Output format for the artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON artifact for the viewer (default)
    #[default]
    Json,
    /// Human-readable Markdown digest
    Markdown,
}

/// Parse a `LABEL=PATH` source argument.
pub fn parse_source(raw: &str) -> Result<SourceEntry, String> {
    let (label, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=PATH, got '{}'", raw))?;
    let label = label.trim();
    let path = path.trim();

    if label.is_empty() {
        return Err(format!("missing label in '{}'", raw));
    }
    if path.is_empty() {
        return Err(format!("missing path in '{}'", raw));
    }

    Ok(SourceEntry {
        label: label.to_string(),
        path: PathBuf::from(path),
    })
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let sources = match &self.command {
            None => return Err("A subcommand is required (articles or instructions)".to_string()),
            Some(Command::Articles(a)) => &a.sources,
            Some(Command::Instructions(i)) => {
                if let Some(ref t) = i.terminators {
                    if t.trim().is_empty() {
                        return Err("Terminators must contain at least one character".to_string());
                    }
                }
                if let Some(ref name) = i.block_name {
                    if name.trim().is_empty() {
                        return Err("Block name must not be empty".to_string());
                    }
                }
                &i.sources
            }
        };

        let mut seen = HashSet::new();
        for source in sources {
            if !seen.insert(source.label.as_str()) {
                return Err(format!("Duplicate source label: {}", source.label));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
