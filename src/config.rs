//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.mcqdigest.toml` files.

use crate::models::{MergePolicy, SortOrder};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".mcqdigest.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Article aggregation settings.
    #[serde(default)]
    pub articles: ArticlesConfig,

    /// Instruction extraction settings.
    #[serde(default)]
    pub instructions: InstructionsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// An explicitly listed type-labeled source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub label: String,
    pub path: PathBuf,
}

/// Article aggregator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlesConfig {
    /// Directory scanned for per-type JSONL files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// File name regex; the first capture group is the type label.
    #[serde(default = "default_articles_pattern")]
    pub file_pattern: String,

    /// Where the merged artifact is written.
    #[serde(default = "default_articles_output")]
    pub output: PathBuf,

    /// Prefix of the per-type question keys (`type` gives `type1`).
    #[serde(default = "default_payload_prefix")]
    pub payload_prefix: String,

    /// Conflict resolution for descriptive fields.
    #[serde(default)]
    pub merge_policy: MergePolicy,

    /// Article order in the artifact.
    #[serde(default)]
    pub sort: SortOrder,

    /// Explicit sources; when non-empty, discovery is skipped.
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

impl Default for ArticlesConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_pattern: default_articles_pattern(),
            output: default_articles_output(),
            payload_prefix: default_payload_prefix(),
            merge_policy: MergePolicy::default(),
            sort: SortOrder::default(),
            sources: Vec::new(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("public/data")
}

fn default_articles_pattern() -> String {
    r"type(\d+).*\.jsonl$".to_string()
}

fn default_articles_output() -> PathBuf {
    PathBuf::from("public/data/articles.json")
}

fn default_payload_prefix() -> String {
    "type".to_string()
}

/// How the instruction text is stored in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionFormat {
    /// A Python assignment of adjacent string literals.
    #[default]
    Python,
    /// The whole file is the instruction text.
    Plain,
}

/// Instruction extractor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionsConfig {
    /// Directory scanned for per-type generator sources.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// File name regex; the first capture group is the type label.
    #[serde(default = "default_instructions_pattern")]
    pub file_pattern: String,

    /// Name of the assigned constant holding the instruction text.
    #[serde(default = "default_block_name")]
    pub block_name: String,

    /// Characters that end a sentence.
    #[serde(default = "default_terminators")]
    pub terminators: String,

    #[serde(default)]
    pub format: InstructionFormat,

    /// Where the instruction summary is written.
    #[serde(default = "default_instructions_output")]
    pub output: PathBuf,

    /// Explicit sources; when non-empty, discovery is skipped.
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

impl Default for InstructionsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            file_pattern: default_instructions_pattern(),
            block_name: default_block_name(),
            terminators: default_terminators(),
            format: InstructionFormat::default(),
            output: default_instructions_output(),
            sources: Vec::new(),
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("../jiji-compe2")
}

fn default_instructions_pattern() -> String {
    r"type(\d+)\.py$".to_string()
}

fn default_block_name() -> String {
    "SYSTEM_INSTRUCTIONS".to_string()
}

fn default_terminators() -> String {
    "。．！？".to_string()
}

fn default_instructions_output() -> PathBuf {
    PathBuf::from("src/data/mcq3SystemInstructions.json")
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if args.verbose {
            self.general.verbose = true;
        }

        match &args.command {
            Some(crate::cli::Command::Articles(a)) => {
                if let Some(ref dir) = a.data_dir {
                    self.articles.data_dir = dir.clone();
                    self.articles.sources.clear();
                }
                if let Some(ref output) = a.output {
                    self.articles.output = output.clone();
                }
                if let Some(policy) = a.merge_policy {
                    self.articles.merge_policy = policy;
                }
                if let Some(sort) = a.sort {
                    self.articles.sort = sort;
                }
                if !a.sources.is_empty() {
                    self.articles.sources = a.sources.clone();
                }
            }
            Some(crate::cli::Command::Instructions(i)) => {
                if let Some(ref dir) = i.source_dir {
                    self.instructions.source_dir = dir.clone();
                    self.instructions.sources.clear();
                }
                if let Some(ref output) = i.output {
                    self.instructions.output = output.clone();
                }
                if let Some(ref name) = i.block_name {
                    self.instructions.block_name = name.clone();
                }
                if let Some(ref terminators) = i.terminators {
                    self.instructions.terminators = terminators.clone();
                }
                if i.plain {
                    self.instructions.format = InstructionFormat::Plain;
                }
                if !i.sources.is_empty() {
                    self.instructions.sources = i.sources.clone();
                }
            }
            None => {}
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
