//! Type-labeled source discovery and loading.
//!
//! Sources are either listed explicitly (`LABEL=PATH`) or discovered by
//! matching file names in a directory. Loading reads every source
//! concurrently but hands results back in the order they were requested,
//! since that order decides which source wins merge conflicts.

pub mod block;

use crate::config::SourceEntry;
use crate::error::DigestError;
use crate::models::TypeLabel;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A labeled input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub label: TypeLabel,
    pub path: PathBuf,
}

impl From<&SourceEntry> for SourceSpec {
    fn from(entry: &SourceEntry) -> Self {
        Self {
            label: TypeLabel::new(entry.label.clone()),
            path: entry.path.clone(),
        }
    }
}

/// A source after its read attempt.
#[derive(Debug)]
pub struct LoadedSource {
    pub spec: SourceSpec,
    pub content: Result<String, DigestError>,
}

/// Find sources in `dir` whose file name matches `pattern`.
///
/// The first capture group of the pattern is the type label; without a
/// group the whole match is used. Results are ordered by label.
pub fn discover_sources(dir: &Path, pattern: &str) -> Result<Vec<SourceSpec>, DigestError> {
    let matcher = Regex::new(pattern)?;
    let mut specs = Vec::new();
    let mut seen = HashSet::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Cannot scan {}: {}", dir.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            continue;
        };

        let Some(caps) = matcher.captures(name) else {
            continue;
        };

        let label = caps
            .get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        if !seen.insert(label.clone()) {
            warn!("Skipping {}: type {} already has a source", name, label);
            continue;
        }

        debug!("Discovered type {} at {}", label, entry.path().display());
        specs.push(SourceSpec {
            label: TypeLabel::new(label),
            path: entry.path().to_path_buf(),
        });
    }

    specs.sort_by(|a, b| a.label.cmp(&b.label));
    Ok(specs)
}

/// Resolve the sources to use: explicit entries win over discovery.
pub fn resolve_sources(
    explicit: &[SourceEntry],
    dir: &Path,
    pattern: &str,
) -> Result<Vec<SourceSpec>, DigestError> {
    if explicit.is_empty() {
        return discover_sources(dir, pattern);
    }

    let mut seen = HashSet::new();
    for entry in explicit {
        if entry.label.trim().is_empty() {
            return Err(DigestError::InvalidSource(format!(
                "source {} has an empty label",
                entry.path.display()
            )));
        }
        if !seen.insert(entry.label.as_str()) {
            return Err(DigestError::InvalidSource(format!(
                "label '{}' is listed more than once",
                entry.label
            )));
        }
    }

    Ok(explicit.iter().map(SourceSpec::from).collect())
}

/// Read all sources concurrently, returning results in input order.
pub async fn load_sources(specs: Vec<SourceSpec>, show_progress: bool) -> Vec<LoadedSource> {
    let progress_bar = if show_progress {
        let pb = ProgressBar::new(specs.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let reads = specs.into_iter().map(|spec| {
        let pb = progress_bar.clone();
        async move {
            let content = tokio::fs::read_to_string(&spec.path)
                .await
                .map_err(|source| DigestError::MissingSource {
                    label: spec.label.to_string(),
                    path: spec.path.clone(),
                    source,
                });
            pb.set_message(spec.label.to_string());
            pb.inc(1);
            LoadedSource { spec, content }
        }
    });

    let loaded = join_all(reads).await;
    progress_bar.finish_and_clear();
    loaded
}
