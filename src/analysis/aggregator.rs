//! Article aggregation across type-labeled JSONL sources.
//!
//! Records about the same article arrive from several sources, one per
//! prompt type. They are folded into one [`Article`] per stable key, keeping
//! first-occurrence order.

use crate::error::DigestError;
use crate::models::{Article, ArticleRecord, MergePolicy, SortOrder, TypeLabel};
use crate::sources::LoadedSource;
use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, warn};

/// Counters describing one merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub sources_merged: usize,
    pub sources_failed: usize,
    pub records_merged: usize,
    pub malformed_lines: usize,
    pub missing_keys: usize,
    pub articles: usize,
}

impl MergeStats {
    /// Lines or records that were skipped.
    pub fn skipped(&self) -> usize {
        self.malformed_lines + self.missing_keys
    }
}

/// Result of merging a batch of sources.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub articles: Vec<Article>,
    pub stats: MergeStats,
    /// Labels of sources that could not be read.
    pub failed_sources: Vec<TypeLabel>,
}

impl MergeOutcome {
    /// Whether some source was lost and the articles are incomplete.
    pub fn is_partial(&self) -> bool {
        !self.failed_sources.is_empty()
    }
}

/// Accumulator for one merge run. Consumed by [`ArticleMerger::finish`].
pub struct ArticleMerger<'a> {
    policy: MergePolicy,
    payload_prefix: &'a str,
    by_key: HashMap<String, (u64, Article)>,
    next_order: u64,
    stats: MergeStats,
    failed_sources: Vec<TypeLabel>,
}

impl<'a> ArticleMerger<'a> {
    pub fn new(policy: MergePolicy, payload_prefix: &'a str) -> Self {
        Self {
            policy,
            payload_prefix,
            by_key: HashMap::new(),
            next_order: 0,
            stats: MergeStats::default(),
            failed_sources: Vec::new(),
        }
    }

    /// Fold every line of one source's JSONL text into the accumulator.
    pub fn ingest(&mut self, label: &TypeLabel, text: &str) {
        self.stats.sources_merged += 1;

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let record = match parse_record(line) {
                Ok(r) => r,
                Err(reason) => {
                    let err = DigestError::MalformedRecord {
                        label: label.to_string(),
                        line: idx + 1,
                        reason,
                    };
                    warn!("Skipping {}", err);
                    self.stats.malformed_lines += 1;
                    continue;
                }
            };

            match record.stable_key() {
                Some(key) => self.merge_record(label, key, record),
                None => {
                    let err = DigestError::MissingKey {
                        label: label.to_string(),
                        line: idx + 1,
                    };
                    warn!("Skipping {}", err);
                    self.stats.missing_keys += 1;
                }
            }
        }
    }

    /// Note a source that could not be read; the rest of the batch goes on.
    pub fn record_failure(&mut self, label: &TypeLabel, err: &DigestError) {
        error!("Skipping {}", err);
        self.stats.sources_failed += 1;
        self.failed_sources.push(label.clone());
    }

    fn merge_record(&mut self, label: &TypeLabel, key: String, record: ArticleRecord) {
        let article = match self.by_key.entry(key) {
            Entry::Vacant(slot) => {
                let order = self.next_order;
                self.next_order += 1;
                let article = Article::from_record(slot.key().clone(), &record);
                &mut slot.insert((order, article)).1
            }
            Entry::Occupied(slot) => {
                let (_, article) = slot.into_mut();
                if self.policy == MergePolicy::LastWrite {
                    article.coalesce_from(&record);
                }
                article
            }
        };

        if let Some(questions) = record.questions {
            article
                .question_types
                .insert(label.payload_key(self.payload_prefix), questions);
        }

        self.stats.records_merged += 1;
    }

    /// Emit the articles in first-occurrence order.
    pub fn finish(self) -> MergeOutcome {
        let mut ordered: Vec<(u64, Article)> = self.by_key.into_values().collect();
        ordered.sort_by_key(|(order, _)| *order);

        let articles: Vec<Article> = ordered.into_iter().map(|(_, a)| a).collect();
        let mut stats = self.stats;
        stats.articles = articles.len();

        debug!("Merged {} records into {} articles", stats.records_merged, stats.articles);

        MergeOutcome {
            articles,
            stats,
            failed_sources: self.failed_sources,
        }
    }
}

fn parse_record(line: &str) -> Result<ArticleRecord, String> {
    let value: Value = serde_json::from_str(line).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err("expected a JSON object".to_string());
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

/// Merge loaded sources in the order given.
pub fn merge_sources(
    sources: &[LoadedSource],
    policy: MergePolicy,
    payload_prefix: &str,
) -> MergeOutcome {
    let mut merger = ArticleMerger::new(policy, payload_prefix);

    for source in sources {
        match &source.content {
            Ok(text) => merger.ingest(&source.spec.label, text),
            Err(e) => merger.record_failure(&source.spec.label, e),
        }
    }

    merger.finish()
}

/// Re-order articles for presentation. Stable.
pub fn sort_articles(articles: &mut [Article], order: SortOrder) {
    match order {
        SortOrder::Insertion => {}
        SortOrder::Date => articles.sort_by(|a, b| {
            let date_a = a.date_text().unwrap_or_default();
            let date_b = b.date_text().unwrap_or_default();
            if date_a == date_b {
                let headline_a = a.headline_text().unwrap_or_default();
                let headline_b = b.headline_text().unwrap_or_default();
                headline_a.cmp(&headline_b)
            } else {
                date_b.cmp(&date_a)
            }
        }),
    }
}

/// Number of articles carrying questions for each payload key.
pub fn type_coverage(articles: &[Article]) -> BTreeMap<TypeLabel, usize> {
    let mut coverage: BTreeMap<TypeLabel, usize> = BTreeMap::new();

    for article in articles {
        for label in article.question_types.keys() {
            *coverage.entry(label.clone()).or_default() += 1;
        }
    }

    coverage
}
