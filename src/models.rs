//! Data models for the digest pipelines.
//!
//! This module contains the raw JSONL record shape, the merged article
//! entity, the instruction breakdown, and the two output artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Label of a prompt type (e.g. `"1"`, `"type7"`, `"A"`).
///
/// Labels order naturally: the trailing digit run is compared numerically,
/// so `type2` sorts before `type10` and `"9"` before `"10"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeLabel(String);

impl TypeLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which this type's questions are stored on an article.
    pub fn payload_key(&self, prefix: &str) -> TypeLabel {
        TypeLabel(format!("{}{}", prefix, self.0))
    }
}

impl fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeLabel {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

fn split_digit_suffix(s: &str) -> (&str, &str) {
    let idx = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    s.split_at(idx)
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ord for TypeLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a_prefix, a_digits) = split_digit_suffix(&self.0);
        let (b_prefix, b_digits) = split_digit_suffix(&other.0);
        a_prefix
            .cmp(b_prefix)
            .then_with(|| compare_digit_runs(a_digits, b_digits))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for TypeLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Merge key text of an identifier field.
///
/// Non-empty strings are used as-is and numbers by their decimal text, so
/// `5` and `"5"` name the same article. Anything else is not a key.
pub fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Display text of a descriptive field: strings verbatim, other values as
/// compact JSON.
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// How descriptive fields are resolved when several sources describe the
/// same article.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// The first record seen for a key fixes every descriptive field.
    #[default]
    FirstWrite,
    /// Later records overwrite a field only when they carry a value for it.
    LastWrite,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::FirstWrite => write!(f, "first-write"),
            MergePolicy::LastWrite => write!(f, "last-write"),
        }
    }
}

/// Order of articles in the output artifact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// First-occurrence order across the sources.
    #[default]
    Insertion,
    /// Newest `date_time` first, ties by headline.
    Date,
}

/// One line of a per-type JSONL file.
///
/// Every field is kept as raw JSON: a record is only unusable when it has
/// no key, never because a field has an unexpected shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleRecord {
    #[serde(default)]
    pub news_item_id: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub headline: Option<Value>,
    #[serde(default)]
    pub sub_headline: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub date_time: Option<Value>,
    #[serde(default)]
    pub provider_id: Option<Value>,
    #[serde(default)]
    pub first_created: Option<Value>,
    /// Question payload of this record's type, stored untouched.
    #[serde(default)]
    pub questions: Option<Value>,
}

impl ArticleRecord {
    /// The identifier used to unify records: `news_item_id`, else `id`.
    pub fn stable_key(&self) -> Option<String> {
        self.news_item_id
            .as_ref()
            .and_then(key_text)
            .or_else(|| self.id.as_ref().and_then(key_text))
    }
}

/// An article merged from every type-labeled source that mentions it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Merge key; fixed when the article is first seen.
    #[serde(skip)]
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news_item_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_headline: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_created: Option<Value>,
    /// Questions per payload key (`type1`, `type7`, ...).
    #[serde(rename = "questionTypes", default)]
    pub question_types: BTreeMap<TypeLabel, Value>,
}

impl Article {
    /// Create an article from the first record seen for `key`.
    pub fn from_record(key: String, record: &ArticleRecord) -> Self {
        Self {
            key,
            news_item_id: record.news_item_id.clone(),
            id: record.id.clone(),
            headline: record.headline.clone(),
            sub_headline: record.sub_headline.clone(),
            content: record.content.clone(),
            date_time: record.date_time.clone(),
            provider_id: record.provider_id.clone(),
            first_created: record.first_created.clone(),
            question_types: BTreeMap::new(),
        }
    }

    /// Overwrite descriptive fields the record carries, keeping the rest.
    pub fn coalesce_from(&mut self, record: &ArticleRecord) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        take(&mut self.news_item_id, &record.news_item_id);
        take(&mut self.id, &record.id);
        take(&mut self.headline, &record.headline);
        take(&mut self.sub_headline, &record.sub_headline);
        take(&mut self.content, &record.content);
        take(&mut self.date_time, &record.date_time);
        take(&mut self.provider_id, &record.provider_id);
        take(&mut self.first_created, &record.first_created);
    }

    pub fn headline_text(&self) -> Option<Cow<'_, str>> {
        self.headline.as_ref().map(value_text)
    }

    pub fn sub_headline_text(&self) -> Option<Cow<'_, str>> {
        self.sub_headline.as_ref().map(value_text)
    }

    pub fn content_text(&self) -> Option<Cow<'_, str>> {
        self.content.as_ref().map(value_text)
    }

    pub fn date_text(&self) -> Option<Cow<'_, str>> {
        self.date_time.as_ref().map(value_text)
    }

    /// Number of questions stored for one payload key. A payload that is
    /// not an array has none.
    pub fn questions_in(&self, key: &TypeLabel) -> usize {
        match self.question_types.get(key) {
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        }
    }

    /// Total number of questions across all types.
    pub fn question_count(&self) -> usize {
        self.question_types.keys().map(|k| self.questions_in(k)).sum()
    }
}

/// Output artifact of the article aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleCatalog {
    pub generated_at: DateTime<Utc>,
    /// Labels of every requested source, in source order.
    pub types: Vec<TypeLabel>,
    pub article_count: usize,
    pub articles: Vec<Article>,
}

impl ArticleCatalog {
    pub fn new(types: Vec<TypeLabel>, articles: Vec<Article>) -> Self {
        Self {
            generated_at: Utc::now(),
            types,
            article_count: articles.len(),
            articles,
        }
    }
}

/// Sentence breakdown of one type's instruction text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionSet {
    /// Where the text was read from.
    pub source: String,
    #[serde(rename = "systemInstructions")]
    pub sentences: Vec<String>,
    pub type_specific_instructions: Vec<String>,
    pub full_text: String,
}

/// Output artifact of the instruction extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionSummary {
    pub generated_at: DateTime<Utc>,
    pub common_instructions: Vec<String>,
    pub types: BTreeMap<TypeLabel, InstructionSet>,
}
