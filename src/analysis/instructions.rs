//! Common and type-specific instruction extraction.
//!
//! Each prompt type carries its own system-instruction text. Most of it is
//! shared boilerplate; the interesting part is what differs per type. The
//! texts are split into sentences, the sentences present in every type form
//! the common set, and the remainder of each type is its specific list.

use crate::config::InstructionFormat;
use crate::error::DigestError;
use crate::models::{InstructionSet, InstructionSummary, TypeLabel};
use crate::sources::block::instruction_text;
use crate::sources::LoadedSource;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, error, warn};

/// Splits text after any of a set of terminator characters.
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    terminators: Vec<char>,
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new("。．！？")
    }
}

impl SentenceSplitter {
    pub fn new(terminators: &str) -> Self {
        Self {
            terminators: terminators.chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }

    /// Split into trimmed, non-empty sentences. Terminators stay attached to
    /// their sentence; trailing text without a terminator is a sentence too.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut current = String::new();

        for c in text.chars() {
            current.push(c);
            if self.terminators.contains(&c) {
                push_trimmed(&mut sentences, &current);
                current.clear();
            }
        }
        push_trimmed(&mut sentences, &current);

        sentences
    }
}

fn push_trimmed(sentences: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

/// Instruction text of one type, before splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeText {
    pub label: TypeLabel,
    pub source: String,
    pub text: String,
}

/// Per-type breakdown plus the common sentences.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub common: Vec<String>,
    pub types: BTreeMap<TypeLabel, InstructionSet>,
    /// Types whose text produced no sentences.
    pub excluded: Vec<TypeLabel>,
}

impl Extraction {
    pub fn into_summary(self) -> InstructionSummary {
        InstructionSummary {
            generated_at: Utc::now(),
            common_instructions: self.common,
            types: self.types,
        }
    }
}

/// Sentences present in every list, in first-list order, without duplicates.
pub fn common_sentences(lists: &[&[String]]) -> Vec<String> {
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };

    let others: Vec<HashSet<&str>> = rest
        .iter()
        .map(|list| list.iter().map(String::as_str).collect())
        .collect();

    let mut seen = HashSet::new();
    let mut common = Vec::new();
    for sentence in first.iter() {
        if others.iter().all(|set| set.contains(sentence.as_str()))
            && seen.insert(sentence.as_str())
        {
            common.push(sentence.clone());
        }
    }

    common
}

/// Split every type's text and separate the common sentences.
///
/// Types are processed in label order; a type that yields no sentences is
/// excluded rather than emptying the common set. Fails only when no type
/// has any sentence.
pub fn extract_instructions(
    texts: Vec<TypeText>,
    splitter: &SentenceSplitter,
) -> Result<Extraction, DigestError> {
    let mut split: BTreeMap<TypeLabel, (TypeText, Vec<String>)> = BTreeMap::new();
    let mut excluded = Vec::new();

    for text in texts {
        let sentences = splitter.split(&text.text);
        if sentences.is_empty() {
            warn!("Type {} has no instruction sentences, excluding it", text.label);
            excluded.push(text.label.clone());
            continue;
        }
        debug!("Type {}: {} sentences", text.label, sentences.len());
        split.insert(text.label.clone(), (text, sentences));
    }

    if split.is_empty() {
        return Err(DigestError::NoExtractableText);
    }

    let lists: Vec<&[String]> = split.values().map(|(_, s)| s.as_slice()).collect();
    let common = common_sentences(&lists);
    let common_set: HashSet<&str> = common.iter().map(String::as_str).collect();

    let types = split
        .iter()
        .map(|(label, (text, sentences))| {
            let specific = sentences
                .iter()
                .filter(|s| !common_set.contains(s.as_str()))
                .cloned()
                .collect();

            let set = InstructionSet {
                source: text.source.clone(),
                sentences: sentences.clone(),
                type_specific_instructions: specific,
                full_text: text.text.clone(),
            };
            (label.clone(), set)
        })
        .collect();

    Ok(Extraction {
        common,
        types,
        excluded,
    })
}

/// Pull the instruction text out of each loaded source.
///
/// Returns the texts found and the labels of sources that failed to load or
/// had no instruction block.
pub fn gather_texts(
    sources: Vec<LoadedSource>,
    format: InstructionFormat,
    block_name: &str,
) -> (Vec<TypeText>, Vec<TypeLabel>) {
    let mut texts = Vec::new();
    let mut failed = Vec::new();

    for source in sources {
        let label = source.spec.label;
        let result = source
            .content
            .and_then(|content| instruction_text(&content, format, block_name, &label));

        match result {
            Ok(text) => texts.push(TypeText {
                label,
                source: source.spec.path.display().to_string(),
                text,
            }),
            Err(e) => {
                error!("Skipping {}", e);
                failed.push(label);
            }
        }
    }

    (texts, failed)
}
