//! Artifact generation.
//!
//! JSON artifacts are what the comparison viewer loads; the Markdown
//! digests are for reading the same data in a terminal or a pull request.

use crate::analysis::type_coverage;
use crate::models::{value_text, Article, ArticleCatalog, InstructionSummary};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::path::Path;

/// Characters of article body shown in the Markdown digest.
const CONTENT_PREVIEW_CHARS: usize = 280;

/// Generate a pretty-printed JSON artifact.
pub fn generate_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// Write an artifact, creating parent directories as needed.
pub fn write_artifact(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Generate the Markdown digest of an article catalog.
pub fn generate_catalog_markdown(catalog: &ArticleCatalog) -> String {
    let mut output = String::new();

    output.push_str("# MCQ Article Digest\n\n");

    output.push_str("## Metadata\n\n");
    output.push_str(&format!(
        "- **Generated:** {}\n",
        catalog.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    let types: Vec<String> = catalog.types.iter().map(|t| t.to_string()).collect();
    output.push_str(&format!("- **Types:** {}\n", types.join(", ")));
    output.push_str(&format!("- **Articles:** {}\n\n", catalog.article_count));

    let coverage = type_coverage(&catalog.articles);
    if !coverage.is_empty() {
        output.push_str("| Type | Articles with questions |\n");
        output.push_str("|:---|:---:|\n");
        for (label, count) in &coverage {
            output.push_str(&format!("| {} | {} |\n", label, count));
        }
        output.push('\n');
    }

    output.push_str("## Articles\n\n");
    for (idx, article) in catalog.articles.iter().enumerate() {
        output.push_str(&generate_article_section(idx + 1, article));
    }

    output
}

fn generate_article_section(number: usize, article: &Article) -> String {
    let mut section = String::new();

    let headline = article.headline_text().unwrap_or(Cow::Borrowed("(no headline)"));
    section.push_str(&format!("### {}. {}\n\n", number, headline));

    if let Some(sub) = article.sub_headline_text() {
        section.push_str(&format!("*{}*\n\n", sub));
    }

    section.push_str(&format!("- **Key:** `{}`\n", article.key));
    if let Some(date) = article.date_text() {
        section.push_str(&format!("- **Date:** {}\n", date));
    }
    section.push_str(&format!("- **Questions:** {}\n", article.question_count()));
    section.push('\n');

    match article.content_text().as_deref().map(str::trim) {
        Some(content) if !content.is_empty() => {
            section.push_str(&format!("> {}\n\n", preview(content, CONTENT_PREVIEW_CHARS)));
        }
        _ => section.push_str("> (no content)\n\n"),
    }

    if article.question_types.is_empty() {
        section.push_str("_No questions in any type._\n\n");
    }

    for (label, payload) in &article.question_types {
        match payload {
            Value::Array(questions) => {
                section.push_str(&format!("#### {} ({} questions)\n\n", label, questions.len()));
                for (q_idx, question) in questions.iter().enumerate() {
                    section.push_str(&generate_question_block(q_idx + 1, question));
                }
            }
            other => {
                section.push_str(&format!("#### {}\n\n", label));
                section.push_str(&format!("```json\n{}\n```\n\n", other));
            }
        }
    }

    section
}

fn generate_question_block(number: usize, question: &Value) -> String {
    let mut block = String::new();

    let text = match question.get("question") {
        Some(Value::Null) | None => Cow::Borrowed("(no question text)"),
        Some(value) => value_text(value),
    };
    block.push_str(&format!("**Q{}.** {}\n\n", number, text));

    if let Some(Value::Array(choices)) = question.get("choices") {
        for (c_idx, choice) in choices.iter().enumerate() {
            block.push_str(&format!("{}. {}\n", c_idx + 1, value_text(choice)));
        }
    }
    block.push('\n');

    block
}

/// Collapse whitespace and cut to `max_chars` characters.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

/// Generate the Markdown digest of an instruction summary.
pub fn generate_instructions_markdown(summary: &InstructionSummary) -> String {
    let mut output = String::new();

    output.push_str("# Prompt Instruction Digest\n\n");
    output.push_str(&format!(
        "- **Generated:** {}\n",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("- **Types:** {}\n\n", summary.types.len()));

    output.push_str("## Common Instructions\n\n");
    if summary.common_instructions.is_empty() {
        output.push_str("_No sentence is shared by every type._\n\n");
    } else {
        for sentence in &summary.common_instructions {
            output.push_str(&format!("- {}\n", sentence));
        }
        output.push('\n');
    }

    output.push_str("## Type-Specific Instructions\n\n");
    for (label, set) in &summary.types {
        output.push_str(&format!("### Type {}\n\n", label));
        output.push_str(&format!("Source: `{}`\n\n", set.source));
        if set.type_specific_instructions.is_empty() {
            output.push_str("_Only common instructions._\n\n");
        } else {
            for sentence in &set.type_specific_instructions {
                output.push_str(&format!("- {}\n", sentence));
            }
            output.push('\n');
        }
    }

    output
}
