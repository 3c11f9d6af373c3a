//! Error taxonomy for the digest pipelines.
//!
//! Source, record and key errors are recoverable: the pipelines log them,
//! count them and keep going. `NoExtractableText` ends the run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading and merging type-labeled sources.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("source '{label}' could not be read from {}: {source}", .path.display())]
    MissingSource {
        label: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("source '{label}' line {line}: malformed record: {reason}")]
    MalformedRecord {
        label: String,
        line: usize,
        reason: String,
    },
    #[error("source '{label}' line {line}: record has no news_item_id or id")]
    MissingKey { label: String, line: usize },
    #[error("source '{label}' has no {block} block")]
    MissingInstructionBlock { label: String, block: String },
    #[error("no extractable instructions in any source")]
    NoExtractableText,
    #[error("invalid source: {0}")]
    InvalidSource(String),
    #[error("invalid file pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_source() {
        let err = DigestError::MalformedRecord {
            label: "7".to_string(),
            line: 12,
            reason: "expected value".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'7'"));
        assert!(msg.contains("line 12"));

        let missing = DigestError::MissingSource {
            label: "2".to_string(),
            path: PathBuf::from("data/type2.jsonl"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(missing.to_string().contains("data/type2.jsonl"));
    }

    #[test]
    fn test_pattern_error_converts() {
        let err: DigestError = regex::Regex::new("type(").unwrap_err().into();
        assert!(err.to_string().starts_with("invalid file pattern"));
    }
}
