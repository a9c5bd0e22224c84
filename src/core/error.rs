//! Error taxonomy for the relevance core.
//!
//! Only corpus-level and schema-level problems are errors. Row-level
//! anomalies (empty text, unparseable dates) are counted in
//! [`crate::core::pipeline::PipelineTally`] and never abort a run.

use std::path::PathBuf;

use miette::Diagnostic;

/// Result alias used throughout `core`
pub type Result<T> = std::result::Result<T, SiftError>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum SiftError
{
    /// Required column absent, label outside the closed set, malformed row
    #[error("schema error in {source_name}: {detail}")]
    #[diagnostic(
        code(sift::schema),
        help("expected columns: id, headline, text, date, source (corpus) or text, sentiment (labels)")
    )]
    Schema
    {
        source_name: String,
        detail: String,
    },

    /// Fewer than two distinct labels available for training
    #[error("training needs two distinct labels, found {found}")]
    #[diagnostic(
        code(sift::insufficient_classes),
        help("label both relevant and irrelevant articles before training")
    )]
    InsufficientClasses
    {
        found: usize,
    },

    /// Classifier weights paired with a different feature space
    #[error("artifact mismatch: expected {expected}, found {found} ({reason})")]
    #[diagnostic(
        code(sift::artifact_mismatch),
        help("retrain, or load the feature_space.json written next to this model.json")
    )]
    ArtifactMismatch
    {
        expected: String,
        found: String,
        reason: String,
    },

    #[error("invalid keyword set `{set}`: {reason}")]
    #[diagnostic(code(sift::keywords))]
    InvalidKeywordSet
    {
        set: String,
        reason: String,
    },

    #[error("invalid noise pattern `{name}`: {reason}")]
    #[diagnostic(code(sift::noise_pattern))]
    InvalidNoisePattern
    {
        name: String,
        reason: String,
    },

    #[error("invalid parameter `{name}`: {reason}")]
    #[diagnostic(code(sift::parameter))]
    InvalidParameter
    {
        name: String,
        reason: String,
    },

    #[error("I/O error at {}", path.display())]
    #[diagnostic(code(sift::io))]
    Io
    {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}", path.display())]
    #[diagnostic(code(sift::csv))]
    Csv
    {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error in {}", path.display())]
    #[diagnostic(code(sift::json))]
    Json
    {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SiftError
{
    /// Shorthand for schema failures
    pub fn schema(
        source_name: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self
    {
        SiftError::Schema { source_name: source_name.into(), detail: detail.into() }
    }

    /// Shorthand for artifact pairing failures
    pub fn mismatch(
        expected: impl Into<String>,
        found: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self
    {
        SiftError::ArtifactMismatch {
            expected: expected.into(),
            found: found.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn schema_message_names_the_source()
    {
        let e = SiftError::schema("corpus.csv", "missing required column `headline`");
        let msg = e.to_string();
        assert!(msg.contains("corpus.csv"));
        assert!(msg.contains("headline"));
    }

    #[test]
    fn diagnostics_carry_codes()
    {
        let e = SiftError::InsufficientClasses { found: 1 };
        let code = e
            .code()
            .map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("sift::insufficient_classes"));
    }
}
