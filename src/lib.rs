//! **tabloid-sift** - Relevance filtering and classification for news corpora
//!
//! Keyword rules plus an event-listing detector narrow a corpus down to
//! articles about anti-Black racism; a TF-IDF + logistic-regression model
//! trained on hand labels scores what the rules cannot decide.

/// Command-line interface with clap integration
pub mod cli;

/// Command handlers behind each subcommand
pub mod cli_ext;

/// Shell completion generation
pub mod completion;

/// Core algorithms - normalization, rules, pipeline, features, classifier
pub mod core {
    /// Error taxonomy shared by every core module
    pub mod error;
    pub use error::{Result, SiftError};

    /// Lowercasing, punctuation stripping, tokenization
    pub mod normalize;

    /// Article record and per-article verdict
    pub mod article;
    pub use article::{Article, RelevanceDecision};

    /// Literal keyword sets compiled to Aho-Corasick automata
    pub mod keywords;
    pub use keywords::{KeywordEngine, KeywordSet, KeywordSets, MatchMode};

    /// Regex predicates for event listings
    pub mod noise;
    pub use noise::{NoiseDetector, NoisePattern};

    /// Permissive date parsing
    pub mod dates;

    /// Staged relevance filter with per-stage counts
    pub mod pipeline;
    pub use pipeline::{PipelineReport, RelevanceFilter};

    /// TF-IDF vocabulary and sparse vectors
    pub mod features;
    pub use features::{FeatureSpace, TfidfVectorizer, VectorizerParams};

    /// Binary labels and labeled samples
    pub mod labels;
    pub use labels::{Label, LabeledSample};

    /// Seeded stratified split
    pub mod split;

    /// Accuracy, precision, recall, F1
    pub mod metrics;
    pub use metrics::EvaluationReport;

    /// Class-balanced L2 logistic regression
    pub mod classifier;
    pub use classifier::{ClassifierModel, TrainParams};

    /// Feature space + classifier pairing
    pub mod model;
    pub use model::RelevanceModel;

    /// Split, fit, train, evaluate
    pub mod training;

    /// Model directory persistence
    pub mod artifact;
}

/// Infrastructure - Configuration, CSV I/O, logging
pub mod infra {
    /// Layered configuration (file, then SIFT__ environment)
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Corpus, label and prediction CSV files
    pub mod io;

    /// Tracing subscriber setup
    pub mod logging;
}

pub use cli::{AppContext, Cli, Commands};
pub use infra::{Config, load_config};
