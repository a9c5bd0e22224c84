use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::keywords::MatchMode;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "sift")]
#[command(
    about = "Filter news corpora for articles on anti-Black racism and train a relevance classifier"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress spinners and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Run everything but write no files
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file (default: first of sift.toml, sift.yaml, sift.json, .sift.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn context(&self) -> AppContext {
        AppContext {
            quiet: self.quiet,
            no_color: self.no_color,
            dry_run: self.dry_run,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relevance filter over a corpus CSV
    Filter(FilterArgs),

    /// Show the per-article filter decision without writing output
    Check(CheckArgs),

    /// Train a relevance classifier on a labeled CSV
    Train(TrainArgs),

    /// Score a saved model against a labeled CSV
    Evaluate(EvaluateArgs),

    /// Score a corpus CSV with a saved model
    Predict(PredictArgs),

    /// Show the top TF-IDF terms of a text and their weight in the model
    Inspect(InspectArgs),

    /// Initialize a sift.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Keyword combination rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Topic OR qualifier in headline or body, exclusion as a separate stage
    Permissive,
    /// Topic AND qualifier in the body, no exclusion term in the body
    Strict,
}

impl From<ModeArg> for MatchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Permissive => MatchMode::Permissive,
            ModeArg::Strict => MatchMode::Strict,
        }
    }
}

#[derive(Parser)]
pub struct FilterArgs {
    /// Corpus CSV (id, headline, text, date, source)
    pub input: PathBuf,

    /// Output CSV (default: <input>_filtered.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keyword mode, overriding the config
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Print the stage report as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write a random sample of N filtered articles for manual review
    #[arg(long, value_name = "N")]
    pub sample: Option<usize>,

    /// Sample output CSV (default: <input>_sample.csv)
    #[arg(long, requires = "sample")]
    pub sample_output: Option<PathBuf>,

    /// Seed for the review sample (default: classifier seed from config)
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Corpus CSV (id, headline, text, date, source)
    pub input: PathBuf,

    /// Keyword mode, overriding the config
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Only list articles that would be kept
    #[arg(long)]
    pub included_only: bool,

    /// Print decisions as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct TrainArgs {
    /// Labeled CSV (text, sentiment, optional id)
    pub labeled: PathBuf,

    /// Directory for feature_space.json and model.json (default: [artifacts] dir)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Split seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fraction of each class held out for evaluation
    #[arg(long)]
    pub test_ratio: Option<f64>,

    /// Vocabulary size cap
    #[arg(long)]
    pub max_features: Option<usize>,

    /// Print the evaluation report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct EvaluateArgs {
    /// Labeled CSV (text, sentiment, optional id)
    pub labeled: PathBuf,

    /// Model directory (default: [artifacts] dir)
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct PredictArgs {
    /// Corpus CSV (id, headline, text, date, source)
    pub input: PathBuf,

    /// Model directory (default: [artifacts] dir)
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Output CSV (default: <input>_predictions.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only write rows predicted relevant
    #[arg(long)]
    pub only_relevant: bool,

    /// Decision threshold in (0, 1), overriding the one saved with the model
    #[arg(long, value_name = "P")]
    pub threshold: Option<f64>,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Text to inspect
    pub text: String,

    /// Model directory (default: [artifacts] dir)
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Number of terms to show
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
