use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::classifier::TrainParams;
use crate::core::error::SiftError;
use crate::core::features::VectorizerParams;
use crate::core::keywords::{KeywordEngine, KeywordSet, KeywordSets, MatchMode};
use crate::core::noise::{NoiseDetector, NoisePattern, default_patterns, optional_pattern};
use crate::core::pipeline::RelevanceFilter;
use crate::core::training::SplitSettings;

/// Config file names probed in the working directory, first match wins
pub const CONFIG_FILES: [&str; 4] = ["sift.toml", "sift.yaml", "sift.json", ".sift.toml"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Topic, qualifier and exclusion term lists
    pub keywords: KeywordsConfig,

    /// Event-listing predicates
    pub noise: NoiseConfig,

    pub pipeline: PipelineConfig,

    pub corpus: CorpusConfig,

    /// TF-IDF settings
    pub features: VectorizerParams,

    pub classifier: ClassifierConfig,

    pub artifacts: ArtifactsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordsConfig
{
    pub version: String,
    pub topic: Vec<String>,
    pub qualifier: Vec<String>,
    pub exclusion: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig
{
    pub case_insensitive: bool,
    /// Optional builtins enabled by name (e.g. `phone`)
    pub enable: Vec<String>,
    pub patterns: Vec<NoisePattern>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig
{
    pub mode: MatchMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig
{
    /// Single-byte field delimiter
    pub delimiter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig
{
    pub test_ratio: f64,
    pub seed: u64,
    pub c: f64,
    pub max_iter: usize,
    pub tolerance: f64,
    pub balanced: bool,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig
{
    pub dir: PathBuf,
}

fn strings(items: &[&str]) -> Vec<String>
{
    items
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for KeywordsConfig
{
    fn default() -> Self
    {
        Self {
            version: "austria-africa-v1".to_string(),
            topic: strings(&[
                "Schwarze",
                "Afrikaner",
                "Afrikanische Wurzeln",
                "Afrikanischer Hintergrund",
                "Afrikanische Herkunft",
                "Afro",
                "Dunkelhäutig",
                "Schwarzafrika",
                "Sub-Sahara Afrika",
                "Angola",
                "Benin",
                "Botswana",
                "Burkina Faso",
                "Burundi",
                "Kamerun",
                "Kap Verde",
                "Zentralafrikanische Republik",
                "Tschad",
                "Komoren",
                "Kongo",
                "Demokratische Republik Kongo",
                "Dschibuti",
                "Äquatorialguinea",
                "Eritrea",
                "Swasiland",
                "Äthiopien",
                "Gabun",
                "Gambia",
                "Ghana",
                "Guinea",
                "Guinea-Bissau",
                "Elfenbeinküste",
                "Kenia",
                "Lesotho",
                "Liberia",
                "Madagaskar",
                "Malawi",
                "Mali",
                "Mauretanien",
                "Mauritius",
                "Mosambik",
                "Namibia",
                "Niger",
                "Nigeria",
                "Ruanda",
                "São Tomé und Príncipe",
                "Senegal",
                "Seychellen",
                "Sierra Leone",
                "Somalia",
                "Südafrika",
                "Südsudan",
                "Sudan",
                "Tansania",
                "Togo",
                "Uganda",
                "Sambia",
                "Simbabwe",
            ]),
            qualifier: strings(&[
                "Rassismus",
                "Diskriminierung",
                "Vorurteile",
                "Stereotyp",
                "Fremdenfeindlichkeit",
                "Benachteiligung",
                "Hassverbrechen",
                "Racial Profiling",
                "Kolonialismus",
                "Struktureller Rassismus",
                "Antischwarzer Rassismus",
                "Weiße Vorherrschaft",
                "Systemischer Rassismus",
                "Rassistische Gewalt",
            ]),
            exclusion: strings(&["Mode", "Kleider", "Veranstaltung", "Event", "Schwarzenegger"]),
        }
    }
}

impl Default for NoiseConfig
{
    fn default() -> Self
    {
        Self { case_insensitive: true, enable: Vec::new(), patterns: default_patterns() }
    }
}

impl Default for CorpusConfig
{
    fn default() -> Self
    {
        Self { delimiter: ",".to_string() }
    }
}

impl Default for ClassifierConfig
{
    fn default() -> Self
    {
        let train = TrainParams::default();
        let split = SplitSettings::default();
        Self {
            test_ratio: split.test_ratio,
            seed: split.seed,
            c: train.c,
            max_iter: train.max_iter,
            tolerance: train.tolerance,
            balanced: train.balanced,
            threshold: train.threshold,
        }
    }
}

impl Default for ArtifactsConfig
{
    fn default() -> Self
    {
        Self { dir: PathBuf::from("model") }
    }
}

impl ArtifactsConfig
{
    /// `dir` with `~` and `$VAR` expanded; unexpandable values are kept as-is.
    pub fn resolved_dir(&self) -> PathBuf
    {
        let raw = self
            .dir
            .to_string_lossy();
        match shellexpand::full(&raw)
        {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => self
                .dir
                .clone(),
        }
    }
}

impl Config
{
    pub fn keyword_sets(&self) -> crate::core::error::Result<KeywordSets>
    {
        let k = &self.keywords;
        Ok(KeywordSets {
            version: k
                .version
                .clone(),
            topic: KeywordSet::new("topic", &k.topic)?,
            qualifier: KeywordSet::new("qualifier", &k.qualifier)?,
            exclusion: KeywordSet::new("exclusion", &k.exclusion)?,
        })
    }

    /// Configured patterns followed by any enabled optional builtins.
    pub fn noise_detector(&self) -> crate::core::error::Result<NoiseDetector>
    {
        let mut patterns = self
            .noise
            .patterns
            .clone();

        for name in &self.noise.enable
        {
            let extra = optional_pattern(name).ok_or_else(|| SiftError::InvalidNoisePattern {
                name: name.clone(),
                reason: "no optional builtin with this name".to_string(),
            })?;
            if !patterns
                .iter()
                .any(|p| p.name == extra.name)
            {
                patterns.push(extra);
            }
        }

        NoiseDetector::new(&patterns, self.noise.case_insensitive)
    }

    /// Build the filter; `mode` overrides `[pipeline] mode` when given.
    pub fn relevance_filter(
        &self,
        mode: Option<MatchMode>,
    ) -> crate::core::error::Result<RelevanceFilter>
    {
        let engine = KeywordEngine::new(self.keyword_sets()?)?;
        Ok(RelevanceFilter::new(engine, self.noise_detector()?, mode.unwrap_or(self.pipeline.mode)))
    }

    pub fn train_params(&self) -> TrainParams
    {
        let c = &self.classifier;
        TrainParams {
            c: c.c,
            max_iter: c.max_iter,
            tolerance: c.tolerance,
            balanced: c.balanced,
            threshold: c.threshold,
        }
    }

    pub fn split_settings(&self) -> SplitSettings
    {
        SplitSettings { test_ratio: self.classifier.test_ratio, seed: self.classifier.seed }
    }

    /// The corpus delimiter as the single byte the CSV reader expects.
    pub fn delimiter(&self) -> crate::core::error::Result<u8>
    {
        match self
            .corpus
            .delimiter
            .as_bytes()
        {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(SiftError::InvalidParameter {
                name: "corpus.delimiter".to_string(),
                reason: format!("`{}` is not a single ASCII character", self.corpus.delimiter),
            }),
        }
    }
}

/// Load defaults, then the first config file found (or `explicit`), then
/// `SIFT__SECTION__KEY` environment overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<Config>
{
    let mut builder = config::Config::builder();

    match explicit
    {
        Some(path) =>
        {
            if !path.exists()
            {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            builder = builder.add_source(config::File::from(path).required(true));
        }
        None =>
        {
            for path in &CONFIG_FILES
            {
                if Path::new(path).exists()
                {
                    builder = builder.add_source(config::File::from(Path::new(path)));
                    break;
                }
            }
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SIFT")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("sift.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("Would write {} bytes to {}", toml_string.len(), config_path.display());
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
