//! Relevance filter pipeline.
//!
//! Stages run strictly in order and each fully consumes its input:
//! dedupe -> keyword -> exclusion -> noise -> date normalization.
//! Survivors keep their original relative order; retained rows are never
//! altered except for the parsed `date`.

use std::collections::HashSet;

use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::core::article::{Article, RelevanceDecision};
use crate::core::dates::{DateParse, parse_date};
use crate::core::keywords::{KeywordEngine, MatchMode};
use crate::core::noise::NoiseDetector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage
{
    Dedupe,
    Keyword,
    Exclusion,
    Noise,
    DateNormalization,
}

impl std::fmt::Display for Stage
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        let s = match self
        {
            Stage::Dedupe => "dedupe",
            Stage::Keyword => "keyword",
            Stage::Exclusion => "exclusion",
            Stage::Noise => "noise",
            Stage::DateNormalization => "date_normalization",
        };
        f.write_str(s)
    }
}

/// Counts for one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport
{
    pub stage: Stage,
    pub input: usize,
    pub survivors: usize,
}

impl StageReport
{
    pub fn dropped(&self) -> usize
    {
        self.input - self.survivors
    }
}

/// Row-level anomalies recovered locally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineTally
{
    /// Articles whose body was empty when keyword filtering saw them
    pub empty_text: usize,
    /// Non-empty date cells that did not parse (kept with a null date)
    pub dates_unparsed: usize,
    /// Empty date cells (kept with a null date)
    pub dates_missing: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport
{
    pub mode: MatchMode,
    pub keyword_version: String,
    pub stages: Vec<StageReport>,
    pub tally: PipelineTally,
}

impl PipelineReport
{
    pub fn input(&self) -> usize
    {
        self.stages
            .first()
            .map_or(0, |s| s.input)
    }

    pub fn output(&self) -> usize
    {
        self.stages
            .last()
            .map_or(0, |s| s.survivors)
    }
}

/// Filtered corpus plus its audit trail.
#[derive(Debug, Clone)]
pub struct PipelineOutput
{
    pub articles: Vec<Article>,
    pub report: PipelineReport,
}

/// The configured filter.
#[derive(Debug, Clone)]
pub struct RelevanceFilter
{
    engine: KeywordEngine,
    noise: NoiseDetector,
    mode: MatchMode,
}

impl RelevanceFilter
{
    pub fn new(
        engine: KeywordEngine,
        noise: NoiseDetector,
        mode: MatchMode,
    ) -> Self
    {
        Self { engine, noise, mode }
    }

    pub fn mode(&self) -> MatchMode
    {
        self.mode
    }

    pub fn engine(&self) -> &KeywordEngine
    {
        &self.engine
    }

    pub fn noise(&self) -> &NoiseDetector
    {
        &self.noise
    }

    /// Per-article verdict, independent of every other article (no dedupe).
    pub fn decide(
        &self,
        article: &Article,
    ) -> RelevanceDecision
    {
        let keyword_match = self
            .engine
            .candidate(article, self.mode);
        let excluded = self
            .engine
            .vetoed(article, self.mode);
        let noise = self
            .noise
            .is_noise(&article.text);

        RelevanceDecision {
            id: article
                .id
                .clone(),
            keyword_match,
            excluded,
            noise,
            included: keyword_match && !excluded && !noise,
        }
    }

    /// Run every stage over `articles`.
    #[instrument(level = "info", skip_all, fields(mode = %self.mode, input = articles.len()))]
    pub fn run(
        &self,
        articles: Vec<Article>,
    ) -> PipelineOutput
    {
        let mut stages = Vec::with_capacity(5);
        let mut tally = PipelineTally::default();

        let corpus = record(&mut stages, Stage::Dedupe, articles, dedupe);

        let corpus = record(&mut stages, Stage::Keyword, corpus, |rows| {
            tally.empty_text += rows
                .iter()
                .filter(|a| {
                    a.text
                        .trim()
                        .is_empty()
                })
                .count();
            rows.into_iter()
                .filter(|a| {
                    self.engine
                        .matches(a, self.mode)
                })
                .collect()
        });

        let corpus = record(&mut stages, Stage::Exclusion, corpus, |rows| match self.mode
        {
            MatchMode::Permissive => rows
                .into_iter()
                .filter(|a| {
                    !self
                        .engine
                        .excluded(a)
                })
                .collect(),
            MatchMode::Strict => rows,
        });

        let corpus = record(&mut stages, Stage::Noise, corpus, |rows| {
            rows.into_iter()
                .filter(|a| {
                    let noisy = self
                        .noise
                        .is_noise(&a.text);
                    if noisy
                    {
                        debug!(id = %a.id, fired = ?self.noise.matched(&a.text), "noise");
                    }
                    !noisy
                })
                .collect()
        });

        let corpus = record(&mut stages, Stage::DateNormalization, corpus, |rows| {
            normalize_dates(rows, &mut tally)
        });

        info!(
            empty_text = tally.empty_text,
            dates_unparsed = tally.dates_unparsed,
            dates_missing = tally.dates_missing,
            "row-level recoveries"
        );

        PipelineOutput {
            articles: corpus,
            report: PipelineReport {
                mode: self.mode,
                keyword_version: self
                    .engine
                    .version()
                    .to_string(),
                stages,
                tally,
            },
        }
    }
}

fn record<F>(
    stages: &mut Vec<StageReport>,
    stage: Stage,
    rows: Vec<Article>,
    apply: F,
) -> Vec<Article>
where
    F: FnOnce(Vec<Article>) -> Vec<Article>,
{
    let input = rows.len();
    let out = apply(rows);
    let report = StageReport { stage, input, survivors: out.len() };

    info!(stage = %stage, input, survivors = report.survivors, "stage complete");
    stages.push(report);
    out
}

/// Keep the first article of every identical (headline, text) pair.
pub fn dedupe(rows: Vec<Article>) -> Vec<Article>
{
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(rows.len());

    rows.into_iter()
        .filter(|a| {
            seen.insert((
                a.headline
                    .clone(),
                a.text
                    .clone(),
            ))
        })
        .collect()
}

fn normalize_dates(
    rows: Vec<Article>,
    tally: &mut PipelineTally,
) -> Vec<Article>
{
    rows.into_iter()
        .map(|mut a| {
            a.date = match parse_date(&a.raw_date)
            {
                DateParse::Parsed(d) => Some(d),
                DateParse::Missing =>
                {
                    tally.dates_missing += 1;
                    None
                }
                DateParse::Unparsed =>
                {
                    debug!(id = %a.id, raw = %a.raw_date, "unparseable date");
                    tally.dates_unparsed += 1;
                    None
                }
            };
            a
        })
        .collect()
}

/// Reproducible random subset for manual review, in corpus order.
///
/// Returns every article when `n` is at least the corpus size.
pub fn review_sample(
    articles: &[Article],
    n: usize,
    seed: u64,
) -> Vec<Article>
{
    if n >= articles.len()
    {
        return articles.to_vec();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, articles.len(), n).into_vec();
    picked.sort_unstable();

    picked
        .into_iter()
        .map(|i| articles[i].clone())
        .collect()
}
