//! `predict` and `inspect` handlers.

use anyhow::{Context, Result};
use tabled::Tabled;
use tracing::{debug, instrument};

use crate::cli::{AppContext, InspectArgs, PredictArgs};
use crate::cli_ext::render::{Paint, print_json, sibling, table};
use crate::core::artifact;
use crate::core::labels::Label;
use crate::infra::config::Config;
use crate::infra::io::{PredictionRow, read_corpus, write_predictions};

#[derive(Tabled)]
struct TermRow
{
    term: String,
    tfidf: String,
    weight: String,
    contribution: String,
}

#[instrument(skip_all, fields(input = %args.input.display()))]
pub fn run_predict(
    args: PredictArgs,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<()>
{
    let dir = args
        .model_dir
        .unwrap_or_else(|| cfg.artifacts.resolved_dir());
    let (model, _) = artifact::load(&dir)?;
    let saved = model
        .classifier()
        .threshold;
    let model = match args.threshold
    {
        Some(t) => model.with_threshold(t)?,
        None =>
        {
            if cfg.classifier.threshold != saved
            {
                debug!(
                    saved,
                    configured = cfg.classifier.threshold,
                    "using the threshold saved with the model; pass --threshold to override"
                );
            }
            model
        }
    };

    let delimiter = cfg.delimiter()?;
    let corpus = read_corpus(&args.input, delimiter)?;
    let texts: Vec<&str> = corpus
        .iter()
        .map(|a| a.text.as_str())
        .collect();

    let rows: Vec<PredictionRow> = corpus
        .iter()
        .zip(model.score_all(&texts))
        .map(|(a, scored)| PredictionRow {
            id: a
                .id
                .clone(),
            headline: a
                .headline
                .clone(),
            probability: scored.probability,
            label: scored.label,
        })
        .filter(|r| !args.only_relevant || r.label == Label::Relevant)
        .collect();

    let relevant = rows
        .iter()
        .filter(|r| r.label == Label::Relevant)
        .count();

    let output = args
        .output
        .unwrap_or_else(|| sibling(&args.input, "predictions"));
    if !ctx.dry_run
    {
        write_predictions(&output, &rows, delimiter)
            .with_context(|| format!("Failed to write predictions to {}", output.display()))?;
    }

    if !ctx.quiet
    {
        let verb = if ctx.dry_run { "Would write" } else { "Wrote" };
        println!(
            "{} Scored {} articles, {} relevant; {verb} {} rows to {}",
            Paint::new(ctx).ok("✓"),
            corpus.len(),
            relevant,
            rows.len(),
            output.display()
        );
    }
    Ok(())
}

#[instrument(skip_all)]
pub fn run_inspect(
    args: InspectArgs,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<()>
{
    let dir = args
        .model_dir
        .unwrap_or_else(|| cfg.artifacts.resolved_dir());
    let (model, _) = artifact::load(&dir)?;
    let explanation = model.explain(&args.text, args.top);

    if args.json
    {
        return print_json(&explanation);
    }

    let paint = Paint::new(ctx);
    let label = match explanation.label
    {
        Label::Relevant => paint.ok("relevant"),
        Label::Irrelevant => paint.strong("irrelevant"),
    };
    println!("{label} (p = {:.4}, bias = {:.4})", explanation.probability, explanation.bias);

    if explanation
        .terms
        .is_empty()
    {
        println!("{} no known terms in this text", paint.warn("!"));
        return Ok(());
    }

    println!(
        "{}",
        table(
            explanation
                .terms
                .iter()
                .map(|t| TermRow {
                    term: t
                        .term
                        .clone(),
                    tfidf: format!("{:.4}", t.tfidf),
                    weight: format!("{:+.4}", t.weight),
                    contribution: format!("{:+.4}", t.contribution),
                })
        )
    );
    Ok(())
}
