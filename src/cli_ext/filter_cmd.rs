//! `filter` and `check` handlers.

use anyhow::{Context, Result};
use serde_json::json;
use tabled::Tabled;
use tracing::instrument;

use crate::cli::{AppContext, CheckArgs, FilterArgs};
use crate::cli_ext::render::{Paint, print_json, sibling, table};
use crate::core::pipeline::{PipelineReport, review_sample};
use crate::infra::config::Config;
use crate::infra::io::{read_corpus, write_corpus};

#[derive(Tabled)]
struct StageRow
{
    stage: String,
    input: usize,
    survivors: usize,
    dropped: usize,
}

#[derive(Tabled)]
struct DecisionRow
{
    id: String,
    keyword: String,
    excluded: String,
    noise: String,
    included: String,
}

#[instrument(skip_all, fields(input = %args.input.display()))]
pub fn run_filter(
    args: FilterArgs,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<()>
{
    let delimiter = cfg.delimiter()?;
    let filter = cfg.relevance_filter(args.mode.map(Into::into))?;
    let corpus = read_corpus(&args.input, delimiter)?;

    let out = filter.run(corpus);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sibling(&args.input, "filtered"));

    let sample = args.sample.map(|n| {
        let seed = args
            .seed
            .unwrap_or(cfg.classifier.seed);
        let path = args
            .sample_output
            .clone()
            .unwrap_or_else(|| sibling(&args.input, "sample"));
        (review_sample(&out.articles, n, seed), path)
    });

    if !ctx.dry_run
    {
        write_corpus(&output, &out.articles, delimiter)
            .with_context(|| format!("Failed to write filtered corpus to {}", output.display()))?;
        if let Some((rows, path)) = &sample
        {
            write_corpus(path, rows, delimiter)
                .with_context(|| format!("Failed to write review sample to {}", path.display()))?;
        }
    }

    if args.json
    {
        return print_json(&json!({
            "output": output,
            "written": !ctx.dry_run,
            "sample": sample.as_ref().map(|(rows, path)| json!({ "path": path, "rows": rows.len() })),
            "report": out.report,
        }));
    }

    if !ctx.quiet
    {
        print_report(&out.report, ctx);
        let paint = Paint::new(ctx);
        let verb = if ctx.dry_run { "Would write" } else { "Wrote" };
        println!(
            "{} {verb} {} of {} articles to {}",
            paint.ok("✓"),
            out.report.output(),
            out.report.input(),
            output.display()
        );
        if let Some((rows, path)) = &sample
        {
            println!("{} {verb} review sample of {} to {}", paint.ok("✓"), rows.len(), path.display());
        }
    }
    Ok(())
}

fn print_report(
    report: &PipelineReport,
    ctx: &AppContext,
)
{
    let paint = Paint::new(ctx);
    println!(
        "{} mode={} keywords={}",
        paint.strong("Relevance filter"),
        report.mode,
        report.keyword_version
    );
    println!(
        "{}",
        table(
            report
                .stages
                .iter()
                .map(|s| StageRow {
                    stage: s
                        .stage
                        .to_string(),
                    input: s.input,
                    survivors: s.survivors,
                    dropped: s.dropped(),
                })
        )
    );

    let t = &report.tally;
    if t.empty_text + t.dates_unparsed + t.dates_missing > 0
    {
        println!(
            "{} empty text: {}, unparsed dates: {}, missing dates: {}",
            paint.warn("!"),
            t.empty_text,
            t.dates_unparsed,
            t.dates_missing
        );
    }
}

#[instrument(skip_all, fields(input = %args.input.display()))]
pub fn run_check(
    args: CheckArgs,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<()>
{
    let filter = cfg.relevance_filter(args.mode.map(Into::into))?;
    let corpus = read_corpus(&args.input, cfg.delimiter()?)?;

    let decisions: Vec<_> = corpus
        .iter()
        .map(|a| filter.decide(a))
        .filter(|d| !args.included_only || d.included)
        .collect();

    if args.json
    {
        return print_json(&decisions);
    }

    let paint = Paint::new(ctx);
    let kept = decisions
        .iter()
        .filter(|d| d.included)
        .count();

    println!(
        "{}",
        table(
            decisions
                .iter()
                .map(|d| DecisionRow {
                    id: d
                        .id
                        .clone(),
                    keyword: paint.flag(d.keyword_match),
                    excluded: if d.excluded { paint.bad("yes") } else { "no".into() },
                    noise: if d.noise { paint.warn("yes") } else { "no".into() },
                    included: paint.flag(d.included),
                })
        )
    );
    if !ctx.quiet
    {
        println!("{} of {} articles would be kept (mode={})", kept, corpus.len(), filter.mode());
    }
    Ok(())
}
