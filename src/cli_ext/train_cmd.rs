//! `train` and `evaluate` handlers.

use anyhow::Result;
use serde_json::json;
use tracing::instrument;

use crate::cli::{AppContext, EvaluateArgs, TrainArgs};
use crate::cli_ext::render::{Paint, print_json, spinner};
use crate::core::artifact;
use crate::core::training::train_from_samples;
use crate::infra::config::Config;
use crate::infra::io::read_labeled;

#[instrument(skip_all, fields(labeled = %args.labeled.display()))]
pub fn run_train(
    args: TrainArgs,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<()>
{
    let samples = read_labeled(&args.labeled, cfg.delimiter()?)?;

    let mut features = cfg
        .features
        .clone();
    if let Some(n) = args.max_features
    {
        features.max_features = Some(n);
    }
    let mut split = cfg.split_settings();
    if let Some(seed) = args.seed
    {
        split.seed = seed;
    }
    if let Some(ratio) = args.test_ratio
    {
        split.test_ratio = ratio;
    }

    let pb = spinner(ctx, &format!("training on {} samples", samples.len()));
    let outcome = train_from_samples(&samples, &features, &cfg.train_params(), &split);
    pb.finish_and_clear();
    let outcome = outcome?;

    let dir = args
        .out_dir
        .unwrap_or_else(|| cfg.artifacts.resolved_dir());
    if !ctx.dry_run
    {
        artifact::save(&dir, &outcome.model)?;
    }

    let classifier = outcome
        .model
        .classifier();
    let space = outcome
        .model
        .feature_space();

    if args.json
    {
        return print_json(&json!({
            "model_dir": dir,
            "written": !ctx.dry_run,
            "train_size": outcome.train_size,
            "test_size": outcome.test_size,
            "feature_space_id": space.identity(),
            "vocabulary": space.dim(),
            "iterations": classifier.iterations,
            "converged": classifier.converged,
            "final_loss": classifier.final_loss,
            "report": outcome.report,
        }));
    }

    let paint = Paint::new(ctx);
    if !ctx.quiet
    {
        println!(
            "{} train={} test={} vocabulary={} iterations={}{}",
            paint.strong("Trained"),
            outcome.train_size,
            outcome.test_size,
            space.dim(),
            classifier.iterations,
            if classifier.converged { String::new() } else { paint.warn(" (not converged)") }
        );
        println!();
    }
    print!("{}", outcome.report);
    if !ctx.quiet
    {
        println!();
        let verb = if ctx.dry_run { "Would write" } else { "Wrote" };
        println!("{} {verb} model to {}", paint.ok("✓"), dir.display());
    }
    Ok(())
}

#[instrument(skip_all, fields(labeled = %args.labeled.display()))]
pub fn run_evaluate(
    args: EvaluateArgs,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<()>
{
    let dir = args
        .model_dir
        .unwrap_or_else(|| cfg.artifacts.resolved_dir());
    let (model, info) = artifact::load(&dir)?;
    let samples = read_labeled(&args.labeled, cfg.delimiter()?)?;
    let report = model.evaluate(&samples)?;

    if args.json
    {
        return print_json(&json!({
            "model_dir": dir,
            "trained_at": info.trained_at,
            "feature_space_id": info.feature_space_id,
            "report": report,
        }));
    }

    if !ctx.quiet
    {
        println!(
            "{} {} (trained {}, {} samples)",
            Paint::new(ctx).strong("Model"),
            dir.display(),
            info.trained_at
                .format("%Y-%m-%d %H:%M UTC"),
            samples.len()
        );
        println!();
    }
    print!("{report}");
    Ok(())
}
