use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tabloid_sift::cli::{Cli, Commands};
use tabloid_sift::cli_ext;
use tabloid_sift::core::SiftError;
use tabloid_sift::infra::{config, logging};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.quiet, cli.no_color);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Build a context once, pass everywhere
    let ctx = cli.context();

    let load = || config::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Init(args) => config::init(args, &ctx),
        Commands::Completions(args) => tabloid_sift::completion::run(args, &ctx),
        Commands::Filter(args) => cli_ext::run_filter(args, &load()?, &ctx),
        Commands::Check(args) => cli_ext::run_check(args, &load()?, &ctx),
        Commands::Train(args) => cli_ext::run_train(args, &load()?, &ctx),
        Commands::Evaluate(args) => cli_ext::run_evaluate(args, &load()?, &ctx),
        Commands::Predict(args) => cli_ext::run_predict(args, &load()?, &ctx),
        Commands::Inspect(args) => cli_ext::run_inspect(args, &load()?, &ctx),
    }
}

/// Library errors get the miette rendering with code and help; everything
/// else prints its context chain.
fn report(err: anyhow::Error) {
    match err.downcast::<SiftError>() {
        Ok(sift) => eprintln!("{:?}", miette::Report::new(sift)),
        Err(other) => eprintln!("Error: {other:?}"),
    }
}
