//! Tracing subscriber setup.
//!
//! Logs go to stderr; stdout is reserved for command output. `RUST_LOG`
//! takes precedence over the verbosity flags, and `SIFT_LOG_FORMAT=json`
//! switches to JSON lines.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Level implied by `-v` count and `--quiet`
pub fn level_for(
    verbosity: u8,
    quiet: bool,
) -> LevelFilter
{
    if quiet
    {
        return LevelFilter::ERROR;
    }
    match verbosity
    {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn json_requested() -> bool
{
    std::env::var("SIFT_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Install the global subscriber. Safe to call once per process; later
/// calls are ignored.
pub fn init_tracing(
    verbosity: u8,
    quiet: bool,
    no_color: bool,
)
{
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbosity, quiet).into())
        .from_env_lossy();

    let result = if json_requested()
    {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()
    }
    else
    {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(!no_color)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()
    };

    // Already installed (tests, embedding): keep the existing subscriber
    let _ = result;
}
