//! Terminal output shared by the command handlers.

use std::path::{Path, PathBuf};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::AppContext;

/// Colour helpers that degrade to plain text under `--no-color`.
#[derive(Debug, Clone, Copy)]
pub struct Paint
{
    enabled: bool,
}

impl Paint
{
    pub fn new(ctx: &AppContext) -> Self
    {
        Self { enabled: !ctx.no_color }
    }

    pub fn ok(
        &self,
        s: &str,
    ) -> String
    {
        if self.enabled { s.green().to_string() } else { s.to_string() }
    }

    pub fn warn(
        &self,
        s: &str,
    ) -> String
    {
        if self.enabled { s.yellow().to_string() } else { s.to_string() }
    }

    pub fn bad(
        &self,
        s: &str,
    ) -> String
    {
        if self.enabled { s.red().to_string() } else { s.to_string() }
    }

    pub fn strong(
        &self,
        s: &str,
    ) -> String
    {
        if self.enabled { s.bold().to_string() } else { s.to_string() }
    }

    pub fn flag(
        &self,
        on: bool,
    ) -> String
    {
        if on { self.ok("yes") } else { "no".to_string() }
    }
}

/// Spinner for long steps; hidden under `--quiet`.
pub fn spinner(
    ctx: &AppContext,
    msg: &str,
) -> ProgressBar
{
    if ctx.quiet
    {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

pub fn table<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String
{
    Table::new(rows)
        .with(Style::sharp())
        .to_string()
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()>
{
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `<dir>/<stem>_<suffix>.csv` next to `input`
pub fn sibling(
    input: &Path,
    suffix: &str,
) -> PathBuf
{
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| "corpus".into());
    input.with_file_name(format!("{stem}_{suffix}.csv"))
}
