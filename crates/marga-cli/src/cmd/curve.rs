//! `mg curve`: planned S-curve against actual completed value.

use anyhow::Result;
use clap::Args;
use marga_core::curve::SeriesPoint;
use std::io::{self, Write};
use std::num::NonZeroU32;

use super::Workspace;
use crate::output::{OutputMode, Renderable, format_money, render_list};

/// Arguments for `mg curve`.
#[derive(Args, Debug)]
pub struct CurveArgs {
    /// Project ID.
    pub project: String,

    /// Days between samples; defaults to `[curve] tick_days`.
    #[arg(long)]
    pub tick_days: Option<NonZeroU32>,
}

impl Renderable for SeriesPoint {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let actual = self
            .actual_value
            .map_or_else(|| "-".to_string(), format_money);
        writeln!(
            w,
            "day {:>4}  {}  t={:.3}  planned {:>16}  actual {:>16}",
            self.day,
            self.date,
            self.t,
            format_money(self.planned_value),
            actual
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let actual = self
            .actual_value
            .map_or_else(String::new, |value| format!("{value:.2}"));
        writeln!(
            w,
            "{}\t{}\t{:.6}\t{:.2}\t{}",
            self.day, self.date, self.t, self.planned_value, actual
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["day", "date", "t", "planned", "actual"]
    }
}

/// Execute `mg curve`.
///
/// # Errors
///
/// Returns an error if the project does not exist or the store fails.
pub fn run_curve(args: &CurveArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    let series = workspace.tracker()?.curve(&args.project, args.tick_days)?;
    render_list(&series, output)
}
