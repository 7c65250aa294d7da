//! `mg status`: schedule health of one project at a glance.
//!
//! Physical progress against elapsed contract time, the deadline window,
//! and how long the site has gone without a weekly report.

use anyhow::Result;
use clap::Args;
use marga_core::summary::ProjectSummary;
use std::io::{self, Write};

use super::Workspace;
use crate::output::{OutputMode, format_money, format_percent, pretty_kv, pretty_section, render_mode};

/// Arguments for `mg status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Project ID.
    pub project: String,
}

/// Execute `mg status`.
///
/// # Errors
///
/// Returns an error if the project does not exist or the store fails.
pub fn run_status(args: &StatusArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    let summary = workspace.tracker()?.summary(&args.project)?;
    render_mode(output, &summary, render_summary_text, |s, w| {
        pretty_section(w, &format!("{}  {}", s.project_id, s.name))?;
        render_summary_pretty(s, w)
    })
}

fn last_report_label(summary: &ProjectSummary) -> String {
    match summary.days_since_last_report {
        None => "never".to_string(),
        Some(0) => "today".to_string(),
        Some(days) if days < 0 => format!("dated {} day(s) ahead", -days),
        Some(days) => format!("{days} day(s) ago"),
    }
}

pub(super) fn render_summary_pretty(s: &ProjectSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_kv(w, "Contract value", format_money(s.contract_value))?;
    pretty_kv(w, "Completed", format_money(s.completed_value))?;
    pretty_kv(w, "Physical", format_percent(s.physical_progress))?;
    pretty_kv(w, "Time elapsed", format_percent(s.time_progress))?;
    pretty_kv(
        w,
        "Slippage",
        format!("{:+.2} pts ({})", s.slippage, s.status),
    )?;
    pretty_kv(w, "Deadline", &s.deadline.label)?;
    pretty_kv(
        w,
        "Last report",
        format!("{} ({})", last_report_label(s), s.staleness),
    )?;
    if s.future_dated_reports {
        writeln!(w, "  note: some reports are dated in the future")?;
    }
    Ok(())
}

pub(super) fn render_summary_text(s: &ProjectSummary, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "contract_value\t{:.2}", s.contract_value)?;
    writeln!(w, "completed_value\t{:.2}", s.completed_value)?;
    writeln!(w, "physical_progress\t{:.2}", s.physical_progress)?;
    writeln!(w, "time_progress\t{:.2}", s.time_progress)?;
    writeln!(w, "slippage\t{:.2}", s.slippage)?;
    writeln!(w, "status\t{}", s.status)?;
    writeln!(w, "deadline\t{}\t{}", s.deadline.status, s.deadline.days_remaining)?;
    match s.days_since_last_report {
        Some(days) => writeln!(w, "days_since_last_report\t{days}")?,
        None => writeln!(w, "days_since_last_report\t-")?,
    }
    writeln!(w, "staleness\t{}", s.staleness)
}
