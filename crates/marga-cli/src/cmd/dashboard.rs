//! `mg dashboard`: portfolio roll-up across every project.

use anyhow::Result;
use clap::Args;
use marga_core::summary::PortfolioSummary;
use std::io::{self, Write};

use super::Workspace;
use crate::output::{
    OutputMode, format_money, format_percent, pretty_kv, pretty_section, render_mode,
};

/// Arguments for `mg dashboard`.
#[derive(Args, Debug, Default)]
pub struct DashboardArgs {
    /// Only list projects that are delayed or at risk.
    #[arg(long)]
    pub behind: bool,
}

/// Execute `mg dashboard`.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn run_dashboard(args: &DashboardArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    let mut portfolio = workspace.tracker()?.portfolio()?;
    if args.behind {
        portfolio.projects.retain(|p| p.status.is_behind());
    }
    render_mode(output, &portfolio, render_dashboard_text, render_dashboard_pretty)
}

fn render_dashboard_pretty(p: &PortfolioSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Portfolio")?;
    pretty_kv(w, "Projects", p.project_count.to_string())?;
    pretty_kv(w, "Contract value", format_money(p.total_contract_value))?;
    pretty_kv(w, "Completed", format_money(p.total_completed_value))?;
    pretty_kv(w, "Road length", format!("{:.0} m", p.total_length_m))?;
    pretty_kv(w, "Avg progress", format_percent(p.average_progress))?;
    pretty_kv(w, "Behind", p.behind_count.to_string())?;
    writeln!(w)?;

    pretty_section(w, "Schedule")?;
    for (status, count) in &p.by_status {
        pretty_kv(w, status.as_str(), count.to_string())?;
    }
    writeln!(w)?;

    pretty_section(w, "Reporting")?;
    for (staleness, count) in &p.by_staleness {
        pretty_kv(w, staleness.as_str(), count.to_string())?;
    }
    writeln!(w)?;

    pretty_section(w, "Physical progress")?;
    for (bucket, count) in &p.by_bucket {
        pretty_kv(w, bucket.label(), count.to_string())?;
    }

    if !p.projects.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Projects")?;
        for project in &p.projects {
            writeln!(
                w,
                "{:<9} {:>8}  {}  {}",
                project.status.as_str(),
                format_percent(project.physical_progress),
                project.project_id,
                project.name
            )?;
        }
    }
    Ok(())
}

fn render_dashboard_text(p: &PortfolioSummary, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "project_count\t{}", p.project_count)?;
    writeln!(w, "total_contract_value\t{:.2}", p.total_contract_value)?;
    writeln!(w, "total_completed_value\t{:.2}", p.total_completed_value)?;
    writeln!(w, "total_length_m\t{:.2}", p.total_length_m)?;
    writeln!(w, "average_progress\t{:.2}", p.average_progress)?;
    writeln!(w, "behind_count\t{}", p.behind_count)?;
    for (status, count) in &p.by_status {
        writeln!(w, "status.{status}\t{count}")?;
    }
    for (staleness, count) in &p.by_staleness {
        writeln!(w, "staleness.{staleness}\t{count}")?;
    }
    for (bucket, count) in &p.by_bucket {
        writeln!(w, "progress.{}\t{count}", bucket.label())?;
    }
    Ok(())
}
