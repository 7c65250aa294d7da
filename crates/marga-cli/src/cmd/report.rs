//! `mg report`: submit, list, and delete weekly progress reports.
//!
//! A submission is validated as a whole. When any rule fails nothing is
//! stored and every violation is printed, not just the first.

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use marga_core::model::{ItemProgress, ReportDraft, WeeklyReport};
use marga_core::progress::ReportProgress;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{Workspace, parse_date};
use crate::output::{
    OutputMode, Renderable, format_money, format_percent, pretty_kv, render, render_list,
    render_mode,
};

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Validate and store a weekly report.
    Submit(SubmitArgs),
    /// List reports with weekly and cumulative progress.
    List(ListArgs),
    /// Delete a report; later figures are recomputed on read.
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Project ID.
    pub project: String,

    /// Week number of the reporting period.
    #[arg(long)]
    pub week: Option<u32>,

    /// First day of the reporting period (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// Last day of the reporting period (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// Narrative of the work done this week.
    #[arg(long)]
    pub description: Option<String>,

    /// Quantity installed for one BoQ line, as `<boq-id>=<quantity>`.
    /// Repeat for several lines.
    #[arg(long = "item", value_name = "BOQ_ID=QTY", value_parser = parse_entry)]
    pub items: Vec<ItemProgress>,

    /// Read the report from a JSON file. Flags given alongside override its
    /// header and add to its items.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Project ID.
    pub project: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Project ID.
    pub project: String,
    /// Report ID.
    pub report: String,
}

/// Execute `mg report <subcommand>`.
///
/// # Errors
///
/// Returns an error if the report is rejected, an ID is unknown, or the
/// store fails.
pub fn run_report(args: &ReportArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    match &args.command {
        ReportCommand::Submit(submit) => run_submit(submit, output, workspace),
        ReportCommand::List(list) => run_list(list, output, workspace),
        ReportCommand::Delete(delete) => run_delete(delete, output, workspace),
    }
}

/// Parse one `<boq-id>=<quantity>` entry.
fn parse_entry(raw: &str) -> Result<ItemProgress, String> {
    let (id, quantity) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("invalid item '{raw}': expected <boq-id>=<quantity>"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("invalid item '{raw}': missing BoQ id"));
    }
    let quantity: f64 = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid item '{raw}': quantity is not a number"))?;
    Ok(ItemProgress::new(id, quantity))
}

fn load_draft(path: &Path) -> Result<ReportDraft> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn build_draft(args: &SubmitArgs) -> Result<ReportDraft> {
    let mut draft = match &args.file {
        Some(path) => load_draft(path)?,
        None => ReportDraft::default(),
    };
    draft.week_number = args.week.or(draft.week_number);
    draft.start_date = args.start.or(draft.start_date);
    draft.end_date = args.end.or(draft.end_date);
    if let Some(description) = &args.description {
        draft.work_description.clone_from(description);
    }
    draft.item_progress.extend(args.items.iter().cloned());
    Ok(draft)
}

fn run_submit(args: &SubmitArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    let draft = build_draft(args)?;
    let report = workspace.tracker()?.submit_report(&args.project, &draft)?;

    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "{}", r.id),
        render_accepted_pretty,
    )
}

fn render_accepted_pretty(report: &WeeklyReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "✓ Accepted week {} report {}",
        report.week_number, report.id
    )?;
    pretty_kv(
        w,
        "Period",
        format!("{} → {}", report.start_date, report.end_date),
    )?;
    for entry in &report.item_progress {
        writeln!(w, "  {:<20} {}", entry.boq_item_id, entry.quantity)?;
    }
    Ok(())
}

impl Renderable for ReportProgress {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "week {:>3}  {} → {}  +{:>7} ({})  cumulative {:>7} ({})  [{}]",
            self.week_number,
            self.start_date,
            self.end_date,
            format_percent(self.weekly_progress),
            format_money(self.weekly_value),
            format_percent(self.cumulative_progress),
            format_money(self.cumulative_value),
            self.report_id
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{:.4}\t{:.4}",
            self.report_id,
            self.week_number,
            self.start_date,
            self.end_date,
            self.weekly_progress,
            self.cumulative_progress
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "week", "start", "end", "weekly", "cumulative"]
    }
}

fn run_list(args: &ListArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    let ledger = workspace.tracker()?.ledger(&args.project)?;
    if ledger.is_empty() && !output.is_json() {
        println!("No weekly reports yet.");
        return Ok(());
    }
    render_list(&ledger, output)
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    project_id: String,
    deleted: WeeklyReport,
}

fn run_delete(args: &DeleteArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    let deleted = workspace
        .tracker()?
        .delete_report(&args.project, &args.report)?;
    let payload = DeleteOutput {
        project_id: args.project.clone(),
        deleted,
    };
    render(output, &payload, |p, w| {
        writeln!(
            w,
            "✓ Deleted week {} report {}",
            p.deleted.week_number, p.deleted.id
        )
    })
}
