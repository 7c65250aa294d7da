//! `mg project`: create, list, inspect, and delete contracts.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use marga_core::model::{ParseEnumError, Project};
use marga_core::summary::ProjectSummary;
use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;

use super::{Workspace, parse_date};
use crate::output::{
    OutputMode, Renderable, format_percent, pretty_kv, pretty_section, render,
    render_list, render_mode,
};

#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Register a new contract.
    Create(CreateArgs),
    /// List every project with its current schedule health.
    List,
    /// Show one project's record and derived figures.
    Show(ProjectIdArg),
    /// Delete a project with its BoQ and reports.
    Delete(ProjectIdArg),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Project (road segment) name.
    #[arg(long)]
    pub name: String,

    /// Contract start date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    pub start: NaiveDate,

    /// Contract end date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    pub end: NaiveDate,

    #[arg(long)]
    pub contractor: Option<String>,

    #[arg(long)]
    pub supervisor: Option<String>,

    #[arg(long)]
    pub district: Option<String>,

    #[arg(long)]
    pub sub_district: Option<String>,

    /// rigid-pavement, flexible-pavement, combination, or other.
    #[arg(long)]
    pub work_type: Option<String>,

    /// JAS, JKS, JLS, Jling-S, or "J-ling Kota".
    #[arg(long)]
    pub road_hierarchy: Option<String>,

    /// reconstruction, rehabilitation, periodic-rehabilitation, or routine-maintenance.
    #[arg(long)]
    pub maintenance_type: Option<String>,

    /// Segment length in metres.
    #[arg(long)]
    pub length: Option<f64>,

    /// Average carriageway width in metres.
    #[arg(long)]
    pub width: Option<f64>,
}

#[derive(Args, Debug)]
pub struct ProjectIdArg {
    /// Project ID.
    pub id: String,
}

/// Execute `mg project <subcommand>`.
///
/// # Errors
///
/// Returns an error if the store fails or the project does not exist.
pub fn run_project(args: &ProjectArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    match &args.command {
        ProjectCommand::Create(create) => run_create(create, output, workspace),
        ProjectCommand::List => run_list(output, workspace),
        ProjectCommand::Show(show) => run_show(&show.id, output, workspace),
        ProjectCommand::Delete(delete) => run_delete(&delete.id, output, workspace),
    }
}

fn parse_optional<T: FromStr>(raw: Option<&String>) -> Result<Option<T>, T::Err> {
    raw.map(|value| value.parse()).transpose()
}

fn build_project(args: &CreateArgs) -> Result<Project, ParseEnumError> {
    let mut project = Project::new(args.name.trim(), args.start, args.end);
    project.contractor = args.contractor.clone().unwrap_or_default();
    project.supervisor = args.supervisor.clone().unwrap_or_default();
    project.district = args.district.clone().unwrap_or_default();
    project.sub_district = args.sub_district.clone().unwrap_or_default();
    project.work_type = parse_optional(args.work_type.as_ref())?;
    project.road_hierarchy = parse_optional(args.road_hierarchy.as_ref())?;
    project.maintenance_type = parse_optional(args.maintenance_type.as_ref())?;
    project.length_m = args.length.unwrap_or_default();
    project.average_width_m = args.width.unwrap_or_default();
    Ok(project)
}

fn run_create(args: &CreateArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    if args.name.trim().is_empty() {
        anyhow::bail!("project name must not be empty");
    }
    if args.end < args.start {
        tracing::warn!(
            start = %args.start,
            end = %args.end,
            "contract ends before it starts; time progress will read 100%"
        );
    }

    let project = build_project(args)?;
    let project = workspace.tracker()?.create_project(project)?;

    render_mode(
        output,
        &project,
        |p, w| writeln!(w, "{}", p.id),
        |p, w| {
            writeln!(w, "✓ Created project {} ({})", p.id, p.name)?;
            pretty_kv(w, "Contract", format!("{} → {}", p.start_date, p.end_date))
        },
    )
}

impl Renderable for ProjectSummary {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}  {}", self.project_id, self.name)?;
        writeln!(
            w,
            "    {:<9} physical {:>8}  time {:>8}  {}  ends {}",
            self.status.as_str(),
            format_percent(self.physical_progress),
            format_percent(self.time_progress),
            self.staleness,
            self.end_date
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{:.2}\t{:.2}\t{}\t{}",
            self.project_id,
            self.name,
            self.status,
            self.physical_progress,
            self.time_progress,
            self.staleness,
            self.end_date
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "name", "status", "physical", "time", "staleness", "end_date"]
    }
}

fn run_list(output: OutputMode, workspace: &Workspace) -> Result<()> {
    let portfolio = workspace.tracker()?.portfolio()?;
    if portfolio.projects.is_empty() && !output.is_json() {
        println!("No projects yet. Create one with `mg project create`.");
        return Ok(());
    }
    render_list(&portfolio.projects, output)
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    project: Project,
    summary: ProjectSummary,
}

fn run_show(id: &str, output: OutputMode, workspace: &Workspace) -> Result<()> {
    let tracker = workspace.tracker()?;
    let project = tracker.project(id)?;
    let summary = tracker.summary(id)?;
    let payload = ShowOutput { project, summary };

    render_mode(output, &payload, render_show_text, render_show_pretty)
}

fn optional<T: ToString>(value: Option<&T>) -> String {
    value.map_or_else(|| "-".to_string(), ToString::to_string)
}

fn render_show_pretty(payload: &ShowOutput, w: &mut dyn Write) -> io::Result<()> {
    let p = &payload.project;
    let s = &payload.summary;
    pretty_section(w, &format!("{}  {}", p.id, p.name))?;
    pretty_kv(w, "Contractor", &p.contractor)?;
    pretty_kv(w, "Supervisor", &p.supervisor)?;
    pretty_kv(w, "District", format!("{} / {}", p.district, p.sub_district))?;
    pretty_kv(w, "Work type", optional(p.work_type.as_ref()))?;
    pretty_kv(w, "Road class", optional(p.road_hierarchy.as_ref()))?;
    pretty_kv(w, "Maintenance", optional(p.maintenance_type.as_ref()))?;
    pretty_kv(w, "Contract", format!("{} → {}", p.start_date, p.end_date))?;
    pretty_kv(
        w,
        "Segment",
        format!("{} m × {} m", p.length_m, p.average_width_m),
    )?;
    pretty_kv(w, "BoQ lines", p.boq.len().to_string())?;
    pretty_kv(w, "Reports", s.report_count.to_string())?;
    writeln!(w)?;
    super::status::render_summary_pretty(s, w)
}

fn render_show_text(payload: &ShowOutput, w: &mut dyn Write) -> io::Result<()> {
    let p = &payload.project;
    writeln!(w, "id\t{}", p.id)?;
    writeln!(w, "name\t{}", p.name)?;
    writeln!(w, "contractor\t{}", p.contractor)?;
    writeln!(w, "start_date\t{}", p.start_date)?;
    writeln!(w, "end_date\t{}", p.end_date)?;
    writeln!(w, "boq_items\t{}", p.boq.len())?;
    super::status::render_summary_text(&payload.summary, w)
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    deleted: String,
}

fn run_delete(id: &str, output: OutputMode, workspace: &Workspace) -> Result<()> {
    workspace.tracker()?.remove_project(id)?;
    let payload = DeleteOutput {
        deleted: id.to_string(),
    };
    render(output, &payload, |p, w| {
        writeln!(w, "✓ Deleted project {}", p.deleted)
    })
}
