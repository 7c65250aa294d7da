//! `mg boq`: maintain a project's bill of quantities.

use anyhow::Result;
use clap::{Args, Subcommand};
use marga_core::model::BoqItem;
use marga_core::progress::ItemCompletion;
use serde::Serialize;
use std::io::{self, Write};

use super::Workspace;
use crate::output::{OutputMode, Renderable, format_money, format_percent, render, render_list};

#[derive(Args, Debug)]
pub struct BoqArgs {
    #[command(subcommand)]
    pub command: BoqCommand,
}

#[derive(Subcommand, Debug)]
pub enum BoqCommand {
    /// Add a BoQ line to a project.
    Add(AddArgs),
    /// List BoQ lines with their completion.
    List(ListArgs),
    /// Remove a BoQ line. Reports that referenced it keep their entries.
    Remove(RemoveArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Project ID.
    pub project: String,

    /// Explicit item ID; generated when omitted.
    #[arg(long)]
    pub id: Option<String>,

    /// Item number as printed on the BoQ, e.g. "3.1".
    #[arg(long, default_value = "")]
    pub item_number: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Unit of measure, e.g. m3 or m2.
    #[arg(long, default_value = "")]
    pub unit: String,

    /// Contracted quantity.
    #[arg(long)]
    pub quantity: f64,

    /// Price per unit.
    #[arg(long)]
    pub unit_price: f64,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Project ID.
    pub project: String,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Project ID.
    pub project: String,
    /// BoQ item ID.
    pub item: String,
}

/// Execute `mg boq <subcommand>`.
///
/// # Errors
///
/// Returns an error if the project or item does not exist, the item ID is
/// taken, or the store fails.
pub fn run_boq(args: &BoqArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    match &args.command {
        BoqCommand::Add(add) => run_add(add, output, workspace),
        BoqCommand::List(list) => run_list(list, output, workspace),
        BoqCommand::Remove(remove) => run_remove(remove, output, workspace),
    }
}

fn build_item(args: &AddArgs) -> BoqItem {
    let mut item = BoqItem::new(
        args.id.clone().unwrap_or_default(),
        args.quantity,
        args.unit_price,
    );
    item.item_number.clone_from(&args.item_number);
    item.description.clone_from(&args.description);
    item.unit.clone_from(&args.unit);
    item
}

fn run_add(args: &AddArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    if !args.quantity.is_finite() || args.quantity < 0.0 {
        anyhow::bail!("quantity must be a non-negative number");
    }
    if !args.unit_price.is_finite() || args.unit_price < 0.0 {
        anyhow::bail!("unit price must be a non-negative number");
    }

    let item = workspace
        .tracker()?
        .add_boq_item(&args.project, build_item(args))?;
    render(output, &item, |item, w| {
        if output == OutputMode::Text {
            return writeln!(w, "{}", item.id);
        }
        writeln!(
            w,
            "✓ Added {} {} ({} {} × {})",
            item.id,
            item.item_number,
            item.quantity,
            item.unit,
            format_money(item.unit_price)
        )
    })
}

impl Renderable for ItemCompletion {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{:<6} {}  [{}]",
            self.item_number, self.description, self.boq_item_id
        )?;
        writeln!(
            w,
            "       {} / {} {}  {:>8}  weight {:>7}  value {}",
            self.completed_quantity,
            self.contract_quantity,
            self.unit,
            format_percent(self.percent_complete),
            format_percent(self.weight_percent),
            format_money(self.completed_value)
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.2}",
            self.boq_item_id,
            self.item_number,
            self.unit,
            self.contract_quantity,
            self.reported_quantity,
            self.completed_quantity,
            self.remaining_quantity,
            self.percent_complete,
            self.weight_percent
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &[
            "id",
            "item_number",
            "unit",
            "contract",
            "reported",
            "completed",
            "remaining",
            "percent",
            "weight",
        ]
    }
}

fn run_list(args: &ListArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    let items = workspace.tracker()?.items(&args.project)?;
    if items.is_empty() && !output.is_json() {
        println!("No BoQ lines yet. Add one with `mg boq add {}`.", args.project);
        return Ok(());
    }
    render_list(&items, output)
}

#[derive(Debug, Serialize)]
struct RemoveOutput {
    project_id: String,
    removed: BoqItem,
}

fn run_remove(args: &RemoveArgs, output: OutputMode, workspace: &Workspace) -> Result<()> {
    let removed = workspace
        .tracker()?
        .remove_boq_item(&args.project, &args.item)?;
    let payload = RemoveOutput {
        project_id: args.project.clone(),
        removed,
    };
    render(output, &payload, |p, w| {
        writeln!(w, "✓ Removed {} from {}", p.removed.id, p.project_id)
    })
}
