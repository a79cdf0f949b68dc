use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{
    self, CommandReport, export::ExportOptions, settings::SettingsOptions, watch::WatchOptions,
};
use crate::fund::export::ViewMode;

#[derive(Debug, Parser)]
#[command(
    name = "fund",
    version,
    about = "Shared office fund: roster payments, expenses and a cloud-synced ledger"
)]
struct Cli {
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show paths, remote configuration and sync state.
    Status,
    /// List people (income view) or expenses.
    List {
        #[arg(long, value_enum, default_value_t = ViewMode::Income)]
        view: ViewMode,
    },
    AddPerson {
        #[arg(long)]
        name: String,
    },
    /// Record a payment; defaults to the configured contribution price.
    Pay {
        #[arg(long)]
        id: String,
        #[arg(long, allow_negative_numbers = true)]
        amount: Option<f64>,
    },
    /// Set (or with an empty value, clear) a person's feedback.
    Rate {
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "")]
        feedback: String,
    },
    RemovePerson {
        #[arg(long)]
        id: String,
    },
    AddExpense {
        #[arg(long)]
        description: String,
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,
    },
    RemoveExpense {
        #[arg(long)]
        id: String,
    },
    Stats,
    /// Write the current view as CSV.
    Export {
        #[arg(long, value_enum, default_value_t = ViewMode::Income)]
        view: ViewMode,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a payment reminder for the office chat.
    Nudge,
    Settings {
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        consumption: Option<f64>,
    },
    /// Follow ledger changes; `--once` prints current stats and exits.
    Watch {
        #[arg(long)]
        once: bool,
    },
}

fn render(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let status = if report.ok { "ok" } else { "failed" };
    println!("{}: {status}", report.command);
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Status => commands::status::run()?,
        Command::List { view } => commands::list::run(view)?,
        Command::AddPerson { name } => commands::person::add(&name)?,
        Command::Pay { id, amount } => commands::person::pay(&id, amount)?,
        Command::Rate { id, feedback } => commands::person::rate(&id, &feedback)?,
        Command::RemovePerson { id } => commands::person::remove(&id)?,
        Command::AddExpense {
            description,
            amount,
        } => commands::expense::add(&description, amount)?,
        Command::RemoveExpense { id } => commands::expense::remove(&id)?,
        Command::Stats => commands::stats::run()?,
        Command::Export { view, out } => commands::export::run(&ExportOptions { view, out })?,
        Command::Nudge => commands::nudge::run()?,
        Command::Settings { price, consumption } => {
            commands::settings::run(&SettingsOptions { price, consumption })?
        }
        Command::Watch { once } => commands::watch::run(&WatchOptions { once })?,
    };

    render(&report, cli.json)?;
    if !report.ok {
        bail!(
            "{} failed with {} issue(s)",
            report.command,
            report.issues.len()
        );
    }
    Ok(())
}
