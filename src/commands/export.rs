use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::fs;
use std::path::PathBuf;

use crate::commands::{CommandReport, open_session};
use crate::fund::export::{ViewMode, render_csv, today_file_name};

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub view: ViewMode,
    pub out: Option<PathBuf>,
}

pub fn run(opts: &ExportOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("export");
    let session = open_session(&mut report)?;
    let snapshot = session.coordinator.snapshot();
    session.coordinator.shutdown();

    let tz: Tz = session
        .config
        .export
        .timezone
        .parse()
        .map_err(|err| anyhow::anyhow!("invalid export timezone: {err}"))?;
    let csv = render_csv(&snapshot, opts.view, tz);
    let out = opts
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(today_file_name(opts.view)));
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&out, csv.as_bytes()).with_context(|| format!("failed to write {}", out.display()))?;

    let rows = match opts.view {
        ViewMode::Income => snapshot.people.len(),
        ViewMode::Expense => snapshot.expenses.len(),
    };
    report.detail(format!("view={}", opts.view.as_str()));
    report.detail(format!("rows={rows}"));
    report.detail(format!("timezone={tz}"));
    report.detail(format!("path={}", out.display()));
    Ok(report)
}
