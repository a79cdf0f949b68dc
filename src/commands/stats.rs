use anyhow::Result;

use crate::commands::{CommandReport, open_session};
use crate::fund::ledger::Stats;

pub fn stats_details(stats: &Stats) -> Vec<String> {
    vec![
        format!("total_people={}", stats.total_people),
        format!("contributors={}", stats.contributors_count),
        format!("zero_contributors={}", stats.zero_contribution_count),
        format!("total_collected={}", stats.total_collected),
        format!("total_spent={}", stats.total_spent),
        format!("remaining_balance={}", stats.remaining_balance),
    ]
}

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("stats");
    let session = open_session(&mut report)?;
    for line in stats_details(&session.coordinator.stats()) {
        report.detail(line);
    }
    session.coordinator.shutdown();
    Ok(report)
}
