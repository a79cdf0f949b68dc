use anyhow::Result;
use std::thread;
use std::time::Duration;

use crate::commands::stats::stats_details;
use crate::commands::{CommandReport, open_session};
use crate::fund::ledger::Stats;
use crate::fund::model::LedgerSnapshot;
use crate::fund::util::now_iso8601;

#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    pub once: bool,
}

const IDLE_TICK: Duration = Duration::from_secs(60);

pub fn run(opts: &WatchOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("watch");
    let session = open_session(&mut report)?;

    if opts.once {
        for line in stats_details(&session.coordinator.stats()) {
            report.detail(line);
        }
        session.coordinator.shutdown();
        return Ok(report);
    }

    log::info!(
        "watching ledger in {} mode",
        session.coordinator.state().as_str()
    );
    let _updates = session.coordinator.subscribe(Box::new(|snapshot: &LedgerSnapshot| {
        let stats = Stats::from_snapshot(snapshot);
        println!(
            "{} people={} expenses={} collected={} spent={} balance={}",
            now_iso8601(),
            stats.total_people,
            snapshot.expenses.len(),
            stats.total_collected,
            stats.total_spent,
            stats.remaining_balance
        );
    }));
    loop {
        thread::sleep(IDLE_TICK);
    }
}
