use anyhow::Result;

use crate::commands::{CommandReport, open_session};
use crate::fund::ledger::{top_contributors, zero_contributors};
use crate::fund::nudge::{GeminiGenerator, MessageGenerator, motivation_message};

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("nudge");
    let session = open_session(&mut report)?;
    let snapshot = session.coordinator.snapshot();
    session.coordinator.shutdown();

    let zero = zero_contributors(&snapshot);
    let top = top_contributors(&snapshot);
    let generator = GeminiGenerator::from_config(&session.config.nudge);
    if generator.is_none() {
        report.detail("generator=none (set FUND_GEMINI_API_KEY or GEMINI_API_KEY)");
    } else {
        report.detail(format!("generator=gemini model={}", session.config.nudge.model));
    }

    let message = motivation_message(
        generator.as_ref().map(|g| g as &dyn MessageGenerator),
        &zero,
        &top,
    );
    report.detail(format!("zero_contributors={}", zero.len()));
    report.detail(format!("contributors={}", top.len()));
    report.detail(format!("message={message}"));
    Ok(report)
}
