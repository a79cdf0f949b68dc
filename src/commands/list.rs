use anyhow::Result;

use crate::commands::{CommandReport, describe_expense, describe_person, open_session};
use crate::fund::export::ViewMode;

pub fn run(view: ViewMode) -> Result<CommandReport> {
    let mut report = CommandReport::new("list");
    let session = open_session(&mut report)?;
    let snapshot = session.coordinator.snapshot();

    report.detail(format!("view={}", view.as_str()));
    match view {
        ViewMode::Income => {
            report.detail(format!("people={}", snapshot.people.len()));
            for person in &snapshot.people {
                report.detail(describe_person(person));
            }
        }
        ViewMode::Expense => {
            report.detail(format!("expenses={}", snapshot.expenses.len()));
            for expense in &snapshot.expenses {
                report.detail(describe_expense(expense));
            }
        }
    }
    if let Some(updated) = &snapshot.last_updated {
        report.detail(format!("last_updated={updated}"));
    }

    session.coordinator.shutdown();
    Ok(report)
}
