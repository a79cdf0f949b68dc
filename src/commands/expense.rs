use anyhow::Result;

use crate::commands::{CommandReport, run_mutation};
use crate::fund::ledger::LedgerOp;

pub fn add(description: &str, amount: f64) -> Result<CommandReport> {
    run_mutation(
        "add-expense",
        LedgerOp::AddExpense {
            description: description.to_string(),
            amount,
        },
    )
}

pub fn remove(id: &str) -> Result<CommandReport> {
    run_mutation("remove-expense", LedgerOp::RemoveExpense { id: id.to_string() })
}
