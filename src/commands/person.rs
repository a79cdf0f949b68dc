use anyhow::Result;

use crate::commands::{CommandReport, run_mutation};
use crate::fund::ledger::LedgerOp;
use crate::fund::paths::resolve_paths;
use crate::fund::settings;

pub fn add(name: &str) -> Result<CommandReport> {
    run_mutation(
        "add-person",
        LedgerOp::AddPerson {
            name: name.to_string(),
        },
    )
}

/// Record a payment. Without an explicit amount the configured default
/// contribution is used.
pub fn pay(id: &str, amount: Option<f64>) -> Result<CommandReport> {
    let amount = match amount {
        Some(amount) => amount,
        None => settings::load(&resolve_paths()?.settings_file).price,
    };
    run_mutation(
        "pay",
        LedgerOp::AddPayment {
            id: id.to_string(),
            amount,
        },
    )
}

pub fn rate(id: &str, feedback: &str) -> Result<CommandReport> {
    run_mutation(
        "rate",
        LedgerOp::RatePerson {
            id: id.to_string(),
            feedback: feedback.to_string(),
        },
    )
}

pub fn remove(id: &str) -> Result<CommandReport> {
    run_mutation("remove-person", LedgerOp::RemovePerson { id: id.to_string() })
}
