pub mod expense;
pub mod export;
pub mod list;
pub mod nudge;
pub mod person;
pub mod settings;
pub mod stats;
pub mod status;
pub mod watch;

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::cloud::FirestoreChannel;
use crate::fund::audit;
use crate::fund::config::{FundConfig, load_config};
use crate::fund::ledger::{Applied, LedgerOp};
use crate::fund::model::{Expense, Person};
use crate::fund::paths::{FundPaths, resolve_paths};
use crate::fund::store::FileLedgerStore;
use crate::fund::sync::SyncCoordinator;
use crate::fund::util::truncate_with_ellipsis;

const FEEDBACK_PREVIEW_CHARS: usize = 48;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// A started coordinator over the configured store and remote.
pub struct Session {
    pub paths: FundPaths,
    pub config: FundConfig,
    pub coordinator: SyncCoordinator,
}

pub fn open_session(report: &mut CommandReport) -> Result<Session> {
    let paths = resolve_paths()?;
    let config = load_config(&paths)?;
    let store = Arc::new(FileLedgerStore::new(&paths.ledger_file));
    let remote = Arc::new(FirestoreChannel::new(config.remote.clone())?);
    let coordinator = SyncCoordinator::new(store, remote);
    coordinator.start()?;

    let timeout = Duration::from_millis(config.sync.startup_timeout_ms);
    let synchronized = coordinator.wait_synchronized(timeout);
    report.detail(format!("sync.state={}", coordinator.state().as_str()));
    if !synchronized {
        report.detail("sync.synchronized=false (remote has not answered; showing cached ledger)");
    }

    Ok(Session {
        paths,
        config,
        coordinator,
    })
}

pub fn describe_person(person: &Person) -> String {
    format!(
        "person id={} name={} total_paid={} last_payment={} satisfaction={}",
        person.id,
        person.name,
        person.total_paid,
        person.last_payment_date.as_deref().unwrap_or("-"),
        person
            .satisfaction
            .as_deref()
            .map(|s| truncate_with_ellipsis(s, FEEDBACK_PREVIEW_CHARS))
            .unwrap_or_else(|| "-".to_string()),
    )
}

pub fn describe_expense(expense: &Expense) -> String {
    format!(
        "expense id={} description={} amount={} date={}",
        expense.id, expense.description, expense.amount, expense.date
    )
}

/// Open a session, apply one ledger change and tear down. Rule violations
/// become report issues; storage and remote trouble only logs.
pub fn run_mutation(command: &str, op: LedgerOp) -> Result<CommandReport> {
    let mut report = CommandReport::new(command);
    let session = open_session(&mut report)?;

    match session.coordinator.apply(op.clone()) {
        Ok(applied) => {
            let summary = match &applied {
                Applied::Person(person) => describe_person(person),
                Applied::Expense(expense) => describe_expense(expense),
                Applied::Removed { id } => format!("removed id={id}"),
            };
            audit::record(&session.paths, op.label(), "ok", &summary);
            report.detail(summary);
        }
        Err(err) => report.issue(err.to_string()),
    }

    session.coordinator.shutdown();
    Ok(report)
}
