use anyhow::Result;

use crate::assets;
use crate::commands::{CommandReport, open_session};
use crate::fund::audit::AUDIT_FILE_NAME;

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("status");
    let session = open_session(&mut report)?;
    let paths = &session.paths;
    let remote = &session.config.remote;

    report.detail(format!("fund_home={}", paths.fund_home.display()));
    report.detail(format!("ledger_file={}", paths.ledger_file.display()));
    report.detail(format!("settings_file={}", paths.settings_file.display()));
    report.detail(format!("config_file={}", paths.config_file.display()));
    report.detail(format!(
        "audit_log={}",
        paths.logs_dir.join(AUDIT_FILE_NAME).display()
    ));
    report.detail(format!("remote.configured={}", remote.is_configured()));
    if remote.is_configured() {
        report.detail(format!(
            "remote.document={}/{}/{}",
            remote.project_id, remote.collection, remote.document
        ));
    }
    report.detail(format!(
        "sync.synchronized={}",
        session.coordinator.is_synchronized()
    ));
    report.detail(format!("env_keys={}", assets::env_allowlist().join(",")));

    if !paths.ledger_file.exists() {
        report.detail("ledger_file.exists=false (created on first change)");
    }

    session.coordinator.shutdown();
    Ok(report)
}
