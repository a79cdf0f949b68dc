use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const SCRUBBED_ENV: &[&str] = &[
    "FUND_FIREBASE_API_KEY",
    "FUND_FIREBASE_PROJECT_ID",
    "FUND_GEMINI_API_KEY",
    "GEMINI_API_KEY",
    "FUND_LEDGER_FILE",
    "FUND_SETTINGS_FILE",
    "FUND_LOGS_DIR",
    "FUND_CONFIG_PATH",
];

fn fund(root: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("fund");
    cmd.current_dir(root).env("FUND_HOME", root.join("home"));
    for key in SCRUBBED_ENV {
        cmd.env_remove(key);
    }
    cmd
}

fn report(root: &Path, args: &[&str]) -> Value {
    let out = fund(root)
        .arg("--json")
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&out).expect("json report")
}

fn details(report: &Value) -> Vec<String> {
    report["details"]
        .as_array()
        .expect("details")
        .iter()
        .filter_map(|d| d.as_str().map(str::to_string))
        .collect()
}

fn added_id(report: &Value) -> String {
    details(report)
        .iter()
        .find_map(|d| d.strip_prefix("person id=").or(d.strip_prefix("expense id=")))
        .and_then(|rest| rest.split_whitespace().next())
        .expect("id in report")
        .to_string()
}

fn ledger(root: &Path) -> Value {
    let raw = fs::read_to_string(root.join("home/ledger.json")).expect("read ledger");
    serde_json::from_str(&raw).expect("ledger json")
}

#[test]
fn add_person_then_pay_updates_local_ledger() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();

    let added = report(root, &["add-person", "--name", "Ayşe"]);
    assert_eq!(added["ok"], true);
    let id = added_id(&added);

    let doc = ledger(root);
    assert_eq!(doc["people"].as_array().map(Vec::len), Some(1));
    assert_eq!(doc["people"][0]["name"], "Ayşe");
    assert_eq!(doc["people"][0]["totalPaid"], 0.0);

    report(root, &["pay", "--id", id.as_str(), "--amount", "50"]);
    let doc = ledger(root);
    assert_eq!(doc["people"][0]["totalPaid"], 50.0);
    assert!(doc["people"][0]["lastPaymentDate"].is_string());
    assert!(doc["lastUpdated"].is_string());

    let audit = fs::read_to_string(root.join("home/logs/audit.log")).expect("audit log");
    assert_eq!(audit.lines().count(), 2);
    assert!(audit.contains("add-payment"));
}

#[test]
fn empty_home_reports_zero_stats_in_local_only_mode() {
    let tmp = tempdir().expect("tempdir");
    fund(tmp.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync.state=local-only"))
        .stdout(predicate::str::contains("total_people=0"))
        .stdout(predicate::str::contains("remaining_balance=0"));
}

#[test]
fn legacy_roster_is_migrated_and_rewritten_wrapped() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    fs::create_dir_all(root.join("home")).expect("mkdir home");
    fs::write(
        root.join("home/ledger.json"),
        r#"[{"id":"m1","name":"Mehmet","hasPaid":true,"datePaid":"2023-11-02T08:00:00.000Z"},{"id":"c1","name":"Can","hasPaid":false}]"#,
    )
    .expect("write legacy ledger");

    let listed = report(root, &["list"]);
    let lines = details(&listed);
    assert!(lines.iter().any(|d| d.contains("name=Mehmet total_paid=200")));
    assert!(lines.iter().any(|d| d.contains("name=Can total_paid=0")));

    report(root, &["add-expense", "--description", "beans", "--amount", "30"]);
    let doc = ledger(root);
    assert!(doc.is_object());
    assert_eq!(doc["people"][0]["totalPaid"], 200.0);
    assert!(doc["people"][0].get("hasPaid").is_none());
    assert_eq!(doc["expenses"][0]["amount"], 30.0);

    let stats = details(&report(root, &["stats"]));
    assert!(stats.contains(&"remaining_balance=170".to_string()));
    assert!(stats.contains(&"zero_contributors=1".to_string()));
}

#[test]
fn unknown_person_is_reported_as_failure() {
    let tmp = tempdir().expect("tempdir");
    fund(tmp.path())
        .args(["pay", "--id", "nobody", "--amount", "5"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("no person with id nobody"));
}

#[test]
fn blank_name_is_rejected_without_touching_the_ledger() {
    let tmp = tempdir().expect("tempdir");
    fund(tmp.path())
        .args(["add-person", "--name", "   "])
        .assert()
        .failure()
        .stdout(predicate::str::contains("person name cannot be empty"));
    assert!(!tmp.path().join("home/ledger.json").exists());
}

#[test]
fn pay_without_amount_uses_settings_price() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    report(root, &["settings", "--price", "150"]);
    let id = added_id(&report(root, &["add-person", "--name", "Deniz"]));

    report(root, &["pay", "--id", id.as_str()]);
    assert_eq!(ledger(root)["people"][0]["totalPaid"], 150.0);
}

#[test]
fn export_writes_bom_prefixed_csv() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    report(root, &["add-person", "--name", "Ayşe"]);
    report(root, &["add-expense", "--description", "filters", "--amount", "12.5"]);

    let out = root.join("exports/people.csv");
    report(root, &["export", "--view", "income", "--out", out.to_str().expect("utf8")]);
    let bytes = fs::read(&out).expect("read csv");
    assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
    let text = String::from_utf8(bytes).expect("utf8 csv");
    assert!(text.contains("Name,Total Paid,Last Payment,Note\n\"Ayşe\",\"0\",\"-\",\"-\""));

    let out = root.join("expenses.csv");
    report(root, &["export", "--view", "expense", "--out", out.to_str().expect("utf8")]);
    let text = fs::read_to_string(&out).expect("read csv");
    assert!(text.contains("Description,Date,Amount"));
    assert!(text.contains("\"filters\","));
    assert!(text.ends_with("\"12.5\""));
}

#[test]
fn nudge_without_api_key_falls_back() {
    let tmp = tempdir().expect("tempdir");
    fund(tmp.path())
        .arg("nudge")
        .assert()
        .success()
        .stdout(predicate::str::contains("generator=none"))
        .stdout(predicate::str::contains("message=Şu an yaratıcılığım tıkandı"));
}

#[test]
fn status_lists_paths_and_recognized_env_keys() {
    let tmp = tempdir().expect("tempdir");
    let status = report(tmp.path(), &["status"]);
    let lines = details(&status);
    assert!(lines.contains(&"remote.configured=false".to_string()));
    let env_keys = lines
        .iter()
        .find_map(|d| d.strip_prefix("env_keys="))
        .expect("env keys");
    assert!(env_keys.split(',').any(|k| k == "FUND_HOME"));
    assert!(env_keys.split(',').any(|k| k == "FUND_FIREBASE_API_KEY"));
}

#[test]
fn watch_once_prints_current_stats() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    report(root, &["add-person", "--name", "Ece"]);
    fund(root)
        .args(["watch", "--once"])
        .assert()
        .success()
        .stdout(predicate::str::contains("total_people=1"));
}
