use crate::fund::store::LEDGER_FILE_NAME;
use anyhow::{Result, anyhow};
use std::env;
use std::path::PathBuf;

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const CONFIG_FILE_NAME: &str = "fund.toml";

#[derive(Debug, Clone)]
pub struct FundPaths {
    pub fund_home: PathBuf,
    pub ledger_file: PathBuf,
    pub settings_file: PathBuf,
    pub logs_dir: PathBuf,
    pub config_file: PathBuf,
}

fn env_path(var: &str) -> Option<PathBuf> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(PathBuf::from(v.trim())),
        _ => None,
    }
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    env_path(var).unwrap_or(fallback)
}

fn fund_home_from(explicit: Option<PathBuf>, home_dir: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(|| home_dir.map(|home| home.join(".office-fund")))
        .ok_or_else(|| anyhow!("HOME directory could not be resolved; set FUND_HOME"))
}

/// `FUND_HOME`, or `~/.office-fund`.
pub fn fund_home() -> Result<PathBuf> {
    fund_home_from(env_path("FUND_HOME"), dirs::home_dir())
}

fn dotenv_candidates(cwd: Option<PathBuf>, fund_home: Option<PathBuf>) -> Vec<PathBuf> {
    cwd.into_iter()
        .chain(fund_home)
        .map(|dir| dir.join(".env"))
        .collect()
}

/// Load the first usable `.env`: the working directory's, then the fund
/// home's. Runs before the logger exists, so failures stay silent.
pub fn load_dotenv() {
    for path in dotenv_candidates(env::current_dir().ok(), fund_home().ok()) {
        if path.is_file() && dotenvy::from_path(&path).is_ok() {
            return;
        }
    }
}

pub fn resolve_paths() -> Result<FundPaths> {
    let fund_home = fund_home()?;

    let ledger_file = env_or_default_path("FUND_LEDGER_FILE", fund_home.join(LEDGER_FILE_NAME));
    let settings_file =
        env_or_default_path("FUND_SETTINGS_FILE", fund_home.join(SETTINGS_FILE_NAME));
    let logs_dir = env_or_default_path("FUND_LOGS_DIR", fund_home.join("logs"));
    let config_file = env_or_default_path("FUND_CONFIG_PATH", fund_home.join(CONFIG_FILE_NAME));

    Ok(FundPaths {
        fund_home,
        ledger_file,
        settings_file,
        logs_dir,
        config_file,
    })
}

#[cfg(test)]
pub fn test_paths(root: &std::path::Path) -> FundPaths {
    FundPaths {
        fund_home: root.to_path_buf(),
        ledger_file: root.join(LEDGER_FILE_NAME),
        settings_file: root.join(SETTINGS_FILE_NAME),
        logs_dir: root.join("logs"),
        config_file: root.join(CONFIG_FILE_NAME),
    }
}
