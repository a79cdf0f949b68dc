use crate::fund::paths::FundPaths;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub api_key: String,
    pub project_id: String,
    pub collection: String,
    pub document: String,
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            collection: "office_fund".to_string(),
            document: "ledger".to_string(),
            base_url: DEFAULT_FIRESTORE_BASE_URL.to_string(),
            poll_interval_ms: 2_000,
            request_timeout_secs: 15,
        }
    }
}

impl RemoteConfig {
    /// The remote is usable only with both an API key and a project id.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.project_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How long a command waits for the first remote push before acting on
    /// the cached ledger.
    pub startup_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            startup_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub timezone: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Istanbul".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub request_timeout_secs: u64,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash-lite".to_string(),
            temperature: 0.8,
            request_timeout_secs: 45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FundConfig {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub export: ExportConfig,
    pub nudge: NudgeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialFundConfig {
    remote: Option<RemoteConfig>,
    sync: Option<SyncConfig>,
    export: Option<ExportConfig>,
    nudge: Option<NudgeConfig>,
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_f64(var: &str, fallback: f64) -> f64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<f64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_string_first(vars: &[&str], fallback: &str) -> String {
    for var in vars {
        if let Ok(v) = env::var(var) {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    fallback.to_string()
}

fn validate_segment(label: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("invalid {label}: cannot be empty"));
    }
    if value.contains('/') {
        return Err(anyhow!("invalid {label}: must not contain `/`"));
    }
    Ok(())
}

fn validate(cfg: &FundConfig) -> Result<()> {
    validate_segment("firestore collection", &cfg.remote.collection)?;
    validate_segment("firestore document", &cfg.remote.document)?;
    if !cfg.remote.base_url.starts_with("http://") && !cfg.remote.base_url.starts_with("https://")
    {
        return Err(anyhow!("invalid firestore base url: use http:// or https://"));
    }
    if cfg.remote.poll_interval_ms < 100 {
        return Err(anyhow!("invalid remote poll interval: must be >= 100 ms"));
    }
    if cfg.remote.request_timeout_secs == 0 {
        return Err(anyhow!("invalid remote request timeout: must be >= 1 second"));
    }
    if cfg.export.timezone.parse::<chrono_tz::Tz>().is_err() {
        return Err(anyhow!(
            "invalid export timezone `{}`: use an IANA name such as Europe/Istanbul",
            cfg.export.timezone
        ));
    }
    if !(0.0..=2.0).contains(&cfg.nudge.temperature) {
        return Err(anyhow!("invalid nudge temperature: require 0 <= t <= 2"));
    }
    if cfg.nudge.request_timeout_secs == 0 {
        return Err(anyhow!("invalid nudge request timeout: must be >= 1 second"));
    }
    Ok(())
}

fn merge_file_config(base: &mut FundConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: PartialFundConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse fund config {}: {err}", path.display()))?;
    if let Some(remote) = parsed.remote {
        base.remote = remote;
    }
    if let Some(sync) = parsed.sync {
        base.sync = sync;
    }
    if let Some(export) = parsed.export {
        base.export = export;
    }
    if let Some(nudge) = parsed.nudge {
        base.nudge = nudge;
    }
    Ok(())
}

fn apply_env_overrides(cfg: &mut FundConfig) {
    cfg.remote.api_key = env_or_string("FUND_FIREBASE_API_KEY", &cfg.remote.api_key);
    cfg.remote.project_id = env_or_string("FUND_FIREBASE_PROJECT_ID", &cfg.remote.project_id);
    cfg.remote.collection = env_or_string("FUND_FIRESTORE_COLLECTION", &cfg.remote.collection);
    cfg.remote.document = env_or_string("FUND_FIRESTORE_DOCUMENT", &cfg.remote.document);
    cfg.remote.base_url = env_or_string("FUND_FIRESTORE_BASE_URL", &cfg.remote.base_url);
    cfg.remote.poll_interval_ms = env_or_u64("FUND_REMOTE_POLL_MS", cfg.remote.poll_interval_ms);
    cfg.remote.request_timeout_secs =
        env_or_u64("FUND_REMOTE_TIMEOUT_SECS", cfg.remote.request_timeout_secs);
    cfg.sync.startup_timeout_ms = env_or_u64("FUND_SYNC_TIMEOUT_MS", cfg.sync.startup_timeout_ms);
    cfg.export.timezone = env_or_string("FUND_EXPORT_TIMEZONE", &cfg.export.timezone);
    cfg.nudge.api_key = env_or_string_first(
        &["FUND_GEMINI_API_KEY", "GEMINI_API_KEY"],
        &cfg.nudge.api_key,
    );
    cfg.nudge.model = env_or_string("FUND_GEMINI_MODEL", &cfg.nudge.model);
    cfg.nudge.temperature = env_or_f64("FUND_GEMINI_TEMPERATURE", cfg.nudge.temperature);
}

pub fn load_config(paths: &FundPaths) -> Result<FundConfig> {
    let mut cfg = FundConfig::default();
    merge_file_config(&mut cfg, &paths.config_file)?;
    apply_env_overrides(&mut cfg);
    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_valid_and_unconfigured() {
        let cfg = FundConfig::default();
        assert!(validate(&cfg).is_ok());
        assert!(!cfg.remote.is_configured());
    }

    #[test]
    fn remote_needs_key_and_project() {
        let mut remote = RemoteConfig {
            api_key: "k".into(),
            ..RemoteConfig::default()
        };
        assert!(!remote.is_configured());
        remote.project_id = "office-fund-prod".into();
        assert!(remote.is_configured());
        remote.api_key = "   ".into();
        assert!(!remote.is_configured());
    }

    #[test]
    fn file_sections_replace_defaults_partially() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("fund.toml");
        fs::write(
            &path,
            "[remote]\nproject_id = \"office-fund-prod\"\napi_key = \"abc\"\n\n[export]\ntimezone = \"UTC\"\n",
        )
        .expect("write toml");

        let mut cfg = FundConfig::default();
        merge_file_config(&mut cfg, &path).expect("merge");
        assert!(cfg.remote.is_configured());
        assert_eq!(cfg.remote.collection, "office_fund");
        assert_eq!(cfg.export.timezone, "UTC");
        assert_eq!(cfg.sync.startup_timeout_ms, 5_000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("fund.toml");
        fs::write(&path, "[remote\n").expect("write toml");
        let mut cfg = FundConfig::default();
        assert!(merge_file_config(&mut cfg, &path).is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = FundConfig::default();
        cfg.export.timezone = "Mars/Olympus".into();
        assert!(validate(&cfg).is_err());

        let mut cfg = FundConfig::default();
        cfg.remote.document = "a/b".into();
        assert!(validate(&cfg).is_err());

        let mut cfg = FundConfig::default();
        cfg.remote.poll_interval_ms = 10;
        assert!(validate(&cfg).is_err());
    }
}
