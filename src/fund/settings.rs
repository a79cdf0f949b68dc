use crate::error::FundWarnCode;
use crate::fund::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub const DEFAULT_PRICE: f64 = 200.0;

/// View-layer preferences kept apart from the synced ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Default contribution, used when a payment has no explicit amount.
    pub price: f64,
    pub consumption: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            price: DEFAULT_PRICE,
            consumption: 0.0,
        }
    }
}

impl Settings {
    fn from_value(value: &Value) -> Self {
        let price = value
            .get("price")
            .and_then(Value::as_f64)
            .filter(|p| p.is_finite() && *p != 0.0)
            .unwrap_or(DEFAULT_PRICE);
        let consumption = value
            .get("consumption")
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite())
            .unwrap_or(0.0);
        Self { price, consumption }
    }
}

pub fn load(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let parsed = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .and_then(|raw| {
            serde_json::from_str::<Value>(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))
        });
    match parsed {
        Ok(value) => Settings::from_value(&value),
        Err(err) => {
            warn::emit(WarnEvent {
                code: FundWarnCode::SettingsCorrupt,
                stage: "settings",
                action: "load",
                reason: "unreadable-settings",
                err: &format!("{err:#}"),
            });
            Settings::default()
        }
    }
}

pub fn save(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(settings)?;
    fs::write(path, format!("{data}\n"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
