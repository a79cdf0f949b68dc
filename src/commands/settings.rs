use anyhow::Result;

use crate::commands::CommandReport;
use crate::fund::paths::resolve_paths;
use crate::fund::settings;

#[derive(Debug, Clone, Default)]
pub struct SettingsOptions {
    pub price: Option<f64>,
    pub consumption: Option<f64>,
}

pub fn run(opts: &SettingsOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("settings");
    let mut current = settings::load(&paths.settings_file);

    let mut changed = false;
    if let Some(price) = opts.price {
        if !price.is_finite() || price <= 0.0 {
            report.issue(format!("invalid price {price}: must be greater than zero"));
            return Ok(report);
        }
        current.price = price;
        changed = true;
    }
    if let Some(consumption) = opts.consumption {
        if !consumption.is_finite() || consumption < 0.0 {
            report.issue(format!("invalid consumption {consumption}: must be zero or more"));
            return Ok(report);
        }
        current.consumption = consumption;
        changed = true;
    }
    if changed {
        settings::save(&paths.settings_file, &current)?;
        report.detail("settings saved");
    }

    report.detail(format!("settings_file={}", paths.settings_file.display()));
    report.detail(format!("price={}", current.price));
    report.detail(format!("consumption={}", current.consumption));
    Ok(report)
}
