use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub project_name: String,
    pub default_task: String,
    pub work_day_hours: f64,
    /// Only "local" wall-clock time is supported.
    pub timezone: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_name: "DeepSafe".to_string(),
            default_task: "development".to_string(),
            work_day_hours: 8.0,
            timezone: "local".to_string(),
        }
    }
}

impl Config {
    pub fn target_minutes(&self) -> f64 {
        self.work_day_hours * 60.0
    }
}

/// Reads `config.json` from the data directory, merging it over the defaults.
/// Writes the defaults out when the file does not exist yet.
pub fn load_config(dir: &Path) -> Result<Config> {
    let path = dir.join(CONFIG_FILE);

    if !path.exists() {
        let config = Config::default();
        let data = serde_json::to_string_pretty(&config)?;
        fs::write(&path, data)
            .with_context(|| format!("Could not write {}", path.display()))?;
        debug!(path = %path.display(), "wrote default config");
        return Ok(config);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let config: Config = serde_json::from_str(&data)
        .with_context(|| format!("Could not parse {}", path.display()))?;

    if config.timezone != "local" {
        warn!(timezone = %config.timezone, "only local wall-clock time is supported");
    }
    debug!(?config, "loaded config");
    Ok(config)
}
