use std::path::PathBuf;

use serde::Deserialize;

fn default_true() -> bool {
    true
}

fn default_refresh_seconds() -> u64 {
    300
}

fn default_target_temperature() -> f64 {
    0.0
}

/// Configuration for the CUPRA integration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Enable the integration (default: true when the section is present)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON file seeding the simulated account; the built-in demo fleet is
    /// used when unset.
    #[serde(default)]
    pub fleet_file: Option<PathBuf>,

    /// Seconds between fleet refreshes
    #[serde(default = "default_refresh_seconds")]
    pub refresh_seconds: u64,

    /// Target cabin temperature sent with climatisation start/stop commands.
    /// 0.0 keeps the temperature stored in the vehicle.
    #[serde(default = "default_target_temperature")]
    pub target_temperature_c: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            fleet_file: None,
            refresh_seconds: default_refresh_seconds(),
            target_temperature_c: default_target_temperature(),
        }
    }
}
