use charge_engine::EstimatorConfig;
use serde::{Deserialize, Serialize};

/// Root configuration structure parsed from `chargemon.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeConfig {
    /// Estimator tunables (capacity, horizon, thresholds, caps).
    pub estimator: EstimatorConfig,
    /// Battery feed polling settings.
    pub poll: PollConfig,
    /// Presentation-only preferences.
    pub display: DisplayConfig,
}

/// How often the sysfs battery interface is polled for changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Poll cadence in milliseconds.
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_ms: 1_000 }
    }
}

/// Display preferences. Informational only — nothing here feeds back into
/// the estimation pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Log the raw battery percentage instead of the derived readout.
    pub raw_percent: bool,
}
