//! Processing configuration

use crate::error::FluxError;
use crate::metrics::{DEFAULT_EFFICIENCY, DEFAULT_NP_WINDOW};
use crate::types::ColumnSelection;
use serde::{Deserialize, Serialize};

/// Default window for presentation smoothing (samples)
pub const DEFAULT_SMOOTHING_WINDOW: usize = 60;

/// Column used as work rate for energy expenditure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySource {
    #[default]
    Power,
    NormalizedPower,
}

/// Configuration for one processing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluxConfig {
    /// Include the cadence column
    pub cadence: bool,
    /// Include the power and normalized-power columns
    pub power: bool,
    /// Normalized-power window (samples)
    pub np_window: usize,
    /// Mechanical efficiency used for energy expenditure, in (0, 1]
    pub efficiency: f64,
    pub energy_source: EnergySource,
    pub smoothing_window: usize,
}

impl Default for FluxConfig {
    fn default() -> Self {
        Self {
            cadence: false,
            power: false,
            np_window: DEFAULT_NP_WINDOW,
            efficiency: DEFAULT_EFFICIENCY,
            energy_source: EnergySource::Power,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

impl FluxConfig {
    /// Config with both optional column groups enabled
    pub fn with_power_and_cadence() -> Self {
        Self {
            cadence: true,
            power: true,
            ..Self::default()
        }
    }

    /// Load and validate a config from JSON; missing keys take defaults
    pub fn from_json(json: &str) -> Result<Self, FluxError> {
        let config: FluxConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FluxError> {
        if self.np_window == 0 {
            return Err(FluxError::InvalidConfig(
                "np_window must be at least 1".to_string(),
            ));
        }
        if self.smoothing_window == 0 {
            return Err(FluxError::InvalidConfig(
                "smoothing_window must be at least 1".to_string(),
            ));
        }
        if !(self.efficiency > 0.0 && self.efficiency <= 1.0) {
            return Err(FluxError::InvalidConfig(format!(
                "efficiency must be in (0, 1], got {}",
                self.efficiency
            )));
        }
        Ok(())
    }

    pub fn selection(&self) -> ColumnSelection {
        ColumnSelection {
            cadence: self.cadence,
            power: self.power,
        }
    }
}
