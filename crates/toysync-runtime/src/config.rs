//! Runtime configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use toysync_core::RegionId;
use toysync_interest::OutdoorBand;

/// Tuning knobs of the sync server
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Cadence of the full reconcile + drift-dispatch pass
    pub tick_interval: Duration,
    /// Delay between a vantage event and its reconciliation
    pub vantage_debounce: Duration,
    /// Vertical band treated as the surface when no region matches
    pub outdoor_min_y: f32,
    pub outdoor_max_y: f32,
    /// Region the outdoor band resolves to; `None` disables the fallback
    pub surface_region: Option<u64>,
}

impl RuntimeConfig {
    /// Outdoor fallback for the interest manager, if configured
    pub fn outdoor_band(&self) -> Option<OutdoorBand> {
        self.surface_region.map(|region| OutdoorBand {
            min_y: self.outdoor_min_y,
            max_y: self.outdoor_max_y,
            region: RegionId::new(region),
        })
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            tick_interval: Duration::from_millis(250),
            vantage_debounce: Duration::from_millis(50),
            outdoor_min_y: 950.0,
            outdoor_max_y: 1050.0,
            surface_region: None,
        }
    }
}
