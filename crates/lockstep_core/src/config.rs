// =============================================================================
// CONFIG - startup configuration
// =============================================================================
//! Kernel configuration, loaded once at startup from TOML.
//!
//! Capacities and the tick rate are startup decisions; nothing here is
//! reloadable at runtime. Missing fields fall back to the defaults in
//! `lockstep_shared`, so a partial file (or none at all) is fine.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use lockstep_shared::{DEFAULT_ENTITY_CAPACITY, DEFAULT_MAX_FRAME_STEP_US, DEFAULT_TICK_HZ};

use crate::time::{Ticks, TICKS_PER_SECOND};

/// Why a configuration failed to load.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file was not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The values parsed but make no sense together.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Startup parameters for the kernel.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelConfig {
    /// Entity table size. Pools are sized separately, per component type.
    pub entity_capacity: usize,
    /// Fixed physics rate in steps per second.
    pub tick_hz: u32,
    /// Largest game-time advance a single frame may produce, in
    /// microseconds.
    pub max_frame_step_us: u64,
    /// Initial game clock scale.
    pub time_scale: f32,
    /// Run Render on its own thread, pipelined against Core.
    pub threaded_render: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            entity_capacity: DEFAULT_ENTITY_CAPACITY,
            tick_hz: DEFAULT_TICK_HZ,
            max_frame_step_us: DEFAULT_MAX_FRAME_STEP_US,
            time_scale: 1.0,
            threaded_render: true,
        }
    }
}

impl KernelConfig {
    /// Parses a TOML document. Absent fields keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: KernelConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading config");
        Self::from_toml(&fs::read_to_string(path)?)
    }

    /// The fixed physics step in kernel ticks.
    #[must_use]
    pub fn step_ticks(&self) -> Ticks {
        TICKS_PER_SECOND / Ticks::from(self.tick_hz)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.entity_capacity == 0 {
            return Err(ConfigError::Invalid("entity_capacity must be non-zero".into()));
        }
        if self.tick_hz == 0 || Ticks::from(self.tick_hz) > TICKS_PER_SECOND {
            return Err(ConfigError::Invalid(format!("unusable tick_hz {}", self.tick_hz)));
        }
        if self.max_frame_step_us < self.step_ticks() {
            return Err(ConfigError::Invalid(
                "max_frame_step_us smaller than one physics step".into(),
            ));
        }
        if !(self.time_scale.is_finite() && self.time_scale >= 0.0) {
            return Err(ConfigError::Invalid(format!("unusable time_scale {}", self.time_scale)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = KernelConfig::from_toml("").unwrap();
        assert_eq!(config.entity_capacity, DEFAULT_ENTITY_CAPACITY);
        assert_eq!(config.tick_hz, DEFAULT_TICK_HZ);
        assert!(config.threaded_render);
    }

    #[test]
    fn partial_document_overlays_defaults() {
        let config = KernelConfig::from_toml("tick_hz = 120\nthreaded_render = false\n").unwrap();
        assert_eq!(config.tick_hz, 120);
        assert!(!config.threaded_render);
        assert_eq!(config.entity_capacity, DEFAULT_ENTITY_CAPACITY);
        assert_eq!(config.step_ticks(), 8_333);
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        let err = KernelConfig::from_toml("tick_hz = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = KernelConfig::from_toml("tick_rate = 60").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
