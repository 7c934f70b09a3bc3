//! Engine configuration — tempo, tick rate and seeding, loaded from
//! ~/.gradus/config.yaml.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Engine configuration loaded from YAML. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tempo in beats per minute.
    pub bpm: f64,
    /// Scheduler ticks per beat, used when `tick_interval_secs` is unset.
    pub ticks_per_beat: u32,
    /// Fixed tick interval in seconds; overrides `ticks_per_beat`.
    pub tick_interval_secs: Option<f64>,
    /// Seed for RANDOM arpeggios.
    pub seed: u64,
    /// Octave every performer starts in.
    pub default_octave: i32,
    /// `tracing` filter for the binary.
    pub log_level: String,
    /// Stop after this many ticks. Looping songs otherwise play until
    /// interrupted.
    pub max_ticks: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            ticks_per_beat: 24,
            tick_interval_secs: None,
            seed: 42,
            default_octave: crate::performer::DEFAULT_OCTAVE,
            log_level: "warn".to_string(),
            max_ticks: None,
        }
    }
}

impl EngineConfig {
    /// Load config from the standard path (~/.gradus/config.yaml).
    /// Returns None if the file doesn't exist, doesn't parse or fails
    /// [`validate`](Self::validate).
    pub fn load() -> Option<Self> {
        let path = default_config_path()?;
        let content = std::fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.validate().ok()?;
        Some(config)
    }

    /// Load config from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, io::Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Tempo and tick rate must give a finite, positive tick interval.
    pub fn validate(&self) -> Result<(), io::Error> {
        let invalid = |msg: String| -> Result<(), io::Error> {
            Err(io::Error::new(io::ErrorKind::InvalidData, msg))
        };
        if !positive(self.bpm) {
            return invalid(format!("bpm must be a positive number, got {}", self.bpm));
        }
        if self.ticks_per_beat == 0 {
            return invalid("ticks_per_beat must be at least 1".to_string());
        }
        if let Some(secs) = self.tick_interval_secs {
            if !positive(secs) {
                return invalid(format!("tick_interval_secs must be a positive number, got {secs}"));
            }
        }
        if !positive(self.tick_interval()) {
            return invalid(format!(
                "bpm {} with {} ticks per beat gives no usable tick interval",
                self.bpm, self.ticks_per_beat
            ));
        }
        Ok(())
    }

    /// Write config as YAML, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self).map_err(io::Error::other)?;
        std::fs::write(path, yaml)
    }

    /// Seconds between scheduler ticks.
    pub fn tick_interval(&self) -> f64 {
        match self.tick_interval_secs {
            Some(secs) if secs > 0.0 => secs,
            _ => 60.0 / self.bpm / self.ticks_per_beat.max(1) as f64,
        }
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// ~/.gradus/config.yaml, if a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".gradus");
    path.push("config.yaml");
    Some(path)
}
