//! Simulation configuration. Loaded from `disaster.ron` at startup.

use engine_core::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::levels::{default_levels, LevelConfig, StageTrigger};

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "disaster.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Scene layout to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Desert,
    City,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Player x/z is clamped to `±half_extent`.
    pub half_extent: f32,
    /// Ground height the player stands on.
    pub floor_y: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            half_extent: 240.0,
            floor_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Walking speed (units/s).
    pub walk_speed: f32,
    pub run_multiplier: f32,
    pub max_health: f32,
    pub start: Vec3,
    /// Half size of the player's collision box.
    pub half_size: f32,
    /// Random displacement per second at intensity 1.
    pub shake_jitter: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 12.0,
            run_multiplier: 2.5,
            max_health: 100.0,
            start: Vec3::new(0.0, 2.0, 0.0),
            half_size: 1.0,
            shake_jitter: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Horizontal distance from a refuge center that counts as sheltered.
    pub refuge_radius: f32,
    pub heal_per_tick: f32,
    pub resolver_interval_ms: u64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            refuge_radius: 25.0,
            heal_per_tick: 0.5,
            resolver_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause between a completed level and the next exploration.
    pub next_level_pause_ms: u64,
    /// How long status messages stay up.
    pub status_ms: u64,
    pub countdown_tick_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            next_level_pause_ms: 3000,
            status_ms: 3000,
            countdown_tick_ms: 1000,
        }
    }
}

/// Structure collapse and debris tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollapseConfig {
    /// Crack progress gained per second; falling starts at 1.
    pub crack_rate: f32,
    /// Fall speed gained per second while cracking (units/s²).
    pub crack_accel: f32,
    /// Fall speed gained per second while falling (units/s²).
    pub fall_accel: f32,
    /// Initial fall speed for pyramids, which topple slower.
    pub pyramid_fall_speed: f32,
    /// Height at which a falling structure becomes debris.
    pub floor_y: f32,
    /// Debris pieces stop moving below this height.
    pub debris_rest_y: f32,
    pub debris_gravity: f32,
    /// Fraction of debris velocity kept after one second.
    pub debris_retention: f32,
    pub debris_lifetime: f32,
    pub debris_per_structure: u32,
    /// Lateral shake amplitude of intact structures at intensity 1.
    pub shake_amplitude: f32,
    pub explosion_lifetime: f32,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            crack_rate: 0.6,
            crack_accel: 36.0,
            fall_accel: 108.0,
            pyramid_fall_speed: 3.0,
            floor_y: -10.0,
            debris_rest_y: -20.0,
            debris_gravity: 20.0,
            debris_retention: 0.3,
            debris_lifetime: 8.0,
            debris_per_structure: 25,
            shake_amplitude: 0.5,
            explosion_lifetime: 1.5,
        }
    }
}

/// Limits for the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Simulated seconds before the runner stops.
    pub max_seconds: f32,
    pub tick_hz: f64,
    /// Pace ticks against the wall clock instead of running flat out.
    pub realtime: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_seconds: 900.0,
            tick_hz: 60.0,
            realtime: false,
        }
    }
}

/// Everything a session needs. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub theme: Theme,
    /// Fixed RNG seed; `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub collapse: CollapseConfig,
    #[serde(default = "default_levels")]
    pub levels: Vec<LevelConfig>,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            seed: None,
            world: WorldConfig::default(),
            player: PlayerConfig::default(),
            safety: SafetyConfig::default(),
            timing: TimingConfig::default(),
            collapse: CollapseConfig::default(),
            levels: default_levels(),
            session: SessionConfig::default(),
        }
    }
}

impl SimConfig {
    /// Read and validate a RON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron(&data).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load `path`, falling back to defaults if it is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                log::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn from_ron(data: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(data).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Reject tables the phase controller cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::Invalid("level table is empty".into()));
        }
        if self.safety.resolver_interval_ms == 0 || self.timing.countdown_tick_ms == 0 {
            return Err(ConfigError::Invalid("timer intervals must be non-zero".into()));
        }
        if !(self.player.max_health > 0.0 && self.player.max_health <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "player max health {} is outside (0, 100]",
                self.player.max_health
            )));
        }
        if self.world.half_extent <= 0.0 {
            return Err(ConfigError::Invalid("world half extent must be positive".into()));
        }
        for level in &self.levels {
            if level.stages.is_empty() {
                return Err(ConfigError::Invalid(format!("level '{}' has no stages", level.name)));
            }
            for (i, stage) in level.stages.iter().enumerate() {
                if stage.duration_ms == 0 {
                    return Err(ConfigError::Invalid(format!(
                        "level '{}' stage {} has zero duration",
                        level.name, i
                    )));
                }
                for trigger in &stage.triggers {
                    let zero_interval = match trigger {
                        StageTrigger::Siren { interval_ms } => *interval_ms == 0,
                        StageTrigger::HazardRain(rain) => rain.interval_ms == 0,
                        _ => false,
                    };
                    if zero_interval {
                        return Err(ConfigError::Invalid(format!(
                            "level '{}' stage {} has a zero interval",
                            level.name, i
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn max_level(&self) -> u32 {
        self.levels.len() as u32
    }
}
