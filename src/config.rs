//! Application and physics configuration, loaded from RON with a default
//! fallback.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("failed to serialize config: {0}")]
    RonSer(#[from] ron::Error),
}

/// Physics parameters for the particle solver.
///
/// `substeps_per_tick` is the number of dispatch+barrier solver sub-steps per
/// simulation tick. Issuing many GPU sub-steps per CPU tick amortizes
/// command-issue overhead at the cost of coarser CPU-side time resolution;
/// raise it for stiffer, more stable settling, lower it for finer control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    pub substeps_per_tick: u32,

    /// Simulated seconds advanced per tick, split evenly across sub-steps.
    pub fixed_timestep: f32,

    /// Gravity along -Z, world units / s^2.
    pub gravity: f32,

    /// Radius of the circular floor particles collide with.
    pub floor_radius: f32,

    /// Velocity fraction retained on floor bounce.
    pub restitution: f32,

    /// Particle collision/render radius.
    pub particle_radius: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            substeps_per_tick: 20,
            fixed_timestep: 1.0 / 60.0,
            gravity: -9.81,
            floor_radius: 30.0,
            restitution: 0.45,
            particle_radius: 0.12,
        }
    }
}

/// Initial particle placement: a regular XY grid with a linear height ramp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub min_xy: f32,
    pub max_xy: f32,
    pub spacing: f32,
    /// z = (ramp_slope * (x + y) + ramp_offset) / ramp_scale
    pub ramp_slope: f32,
    pub ramp_offset: f32,
    pub ramp_scale: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            min_xy: -12.25,
            max_xy: 12.5,
            spacing: 0.125,
            ramp_slope: 0.5,
            ramp_offset: 40.0,
            ramp_scale: 20.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub physics: PhysicsConfig,
    pub spawn: SpawnConfig,
}

impl AppConfig {
    /// Load from a RON file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&contents)?)
    }

    /// Load from a RON file, falling back to defaults (with a log line) when
    /// the file is missing or malformed.
    pub fn load_or_default(path: &str) -> Self {
        match Self::load(path) {
            Ok(config) => {
                log::info!("loaded config from {path}");
                config
            }
            Err(err) => {
                log::warn!("config {path}: {err}; using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_substep_count() {
        assert_eq!(PhysicsConfig::default().substeps_per_tick, 20);
    }

    #[test]
    fn test_ron_roundtrip() {
        let config = AppConfig {
            physics: PhysicsConfig {
                substeps_per_tick: 8,
                gravity: -1.62,
                ..Default::default()
            },
            spawn: SpawnConfig::default(),
        };

        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let parsed: AppConfig = ron::from_str(&text).unwrap();

        assert_eq!(parsed.physics.substeps_per_tick, 8);
        assert_eq!(parsed.physics.gravity, -1.62);
        assert_eq!(parsed.spawn.spacing, config.spawn.spacing);
    }

    #[test]
    fn test_malformed_config_falls_back_to_default() {
        let config = AppConfig::load_or_default("/nonexistent/particle-lab.ron");
        assert_eq!(config.physics.substeps_per_tick, 20);
    }
}
