use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "AudioConfig::default_latency_ms")]
    pub latency_ms: f32,
    #[serde(default = "AudioConfig::default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default)]
    pub output_guard: OutputGuardSetting,
}

impl AudioConfig {
    fn default_latency_ms() -> f32 {
        50.0
    }
    fn default_sample_rate() -> u32 {
        48_000
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            latency_ms: Self::default_latency_ms(),
            sample_rate: Self::default_sample_rate(),
            output_guard: OutputGuardSetting::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputGuardSetting {
    None,
    SoftClip,
    PeakLimiter,
}

impl Default for OutputGuardSetting {
    fn default() -> Self {
        Self::PeakLimiter
    }
}

/// Impulse-to-velocity calibration. The scale constant depends on the mass
/// model of the external physics engine; observed calibrations are 30_000
/// (with threshold 10) and 100_000 (with threshold 20), so both knobs are
/// configuration rather than constants in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionConfig {
    #[serde(default = "CollisionConfig::default_impulse_scale")]
    pub impulse_scale: f32,
    #[serde(default = "CollisionConfig::default_min_velocity")]
    pub min_velocity: u8,
}

impl CollisionConfig {
    fn default_impulse_scale() -> f32 {
        30_000.0
    }
    fn default_min_velocity() -> u8 {
        10
    }
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            impulse_scale: Self::default_impulse_scale(),
            min_velocity: Self::default_min_velocity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub collision: CollisionConfig,
}

impl AppConfig {
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        warn!("failed to parse config {path}: {err}; using defaults");
                    }
                },
                Err(err) => {
                    warn!("failed to read config {path}: {err}; using defaults");
                }
            }
            return Self::default();
        }

        // File does not exist: write defaults and return them.
        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                if let Err(err) = fs::write(path_obj, text) {
                    warn!("failed to write default config to {path}: {err}");
                }
            }
            Err(err) => {
                warn!("failed to serialize default config: {err}");
            }
        }
        default_cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [collision]
            impulse_scale = 100000.0
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.collision.impulse_scale, 100_000.0);
        assert_eq!(cfg.collision.min_velocity, 10);
        assert_eq!(cfg.audio.sample_rate, 48_000);
        assert_eq!(cfg.audio.output_guard, OutputGuardSetting::PeakLimiter);
    }

    #[test]
    fn guard_setting_round_trips() {
        let text = toml::to_string(&AppConfig::default()).expect("serialize");
        let back: AppConfig = toml::from_str(&text).expect("parse");
        assert_eq!(back.audio.output_guard, OutputGuardSetting::PeakLimiter);
    }
}
