use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for clip-collage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Clip scheduling settings
    pub schedule: ScheduleConfig,

    /// Render backend settings
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string(),
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.schedule.validate()?;
        self.render.validate()?;
        Ok(())
    }
}

/// Clip scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Multiplier applied to the supplied audio period
    pub multiplier: f64,

    /// Seed driving the reproducible clip selection
    pub seed: String,

    /// Keep clips in draw order instead of sorting chronologically
    pub shuffle: bool,

    /// Require twice the period between any two clip starts
    pub double_spacing: bool,

    /// Rejection-sampling attempts per clip before giving up
    pub max_attempts: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            seed: "amaze me".to_string(),
            shuffle: false,
            double_spacing: false,
            max_attempts: 10_000,
        }
    }
}

impl ScheduleConfig {
    fn validate(&self) -> Result<()> {
        if self.multiplier <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "schedule.multiplier".to_string(),
                value: self.multiplier.to_string(),
            }
            .into());
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "schedule.max_attempts".to_string(),
                value: self.max_attempts.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Render backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Target frame rate for output
    pub fps: f64,

    /// Target video bitrate, ffmpeg-style (e.g. "5000k")
    pub bitrate: String,

    /// Video codec to use for output
    pub codec: String,

    /// Common resolution every cut is normalized to (width, height)
    pub resolution: (u32, u32),

    /// Placements cut and concatenated per batch
    pub batch_size: usize,

    /// Concurrent cuts within a batch
    pub processing_threads: usize,

    /// Rotate the whole result by 180 degrees
    pub rotate: bool,

    /// Soundtrack fade-out at the end of the output (seconds)
    pub audio_fade_out: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            bitrate: "5000k".to_string(),
            codec: "libx264".to_string(),
            resolution: (1920, 1080),
            batch_size: 20,
            processing_threads: num_cpus::get(),
            rotate: false,
            audio_fade_out: 2.0,
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.fps <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "render.fps".to_string(),
                value: self.fps.to_string(),
            }
            .into());
        }

        if self.bitrate.is_empty() || self.codec.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "render.encoder".to_string(),
                value: format!("{}/{}", self.bitrate, self.codec),
            }
            .into());
        }

        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.resolution".to_string(),
                value: format!("{}x{}", self.resolution.0, self.resolution.1),
            }
            .into());
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.batch_size".to_string(),
                value: self.batch_size.to_string(),
            }
            .into());
        }

        if self.processing_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.processing_threads".to_string(),
                value: self.processing_threads.to_string(),
            }
            .into());
        }

        if self.audio_fade_out < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "render.audio_fade_out".to_string(),
                value: self.audio_fade_out.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
