//! Runner configuration.
//!
//! Viewport, pacing, capture and audio settings plus the embedded show
//! configuration. Loaded from a TOML file; anything missing falls back to
//! the defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use diya_common::{DiyaError, DiyaResult};
use diya_kernel::config::ShowConfig;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "diya.toml";

/// Runner configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Viewport ===
    /// Viewport width in pixels
    pub viewport_width: u32,
    /// Viewport height in pixels
    pub viewport_height: u32,
    /// Display refresh rate in Hz
    pub refresh_hz: u32,

    // === Run ===
    /// Length of the run in seconds
    pub run_seconds: f32,
    /// When the lamp is lit, in milliseconds from start
    pub light_after_ms: u64,
    /// Sleep between frames to match wall-clock time
    pub realtime: bool,

    // === Capture ===
    /// Directory PNG frames are written to
    pub output_dir: PathBuf,
    /// Capture every Nth frame (0 = no captures)
    pub capture_every: u32,

    // === Audio ===
    /// Music track (None = silent)
    pub music_path: Option<PathBuf>,
    /// Start muted
    pub muted: bool,

    // === Show ===
    /// Firecracker and confetti settings
    pub show: ShowConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            refresh_hz: 60,

            run_seconds: 20.0,
            light_after_ms: 1000,
            realtime: false,

            output_dir: PathBuf::from("frames"),
            capture_every: 30,

            music_path: None,
            muted: false,

            show: ShowConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `diya.toml` in the working directory.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::read(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to load config file: {e}");
                Self::default()
            },
        }
    }

    /// Read configuration from `path`, failing on a missing or invalid file.
    pub fn read<P: AsRef<Path>>(path: P) -> DiyaResult<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| DiyaError::Config(e.to_string()))
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.viewport_width = self.viewport_width.clamp(64, 7680);
        self.viewport_height = self.viewport_height.clamp(64, 4320);
        self.refresh_hz = self.refresh_hz.clamp(1, 240);

        if !self.run_seconds.is_finite() {
            self.run_seconds = 0.0;
        }
        self.run_seconds = self.run_seconds.clamp(0.0, 3600.0);

        self.show.validate();
    }

    /// Length of the run.
    #[must_use]
    pub fn run_duration(&self) -> Duration {
        Duration::from_secs_f32(self.run_seconds.max(0.0))
    }

    /// Delay before the lamp is lit.
    #[must_use]
    pub fn light_after(&self) -> Duration {
        Duration::from_millis(self.light_after_ms)
    }

    /// Number of frames in the run.
    #[must_use]
    pub fn total_frames(&self) -> u64 {
        (self.run_duration().as_secs_f64() * f64::from(self.refresh_hz)).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.viewport_width, 1280);
        assert_eq!(config.viewport_height, 720);
        assert_eq!(config.refresh_hz, 60);
        assert_eq!(config.total_frames(), 1200);
        assert!(config.music_path.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.viewport_width = 10;
        config.refresh_hz = 0;
        config.run_seconds = f32::NAN;
        config.show.alpha_decay = 0.0;

        config.validate();

        assert_eq!(config.viewport_width, 64);
        assert_eq!(config.refresh_hz, 1);
        assert_eq!(config.run_duration(), Duration::ZERO);
        assert!(config.show.alpha_decay > 0.0);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("diya.toml");

        let mut config = EngineConfig::default();
        config.viewport_width = 1920;
        config.realtime = true;
        config.show.seed = Some(12345);
        config.music_path = Some(PathBuf::from("assets/diwali.mp3"));

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.viewport_width, 1920);
        assert!(loaded.realtime);
        assert_eq!(loaded.show.seed, Some(12345));
        assert_eq!(loaded.music_path, Some(PathBuf::from("assets/diwali.mp3")));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("diya.toml");
        fs::write(
            &config_path,
            "run_seconds = 5.0\n\n[show]\nburst_size = 40\n\n[show.confetti]\ninterval_ms = 500\n",
        )
        .expect("Failed to write config");

        let loaded = EngineConfig::load_from(&config_path);
        assert!((loaded.run_seconds - 5.0).abs() < f32::EPSILON);
        assert_eq!(loaded.show.burst_size, 40);
        assert_eq!(loaded.show.burst_interval_ms, 1000);
        assert_eq!(loaded.show.confetti.interval_ms, 500);
        assert_eq!(loaded.show.confetti.duration_ms, 15_000);
        assert_eq!(loaded.viewport_height, 720);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("diya.toml");
        fs::write(&config_path, "viewport_width = \"wide\"").expect("Failed to write config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.viewport_width, 1280);
    }

    #[test]
    fn test_read_reports_parse_errors() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("diya.toml");
        fs::write(&config_path, "refresh_hz = [60]").expect("Failed to write config");

        let err = EngineConfig::read(&config_path).expect_err("invalid config");
        assert!(matches!(err, DiyaError::Config(_)), "got {err}");
    }

    #[test]
    fn test_read_reports_missing_file() {
        let err = EngineConfig::read("/nonexistent/path/diya.toml").expect_err("missing file");
        assert!(matches!(err, DiyaError::Io(_)), "got {err}");
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/diya.toml");
        assert_eq!(config.viewport_width, 1280);
    }

    #[test]
    fn test_config_toml_serialization() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize");

        assert!(toml_str.contains("viewport_width"));
        assert!(toml_str.contains("[show]"));
    }
}
