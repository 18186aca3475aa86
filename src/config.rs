//! # Configuration Module
//!
//! Settings and directory discovery for Mood DJ.
//!
//! ## Settings File
//!
//! Settings are read from JSON. Without `--config`, the platform config
//! directory is checked:
//! - Linux: `~/.config/mood-dj/config.json`
//! - macOS: `~/Library/Application Support/mood-dj/config.json`
//! - Windows: `%APPDATA%\mood-dj\config.json`
//!
//! A missing file means defaults; a partial file fills the gaps from
//! defaults:
//!
//! ```json
//! { "window": 9, "track_limit": 30, "public": true }
//! ```
//!
//! The Spotify access token is never stored here; it comes from
//! `SPOTIFY_ACCESS_TOKEN` (a `.env` file works too) or `--token`.

use crate::retry::RetryPolicy;
use crate::services::Visibility;
use crate::session::SessionConfig;
use crate::spotify::SPOTIFY_API_BASE;
use crate::stabilizer::StabilizerConfig;
use anyhow::{ensure, Context, Result};
use log::{debug, info};
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "mood-dj";
const CONFIG_FILE: &str = "config.json";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Frames kept by the mood stabilizer.
    pub window: usize,
    /// Frames required before the first mood is reported.
    pub min_observations: usize,
    /// Vote share a new mood must exceed.
    pub min_support: f64,
    /// Tracks requested per playlist.
    pub track_limit: usize,
    /// Attempts per playlist operation, including the first.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Per-request timeout for provider calls.
    pub request_timeout_secs: u64,
    /// Create public playlists instead of private ones.
    pub public: bool,
    /// Pause between two frame captures.
    pub capture_interval_ms: u64,
    pub api_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window: 7,
            min_observations: 3,
            min_support: 0.5,
            track_limit: 20,
            max_attempts: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 8000,
            request_timeout_secs: 10,
            public: false,
            capture_interval_ms: 500,
            api_base_url: SPOTIFY_API_BASE.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing, if a file
    /// exists but is not valid JSON, or if the values fail [`Settings::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => {
                let path = path
                    .absolutize()
                    .with_context(|| format!("Invalid config path {}", path.display()))?;
                Self::from_file(&path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Parse one settings file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.window >= 1, "window must be at least 1");
        ensure!(
            self.min_observations <= self.window,
            "min_observations ({}) must not exceed window ({})",
            self.min_observations,
            self.window
        );
        ensure!(self.max_attempts >= 1, "max_attempts must be at least 1");
        ensure!(self.track_limit >= 1, "track_limit must be at least 1");
        ensure!(
            (0.0..1.0).contains(&self.min_support),
            "min_support must be in [0, 1), got {}",
            self.min_support
        );
        ensure!(self.request_timeout_secs >= 1, "request_timeout_secs must be at least 1");
        Ok(())
    }

    #[must_use]
    pub fn stabilizer(&self) -> StabilizerConfig {
        StabilizerConfig {
            window: self.window,
            min_observations: self.min_observations,
            min_support: self.min_support,
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(self.backoff_max_ms),
        }
    }

    #[must_use]
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            track_limit: self.track_limit,
            visibility: if self.public {
                Visibility::Public
            } else {
                Visibility::Private
            },
            retry: self.retry_policy(),
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn capture_interval(&self) -> Duration {
        Duration::from_millis(self.capture_interval_ms)
    }
}

/// Platform location of the settings file (the file may not exist).
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let file = write_config(r#"{ "window": 9, "public": true }"#);
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.window, 9);
        assert!(settings.public);
        assert_eq!(settings.track_limit, 20);
        assert_eq!(settings.session().visibility, Visibility::Public);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = write_config(r#"{ "min_support": 1.5 }"#);
        assert!(Settings::load(Some(file.path())).is_err());

        let file = write_config(r#"{ "window": 0 }"#);
        assert!(Settings::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_warmup_longer_than_window_rejected() {
        let file = write_config(r#"{ "window": 2 }"#);
        let error = Settings::load(Some(file.path())).unwrap_err();
        assert!(error.to_string().contains("min_observations"));

        let file = write_config(r#"{ "window": 2, "min_observations": 2 }"#);
        let settings = Settings::load(Some(file.path())).unwrap();
        let mut stabilizer = crate::stabilizer::MoodStabilizer::new(settings.stabilizer());
        let mut stable = stabilizer.current();
        for _ in 0..2 {
            stable = stabilizer.observe(crate::mood::Mood::Happy);
        }
        assert_eq!(stable.epoch, 1);
    }

    #[test]
    fn test_malformed_file_rejected() {
        let file = write_config("window = 7");
        let error = Settings::load(Some(file.path())).unwrap_err();
        assert!(error.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("does-not-exist.json"))).is_err());
    }

    #[test]
    fn test_derived_configs() {
        let settings = Settings::default();
        let retry = settings.retry_policy();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.base_delay, Duration::from_millis(500));
        assert_eq!(settings.stabilizer(), StabilizerConfig::default());
        assert_eq!(settings.session().track_limit, 20);
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_default_config_path_shape() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("mood-dj/config.json"));
        }
    }
}
