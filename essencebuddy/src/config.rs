//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Title of the game window to read.
    pub window_title: String,

    /// Delay between read cycles (milliseconds).
    pub poll_delay_ms: u64,

    /// How a layout's screen is recognized.
    pub guard_mode: ie::GuardMode,

    /// Try cached stat templates before OCR.
    pub use_stat_cache: bool,

    /// Save newly OCR-resolved stat lines as templates.
    pub create_stat_cache: bool,

    /// Require the gold quality pixel (turn off to read lower rarities).
    pub use_quality_guard: bool,

    /// Only look up full triples.
    pub require_three_stats: bool,

    /// Dump captures into `<data_dir>/tmp/ocr_debug`.
    pub save_images: bool,

    /// Print per-cycle diagnostics.
    pub log_debug: bool,

    /// Holds `weapons.json`, guard templates and the `matched/` stat cache.
    /// Relative paths resolve against the working directory, then the executable.
    pub data_dir: PathBuf,
}

/// Per-user data folder, kept outside any source checkout.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("EssenceBuddy"))
        .unwrap_or_else(|| PathBuf::from("essencebuddy-data"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_title: "Endfield".to_string(),
            poll_delay_ms: 100,
            guard_mode: ie::GuardMode::Image,
            use_stat_cache: true,
            create_stat_cache: false,
            use_quality_guard: false,
            require_three_stats: true,
            save_images: false,
            log_debug: false,
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join("essencebuddy.json"))
    }

    /// Load configuration from disk, falling back to defaults on any failure.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let loaded = match path {
            Some(path) => Self::try_load(path),
            None => Self::path().and_then(|p| {
                if p.exists() {
                    return Self::try_load(&p);
                }
                // First run: leave an editable file behind.
                let cfg = Self::default();
                if let Err(err) = cfg.save(&p) {
                    tracing::warn!(error = %err, "failed to write default config");
                }
                Ok(cfg)
            }),
        };
        match loaded {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load config; using defaults");
                Self::default()
            }
        }
    }

    /// Try to load configuration from `path`; a missing file yields defaults.
    pub fn try_load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        let cfg = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        Ok(cfg)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }

    pub fn pipeline_config(&self, data_dir: &Path) -> ie::PipelineConfig {
        ie::PipelineConfig {
            require_three_stats: self.require_three_stats,
            use_quality_guard: self.use_quality_guard,
            save_images: self.save_images,
            log_debug: self.log_debug,
            debug_dir: data_dir.join("tmp").join("ocr_debug"),
        }
    }
}
