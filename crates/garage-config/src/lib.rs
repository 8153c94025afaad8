//! Garage configuration system
//!
//! This crate provides centralized configuration for the garage motion layer,
//! loading settings from `garage.toml` with environment variable overrides.
//! Values are kept as plain data (seconds, pixels, easing ids as strings);
//! the motion crate validates and converts them into strategy options.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "garage.toml";

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GarageConfig {
    /// Global motion preferences
    pub motion: MotionConfig,
    /// Numeric counter animation
    pub counter: CounterConfig,
    /// Staggered list entrance
    pub stagger: StaggerConfig,
    /// Scroll-triggered reveal
    pub scroll_reveal: ScrollRevealConfig,
    /// Headless demo driver settings
    pub demo: DemoConfig,
}

/// Global motion preferences
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MotionConfig {
    /// Collapse every duration and stagger delay to zero
    pub reduced_motion: bool,
}

/// Counter animation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Tween duration in seconds
    pub duration: f64,
    /// Easing curve id (e.g. "ease-out-quadratic")
    pub easing: String,
    /// Text rendered before the value
    pub prefix: String,
    /// Text rendered after the value
    pub suffix: String,
}

/// Staggered list entrance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggerConfig {
    /// Delay between consecutive items in seconds
    pub stagger: f64,
    /// Per-item tween duration in seconds
    pub duration: f64,
    /// Easing curve id
    pub easing: String,
    /// Initial vertical offset in pixels
    pub y: f64,
    /// Initial horizontal offset in pixels
    pub x: f64,
    /// Initial scale; only applied when below 1
    pub scale: f64,
    /// Item the stagger starts from: "start", "center", "end" or "edges"
    pub from: String,
}

/// Scroll-triggered reveal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollRevealConfig {
    /// Initial vertical offset in pixels
    pub y: f64,
    /// Initial horizontal offset in pixels
    pub x: f64,
    /// Initial opacity
    pub opacity: f64,
    /// Tween duration in seconds
    pub duration: f64,
    /// Easing curve id
    pub easing: String,
    /// Viewport trigger, e.g. "top 85%"
    pub start: String,
    /// Delay between children in seconds; 0 reveals the container as one target
    pub stagger: f64,
}

/// Demo driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Simulated frame interval in milliseconds
    pub frame_ms: f64,
    /// Simulated viewport height in pixels
    pub viewport_height: f64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            duration: 1.5,
            easing: "ease-out-quadratic".to_string(),
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

impl Default for StaggerConfig {
    fn default() -> Self {
        Self {
            stagger: 0.08,
            duration: 0.5,
            easing: "ease-out-cubic".to_string(),
            y: 20.0,
            x: 0.0,
            scale: 1.0,
            from: "start".to_string(),
        }
    }
}

impl Default for ScrollRevealConfig {
    fn default() -> Self {
        Self {
            y: 40.0,
            x: 0.0,
            opacity: 0.0,
            duration: 0.7,
            easing: "ease-out-cubic".to_string(),
            start: "top 85%".to_string(),
            stagger: 0.0,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frame_ms: 16.67,
            viewport_height: 800.0,
        }
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl GarageConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from `garage.toml` in the current directory,
    /// or return the default configuration if the file is missing or invalid
    pub fn load_or_default() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_FILE).unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    /// Unparseable numeric overrides are ignored.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("GARAGE_REDUCED_MOTION") {
            self.motion.reduced_motion = env_flag(&val);
        }
        if let Ok(val) = std::env::var("GARAGE_COUNTER_DURATION") {
            if let Ok(duration) = val.parse::<f64>() {
                self.counter.duration = duration;
            }
        }
        if let Ok(val) = std::env::var("GARAGE_STAGGER_DELAY") {
            if let Ok(delay) = val.parse::<f64>() {
                self.stagger.stagger = delay;
            }
        }
        if let Ok(start) = std::env::var("GARAGE_REVEAL_START") {
            self.scroll_reveal.start = start;
        }
        if let Ok(val) = std::env::var("GARAGE_FRAME_MS") {
            if let Ok(frame_ms) = val.parse::<f64>() {
                self.demo.frame_ms = frame_ms;
            }
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from garage.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
