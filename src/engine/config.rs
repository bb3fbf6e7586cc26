// Configuration for the flow reader: pacing limits, display options and the
// TOML file the binary reads them from.

use crate::engine::error::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, info};

pub const SPEED_RANGE: RangeInclusive<u32> = 100..=650;
pub const FOCUS_WIDTH_RANGE: RangeInclusive<usize> = 1..=5;
pub const SCROLL_LEVEL_RANGE: RangeInclusive<u8> = 1..=5;
pub const FONT_SIZE_RANGE: RangeInclusive<u8> = 1..=5;

/// Pacing inputs consumed read-only by the pacer and highlight renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Words per minute (default 300)
    pub speed: u32,

    /// Half-width of the active window in tokens (default 2)
    pub focus_width: usize,

    /// Scroll-follow aggressiveness; not part of the timing math (default 3)
    pub scroll_level: u8,

    /// Scales the pause taken at line/paragraph boundaries (default 2.0)
    pub newline_pause_multiplier: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            speed: 300,
            focus_width: 2,
            scroll_level: 3,
            newline_pause_multiplier: 2.0,
        }
    }
}

impl PacingConfig {
    pub fn validate(&self) -> FlowResult<()> {
        validate_speed(self.speed)?;
        validate_focus_width(self.focus_width)?;
        validate_scroll_level(self.scroll_level)?;
        validate_pause_multiplier(self.newline_pause_multiplier)?;
        Ok(())
    }
}

pub fn validate_speed(speed: u32) -> FlowResult<u32> {
    if SPEED_RANGE.contains(&speed) {
        Ok(speed)
    } else {
        Err(FlowError::SpeedOutOfRange(speed))
    }
}

pub fn validate_focus_width(width: usize) -> FlowResult<usize> {
    if FOCUS_WIDTH_RANGE.contains(&width) {
        Ok(width)
    } else {
        Err(FlowError::FocusWidthOutOfRange(width))
    }
}

pub fn validate_scroll_level(level: u8) -> FlowResult<u8> {
    if SCROLL_LEVEL_RANGE.contains(&level) {
        Ok(level)
    } else {
        Err(FlowError::ScrollLevelOutOfRange(level))
    }
}

pub fn validate_font_size(size: u8) -> FlowResult<u8> {
    if FONT_SIZE_RANGE.contains(&size) {
        Ok(size)
    } else {
        Err(FlowError::FontSizeOutOfRange(size))
    }
}

pub fn validate_pause_multiplier(multiplier: f64) -> FlowResult<f64> {
    if multiplier.is_finite() && multiplier >= 0.0 {
        Ok(multiplier)
    } else {
        Err(FlowError::InvalidPauseMultiplier(multiplier))
    }
}

/// Layout-affecting display options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Font family name handed to surfaces that can switch fonts.
    pub font_family: String,

    /// Relative text size; in the terminal host this narrows the text column.
    pub font_size: u8,

    /// Emphasize the leading half of each word.
    pub bionic: bool,

    /// Start with the timed flow presentation enabled.
    pub flow_mode: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_size: 3,
            bionic: false,
            flow_mode: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

/// Top-level configuration; deserializable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pacing: PacingConfig,
    pub display: DisplayConfig,
    pub log_level: LogLevel,
    pub log_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pacing: PacingConfig::default(),
            display: DisplayConfig::default(),
            log_level: LogLevel::default(),
            log_file: "flowpace.log".to_string(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> FlowResult<()> {
        self.pacing.validate()?;
        validate_font_size(self.display.font_size)?;
        Ok(())
    }
}

pub fn parse_config(source: &str) -> FlowResult<AppConfig> {
    let config: AppConfig =
        toml::from_str(source).map_err(|e| FlowError::ConfigParse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Loads the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> FlowResult<AppConfig> {
    if !path.exists() {
        info!(path = %path.display(), "No config file found; using defaults");
        return Ok(AppConfig::default());
    }

    let source = std::fs::read_to_string(path)?;
    let config = parse_config(&source)?;
    debug!(path = %path.display(), ?config, "Loaded configuration");
    Ok(config)
}
