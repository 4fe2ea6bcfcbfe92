//! File-backed configuration
//!
//! The JSON file stores durations as integer milliseconds; runtime component
//! configs are derived through `From` conversions.

use crate::detector::DetectorConfig;
use crate::error::{AssistError, Result};
use crate::scheduler::SchedulerConfig;
use crate::selector::{SelectorConfig, DEFAULT_LOOKAHEAD};
use blobtrack::TrackerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Capture region of interest, centred on the screen
///
/// The frame source owns the actual capture; the loop only compares each
/// grabbed frame against this size and warns on a mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 640,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub hsv_lower: [u8; 3],
    pub hsv_upper: [u8; 3],
    pub min_area: f32,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        let d = DetectorConfig::default();
        Self {
            hsv_lower: d.hsv_lower,
            hsv_upper: d.hsv_upper,
            min_area: d.min_area,
            min_aspect_ratio: d.min_aspect_ratio,
            max_aspect_ratio: d.max_aspect_ratio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub max_match_distance: f32,
    pub track_timeout_ms: u64,
    pub ghost_timeout_ms: u64,
    /// Shift tracks opposite to each aim move after a shot
    pub compensate_aim_motion: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            max_match_distance: 100.0,
            track_timeout_ms: 500,
            ghost_timeout_ms: 100,
            compensate_aim_motion: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSettings {
    pub max_lookahead: usize,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            max_lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub sensitivity: f32,
    pub step_size: f32,
    pub step_delay_ms: u64,
    pub physics_settle_ms: u64,
    pub click_hold_ms: u64,
    pub shoot_cooldown_ms: u64,
    pub instant_shoot_distance: f32,
    pub blind_period_ms: u64,
    pub max_consecutive_failures: u32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            step_size: 150.0,
            step_delay_ms: 3,
            physics_settle_ms: 15,
            click_hold_ms: 15,
            shoot_cooldown_ms: 50,
            instant_shoot_distance: 15.0,
            blind_period_ms: 15,
            max_consecutive_failures: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationSettings {
    /// Name of the toggle key, resolved by the platform input layer
    pub toggle_key: String,
    /// Sleep between polls while inactive
    pub idle_poll_ms: u64,
    /// Minimum interval between session statistics log lines
    pub stats_interval_ms: u64,
}

impl Default for ActivationSettings {
    fn default() -> Self {
        Self {
            toggle_key: "F4".to_string(),
            idle_poll_ms: 10,
            stats_interval_ms: 2000,
        }
    }
}

/// Complete assistant configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    pub capture: CaptureSettings,
    pub detector: DetectorSettings,
    pub tracker: TrackerSettings,
    pub selector: SelectorSettings,
    pub scheduler: SchedulerSettings,
    pub activation: ActivationSettings,
}

impl AssistConfig {
    /// Load and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON configuration string
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(AssistError::config("capture region must be non-empty"));
        }

        let d = &self.detector;
        if (0..3).any(|c| d.hsv_lower[c] > d.hsv_upper[c]) {
            return Err(AssistError::config(format!(
                "hsv_lower {:?} exceeds hsv_upper {:?}",
                d.hsv_lower, d.hsv_upper
            )));
        }
        if d.min_area < 0.0 {
            return Err(AssistError::config("min_area must be non-negative"));
        }
        if !(d.min_aspect_ratio <= d.max_aspect_ratio) {
            return Err(AssistError::config(format!(
                "aspect ratio window [{}, {}] is inverted",
                d.min_aspect_ratio, d.max_aspect_ratio
            )));
        }

        if !(self.tracker.max_match_distance > 0.0) {
            return Err(AssistError::config("max_match_distance must be positive"));
        }
        if self.selector.max_lookahead == 0 {
            return Err(AssistError::config("max_lookahead must be at least 1"));
        }

        let s = &self.scheduler;
        if !(s.step_size >= 1.0) {
            return Err(AssistError::config("step_size must be at least 1 pointer count"));
        }
        if !(s.sensitivity > 0.0) {
            return Err(AssistError::config("sensitivity must be positive"));
        }
        if s.instant_shoot_distance < 0.0 {
            return Err(AssistError::config("instant_shoot_distance must be non-negative"));
        }
        Ok(())
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.activation.idle_poll_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.activation.stats_interval_ms)
    }
}

impl From<&DetectorSettings> for DetectorConfig {
    fn from(s: &DetectorSettings) -> Self {
        Self {
            hsv_lower: s.hsv_lower,
            hsv_upper: s.hsv_upper,
            min_area: s.min_area,
            min_aspect_ratio: s.min_aspect_ratio,
            max_aspect_ratio: s.max_aspect_ratio,
        }
    }
}

impl From<&TrackerSettings> for TrackerConfig {
    fn from(s: &TrackerSettings) -> Self {
        Self {
            max_match_distance: s.max_match_distance,
            track_timeout: Duration::from_millis(s.track_timeout_ms),
            ghost_timeout: Duration::from_millis(s.ghost_timeout_ms),
        }
    }
}

impl From<&SelectorSettings> for SelectorConfig {
    fn from(s: &SelectorSettings) -> Self {
        Self {
            max_lookahead: s.max_lookahead,
        }
    }
}

impl From<&SchedulerSettings> for SchedulerConfig {
    fn from(s: &SchedulerSettings) -> Self {
        Self {
            sensitivity: s.sensitivity,
            step_size: s.step_size,
            step_delay: Duration::from_millis(s.step_delay_ms),
            physics_settle: Duration::from_millis(s.physics_settle_ms),
            click_hold: Duration::from_millis(s.click_hold_ms),
            shoot_cooldown: Duration::from_millis(s.shoot_cooldown_ms),
            instant_shoot_distance: s.instant_shoot_distance,
            blind_period: Duration::from_millis(s.blind_period_ms),
            max_consecutive_failures: s.max_consecutive_failures,
        }
    }
}
