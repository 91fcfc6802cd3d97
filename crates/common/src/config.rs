//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SocialCueError, SocialCueResult};

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Host loop rate (ticks per second).
    pub tick_rate_hz: u32,

    /// Head-gesture recognition.
    pub gesture: GestureConfig,

    /// Line-of-sight testing.
    pub visibility: VisibilityConfig,

    /// Proximity tone parameters.
    pub proximity_tone: ProximityToneConfig,

    /// Tone played while being observed.
    pub observation_tone: ToneConfig,

    /// One-shot tone played on a recognized gesture.
    pub gesture_tone: ToneConfig,

    /// Caption queue and cooldown parameters.
    pub captions: CaptionConfig,

    /// Talking-participant indicator.
    pub indicator: IndicatorConfig,

    /// Voice level metering.
    pub voice: VoiceConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Gesture window parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Evaluation window length in seconds of elapsed frame time.
    pub window_secs: f64,

    /// Accumulated rotation (degrees) a dominant axis must exceed.
    pub threshold_degrees: f64,
}

/// Raycast parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Maximum distance of any line-of-sight query.
    pub raycast_distance: f64,
}

/// Proximity tone: loudness grows as the nearest participant approaches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityToneConfig {
    /// Clip identifier handed to the audio sink.
    pub clip: Option<String>,

    /// Participants strictly closer than this are "nearby".
    pub proximity_threshold: f64,

    /// At or inside this distance the tone is at full volume.
    pub volume_increase_threshold: f64,

    /// Volume ceiling in [0, 1].
    pub max_volume: f64,
}

/// Plain tone configuration (observation and gesture tones).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    /// Clip identifier handed to the audio sink.
    pub clip: Option<String>,

    /// Volume ceiling in [0, 1].
    pub max_volume: f64,
}

/// Caption presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Seconds each caption stays on screen.
    pub display_time_secs: f64,

    /// Ticks during which an identical caption is suppressed.
    pub block_frame_count: u32,

    /// Whether captions reach the caption sink at all.
    pub show_captions: bool,
}

/// Talking indicator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Whether the local owner gets a talking-participant indicator.
    pub show_arrow: bool,
}

/// Voice metering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Master switch; when off every participant's level is 0 regardless
    /// of their own microphone.
    pub microphone_on: bool,

    /// Multiplier applied to the RMS of a sample frame.
    pub sensitivity: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "socialcue=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            gesture: GestureConfig::default(),
            visibility: VisibilityConfig::default(),
            proximity_tone: ProximityToneConfig::default(),
            observation_tone: ToneConfig::default(),
            gesture_tone: ToneConfig::default(),
            captions: CaptionConfig::default(),
            indicator: IndicatorConfig::default(),
            voice: VoiceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            window_secs: 1.0,
            threshold_degrees: 60.0,
        }
    }
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            raycast_distance: 100.0,
        }
    }
}

impl Default for ProximityToneConfig {
    fn default() -> Self {
        Self {
            clip: None,
            proximity_threshold: 5.0,
            volume_increase_threshold: 2.0,
            max_volume: 1.0,
        }
    }
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            clip: None,
            max_volume: 1.0,
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            display_time_secs: 3.0,
            block_frame_count: 10,
            show_captions: true,
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self { show_arrow: true }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            microphone_on: true,
            sensitivity: 100.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::from_path(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit file.
    pub fn from_path(path: &Path) -> SocialCueResult<Self> {
        if !path.exists() {
            return Err(SocialCueError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Report preconditions the engine relies on but does not enforce.
    ///
    /// An empty list means the configuration is well-formed.
    pub fn lint(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.tick_rate_hz == 0 {
            warnings.push("tick_rate_hz must be positive".to_string());
        }
        if self.gesture.window_secs <= 0.0 {
            warnings.push("gesture.window_secs must be positive".to_string());
        }
        if self.gesture.threshold_degrees < 0.0 {
            warnings.push("gesture.threshold_degrees must not be negative".to_string());
        }
        let prox = &self.proximity_tone;
        if prox.volume_increase_threshold > prox.proximity_threshold {
            warnings.push(format!(
                "proximity_tone.volume_increase_threshold ({}) exceeds proximity_threshold ({})",
                prox.volume_increase_threshold, prox.proximity_threshold
            ));
        }
        for (name, volume) in [
            ("proximity_tone", prox.max_volume),
            ("observation_tone", self.observation_tone.max_volume),
            ("gesture_tone", self.gesture_tone.max_volume),
        ] {
            if !(0.0..=1.0).contains(&volume) {
                warnings.push(format!("{name}.max_volume ({volume}) is outside [0, 1]"));
            }
        }
        if self.captions.display_time_secs <= 0.0 {
            warnings.push("captions.display_time_secs must be positive".to_string());
        }
        if self.visibility.raycast_distance <= 0.0 {
            warnings.push("visibility.raycast_distance must be positive".to_string());
        }

        warnings
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("socialcue").join("config.json")
}
