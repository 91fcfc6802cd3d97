//! Tone mixing: maps graph membership to volume/pitch targets.
//!
//! Levels are recomputed from scratch every tick; any ramping is left to the
//! host audio engine.

use socialcue_common::config::{ProximityToneConfig, ToneConfig};
use socialcue_scene_model::host::ToneLevel;
use socialcue_scene_model::participant::Gesture;

use crate::gesture::GestureListener;

/// Pitch rises by this much per contributing participant.
const PITCH_STEP: f64 = 0.1;

fn pitch_for(count: usize) -> f64 {
    1.0 + count as f64 * PITCH_STEP
}

/// Computes tone levels for the proximity, observation, and gesture channels.
#[derive(Debug, Clone)]
pub struct ToneMixer {
    proximity: ProximityToneConfig,
    observation: ToneConfig,
    gesture: ToneConfig,
}

impl ToneMixer {
    pub fn new(
        proximity: ProximityToneConfig,
        observation: ToneConfig,
        gesture: ToneConfig,
    ) -> Self {
        Self {
            proximity,
            observation,
            gesture,
        }
    }

    /// Proximity tone from the distance to the nearest nearby participant
    /// and the number of nearby participants.
    ///
    /// Full volume at or inside `volume_increase_threshold`, fading linearly
    /// to silence at `proximity_threshold`. Clamped to `[0, max_volume]` even
    /// when the thresholds are inverted.
    pub fn proximity_level(&self, nearest_distance: Option<f64>, nearby_count: usize) -> ToneLevel {
        let Some(nearest) = nearest_distance.filter(|_| nearby_count > 0) else {
            return ToneLevel::SILENT;
        };

        let cfg = &self.proximity;
        let max = cfg.max_volume.clamp(0.0, 1.0);
        let volume = if nearest < cfg.volume_increase_threshold {
            max
        } else {
            let span = cfg.proximity_threshold - cfg.volume_increase_threshold;
            if span <= 0.0 {
                max
            } else {
                (max * (cfg.proximity_threshold - nearest) / span).clamp(0.0, max)
            }
        };

        ToneLevel {
            volume,
            pitch: pitch_for(nearby_count),
        }
    }

    /// Observation tone from the number of observers.
    ///
    /// Plateaus at `max_volume`; only once every registered participant is
    /// observing does it scale by `observers / total`. A total of zero means
    /// no scaling.
    pub fn observation_level(&self, observer_count: usize, total_participants: usize) -> ToneLevel {
        if observer_count == 0 {
            return ToneLevel::SILENT;
        }

        let max = self.observation.max_volume.clamp(0.0, 1.0);
        let volume = if total_participants > 0 && observer_count >= total_participants {
            (max * observer_count as f64 / total_participants as f64).clamp(0.0, max)
        } else {
            max
        };

        ToneLevel {
            volume,
            pitch: pitch_for(observer_count),
        }
    }

    /// One-shot level for a recognized gesture.
    pub fn gesture_level(&self) -> ToneLevel {
        ToneLevel {
            volume: self.gesture.max_volume.clamp(0.0, 1.0),
            pitch: 1.0,
        }
    }

    pub fn proximity_clip(&self) -> Option<&str> {
        self.proximity.clip.as_deref()
    }

    pub fn observation_clip(&self) -> Option<&str> {
        self.observation.clip.as_deref()
    }

    pub fn gesture_clip(&self) -> Option<&str> {
        self.gesture.clip.as_deref()
    }
}

impl Default for ToneMixer {
    fn default() -> Self {
        Self::new(
            ProximityToneConfig::default(),
            ToneConfig::default(),
            ToneConfig::default(),
        )
    }
}

/// Latches the gesture one-shot for the current tick.
///
/// Registered as the gesture classifier's listener; the engine drains it
/// after the gesture phase.
#[derive(Debug, Default, Clone, Copy)]
pub struct GestureOneShot {
    fired: Option<Gesture>,
}

impl GestureOneShot {
    /// Take the gesture recognized since the last call, if any.
    pub fn take(&mut self) -> Option<Gesture> {
        self.fired.take()
    }
}

impl GestureListener for GestureOneShot {
    fn gesture_recognized(&mut self, gesture: Gesture) {
        self.fired = Some(gesture);
    }
}
