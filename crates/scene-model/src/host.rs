//! Contracts with the external collaborators of the presence pipeline.
//!
//! Rendering, physics, audio devices, and UI live in the host. The pipeline
//! only sees them through these traits.

use serde::{Deserialize, Serialize};

use crate::math::Ray;
use crate::participant::{ParticipantId, Pose};

/// Supplies per-participant poses at tick rate.
pub trait PoseSource {
    /// Pose for this tick, or `None` when the host has no data for it.
    fn pose(&self, id: ParticipantId) -> Option<Pose>;
}

/// First object hit by a line-of-sight query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Participant owning the hit collider; `None` for scenery/occluders.
    pub participant: Option<ParticipantId>,

    /// Distance from the ray origin.
    pub distance: f64,
}

/// Collision/occlusion oracle.
///
/// Must be deterministic within a tick: identical queries return identical
/// results.
pub trait RayOracle {
    /// First hit along `ray` within `max_distance`, if any.
    fn raycast(&self, ray: &Ray, max_distance: f64) -> Option<RayHit>;
}

/// Tone channels driven by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneCategory {
    Proximity,
    Observation,
    Gesture,
}

impl ToneCategory {
    pub const ALL: [ToneCategory; 3] = [
        ToneCategory::Proximity,
        ToneCategory::Observation,
        ToneCategory::Gesture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proximity => "proximity",
            Self::Observation => "observation",
            Self::Gesture => "gesture",
        }
    }
}

/// Target scalars for one tone channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneLevel {
    /// Volume in [0, 1].
    pub volume: f64,

    /// Playback pitch multiplier (> 0).
    pub pitch: f64,
}

impl ToneLevel {
    pub const SILENT: ToneLevel = ToneLevel {
        volume: 0.0,
        pitch: 1.0,
    };

    pub fn is_silent(&self) -> bool {
        self.volume <= 0.0
    }
}

/// Audio output. The host ramps and mixes; the pipeline supplies targets.
pub trait AudioSink {
    /// Update the continuous target level of a tone channel.
    fn set_tone(&mut self, listener: ParticipantId, category: ToneCategory, level: ToneLevel);

    /// Fire a one-shot clip on a tone channel.
    fn play_clip(&mut self, listener: ParticipantId, category: ToneCategory);
}

/// Caption text output. At most one caption is active per participant.
pub trait CaptionSink {
    fn show(&mut self, participant: ParticipantId, text: &str);

    fn clear(&mut self, participant: ParticipantId);
}

/// Raw voice sample frames for the current tick (capture is done by the host).
pub trait VoiceSource {
    /// Latest output samples for `id`, or `None` if it has no audio.
    fn samples(&self, id: ParticipantId) -> Option<Vec<f32>>;
}

/// An audio sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudioSink;

impl AudioSink for NullAudioSink {
    fn set_tone(&mut self, _: ParticipantId, _: ToneCategory, _: ToneLevel) {}

    fn play_clip(&mut self, _: ParticipantId, _: ToneCategory) {}
}

/// A caption sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCaptionSink;

impl CaptionSink for NullCaptionSink {
    fn show(&mut self, _: ParticipantId, _: &str) {}

    fn clear(&mut self, _: ParticipantId) {}
}
