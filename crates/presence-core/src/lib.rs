//! SocialCue Presence Core
//!
//! Turns avatar poses into social-presence feedback, once per host tick:
//! - **Gestures:** Windowed nod/shake classification from head rotation
//! - **Visibility:** Torso line-of-sight, gaze targets, observers, proximity
//! - **Tones:** Volume/pitch targets for proximity, observation, gesture tones
//! - **Cues:** Caption cooldowns and a single-flight caption display loop
//! - **Voice:** Speaking level and the talking-participant indicator
//!
//! This crate is pure computation: hosts plug in through the traits in
//! `socialcue_scene_model::host`. Nothing here returns errors per tick;
//! degenerate inputs fall back to silence, `Gesture::None`, or empty sets.

pub mod cue;
pub mod engine;
pub mod gesture;
pub mod registry;
pub mod tone;
pub mod visibility;
pub mod voice;

pub use cue::{CaptionDisplay, CueDeduplicator, CueOutcome};
pub use engine::{PresenceEngine, PresenceFrame, TickContext, TickReport};
pub use gesture::{GestureClassifier, GestureListener};
pub use registry::{Participant, ParticipantRegistry};
pub use tone::ToneMixer;
pub use visibility::{VisibilityGraph, VisibilityGraphBuilder};
