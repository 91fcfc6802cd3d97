//! SocialCue Host Simulation
//!
//! Stand-ins for the collaborators a real VR host provides, so the presence
//! pipeline can run headless:
//!
//! - **World:** Sphere colliders answering line-of-sight queries
//! - **Scripted:** Poses and voice frames from a scripted [`Scene`]
//! - **Recorder:** Audio/caption sinks that keep what they were sent
//! - **Writer:** Append-only JSONL cue log
//!
//! [`Scene`]: socialcue_scene_model::scene::Scene

pub mod recorder;
pub mod scripted;
pub mod world;
pub mod writer;

pub use recorder::{AudioRecorder, CaptionRecorder};
pub use scripted::{load_scene, ScriptedScene};
pub use world::{SphereCollider, SphereWorld};
pub use writer::CueLogWriter;
