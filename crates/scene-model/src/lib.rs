//! SocialCue Scene Model
//!
//! Defines the data contracts shared by the presence pipeline and its hosts:
//! - **Math:** Positions, directions, Euler orientations, rays
//! - **Participants:** Identity, ownership role, per-tick pose
//! - **Host:** Traits for the external collaborators (pose source, ray
//!   oracle, audio sink, caption sink, voice source)
//! - **Scene:** Scripted scene files used by simulations and tests
//! - **Cue log:** Serializable records of emitted feedback
//!
//! Distances are in world units (meters for VR hosts); angles in degrees.

pub mod cue_log;
pub mod host;
pub mod math;
pub mod participant;
pub mod scene;

pub use cue_log::*;
pub use host::*;
pub use math::*;
pub use participant::*;
pub use scene::*;
