//! Participant identity, ownership role, and per-tick pose.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{EulerAngles, Ray, Vec3};

/// Stable identity of a registered participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Who drives a participant on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The avatar of the person using this host: receives tones, captions,
    /// and the talking indicator.
    LocalOwner,
    /// A replicated avatar of someone else: gets an outline reflecting its
    /// voice level and no feedback of its own.
    #[default]
    RemoteProxy,
}

impl Role {
    /// Whether this participant receives audio/caption feedback.
    pub fn receives_feedback(&self) -> bool {
        matches!(self, Role::LocalOwner)
    }

    /// Whether this participant is rendered with a voice-driven outline.
    pub fn shows_outline(&self) -> bool {
        matches!(self, Role::RemoteProxy)
    }
}

/// Discrete head gesture recognized over one evaluation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    #[default]
    None,
    Nod,
    Shake,
}

impl Gesture {
    /// Caption label for this gesture (`None` has no caption).
    pub fn caption_label(&self) -> Option<&'static str> {
        match self {
            Gesture::None => None,
            Gesture::Nod => Some("nodding"),
            Gesture::Shake => Some("shaking"),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Gesture::None)
    }
}

/// Pose snapshot supplied by the host for one participant on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Avatar root position.
    pub position: Vec3,

    /// Facing direction (unit length expected).
    pub forward: Vec3,

    /// Head orientation in degrees.
    pub orientation: EulerAngles,

    /// Torso anchor used for body-to-body line-of-sight tests.
    pub torso_anchor: Option<Vec3>,

    /// First-person viewpoint (eye position and look direction).
    pub viewpoint: Option<Ray>,
}

impl Pose {
    /// A pose with no anchors: contributes proximity and gesture data only.
    pub fn at(position: Vec3, forward: Vec3, orientation: EulerAngles) -> Self {
        Self {
            position,
            forward,
            orientation,
            torso_anchor: None,
            viewpoint: None,
        }
    }

    pub fn with_torso_anchor(mut self, anchor: Vec3) -> Self {
        self.torso_anchor = Some(anchor);
        self
    }

    pub fn with_viewpoint(mut self, viewpoint: Ray) -> Self {
        self.viewpoint = Some(viewpoint);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_capabilities() {
        assert!(Role::LocalOwner.receives_feedback());
        assert!(!Role::LocalOwner.shows_outline());
        assert!(!Role::RemoteProxy.receives_feedback());
        assert!(Role::RemoteProxy.shows_outline());
    }

    #[test]
    fn test_gesture_labels() {
        assert_eq!(Gesture::None.caption_label(), None);
        assert_eq!(Gesture::Nod.caption_label(), Some("nodding"));
        assert_eq!(Gesture::Shake.caption_label(), Some("shaking"));
    }

    #[test]
    fn test_role_serde_names() {
        let role: Role = serde_json::from_str("\"local_owner\"").unwrap();
        assert_eq!(role, Role::LocalOwner);
        assert_eq!(serde_json::to_string(&ParticipantId(7)).unwrap(), "7");
    }
}
