//! Scripted scenes: participants with keyframed poses.
//!
//! Scenes drive simulations and integration tests in place of a live host.
//! Poses are linearly interpolated between keyframes and held past the ends.

use serde::{Deserialize, Serialize};

use crate::math::{EulerAngles, Ray, Vec3};
use crate::participant::{Pose, Role};

/// Errors raised while loading a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("invalid scene JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("scene has no participants")]
    Empty,

    #[error("duplicate participant name: {0}")]
    DuplicateName(String),

    #[error("participant {0} has no pose keyframes")]
    NoKeyframes(String),

    #[error("participant {name}: keyframes out of order at t={time_secs}")]
    UnorderedKeyframes { name: String, time_secs: f64 },

    #[error("more than one local owner ({0} and {1})")]
    MultipleLocalOwners(String, String),
}

/// A complete scripted scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Human-readable scene name.
    #[serde(default)]
    pub name: String,

    /// Default simulation length; the CLI may override it.
    #[serde(default)]
    pub duration_secs: Option<f64>,

    /// Height of the torso anchor above the avatar root.
    #[serde(default = "default_torso_height")]
    pub torso_height: f64,

    /// Height of the viewpoint above the avatar root.
    #[serde(default = "default_eye_height")]
    pub eye_height: f64,

    pub participants: Vec<SceneParticipant>,
}

/// One scripted avatar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneParticipant {
    pub name: String,

    #[serde(default)]
    pub role: Role,

    /// Radius of the torso and head sphere colliders.
    #[serde(default = "default_collider_radius")]
    pub collider_radius: f64,

    /// Constant RMS amplitude of this participant's voice, if speaking.
    #[serde(default)]
    pub voice_amplitude: Option<f32>,

    /// Muted participants always have a voice level of 0.
    #[serde(default = "default_microphone_on")]
    pub microphone_on: bool,

    /// Registration time (seconds since scene start).
    #[serde(default)]
    pub joins_at_secs: f64,

    /// Deregistration time, if the participant leaves.
    #[serde(default)]
    pub leaves_at_secs: Option<f64>,

    /// Pose keyframes ordered by time.
    pub keyframes: Vec<PoseKeyframe>,
}

/// Pose at a point in scene time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseKeyframe {
    pub time_secs: f64,

    pub position: Vec3,

    #[serde(default = "default_forward")]
    pub forward: Vec3,

    #[serde(default)]
    pub orientation: EulerAngles,
}

fn default_torso_height() -> f64 {
    1.0
}

fn default_eye_height() -> f64 {
    1.6
}

fn default_collider_radius() -> f64 {
    0.4
}

fn default_microphone_on() -> bool {
    true
}

fn default_forward() -> Vec3 {
    Vec3::FORWARD
}

impl Scene {
    /// Parse and validate a scene from JSON.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let scene: Scene = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Check structural invariants the simulator relies on.
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.participants.is_empty() {
            return Err(SceneError::Empty);
        }

        let mut owner: Option<&str> = None;
        for (i, p) in self.participants.iter().enumerate() {
            if self.participants[..i].iter().any(|q| q.name == p.name) {
                return Err(SceneError::DuplicateName(p.name.clone()));
            }
            if p.keyframes.is_empty() {
                return Err(SceneError::NoKeyframes(p.name.clone()));
            }
            if let Some(bad) = p
                .keyframes
                .windows(2)
                .find(|w| w[1].time_secs < w[0].time_secs)
            {
                return Err(SceneError::UnorderedKeyframes {
                    name: p.name.clone(),
                    time_secs: bad[1].time_secs,
                });
            }
            if p.role == Role::LocalOwner {
                if let Some(first) = owner {
                    return Err(SceneError::MultipleLocalOwners(
                        first.to_string(),
                        p.name.clone(),
                    ));
                }
                owner = Some(&p.name);
            }
        }
        Ok(())
    }

    /// Last keyframe or leave time across all participants.
    pub fn natural_duration_secs(&self) -> f64 {
        self.participants
            .iter()
            .flat_map(|p| {
                p.keyframes
                    .iter()
                    .map(|k| k.time_secs)
                    .chain(p.leaves_at_secs)
            })
            .fold(0.0, f64::max)
    }

    /// Full pose of a participant at `time_secs`, including derived anchors.
    pub fn pose_at(&self, participant: &SceneParticipant, time_secs: f64) -> Option<Pose> {
        let key = participant.keyframe_at(time_secs)?;
        let torso = key.position.add(&Vec3::UP.scale(self.torso_height));
        let eye = key.position.add(&Vec3::UP.scale(self.eye_height));
        let look = key.forward.normalized().unwrap_or(Vec3::FORWARD);

        Some(
            Pose::at(key.position, key.forward, key.orientation)
                .with_torso_anchor(torso)
                .with_viewpoint(Ray::new(eye, look)),
        )
    }
}

impl SceneParticipant {
    /// Whether the participant is registered at `time_secs`.
    pub fn is_present_at(&self, time_secs: f64) -> bool {
        time_secs >= self.joins_at_secs && self.leaves_at_secs.map_or(true, |t| time_secs < t)
    }

    /// Interpolated keyframe at `time_secs`.
    pub fn keyframe_at(&self, time_secs: f64) -> Option<PoseKeyframe> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;

        if time_secs <= first.time_secs {
            return Some(PoseKeyframe { time_secs, ..*first });
        }
        if time_secs >= last.time_secs {
            return Some(PoseKeyframe { time_secs, ..*last });
        }

        let idx = self
            .keyframes
            .partition_point(|k| k.time_secs <= time_secs)
            .saturating_sub(1);
        let a = &self.keyframes[idx];
        let b = &self.keyframes[(idx + 1).min(self.keyframes.len() - 1)];

        let span = b.time_secs - a.time_secs;
        if span <= f64::EPSILON {
            return Some(PoseKeyframe { time_secs, ..*a });
        }
        let t = (time_secs - a.time_secs) / span;

        Some(PoseKeyframe {
            time_secs,
            position: Vec3::lerp(&a.position, &b.position, t),
            forward: Vec3::lerp(&a.forward, &b.forward, t),
            orientation: EulerAngles::lerp(&a.orientation, &b.orientation, t),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PEOPLE: &str = r#"{
        "name": "hallway",
        "participants": [
            {
                "name": "Alice",
                "role": "local_owner",
                "keyframes": [
                    {"time_secs": 0.0, "position": {"x": 0.0, "y": 0.0, "z": 0.0}},
                    {"time_secs": 2.0, "position": {"x": 2.0, "y": 0.0, "z": 0.0},
                     "orientation": {"pitch": 0.0, "yaw": 90.0, "roll": 0.0}}
                ]
            },
            {
                "name": "Bob",
                "leaves_at_secs": 1.5,
                "keyframes": [
                    {"time_secs": 0.0, "position": {"x": 0.0, "y": 0.0, "z": 3.0},
                     "forward": {"x": 0.0, "y": 0.0, "z": -1.0}}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_defaults() {
        let scene = Scene::from_json(TWO_PEOPLE).unwrap();
        assert_eq!(scene.participants.len(), 2);
        assert_eq!(scene.participants[1].role, Role::RemoteProxy);
        assert_eq!(scene.participants[0].collider_radius, 0.4);
        assert_eq!(scene.torso_height, 1.0);
        assert_eq!(scene.natural_duration_secs(), 2.0);
    }

    #[test]
    fn test_keyframe_interpolation_and_hold() {
        let scene = Scene::from_json(TWO_PEOPLE).unwrap();
        let alice = &scene.participants[0];

        let mid = alice.keyframe_at(1.0).unwrap();
        assert!((mid.position.x - 1.0).abs() < 1e-9);
        assert!((mid.orientation.yaw - 45.0).abs() < 1e-9);

        let after = alice.keyframe_at(10.0).unwrap();
        assert_eq!(after.position.x, 2.0);
    }

    #[test]
    fn test_pose_anchors() {
        let scene = Scene::from_json(TWO_PEOPLE).unwrap();
        let pose = scene.pose_at(&scene.participants[1], 0.0).unwrap();
        assert_eq!(pose.torso_anchor, Some(Vec3::new(0.0, 1.0, 3.0)));
        let view = pose.viewpoint.unwrap();
        assert_eq!(view.origin, Vec3::new(0.0, 1.6, 3.0));
        assert_eq!(view.direction, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_presence_window() {
        let scene = Scene::from_json(TWO_PEOPLE).unwrap();
        let bob = &scene.participants[1];
        assert!(bob.is_present_at(0.0));
        assert!(!bob.is_present_at(1.5));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let json = r#"{"participants": [
            {"name": "A", "keyframes": [{"time_secs": 0.0, "position": {"x": 0.0, "y": 0.0, "z": 0.0}}]},
            {"name": "A", "keyframes": [{"time_secs": 0.0, "position": {"x": 1.0, "y": 0.0, "z": 0.0}}]}
        ]}"#;
        assert!(matches!(
            Scene::from_json(json),
            Err(SceneError::DuplicateName(name)) if name == "A"
        ));
    }

    #[test]
    fn test_rejects_unordered_keyframes() {
        let json = r#"{"participants": [
            {"name": "A", "keyframes": [
                {"time_secs": 1.0, "position": {"x": 0.0, "y": 0.0, "z": 0.0}},
                {"time_secs": 0.5, "position": {"x": 1.0, "y": 0.0, "z": 0.0}}
            ]}
        ]}"#;
        assert!(matches!(
            Scene::from_json(json),
            Err(SceneError::UnorderedKeyframes { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_scene() {
        assert!(matches!(
            Scene::from_json(r#"{"participants": []}"#),
            Err(SceneError::Empty)
        ));
    }
}
