//! Poses, voice frames, and colliders driven by a scripted scene.
//!
//! The host binds each scene participant to the id the registry handed out,
//! then moves the clock with [`ScriptedScene::set_time`] before every tick.

use std::collections::BTreeMap;
use std::path::Path;

use socialcue_common::error::{SocialCueError, SocialCueResult};
use socialcue_scene_model::host::{PoseSource, VoiceSource};
use socialcue_scene_model::participant::{ParticipantId, Pose};
use socialcue_scene_model::scene::{Scene, SceneParticipant};

use crate::world::SphereWorld;

/// Samples per synthetic voice frame.
const VOICE_FRAME_LEN: usize = 256;

/// Read and validate a scene file.
pub fn load_scene(path: &Path) -> SocialCueResult<Scene> {
    if !path.exists() {
        return Err(SocialCueError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let json = std::fs::read_to_string(path)?;
    Scene::from_json(&json).map_err(|e| SocialCueError::scene(format!("{}: {e}", path.display())))
}

/// A scene evaluated at a moving point in time.
#[derive(Debug, Clone)]
pub struct ScriptedScene {
    scene: Scene,
    time_secs: f64,
    bindings: BTreeMap<ParticipantId, usize>,
}

impl ScriptedScene {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            time_secs: 0.0,
            bindings: BTreeMap::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn time_secs(&self) -> f64 {
        self.time_secs
    }

    pub fn set_time(&mut self, time_secs: f64) {
        self.time_secs = time_secs;
    }

    /// Bind a scene participant (by name) to a registry id.
    ///
    /// Returns `false` if the scene has no participant with that name.
    pub fn bind(&mut self, name: &str, id: ParticipantId) -> bool {
        match self.scene.participants.iter().position(|p| p.name == name) {
            Some(idx) => {
                self.bindings.insert(id, idx);
                true
            }
            None => false,
        }
    }

    pub fn unbind(&mut self, id: ParticipantId) {
        self.bindings.remove(&id);
    }

    fn participant(&self, id: ParticipantId) -> Option<&SceneParticipant> {
        let idx = *self.bindings.get(&id)?;
        self.scene.participants.get(idx)
    }

    /// Colliders of every bound participant present at the current time.
    pub fn world(&self) -> SphereWorld {
        let mut world = SphereWorld::new();
        for (&id, &idx) in &self.bindings {
            let Some(p) = self.scene.participants.get(idx) else {
                continue;
            };
            if !p.is_present_at(self.time_secs) {
                continue;
            }
            let Some(pose) = self.scene.pose_at(p, self.time_secs) else {
                continue;
            };
            let torso = pose.torso_anchor.unwrap_or(pose.position);
            let eye = pose.viewpoint.map_or(torso, |v| v.origin);
            world.add_participant(id, torso, eye, p.collider_radius);
        }
        world
    }
}

impl PoseSource for ScriptedScene {
    fn pose(&self, id: ParticipantId) -> Option<Pose> {
        let p = self.participant(id)?;
        if !p.is_present_at(self.time_secs) {
            return None;
        }
        self.scene.pose_at(p, self.time_secs)
    }
}

impl VoiceSource for ScriptedScene {
    /// A square wave whose RMS equals the participant's voice amplitude.
    fn samples(&self, id: ParticipantId) -> Option<Vec<f32>> {
        let amplitude = self.participant(id)?.voice_amplitude?;
        Some(
            (0..VOICE_FRAME_LEN)
                .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socialcue_scene_model::math::Vec3;

    const SCENE: &str = r#"{
        "name": "pair",
        "participants": [
            {
                "name": "Alice",
                "role": "local_owner",
                "keyframes": [{ "time_secs": 0.0, "position": { "x": 0.0, "y": 0.0, "z": 0.0 } }]
            },
            {
                "name": "Bob",
                "voice_amplitude": 0.05,
                "joins_at_secs": 1.0,
                "keyframes": [
                    { "time_secs": 0.0, "position": { "x": 0.0, "y": 0.0, "z": 4.0 } },
                    { "time_secs": 2.0, "position": { "x": 0.0, "y": 0.0, "z": 2.0 } }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_load_scene_errors() {
        let dir = std::env::temp_dir().join("socialcue_test_load_scene");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let missing = load_scene(&dir.join("missing.json")).unwrap_err();
        assert!(matches!(missing, SocialCueError::FileNotFound { .. }));

        let empty = dir.join("empty.json");
        std::fs::write(&empty, r#"{ "name": "empty", "participants": [] }"#).unwrap();
        let invalid = load_scene(&empty).unwrap_err();
        assert!(matches!(invalid, SocialCueError::Scene { .. }));

        let pair = dir.join("pair.json");
        std::fs::write(&pair, SCENE).unwrap();
        assert_eq!(load_scene(&pair).unwrap().participants.len(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    fn scripted() -> ScriptedScene {
        let mut s = ScriptedScene::new(Scene::from_json(SCENE).unwrap());
        assert!(s.bind("Alice", ParticipantId(0)));
        assert!(s.bind("Bob", ParticipantId(1)));
        s
    }

    #[test]
    fn test_unknown_name_not_bound() {
        let mut s = scripted();
        assert!(!s.bind("Carol", ParticipantId(2)));
        assert!(s.pose(ParticipantId(2)).is_none());
    }

    #[test]
    fn test_pose_follows_time_and_presence() {
        let mut s = scripted();
        assert!(s.pose(ParticipantId(1)).is_none());

        s.set_time(1.0);
        let pose = s.pose(ParticipantId(1)).unwrap();
        assert!((pose.position.z - 3.0).abs() < 1e-9);
        assert_eq!(pose.torso_anchor, Some(Vec3::new(0.0, 1.0, 3.0)));
    }

    #[test]
    fn test_voice_frame_rms_matches_amplitude() {
        let s = scripted();
        assert!(s.samples(ParticipantId(0)).is_none());

        let frame = s.samples(ParticipantId(1)).unwrap();
        let rms = (frame.iter().map(|x| x * x).sum::<f32>() / frame.len() as f32).sqrt();
        assert!((rms - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_world_contains_present_participants_only() {
        let mut s = scripted();
        assert_eq!(s.world().colliders().len(), 2);
        s.set_time(1.5);
        assert_eq!(s.world().colliders().len(), 4);
        s.unbind(ParticipantId(1));
        assert_eq!(s.world().colliders().len(), 2);
    }
}
