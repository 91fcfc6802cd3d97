//! Participant registry.
//!
//! Hosts register and deregister participants at any time; the changes are
//! applied together at the start of the next tick, so every phase of a tick
//! sees the same membership.

use std::collections::BTreeSet;

use socialcue_common::config::{CaptionConfig, GestureConfig};
use socialcue_scene_model::host::CaptionSink;
use socialcue_scene_model::participant::{Gesture, ParticipantId, Pose, Role};

use crate::cue::CueDeduplicator;
use crate::gesture::GestureClassifier;
use crate::tone::GestureOneShot;

/// One registered avatar and the state the pipeline keeps for it.
#[derive(Debug, Clone)]
pub struct Participant {
    id: ParticipantId,
    name: String,
    role: Role,

    /// Pose sampled this tick (`None` if the host had none).
    pub(crate) pose: Option<Pose>,

    /// Participants gazing at this one, as of the last tick.
    pub(crate) observed_by: BTreeSet<ParticipantId>,

    pub(crate) classifier: GestureClassifier,
    pub(crate) one_shot: GestureOneShot,
    pub(crate) cues: CueDeduplicator,
    pub(crate) microphone_on: bool,
    pub(crate) voice_level: f64,
}

impl Participant {
    fn new(
        id: ParticipantId,
        name: String,
        role: Role,
        gesture: &GestureConfig,
        captions: &CaptionConfig,
    ) -> Self {
        Self {
            id,
            name,
            role,
            pose: None,
            observed_by: BTreeSet::new(),
            classifier: GestureClassifier::from_config(gesture),
            one_shot: GestureOneShot::default(),
            cues: CueDeduplicator::new(id, captions),
            microphone_on: true,
            voice_level: 0.0,
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    /// Current head gesture (held until the next window closes).
    pub fn gesture(&self) -> Gesture {
        self.classifier.current()
    }

    pub fn observed_by(&self) -> &BTreeSet<ParticipantId> {
        &self.observed_by
    }

    pub fn cues(&self) -> &CueDeduplicator {
        &self.cues
    }

    pub fn microphone_on(&self) -> bool {
        self.microphone_on
    }

    pub fn voice_level(&self) -> f64 {
        self.voice_level
    }
}

#[derive(Debug, Clone)]
enum MembershipChange {
    Register {
        id: ParticipantId,
        name: String,
        role: Role,
    },
    Deregister(ParticipantId),
    Microphone {
        id: ParticipantId,
        on: bool,
    },
}

/// Membership changes applied by one [`ParticipantRegistry::refresh`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub joined: Vec<ParticipantId>,
    pub left: Vec<ParticipantId>,
}

/// All participants sharing the space, in registration order.
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    participants: Vec<Participant>,
    pending: Vec<MembershipChange>,
    next_id: u32,
    gesture: GestureConfig,
    captions: CaptionConfig,
}

impl ParticipantRegistry {
    pub fn new(gesture: GestureConfig, captions: CaptionConfig) -> Self {
        Self {
            participants: Vec::new(),
            pending: Vec::new(),
            next_id: 0,
            gesture,
            captions,
        }
    }

    /// Queue a registration; the participant joins at the next refresh.
    pub fn register(&mut self, name: impl Into<String>, role: Role) -> ParticipantId {
        let id = ParticipantId(self.next_id);
        self.next_id += 1;
        self.pending.push(MembershipChange::Register {
            id,
            name: name.into(),
            role,
        });
        id
    }

    /// Queue a deregistration; the participant leaves at the next refresh.
    pub fn deregister(&mut self, id: ParticipantId) {
        self.pending.push(MembershipChange::Deregister(id));
    }

    /// Queue a microphone switch; it applies at the next refresh, after any
    /// registration queued before it.
    pub fn set_microphone(&mut self, id: ParticipantId, on: bool) {
        self.pending.push(MembershipChange::Microphone { id, on });
    }

    /// Apply queued membership changes in the order they were made.
    ///
    /// A leaving participant's caption display is cancelled.
    pub fn refresh(&mut self, captions: &mut dyn CaptionSink) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        for change in std::mem::take(&mut self.pending) {
            match change {
                MembershipChange::Register { id, name, role } => {
                    tracing::info!(
                        participant = %id,
                        name = %name,
                        ?role,
                        "Participant registered"
                    );
                    self.participants.push(Participant::new(
                        id,
                        name,
                        role,
                        &self.gesture,
                        &self.captions,
                    ));
                    summary.joined.push(id);
                }
                MembershipChange::Deregister(id) => {
                    let Some(idx) = self.participants.iter().position(|p| p.id == id) else {
                        tracing::debug!(participant = %id, "Unknown participant ignored");
                        continue;
                    };
                    let mut gone = self.participants.remove(idx);
                    gone.cues.cancel(captions);
                    for p in &mut self.participants {
                        p.observed_by.remove(&id);
                    }
                    tracing::info!(
                        participant = %id,
                        name = %gone.name,
                        "Participant deregistered"
                    );
                    summary.left.push(id);
                }
                MembershipChange::Microphone { id, on } => {
                    let Some(p) = self.get_mut(id) else {
                        tracing::debug!(participant = %id, "Microphone switch ignored");
                        continue;
                    };
                    p.microphone_on = on;
                    tracing::debug!(participant = %id, on, "Microphone switched");
                }
            }
        }

        summary
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.name == name)
    }

    pub fn name_of(&self, id: ParticipantId) -> Option<&str> {
        self.get(id).map(Participant::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.participants.iter_mut()
    }

    pub fn ids(&self) -> Vec<ParticipantId> {
        self.participants.iter().map(|p| p.id).collect()
    }

    /// Registered participants (pending registrations excluded).
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl Default for ParticipantRegistry {
    fn default() -> Self {
        Self::new(GestureConfig::default(), CaptionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socialcue_scene_model::host::NullCaptionSink;

    #[test]
    fn test_registration_applies_on_refresh() {
        let mut registry = ParticipantRegistry::default();
        let alice = registry.register("Alice", Role::LocalOwner);
        assert!(registry.is_empty());
        assert!(registry.has_pending_changes());

        let summary = registry.refresh(&mut NullCaptionSink);
        assert_eq!(summary.joined, vec![alice]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.name_of(alice), Some("Alice"));
        assert_eq!(registry.get(alice).unwrap().role(), Role::LocalOwner);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut registry = ParticipantRegistry::default();
        let a = registry.register("A", Role::RemoteProxy);
        registry.refresh(&mut NullCaptionSink);
        registry.deregister(a);
        registry.refresh(&mut NullCaptionSink);
        let b = registry.register("A", Role::RemoteProxy);
        assert_ne!(a, b);
    }

    #[test]
    fn test_deregister_removes_back_references() {
        let mut registry = ParticipantRegistry::default();
        let a = registry.register("A", Role::LocalOwner);
        let b = registry.register("B", Role::RemoteProxy);
        registry.refresh(&mut NullCaptionSink);
        registry.get_mut(a).unwrap().observed_by.insert(b);

        registry.deregister(b);
        let summary = registry.refresh(&mut NullCaptionSink);
        assert_eq!(summary.left, vec![b]);
        assert!(registry.get(a).unwrap().observed_by().is_empty());
        assert!(registry.get(b).is_none());
    }

    #[test]
    fn test_register_then_deregister_before_refresh() {
        let mut registry = ParticipantRegistry::default();
        let a = registry.register("A", Role::RemoteProxy);
        registry.deregister(a);
        let summary = registry.refresh(&mut NullCaptionSink);
        assert_eq!(summary.joined, vec![a]);
        assert_eq!(summary.left, vec![a]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_microphone_switch_follows_registration() {
        let mut registry = ParticipantRegistry::default();
        let a = registry.register("A", Role::RemoteProxy);
        registry.set_microphone(a, false);
        registry.set_microphone(ParticipantId(42), false);
        registry.refresh(&mut NullCaptionSink);
        assert!(!registry.get(a).unwrap().microphone_on());

        registry.set_microphone(a, true);
        assert!(!registry.get(a).unwrap().microphone_on());
        registry.refresh(&mut NullCaptionSink);
        assert!(registry.get(a).unwrap().microphone_on());
    }

    #[test]
    fn test_unknown_deregister_ignored() {
        let mut registry = ParticipantRegistry::default();
        registry.deregister(ParticipantId(42));
        let summary = registry.refresh(&mut NullCaptionSink);
        assert!(summary.left.is_empty());
    }
}
