//! The per-tick presence pipeline.
//!
//! # Tick order
//!
//! 1. **Registry refresh:** apply queued joins/leaves.
//! 2. **Pose snapshot:** one pose per participant from the pose source.
//! 3. **Visibility:** rebuild the graph; replace every observer set.
//! 4. **Voice:** speaking levels and the talking participant.
//! 5. **Tones:** proximity and observation levels for local owners, plus one
//!    "eye contact" cue request per observer.
//! 6. **Gestures:** advance every classifier; local owners fire the gesture
//!    one-shot and request one caption per nearby gesture recognized this
//!    tick.
//! 7. **Cue sweep:** decay every cooldown by one tick.
//!
//! Caption presentation is advanced separately through
//! [`PresenceEngine::advance_captions`], on the host's caption timer.

use socialcue_common::config::AppConfig;
use socialcue_scene_model::host::{
    AudioSink, CaptionSink, PoseSource, RayOracle, ToneCategory, ToneLevel, VoiceSource,
};
use socialcue_scene_model::participant::{Gesture, ParticipantId, Role};

use crate::cue::CueOutcome;
use crate::registry::{Participant, ParticipantRegistry, RefreshSummary};
use crate::tone::ToneMixer;
use crate::visibility::{PoseSnapshot, VisibilityGraph, VisibilityGraphBuilder};
use crate::voice::{loudest_speaker, VoiceMeter};

/// Caption label for being looked at.
pub const EYE_CONTACT_LABEL: &str = "eye contact";

/// External collaborators for one tick.
///
/// Missing pose source or ray oracle is tolerated: the affected data is
/// treated as absent for the tick.
pub struct TickContext<'a> {
    /// Frame time covered by this tick.
    pub elapsed_secs: f64,
    pub poses: Option<&'a dyn PoseSource>,
    pub oracle: Option<&'a dyn RayOracle>,
    pub voices: Option<&'a dyn VoiceSource>,
    pub audio: &'a mut dyn AudioSink,
    pub captions: &'a mut dyn CaptionSink,
}

/// What one participant experienced during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceFrame {
    pub id: ParticipantId,
    pub role: Role,
    pub nearby: Vec<ParticipantId>,
    pub nearest_distance: Option<f64>,
    pub observers: Vec<ParticipantId>,
    pub gaze_target: Option<ParticipantId>,
    /// Gaze target is gazing back.
    pub direct_gaze: bool,
    pub gesture: Gesture,
    /// Gesture recognized by this participant's classifier this tick.
    pub gesture_fired: Option<Gesture>,
    /// Tone targets (local owners only).
    pub proximity_tone: Option<ToneLevel>,
    pub observation_tone: Option<ToneLevel>,
    pub voice_level: f64,
    /// Outline thickness (remote proxies only).
    pub outline_width: Option<f64>,
    /// Participant the talking indicator points at (local owners only).
    pub talking_indicator: Option<ParticipantId>,
}

/// Summary of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub joined: Vec<ParticipantId>,
    pub left: Vec<ParticipantId>,
    pub frames: Vec<PresenceFrame>,
    pub mutual_gaze: Vec<(ParticipantId, ParticipantId)>,
    pub cues_enqueued: usize,
    pub cues_suppressed: usize,
}

impl TickReport {
    pub fn frame(&self, id: ParticipantId) -> Option<&PresenceFrame> {
        self.frames.iter().find(|f| f.id == id)
    }
}

/// Drives the whole pipeline for a registry of participants.
pub struct PresenceEngine {
    config: AppConfig,
    registry: ParticipantRegistry,
    builder: VisibilityGraphBuilder,
    mixer: ToneMixer,
    meter: VoiceMeter,
    graph: VisibilityGraph,
    ticks: u64,
    warned_no_poses: bool,
    warned_no_oracle: bool,
}

impl PresenceEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            registry: ParticipantRegistry::new(config.gesture.clone(), config.captions.clone()),
            builder: VisibilityGraphBuilder::new(
                config.visibility.raycast_distance,
                config.proximity_tone.proximity_threshold,
            ),
            mixer: ToneMixer::new(
                config.proximity_tone.clone(),
                config.observation_tone.clone(),
                config.gesture_tone.clone(),
            ),
            meter: VoiceMeter::new(&config.voice),
            graph: VisibilityGraph::default(),
            ticks: 0,
            warned_no_poses: false,
            warned_no_oracle: false,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Queue a participant; it joins at the start of the next tick.
    pub fn register(&mut self, name: impl Into<String>, role: Role) -> ParticipantId {
        self.registry.register(name, role)
    }

    /// Queue a removal; it takes effect at the start of the next tick.
    pub fn deregister(&mut self, id: ParticipantId) {
        self.registry.deregister(id);
    }

    /// Mute or unmute one participant from the start of the next tick.
    pub fn set_microphone(&mut self, id: ParticipantId, on: bool) {
        self.registry.set_microphone(id, on);
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    /// Graph computed by the most recent tick.
    pub fn graph(&self) -> &VisibilityGraph {
        &self.graph
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick of the pipeline.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> TickReport {
        let tick = self.ticks;
        self.ticks += 1;

        let RefreshSummary { joined, left } = self.registry.refresh(ctx.captions);
        let mut report = TickReport {
            tick,
            joined,
            left,
            ..TickReport::default()
        };

        self.sample_poses(ctx);
        self.update_visibility(ctx);
        let voice_levels = self.update_voice(ctx);
        self.update_tones(ctx, &mut report);
        let fired = self.update_gestures(ctx, &mut report);

        for p in self.registry.iter_mut() {
            p.cues.sweep();
        }

        report.mutual_gaze = self.graph.mutual_gaze_pairs();
        report.frames = self
            .registry
            .iter()
            .map(|p| self.frame_for(p, &voice_levels, &fired))
            .collect();

        tracing::debug!(
            tick,
            participants = self.registry.len(),
            enqueued = report.cues_enqueued,
            suppressed = report.cues_suppressed,
            "Tick complete"
        );
        report
    }

    /// Advance every participant's caption display by `elapsed_secs`.
    pub fn advance_captions(&mut self, elapsed_secs: f64, captions: &mut dyn CaptionSink) {
        for p in self.registry.iter_mut() {
            p.cues.advance_display(elapsed_secs, captions);
        }
    }

    fn sample_poses(&mut self, ctx: &TickContext<'_>) {
        if ctx.poses.is_none() && !self.warned_no_poses {
            tracing::warn!("No pose source attached; participants contribute no data");
            self.warned_no_poses = true;
        }
        for p in self.registry.iter_mut() {
            let id = p.id();
            p.pose = ctx.poses.and_then(|source| source.pose(id));
        }
    }

    fn update_visibility(&mut self, ctx: &TickContext<'_>) {
        if ctx.oracle.is_none() && !self.warned_no_oracle {
            tracing::warn!("No ray oracle attached; visibility graph will have no edges");
            self.warned_no_oracle = true;
        }

        let snapshots: Vec<PoseSnapshot> = self
            .registry
            .iter()
            .filter_map(|p| p.pose.map(|pose| PoseSnapshot { id: p.id(), pose }))
            .collect();
        self.graph = self.builder.build(&snapshots, ctx.oracle);

        for p in self.registry.iter_mut() {
            p.observed_by = self.graph.observers(p.id());
        }
    }

    /// Returns every participant's speaking level, in registration order.
    fn update_voice(&mut self, ctx: &TickContext<'_>) -> Vec<(ParticipantId, f64)> {
        for p in self.registry.iter_mut() {
            let id = p.id();
            p.voice_level = if p.microphone_on {
                let samples = ctx.voices.and_then(|v| v.samples(id));
                self.meter.level(samples.as_deref())
            } else {
                0.0
            };
        }
        self.registry
            .iter()
            .map(|p| (p.id(), p.voice_level))
            .collect()
    }

    fn update_tones(&mut self, ctx: &mut TickContext<'_>, report: &mut TickReport) {
        let total = self.registry.len();

        for id in self.local_owners() {
            let visibility = self.graph.get(id).cloned().unwrap_or_default();

            let proximity = self
                .mixer
                .proximity_level(visibility.nearest_distance(), visibility.nearby.len());
            ctx.audio.set_tone(id, ToneCategory::Proximity, proximity);

            let observation = self
                .mixer
                .observation_level(visibility.observers.len(), total);
            ctx.audio.set_tone(id, ToneCategory::Observation, observation);

            let observer_names = self.names(visibility.observers.iter().copied());
            self.request_cues(id, &observer_names, EYE_CONTACT_LABEL, ctx, report);
        }
    }

    fn update_gestures(
        &mut self,
        ctx: &mut TickContext<'_>,
        report: &mut TickReport,
    ) -> Vec<(ParticipantId, Gesture)> {
        let mut fired = Vec::new();

        for p in self.registry.iter_mut() {
            match p.pose {
                Some(pose) => p
                    .classifier
                    .observe_orientation(pose.orientation, ctx.elapsed_secs),
                None => p.classifier.lose_tracking(),
            }
            p.classifier.tick_with(ctx.elapsed_secs, &mut p.one_shot);

            if let Some(gesture) = p.one_shot.take() {
                tracing::info!(participant = %p.id(), ?gesture, "Gesture recognized");
                fired.push((p.id(), gesture));
                if p.role().receives_feedback() {
                    ctx.audio
                        .set_tone(p.id(), ToneCategory::Gesture, self.mixer.gesture_level());
                    ctx.audio.play_clip(p.id(), ToneCategory::Gesture);
                }
            }
        }

        if fired.is_empty() {
            return fired;
        }

        for id in self.local_owners() {
            let nearby = self.graph.nearby_ids(id);
            let mut by_label: Vec<(&'static str, String)> = Vec::new();
            for &(other, gesture) in fired.iter().filter(|(f, _)| nearby.contains(f)) {
                let Some(label) = gesture.caption_label() else {
                    continue;
                };
                if let Some(name) = self.registry.name_of(other) {
                    by_label.push((label, name.to_string()));
                }
            }
            for (label, name) in by_label {
                self.request_cues(id, std::slice::from_ref(&name), label, ctx, report);
            }
        }

        fired
    }

    fn request_cues(
        &mut self,
        owner: ParticipantId,
        subjects: &[String],
        label: &str,
        ctx: &mut TickContext<'_>,
        report: &mut TickReport,
    ) {
        let Some(p) = self.registry.get_mut(owner) else {
            return;
        };
        for subject in subjects {
            match p.cues.request_cue(subject, label, ctx.captions) {
                CueOutcome::Enqueued => report.cues_enqueued += 1,
                CueOutcome::Suppressed { .. } => report.cues_suppressed += 1,
            }
        }
    }

    fn local_owners(&self) -> Vec<ParticipantId> {
        self.registry
            .iter()
            .filter(|p| p.role().receives_feedback())
            .map(Participant::id)
            .collect()
    }

    fn names(&self, ids: impl Iterator<Item = ParticipantId>) -> Vec<String> {
        ids.filter_map(|id| self.registry.name_of(id).map(str::to_string))
            .collect()
    }

    fn frame_for(
        &self,
        p: &Participant,
        voice_levels: &[(ParticipantId, f64)],
        fired: &[(ParticipantId, Gesture)],
    ) -> PresenceFrame {
        let id = p.id();
        let visibility = self.graph.get(id);
        let gaze_target = self.graph.gaze_target(id);
        let owner = p.role().receives_feedback();

        let (proximity_tone, observation_tone) = match (owner, visibility) {
            (true, Some(v)) => (
                Some(
                    self.mixer
                        .proximity_level(v.nearest_distance(), v.nearby.len()),
                ),
                Some(
                    self.mixer
                        .observation_level(v.observers.len(), self.registry.len()),
                ),
            ),
            (true, None) => (Some(ToneLevel::SILENT), Some(ToneLevel::SILENT)),
            (false, _) => (None, None),
        };

        let talking_indicator = if owner && self.config.indicator.show_arrow {
            let others: Vec<(ParticipantId, f64)> = voice_levels
                .iter()
                .copied()
                .filter(|&(other, _)| other != id)
                .collect();
            loudest_speaker(&others)
        } else {
            None
        };

        PresenceFrame {
            id,
            role: p.role(),
            nearby: self.graph.nearby_ids(id),
            nearest_distance: visibility.and_then(|v| v.nearest_distance()),
            observers: p.observed_by().iter().copied().collect(),
            gaze_target,
            direct_gaze: gaze_target.is_some_and(|t| self.graph.is_mutual_gaze(id, t)),
            gesture: p.gesture(),
            gesture_fired: fired.iter().find(|(f, _)| *f == id).map(|&(_, g)| g),
            proximity_tone,
            observation_tone,
            voice_level: p.voice_level(),
            outline_width: p.role().shows_outline().then_some(p.voice_level()),
            talking_indicator,
        }
    }
}
