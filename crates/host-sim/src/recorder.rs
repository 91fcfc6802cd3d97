//! Sinks that record the feedback they receive as [`CueRecord`]s.
//!
//! Tone targets are re-sent every tick; the audio recorder only keeps a
//! record when a channel's target actually changes.

use std::collections::HashMap;

use socialcue_scene_model::cue_log::CueRecord;
use socialcue_scene_model::host::{AudioSink, CaptionSink, ToneCategory, ToneLevel};
use socialcue_scene_model::participant::ParticipantId;

/// Records tone changes and clip triggers.
#[derive(Debug, Default)]
pub struct AudioRecorder {
    tick: u64,
    levels: HashMap<(ParticipantId, ToneCategory), ToneLevel>,
    records: Vec<CueRecord>,
}

impl AudioRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp subsequent records with `tick`.
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Last target sent for a channel.
    pub fn level(&self, listener: ParticipantId, category: ToneCategory) -> Option<ToneLevel> {
        self.levels.get(&(listener, category)).copied()
    }

    pub fn records(&self) -> &[CueRecord] {
        &self.records
    }

    /// Take the records collected so far.
    pub fn drain(&mut self) -> Vec<CueRecord> {
        std::mem::take(&mut self.records)
    }
}

impl AudioSink for AudioRecorder {
    fn set_tone(&mut self, listener: ParticipantId, category: ToneCategory, level: ToneLevel) {
        if self.levels.insert((listener, category), level) == Some(level) {
            return;
        }
        self.records.push(CueRecord::tone(self.tick, listener, category, level));
    }

    fn play_clip(&mut self, listener: ParticipantId, category: ToneCategory) {
        self.records.push(CueRecord::clip(self.tick, listener, category));
    }
}

/// Records captions shown and cleared, and tracks what is on screen.
#[derive(Debug, Default)]
pub struct CaptionRecorder {
    tick: u64,
    on_screen: HashMap<ParticipantId, String>,
    records: Vec<CueRecord>,
}

impl CaptionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Caption currently shown to a participant.
    pub fn on_screen(&self, participant: ParticipantId) -> Option<&str> {
        self.on_screen.get(&participant).map(String::as_str)
    }

    /// Every caption text shown to a participant, in order.
    pub fn shown_to(&self, participant: ParticipantId) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.participant == participant)
            .filter_map(CueRecord::caption_text)
            .collect()
    }

    pub fn records(&self) -> &[CueRecord] {
        &self.records
    }

    pub fn drain(&mut self) -> Vec<CueRecord> {
        std::mem::take(&mut self.records)
    }
}

impl CaptionSink for CaptionRecorder {
    fn show(&mut self, participant: ParticipantId, text: &str) {
        self.on_screen.insert(participant, text.to_string());
        self.records.push(CueRecord::shown(self.tick, participant, text));
    }

    fn clear(&mut self, participant: ParticipantId) {
        self.on_screen.remove(&participant);
        self.records.push(CueRecord::cleared(self.tick, participant));
    }
}
