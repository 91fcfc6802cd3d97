//! Cue log records.
//!
//! Every piece of feedback the pipeline hands to a sink can be recorded as a
//! `CueRecord`. Logs are JSONL: an optional `#`-prefixed header line, then one
//! record per line.

use serde::{Deserialize, Serialize};

use crate::host::{ToneCategory, ToneLevel};
use crate::participant::ParticipantId;

/// Header written as the first (comment) line of a cue log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueLogHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Wall-clock time at simulation start (RFC 3339).
    pub epoch_wall: String,

    /// Host tick rate.
    pub tick_rate_hz: u32,

    /// Scene name, if the log came from a scripted scene.
    #[serde(default)]
    pub scene: Option<String>,
}

/// One emitted piece of feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueRecord {
    /// Tick during which the feedback was emitted.
    pub tick: u64,

    /// Participant receiving the feedback.
    pub participant: ParticipantId,

    #[serde(flatten)]
    pub kind: CueKind,
}

/// Feedback payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CueKind {
    /// Caption text shown.
    Shown { text: String },

    /// Caption cleared after the queue drained or was cancelled.
    Cleared,

    /// Continuous tone target changed.
    Tone {
        category: ToneCategory,
        volume: f64,
        pitch: f64,
    },

    /// One-shot clip fired.
    Clip { category: ToneCategory },
}

impl CueRecord {
    pub fn shown(tick: u64, participant: ParticipantId, text: impl Into<String>) -> Self {
        Self {
            tick,
            participant,
            kind: CueKind::Shown { text: text.into() },
        }
    }

    pub fn cleared(tick: u64, participant: ParticipantId) -> Self {
        Self {
            tick,
            participant,
            kind: CueKind::Cleared,
        }
    }

    pub fn tone(
        tick: u64,
        participant: ParticipantId,
        category: ToneCategory,
        level: ToneLevel,
    ) -> Self {
        Self {
            tick,
            participant,
            kind: CueKind::Tone {
                category,
                volume: level.volume,
                pitch: level.pitch,
            },
        }
    }

    pub fn clip(tick: u64, participant: ParticipantId, category: ToneCategory) -> Self {
        Self {
            tick,
            participant,
            kind: CueKind::Clip { category },
        }
    }

    /// Caption text if this record shows one.
    pub fn caption_text(&self) -> Option<&str> {
        match &self.kind {
            CueKind::Shown { text } => Some(text),
            _ => None,
        }
    }
}

/// Parse cue records from JSONL content, skipping `#` comment lines.
pub fn parse_cue_log(jsonl: &str) -> Result<Vec<CueRecord>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Extract the header from the first line of a cue log, if present.
pub fn parse_cue_log_header(jsonl: &str) -> Option<CueLogHeader> {
    let first = jsonl.lines().next()?.trim();
    let json = first.strip_prefix('#')?.trim();
    serde_json::from_str(json).ok()
}
