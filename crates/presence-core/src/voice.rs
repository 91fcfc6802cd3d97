//! Voice activity: speaking level and the talking participant.

use socialcue_common::config::VoiceConfig;
use socialcue_scene_model::participant::ParticipantId;

/// Root-mean-square of a sample frame; 0 for an empty frame.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt()
}

/// Converts sample frames into speaking levels.
#[derive(Debug, Clone)]
pub struct VoiceMeter {
    microphone_on: bool,
    sensitivity: f64,
}

impl VoiceMeter {
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            microphone_on: config.microphone_on,
            sensitivity: config.sensitivity,
        }
    }

    /// Speaking level of one frame; 0 when microphones are off.
    pub fn level(&self, samples: Option<&[f32]>) -> f64 {
        match samples {
            Some(frame) if self.microphone_on => rms(frame) * self.sensitivity,
            _ => 0.0,
        }
    }
}

impl Default for VoiceMeter {
    fn default() -> Self {
        Self::new(&VoiceConfig::default())
    }
}

/// The loudest participant with a level above zero.
///
/// Ties go to the earliest entry.
pub fn loudest_speaker(levels: &[(ParticipantId, f64)]) -> Option<ParticipantId> {
    let mut best: Option<(ParticipantId, f64)> = None;
    for &(id, level) in levels {
        if level > best.map_or(0.0, |(_, l)| l) {
            best = Some((id, level));
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[0.5, -0.5, 0.5, -0.5]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_level_scaled_by_sensitivity() {
        let meter = VoiceMeter::default();
        let level = meter.level(Some(&[0.1, -0.1]));
        assert!((level - 10.0).abs() < 1e-4);
        assert_eq!(meter.level(None), 0.0);
    }

    #[test]
    fn test_muted_microphone() {
        let meter = VoiceMeter::new(&VoiceConfig {
            microphone_on: false,
            sensitivity: 100.0,
        });
        assert_eq!(meter.level(Some(&[1.0, 1.0])), 0.0);
    }

    #[test]
    fn test_loudest_speaker() {
        let a = ParticipantId(0);
        let b = ParticipantId(1);
        let c = ParticipantId(2);
        assert_eq!(loudest_speaker(&[]), None);
        assert_eq!(loudest_speaker(&[(a, 0.0), (b, 0.0)]), None);
        assert_eq!(loudest_speaker(&[(a, 1.0), (b, 3.0), (c, 2.0)]), Some(b));
        assert_eq!(loudest_speaker(&[(a, 2.0), (b, 2.0)]), Some(a));
    }
}
