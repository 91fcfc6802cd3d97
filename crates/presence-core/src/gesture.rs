//! Head-gesture recognition over fixed time windows.
//!
//! # Algorithm
//!
//! 1. **Accumulate** per-tick orientation deltas into the current window.
//! 2. **Evaluate** once the window's elapsed frame time exceeds
//!    `window_secs` (default 1s): sum `|pitch|` and `|yaw|` independently.
//! 3. **Classify:** pitch dominant and above threshold is a nod, yaw dominant
//!    and above threshold is a shake, anything else (including an exact tie)
//!    is `None`.
//! 4. **Reset** the timer and the sample buffer.
//!
//! The window is measured in elapsed time, not frame count, so the
//! evaluation cadence holds under variable frame rates.

use socialcue_common::config::GestureConfig;
use socialcue_scene_model::math::EulerAngles;
use socialcue_scene_model::participant::Gesture;

/// Receives recognized (non-`None`) gestures, once per window.
pub trait GestureListener {
    fn gesture_recognized(&mut self, gesture: Gesture);
}

impl<F: FnMut(Gesture)> GestureListener for F {
    fn gesture_recognized(&mut self, gesture: Gesture) {
        self(gesture)
    }
}

/// One orientation delta and the frame time it was observed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationSample {
    pub delta: EulerAngles,
    pub elapsed_secs: f64,
}

/// Per-axis totals of one window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowTotals {
    pub pitch_sum: f64,
    pub yaw_sum: f64,
}

impl WindowTotals {
    pub fn from_samples(samples: &[OrientationSample]) -> Self {
        samples.iter().fold(Self::default(), |acc, s| WindowTotals {
            pitch_sum: acc.pitch_sum + s.delta.pitch.abs(),
            yaw_sum: acc.yaw_sum + s.delta.yaw.abs(),
        })
    }

    /// Classify against `threshold` degrees. Ties resolve to `None`.
    pub fn classify(&self, threshold: f64) -> Gesture {
        let WindowTotals { pitch_sum, yaw_sum } = *self;
        if pitch_sum > yaw_sum && pitch_sum > threshold {
            Gesture::Nod
        } else if yaw_sum > pitch_sum && yaw_sum > threshold {
            Gesture::Shake
        } else {
            Gesture::None
        }
    }
}

/// Windowed nod/shake classifier for one participant's head.
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    window_secs: f64,
    threshold_degrees: f64,
    samples: Vec<OrientationSample>,
    timer_secs: f64,
    last_orientation: Option<EulerAngles>,
    current: Gesture,
}

impl GestureClassifier {
    pub fn new(window_secs: f64, threshold_degrees: f64) -> Self {
        Self {
            window_secs,
            threshold_degrees,
            samples: Vec::new(),
            timer_secs: 0.0,
            last_orientation: None,
            current: Gesture::None,
        }
    }

    pub fn from_config(config: &GestureConfig) -> Self {
        Self::new(config.window_secs, config.threshold_degrees)
    }

    /// Accumulate one orientation delta.
    pub fn observe(&mut self, delta: EulerAngles, elapsed_secs: f64) {
        self.samples.push(OrientationSample {
            delta,
            elapsed_secs,
        });
    }

    /// Accumulate the change from the previously sampled orientation.
    ///
    /// The first orientation after construction (or after
    /// [`lose_tracking`](Self::lose_tracking)) only sets the baseline.
    pub fn observe_orientation(&mut self, orientation: EulerAngles, elapsed_secs: f64) {
        if let Some(last) = self.last_orientation {
            self.observe(last.delta_to(&orientation), elapsed_secs);
        }
        self.last_orientation = Some(orientation);
    }

    /// Forget the orientation baseline (pose unavailable this tick), so the
    /// next sample does not produce a jump spanning the gap.
    pub fn lose_tracking(&mut self) {
        self.last_orientation = None;
    }

    /// Advance the window timer.
    ///
    /// Returns the classification when this tick closes a window, `None`
    /// (the `Option`) otherwise.
    pub fn tick(&mut self, elapsed_secs: f64) -> Option<Gesture> {
        self.timer_secs += elapsed_secs;
        if self.timer_secs <= self.window_secs {
            return None;
        }

        let totals = WindowTotals::from_samples(&self.samples);
        self.current = totals.classify(self.threshold_degrees);
        tracing::trace!(
            pitch_sum = totals.pitch_sum,
            yaw_sum = totals.yaw_sum,
            samples = self.samples.len(),
            gesture = ?self.current,
            "Gesture window evaluated"
        );

        self.samples.clear();
        self.timer_secs = 0.0;
        Some(self.current)
    }

    /// [`tick`](Self::tick), notifying `listener` of a recognized gesture.
    pub fn tick_with(
        &mut self,
        elapsed_secs: f64,
        listener: &mut dyn GestureListener,
    ) -> Option<Gesture> {
        let evaluated = self.tick(elapsed_secs);
        if let Some(gesture) = evaluated.filter(|g| !g.is_none()) {
            listener.gesture_recognized(gesture);
        }
        evaluated
    }

    /// Gesture from the most recently closed window.
    pub fn current(&self) -> Gesture {
        self.current
    }

    /// Samples accumulated in the open window.
    pub fn pending_samples(&self) -> usize {
        self.samples.len()
    }

    /// Frame time covered by the samples of the open window.
    pub fn window_span_secs(&self) -> f64 {
        self.samples.iter().map(|s| s.elapsed_secs).sum()
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::from_config(&GestureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f64 = 1.0 / 60.0;

    fn totals(pitch_sum: f64, yaw_sum: f64) -> WindowTotals {
        WindowTotals { pitch_sum, yaw_sum }
    }

    /// Feed 61 ticks of constant per-tick rotation; returns the window result.
    fn run_window(classifier: &mut GestureClassifier, pitch: f64, yaw: f64) -> Gesture {
        for _ in 0..61 {
            classifier.observe(EulerAngles::new(pitch, yaw, 0.0), DT);
            if let Some(gesture) = classifier.tick(DT) {
                return gesture;
            }
        }
        panic!("window never closed");
    }

    #[test]
    fn test_reference_classifications() {
        assert_eq!(totals(70.0, 10.0).classify(60.0), Gesture::Nod);
        assert_eq!(totals(10.0, 70.0).classify(60.0), Gesture::Shake);
        assert_eq!(totals(50.0, 10.0).classify(60.0), Gesture::None);
    }

    #[test]
    fn test_tie_is_none() {
        assert_eq!(totals(90.0, 90.0).classify(60.0), Gesture::None);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(totals(60.0, 0.0).classify(60.0), Gesture::None);
    }

    #[test]
    fn test_nodding_head_is_a_nod() {
        let mut classifier = GestureClassifier::default();
        // Alternating up/down: signed deltas cancel, absolute sums do not.
        let mut result = None;
        for i in 0..61 {
            let pitch = if i % 2 == 0 { 2.0 } else { -2.0 };
            classifier.observe(EulerAngles::new(pitch, 0.2, 0.0), DT);
            result = classifier.tick(DT).or(result);
        }
        assert_eq!(result, Some(Gesture::Nod));
        assert_eq!(classifier.current(), Gesture::Nod);
    }

    #[test]
    fn test_shaking_head_is_a_shake() {
        let mut classifier = GestureClassifier::default();
        assert_eq!(run_window(&mut classifier, 0.1, 1.5), Gesture::Shake);
    }

    #[test]
    fn test_empty_window_is_none() {
        let mut classifier = GestureClassifier::default();
        assert_eq!(classifier.tick(0.5), None);
        assert_eq!(classifier.tick(0.6), Some(Gesture::None));
    }

    #[test]
    fn test_window_resets_after_evaluation() {
        let mut classifier = GestureClassifier::default();
        assert_eq!(run_window(&mut classifier, 2.0, 0.0), Gesture::Nod);
        assert_eq!(classifier.pending_samples(), 0);

        // Still head: next window is None and the held gesture clears.
        assert_eq!(run_window(&mut classifier, 0.0, 0.0), Gesture::None);
        assert_eq!(classifier.current(), Gesture::None);
    }

    #[test]
    fn test_window_uses_elapsed_time_not_frames() {
        let mut classifier = GestureClassifier::default();
        // 30 Hz host: the window closes after ~31 ticks, not 61.
        let mut closed_at = None;
        for i in 0..40 {
            classifier.observe(EulerAngles::new(3.0, 0.0, 0.0), 1.0 / 30.0);
            if classifier.tick(1.0 / 30.0).is_some() {
                closed_at = Some(i);
                break;
            }
        }
        let closed_at = closed_at.unwrap();
        assert!((29..=31).contains(&closed_at), "closed at tick {closed_at}");
    }

    #[test]
    fn test_listener_only_hears_recognized_gestures() {
        let mut heard = Vec::new();
        let mut classifier = GestureClassifier::default();
        let mut listener = |g: Gesture| heard.push(g);

        classifier.tick_with(1.1, &mut listener);
        for _ in 0..61 {
            classifier.observe(EulerAngles::new(0.0, 2.0, 0.0), DT);
            classifier.tick_with(DT, &mut listener);
        }
        assert_eq!(heard, vec![Gesture::Shake]);
    }

    #[test]
    fn test_orientation_baseline_and_wraparound() {
        let mut classifier = GestureClassifier::default();
        classifier.observe_orientation(EulerAngles::new(0.0, 359.0, 0.0), DT);
        assert_eq!(classifier.pending_samples(), 0);

        classifier.observe_orientation(EulerAngles::new(0.0, 1.0, 0.0), DT);
        assert_eq!(classifier.pending_samples(), 1);
        assert!((classifier.window_span_secs() - DT).abs() < 1e-12);

        classifier.lose_tracking();
        classifier.observe_orientation(EulerAngles::new(0.0, 180.0, 0.0), DT);
        assert_eq!(classifier.pending_samples(), 1);
    }

    proptest! {
        #[test]
        fn classification_is_total_and_ties_are_none(
            deltas in prop::collection::vec((-30.0f64..30.0, -30.0f64..30.0), 0..120),
            threshold in 0.0f64..200.0,
        ) {
            let samples: Vec<OrientationSample> = deltas
                .iter()
                .map(|&(p, y)| OrientationSample {
                    delta: EulerAngles::new(p, y, 0.0),
                    elapsed_secs: DT,
                })
                .collect();
            let t = WindowTotals::from_samples(&samples);
            let g = t.classify(threshold);
            prop_assert!(matches!(g, Gesture::None | Gesture::Nod | Gesture::Shake));

            let tied = totals(t.pitch_sum, t.pitch_sum).classify(threshold);
            prop_assert_eq!(tied, Gesture::None);
        }
    }
}
