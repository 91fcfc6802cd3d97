//! Caption cooldowns and the caption display loop.
//!
//! A cue is the caption `"<subject>: <label>"`. Once enqueued, an identical
//! cue is suppressed for `block_frame_count` ticks. Only the per-tick
//! [`CueDeduplicator::sweep`] decrements cooldowns; a suppressed request
//! leaves the counter alone so the window is never halved.
//!
//! Enqueued captions are presented one at a time by a [`CaptionDisplay`]:
//!
//! ```text
//!   Idle --enqueue--> Displaying --(display time elapsed, queue empty)--> Idle
//!                      |    ^
//!                      +----+ (display time elapsed, next caption popped)
//!   Displaying --cancel--> Idle
//! ```
//!
//! The display is advanced by a timer independent of ticks; both sides go
//! through `&mut` methods, so the queue and displaying flag have one writer
//! at a time.

use std::collections::{BTreeMap, VecDeque};

use socialcue_common::config::CaptionConfig;
use socialcue_scene_model::host::CaptionSink;
use socialcue_scene_model::participant::ParticipantId;

/// Result of a cue request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueOutcome {
    /// Accepted; cooldown (re)started. An identical caption already
    /// waiting in the queue absorbs the request.
    Enqueued,
    /// An identical cue is cooling down.
    Suppressed { remaining_ticks: u32 },
}

/// Display loop state.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Idle,
    Displaying { text: String, remaining_secs: f64 },
}

/// Single-flight caption presenter for one participant.
#[derive(Debug, Clone)]
pub struct CaptionDisplay {
    owner: ParticipantId,
    display_time_secs: f64,
    visible: bool,
    queue: VecDeque<String>,
    state: DisplayState,
}

impl CaptionDisplay {
    pub fn new(owner: ParticipantId, display_time_secs: f64, visible: bool) -> Self {
        Self {
            owner,
            display_time_secs,
            visible,
            queue: VecDeque::new(),
            state: DisplayState::Idle,
        }
    }

    /// Queue a caption; starts presenting if nothing is on screen.
    ///
    /// Text identical to a caption already waiting is dropped, so a cue
    /// repeating faster than the display time keeps at most one copy in the
    /// queue. Returns whether the caption was queued.
    pub fn enqueue(&mut self, text: String, sink: &mut dyn CaptionSink) -> bool {
        if self.queue.contains(&text) {
            tracing::trace!(participant = %self.owner, caption = %text, "Caption already queued");
            return false;
        }
        self.queue.push_back(text);
        if matches!(self.state, DisplayState::Idle) {
            self.present_next(sink);
        }
        true
    }

    /// Advance the display timer by `elapsed_secs`.
    ///
    /// A long step can expire several captions; each one that expires is
    /// replaced by the next in the queue (carrying over the surplus time).
    pub fn advance(&mut self, elapsed_secs: f64, sink: &mut dyn CaptionSink) {
        let mut budget = elapsed_secs;
        while let DisplayState::Displaying { remaining_secs, .. } = &mut self.state {
            if budget < *remaining_secs {
                *remaining_secs -= budget;
                return;
            }
            budget -= *remaining_secs;
            self.present_next(sink);
        }
    }

    /// Stop presenting and drop everything queued.
    pub fn cancel(&mut self, sink: &mut dyn CaptionSink) {
        self.queue.clear();
        if matches!(self.state, DisplayState::Displaying { .. }) {
            if self.visible {
                sink.clear(self.owner);
            }
            self.state = DisplayState::Idle;
            tracing::debug!(participant = %self.owner, "Caption display cancelled");
        }
    }

    fn present_next(&mut self, sink: &mut dyn CaptionSink) {
        match self.queue.pop_front() {
            Some(text) => {
                if self.visible {
                    sink.show(self.owner, &text);
                }
                tracing::debug!(participant = %self.owner, caption = %text, "Caption shown");
                self.state = DisplayState::Displaying {
                    text,
                    remaining_secs: self.display_time_secs.max(f64::MIN_POSITIVE),
                };
            }
            None => {
                if self.visible {
                    sink.clear(self.owner);
                }
                self.state = DisplayState::Idle;
            }
        }
    }

    pub fn is_displaying(&self) -> bool {
        matches!(self.state, DisplayState::Displaying { .. })
    }

    /// Caption currently on screen.
    pub fn current_text(&self) -> Option<&str> {
        match &self.state {
            DisplayState::Displaying { text, .. } => Some(text),
            DisplayState::Idle => None,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Captions waiting behind the current one.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }
}

/// Cooldown table plus caption display for one participant.
#[derive(Debug, Clone)]
pub struct CueDeduplicator {
    block_frame_count: u32,
    cooldowns: BTreeMap<String, u32>,
    display: CaptionDisplay,
}

impl CueDeduplicator {
    pub fn new(owner: ParticipantId, config: &CaptionConfig) -> Self {
        Self {
            block_frame_count: config.block_frame_count,
            cooldowns: BTreeMap::new(),
            display: CaptionDisplay::new(owner, config.display_time_secs, config.show_captions),
        }
    }

    /// Cue text as presented to the user.
    pub fn cue_key(subject: &str, label: &str) -> String {
        format!("{subject}: {label}")
    }

    /// Request a caption about `subject`.
    pub fn request_cue(
        &mut self,
        subject: &str,
        label: &str,
        sink: &mut dyn CaptionSink,
    ) -> CueOutcome {
        let key = Self::cue_key(subject, label);
        if let Some(&remaining_ticks) = self.cooldowns.get(&key).filter(|&&r| r > 0) {
            return CueOutcome::Suppressed { remaining_ticks };
        }

        if self.block_frame_count > 0 {
            self.cooldowns.insert(key.clone(), self.block_frame_count);
        }
        self.display.enqueue(key, sink);
        CueOutcome::Enqueued
    }

    /// Per-tick cooldown decay: every entry loses one tick and is evicted
    /// when it reaches zero.
    pub fn sweep(&mut self) {
        self.cooldowns.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(1);
            *remaining > 0
        });
    }

    /// Remaining cooldown for a cue, if it is cooling down.
    pub fn cooldown(&self, subject: &str, label: &str) -> Option<u32> {
        self.cooldowns.get(&Self::cue_key(subject, label)).copied()
    }

    pub fn active_cooldowns(&self) -> usize {
        self.cooldowns.len()
    }

    pub fn display(&self) -> &CaptionDisplay {
        &self.display
    }

    /// Advance the caption display timer.
    pub fn advance_display(&mut self, elapsed_secs: f64, sink: &mut dyn CaptionSink) {
        self.display.advance(elapsed_secs, sink);
    }

    /// Drop the display loop and any queued captions.
    pub fn cancel(&mut self, sink: &mut dyn CaptionSink) {
        self.display.cancel(sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Screen {
        log: Vec<String>,
    }

    impl CaptionSink for Screen {
        fn show(&mut self, _: ParticipantId, text: &str) {
            self.log.push(format!("show {text}"));
        }

        fn clear(&mut self, _: ParticipantId) {
            self.log.push("clear".to_string());
        }
    }

    fn dedup() -> CueDeduplicator {
        CueDeduplicator::new(ParticipantId(0), &CaptionConfig::default())
    }

    #[test]
    fn test_cue_key_format() {
        assert_eq!(
            CueDeduplicator::cue_key("Alice", "eye contact"),
            "Alice: eye contact"
        );
    }

    #[test]
    fn test_repeat_within_cooldown_is_suppressed() {
        let mut screen = Screen::default();
        let mut cues = dedup();

        assert_eq!(
            cues.request_cue("Alice", "eye contact", &mut screen),
            CueOutcome::Enqueued
        );
        cues.sweep();
        assert_eq!(
            cues.request_cue("Alice", "eye contact", &mut screen),
            CueOutcome::Suppressed { remaining_ticks: 9 }
        );
        assert_eq!(screen.log, vec!["show Alice: eye contact"]);
    }

    #[test]
    fn test_suppression_does_not_decrement() {
        let mut screen = Screen::default();
        let mut cues = dedup();
        cues.request_cue("Alice", "eye contact", &mut screen);
        for _ in 0..5 {
            cues.request_cue("Alice", "eye contact", &mut screen);
        }
        assert_eq!(cues.cooldown("Alice", "eye contact"), Some(10));
    }

    #[test]
    fn test_cooldown_expires_after_block_frame_count_ticks() {
        let mut screen = Screen::default();
        let mut cues = dedup();
        cues.request_cue("Alice", "eye contact", &mut screen);

        for tick in 0..10 {
            assert!(cues.cooldown("Alice", "eye contact").is_some(), "tick {tick}");
            cues.sweep();
        }
        assert_eq!(cues.cooldown("Alice", "eye contact"), None);
        assert_eq!(cues.active_cooldowns(), 0);
        assert_eq!(
            cues.request_cue("Alice", "eye contact", &mut screen),
            CueOutcome::Enqueued
        );
    }

    #[test]
    fn test_different_cues_queue_behind_each_other() {
        let mut screen = Screen::default();
        let mut cues = dedup();
        cues.request_cue("Alice", "eye contact", &mut screen);
        cues.request_cue("Bob", "nodding", &mut screen);

        assert_eq!(cues.display().current_text(), Some("Alice: eye contact"));
        assert_eq!(
            cues.display().pending().collect::<Vec<_>>(),
            vec!["Bob: nodding"]
        );

        cues.advance_display(2.9, &mut screen);
        assert_eq!(cues.display().current_text(), Some("Alice: eye contact"));

        cues.advance_display(0.2, &mut screen);
        assert_eq!(cues.display().current_text(), Some("Bob: nodding"));

        cues.advance_display(3.0, &mut screen);
        assert!(!cues.display().is_displaying());
        assert_eq!(
            screen.log,
            vec!["show Alice: eye contact", "show Bob: nodding", "clear"]
        );
    }

    #[test]
    fn test_long_advance_drains_several_captions() {
        let mut screen = Screen::default();
        let mut display = CaptionDisplay::new(ParticipantId(3), 1.0, true);
        display.enqueue("a".into(), &mut screen);
        display.enqueue("b".into(), &mut screen);
        display.enqueue("c".into(), &mut screen);

        display.advance(2.5, &mut screen);
        assert_eq!(display.current_text(), Some("c"));
        assert_eq!(
            display.state(),
            &DisplayState::Displaying {
                text: "c".into(),
                remaining_secs: 0.5
            }
        );
    }

    #[test]
    fn test_enqueue_while_displaying_does_not_restart() {
        let mut screen = Screen::default();
        let mut display = CaptionDisplay::new(ParticipantId(0), 3.0, true);
        display.enqueue("first".into(), &mut screen);
        display.advance(1.0, &mut screen);
        display.enqueue("second".into(), &mut screen);

        assert_eq!(display.current_text(), Some("first"));
        assert_eq!(screen.log, vec!["show first"]);
    }

    #[test]
    fn test_repeating_cue_keeps_one_queued_copy() {
        let mut screen = Screen::default();
        let mut cues = dedup();

        // Steady gaze for 3 s at 60 Hz: a request every tick, past cooldowns.
        let mut enqueued = 0;
        for _ in 0..180 {
            if cues.request_cue("Bob", "eye contact", &mut screen) == CueOutcome::Enqueued {
                enqueued += 1;
            }
            cues.sweep();
        }
        assert_eq!(enqueued, 18);
        assert_eq!(cues.display().current_text(), Some("Bob: eye contact"));
        assert_eq!(
            cues.display().pending().collect::<Vec<_>>(),
            vec!["Bob: eye contact"]
        );

        cues.advance_display(3.0, &mut screen);
        cues.advance_display(3.0, &mut screen);
        assert!(!cues.display().is_displaying());
        assert_eq!(
            screen.log,
            vec!["show Bob: eye contact", "show Bob: eye contact", "clear"]
        );
    }

    #[test]
    fn test_cancel_clears_screen_and_queue() {
        let mut screen = Screen::default();
        let mut cues = dedup();
        cues.request_cue("Alice", "eye contact", &mut screen);
        cues.request_cue("Bob", "shaking", &mut screen);

        cues.cancel(&mut screen);
        assert!(!cues.display().is_displaying());
        assert_eq!(cues.display().pending().count(), 0);
        assert_eq!(screen.log.last().map(String::as_str), Some("clear"));

        // Cancelling an idle display is a no-op.
        cues.cancel(&mut screen);
        assert_eq!(screen.log.len(), 2);
    }

    #[test]
    fn test_hidden_captions_still_cycle() {
        let mut screen = Screen::default();
        let config = CaptionConfig {
            show_captions: false,
            ..CaptionConfig::default()
        };
        let mut cues = CueDeduplicator::new(ParticipantId(0), &config);
        cues.request_cue("Alice", "eye contact", &mut screen);

        assert!(cues.display().is_displaying());
        cues.advance_display(3.0, &mut screen);
        assert!(!cues.display().is_displaying());
        assert!(screen.log.is_empty());
    }
}
