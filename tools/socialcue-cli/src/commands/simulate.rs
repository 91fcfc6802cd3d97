//! Run a scripted scene through the presence pipeline.
//!
//! Scene participants are registered when their join time is reached and
//! deregistered when they leave; registrations take effect on the next
//! engine tick. Every tick the scene is evaluated at the tick's end time and
//! handed to the engine as pose source, ray oracle, and voice source.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use socialcue_common::clock::TickClock;
use socialcue_common::config::AppConfig;
use socialcue_host_sim::{load_scene, AudioRecorder, CaptionRecorder, CueLogWriter, ScriptedScene};
use socialcue_presence_core::{PresenceEngine, TickContext, TickReport};
use socialcue_scene_model::cue_log::{CueKind, CueLogHeader, CueRecord};
use socialcue_scene_model::participant::ParticipantId;
use socialcue_scene_model::scene::Scene;

/// Cue log schema version written to the header.
const CUE_LOG_SCHEMA: &str = "1.0";

/// Period of the caption timer in realtime mode.
const CAPTION_TIMER_PERIOD: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Pending,
    Joined(ParticipantId),
    Left,
}

/// One caption that reached a participant's screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ShownCaption {
    pub tick: u64,
    pub viewer: String,
    pub text: String,
}

/// Totals collected over a simulation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationSummary {
    pub ticks: u64,
    pub joined: usize,
    pub left: usize,
    pub captions: Vec<ShownCaption>,
    pub tone_changes: usize,
    pub clips: usize,
    pub cues_suppressed: usize,
    pub gestures_recognized: usize,
    pub mutual_gaze_ticks: u64,
    pub records_logged: u64,
}

/// A scene bound to an engine, stepped one tick at a time.
pub struct Simulation {
    engine: PresenceEngine,
    scripted: ScriptedScene,
    clock: TickClock,
    total_ticks: u64,
    members: Vec<Membership>,
    names: HashMap<ParticipantId, String>,
    audio: AudioRecorder,
    captions: CaptionRecorder,
    log: Option<CueLogWriter>,
    summary: SimulationSummary,
}

impl Simulation {
    pub fn new(config: AppConfig, scene: Scene, duration_secs: f64) -> Self {
        let clock = TickClock::start(config.tick_rate_hz);
        let total_ticks = clock.ticks_for(duration_secs);
        let members = vec![Membership::Pending; scene.participants.len()];

        Self {
            engine: PresenceEngine::new(config),
            scripted: ScriptedScene::new(scene),
            clock,
            total_ticks,
            members,
            names: HashMap::new(),
            audio: AudioRecorder::new(),
            captions: CaptionRecorder::new(),
            log: None,
            summary: SimulationSummary::default(),
        }
    }

    /// Record every emitted cue to a JSONL file.
    pub fn with_log(mut self, path: PathBuf) -> anyhow::Result<Self> {
        let header = CueLogHeader {
            schema_version: CUE_LOG_SCHEMA.to_string(),
            epoch_wall: self.clock.epoch_wall().to_string(),
            tick_rate_hz: self.clock.rate_hz(),
            scene: Some(self.scripted.scene().name.clone()),
        };
        self.log = Some(CueLogWriter::create(path, &header)?);
        Ok(self)
    }

    pub fn tick_period(&self) -> Duration {
        self.clock.fixed_delta()
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn is_finished(&self) -> bool {
        self.clock.ticks_elapsed() >= self.total_ticks
    }

    pub fn engine(&self) -> &PresenceEngine {
        &self.engine
    }

    /// Run one engine tick at the next scene time.
    pub fn step(&mut self) -> anyhow::Result<TickReport> {
        let info = self.clock.advance();
        self.sync_membership(info.time_secs);
        self.scripted.set_time(info.time_secs);
        let world = self.scripted.world();

        self.audio.set_tick(info.index);
        self.captions.set_tick(info.index);

        let report = {
            let mut ctx = TickContext {
                elapsed_secs: info.elapsed_secs,
                poses: Some(&self.scripted),
                oracle: Some(&world),
                voices: Some(&self.scripted),
                audio: &mut self.audio,
                captions: &mut self.captions,
            };
            self.engine.tick(&mut ctx)
        };

        self.summary.ticks += 1;
        self.summary.joined += report.joined.len();
        self.summary.left += report.left.len();
        self.summary.cues_suppressed += report.cues_suppressed;
        self.summary.gestures_recognized += report
            .frames
            .iter()
            .filter(|f| f.gesture_fired.is_some())
            .count();
        if !report.mutual_gaze.is_empty() {
            self.summary.mutual_gaze_ticks += 1;
        }

        self.flush_records()?;
        Ok(report)
    }

    /// Advance every caption display by `elapsed_secs` of wall time.
    pub fn advance_captions(&mut self, elapsed_secs: f64) -> anyhow::Result<()> {
        self.engine
            .advance_captions(elapsed_secs, &mut self.captions);
        self.flush_records()
    }

    /// Run every remaining tick back to back; the caption timer advances by
    /// one tick period after each tick.
    pub fn run_to_end(&mut self) -> anyhow::Result<()> {
        let dt = self.clock.fixed_delta_secs();
        while !self.is_finished() {
            self.step()?;
            self.advance_captions(dt)?;
        }
        Ok(())
    }

    /// Flush the log and return the totals.
    pub fn finish(mut self) -> anyhow::Result<SimulationSummary> {
        if let Some(log) = self.log.as_mut() {
            log.flush()?;
            self.summary.records_logged = log.records_written();
        }
        Ok(self.summary)
    }

    fn sync_membership(&mut self, time_secs: f64) {
        let mut joins = Vec::new();
        let mut leaves = Vec::new();

        for (idx, p) in self.scripted.scene().participants.iter().enumerate() {
            let present = p.is_present_at(time_secs);
            match self.members[idx] {
                Membership::Pending if present => {
                    joins.push((idx, p.name.clone(), p.role, p.microphone_on))
                }
                Membership::Joined(id) if !present => leaves.push((idx, id)),
                _ => {}
            }
        }

        for (idx, name, role, microphone_on) in joins {
            let id = self.engine.register(name.clone(), role);
            if !microphone_on {
                self.engine.set_microphone(id, false);
            }
            self.scripted.bind(&name, id);
            tracing::debug!(participant = %id, name = %name, time_secs, "Scene participant joined");
            self.names.insert(id, name);
            self.members[idx] = Membership::Joined(id);
        }

        for (idx, id) in leaves {
            self.engine.deregister(id);
            self.scripted.unbind(id);
            tracing::debug!(participant = %id, time_secs, "Scene participant left");
            self.members[idx] = Membership::Left;
        }
    }

    fn flush_records(&mut self) -> anyhow::Result<()> {
        let mut records = self.audio.drain();
        records.extend(self.captions.drain());
        records.sort_by_key(|r| r.tick);

        for record in &records {
            self.count(record);
        }
        if let Some(log) = self.log.as_mut() {
            log.write_records(&records)?;
        }
        Ok(())
    }

    fn count(&mut self, record: &CueRecord) {
        match &record.kind {
            CueKind::Shown { text } => self.summary.captions.push(ShownCaption {
                tick: record.tick,
                viewer: self
                    .names
                    .get(&record.participant)
                    .cloned()
                    .unwrap_or_else(|| record.participant.to_string()),
                text: text.clone(),
            }),
            CueKind::Cleared => {}
            CueKind::Tone { .. } => self.summary.tone_changes += 1,
            CueKind::Clip { .. } => self.summary.clips += 1,
        }
    }
}

pub async fn run(
    config: AppConfig,
    scene_path: PathBuf,
    duration: Option<f64>,
    log: Option<PathBuf>,
    realtime: bool,
) -> anyhow::Result<()> {
    let scene = load_scene(&scene_path)?;

    for warning in config.lint() {
        tracing::warn!("Config: {warning}");
    }

    let duration_secs = duration
        .or(scene.duration_secs)
        .unwrap_or_else(|| scene.natural_duration_secs());
    if duration_secs <= 0.0 {
        anyhow::bail!("Nothing to simulate: duration is {duration_secs}s");
    }

    let rate_hz = config.tick_rate_hz;
    let scene_name = scene.name.clone();
    println!("Simulating scene: {scene_name}");
    println!("  Duration: {duration_secs:.2}s at {rate_hz} Hz");
    if realtime {
        println!("  Mode: realtime (Ctrl+C to stop)");
    }
    println!();

    let mut sim = Simulation::new(config, scene, duration_secs);
    if let Some(path) = log.clone() {
        sim = sim.with_log(path)?;
    }

    if realtime {
        run_realtime(&mut sim).await?;
    } else {
        sim.run_to_end()?;
    }

    let summary = sim.finish()?;
    print_summary(&summary, rate_hz, log.as_ref());
    Ok(())
}

/// Drive ticks and the caption timer from two intervals on one task.
async fn run_realtime(sim: &mut Simulation) -> anyhow::Result<()> {
    let mut tick_timer = tokio::time::interval(sim.tick_period());
    tick_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut caption_timer = tokio::time::interval(CAPTION_TIMER_PERIOD);
    let mut last_caption = tokio::time::Instant::now();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while !sim.is_finished() {
        tokio::select! {
            _ = tick_timer.tick() => {
                sim.step()?;
            }
            now = caption_timer.tick() => {
                sim.advance_captions((now - last_caption).as_secs_f64())?;
                last_caption = now;
            }
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }
    Ok(())
}

fn print_summary(summary: &SimulationSummary, rate_hz: u32, log: Option<&PathBuf>) {
    let rate = rate_hz.max(1) as f64;
    println!("Ticks: {}", summary.ticks);
    println!(
        "Participants: {} joined, {} left",
        summary.joined, summary.left
    );
    println!("Captions shown: {}", summary.captions.len());
    for caption in &summary.captions {
        println!(
            "  [{:>7.2}s] {} <- \"{}\"",
            caption.tick as f64 / rate,
            caption.viewer,
            caption.text
        );
    }
    println!("Cues suppressed by cooldown: {}", summary.cues_suppressed);
    println!("Gestures recognized: {}", summary.gestures_recognized);
    println!(
        "Tone changes: {}, clips: {}",
        summary.tone_changes, summary.clips
    );
    println!("Ticks with mutual gaze: {}", summary.mutual_gaze_ticks);
    if let Some(path) = log {
        println!(
            "Cue log: {} ({} records)",
            path.display(),
            summary.records_logged
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACING_PAIR: &str = r#"{
        "name": "facing pair",
        "participants": [
            {
                "name": "Alice",
                "role": "local_owner",
                "keyframes": [{ "time_secs": 0.0, "position": { "x": 0.0, "y": 0.0, "z": 0.0 } }]
            },
            {
                "name": "Bob",
                "joins_at_secs": 0.5,
                "leaves_at_secs": 1.5,
                "keyframes": [{
                    "time_secs": 0.0,
                    "position": { "x": 0.0, "y": 0.0, "z": 3.0 },
                    "forward": { "x": 0.0, "y": 0.0, "z": -1.0 }
                }]
            }
        ]
    }"#;

    fn simulation(secs: f64) -> Simulation {
        let scene = Scene::from_json(FACING_PAIR).unwrap();
        Simulation::new(AppConfig::default(), scene, secs)
    }

    #[test]
    fn test_scene_microphone_mutes_participant() {
        let scene = Scene::from_json(
            r#"{
                "name": "muted",
                "participants": [
                    {
                        "name": "Alice",
                        "role": "local_owner",
                        "keyframes": [{ "time_secs": 0.0, "position": { "x": 0.0, "y": 0.0, "z": 0.0 } }]
                    },
                    {
                        "name": "Bob",
                        "voice_amplitude": 0.05,
                        "microphone_on": false,
                        "keyframes": [{ "time_secs": 0.0, "position": { "x": 0.0, "y": 0.0, "z": 2.0 } }]
                    },
                    {
                        "name": "Carol",
                        "voice_amplitude": 0.01,
                        "keyframes": [{ "time_secs": 0.0, "position": { "x": 0.0, "y": 0.0, "z": 3.0 } }]
                    }
                ]
            }"#,
        )
        .unwrap();
        let mut sim = Simulation::new(AppConfig::default(), scene, 1.0);

        let report = sim.step().unwrap();
        let alice = sim.engine().registry().find_by_name("Alice").unwrap().id();
        let bob = sim.engine().registry().find_by_name("Bob").unwrap().id();
        let carol = sim.engine().registry().find_by_name("Carol").unwrap().id();
        assert!(!sim.engine().registry().get(bob).unwrap().microphone_on());
        assert_eq!(report.frame(bob).unwrap().voice_level, 0.0);
        assert_eq!(report.frame(alice).unwrap().talking_indicator, Some(carol));
    }

    #[test]
    fn test_tick_count_from_duration() {
        let sim = simulation(1.0);
        assert_eq!(sim.total_ticks(), 60);
        assert!(!sim.is_finished());
    }

    #[test]
    fn test_join_and_leave_follow_scene_times() {
        let mut sim = simulation(2.0);
        sim.run_to_end().unwrap();
        assert!(sim.is_finished());
        assert_eq!(sim.engine().registry().len(), 1);

        let summary = sim.finish().unwrap();
        assert_eq!(summary.ticks, 120);
        assert_eq!(summary.joined, 2);
        assert_eq!(summary.left, 1);
    }

    #[test]
    fn test_eye_contact_caption_shown_once_per_cooldown() {
        let mut sim = simulation(1.0);
        sim.run_to_end().unwrap();
        let summary = sim.finish().unwrap();

        let eye_contact: Vec<_> = summary
            .captions
            .iter()
            .filter(|c| c.text == "Bob: eye contact")
            .collect();
        assert!(!eye_contact.is_empty());
        assert!(eye_contact.iter().all(|c| c.viewer == "Alice"));
        assert!(summary.cues_suppressed > 0);
        assert!(summary.mutual_gaze_ticks > 0);
    }
}
