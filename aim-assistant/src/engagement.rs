//! The sequential capture -> detect -> track -> select -> engage loop
//!
//! Every stage runs on the calling thread in a fixed order, and the next
//! capture never starts before the previous cycle's blind period is over.
//! That ordering is what keeps ghost suppression sound: the tracker sees the
//! shot mark before it sees the next frame.

use crate::clock::Clock;
use crate::config::AssistConfig;
use crate::detector::ColorBlobDetector;
use crate::detector_trait::TargetDetector;
use crate::devices::{ActivationInput, Actuator, FrameSource, ToggleLatch};
use crate::scheduler::{ActionScheduler, CycleOutcome, ShotReport};
use crate::selector::TargetSelector;
use blobtrack::GhostTracker;
use std::time::{Duration, Instant};

/// What a single tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Assist is toggled off
    Inactive,
    /// The frame source had nothing to offer this tick
    FrameUnavailable,
    /// A frame was processed but nothing engageable was found
    NoTargets { detections: usize },
    /// The scheduler ran a cycle on the selected target
    Cycle(CycleOutcome),
    /// Too many failed actuations; the assist switched itself off
    SafetyStop,
}

/// Counters for the current session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub ticks: u64,
    pub frames: u64,
    pub frames_unavailable: u64,
    pub detections: u64,
    pub shots: u64,
    pub safety_stops: u64,
    /// Frames whose size differs from the configured capture region
    pub frames_mismatched: u64,
    /// Statistics lines logged this session
    pub stats_reports: u64,
    pub last_action: String,
}

/// Single-threaded engagement loop wiring the components to their collaborators
pub struct AssistLoop<S, A, K, C>
where
    S: FrameSource,
    A: Actuator,
    K: ActivationInput,
    C: Clock + Clone,
{
    detector: Box<dyn TargetDetector>,
    tracker: GhostTracker,
    selector: TargetSelector,
    scheduler: ActionScheduler<C>,
    source: S,
    actuator: A,
    input: K,
    clock: C,
    latch: ToggleLatch,
    compensate_aim_motion: bool,
    capture_size: (u32, u32),
    idle_poll: Duration,
    stats_interval: Duration,
    stats: SessionStats,
    window_start: Instant,
    window_frames: u64,
}

impl<S, A, K, C> AssistLoop<S, A, K, C>
where
    S: FrameSource,
    A: Actuator,
    K: ActivationInput,
    C: Clock + Clone,
{
    pub fn new(config: &AssistConfig, source: S, actuator: A, input: K, clock: C) -> Self {
        log::info!(
            "Creating AssistLoop: capture {}x{}, toggle key {}",
            config.capture.width,
            config.capture.height,
            config.activation.toggle_key
        );
        let window_start = clock.now();
        Self {
            detector: Box::new(ColorBlobDetector::new((&config.detector).into())),
            tracker: GhostTracker::new((&config.tracker).into()),
            selector: TargetSelector::new((&config.selector).into()),
            scheduler: ActionScheduler::new((&config.scheduler).into(), clock.clone()),
            source,
            actuator,
            input,
            clock,
            latch: ToggleLatch::new(),
            compensate_aim_motion: config.tracker.compensate_aim_motion,
            capture_size: (config.capture.width, config.capture.height),
            idle_poll: config.idle_poll(),
            stats_interval: config.stats_interval(),
            stats: SessionStats::default(),
            window_start,
            window_frames: 0,
        }
    }

    /// Replace the color-blob detector
    pub fn with_detector(mut self, detector: Box<dyn TargetDetector>) -> Self {
        log::info!("Using detector: {}", detector.name());
        self.detector = detector;
        self
    }

    pub fn is_active(&self) -> bool {
        self.latch.is_active()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn tracker(&self) -> &GhostTracker {
        &self.tracker
    }

    pub fn scheduler(&self) -> &ActionScheduler<C> {
        &self.scheduler
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Switch the assist on or off without a key press
    pub fn set_active(&mut self, active: bool) {
        if active == self.latch.is_active() {
            return;
        }
        self.latch.set_active(active);
        self.on_toggle(active);
    }

    fn on_toggle(&mut self, active: bool) {
        if active {
            self.tracker.reset();
            self.scheduler.activate();
            self.stats.shots = 0;
            self.stats.stats_reports = 0;
            self.stats.last_action = "activated".to_string();
            self.window_start = self.clock.now();
            self.window_frames = 0;
            log::info!("Assist ON");
        } else {
            self.scheduler.deactivate();
            self.stats.last_action = "deactivated".to_string();
            log::info!("Assist OFF");
        }
    }

    /// Run one iteration of the loop
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;

        if let Some(active) = self.latch.poll(self.input.is_toggle_down()) {
            self.on_toggle(active);
        }
        if !self.latch.is_active() {
            self.clock.sleep(self.idle_poll);
            return TickOutcome::Inactive;
        }

        self.scheduler.settle();

        let frame = match self.source.grab() {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("Skipping tick: {}", e);
                self.stats.frames_unavailable += 1;
                self.maybe_log_stats();
                return TickOutcome::FrameUnavailable;
            }
        };
        self.stats.frames += 1;
        self.window_frames += 1;
        self.check_frame_size(frame.image.width, frame.image.height);

        let observations = self.detector.detect(&frame.image);
        self.stats.detections += observations.len() as u64;

        let results = self.tracker.update_at(&observations, self.clock.now());
        let candidates = GhostTracker::engageable(&results);
        log::debug!(
            "Frame {}: {} detections, {} tracks, {} engageable",
            self.stats.frames,
            observations.len(),
            results.len(),
            candidates.len()
        );

        let outcome = match self.selector.select(frame.aim_origin(), &candidates) {
            None => TickOutcome::NoTargets {
                detections: observations.len(),
            },
            Some(target) => {
                let origin = frame.aim_origin();
                let cycle = self.scheduler.engage(origin, target, &mut self.actuator);
                match &cycle {
                    CycleOutcome::Fired(report) => self.record_shot(report),
                    // Not-before deadline: wait it out instead of re-polling
                    CycleOutcome::CoolingDown { remaining } => self.clock.sleep(*remaining),
                    _ => {}
                }
                TickOutcome::Cycle(cycle)
            }
        };

        if self.scheduler.safety_tripped() {
            log::error!(
                "Safety stop: {} consecutive actuation failures, switching assist off",
                self.scheduler.consecutive_failures()
            );
            self.stats.safety_stops += 1;
            self.latch.set_active(false);
            self.on_toggle(false);
            return TickOutcome::SafetyStop;
        }

        self.maybe_log_stats();
        outcome
    }

    fn record_shot(&mut self, report: &ShotReport) {
        self.tracker.mark_shot_at(report.track_id, report.fired_at);
        // A rejected move leaves the view where it was
        if self.compensate_aim_motion && !report.instant && !report.actuation_failed {
            self.tracker.shift(-report.offset.0, -report.offset.1);
        }
        self.stats.shots += 1;
        self.stats.last_action = if report.instant {
            format!("instant shot at track {}", report.track_id)
        } else {
            format!(
                "shot track {} after moving ({}, {}) in {} step(s)",
                report.track_id, report.movement.0, report.movement.1, report.sub_moves
            )
        };
    }

    fn check_frame_size(&mut self, width: u32, height: u32) {
        if (width, height) == self.capture_size {
            return;
        }
        self.stats.frames_mismatched += 1;
        if self.stats.frames_mismatched == 1 {
            log::warn!(
                "Frame is {}x{}, configured capture region is {}x{}",
                width,
                height,
                self.capture_size.0,
                self.capture_size.1
            );
        }
    }

    /// Log one statistics line if the window is over; returns whether it did
    fn maybe_log_stats(&mut self) -> bool {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.stats_interval {
            return false;
        }
        let fps = self.window_frames as f64 / elapsed.as_secs_f64();
        log::info!(
            "FPS: {:.1} | Shots: {} | {}",
            fps,
            self.stats.shots,
            self.stats.last_action
        );
        self.window_start = now;
        self.window_frames = 0;
        self.stats.stats_reports += 1;
        true
    }

    /// Run `ticks` iterations
    pub fn run_ticks(&mut self, ticks: u64) -> &SessionStats {
        for _ in 0..ticks {
            self.tick();
        }
        &self.stats
    }

    /// Tick until `stop` returns true for the current statistics
    pub fn run_until<F>(&mut self, mut stop: F) -> &SessionStats
    where
        F: FnMut(&SessionStats) -> bool,
    {
        while !stop(&self.stats) {
            self.tick();
        }
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::devices::RecordingActuator;
    use crate::error::{AssistError, Result};
    use crate::types::{Frame, ImageData, ImageFormat};
    use std::collections::VecDeque;

    /// Replays a fixed frame sequence, then reports unavailable
    struct ScriptedSource {
        frames: VecDeque<Frame>,
    }

    impl FrameSource for ScriptedSource {
        fn grab(&mut self) -> Result<Frame> {
            self.frames
                .pop_front()
                .ok_or_else(|| AssistError::capture("window not found"))
        }
    }

    /// Key level sequence; stays up once exhausted
    struct ScriptedKeys(VecDeque<bool>);

    impl ActivationInput for ScriptedKeys {
        fn is_toggle_down(&mut self) -> bool {
            self.0.pop_front().unwrap_or(false)
        }
    }

    fn frame_with_discs(centres: &[(u32, u32)]) -> Frame {
        let (w, h) = (200u32, 160u32);
        let mut data = vec![30u8; (w * h * 3) as usize];
        for y in 0..h {
            for x in 0..w {
                let inside = centres.iter().any(|&(cx, cy)| {
                    let dx = x as i32 - cx as i32;
                    let dy = y as i32 - cy as i32;
                    dx * dx + dy * dy <= 14 * 14
                });
                if inside {
                    let i = ((y * w + x) * 3) as usize;
                    data[i..i + 3].copy_from_slice(&[255, 170, 0]);
                }
            }
        }
        Frame::new(ImageData::new(data, w, h, ImageFormat::BGR), (0, 0))
    }

    fn make_loop(
        frames: Vec<Frame>,
        keys: Vec<bool>,
    ) -> AssistLoop<ScriptedSource, RecordingActuator, ScriptedKeys, ManualClock> {
        AssistLoop::new(
            &AssistConfig::default(),
            ScriptedSource {
                frames: frames.into(),
            },
            RecordingActuator::new(),
            ScriptedKeys(keys.into()),
            ManualClock::new(),
        )
    }

    #[test]
    fn test_inactive_until_toggled() {
        let mut assist = make_loop(vec![frame_with_discs(&[(100, 80)])], vec![]);
        assert_eq!(assist.tick(), TickOutcome::Inactive);
        assert!(assist.actuator().commands.is_empty());
    }

    #[test]
    fn test_instant_shot_on_centred_target() {
        let mut assist = make_loop(vec![frame_with_discs(&[(105, 80)])], vec![true]);
        match assist.tick() {
            TickOutcome::Cycle(CycleOutcome::Fired(report)) => assert!(report.instant),
            other => panic!("expected a shot, got {:?}", other),
        }
        assert_eq!(assist.actuator().clicks(), 1);
        assert_eq!(assist.stats().shots, 1);
    }

    #[test]
    fn test_shot_target_is_not_engaged_twice() {
        // The same disc stays visible for three frames after being shot
        let frames = vec![frame_with_discs(&[(160, 80)]); 3];
        let mut assist = make_loop(frames, vec![true]);

        assert!(matches!(
            assist.tick(),
            TickOutcome::Cycle(CycleOutcome::Fired(_))
        ));
        // Camera motion compensation keeps the ghost associated with the blob
        assert_eq!(assist.tick(), TickOutcome::NoTargets { detections: 1 });
        assert_eq!(assist.tick(), TickOutcome::NoTargets { detections: 1 });
        assert_eq!(assist.actuator().clicks(), 1);
        assert_eq!(assist.actuator().moves(), vec![(60, 0)]);
    }

    #[test]
    fn test_missing_frames_skip_tick() {
        let mut assist = make_loop(vec![], vec![true]);
        assert_eq!(assist.tick(), TickOutcome::FrameUnavailable);
        assert_eq!(assist.stats().frames_unavailable, 1);
        assert!(assist.actuator().commands.is_empty());
    }

    #[test]
    fn test_toggle_off_and_on_starts_new_session() {
        let frames = vec![frame_with_discs(&[(100, 80)]); 4];
        // on, held, released, pressed again (off), released for a while, pressed (on)
        let keys = vec![true, true, false, true, false, false, false, true];
        let mut assist = make_loop(frames, keys);

        assert!(matches!(
            assist.tick(),
            TickOutcome::Cycle(CycleOutcome::Fired(_))
        ));
        assert!(assist.is_active());
        assert!(!assist.tracker().is_empty());
        assist.tick();
        assist.tick();

        assert_eq!(assist.tick(), TickOutcome::Inactive);
        assert!(!assist.is_active());
        // Idle polls let the shot cooldown run out
        for _ in 0..3 {
            assert_eq!(assist.tick(), TickOutcome::Inactive);
        }

        // Re-activation resets the tracker, so the disc is a fresh track
        match assist.tick() {
            TickOutcome::Cycle(CycleOutcome::Fired(report)) => {
                assert_eq!(report.track_id, blobtrack::TrackId(1))
            }
            other => panic!("expected a shot, got {:?}", other),
        }
        assert_eq!(assist.stats().shots, 1);
    }

    #[test]
    fn test_safety_stop() {
        let mut config = AssistConfig::default();
        config.scheduler.max_consecutive_failures = 1;
        let mut assist = AssistLoop::new(
            &config,
            ScriptedSource {
                frames: vec![frame_with_discs(&[(100, 80)]); 2].into(),
            },
            RecordingActuator {
                reject: true,
                ..RecordingActuator::default()
            },
            ScriptedKeys(VecDeque::new()),
            ManualClock::new(),
        );
        assist.set_active(true);

        assert_eq!(assist.tick(), TickOutcome::SafetyStop);
        assert!(!assist.is_active());
        assert_eq!(assist.stats().safety_stops, 1);
        assert_eq!(assist.tick(), TickOutcome::Inactive);
    }

    fn loop_with(
        config: &AssistConfig,
        frames: Vec<Frame>,
        actuator: RecordingActuator,
        clock: &ManualClock,
    ) -> AssistLoop<ScriptedSource, RecordingActuator, ScriptedKeys, ManualClock> {
        AssistLoop::new(
            config,
            ScriptedSource {
                frames: frames.into(),
            },
            actuator,
            ScriptedKeys(VecDeque::new()),
            clock.clone(),
        )
    }

    #[test]
    fn test_cooldown_waits_instead_of_spinning() {
        // Two targets; the second is gated by the shot cooldown
        let frames = vec![frame_with_discs(&[(100, 80), (160, 80)]); 3];
        let clock = ManualClock::new();
        let mut assist = loop_with(
            &AssistConfig::default(),
            frames,
            RecordingActuator::new(),
            &clock,
        );
        assist.set_active(true);

        let fired_at = match assist.tick() {
            TickOutcome::Cycle(CycleOutcome::Fired(report)) => report.fired_at,
            other => panic!("expected a shot, got {:?}", other),
        };
        assert!(matches!(
            assist.tick(),
            TickOutcome::Cycle(CycleOutcome::CoolingDown { .. })
        ));
        assert_eq!(clock.now() - fired_at, Duration::from_millis(50));

        assert!(matches!(
            assist.tick(),
            TickOutcome::Cycle(CycleOutcome::Fired(_))
        ));
        assert_eq!(assist.actuator().clicks(), 2);
    }

    #[test]
    fn test_stats_window_starts_at_activation() {
        let clock = ManualClock::new();
        let mut assist = loop_with(
            &AssistConfig::default(),
            vec![],
            RecordingActuator::new(),
            &clock,
        );

        // Idle time before activation does not count toward the first window
        clock.advance(Duration::from_secs(5));
        assist.set_active(true);
        assert_eq!(assist.tick(), TickOutcome::FrameUnavailable);
        assert_eq!(assist.stats().stats_reports, 0);

        clock.advance(Duration::from_millis(1999));
        assist.tick();
        assert_eq!(assist.stats().stats_reports, 0);

        clock.advance(Duration::from_millis(1));
        assist.tick();
        assert_eq!(assist.stats().stats_reports, 1);

        // The window restarted at the report
        assist.tick();
        clock.advance(Duration::from_millis(1500));
        assist.tick();
        assert_eq!(assist.stats().stats_reports, 1);
        assert!(!assist.maybe_log_stats());

        clock.advance(Duration::from_millis(500));
        assert!(assist.maybe_log_stats());
        assert_eq!(assist.stats().stats_reports, 2);
    }

    #[test]
    fn test_rejected_move_does_not_shift_tracks() {
        let frames = vec![frame_with_discs(&[(160, 80)])];
        let clock = ManualClock::new();
        let rejecting = RecordingActuator {
            reject: true,
            ..RecordingActuator::default()
        };
        let mut assist = loop_with(&AssistConfig::default(), frames.clone(), rejecting, &clock);
        assist.set_active(true);

        match assist.tick() {
            TickOutcome::Cycle(CycleOutcome::Fired(report)) => assert!(report.actuation_failed),
            other => panic!("expected a shot, got {:?}", other),
        }
        let track = assist.tracker().get(blobtrack::TrackId(1)).unwrap();
        assert_eq!(track.position(), blobtrack::Point::new(160.0, 80.0));

        // An accepted move shifts the track to the new aim origin
        let mut assist = loop_with(
            &AssistConfig::default(),
            frames,
            RecordingActuator::new(),
            &clock,
        );
        assist.set_active(true);
        assist.tick();
        let track = assist.tracker().get(blobtrack::TrackId(1)).unwrap();
        assert_eq!(track.position(), blobtrack::Point::new(100.0, 80.0));
    }

    #[test]
    fn test_frame_size_mismatch_is_counted() {
        let frames = vec![frame_with_discs(&[]); 2];
        let clock = ManualClock::new();
        let mut assist = loop_with(
            &AssistConfig::default(),
            frames.clone(),
            RecordingActuator::new(),
            &clock,
        );
        assist.set_active(true);
        assist.run_ticks(2);
        assert_eq!(assist.stats().frames_mismatched, 2);

        let mut config = AssistConfig::default();
        config.capture.width = 200;
        config.capture.height = 160;
        let mut assist = loop_with(&config, frames, RecordingActuator::new(), &clock);
        assist.set_active(true);
        assist.run_ticks(2);
        assert_eq!(assist.stats().frames, 2);
        assert_eq!(assist.stats().frames_mismatched, 0);
    }
}
