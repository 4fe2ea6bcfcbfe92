//! Open-loop engagement timing: move, wait, shoot, then stay blind
//!
//! One cycle takes a selected target and either skips it (cooldown), shoots
//! it in place (already within the instant-shoot distance), or moves onto it
//! and shoots. Large moves are split into equal interpolated sub-moves so the
//! receiving application does not drop or clamp a single huge jump. After a
//! shot the scheduler is blind for a short settle period before the next
//! detection is allowed.

use crate::clock::Clock;
use crate::devices::Actuator;
use blobtrack::{Point, TrackId, TrackedTarget};
use std::time::{Duration, Instant};

/// Scheduler timing and motion parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Capture pixels to pointer counts; calibrated per environment
    pub sensitivity: f32,
    /// Largest single pointer move before interpolation kicks in
    pub step_size: f32,
    /// Delay after each interpolated sub-move
    pub step_delay: Duration,
    /// Wait between the last move and the shot
    pub physics_settle: Duration,
    /// How long the primary button is held
    pub click_hold: Duration,
    /// Minimum time between shots
    pub shoot_cooldown: Duration,
    /// Targets closer than this are shot without moving
    pub instant_shoot_distance: f32,
    /// Post-shot pause before detection may run again
    pub blind_period: Duration,
    /// Consecutive failed cycles before the safety stop trips; 0 disables it
    pub max_consecutive_failures: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            step_size: 150.0,
            step_delay: Duration::from_millis(3),
            physics_settle: Duration::from_millis(15),
            click_hold: Duration::from_millis(15),
            shoot_cooldown: Duration::from_millis(50),
            instant_shoot_distance: 15.0,
            blind_period: Duration::from_millis(15),
            max_consecutive_failures: 0,
        }
    }
}

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementState {
    /// Waiting for the activation toggle
    Idle,
    /// Armed; a shot is allowed once the cooldown since the last shot has elapsed
    Cooldown,
    /// Issuing movement and the shot
    Engaging,
    /// Blind period after a shot
    Settling,
}

/// What one fired cycle did
#[derive(Debug, Clone, PartialEq)]
pub struct ShotReport {
    pub track_id: TrackId,
    /// Capture-space distance from the aim origin to the target
    pub distance: f32,
    /// Capture-space offset from the aim origin to the target
    pub offset: (f32, f32),
    /// Total pointer movement issued, after sensitivity scaling
    pub movement: (i32, i32),
    pub sub_moves: usize,
    /// Shot without moving
    pub instant: bool,
    pub fired_at: Instant,
    /// At least one actuator call failed during this cycle
    pub actuation_failed: bool,
}

/// Result of one scheduler cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Scheduler is idle
    Inactive,
    /// Still inside the post-shot blind period
    Settling { remaining: Duration },
    /// Shot cooldown not yet elapsed; nothing was issued
    CoolingDown { remaining: Duration },
    Fired(ShotReport),
}

/// Split a pointer move into sub-moves no longer than `step_size`.
///
/// A move longer than the cap becomes `ceil(magnitude / step_size)` equal
/// steps; rounding is carried across steps so they sum exactly to the
/// original move. A zero move yields no steps.
pub fn plan_moves(movement: (i32, i32), step_size: f32) -> Vec<(i32, i32)> {
    let (mx, my) = movement;
    if mx == 0 && my == 0 {
        return Vec::new();
    }
    let magnitude = ((mx as f64).powi(2) + (my as f64).powi(2)).sqrt();
    if step_size <= 0.0 || magnitude <= step_size as f64 {
        return vec![movement];
    }

    // Sub-pixel steps would only repeat zero moves
    let num_steps = (magnitude / step_size as f64).ceil().min(magnitude.ceil()) as i32;
    let mut steps = Vec::with_capacity(num_steps as usize);
    let (mut prev_x, mut prev_y) = (0, 0);
    for i in 1..=num_steps {
        let frac = i as f64 / num_steps as f64;
        let x = (mx as f64 * frac).round() as i32;
        let y = (my as f64 * frac).round() as i32;
        steps.push((x - prev_x, y - prev_y));
        prev_x = x;
        prev_y = y;
    }
    steps
}

/// Timing state machine converting a selected target into pointer commands
pub struct ActionScheduler<C: Clock> {
    config: SchedulerConfig,
    clock: C,
    state: EngagementState,
    last_shot: Option<Instant>,
    blind_until: Option<Instant>,
    shots_fired: u64,
    aim_offset: (i64, i64),
    consecutive_failures: u32,
}

impl<C: Clock> ActionScheduler<C> {
    pub fn new(config: SchedulerConfig, clock: C) -> Self {
        log::info!(
            "Creating ActionScheduler: sensitivity={:.3}, step_size={}, cooldown={:?}, blind={:?}",
            config.sensitivity,
            config.step_size,
            config.shoot_cooldown,
            config.blind_period
        );
        Self {
            config,
            clock,
            state: EngagementState::Idle,
            last_shot: None,
            blind_until: None,
            shots_fired: 0,
            aim_offset: (0, 0),
            consecutive_failures: 0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn state(&self) -> EngagementState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != EngagementState::Idle
    }

    /// Shots fired since the last activation
    pub fn shots_fired(&self) -> u64 {
        self.shots_fired
    }

    pub fn last_shot(&self) -> Option<Instant> {
        self.last_shot
    }

    /// Sum of all pointer movement issued since the last activation
    pub fn aim_offset(&self) -> (i64, i64) {
        self.aim_offset
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether consecutive actuation failures reached the configured limit
    pub fn safety_tripped(&self) -> bool {
        self.config.max_consecutive_failures > 0
            && self.consecutive_failures >= self.config.max_consecutive_failures
    }

    /// Leave `Idle` and start a new session
    pub fn activate(&mut self) {
        self.state = EngagementState::Cooldown;
        self.shots_fired = 0;
        self.aim_offset = (0, 0);
        self.consecutive_failures = 0;
    }

    /// Return to `Idle`; the cooldown clock keeps running
    pub fn deactivate(&mut self) {
        self.state = EngagementState::Idle;
        self.blind_until = None;
    }

    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        let last = self.last_shot?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < self.config.shoot_cooldown).then(|| self.config.shoot_cooldown - elapsed)
    }

    pub fn blind_remaining(&self, now: Instant) -> Option<Duration> {
        let until = self.blind_until?;
        (now < until).then(|| until - now)
    }

    /// Block until the blind period is over, then re-arm.
    ///
    /// Detection must not run before this returns, so a just-shot target is
    /// still ghost-suppressed when it is next observed.
    pub fn settle(&mut self) {
        if self.state != EngagementState::Settling {
            return;
        }
        if let Some(remaining) = self.blind_remaining(self.clock.now()) {
            self.clock.sleep(remaining);
        }
        self.blind_until = None;
        self.state = EngagementState::Cooldown;
    }

    /// Run one engagement cycle against `target`
    pub fn engage<A: Actuator + ?Sized>(
        &mut self,
        origin: Point,
        target: &TrackedTarget,
        actuator: &mut A,
    ) -> CycleOutcome {
        if self.state == EngagementState::Idle {
            return CycleOutcome::Inactive;
        }

        let now = self.clock.now();
        if self.state == EngagementState::Settling {
            if let Some(remaining) = self.blind_remaining(now) {
                return CycleOutcome::Settling { remaining };
            }
            self.blind_until = None;
            self.state = EngagementState::Cooldown;
        }

        if let Some(remaining) = self.cooldown_remaining(now) {
            self.state = EngagementState::Cooldown;
            return CycleOutcome::CoolingDown { remaining };
        }

        self.state = EngagementState::Engaging;
        let offset = target.position.offset_from(&origin);
        let distance = origin.distance_to(&target.position);
        let mut actuation_failed = false;

        let instant = distance < self.config.instant_shoot_distance;
        let (movement, sub_moves) = if instant {
            ((0, 0), 0)
        } else {
            let movement = (
                (offset.0 * self.config.sensitivity) as i32,
                (offset.1 * self.config.sensitivity) as i32,
            );
            let steps = plan_moves(movement, self.config.step_size);
            let interpolated = steps.len() > 1;
            for &(dx, dy) in &steps {
                if let Err(e) = actuator.move_relative(dx, dy) {
                    log::warn!("Pointer move ({}, {}) failed: {}", dx, dy, e);
                    actuation_failed = true;
                }
                self.aim_offset.0 += dx as i64;
                self.aim_offset.1 += dy as i64;
                if interpolated {
                    self.clock.sleep(self.config.step_delay);
                }
            }
            self.clock.sleep(self.config.physics_settle);
            (movement, steps.len())
        };

        if !self.fire(actuator) {
            actuation_failed = true;
        }

        let fired_at = self.clock.now();
        self.last_shot = Some(fired_at);
        self.blind_until = Some(fired_at + self.config.blind_period);
        self.shots_fired += 1;
        self.state = EngagementState::Settling;

        if actuation_failed {
            self.consecutive_failures += 1;
        } else {
            self.consecutive_failures = 0;
        }

        log::debug!(
            "Shot #{} at track {}: d={:.1}px move=({}, {}) in {} step(s){}",
            self.shots_fired,
            target.track_id,
            distance,
            movement.0,
            movement.1,
            sub_moves,
            if instant { " [instant]" } else { "" }
        );

        CycleOutcome::Fired(ShotReport {
            track_id: target.track_id,
            distance,
            offset,
            movement,
            sub_moves,
            instant,
            fired_at,
            actuation_failed,
        })
    }

    /// Press, hold, release. Returns false if any call failed.
    fn fire<A: Actuator + ?Sized>(&mut self, actuator: &mut A) -> bool {
        if let Err(e) = actuator.press_primary() {
            log::warn!("Primary press failed: {}", e);
            return false;
        }
        self.clock.sleep(self.config.click_hold);
        if let Err(e) = actuator.release_primary() {
            log::warn!("Primary release failed: {}", e);
            return false;
        }
        true
    }
}
