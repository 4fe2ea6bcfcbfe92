//! Persistent target identity and its shot/ghost lifecycle

use crate::point::Point;
use std::fmt;
use std::time::{Duration, Instant};

/// Track identifier, unique within one tracker instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Visible and engageable
    #[default]
    Active,
    /// Engaged; suppressed from selection until the ghost window elapses
    Shot,
}

/// A single tracked target
#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    position: Point,
    area: f32,
    last_seen: Instant,
    state: TrackState,
    shot_time: Option<Instant>,
}

impl Track {
    pub(crate) fn new(id: TrackId, position: Point, area: f32, now: Instant) -> Self {
        Self {
            id,
            position,
            area,
            last_seen: now,
            state: TrackState::Active,
            shot_time: None,
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn shot_time(&self) -> Option<Instant> {
        self.shot_time
    }

    /// Time since the last matched observation
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }

    pub(crate) fn observe(&mut self, position: Point, area: f32, now: Instant) {
        self.position = position;
        self.area = area;
        self.last_seen = now;
    }

    pub(crate) fn mark_shot(&mut self, now: Instant) {
        self.state = TrackState::Shot;
        self.shot_time = Some(now);
    }

    pub(crate) fn shift(&mut self, dx: f32, dy: f32) {
        self.position = self.position.translated(dx, dy);
    }

    /// Evaluate ghost status at `now`.
    ///
    /// A shot track is a ghost while `now - shot_time < ghost_timeout`. Once
    /// the window has elapsed the track reverts to [`TrackState::Active`]:
    /// the blob is still there, so it is a legitimate target again.
    pub(crate) fn resolve_ghost(&mut self, now: Instant, ghost_timeout: Duration) -> bool {
        if self.state != TrackState::Shot {
            return false;
        }
        let shot_time = self.shot_time.unwrap_or(now);
        if now.saturating_duration_since(shot_time) < ghost_timeout {
            true
        } else {
            self.state = TrackState::Active;
            false
        }
    }
}
