//! Nearest-neighbor multi-target tracker with ghost suppression
//!
//! Keeps stable ids for blobs across frames. A target that was just engaged
//! is marked shot; while it is still visible inside the ghost window it is
//! reported as a ghost so the selector does not engage it twice. A shot
//! target that disappears is dropped immediately instead of waiting for the
//! staleness timeout.

use crate::assignment::GreedyAssigner;
use crate::point::{Observation, Point};
use crate::track::{Track, TrackId, TrackState};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Tracker tuning parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Maximum distance to associate an observation with an existing track
    pub max_match_distance: f32,
    /// Remove a track not seen for longer than this
    pub track_timeout: Duration,
    /// Suppress a shot track for this long
    pub ghost_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_match_distance: 100.0,
            track_timeout: Duration::from_millis(500),
            ghost_timeout: Duration::from_millis(100),
        }
    }
}

/// One row of tracker output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedTarget {
    pub track_id: TrackId,
    pub position: Point,
    pub area: f32,
    pub is_ghost: bool,
}

/// Greedy nearest-neighbor tracker owning every [`Track`]
///
/// All mutation goes through [`update_at`](Self::update_at),
/// [`mark_shot_at`](Self::mark_shot_at), [`shift`](Self::shift) and
/// [`reset`](Self::reset). Ids are allocated per instance, so independent
/// trackers never share an id space.
#[derive(Debug, Clone)]
pub struct GhostTracker {
    config: TrackerConfig,
    next_track_id: u32,
    tracks: BTreeMap<TrackId, Track>,
    n_updates: u64,
}

impl GhostTracker {
    pub fn new(config: TrackerConfig) -> Self {
        log::info!(
            "Creating GhostTracker: match distance {:.1}, track timeout {:?}, ghost timeout {:?}",
            config.max_match_distance,
            config.track_timeout,
            config.ghost_timeout
        );
        Self {
            config,
            next_track_id: 1,
            tracks: BTreeMap::new(),
            n_updates: 0,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Update with this frame's observations, stamped with the current time
    pub fn update(&mut self, observations: &[Observation]) -> Vec<TrackedTarget> {
        self.update_at(observations, Instant::now())
    }

    /// Update with this frame's observations, stamped with `now`
    ///
    /// Returns matched tracks first (in claim order, closest pair first),
    /// then one new non-ghost track per unmatched observation.
    pub fn update_at(&mut self, observations: &[Observation], now: Instant) -> Vec<TrackedTarget> {
        self.n_updates += 1;

        // Step 1: Drop tracks that have not been seen for too long
        self.remove_stale_tracks(now);

        // Step 2: Greedy association against surviving tracks
        let track_ids: Vec<TrackId> = self.tracks.keys().copied().collect();
        let track_points: Vec<Point> = self.tracks.values().map(Track::position).collect();
        let observation_points: Vec<Point> = observations.iter().map(|o| o.position).collect();

        let assignment = GreedyAssigner::solve(
            &observation_points,
            &track_points,
            self.config.max_match_distance,
        );

        let mut results = Vec::with_capacity(observations.len());

        // Step 3: Refresh matched tracks and evaluate ghost status
        for &(obs_idx, track_idx) in &assignment.assignments {
            let obs = &observations[obs_idx];
            let track_id = track_ids[track_idx];
            if let Some(track) = self.tracks.get_mut(&track_id) {
                track.observe(obs.position, obs.area, now);
                let is_ghost = track.resolve_ghost(now, self.config.ghost_timeout);
                results.push(TrackedTarget {
                    track_id,
                    position: obs.position,
                    area: obs.area,
                    is_ghost,
                });
            }
        }

        // Step 4: Every unmatched observation starts a new track
        for &obs_idx in &assignment.unassigned_observations {
            let obs = &observations[obs_idx];
            let track_id = self.allocate_id();
            self.tracks
                .insert(track_id, Track::new(track_id, obs.position, obs.area, now));
            results.push(TrackedTarget {
                track_id,
                position: obs.position,
                area: obs.area,
                is_ghost: false,
            });
        }

        // Step 5: A shot track that lost its blob was destroyed
        for &track_idx in &assignment.unassigned_tracks {
            let track_id = track_ids[track_idx];
            let destroyed = self
                .tracks
                .get(&track_id)
                .is_some_and(|t| t.state() == TrackState::Shot);
            if destroyed {
                log::debug!("Track {} disappeared after shot, removing", track_id);
                self.tracks.remove(&track_id);
            }
        }

        log::debug!(
            "Tracker update #{}: {} observations, {} matched, {} new, {} tracks alive",
            self.n_updates,
            observations.len(),
            assignment.assignments.len(),
            assignment.unassigned_observations.len(),
            self.tracks.len()
        );

        results
    }

    /// Keep only non-ghost results
    pub fn engageable(results: &[TrackedTarget]) -> Vec<TrackedTarget> {
        results.iter().filter(|t| !t.is_ghost).copied().collect()
    }

    /// Mark a track as just shot; unknown ids are ignored
    pub fn mark_shot(&mut self, track_id: TrackId) -> bool {
        self.mark_shot_at(track_id, Instant::now())
    }

    /// Mark a track as shot at `now`. Returns whether the id was known.
    pub fn mark_shot_at(&mut self, track_id: TrackId, now: Instant) -> bool {
        match self.tracks.get_mut(&track_id) {
            Some(track) => {
                track.mark_shot(now);
                true
            }
            None => {
                log::debug!("mark_shot for unknown track {}", track_id);
                false
            }
        }
    }

    /// Translate every stored track position by (dx, dy)
    pub fn shift(&mut self, dx: f32, dy: f32) {
        for track in self.tracks.values_mut() {
            track.shift(dx, dy);
        }
    }

    /// Clear all tracks and restart id allocation
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.next_track_id = 1;
        self.n_updates = 0;
    }

    pub fn get(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    fn remove_stale_tracks(&mut self, now: Instant) {
        let timeout = self.config.track_timeout;
        self.tracks.retain(|id, track| {
            let keep = track.age(now) <= timeout;
            if !keep {
                log::debug!("Track {} timed out", id);
            }
            keep
        });
    }

    fn allocate_id(&mut self) -> TrackId {
        let id = TrackId(self.next_track_id);
        self.next_track_id += 1;
        id
    }
}

impl Default for GhostTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}
