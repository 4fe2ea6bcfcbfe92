//! Centroid tracking for small sets of blob targets
//!
//! This crate associates per-frame blob observations into persistent track
//! identities using greedy nearest-neighbor matching, and keeps a shot/ghost
//! lifecycle so that a target which was just engaged is not selected again
//! while it is still visible.
//!
//! ```rust,ignore
//! use blobtrack::{GhostTracker, Observation, TrackerConfig};
//!
//! let mut tracker = GhostTracker::new(TrackerConfig::default());
//! let results = tracker.update(&[Observation::new(120.0, 80.0, 450.0)]);
//! let targets = GhostTracker::engageable(&results);
//! tracker.mark_shot(targets[0].track_id);
//! ```

pub mod assignment;
pub mod point;
pub mod track;
pub mod tracker;

pub use assignment::{AssignmentResult, GreedyAssigner};
pub use point::{Observation, Point};
pub use track::{Track, TrackId, TrackState};
pub use tracker::{GhostTracker, TrackedTarget, TrackerConfig};
