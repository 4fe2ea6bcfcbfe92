//! Greedy nearest-neighbor assignment of observations to tracks
//!
//! All (observation, track) pairs closer than the match distance are
//! collected, stable-sorted by distance and claimed closest-first. Each
//! observation and each track is claimed at most once. The result is not a
//! globally optimal bipartite matching; at a handful of targets per frame the
//! greedy answer is what the tracker wants.

use crate::point::Point;

/// Candidate pairing below the match distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePair {
    pub observation_idx: usize,
    pub track_idx: usize,
    pub distance: f32,
}

/// Result of greedy assignment
#[derive(Debug, Clone, Default)]
pub struct AssignmentResult {
    /// Committed pairs as (observation_idx, track_idx), in claim order
    pub assignments: Vec<(usize, usize)>,
    /// Indices of observations left without a track
    pub unassigned_observations: Vec<usize>,
    /// Indices of tracks left without an observation
    pub unassigned_tracks: Vec<usize>,
}

/// Greedy assignment solver over Euclidean distances
pub struct GreedyAssigner;

impl GreedyAssigner {
    /// Enumerate every pair with `distance < max_distance`.
    ///
    /// Pairs are produced observation-major, then in track order, which fixes
    /// the tie order for the stable sort in [`GreedyAssigner::solve`].
    pub fn candidate_pairs(
        observations: &[Point],
        tracks: &[Point],
        max_distance: f32,
    ) -> Vec<CandidatePair> {
        let mut candidates = Vec::new();
        for (observation_idx, obs) in observations.iter().enumerate() {
            for (track_idx, track) in tracks.iter().enumerate() {
                let distance = obs.distance_to(track);
                // NaN never compares below the threshold, so such pairs are dropped
                if distance < max_distance {
                    candidates.push(CandidatePair {
                        observation_idx,
                        track_idx,
                        distance,
                    });
                }
            }
        }
        candidates
    }

    /// Assign observations to tracks closest-pair-first
    pub fn solve(observations: &[Point], tracks: &[Point], max_distance: f32) -> AssignmentResult {
        let num_observations = observations.len();
        let num_tracks = tracks.len();

        if num_observations == 0 || num_tracks == 0 {
            return AssignmentResult {
                assignments: Vec::new(),
                unassigned_observations: (0..num_observations).collect(),
                unassigned_tracks: (0..num_tracks).collect(),
            };
        }

        let mut candidates = Self::candidate_pairs(observations, tracks, max_distance);
        candidates.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut assignments = Vec::new();
        let mut used_observations = vec![false; num_observations];
        let mut used_tracks = vec![false; num_tracks];

        for pair in candidates {
            if !used_observations[pair.observation_idx] && !used_tracks[pair.track_idx] {
                assignments.push((pair.observation_idx, pair.track_idx));
                used_observations[pair.observation_idx] = true;
                used_tracks[pair.track_idx] = true;
            }
        }

        let unassigned_observations = (0..num_observations)
            .filter(|&i| !used_observations[i])
            .collect();
        let unassigned_tracks = (0..num_tracks).filter(|&i| !used_tracks[i]).collect();

        AssignmentResult {
            assignments,
            unassigned_observations,
            unassigned_tracks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs() {
        let result = GreedyAssigner::solve(&[Point::new(0.0, 0.0)], &[], 100.0);
        assert!(result.assignments.is_empty());
        assert_eq!(result.unassigned_observations, vec![0]);
        assert!(result.unassigned_tracks.is_empty());

        let result = GreedyAssigner::solve(&[], &[Point::new(0.0, 0.0)], 100.0);
        assert!(result.assignments.is_empty());
        assert_eq!(result.unassigned_tracks, vec![0]);
    }

    #[test]
    fn test_closer_track_wins() {
        let observations = [Point::new(0.0, 0.0)];
        let tracks = [Point::new(50.0, 0.0), Point::new(10.0, 0.0)];

        let result = GreedyAssigner::solve(&observations, &tracks, 100.0);
        assert_eq!(result.assignments, vec![(0, 1)]);
        assert_eq!(result.unassigned_tracks, vec![0]);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let observations = [Point::new(0.0, 0.0)];
        let tracks = [Point::new(100.0, 0.0)];

        let result = GreedyAssigner::solve(&observations, &tracks, 100.0);
        assert!(result.assignments.is_empty());
        assert_eq!(result.unassigned_observations, vec![0]);
    }

    #[test]
    fn test_greedy_not_optimal() {
        // Matching both pairs (0->0, 1->1) would cost 10 + 11, but the
        // greedy pass claims the single closest pair (1->0, distance 1) first.
        let observations = [Point::new(0.0, 0.0), Point::new(11.0, 0.0)];
        let tracks = [Point::new(10.0, 0.0), Point::new(22.0, 0.0)];

        let result = GreedyAssigner::solve(&observations, &tracks, 15.0);
        assert_eq!(result.assignments, vec![(1, 0)]);
        assert_eq!(result.unassigned_observations, vec![0]);
        assert_eq!(result.unassigned_tracks, vec![1]);
    }

    #[test]
    fn test_nan_never_matches() {
        let observations = [Point::new(f32::NAN, 0.0)];
        let tracks = [Point::new(0.0, 0.0)];

        let result = GreedyAssigner::solve(&observations, &tracks, 100.0);
        assert!(result.assignments.is_empty());
    }
}
