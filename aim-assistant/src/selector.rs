//! Next-target selection under a bounded path heuristic
//!
//! With several engageable targets, the selector asks which one should be
//! engaged first to keep total travel short when visiting the near set. The
//! near set is capped (4 by default) so the exhaustive permutation search is
//! at most 4! = 24 paths. Only the first hop of the best path is returned;
//! the loop re-detects before every engagement.

use blobtrack::{Point, TrackedTarget};
use itertools::Itertools;

/// Default number of nearest candidates considered for path planning
pub const DEFAULT_LOOKAHEAD: usize = 4;

/// Selector tuning parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorConfig {
    /// Cap on candidates evaluated by the permutation search
    pub max_lookahead: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

/// Total Euclidean length of the path `origin -> stops[0] -> stops[1] -> ...`
pub fn path_length<'a>(
    origin: Point,
    stops: impl IntoIterator<Item = &'a TrackedTarget>,
) -> f32 {
    let mut current = origin;
    let mut total = 0.0;
    for stop in stops {
        total += current.distance_to(&stop.position);
        current = stop.position;
    }
    total
}

/// Bounded-lookahead target selector
#[derive(Debug, Clone, Default)]
pub struct TargetSelector {
    config: SelectorConfig,
}

impl TargetSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// The candidates the permutation search will consider, nearest first.
    ///
    /// Sorting is stable, so equidistant candidates keep their input order.
    pub fn near_set<'a>(
        &self,
        origin: Point,
        candidates: &'a [TrackedTarget],
    ) -> Vec<&'a TrackedTarget> {
        let cap = self.config.max_lookahead.max(1);
        if candidates.len() <= cap {
            return candidates.iter().collect();
        }
        let mut sorted: Vec<&TrackedTarget> = candidates.iter().collect();
        sorted.sort_by(|a, b| {
            origin
                .squared_distance_to(&a.position)
                .partial_cmp(&origin.squared_distance_to(&b.position))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted.truncate(cap);
        sorted
    }

    /// Pick the first hop of the shortest path through the near set
    ///
    /// Ties keep the first permutation reaching the minimum.
    pub fn select<'a>(
        &self,
        origin: Point,
        candidates: &'a [TrackedTarget],
    ) -> Option<&'a TrackedTarget> {
        match candidates.len() {
            0 => return None,
            1 => return candidates.first(),
            _ => {}
        }

        let subset = self.near_set(origin, candidates);
        let k = subset.len();

        let mut best: Option<(f32, &'a TrackedTarget)> = None;
        for perm in subset.iter().copied().permutations(k) {
            let total = path_length(origin, perm.iter().copied());
            if best.map_or(true, |(min, _)| total < min) {
                best = Some((total, perm[0]));
            }
        }

        if let Some((total, target)) = best {
            log::debug!(
                "Selected track {} at {} (planned path {:.1} over {} of {} candidates)",
                target.track_id,
                target.position,
                total,
                k,
                candidates.len()
            );
        }
        best.map(|(_, target)| target)
    }
}
