use gms_core::{hamming_distance, Descriptor, Match};
use rayon::prelude::*;

/// Exhaustive nearest-neighbor descriptor matcher under Hamming distance
pub struct BruteForceMatcher {
    cross_check: bool,
}

impl BruteForceMatcher {
    /// Create a matcher; with `cross_check` only mutual nearest neighbors
    /// are kept
    pub fn new(cross_check: bool) -> Self {
        Self { cross_check }
    }

    /// Match every query descriptor to its nearest train descriptor.
    ///
    /// Output is ordered by query index and is index-aligned with the
    /// keypoint sequences the descriptors came from. Either side being
    /// empty yields an empty match list.
    pub fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<Match> {
        if query.is_empty() || train.is_empty() {
            return Vec::new();
        }

        let forward: Vec<Match> = query
            .par_iter()
            .enumerate()
            .map(|(query_idx, q)| {
                let (train_idx, distance) = Self::nearest(q, train);
                Match { query_idx, train_idx, distance }
            })
            .collect();

        if !self.cross_check {
            return forward;
        }

        // Reverse pass: nearest query for every train descriptor
        let reverse: Vec<usize> = train
            .par_iter()
            .map(|t| Self::nearest(t, query).0)
            .collect();

        forward
            .into_iter()
            .filter(|m| reverse[m.train_idx] == m.query_idx)
            .collect()
    }

    /// Index and distance of the nearest descriptor in `set`
    fn nearest(d: &Descriptor, set: &[Descriptor]) -> (usize, u32) {
        let mut best_idx = 0;
        let mut best_dist = u32::MAX;
        for (i, candidate) in set.iter().enumerate() {
            let dist = hamming_distance(d, candidate);
            if dist < best_dist {
                best_idx = i;
                best_dist = dist;
            }
        }
        (best_idx, best_dist)
    }
}
