//! CART (Classification and Regression Tree) builder
//!
//! Deterministic exact-greedy regression trees over fixed-point features.
//! Splits maximise variance reduction; leaves hold the mean target.

use cropyield_core::{Node, Tree};

use crate::deterministic::SplitTieBreaker;

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub min_samples_split: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            min_samples_leaf: 1,
            min_samples_split: 2,
        }
    }
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: i64,
    gain: i128,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, threshold: i64, gain: i128) -> Self {
        Self {
            feature_idx,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
        }
    }

    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain
            || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

/// Build a regression tree using exact-greedy CART algorithm
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<i64>],
    targets: &'a [i64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(features: &'a [Vec<i64>], targets: &'a [i64], config: TreeConfig) -> Self {
        debug_assert_eq!(features.len(), targets.len());

        let feature_count = features.first().map(Vec::len).unwrap_or(0);

        Self {
            config,
            features,
            targets,
            feature_count,
        }
    }

    /// Build a tree over the given sample indices (duplicates allowed)
    pub fn build(&self, samples: &[usize]) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(samples, 0, &mut nodes);
        Tree { nodes }
    }

    /// Build a tree over every row
    pub fn build_all(&self) -> Tree {
        let samples: Vec<usize> = (0..self.targets.len()).collect();
        self.build(&samples)
    }

    /// Recursively build tree nodes, returning the index of the subtree root
    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>) -> u32 {
        let current_idx = nodes.len() as u32;
        let leaf_value = self.leaf_value(indices);

        // Check stopping conditions
        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split.max(2)
            || indices.len() < 2 * self.config.min_samples_leaf
        {
            nodes.push(Node::leaf(leaf_value));
            return current_idx;
        }

        let split = match self.find_best_split(indices) {
            Some(s) if s.gain > 0 => s,
            // No split improves the node
            _ => {
                nodes.push(Node::leaf(leaf_value));
                return current_idx;
            }
        };

        let (left_indices, right_indices) =
            self.split_samples(indices, split.feature_idx, split.threshold);

        // Reserve space for current node
        nodes.push(Node {
            feature_index: split.feature_idx as u16,
            threshold: split.threshold,
            left: 0,
            right: 0,
            value: None,
        });

        let left_idx = self.build_node(&left_indices, depth + 1, nodes);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes);

        nodes[current_idx as usize].left = left_idx;
        nodes[current_idx as usize].right = right_idx;

        current_idx
    }

    /// Sweep each feature in sorted order and keep the best boundary.
    ///
    /// Gain = S_left²/n_left + S_right²/n_right - S²/n, the variance
    /// reduction scaled by n.
    fn find_best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let n = indices.len();
        let total: i128 = indices.iter().map(|&i| self.targets[i] as i128).sum();
        let parent_score = total * total / n as i128;

        let mut best: Option<SplitCandidate> = None;
        let mut order = indices.to_vec();

        for feature_idx in 0..self.feature_count {
            order.sort_by_key(|&i| self.features[i][feature_idx]);

            let mut left_sum: i128 = 0;
            for pos in 0..n - 1 {
                let idx = order[pos];
                left_sum += self.targets[idx] as i128;

                let value = self.features[idx][feature_idx];
                if value == self.features[order[pos + 1]][feature_idx] {
                    continue;
                }

                let left_count = pos + 1;
                let right_count = n - left_count;
                if left_count < self.config.min_samples_leaf
                    || right_count < self.config.min_samples_leaf
                {
                    continue;
                }

                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / left_count as i128
                    + right_sum * right_sum / right_count as i128
                    - parent_score;

                let candidate = SplitCandidate::new(feature_idx, value, gain);
                if best.as_ref().map_or(true, |current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Split samples based on threshold
    fn split_samples(
        &self,
        indices: &[usize],
        feature_idx: usize,
        threshold: i64,
    ) -> (Vec<usize>, Vec<usize>) {
        indices
            .iter()
            .partition(|&&idx| self.features[idx][feature_idx] <= threshold)
    }

    /// Mean target, rounded half up
    fn leaf_value(&self, indices: &[usize]) -> i64 {
        if indices.is_empty() {
            return 0;
        }

        let sum: i128 = indices.iter().map(|&i| self.targets[i] as i128).sum();
        let n = indices.len() as i128;
        (2 * sum + n).div_euclid(2 * n) as i64
    }
}
