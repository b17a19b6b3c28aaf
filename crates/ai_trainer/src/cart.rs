//! CART (Classification and Regression Tree) builder
//!
//! Grows one Gini classification tree on a (bootstrap) sample of rows.
//! Candidate thresholds are midpoints between consecutive distinct values
//! of a feature; the feature visiting order comes from the seeded RNG.

use moodcheck_ai_core::forest::{Node, Tree};

use crate::deterministic::LcgRng;

/// Growth limits for a single tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Non-constant features examined per split before settling
    pub max_features: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 5,
            max_features: 1,
        }
    }
}

/// Split candidate
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    /// Sample-weighted Gini impurity of the two children
    impurity: f64,
}

/// Gini impurity of a class-count vector
pub fn gini_impurity(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Build a classification tree over scaled feature rows
pub struct CartBuilder<'a> {
    features: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    feature_count: usize,
    config: TreeConfig,
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        features: &'a [Vec<f64>],
        labels: &'a [usize],
        n_classes: usize,
        config: TreeConfig,
    ) -> Self {
        let feature_count = features.first().map(Vec::len).unwrap_or(0);
        Self {
            features,
            labels,
            n_classes,
            feature_count,
            config,
        }
    }

    /// Grow a tree on `indices` (duplicates allowed)
    pub fn build(&self, indices: &[usize], rng: &mut LcgRng) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(indices, 0, &mut nodes, rng);
        Tree::new(nodes)
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &idx in indices {
            counts[self.labels[idx]] += 1;
        }
        counts
    }

    /// Recursively build tree nodes, returning the index of the new node
    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        rng: &mut LcgRng,
    ) -> usize {
        let current_idx = nodes.len();
        let counts = self.class_counts(indices);
        let impurity = gini_impurity(&counts);

        let make_leaf = |nodes: &mut Vec<Node>| {
            let total = indices.len().max(1) as f64;
            let distribution = counts.iter().map(|&c| c as f64 / total).collect();
            nodes.push(Node::leaf(distribution, indices.len(), impurity));
            current_idx
        };

        // Check stopping conditions
        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || impurity == 0.0
        {
            return make_leaf(nodes);
        }

        let split = match self.find_best_split(indices, rng) {
            Some(s) => s,
            None => return make_leaf(nodes),
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&idx| self.features[idx][split.feature_idx] <= split.threshold);

        if left_indices.is_empty() || right_indices.is_empty() {
            return make_leaf(nodes);
        }

        // Reserve space for current node
        nodes.push(Node::internal(
            split.feature_idx,
            split.threshold,
            indices.len(),
            impurity,
        ));

        let left_idx = self.build_node(&left_indices, depth + 1, nodes, rng);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes, rng);

        nodes[current_idx].left = left_idx as i32;
        nodes[current_idx].right = right_idx as i32;

        current_idx
    }

    /// Best Gini split over a random feature subset
    ///
    /// Features that are constant within the node do not count toward
    /// `max_features`, so the search continues until a usable feature
    /// is found or every feature has been tried.
    fn find_best_split(&self, indices: &[usize], rng: &mut LcgRng) -> Option<SplitCandidate> {
        let mut order: Vec<usize> = (0..self.feature_count).collect();
        rng.shuffle(&mut order);

        let mut best: Option<SplitCandidate> = None;
        let mut examined = 0usize;

        for feature_idx in order {
            if examined >= self.config.max_features && best.is_some() {
                break;
            }

            let mut column: Vec<(f64, usize)> = indices
                .iter()
                .map(|&idx| (self.features[idx][feature_idx], self.labels[idx]))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (first, last) = match (column.first(), column.last()) {
                (Some(f), Some(l)) => (f.0, l.0),
                _ => continue,
            };
            if first == last {
                continue;
            }
            examined += 1;

            if let Some(candidate) = self.best_threshold(feature_idx, &column) {
                if best.map_or(true, |b| candidate.impurity < b.impurity) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Sweep sorted `(value, label)` pairs and pick the best midpoint
    fn best_threshold(&self, feature_idx: usize, column: &[(f64, usize)]) -> Option<SplitCandidate> {
        let n = column.len();
        let mut right = vec![0usize; self.n_classes];
        for &(_, label) in column {
            right[label] += 1;
        }
        let mut left = vec![0usize; self.n_classes];
        let mut best: Option<SplitCandidate> = None;

        for i in 0..n - 1 {
            let (value, label) = column[i];
            left[label] += 1;
            right[label] -= 1;

            let next = column[i + 1].0;
            if next <= value {
                continue;
            }

            let n_left = (i + 1) as f64;
            let n_right = (n - i - 1) as f64;
            let impurity =
                (n_left * gini_impurity(&left) + n_right * gini_impurity(&right)) / n as f64;

            if best.map_or(true, |b| impurity < b.impurity) {
                let mut threshold = (value + next) / 2.0;
                // Midpoint can round up to `next` for adjacent floats
                if threshold >= next {
                    threshold = value;
                }
                best = Some(SplitCandidate {
                    feature_idx,
                    threshold,
                    impurity,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_depth: usize) -> TreeConfig {
        TreeConfig {
            max_depth,
            min_samples_split: 2,
            max_features: 2,
        }
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini_impurity(&[4, 0]), 0.0);
        assert_eq!(gini_impurity(&[2, 2]), 0.5);
        assert_eq!(gini_impurity(&[]), 0.0);
    }

    #[test]
    fn test_separable_split_uses_midpoint() {
        let features = vec![vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0], vec![4.0, 5.0]];
        let labels = vec![0, 0, 1, 1];
        let builder = CartBuilder::new(&features, &labels, 2, config(3));
        let tree = builder.build(&[0, 1, 2, 3], &mut LcgRng::new(1));

        assert_eq!(tree.nodes.len(), 3);
        assert_eq!(tree.nodes[0].feature_idx, 0);
        assert_eq!(tree.nodes[0].threshold, 2.5);
        assert_eq!(tree.predict_proba(&[1.5, 5.0]), Some(&[1.0, 0.0][..]));
        assert_eq!(tree.predict_proba(&[3.5, 5.0]), Some(&[0.0, 1.0][..]));
        assert!(tree.validate(2, 2).is_ok());
    }

    #[test]
    fn test_leaf_only_tree() {
        let features = vec![vec![1.0], vec![2.0]];
        let labels = vec![1, 1];
        let builder = CartBuilder::new(&features, &labels, 2, config(5));
        let tree = builder.build(&[0, 1], &mut LcgRng::new(1));

        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].distribution, Some(vec![0.0, 1.0]));
    }

    #[test]
    fn test_depth_limit_and_mixed_leaf() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let labels = vec![0, 1, 0, 1];
        let builder = CartBuilder::new(&features, &labels, 2, config(1));
        let tree = builder.build(&[0, 1, 2, 3], &mut LcgRng::new(3));

        assert!(tree.depth() <= 1);
        assert!(tree.validate(2, 1).is_ok());
    }

    #[test]
    fn test_constant_features_make_a_leaf() {
        let features = vec![vec![1.0], vec![1.0], vec![1.0]];
        let labels = vec![0, 1, 1];
        let builder = CartBuilder::new(&features, &labels, 2, config(4));
        let tree = builder.build(&[0, 1, 2], &mut LcgRng::new(3));

        assert_eq!(tree.nodes.len(), 1);
        let dist = tree.nodes[0].distribution.clone().unwrap();
        assert!((dist[1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_indices_weight_samples() {
        let features = vec![vec![0.0], vec![1.0]];
        let labels = vec![0, 1];
        let builder = CartBuilder::new(&features, &labels, 2, TreeConfig {
            max_depth: 0,
            ..config(0)
        });
        let tree = builder.build(&[0, 0, 0, 1], &mut LcgRng::new(0));
        assert_eq!(tree.nodes[0].distribution, Some(vec![0.75, 0.25]));
        assert_eq!(tree.nodes[0].samples, 4);
    }
}
