//! Random Forest classifier structures for inference
//!
//! Trees are stored as flat node vectors (node 0 is the root). Leaves hold
//! the class distribution of the training samples that reached them; the
//! forest averages those distributions.

use crate::errors::{AiCoreError, Result};
use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature_idx >= 0`: index into the (scaled) feature vector
/// - `left` and `right` point to child node indices
/// - `distribution` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`
/// - `distribution` holds one probability per class
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    pub feature_idx: i32,

    /// Samples with `feature <= threshold` go left
    pub threshold: f64,

    /// Training samples (bootstrap duplicates included) that reached the node
    pub samples: usize,

    /// Gini impurity of those samples
    pub impurity: f64,

    /// Class probabilities (Some for leaf nodes)
    pub distribution: Option<Vec<f64>>,
}

impl Node {
    /// Create an internal (split) node; children are linked after they are built
    pub fn internal(feature_idx: usize, threshold: f64, samples: usize, impurity: f64) -> Self {
        Self {
            left: -1,
            right: -1,
            feature_idx: feature_idx as i32,
            threshold,
            samples,
            impurity,
            distribution: None,
        }
    }

    /// Create a leaf node
    pub fn leaf(distribution: Vec<f64>, samples: usize, impurity: f64) -> Self {
        Self {
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            samples,
            impurity,
            distribution: Some(distribution),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx < 0 || self.distribution.is_some()
    }
}

/// A single classification tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Class distribution of the leaf reached by `features`
    ///
    /// Returns `None` when the tree structure is invalid for this input.
    pub fn predict_proba(&self, features: &[f64]) -> Option<&[f64]> {
        let mut idx = 0usize;

        loop {
            let node = self.nodes.get(idx)?;

            if node.is_leaf() {
                return node.distribution.as_deref();
            }

            let value = *features.get(node.feature_idx as usize)?;
            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };

            if next < 0 {
                return None;
            }
            idx = next as usize;
        }
    }

    /// Maximum root-to-leaf depth (a single leaf has depth 0)
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(node) if !node.is_leaf() => {
                    1 + walk(nodes, node.left as usize).max(walk(nodes, node.right as usize))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Add each split's weighted impurity decrease to `importances`
    pub fn accumulate_importance(&self, importances: &mut [f64]) {
        for node in self.nodes.iter().filter(|n| !n.is_leaf()) {
            let (Some(left), Some(right)) = (
                self.nodes.get(node.left as usize),
                self.nodes.get(node.right as usize),
            ) else {
                continue;
            };
            let decrease = node.samples as f64 * node.impurity
                - left.samples as f64 * left.impurity
                - right.samples as f64 * right.impurity;
            if let Some(slot) = importances.get_mut(node.feature_idx as usize) {
                *slot += decrease.max(0.0);
            }
        }
    }

    /// Check child links, feature indices and leaf widths
    pub fn validate(&self, n_classes: usize, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        let len = self.nodes.len() as i32;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match &node.distribution {
                    Some(dist) if dist.len() == n_classes => {}
                    _ => return Err(format!("leaf {} has a malformed distribution", i)),
                }
            } else {
                if node.feature_idx as usize >= n_features {
                    return Err(format!("node {} splits on unknown feature", i));
                }
                // Children are always appended after their parent
                let child_ok = |c: i32| c > i as i32 && c < len;
                if !child_ok(node.left) || !child_ok(node.right) {
                    return Err(format!("node {} has invalid children", i));
                }
            }
        }
        Ok(())
    }
}

/// Ensemble of classification trees
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForest {
    pub n_classes: usize,
    pub n_features: usize,
    pub trees: Vec<Tree>,
}

impl RandomForest {
    pub fn new(trees: Vec<Tree>, n_classes: usize, n_features: usize) -> Self {
        Self {
            n_classes,
            n_features,
            trees,
        }
    }

    /// Mean of the per-tree leaf distributions
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        let mut voters = 0usize;

        for tree in &self.trees {
            if let Some(dist) = tree.predict_proba(features) {
                for (acc, p) in proba.iter_mut().zip(dist) {
                    *acc += p;
                }
                voters += 1;
            }
        }

        if voters > 0 {
            for p in &mut proba {
                *p /= voters as f64;
            }
        }
        proba
    }

    /// Index of the most probable class
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(&self.predict_proba(features))
    }

    /// Mean decrease in impurity per feature, normalized to sum 1
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];

        for tree in &self.trees {
            let mut per_tree = vec![0.0; self.n_features];
            tree.accumulate_importance(&mut per_tree);
            let sum: f64 = per_tree.iter().sum();
            if sum > 0.0 {
                for (acc, v) in total.iter_mut().zip(per_tree) {
                    *acc += v / sum;
                }
            }
        }

        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for v in &mut total {
                *v /= sum;
            }
        }
        total
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_classes == 0 {
            return Err(AiCoreError::InvalidParameters(
                "forest has no classes".to_string(),
            ));
        }
        if self.trees.is_empty() {
            return Err(AiCoreError::InvalidParameters(
                "forest has no trees".to_string(),
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_classes, self.n_features).map_err(|e| {
                AiCoreError::InvalidParameters(format!("Tree {} validation failed: {}", i, e))
            })?;
        }
        Ok(())
    }
}

/// Index of the largest value; ties resolve to the lowest index
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// feature 0 <= 0.5 -> class 0, otherwise class 1
    fn stump() -> Tree {
        let mut root = Node::internal(0, 0.5, 4, 0.5);
        root.left = 1;
        root.right = 2;
        Tree::new(vec![
            root,
            Node::leaf(vec![1.0, 0.0], 2, 0.0),
            Node::leaf(vec![0.0, 1.0], 2, 0.0),
        ])
    }

    #[test]
    fn tree_routes_by_threshold() {
        let tree = stump();
        assert_eq!(tree.predict_proba(&[0.5]), Some(&[1.0, 0.0][..]));
        assert_eq!(tree.predict_proba(&[0.6]), Some(&[0.0, 1.0][..]));
        assert_eq!(tree.predict_proba(&[]), None);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_count(), 2);
        assert!(tree.validate(2, 1).is_ok());
        assert!(tree.validate(3, 1).is_err());
    }

    #[test]
    fn forest_averages_tree_distributions() {
        let leaf_only = Tree::new(vec![Node::leaf(vec![0.0, 1.0], 4, 0.0)]);
        let forest = RandomForest::new(vec![stump(), leaf_only], 2, 1);
        assert_eq!(forest.predict_proba(&[0.0]), vec![0.5, 0.5]);
        // Tie resolves to the lower class index
        assert_eq!(forest.predict(&[0.0]), 0);
        assert_eq!(forest.predict(&[1.0]), 1);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn importances_sum_to_one() {
        let forest = RandomForest::new(vec![stump()], 2, 3);
        let importances = forest.feature_importances();
        assert_eq!(importances, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn invalid_child_links_fail_validation() {
        let mut tree = stump();
        tree.nodes[0].right = 7;
        let forest = RandomForest::new(vec![tree], 2, 1);
        assert!(matches!(
            forest.validate(),
            Err(AiCoreError::InvalidParameters(_))
        ));
    }
}
