//! Decision-forest model artifact.
//!
//! The artifact is a JSON file produced offline by the training pipeline. Each
//! tree is a flat array of nodes indexed by position; internal nodes carry a
//! feature index and threshold, leaves carry the predicted value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForestError {
    #[error("model artifact is invalid: {0}")]
    InvalidModel(String),
    #[error("feature vector has {got} values, model expects {expected}")]
    FeatureWidth { expected: usize, got: usize },
    #[error("tree walk at node {node} references feature {feature} out of bounds")]
    FeatureOutOfBounds { node: usize, feature: usize },
    #[error("tree walk at node {node} left the node table")]
    NodeOutOfBounds { node: usize },
    #[error("tree walk exceeded {limit} steps, node table contains a cycle")]
    CycleDetected { limit: usize },
}

/// One node in a flattened decision tree.
///
/// `feature: None` marks a leaf; internal nodes route to `left` when the
/// feature value is `<= threshold`, otherwise to `right`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub feature: Option<usize>,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: usize,
    #[serde(default)]
    pub right: usize,
    #[serde(default)]
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk the tree from the root for one feature vector.
    ///
    /// Bounds and step count are checked on every hop so a malformed artifact
    /// fails loudly instead of looping or panicking.
    pub fn decide(&self, features: &[f64]) -> Result<f64, ForestError> {
        if self.nodes.is_empty() {
            return Err(ForestError::InvalidModel("tree has no nodes".to_string()));
        }

        let limit = self.nodes.len() + 1;
        let mut index = 0;
        for _ in 0..limit {
            let node = self.nodes.get(index).ok_or(ForestError::NodeOutOfBounds { node: index })?;

            let Some(feature) = node.feature else {
                return Ok(node.value);
            };

            let value = *features.get(feature).ok_or(ForestError::FeatureOutOfBounds { node: index, feature })?;
            index = if value <= node.threshold { node.left } else { node.right };
        }

        Err(ForestError::CycleDetected { limit })
    }
}

/// A trained forest plus the feature schema its inputs must follow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    pub name: String,
    pub version: u32,
    pub feature_names: Vec<String>,
    pub trees: Vec<DecisionTree>,
}

impl ForestModel {
    /// Reject artifacts that could never produce a vote.
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.feature_names.is_empty() {
            return Err(ForestError::InvalidModel("feature_names is empty".to_string()));
        }
        if self.trees.is_empty() {
            return Err(ForestError::InvalidModel("model has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ForestError::InvalidModel(format!("tree {i} has no nodes")));
            }
        }
        Ok(())
    }

    /// Majority vote over all trees: each tree's output is thresholded at 0.5
    /// and the winning class (ties go to 0) is returned.
    pub fn vote(&self, features: &[f64]) -> Result<u8, ForestError> {
        if features.len() != self.feature_names.len() {
            return Err(ForestError::FeatureWidth {
                expected: self.feature_names.len(),
                got: features.len(),
            });
        }

        let mut positive = 0usize;
        for tree in &self.trees {
            if tree.decide(features)? >= 0.5 {
                positive += 1;
            }
        }

        Ok(if positive * 2 > self.trees.len() { 1 } else { 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(value: f64) -> TreeNode {
        TreeNode {
            feature: None,
            threshold: 0.0,
            left: 0,
            right: 0,
            value,
        }
    }

    fn split(feature: usize, threshold: f64, left: usize, right: usize) -> TreeNode {
        TreeNode {
            feature: Some(feature),
            threshold,
            left,
            right,
            value: 0.0,
        }
    }

    fn stump(feature: usize, threshold: f64) -> DecisionTree {
        DecisionTree {
            nodes: vec![split(feature, threshold, 1, 2), leaf(0.0), leaf(1.0)],
        }
    }

    #[test]
    fn test_decide_routes_on_threshold() {
        let tree = stump(0, 10.0);

        // <= goes left
        assert_eq!(tree.decide(&[10.0]).unwrap(), 0.0);
        assert_eq!(tree.decide(&[10.5]).unwrap(), 1.0);
    }

    #[test]
    fn test_decide_rejects_out_of_bounds_feature() {
        let tree = stump(3, 1.0);
        assert!(matches!(
            tree.decide(&[1.0]).unwrap_err(),
            ForestError::FeatureOutOfBounds { feature: 3, .. }
        ));
    }

    #[test]
    fn test_decide_detects_cycles() {
        // Node 0 routes to itself both ways
        let tree = DecisionTree {
            nodes: vec![split(0, 1.0, 0, 0)],
        };
        assert!(matches!(tree.decide(&[5.0]).unwrap_err(), ForestError::CycleDetected { .. }));
    }

    #[test]
    fn test_vote_is_majority() {
        let model = ForestModel {
            name: "test".to_string(),
            version: 1,
            feature_names: vec!["x".to_string()],
            trees: vec![stump(0, 10.0), stump(0, 20.0), stump(0, 30.0)],
        };

        // x=25 clears two of the three thresholds
        assert_eq!(model.vote(&[25.0]).unwrap(), 1);
        // x=15 clears one
        assert_eq!(model.vote(&[15.0]).unwrap(), 0);
    }

    #[test]
    fn test_vote_checks_feature_width() {
        let model = ForestModel {
            name: "test".to_string(),
            version: 1,
            feature_names: vec!["x".to_string(), "y".to_string()],
            trees: vec![stump(0, 1.0)],
        };

        assert!(matches!(
            model.vote(&[1.0]).unwrap_err(),
            ForestError::FeatureWidth { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn test_validate_rejects_empty_artifacts() {
        let model = ForestModel {
            name: "test".to_string(),
            version: 1,
            feature_names: vec![],
            trees: vec![stump(0, 1.0)],
        };
        assert!(model.validate().is_err());

        let model = ForestModel {
            name: "test".to_string(),
            version: 1,
            feature_names: vec!["x".to_string()],
            trees: vec![],
        };
        assert!(model.validate().is_err());
    }
}
