//! Random forest classifier artifact

use crate::error::{DataShapeError, PredictionError, Stage};
use crate::models::artifact::{ArtifactKind, ArtifactPayload};
use crate::models::inference::ProbabilisticClassifier;
use serde::{Deserialize, Serialize};

fn default_positive_class() -> String {
    "fraud".to_string()
}

/// A node in a decision tree (either a split or a leaf)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Samples with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    /// Per-class sample weights that reached this leaf
    Leaf { value: Vec<f64> },
}

impl TreeNode {
    /// Walk the tree and return the class weights of the reached leaf
    fn leaf_for(&self, x: &[f64]) -> &[f64] {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    /// Depth of the tree rooted at this node (leaves have depth 0)
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        match self {
            TreeNode::Leaf { value } => {
                if value.len() != n_classes {
                    return Err(format!(
                        "leaf has {} class weights, expected {n_classes}",
                        value.len()
                    ));
                }
                if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err("leaf weights must be finite and non-negative".to_string());
                }
                if value.iter().sum::<f64>() <= 0.0 {
                    return Err("leaf weights sum to zero".to_string());
                }
                Ok(())
            }
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= n_features {
                    return Err(format!(
                        "split on feature {feature}, model has {n_features}"
                    ));
                }
                if !threshold.is_finite() {
                    return Err(format!("split on feature {feature} has a non-finite threshold"));
                }
                left.validate(n_features, n_classes)?;
                right.validate(n_features, n_classes)
            }
        }
    }
}

/// Bagged decision trees producing a positive-class probability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    n_features: usize,
    classes: Vec<String>,
    #[serde(default = "default_positive_class")]
    positive_class: String,
    trees: Vec<TreeNode>,
}

impl RandomForestClassifier {
    pub fn new(n_features: usize, classes: Vec<String>, trees: Vec<TreeNode>) -> Self {
        Self {
            n_features,
            classes,
            positive_class: default_positive_class(),
            trees,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    fn positive_index(&self) -> Option<usize> {
        self.classes.iter().position(|c| *c == self.positive_class)
    }

    /// Class probabilities for one sample: mean of normalized leaf weights
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, PredictionError> {
        self.check_width(x)?;

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf_for(x);
            let total: f64 = leaf.iter().sum();
            for (p, w) in proba.iter_mut().zip(leaf) {
                *p += w / total;
            }
        }

        let n_trees = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        Ok(proba)
    }

    fn check_width(&self, x: &[f64]) -> Result<(), DataShapeError> {
        if x.len() != self.n_features {
            return Err(DataShapeError::WidthMismatch {
                stage: Stage::Classifier,
                expected: self.n_features,
                actual: x.len(),
            });
        }
        if let Some(index) = x.iter().position(|v| !v.is_finite()) {
            return Err(DataShapeError::NonFinite {
                stage: Stage::Classifier,
                index,
            });
        }
        Ok(())
    }
}

impl ArtifactPayload for RandomForestClassifier {
    const KIND: ArtifactKind = ArtifactKind::RandomForestClassifier;

    fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("n_features must be positive".to_string());
        }
        if self.classes.len() < 2 {
            return Err("at least two classes are required".to_string());
        }
        if self.positive_index().is_none() {
            return Err(format!(
                "positive class '{}' is not one of {:?}",
                self.positive_class, self.classes
            ));
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}

impl ProbabilisticClassifier for RandomForestClassifier {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn input_width(&self) -> usize {
        self.n_features
    }

    fn classify(&self, features: &[f64]) -> Result<f64, PredictionError> {
        let proba = self.predict_proba(features)?;
        let index = self
            .positive_index()
            .ok_or_else(|| PredictionError::Runtime("positive class missing".to_string()))?;
        Ok(proba[index].clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(legit: f64, fraud: f64) -> Box<TreeNode> {
        Box::new(TreeNode::Leaf {
            value: vec![legit, fraud],
        })
    }

    fn stump(feature: usize, threshold: f64, left: Box<TreeNode>, right: Box<TreeNode>) -> TreeNode {
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        }
    }

    fn forest() -> RandomForestClassifier {
        RandomForestClassifier::new(
            2,
            vec!["legit".to_string(), "fraud".to_string()],
            vec![
                stump(0, 10.0, leaf(9.0, 1.0), leaf(2.0, 8.0)),
                stump(1, 0.5, leaf(4.0, 0.0), leaf(1.0, 3.0)),
            ],
        )
    }

    #[test]
    fn test_probability_is_mean_of_leaves() {
        let rf = forest();
        // tree 0 -> 0.1, tree 1 -> 0.0
        assert!((rf.classify(&[5.0, 0.0]).unwrap() - 0.05).abs() < 1e-12);
        // tree 0 -> 0.8, tree 1 -> 0.75
        assert!((rf.classify(&[50.0, 1.0]).unwrap() - 0.775).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_goes_left() {
        let rf = forest();
        let at = rf.predict_proba(&[10.0, 0.5]).unwrap();
        // both trees take the left branch
        assert!((at[1] - 0.05).abs() < 1e-12);
        assert!((at.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_width_mismatch() {
        let err = forest().classify(&[1.0]).unwrap_err();
        assert_eq!(
            err,
            PredictionError::DataShape(DataShapeError::WidthMismatch {
                stage: Stage::Classifier,
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_validate_catches_bad_trees() {
        assert!(forest().validate().is_ok());
        assert_eq!(forest().max_depth(), 1);

        let out_of_range = RandomForestClassifier::new(
            2,
            vec!["legit".to_string(), "fraud".to_string()],
            vec![stump(5, 1.0, leaf(1.0, 1.0), leaf(1.0, 1.0))],
        );
        assert!(out_of_range.validate().unwrap_err().contains("tree 0"));

        let empty_leaf = RandomForestClassifier::new(
            2,
            vec!["legit".to_string(), "fraud".to_string()],
            vec![TreeNode::Leaf {
                value: vec![0.0, 0.0],
            }],
        );
        assert!(empty_leaf.validate().is_err());

        let no_fraud_class = RandomForestClassifier::new(
            2,
            vec!["a".to_string(), "b".to_string()],
            vec![TreeNode::Leaf {
                value: vec![1.0, 1.0],
            }],
        );
        assert!(no_fraud_class.validate().is_err());
    }

    #[test]
    fn test_tree_json_shape() {
        let json = r#"{
            "type": "split", "feature": 0, "threshold": 1.5,
            "left": { "type": "leaf", "value": [3.0, 1.0] },
            "right": { "type": "leaf", "value": [0.0, 2.0] }
        }"#;
        let tree: TreeNode = serde_json::from_str(json).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_for(&[2.0]), &[0.0, 2.0]);
    }
}
