//! Fitted predictors
//!
//! Models only ever see a scaled row. Regressors return the single output of
//! one-row inference; classifiers return the raw class code, which the
//! predictor maps to a label.
//!
//! Supported families:
//! - Linear regression
//! - Random forest (regression: mean of trees; classification: mean of leaf
//!   class weights, then argmax)
//! - Gradient boosted trees (regression: `init + learning_rate * Σ trees`)
//! - Logistic regression (binary or multinomial)
//!
//! The model types can only be built from a validated artifact document.

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, InferenceError};
use crate::features::{ScaledVector, FEATURE_COUNT};
use crate::scaler::{check_feature_names, check_width};

/// Predicts a continuous value for one scaled row
pub trait Regressor: Send + Sync {
    fn n_features(&self) -> usize;

    fn predict(&self, row: &ScaledVector) -> Result<f64, InferenceError>;
}

/// Predicts a class code for one scaled row
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;

    fn predict(&self, row: &ScaledVector) -> Result<i64, InferenceError>;
}

fn check_row(row: &ScaledVector) -> Result<(), InferenceError> {
    if row.len() != FEATURE_COUNT {
        return Err(InferenceError::WidthMismatch {
            expected: FEATURE_COUNT,
            actual: row.len(),
        });
    }
    Ok(())
}

/// Index of the largest value; ties resolve to the first.
fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

// ============================================================================
// Decision trees
// ============================================================================

/// A node of a fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `row[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Output values: one for regression, one weight per class for classification
    Leaf { value: Vec<f64> },
}

/// Decision tree stored as a flat pre-order node list, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Check structure. Children must come after their parent, so every walk
    /// terminates.
    pub fn validate(&self, leaf_width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let count = self.nodes.len();
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!("node {} splits on feature {}", index, feature));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {} has a NaN threshold", index));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= count {
                            return Err(format!("node {} has invalid child {}", index, child));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != leaf_width {
                        return Err(format!(
                            "leaf {} has {} values, expected {}",
                            index,
                            value.len(),
                            leaf_width
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk to the leaf for `row`. Only called on trees that passed
    /// [`validate`](Self::validate), which the model types guarantee.
    fn leaf(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

fn validate_trees(artifact: &str, trees: &[DecisionTree], leaf_width: usize) -> Result<(), ArtifactError> {
    if trees.is_empty() {
        return Err(ArtifactError::invalid(artifact, "ensemble has no trees"));
    }
    for (i, tree) in trees.iter().enumerate() {
        tree.validate(leaf_width)
            .map_err(|message| ArtifactError::invalid(artifact, format!("tree {}: {}", i, message)))?;
    }
    Ok(())
}

// ============================================================================
// Regressors
// ============================================================================

/// Ordinary least squares / ridge style linear model
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegressor {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl Regressor for LinearRegressor {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, row: &ScaledVector) -> Result<f64, InferenceError> {
        check_row(row)?;
        let y = self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.as_slice())
                .map(|(c, x)| c * x)
                .sum::<f64>();
        finite("linear regressor", y)
    }
}

/// Random forest regressor: mean of the tree outputs
#[derive(Debug, Clone, PartialEq)]
pub struct ForestRegressor {
    trees: Vec<DecisionTree>,
}

impl Regressor for ForestRegressor {
    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn predict(&self, row: &ScaledVector) -> Result<f64, InferenceError> {
        check_row(row)?;
        if self.trees.is_empty() {
            return Err(InferenceError::Empty {
                model: "forest regressor".to_string(),
            });
        }
        let sum: f64 = self.trees.iter().map(|t| t.leaf(row.as_slice())[0]).sum();
        finite("forest regressor", sum / self.trees.len() as f64)
    }
}

/// Gradient boosted regressor
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoostedRegressor {
    init: f64,
    learning_rate: f64,
    trees: Vec<DecisionTree>,
}

impl Regressor for GradientBoostedRegressor {
    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn predict(&self, row: &ScaledVector) -> Result<f64, InferenceError> {
        check_row(row)?;
        let boost: f64 = self.trees.iter().map(|t| t.leaf(row.as_slice())[0]).sum();
        finite("gradient boosted regressor", self.init + self.learning_rate * boost)
    }
}

fn finite(model: &str, value: f64) -> Result<f64, InferenceError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InferenceError::NonFinite {
            model: model.to_string(),
        })
    }
}

// ============================================================================
// Classifiers
// ============================================================================

/// Logistic regression
///
/// With two classes and a single coefficient row, a positive decision value
/// selects `classes[1]`. Otherwise there is one row per class and the
/// highest decision value wins.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticClassifier {
    classes: Vec<i64>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

impl LogisticClassifier {
    fn validate(&self) -> Result<(), ArtifactError> {
        const NAME: &str = "logistic classifier";
        if self.classes.len() < 2 {
            return Err(ArtifactError::invalid(NAME, "needs at least two classes"));
        }
        let rows = self.coefficients.len();
        let binary = self.classes.len() == 2 && rows == 1;
        if !binary && rows != self.classes.len() {
            return Err(ArtifactError::invalid(
                NAME,
                format!("{} coefficient rows for {} classes", rows, self.classes.len()),
            ));
        }
        if self.intercepts.len() != rows {
            return Err(ArtifactError::invalid(
                NAME,
                format!("{} intercepts for {} coefficient rows", self.intercepts.len(), rows),
            ));
        }
        for row in &self.coefficients {
            check_width(NAME, row.len())?;
        }
        Ok(())
    }

    fn decision(&self, row: &[f64]) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(coef, b)| b + coef.iter().zip(row).map(|(c, x)| c * x).sum::<f64>())
            .collect()
    }
}

impl Classifier for LogisticClassifier {
    fn n_features(&self) -> usize {
        self.coefficients.first().map_or(0, Vec::len)
    }

    fn predict(&self, row: &ScaledVector) -> Result<i64, InferenceError> {
        check_row(row)?;
        let scores = self.decision(row.as_slice());
        if scores.iter().any(|s| s.is_nan()) {
            return Err(InferenceError::NonFinite {
                model: "logistic classifier".to_string(),
            });
        }
        let index = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            argmax(&scores).ok_or_else(|| InferenceError::Empty {
                model: "logistic classifier".to_string(),
            })?
        };
        Ok(self.classes[index])
    }
}

/// Random forest classifier
#[derive(Debug, Clone, PartialEq)]
pub struct ForestClassifier {
    classes: Vec<i64>,
    trees: Vec<DecisionTree>,
}

impl Classifier for ForestClassifier {
    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn predict(&self, row: &ScaledVector) -> Result<i64, InferenceError> {
        check_row(row)?;
        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf(row.as_slice());
            let weight: f64 = leaf.iter().sum();
            // Leaves hold class counts or fractions; normalize so every tree votes equally.
            let norm = if weight > 0.0 { weight } else { 1.0 };
            for (total, v) in totals.iter_mut().zip(leaf) {
                *total += v / norm;
            }
        }
        argmax(&totals)
            .map(|i| self.classes[i])
            .ok_or_else(|| InferenceError::Empty {
                model: "forest classifier".to_string(),
            })
    }
}

// ============================================================================
// Artifact documents
// ============================================================================

/// On-disk regression model document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorArtifact {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
    Forest {
        trees: Vec<DecisionTree>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
    GradientBoosting {
        init: f64,
        learning_rate: f64,
        trees: Vec<DecisionTree>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
}

impl RegressorArtifact {
    /// Validate and build the regressor.
    pub fn build(self) -> Result<Box<dyn Regressor>, ArtifactError> {
        const NAME: &str = "regression model";
        match self {
            RegressorArtifact::Linear {
                coefficients,
                intercept,
                feature_names,
            } => {
                check_feature_names(NAME, feature_names.as_deref())?;
                check_width(NAME, coefficients.len())?;
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ArtifactError::invalid(NAME, "parameters contain non-finite values"));
                }
                Ok(Box::new(LinearRegressor {
                    coefficients,
                    intercept,
                }))
            }
            RegressorArtifact::Forest {
                trees,
                feature_names,
            } => {
                check_feature_names(NAME, feature_names.as_deref())?;
                validate_trees(NAME, &trees, 1)?;
                Ok(Box::new(ForestRegressor { trees }))
            }
            RegressorArtifact::GradientBoosting {
                init,
                learning_rate,
                trees,
                feature_names,
            } => {
                check_feature_names(NAME, feature_names.as_deref())?;
                validate_trees(NAME, &trees, 1)?;
                if !init.is_finite() || !learning_rate.is_finite() {
                    return Err(ArtifactError::invalid(NAME, "parameters contain non-finite values"));
                }
                Ok(Box::new(GradientBoostedRegressor {
                    init,
                    learning_rate,
                    trees,
                }))
            }
        }
    }
}

/// On-disk classification model document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    Logistic {
        classes: Vec<i64>,
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
    Forest {
        classes: Vec<i64>,
        trees: Vec<DecisionTree>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
}

impl ClassifierArtifact {
    /// Validate and build the classifier.
    pub fn build(self) -> Result<Box<dyn Classifier>, ArtifactError> {
        const NAME: &str = "classification model";
        match self {
            ClassifierArtifact::Logistic {
                classes,
                coefficients,
                intercepts,
                feature_names,
            } => {
                check_feature_names(NAME, feature_names.as_deref())?;
                let model = LogisticClassifier {
                    classes,
                    coefficients,
                    intercepts,
                };
                model.validate()?;
                Ok(Box::new(model))
            }
            ClassifierArtifact::Forest {
                classes,
                trees,
                feature_names,
            } => {
                check_feature_names(NAME, feature_names.as_deref())?;
                if classes.is_empty() {
                    return Err(ArtifactError::invalid(NAME, "no classes"));
                }
                validate_trees(NAME, &trees, classes.len())?;
                Ok(Box::new(ForestClassifier { classes, trees }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with(index: usize, value: f64) -> ScaledVector {
        let mut values = vec![0.0; FEATURE_COUNT];
        values[index] = value;
        ScaledVector::new(values)
    }

    /// Splits on feature 4: `<= 0.5` goes to `low`, otherwise `high`.
    fn stump(low: Vec<f64>, high: Vec<f64>) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 4,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: low },
                TreeNode::Leaf { value: high },
            ],
        }
    }

    #[test]
    fn test_linear_regressor() {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[2] = 1000.0;
        let model = RegressorArtifact::Linear {
            coefficients,
            intercept: 500.0,
            feature_names: None,
        }
        .build()
        .unwrap();

        assert_eq!(model.n_features(), FEATURE_COUNT);
        assert_eq!(model.predict(&row_with(2, 1.5)).unwrap(), 2000.0);
    }

    #[test]
    fn test_linear_wrong_width() {
        let result = RegressorArtifact::Linear {
            coefficients: vec![1.0; 13],
            intercept: 0.0,
            feature_names: None,
        }
        .build();
        assert!(matches!(result, Err(ArtifactError::FeatureCount { actual: 13, .. })));
    }

    #[test]
    fn test_row_width_checked() {
        let model = LinearRegressor {
            coefficients: vec![1.0; FEATURE_COUNT],
            intercept: 0.0,
        };
        let err = model.predict(&ScaledVector::new(vec![1.0; 3])).unwrap_err();
        assert_eq!(
            err,
            InferenceError::WidthMismatch {
                expected: 12,
                actual: 3
            }
        );
    }

    #[test]
    fn test_tree_walk() {
        let tree = stump(vec![10.0], vec![20.0]);
        tree.validate(1).unwrap();
        assert_eq!(tree.leaf(row_with(4, 0.5).as_slice()), &[10.0]);
        assert_eq!(tree.leaf(row_with(4, 0.51).as_slice()), &[20.0]);
    }

    #[test]
    fn test_tree_rejects_backward_child() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Leaf { value: vec![1.0] },
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 2,
                },
                TreeNode::Leaf { value: vec![1.0] },
            ],
        };
        assert!(tree.validate(1).unwrap_err().contains("invalid child 0"));
    }

    #[test]
    fn test_self_referencing_tree_never_builds() {
        let json = serde_json::json!({
            "kind": "forest",
            "classes": [0, 1],
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 0.0, "left": 0, "right": 1},
                {"value": [1.0, 0.0]}
            ]}]
        });
        let artifact: ClassifierArtifact = serde_json::from_value(json).unwrap();
        let err = artifact.build().err().expect("build should fail");
        assert!(err.to_string().contains("invalid child 0"));
    }

    #[test]
    fn test_tree_rejects_unknown_feature() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 12,
                    threshold: 0.0,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: vec![1.0] },
                TreeNode::Leaf { value: vec![1.0] },
            ],
        };
        assert!(tree.validate(1).is_err());
    }

    #[test]
    fn test_forest_regressor_averages() {
        let model = RegressorArtifact::Forest {
            trees: vec![stump(vec![10.0], vec![20.0]), stump(vec![30.0], vec![40.0])],
            feature_names: None,
        }
        .build()
        .unwrap();
        assert_eq!(model.predict(&row_with(4, 0.0)).unwrap(), 20.0);
        assert_eq!(model.predict(&row_with(4, 1.0)).unwrap(), 30.0);
    }

    #[test]
    fn test_gradient_boosting() {
        let model = RegressorArtifact::GradientBoosting {
            init: 1000.0,
            learning_rate: 0.1,
            trees: vec![stump(vec![-100.0], vec![100.0]), stump(vec![-50.0], vec![50.0])],
            feature_names: None,
        }
        .build()
        .unwrap();
        assert!((model.predict(&row_with(4, 1.0)).unwrap() - 1015.0).abs() < 1e-9);
        assert!((model.predict(&row_with(4, 0.0)).unwrap() - 985.0).abs() < 1e-9);
    }

    #[test]
    fn test_forest_regressor_rejects_class_leaves() {
        let result = RegressorArtifact::Forest {
            trees: vec![stump(vec![1.0, 2.0], vec![3.0, 4.0])],
            feature_names: None,
        }
        .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_multinomial_logistic() {
        let mut budget = vec![0.0; FEATURE_COUNT];
        budget[6] = -1.0;
        let mut luxury = vec![0.0; FEATURE_COUNT];
        luxury[6] = 1.0;
        let mid = vec![0.0; FEATURE_COUNT];
        let model = ClassifierArtifact::Logistic {
            classes: vec![0, 1, 2],
            coefficients: vec![budget, luxury, mid],
            intercepts: vec![0.0, 0.0, 0.5],
            feature_names: None,
        }
        .build()
        .unwrap();

        assert_eq!(model.predict(&row_with(6, -2.0)).unwrap(), 0);
        assert_eq!(model.predict(&row_with(6, 2.0)).unwrap(), 1);
        assert_eq!(model.predict(&row_with(6, 0.1)).unwrap(), 2);
    }

    #[test]
    fn test_binary_logistic() {
        let mut coef = vec![0.0; FEATURE_COUNT];
        coef[0] = 1.0;
        let model = ClassifierArtifact::Logistic {
            classes: vec![0, 1],
            coefficients: vec![coef],
            intercepts: vec![0.0],
            feature_names: None,
        }
        .build()
        .unwrap();
        assert_eq!(model.predict(&row_with(0, 1.0)).unwrap(), 1);
        assert_eq!(model.predict(&row_with(0, -1.0)).unwrap(), 0);
    }

    #[test]
    fn test_logistic_shape_mismatch() {
        let result = ClassifierArtifact::Logistic {
            classes: vec![0, 1, 2],
            coefficients: vec![vec![0.0; FEATURE_COUNT]; 2],
            intercepts: vec![0.0; 2],
            feature_names: None,
        }
        .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_forest_classifier_votes() {
        let model = ClassifierArtifact::Forest {
            classes: vec![0, 1, 2],
            trees: vec![
                stump(vec![8.0, 1.0, 1.0], vec![0.0, 2.0, 8.0]),
                stump(vec![0.6, 0.2, 0.2], vec![0.0, 0.1, 0.9]),
                stump(vec![0.0, 1.0, 0.0], vec![0.0, 1.0, 0.0]),
            ],
            feature_names: None,
        }
        .build()
        .unwrap();
        assert_eq!(model.predict(&row_with(4, 0.0)).unwrap(), 0);
        assert_eq!(model.predict(&row_with(4, 1.0)).unwrap(), 2);
    }

    #[test]
    fn test_classifier_may_return_codes_outside_table() {
        let model = ClassifierArtifact::Forest {
            classes: vec![7, 9],
            trees: vec![stump(vec![1.0, 0.0], vec![0.0, 1.0])],
            feature_names: None,
        }
        .build()
        .unwrap();
        assert_eq!(model.predict(&row_with(4, 1.0)).unwrap(), 9);
    }

    #[test]
    fn test_tree_json_shape() {
        let json = r#"{
            "kind": "forest",
            "trees": [{"nodes": [
                {"feature": 2, "threshold": 0.0, "left": 1, "right": 2},
                {"value": [100.0]},
                {"value": [200.0]}
            ]}]
        }"#;
        let artifact: RegressorArtifact = serde_json::from_str(json).unwrap();
        let model = artifact.build().unwrap();
        assert_eq!(model.predict(&row_with(2, 1.0)).unwrap(), 200.0);
    }

    #[test]
    fn test_argmax_ties_pick_first() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }
}
