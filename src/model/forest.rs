//! Tree ensemble classifier loaded from JSON
//!
//! Trees use the usual exported layout: split nodes send a row left when
//! `x[feature] <= threshold`, leaves hold per-class weights
//! `[not_churn, churn]`. The ensemble averages each tree's normalized leaf
//! distribution and picks the larger class, ties going to "Not Churn".

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ChurnModel;
use crate::features::{FeatureRecord, FeatureTable};
use crate::{ChurnError, ChurnLabel, Result};

/// A decision tree node (split or leaf)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        /// Index into the feature vector
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class weights, `[not_churn, churn]`
        value: Vec<f64>,
    },
}

/// A single decision tree, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Unchecked until it joins a [`Forest`]
    pub fn new(nodes: Vec<Node>) -> Self {
        Tree { nodes }
    }

    /// Churn probability for one feature vector
    fn churn_probability(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => {
                    let total: f64 = value.iter().sum();
                    return value[1] / total;
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    fn validate(&self, tree_idx: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ChurnError::Model(format!("tree {} has no nodes", tree_idx)));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            let invalid = |msg: String| -> Result<()> {
                Err(ChurnError::Model(format!("tree {} node {}: {}", tree_idx, i, msg)))
            };
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FeatureRecord::DIM {
                        return invalid(format!(
                            "feature index {} exceeds {} inputs",
                            feature,
                            FeatureRecord::DIM
                        ));
                    }
                    if threshold.is_nan() {
                        return invalid("threshold is NaN".to_string());
                    }
                    // Children must point forward, which also rules out cycles
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return invalid(format!("child index {} is invalid", child));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if value.len() != 2 {
                        return invalid(format!("expected 2 class weights, got {}", value.len()));
                    }
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return invalid("class weights must be finite and non-negative".to_string());
                    }
                    if value.iter().sum::<f64>() <= 0.0 {
                        return invalid("class weights sum to zero".to_string());
                    }
                }
            }
        }
        Ok(())
    }
}

/// Ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forest {
    trees: Vec<Tree>,
}

impl Forest {
    /// Build a forest, checking its structure
    pub fn new(trees: Vec<Tree>) -> Result<Self> {
        let forest = Forest { trees };
        forest.validate()?;
        Ok(forest)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let forest: Forest = serde_json::from_str(json)?;
        forest.validate()?;
        Ok(forest)
    }

    /// Load forest from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(ChurnError::Model("forest has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i)?;
        }
        Ok(())
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn node_count(&self) -> usize {
        self.trees.iter().map(|t| t.nodes.len()).sum()
    }

    /// Mean churn probability over all trees
    pub fn churn_probability(&self, record: &FeatureRecord) -> f64 {
        let features = record.to_vec();
        let sum: f64 = self
            .trees
            .iter()
            .map(|t| t.churn_probability(&features))
            .sum();
        sum / self.trees.len() as f64
    }

    pub fn classify(&self, record: &FeatureRecord) -> ChurnLabel {
        let churn = self.churn_probability(record);
        if churn > 1.0 - churn {
            ChurnLabel::Churn
        } else {
            ChurnLabel::NotChurn
        }
    }
}

impl ChurnModel for Forest {
    fn predict(&self, table: &FeatureTable) -> Result<Vec<ChurnLabel>> {
        Ok(table.records().iter().map(|r| self.classify(r)).collect())
    }

    fn describe(&self) -> String {
        format!(
            "tree ensemble: {} trees, {} nodes",
            self.tree_count(),
            self.node_count()
        )
    }
}
