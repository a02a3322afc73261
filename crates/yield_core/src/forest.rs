//! Fixed-point regression forest.
//!
//! A bag of regression trees evaluated with integer arithmetic only. Features
//! and leaf values are stored at [`crate::SCALE`] so the same artifact gives
//! the same answer on every platform.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::{CoreError, Result};
use crate::manifest::ColumnManifest;

/// Artifact format version written into [`ModelMetadata`]
pub const FORMAT_VERSION: &str = "1.0.0";

/// A decision tree node (internal or leaf)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    /// Feature index to compare (for internal nodes)
    pub feature_index: u16,
    /// Go left when `feature <= threshold`
    pub threshold: i64,
    pub left: u32,
    pub right: u32,
    /// Leaf value (None for internal nodes)
    pub value: Option<i64>,
}

impl Node {
    pub fn leaf(value: i64) -> Self {
        Self {
            feature_index: 0,
            threshold: 0,
            left: 0,
            right: 0,
            value: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.value.is_some()
    }
}

/// A single regression tree, root at index 0
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk the tree for one quantized feature vector.
    ///
    /// Children must sit after their parent, so every walk terminates.
    pub fn evaluate(&self, features: &[i64]) -> Result<i64> {
        let mut idx = 0usize;

        loop {
            let node = self
                .nodes
                .get(idx)
                .ok_or_else(|| CoreError::Model(format!("node {idx} out of range")))?;

            if let Some(value) = node.value {
                return Ok(value);
            }

            let feature_value = features
                .get(node.feature_index as usize)
                .copied()
                .ok_or_else(|| {
                    CoreError::Model(format!("feature {} out of range", node.feature_index))
                })?;

            let next = if feature_value <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
            if next <= idx {
                return Err(CoreError::Model(format!(
                    "node {idx} points back to node {next}"
                )));
            }
            idx = next;
        }
    }

    /// Check the node graph: children after their parent, in range, and
    /// splits on known features only
    pub fn validate(&self, feature_count: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(CoreError::Model("tree has no nodes".to_string()));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                continue;
            }
            for child in [node.left as usize, node.right as usize] {
                if child <= idx || child >= self.nodes.len() {
                    return Err(CoreError::Model(format!(
                        "node {idx} has invalid child {child}"
                    )));
                }
            }
            if node.feature_index as usize >= feature_count {
                return Err(CoreError::Model(format!(
                    "node {idx} splits on feature {} of {feature_count}",
                    node.feature_index
                )));
            }
        }

        Ok(())
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }
}

/// Training provenance stored alongside the trees
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub version: String,
    /// Unix timestamp (seconds)
    pub created_at: i64,
    pub feature_count: usize,
    pub tree_count: usize,
    pub max_depth: usize,
    /// Fingerprint of the manifest the model was fitted with
    pub manifest_hash: String,
    pub performance_metrics: BTreeMap<String, f64>,
}

/// Bagged regression forest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestModel {
    pub trees: Vec<Tree>,
    pub scale: i64,
    pub metadata: ModelMetadata,
}

/// Convert a real value to the forest's fixed-point representation
pub fn quantize(value: f64, scale: i64) -> i64 {
    (value * scale as f64).round() as i64
}

impl ForestModel {
    pub fn feature_count(&self) -> usize {
        self.metadata.feature_count
    }

    /// Mean tree output for a quantized row, still at `scale`
    pub fn predict_scaled(&self, features: &[i64]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(CoreError::Model("model has no trees".to_string()));
        }
        if features.len() != self.feature_count() {
            return Err(CoreError::Model(format!(
                "expected {} features, got {}",
                self.feature_count(),
                features.len()
            )));
        }

        let mut sum: i128 = 0;
        for tree in &self.trees {
            sum += tree.evaluate(features)? as i128;
        }

        Ok(sum as f64 / self.trees.len() as f64)
    }

    /// Predict one aligned row of real-valued features
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if let Some(pos) = row.iter().position(|v| !v.is_finite()) {
            return Err(CoreError::Model(format!("feature {pos} is not finite")));
        }

        let quantized: Vec<i64> = row.iter().map(|&v| quantize(v, self.scale)).collect();
        let scaled = self.predict_scaled(&quantized)?;
        Ok(scaled / self.scale as f64)
    }

    /// Fail unless this model was trained with `manifest`
    pub fn check_manifest(&self, manifest: &ColumnManifest) -> Result<()> {
        if manifest.len() != self.feature_count() {
            return Err(CoreError::ArtifactMismatch(format!(
                "model expects {} features but manifest lists {}",
                self.feature_count(),
                manifest.len()
            )));
        }

        let fingerprint = manifest.fingerprint()?;
        if fingerprint != self.metadata.manifest_hash {
            return Err(CoreError::ArtifactMismatch(format!(
                "manifest hash {} does not match model's {}",
                fingerprint, self.metadata.manifest_hash
            )));
        }

        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode an artifact and reject malformed trees
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model: Self = bincode::deserialize(bytes)?;
        model.validate()?;
        Ok(model)
    }

    /// Structural check of every tree against the recorded feature count
    pub fn validate(&self) -> Result<()> {
        if self.scale <= 0 {
            return Err(CoreError::Model(format!("invalid scale {}", self.scale)));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_count())
                .map_err(|err| CoreError::Model(format!("tree {i}: {err}")))?;
        }
        Ok(())
    }

    /// BLAKE3 hex digest of the serialized artifact
    pub fn hash_hex(&self) -> Result<String> {
        let bytes = self.to_bytes()?;
        Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
    }

    /// Write the artifact and its `.hash` sidecar, returning the hash
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let bytes = self.to_bytes()?;
        let hash = hex::encode(blake3::hash(&bytes).as_bytes());

        std::fs::write(path.as_ref(), &bytes)?;
        std::fs::write(hash_path(path.as_ref()), &hash)?;

        Ok(hash)
    }

    /// Load an artifact, verifying the `.hash` sidecar when present
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;

        let sidecar = hash_path(path.as_ref());
        if sidecar.exists() {
            let expected = std::fs::read_to_string(&sidecar)?;
            let actual = hex::encode(blake3::hash(&bytes).as_bytes());
            if expected.trim() != actual {
                return Err(CoreError::ArtifactMismatch(format!(
                    "{} does not match {}",
                    path.as_ref().display(),
                    sidecar.display()
                )));
            }
        } else {
            tracing::warn!("No hash sidecar for {}", path.as_ref().display());
        }

        Self::from_bytes(&bytes)
    }
}

/// `<model>.hash` next to the artifact
pub fn hash_path(model_path: &Path) -> PathBuf {
    let mut name = model_path.as_os_str().to_owned();
    name.push(".hash");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_tree(threshold: i64, low: i64, high: i64) -> Tree {
        Tree {
            nodes: vec![
                Node {
                    feature_index: 0,
                    threshold,
                    left: 1,
                    right: 2,
                    value: None,
                },
                Node::leaf(low),
                Node::leaf(high),
            ],
        }
    }

    fn model(trees: Vec<Tree>, manifest: &ColumnManifest) -> ForestModel {
        ForestModel {
            metadata: ModelMetadata {
                version: FORMAT_VERSION.to_string(),
                created_at: 0,
                feature_count: manifest.len(),
                tree_count: trees.len(),
                max_depth: 1,
                manifest_hash: manifest.fingerprint().expect("fingerprint"),
                performance_metrics: BTreeMap::new(),
            },
            trees,
            scale: 100,
        }
    }

    fn one_column() -> ColumnManifest {
        ColumnManifest::new(vec!["Year".to_string()])
    }

    #[test]
    fn test_tree_evaluation() {
        let tree = split_tree(500, 100_000, 300_000);
        assert_eq!(tree.evaluate(&[500]).ok(), Some(100_000));
        assert_eq!(tree.evaluate(&[501]).ok(), Some(300_000));
        assert_eq!(tree.leaf_count(), 2);
    }

    fn dangling() -> Tree {
        Tree {
            nodes: vec![Node {
                feature_index: 0,
                threshold: 0,
                left: 9,
                right: 9,
                value: None,
            }],
        }
    }

    fn self_loop() -> Tree {
        Tree {
            nodes: vec![Node {
                feature_index: 0,
                threshold: 0,
                left: 0,
                right: 0,
                value: None,
            }],
        }
    }

    #[test]
    fn test_malformed_tree_is_an_error() {
        assert!(matches!(dangling().evaluate(&[1]), Err(CoreError::Model(_))));
        assert!(matches!(self_loop().evaluate(&[1]), Err(CoreError::Model(_))));
        assert!(matches!(split_tree(0, 1, 2).evaluate(&[]), Err(CoreError::Model(_))));

        assert!(dangling().validate(1).is_err());
        assert!(self_loop().validate(1).is_err());
        assert!(split_tree(0, 1, 2).validate(0).is_err());
        assert!(Tree { nodes: Vec::new() }.validate(1).is_err());
        assert!(split_tree(0, 1, 2).validate(1).is_ok());
    }

    #[test]
    fn test_malformed_tree_fails_prediction() {
        let manifest = one_column();
        let forest = model(vec![Tree { nodes: vec![Node::leaf(400_000)] }, dangling()], &manifest);

        assert!(matches!(forest.predict(&[5.0]), Err(CoreError::Model(_))));
        assert!(forest.validate().is_err());
    }

    #[test]
    fn test_malformed_artifact_rejected_on_decode() -> anyhow::Result<()> {
        let manifest = one_column();
        for bad in [dangling(), self_loop()] {
            let forest = model(vec![Tree { nodes: vec![Node::leaf(400_000)] }, bad], &manifest);
            let bytes = forest.to_bytes()?;
            assert!(matches!(
                ForestModel::from_bytes(&bytes),
                Err(CoreError::Model(_))
            ));
        }

        let good = model(vec![split_tree(500, 1, 2)], &manifest);
        assert_eq!(ForestModel::from_bytes(&good.to_bytes()?)?, good);
        Ok(())
    }

    #[test]
    fn test_forest_averages_trees() {
        let manifest = one_column();
        let forest = model(
            vec![split_tree(500, 100_000, 300_000), split_tree(1000, 200_000, 400_000)],
            &manifest,
        );

        // 4.0 quantizes to 400: both trees go left
        assert_eq!(forest.predict(&[4.0]).expect("predict"), 1500.0);
        // 7.0 quantizes to 700: right, then left
        assert_eq!(forest.predict(&[7.0]).expect("predict"), 2500.0);
    }

    #[test]
    fn test_predict_rejects_bad_rows() {
        let manifest = one_column();
        let forest = model(vec![split_tree(500, 1, 2)], &manifest);

        assert!(matches!(forest.predict(&[1.0, 2.0]), Err(CoreError::Model(_))));
        assert!(matches!(forest.predict(&[f64::NAN]), Err(CoreError::Model(_))));

        let empty = model(Vec::new(), &manifest);
        assert!(matches!(empty.predict(&[1.0]), Err(CoreError::Model(_))));
    }

    #[test]
    fn test_quantize_rounds() {
        assert_eq!(quantize(12.346, 100), 1235);
        assert_eq!(quantize(-0.004, 100), 0);
        assert_eq!(quantize(2024.0, 100), 202_400);
    }

    #[test]
    fn test_manifest_pairing() {
        let manifest = one_column();
        let forest = model(vec![split_tree(500, 1, 2)], &manifest);
        assert!(forest.check_manifest(&manifest).is_ok());

        let renamed = ColumnManifest::new(vec!["LandSize(ha)".to_string()]);
        assert!(matches!(
            forest.check_manifest(&renamed),
            Err(CoreError::ArtifactMismatch(_))
        ));

        let wider = ColumnManifest::new(vec!["Year".to_string(), "LandSize(ha)".to_string()]);
        assert!(matches!(
            forest.check_manifest(&wider),
            Err(CoreError::ArtifactMismatch(_))
        ));
    }

    #[test]
    fn test_save_load_with_sidecar() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("crop_yield_model.bin");

        let manifest = one_column();
        let forest = model(vec![split_tree(500, 1, 2)], &manifest);
        let hash = forest.save(&path)?;

        assert_eq!(std::fs::read_to_string(hash_path(&path))?, hash);
        assert_eq!(ForestModel::load(&path)?, forest);

        std::fs::write(hash_path(&path), "0000")?;
        assert!(matches!(
            ForestModel::load(&path),
            Err(CoreError::ArtifactMismatch(_))
        ));
        Ok(())
    }
}
