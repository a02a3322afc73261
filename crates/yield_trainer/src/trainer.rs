//! Bagged regression forest trainer
//!
//! Each tree is fitted with exact-greedy CART on a bootstrap sample drawn
//! from a seeded LCG, so the same table and config always give the same
//! forest.

use cropyield_core::forest::FORMAT_VERSION;
use cropyield_core::{ColumnManifest, ForestModel, ModelMetadata, SCALE};
use std::collections::BTreeMap;

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::EncodedTable;
use crate::deterministic::LcgRng;
use crate::errors::TrainerError;

/// Forest training configuration
#[derive(Clone, Debug)]
pub struct ForestConfig {
    pub num_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub min_samples_split: usize,
    /// Draw a bootstrap sample per tree; otherwise every tree sees all rows
    pub bootstrap: bool,
    pub seed: i64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_depth: 16,
            min_samples_leaf: 1,
            min_samples_split: 2,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Forest trainer
pub struct ForestTrainer {
    config: ForestConfig,
}

impl ForestTrainer {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    /// Fit a forest on `table`, whose columns are described by `manifest`
    pub fn train(
        &self,
        table: &EncodedTable,
        manifest: &ColumnManifest,
    ) -> Result<ForestModel, TrainerError> {
        if table.is_empty() {
            return Err(TrainerError::Training("no training rows".to_string()));
        }
        if self.config.num_trees == 0 {
            return Err(TrainerError::Training("num_trees must be positive".to_string()));
        }
        if table.feature_count != manifest.len() {
            return Err(TrainerError::Training(format!(
                "table has {} features but manifest lists {}",
                table.feature_count,
                manifest.len()
            )));
        }
        if table.feature_count > u16::MAX as usize {
            return Err(TrainerError::Training(format!(
                "too many features: {}",
                table.feature_count
            )));
        }

        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_leaf: self.config.min_samples_leaf.max(1),
            min_samples_split: self.config.min_samples_split,
        };
        let builder = CartBuilder::new(&table.features, &table.targets, tree_config);

        let n_samples = table.len();
        let mut rng = LcgRng::new(self.config.seed);
        let mut trees = Vec::with_capacity(self.config.num_trees);

        for tree_idx in 0..self.config.num_trees {
            let samples: Vec<usize> = if self.config.bootstrap {
                (0..n_samples)
                    .map(|_| rng.next_range(n_samples as i64) as usize)
                    .collect()
            } else {
                (0..n_samples).collect()
            };

            let tree = builder.build(&samples);
            tracing::debug!(
                "Tree {}/{}: {} nodes, {} leaves",
                tree_idx + 1,
                self.config.num_trees,
                tree.nodes.len(),
                tree.leaf_count()
            );
            trees.push(tree);
        }

        let metadata = ModelMetadata {
            version: FORMAT_VERSION.to_string(),
            created_at: chrono::Utc::now().timestamp(),
            feature_count: table.feature_count,
            tree_count: trees.len(),
            max_depth: self.config.max_depth,
            manifest_hash: manifest.fingerprint()?,
            performance_metrics: BTreeMap::new(),
        };

        Ok(ForestModel {
            trees,
            scale: SCALE,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(n: usize) -> ColumnManifest {
        let names = ["Year", "LandSize(ha)", "FertilizerUsage(kg_ha)"];
        ColumnManifest::new(names[..n].iter().map(|s| s.to_string()).collect())
    }

    fn linear_table() -> EncodedTable {
        EncodedTable {
            features: (0..40).map(|i| vec![i * 100, (i % 4) * 100]).collect(),
            targets: (0..40).map(|i| 100_000 + i * 1_000).collect(),
            feature_count: 2,
        }
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            num_trees: 8,
            max_depth: 6,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_train_simple_model() -> Result<(), TrainerError> {
        let table = linear_table();
        let model = ForestTrainer::new(small_config()).train(&table, &manifest(2))?;

        assert_eq!(model.trees.len(), 8);
        assert_eq!(model.metadata.feature_count, 2);
        assert_eq!(model.metadata.tree_count, 8);
        assert_eq!(model.scale, SCALE);
        model.validate()?;

        // predictions stay inside the target range
        for row in &table.features {
            let p = model.predict_scaled(row)?;
            assert!((100_000.0..=139_000.0).contains(&p), "{p}");
        }
        Ok(())
    }

    #[test]
    fn test_determinism() -> Result<(), TrainerError> {
        let table = linear_table();
        let a = ForestTrainer::new(small_config()).train(&table, &manifest(2))?;
        let b = ForestTrainer::new(small_config()).train(&table, &manifest(2))?;
        assert_eq!(a.trees, b.trees);

        let other_seed = ForestConfig {
            seed: 7,
            ..small_config()
        };
        let c = ForestTrainer::new(other_seed).train(&table, &manifest(2))?;
        assert_ne!(a.trees, c.trees);
        Ok(())
    }

    #[test]
    fn test_without_bootstrap_trees_are_identical() -> Result<(), TrainerError> {
        let config = ForestConfig {
            bootstrap: false,
            ..small_config()
        };
        let model = ForestTrainer::new(config).train(&linear_table(), &manifest(2))?;
        assert!(model.trees.windows(2).all(|w| w[0] == w[1]));
        Ok(())
    }

    #[test]
    fn test_rejects_bad_input() {
        let trainer = ForestTrainer::new(small_config());

        let empty = EncodedTable {
            features: Vec::new(),
            targets: Vec::new(),
            feature_count: 2,
        };
        assert!(matches!(
            trainer.train(&empty, &manifest(2)),
            Err(TrainerError::Training(_))
        ));

        assert!(matches!(
            trainer.train(&linear_table(), &manifest(3)),
            Err(TrainerError::Training(_))
        ));

        let no_trees = ForestTrainer::new(ForestConfig {
            num_trees: 0,
            ..small_config()
        });
        assert!(no_trees.train(&linear_table(), &manifest(2)).is_err());
    }

    #[test]
    fn test_manifest_fingerprint_recorded() -> Result<(), TrainerError> {
        let m = manifest(2);
        let model = ForestTrainer::new(small_config()).train(&linear_table(), &m)?;
        assert!(model.check_manifest(&m).is_ok());
        Ok(())
    }
}
