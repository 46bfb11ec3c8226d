//! Pre-trained churn classifiers
//!
//! Two artifact formats are supported:
//! - Forest: decision tree ensemble exported as JSON
//! - MLP: burn feed-forward network record

pub mod forest;
pub mod mlp;

use std::path::Path;

use burn::backend::NdArray;

use crate::features::FeatureTable;
use crate::{ChurnError, ChurnLabel, ModelConfig, ModelKind, Result};

pub use forest::Forest;
pub use mlp::{ChurnNet, MlpClassifier, MlpConfig};

type InferenceBackend = NdArray<f32>;

/// A fitted binary classifier
pub trait ChurnModel {
    /// One label per table row, in row order
    fn predict(&self, table: &FeatureTable) -> Result<Vec<ChurnLabel>>;

    /// Short human-readable summary of the artifact
    fn describe(&self) -> String;
}

/// Path of the file backing an artifact (burn adds `.mpk` to MLP records)
pub fn artifact_file(config: &ModelConfig) -> String {
    match config.kind {
        ModelKind::Forest => config.path.clone(),
        ModelKind::Mlp => format!("{}.mpk", config.path),
    }
}

/// Load the configured model artifact
pub fn load_model(config: &ModelConfig) -> Result<Box<dyn ChurnModel>> {
    let file = artifact_file(config);
    if !Path::new(&file).exists() {
        return Err(ChurnError::NoModel(file));
    }

    let model: Box<dyn ChurnModel> = match config.kind {
        ModelKind::Forest => Box::new(Forest::load(&file)?),
        ModelKind::Mlp => Box::new(MlpClassifier::<InferenceBackend>::load(
            Default::default(),
            &config.path,
            MlpConfig::from_model_config(config),
        )?),
    };

    log::info!("Loaded {} model from {}: {}", config.kind, file, model.describe());
    Ok(model)
}
