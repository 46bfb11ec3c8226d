//! MLP churn classifier
//!
//! Architecture: Input(7) → [Linear → ReLU → Dropout] × N → logit(1)
//!
//! Weights come from a burn `.mpk` record produced elsewhere; this crate only
//! loads and runs them.

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::activation::{relu, sigmoid};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::ChurnModel;
use crate::features::{FeatureRecord, FeatureTable};
use crate::{ChurnError, ChurnLabel, ModelConfig, Result};

/// Configuration for the MLP model
#[derive(Debug, Clone)]
pub struct MlpConfig {
    /// Input dimension (feature record width)
    pub input_dim: usize,
    /// Hidden layer dimensions (e.g., [32, 16] for two layers)
    pub hidden_dims: Vec<usize>,
    /// Dropout rate (inactive at inference)
    pub dropout: f64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        MlpConfig {
            input_dim: FeatureRecord::DIM,
            hidden_dims: vec![32, 16],
            dropout: 0.0,
        }
    }
}

impl MlpConfig {
    pub fn from_model_config(config: &ModelConfig) -> Self {
        MlpConfig {
            input_dim: FeatureRecord::DIM,
            hidden_dims: config.hidden_dims.clone(),
            dropout: config.dropout,
        }
    }
}

/// A single hidden layer block: Linear → ReLU → Dropout
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
    dropout: Dropout,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize, dropout: f64) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear.forward(x);
        let x = relu(x);
        self.dropout.forward(x)
    }
}

/// Feed-forward network producing one churn logit per row
#[derive(Module, Debug)]
pub struct ChurnNet<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    head: Linear<B>,
}

impl<B: Backend> ChurnNet<B> {
    /// Create a new network with freshly initialized weights
    pub fn new(device: &B::Device, config: &MlpConfig) -> Self {
        let mut hidden = Vec::with_capacity(config.hidden_dims.len());
        let mut in_dim = config.input_dim;
        for &out_dim in &config.hidden_dims {
            hidden.push(HiddenBlock::new(device, in_dim, out_dim, config.dropout));
            in_dim = out_dim;
        }

        ChurnNet {
            hidden,
            head: LinearConfig::new(in_dim, 1).init(device),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `features` - Feature rows [batch, input_dim]
    ///
    /// # Returns
    /// Churn logits [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self
            .hidden
            .iter()
            .fold(features, |x, block| block.forward(x));
        self.head.forward(x)
    }

    /// Save model to file (burn appends `.mpk`)
    pub fn save(&self, path: &str) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), path.into())
            .map_err(|e| ChurnError::Model(e.to_string()))
    }

    /// Load model from file
    pub fn load(device: &B::Device, path: &str, config: &MlpConfig) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record: ChurnNetRecord<B> = recorder
            .load(path.into(), device)
            .map_err(|e| ChurnError::Model(e.to_string()))?;

        // burn panics on a layer count mismatch
        if record.hidden.len() != config.hidden_dims.len() {
            return Err(ChurnError::Model(format!(
                "{} has {} hidden layers, config expects {}",
                path,
                record.hidden.len(),
                config.hidden_dims.len()
            )));
        }

        let model = Self::new(device, config);
        Ok(model.load_record(record))
    }
}

/// Network bound to the device it runs on
pub struct MlpClassifier<B: Backend> {
    net: ChurnNet<B>,
    config: MlpConfig,
    device: B::Device,
}

impl<B: Backend> MlpClassifier<B> {
    pub fn new(net: ChurnNet<B>, config: MlpConfig, device: B::Device) -> Self {
        MlpClassifier {
            net,
            config,
            device,
        }
    }

    /// Load classifier from a saved record
    pub fn load(device: B::Device, path: &str, config: MlpConfig) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let net = ChurnNet::load(&device, path, &config)?;
        Ok(Self::new(net, config, device))
    }

    /// Churn probability per row
    pub fn probabilities(&self, table: &FeatureTable) -> Result<Vec<f32>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let data: Vec<f32> = table.to_matrix().into_iter().map(|v| v as f32).collect();
        let features = Tensor::<B, 1>::from_floats(data.as_slice(), &self.device)
            .reshape([table.len(), self.config.input_dim]);

        let probs = sigmoid(self.net.forward(features));
        probs
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ChurnError::Inference(format!("{:?}", e)))
    }
}

impl<B: Backend> ChurnModel for MlpClassifier<B> {
    fn predict(&self, table: &FeatureTable) -> Result<Vec<ChurnLabel>> {
        let probs = self.probabilities(table)?;
        Ok(probs
            .into_iter()
            .map(|p| {
                if p >= 0.5 {
                    ChurnLabel::Churn
                } else {
                    ChurnLabel::NotChurn
                }
            })
            .collect())
    }

    fn describe(&self) -> String {
        format!(
            "mlp: {} inputs, hidden {:?}",
            self.config.input_dim, self.config.hidden_dims
        )
    }
}
