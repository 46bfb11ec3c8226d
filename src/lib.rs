//! Customer churn prediction
//!
//! Encodes customer attributes, runs them through a pre-trained binary
//! classifier and reports one churn label per customer.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::data::RowIssue;

/// Binary outcome produced by a churn model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChurnLabel {
    NotChurn,
    Churn,
}

impl ChurnLabel {
    /// Numeric class as emitted by the classifier
    pub fn code(&self) -> u8 {
        match self {
            ChurnLabel::NotChurn => 0,
            ChurnLabel::Churn => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ChurnLabel::NotChurn),
            1 => Some(ChurnLabel::Churn),
            _ => None,
        }
    }

    pub fn is_churn(&self) -> bool {
        matches!(self, ChurnLabel::Churn)
    }
}

impl fmt::Display for ChurnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChurnLabel::NotChurn => write!(f, "Not Churn"),
            ChurnLabel::Churn => write!(f, "Churn"),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum ChurnError {
    #[error("CSV does not contain the required columns! Missing: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Rejected upload: {0}")]
    InvalidRow(RowIssue),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid model artifact: {0}")]
    Model(String),

    #[error("No model artifact at {0} - set model.path in the config")]
    NoModel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChurnError>;

/// Supported model artifact formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Tree ensemble exported as JSON
    Forest,
    /// Burn MLP record (`.mpk`)
    Mlp,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Forest => write!(f, "forest"),
            ModelKind::Mlp => write!(f, "mlp"),
        }
    }
}

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub kind: ModelKind,
    pub path: String,
    /// Hidden layer widths, only read for `mlp` artifacts
    pub hidden_dims: Vec<usize>,
    pub dropout: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Rows shown in the upload preview
    pub preview_rows: usize,
    /// Fail the whole upload when any row is rejected
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model: ModelConfig {
                kind: ModelKind::Forest,
                path: "model/churn_forest.json".to_string(),
                hidden_dims: vec![32, 16],
                dropout: 0.0,
            },
            upload: UploadConfig {
                preview_rows: 5,
                strict: false,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChurnError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ChurnError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ChurnError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
