//! Feature encoding
//!
//! Converts customer attributes into model-ready records.

pub mod encoding;
pub mod record;

pub use encoding::{
    decode, encode, CategoricalFeature, Contract, InternetService, PaymentMethod, Vocabulary,
};
pub use record::{FeatureRecord, FeatureTable, REQUIRED_COLUMNS};
