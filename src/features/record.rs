//! Typed model input
//!
//! A customer is encoded as a fixed seven-value feature vector. Column order
//! matches the order the pre-trained artifacts were fitted with.

use serde::{Deserialize, Serialize};

use super::encoding::{Contract, InternetService, PaymentMethod, Vocabulary};

pub const AGE: &str = "Age";
pub const TENURE: &str = "Tenure";
pub const MONTHLY_CHARGES: &str = "MonthlyCharges";
pub const TOTAL_CHARGES: &str = "TotalCharges";
pub const CONTRACT: &str = "Contract";
pub const PAYMENT_METHOD: &str = "PaymentMethod";
pub const INTERNET_SERVICE: &str = "InternetService";

/// Required columns, in model input order
pub const REQUIRED_COLUMNS: [&str; FeatureRecord::DIM] = [
    AGE,
    TENURE,
    MONTHLY_CHARGES,
    TOTAL_CHARGES,
    CONTRACT,
    PAYMENT_METHOD,
    INTERNET_SERVICE,
];

pub const AGE_RANGE: (u32, u32) = (18, 100);
pub const TENURE_RANGE: (u32, u32) = (0, 72);

/// One customer's encoded attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub age: u32,
    /// Months with the provider
    pub tenure: u32,
    pub monthly_charges: f64,
    pub total_charges: f64,
    pub contract: Contract,
    pub payment_method: PaymentMethod,
    pub internet_service: InternetService,
}

impl FeatureRecord {
    /// Dimension of feature vector
    pub const DIM: usize = 7;

    /// Categorical codes as (contract, payment method, internet service)
    pub fn codes(&self) -> (u8, u8, u8) {
        (
            self.contract.code(),
            self.payment_method.code(),
            self.internet_service.code(),
        )
    }

    /// Convert to a flat vector in model input order
    pub fn to_vec(&self) -> Vec<f64> {
        let (contract, payment, internet) = self.codes();
        vec![
            self.age as f64,
            self.tenure as f64,
            self.monthly_charges,
            self.total_charges,
            contract as f64,
            payment as f64,
            internet as f64,
        ]
    }

    /// Same layout as `to_vec`, rendered for display
    pub fn to_strings(&self) -> Vec<String> {
        let (contract, payment, internet) = self.codes();
        vec![
            self.age.to_string(),
            self.tenure.to_string(),
            self.monthly_charges.to_string(),
            self.total_charges.to_string(),
            contract.to_string(),
            payment.to_string(),
            internet.to_string(),
        ]
    }

    /// Check the numeric invariants; returns the offending column name
    pub fn out_of_range_column(&self) -> Option<&'static str> {
        if self.age < AGE_RANGE.0 || self.age > AGE_RANGE.1 {
            Some(AGE)
        } else if self.tenure > TENURE_RANGE.1 {
            Some(TENURE)
        } else if !self.monthly_charges.is_finite() || self.monthly_charges < 0.0 {
            Some(MONTHLY_CHARGES)
        } else if !self.total_charges.is_finite() || self.total_charges < 0.0 {
            Some(TOTAL_CHARGES)
        } else {
            None
        }
    }
}

/// Ordered rows sharing the feature record schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    records: Vec<FeatureRecord>,
}

impl FeatureTable {
    pub fn new(records: Vec<FeatureRecord>) -> Self {
        FeatureTable { records }
    }

    pub fn single(record: FeatureRecord) -> Self {
        FeatureTable {
            records: vec![record],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn push(&mut self, record: FeatureRecord) {
        self.records.push(record);
    }

    /// Row-major feature matrix, `len() * DIM` values
    pub fn to_matrix(&self) -> Vec<f64> {
        self.records.iter().flat_map(|r| r.to_vec()).collect()
    }
}
