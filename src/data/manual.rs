//! Single-customer entry
//!
//! Values arrive from bounded inputs, so assembly clamps instead of failing.

use serde::{Deserialize, Serialize};

use crate::features::record::{AGE_RANGE, TENURE_RANGE};
use crate::features::{Contract, FeatureRecord, FeatureTable, InternetService, PaymentMethod};

pub const MONTHLY_CHARGES_RANGE: (f64, f64) = (0.0, 200.0);
pub const TOTAL_CHARGES_RANGE: (f64, f64) = (0.0, 10_000.0);

/// Raw values for one customer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualInput {
    pub age: u32,
    pub tenure: u32,
    pub monthly_charges: f64,
    pub total_charges: f64,
    pub contract: Contract,
    pub payment_method: PaymentMethod,
    pub internet_service: InternetService,
}

impl Default for ManualInput {
    fn default() -> Self {
        ManualInput {
            age: 35,
            tenure: 24,
            monthly_charges: 50.0,
            total_charges: 1200.0,
            contract: Contract::default(),
            payment_method: PaymentMethod::default(),
            internet_service: InternetService::default(),
        }
    }
}

impl ManualInput {
    /// Build the feature record, clamping scalars into their input bounds
    pub fn to_record(&self) -> FeatureRecord {
        FeatureRecord {
            age: self.age.clamp(AGE_RANGE.0, AGE_RANGE.1),
            tenure: self.tenure.clamp(TENURE_RANGE.0, TENURE_RANGE.1),
            monthly_charges: clamp_charge(self.monthly_charges, MONTHLY_CHARGES_RANGE),
            total_charges: clamp_charge(self.total_charges, TOTAL_CHARGES_RANGE),
            contract: self.contract,
            payment_method: self.payment_method,
            internet_service: self.internet_service,
        }
    }

    /// One-row table for inference
    pub fn to_table(&self) -> FeatureTable {
        FeatureTable::single(self.to_record())
    }
}

fn clamp_charge(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
