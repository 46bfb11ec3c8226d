//! Fixed vocabularies for the categorical customer attributes
//!
//! Each vocabulary is closed: a display string either maps to its code or to
//! nothing. Unknown strings are never coerced to a default code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical columns of a feature record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoricalFeature {
    Contract,
    PaymentMethod,
    InternetService,
}

impl CategoricalFeature {
    pub const ALL: [CategoricalFeature; 3] = [
        CategoricalFeature::Contract,
        CategoricalFeature::PaymentMethod,
        CategoricalFeature::InternetService,
    ];

    /// Column name in uploaded files
    pub fn column(&self) -> &'static str {
        match self {
            CategoricalFeature::Contract => "Contract",
            CategoricalFeature::PaymentMethod => "PaymentMethod",
            CategoricalFeature::InternetService => "InternetService",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.column() == name)
    }

    /// Display strings in code order
    pub fn labels(&self) -> Vec<&'static str> {
        match self {
            CategoricalFeature::Contract => Contract::ALL.iter().map(|v| v.label()).collect(),
            CategoricalFeature::PaymentMethod => {
                PaymentMethod::ALL.iter().map(|v| v.label()).collect()
            }
            CategoricalFeature::InternetService => {
                InternetService::ALL.iter().map(|v| v.label()).collect()
            }
        }
    }
}

impl fmt::Display for CategoricalFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A closed mapping between display strings and integer codes
pub trait Vocabulary: Sized + Copy + 'static {
    const FEATURE: CategoricalFeature;
    /// Members in code order
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    fn code(&self) -> u8;

    /// Exact, case-sensitive lookup
    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.label() == label)
    }

    fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Contract {
    #[default]
    MonthToMonth,
    OneYear,
    TwoYear,
}

impl Vocabulary for Contract {
    const FEATURE: CategoricalFeature = CategoricalFeature::Contract;
    const ALL: &'static [Self] = &[Contract::MonthToMonth, Contract::OneYear, Contract::TwoYear];

    fn label(&self) -> &'static str {
        match self {
            Contract::MonthToMonth => "Month-to-Month",
            Contract::OneYear => "One Year",
            Contract::TwoYear => "Two Year",
        }
    }

    fn code(&self) -> u8 {
        match self {
            Contract::MonthToMonth => 0,
            Contract::OneYear => 1,
            Contract::TwoYear => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    ElectronicCheck,
    MailedCheck,
    BankTransfer,
    CreditCard,
}

impl Vocabulary for PaymentMethod {
    const FEATURE: CategoricalFeature = CategoricalFeature::PaymentMethod;
    const ALL: &'static [Self] = &[
        PaymentMethod::ElectronicCheck,
        PaymentMethod::MailedCheck,
        PaymentMethod::BankTransfer,
        PaymentMethod::CreditCard,
    ];

    fn label(&self) -> &'static str {
        match self {
            PaymentMethod::ElectronicCheck => "Electronic Check",
            PaymentMethod::MailedCheck => "Mailed Check",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::CreditCard => "Credit Card",
        }
    }

    fn code(&self) -> u8 {
        match self {
            PaymentMethod::ElectronicCheck => 0,
            PaymentMethod::MailedCheck => 1,
            PaymentMethod::BankTransfer => 2,
            PaymentMethod::CreditCard => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InternetService {
    #[default]
    Dsl,
    FiberOptic,
    NoService,
}

impl Vocabulary for InternetService {
    const FEATURE: CategoricalFeature = CategoricalFeature::InternetService;
    const ALL: &'static [Self] = &[
        InternetService::Dsl,
        InternetService::FiberOptic,
        InternetService::NoService,
    ];

    fn label(&self) -> &'static str {
        match self {
            InternetService::Dsl => "DSL",
            InternetService::FiberOptic => "Fiber Optic",
            InternetService::NoService => "None",
        }
    }

    fn code(&self) -> u8 {
        match self {
            InternetService::Dsl => 0,
            InternetService::FiberOptic => 1,
            InternetService::NoService => 2,
        }
    }
}

/// Encode a display string for the given feature
pub fn encode(feature: CategoricalFeature, label: &str) -> Option<u8> {
    match feature {
        CategoricalFeature::Contract => Contract::from_label(label).map(|v| v.code()),
        CategoricalFeature::PaymentMethod => PaymentMethod::from_label(label).map(|v| v.code()),
        CategoricalFeature::InternetService => {
            InternetService::from_label(label).map(|v| v.code())
        }
    }
}

/// Decode an integer code back to its display string
pub fn decode(feature: CategoricalFeature, code: u8) -> Option<&'static str> {
    match feature {
        CategoricalFeature::Contract => Contract::from_code(code).map(|v| v.label()),
        CategoricalFeature::PaymentMethod => PaymentMethod::from_code(code).map(|v| v.label()),
        CategoricalFeature::InternetService => {
            InternetService::from_code(code).map(|v| v.label())
        }
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for InternetService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
