// ============================================================
// Layer 3 - Customer Record + Canonical Feature Schema
// ============================================================
// One schema is used for training, inference and export:
//
//   index  column            kind
//   0      tenure            numeric (months)
//   1      MonthlyCharges    numeric
//   2      TotalCharges      numeric
//   3      SeniorCitizen     numeric (0 / 1)
//   4      Contract          categorical
//   5      PaymentMethod     categorical
//   6      InternetService   categorical
//   7      OnlineSecurity    categorical
//   8      TechSupport       categorical
//   9      PaperlessBilling  categorical
//
// Categorical columns are turned into integer codes by the
// persisted encoding table (see data::encoder), never by an
// ad-hoc map, so an unseen label is always detected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::error::{ChurnError, ChurnResult};

/// Ordered column names of the feature vector
pub const FEATURE_COLUMNS: [&str; 10] = [
    "tenure",
    "MonthlyCharges",
    "TotalCharges",
    "SeniorCitizen",
    "Contract",
    "PaymentMethod",
    "InternetService",
    "OnlineSecurity",
    "TechSupport",
    "PaperlessBilling",
];

pub const FEATURE_WIDTH: usize = FEATURE_COLUMNS.len();

pub const NUMERIC_COLUMNS: [&str; 4] = ["tenure", "MonthlyCharges", "TotalCharges", "SeniorCitizen"];

pub const CATEGORICAL_COLUMNS: [&str; 6] = [
    "Contract",
    "PaymentMethod",
    "InternetService",
    "OnlineSecurity",
    "TechSupport",
    "PaperlessBilling",
];

/// Binary label column
pub const TARGET_COLUMN: &str = "Churn";

// Bounds enforced on interactive input (the dataset itself is not clamped)
pub const TENURE_RANGE: (f32, f32)          = (0.0, 72.0);
pub const MONTHLY_CHARGES_RANGE: (f32, f32) = (0.0, 200.0);
pub const TOTAL_CHARGES_RANGE: (f32, f32)   = (0.0, 10_000.0);

/// Short stable hash of the ordered schema.
/// Exported scripts carry it so `predict` can refuse a mismatched schema.
pub fn schema_fingerprint() -> String {
    let digest = Sha256::digest(FEATURE_COLUMNS.join(",").as_bytes());
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

// ─── ContractType ─────────────────────────────────────────────────────────────
/// The three contract options offered to the user.
/// The dataset spells them differently ("Month-to-month"), so the
/// mapping to dataset labels lives here in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractType {
    MonthToMonth,
    OneYear,
    TwoYear,
}

impl ContractType {
    #[cfg(test)]
    pub const ALL: [ContractType; 3] = [Self::MonthToMonth, Self::OneYear, Self::TwoYear];

    /// Label as it appears in the `Contract` column of the dataset
    pub fn dataset_label(self) -> &'static str {
        match self {
            Self::MonthToMonth => "Month-to-month",
            Self::OneYear      => "One year",
            Self::TwoYear      => "Two year",
        }
    }

    /// Label shown to the user
    pub fn display_label(self) -> &'static str {
        match self {
            Self::MonthToMonth => "Month-to-Month",
            Self::OneYear      => "One Year",
            Self::TwoYear      => "Two Year",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_label())
    }
}

impl FromStr for ContractType {
    type Err = String;

    /// Accepts "Two Year", "two-year", "TWO_YEAR", "Two year", ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "monthtomonth" => Ok(Self::MonthToMonth),
            "oneyear"      => Ok(Self::OneYear),
            "twoyear"      => Ok(Self::TwoYear),
            _ => Err(format!(
                "unknown contract type '{s}' (expected Month-to-Month, One Year or Two Year)"
            )),
        }
    }
}

// ─── CustomerRecord ───────────────────────────────────────────────────────────
/// Raw values for every schema column of one customer.
/// Produced by the dataset loader for training rows and by the CLI
/// for interactive predictions, so both go through the same encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub tenure:            f32,
    pub monthly_charges:   f32,
    pub total_charges:     f32,
    pub senior_citizen:    f32,
    pub contract:          String,
    pub payment_method:    String,
    pub internet_service:  String,
    pub online_security:   String,
    pub tech_support:      String,
    pub paperless_billing: String,
}

impl CustomerRecord {
    /// Numeric columns in schema order
    pub fn numeric_values(&self) -> [f32; 4] {
        [self.tenure, self.monthly_charges, self.total_charges, self.senior_citizen]
    }

    /// Categorical labels in schema order
    pub fn categorical_values(&self) -> [&str; 6] {
        [
            self.contract.as_str(),
            self.payment_method.as_str(),
            self.internet_service.as_str(),
            self.online_security.as_str(),
            self.tech_support.as_str(),
            self.paperless_billing.as_str(),
        ]
    }

    /// Check the bounds an interactive user is held to.
    pub fn validate_input_ranges(&self) -> ChurnResult<()> {
        check_range("tenure", self.tenure, TENURE_RANGE)?;
        check_range("MonthlyCharges", self.monthly_charges, MONTHLY_CHARGES_RANGE)?;
        check_range("TotalCharges", self.total_charges, TOTAL_CHARGES_RANGE)?;
        if self.senior_citizen != 0.0 && self.senior_citizen != 1.0 {
            return Err(ChurnError::validation("SeniorCitizen", "must be 0 or 1"));
        }
        Ok(())
    }
}

fn check_range(field: &str, value: f32, (min, max): (f32, f32)) -> ChurnResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(ChurnError::validation(
            field,
            format!("{value} is outside the allowed range [{min}, {max}]"),
        ));
    }
    Ok(())
}

// ─── FeatureVector ────────────────────────────────────────────────────────────
/// Ordered numeric features, before or after scaling.
/// Width is not fixed by the type: the scaler checks it against
/// the width it was fitted on and rejects mismatches.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CustomerRecord {
        CustomerRecord {
            tenure:            12.0,
            monthly_charges:   50.0,
            total_charges:     500.0,
            senior_citizen:    0.0,
            contract:          "Two year".into(),
            payment_method:    "Electronic check".into(),
            internet_service:  "DSL".into(),
            online_security:   "No".into(),
            tech_support:      "No".into(),
            paperless_billing: "Yes".into(),
        }
    }

    #[test]
    fn test_contract_parsing_is_lenient() {
        assert_eq!("Two Year".parse::<ContractType>().unwrap(), ContractType::TwoYear);
        assert_eq!("month-to-month".parse::<ContractType>().unwrap(), ContractType::MonthToMonth);
        assert_eq!("One year".parse::<ContractType>().unwrap(), ContractType::OneYear);
        assert!("weekly".parse::<ContractType>().is_err());
    }

    #[test]
    fn test_dataset_labels_differ_from_display_labels() {
        assert_eq!(ContractType::MonthToMonth.dataset_label(), "Month-to-month");
        assert_eq!(ContractType::MonthToMonth.to_string(), "Month-to-Month");
    }

    #[test]
    fn test_valid_record_passes_range_checks() {
        assert!(sample().validate_input_ranges().is_ok());
    }

    #[test]
    fn test_out_of_range_tenure_is_rejected() {
        let mut r = sample();
        r.tenure = 73.0;
        match r.validate_input_ranges() {
            Err(ChurnError::Validation { field, .. }) => assert_eq!(field, "tenure"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let mut r = sample();
        r.tenure          = 72.0;
        r.monthly_charges = 200.0;
        r.total_charges   = 0.0;
        assert!(r.validate_input_ranges().is_ok());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let fp = schema_fingerprint();
        assert_eq!(fp.len(), 16);
        assert_eq!(fp, schema_fingerprint());
    }
}
