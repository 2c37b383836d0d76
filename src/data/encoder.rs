// ============================================================
// Layer 4 - Label Encoding Table
// ============================================================
// Maps every categorical label to a stable integer code.
//
// How a code is assigned:
//   The distinct labels of a column are sorted; a label's code is
//   its index in that sorted list. "No" < "Yes" gives No=0, Yes=1.
//
// The table is fitted once per retraining run on the full dataset,
// persisted next to the model, and reused at inference time. A label
// that was never seen during fitting is a validation error, never a
// silent fallback code.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::data::dataset::ChurnRow;
use crate::domain::customer::{CustomerRecord, FeatureVector, CATEGORICAL_COLUMNS, TARGET_COLUMN};
use crate::domain::error::{ChurnError, ChurnResult};

/// Sorted distinct labels of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let set: BTreeSet<&str> = labels.into_iter().collect();
        Self { classes: set.into_iter().map(str::to_string).collect() }
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).ok()
    }

    #[cfg(test)]
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// One encoder per categorical column plus the target column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingTable {
    columns: BTreeMap<String, LabelEncoder>,
}

impl EncodingTable {
    /// Fit encoders for every categorical feature column and the target.
    /// The target must end up with exactly two classes.
    pub fn fit(rows: &[ChurnRow]) -> ChurnResult<Self> {
        if rows.is_empty() {
            return Err(ChurnError::validation("dataset", "no rows to fit label encoders on"));
        }

        let mut columns = BTreeMap::new();
        for (idx, name) in CATEGORICAL_COLUMNS.iter().enumerate() {
            let enc = LabelEncoder::fit(rows.iter().map(|r| r.customer.categorical_values()[idx]));
            tracing::debug!("Encoded column '{}' with {} classes", name, enc.classes().len());
            columns.insert(name.to_string(), enc);
        }

        let target = LabelEncoder::fit(rows.iter().map(|r| r.churn.as_str()));
        if target.classes().len() != 2 {
            return Err(ChurnError::validation(
                TARGET_COLUMN,
                format!("expected exactly 2 classes, found {:?}", target.classes()),
            ));
        }
        columns.insert(TARGET_COLUMN.to_string(), target);

        Ok(Self { columns })
    }

    pub fn encoder(&self, column: &str) -> Option<&LabelEncoder> {
        self.columns.get(column)
    }

    /// Code for `label` in `column`, or ValidationError if unseen
    pub fn encode(&self, column: &str, label: &str) -> ChurnResult<usize> {
        let enc = self.columns.get(column).ok_or_else(|| {
            ChurnError::validation(column, "column has no fitted encoder")
        })?;
        enc.encode(label).ok_or_else(|| {
            ChurnError::validation(
                column,
                format!("unseen category '{label}' (known: {})", enc.classes().join(", ")),
            )
        })
    }

    /// Assemble the canonical 10-wide feature vector for a customer.
    /// Numeric columns come first, then the categorical codes.
    pub fn encode_record(&self, customer: &CustomerRecord) -> ChurnResult<FeatureVector> {
        let mut values: Vec<f32> = customer.numeric_values().to_vec();
        for (column, label) in CATEGORICAL_COLUMNS.iter().zip(customer.categorical_values()) {
            values.push(self.encode(column, label)? as f32);
        }
        Ok(FeatureVector::new(values))
    }

    /// Target label as 0.0 / 1.0
    pub fn encode_target(&self, label: &str) -> ChurnResult<f32> {
        Ok(self.encode(TARGET_COLUMN, label)? as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::FEATURE_WIDTH;

    fn row(contract: &str, churn: &str) -> ChurnRow {
        ChurnRow {
            customer: CustomerRecord {
                tenure:            5.0,
                monthly_charges:   70.0,
                total_charges:     350.0,
                senior_citizen:    0.0,
                contract:          contract.into(),
                payment_method:    "Electronic check".into(),
                internet_service:  "Fiber optic".into(),
                online_security:   "No".into(),
                tech_support:      "No".into(),
                paperless_billing: "Yes".into(),
            },
            churn: churn.into(),
        }
    }

    #[test]
    fn test_codes_follow_sorted_order() {
        let enc = LabelEncoder::fit(["Two year", "Month-to-month", "One year", "Month-to-month"]);
        assert_eq!(enc.encode("Month-to-month"), Some(0));
        assert_eq!(enc.encode("One year"), Some(1));
        assert_eq!(enc.encode("Two year"), Some(2));
        assert_eq!(enc.decode(2), Some("Two year"));
    }

    #[test]
    fn test_record_encodes_to_full_width() {
        let rows  = vec![row("Two year", "No"), row("Month-to-month", "Yes")];
        let table = EncodingTable::fit(&rows).unwrap();
        let v     = table.encode_record(&rows[0].customer).unwrap();
        assert_eq!(v.len(), FEATURE_WIDTH);
        assert_eq!(&v.as_slice()[..4], &[5.0, 70.0, 350.0, 0.0]);
        assert_eq!(v.as_slice()[4], 1.0);
    }

    #[test]
    fn test_unseen_category_is_validation_error() {
        let rows  = vec![row("Two year", "No"), row("One year", "Yes")];
        let table = EncodingTable::fit(&rows).unwrap();
        let mut c = rows[0].customer.clone();
        c.contract = "Month-to-month".into();
        match table.encode_record(&c) {
            Err(ChurnError::Validation { field, .. }) => assert_eq!(field, "Contract"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_target_must_be_binary() {
        let rows = vec![row("Two year", "No"), row("One year", "No")];
        assert!(EncodingTable::fit(&rows).is_err());
    }

    #[test]
    fn test_target_encoding() {
        let rows  = vec![row("Two year", "No"), row("One year", "Yes")];
        let table = EncodingTable::fit(&rows).unwrap();
        assert_eq!(table.encode_target("No").unwrap(), 0.0);
        assert_eq!(table.encode_target("Yes").unwrap(), 1.0);
    }

    #[test]
    fn test_table_survives_json_round_trip() {
        let rows  = vec![row("Two year", "No"), row("One year", "Yes")];
        let table = EncodingTable::fit(&rows).unwrap();
        let json  = serde_json::to_string(&table).unwrap();
        let back: EncodingTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, back);
    }
}
