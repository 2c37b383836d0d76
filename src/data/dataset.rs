// ============================================================
// Layer 4 - Churn Dataset
// ============================================================
// Turns the raw CSV text into typed rows, and typed rows into
// numeric samples the trainer can batch.
//
//   CSV text ──parse_rows──▶ Vec<ChurnRow> ──encode──▶ ChurnDataset
//
// Column lookup goes by header name, so extra columns (gender,
// Partner, ...) and any column order are accepted. Rows with a
// blank or non-numeric value in a numeric column are skipped and
// counted; every other malformed row fails the whole parse.

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::encoder::EncodingTable;
use crate::data::preprocessor::Preprocessor;
use crate::domain::customer::{CustomerRecord, FEATURE_COLUMNS, NUMERIC_COLUMNS, TARGET_COLUMN};
use crate::domain::error::{ChurnError, ChurnResult};

/// One labelled dataset row before encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnRow {
    pub customer: CustomerRecord,
    /// Raw target label ("Yes" / "No")
    pub churn: String,
}

/// Parse result plus how many rows were dropped
#[derive(Debug, Clone)]
pub struct ParsedRows {
    pub rows:    Vec<ChurnRow>,
    pub skipped: usize,
}

pub fn parse_rows(csv_text: &str) -> ChurnResult<ParsedRows> {
    let prep = Preprocessor::new();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(false)
        .from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ChurnError::validation("dataset", format!("unreadable header row: {e}")))?
        .iter()
        .map(|h| prep.clean_header(h))
        .collect();

    // Resolve every required column to its index once
    let column_index = |name: &str| -> ChurnResult<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ChurnError::validation("dataset", format!("missing column '{name}'")))
    };
    let feature_idx: Vec<usize> = FEATURE_COLUMNS
        .iter()
        .map(|&c| column_index(c))
        .collect::<ChurnResult<_>>()?;
    let target_idx = column_index(TARGET_COLUMN)?;

    let mut rows    = Vec::new();
    let mut skipped = 0usize;

    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            ChurnError::validation("dataset", format!("malformed row {}: {e}", line + 2))
        })?;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let numeric: Option<Vec<f32>> = feature_idx[..NUMERIC_COLUMNS.len()]
            .iter()
            .map(|&i| prep.parse_numeric(cell(i)))
            .collect();
        let Some(numeric) = numeric else {
            skipped += 1;
            continue;
        };

        let label = |i: usize| prep.clean_label(cell(feature_idx[i]));
        rows.push(ChurnRow {
            customer: CustomerRecord {
                tenure:            numeric[0],
                monthly_charges:   numeric[1],
                total_charges:     numeric[2],
                senior_citizen:    numeric[3],
                contract:          label(4),
                payment_method:    label(5),
                internet_service:  label(6),
                online_security:   label(7),
                tech_support:      label(8),
                paperless_billing: label(9),
            },
            churn: prep.clean_label(cell(target_idx)),
        });
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} rows with blank or non-numeric numeric fields", skipped);
    }
    if rows.is_empty() {
        return Err(ChurnError::validation("dataset", "no usable rows"));
    }

    Ok(ParsedRows { rows, skipped })
}

/// One encoded training example
#[derive(Debug, Clone, PartialEq)]
pub struct ChurnSample {
    pub features: Vec<f32>,
    /// 0.0 = stays, 1.0 = churns
    pub label: f32,
}

pub struct ChurnDataset {
    samples: Vec<ChurnSample>,
}

impl ChurnDataset {
    pub fn new(samples: Vec<ChurnSample>) -> Self {
        Self { samples }
    }

    /// Encode every row through the fitted table
    pub fn encode(rows: &[ChurnRow], table: &EncodingTable) -> ChurnResult<Self> {
        let samples = rows
            .iter()
            .map(|r| {
                Ok(ChurnSample {
                    features: table.encode_record(&r.customer)?.into_inner(),
                    label:    table.encode_target(&r.churn)?,
                })
            })
            .collect::<ChurnResult<Vec<_>>>()?;
        Ok(Self { samples })
    }

    pub fn into_samples(self) -> Vec<ChurnSample> {
        self.samples
    }

    /// Feature rows only, for fitting the scaler
    pub fn feature_rows(&self) -> Vec<Vec<f32>> {
        self.samples.iter().map(|s| s.features.clone()).collect()
    }

    /// Fraction of positive labels
    pub fn churn_rate(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let positives = self.samples.iter().filter(|s| s.label > 0.5).count();
        positives as f64 / self.samples.len() as f64
    }
}

// ─── Burn Dataset Trait Implementation ────────────────────────────────────────
impl Dataset<ChurnSample> for ChurnDataset {
    fn get(&self, index: usize) -> Option<ChurnSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_CSV: &str = "\
customerID,gender,SeniorCitizen,tenure,Contract,PaymentMethod,InternetService,OnlineSecurity,TechSupport,PaperlessBilling,MonthlyCharges,TotalCharges,Churn
0001-A,Female,0,1,Month-to-month,Electronic check,DSL,No,No,Yes,29.85,29.85,No
0002-B,Male,0,34,One year,Mailed check,DSL,Yes,No,No,56.95,1889.5,No
0003-C,Male,0,2,Month-to-month,Mailed check,DSL,Yes,No,Yes,53.85,108.15,Yes
0004-D,Male,1,45,One year,Bank transfer (automatic),DSL,Yes,Yes,No,42.30,1840.75,No
0005-E,Female,0,0,Two year,Bank transfer (automatic),DSL,Yes,Yes,Yes,52.55, ,No
";

    #[test]
    fn test_parse_skips_blank_total_charges() {
        let parsed = parse_rows(SAMPLE_CSV).unwrap();
        assert_eq!(parsed.rows.len(), 4);
        assert_eq!(parsed.skipped, 1);
        let first = &parsed.rows[0];
        assert_eq!(first.customer.tenure, 1.0);
        assert_eq!(first.customer.contract, "Month-to-month");
        assert_eq!(first.churn, "No");
    }

    #[test]
    fn test_missing_column_is_reported() {
        let csv = "customerID,tenure,Churn\n1,2,No\n";
        match parse_rows(csv) {
            Err(ChurnError::Validation { message, .. }) => assert!(message.contains("MonthlyCharges")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_dataset() {
        let parsed  = parse_rows(SAMPLE_CSV).unwrap();
        let table   = EncodingTable::fit(&parsed.rows).unwrap();
        let dataset = ChurnDataset::encode(&parsed.rows, &table).unwrap();
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.get(2).map(|s| s.label), Some(1.0));
        assert!((dataset.churn_rate() - 0.25).abs() < 1e-9);
    }
}
