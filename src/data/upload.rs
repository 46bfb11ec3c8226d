//! Uploaded customer files
//!
//! A CSV upload is parsed into a string frame (kept for display), checked
//! against the required columns, then each row is assembled into a
//! [`FeatureRecord`] on its own so one bad row never hides the others.

use serde::Serialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::features::record::{
    AGE, CONTRACT, INTERNET_SERVICE, MONTHLY_CHARGES, PAYMENT_METHOD, TENURE, TOTAL_CHARGES,
};
use crate::features::{
    Contract, FeatureRecord, FeatureTable, InternetService, PaymentMethod, Vocabulary,
    REQUIRED_COLUMNS,
};
use crate::{ChurnError, Result};

/// Why a single uploaded row cannot be used for inference
///
/// Rows are numbered from 1, not counting the header.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum RowIssue {
    #[error("row {row}: unknown {column} value {value:?}")]
    UnknownCategory {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: missing value for {column}")]
    Missing { row: usize, column: &'static str },

    #[error("row {row}: {column} value {value:?} is not a number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: {column} value {value} is out of range")]
    OutOfRange {
        row: usize,
        column: &'static str,
        value: String,
    },
}

impl RowIssue {
    pub fn row(&self) -> usize {
        match self {
            RowIssue::UnknownCategory { row, .. }
            | RowIssue::Missing { row, .. }
            | RowIssue::InvalidNumber { row, .. }
            | RowIssue::OutOfRange { row, .. } => *row,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            RowIssue::UnknownCategory { column, .. }
            | RowIssue::Missing { column, .. }
            | RowIssue::InvalidNumber { column, .. }
            | RowIssue::OutOfRange { column, .. } => column,
        }
    }
}

/// Raw uploaded table, all cells as trimmed strings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadedFrame {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl UploadedFrame {
    /// Parse comma-separated data with a header row
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        log::debug!("Parsed upload: {} columns, {} rows", headers.len(), rows.len());
        Ok(UploadedFrame { headers, rows })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::parse(bytes)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::parse(std::io::BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows
    pub fn preview(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Position of the first column with this name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Required columns absent from the header, in model input order
    pub fn missing_columns(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| self.column_index(c).is_none())
            .collect()
    }
}

/// Positions of the required columns within an uploaded frame
#[derive(Debug, Clone, Copy)]
struct ColumnPositions([usize; FeatureRecord::DIM]);

impl ColumnPositions {
    fn resolve(frame: &UploadedFrame) -> Result<Self> {
        let missing = frame.missing_columns();
        if !missing.is_empty() {
            return Err(ChurnError::Schema {
                missing: missing.into_iter().map(String::from).collect(),
            });
        }

        let mut positions = [0; FeatureRecord::DIM];
        for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            // Presence was checked above
            *slot = frame.column_index(name).unwrap_or_default();
        }
        Ok(ColumnPositions(positions))
    }

    fn of(&self, column: &str) -> usize {
        let idx = REQUIRED_COLUMNS
            .iter()
            .position(|c| *c == column)
            .unwrap_or_default();
        self.0[idx]
    }
}

/// Schema-checked upload with one assembly result per row, in file order
#[derive(Debug, Clone)]
pub struct AssembledUpload {
    pub frame: UploadedFrame,
    pub entries: Vec<std::result::Result<FeatureRecord, RowIssue>>,
    positions: ColumnPositions,
}

impl AssembledUpload {
    /// Validate the schema and assemble every row
    ///
    /// Fails with [`ChurnError::Schema`] before touching any row when a
    /// required column is missing.
    pub fn assemble(frame: UploadedFrame) -> Result<Self> {
        let positions = ColumnPositions::resolve(&frame)?;

        let entries = frame
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| assemble_row(i + 1, row, &positions))
            .collect::<Vec<_>>();

        for issue in entries.iter().filter_map(|e| e.as_ref().err()) {
            log::warn!("Rejected {}", issue);
        }

        Ok(AssembledUpload {
            frame,
            entries,
            positions,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accepted records in file order
    pub fn table(&self) -> FeatureTable {
        FeatureTable::new(
            self.entries
                .iter()
                .filter_map(|e| e.as_ref().ok().copied())
                .collect(),
        )
    }

    pub fn issues(&self) -> Vec<&RowIssue> {
        self.entries.iter().filter_map(|e| e.as_ref().err()).collect()
    }

    /// Fail on the first rejected row
    pub fn ensure_all_accepted(&self) -> Result<()> {
        match self.issues().first() {
            Some(issue) => Err(ChurnError::InvalidRow((*issue).clone())),
            None => Ok(()),
        }
    }

    /// Row `i` as displayed with results: categorical cells replaced by
    /// their codes for accepted rows, raw cells otherwise
    pub fn encoded_row(&self, i: usize) -> Vec<String> {
        let mut row = self.frame.rows[i].clone();
        if let Ok(record) = &self.entries[i] {
            let (contract, payment, internet) = record.codes();
            for (column, code) in [
                (CONTRACT, contract),
                (PAYMENT_METHOD, payment),
                (INTERNET_SERVICE, internet),
            ] {
                row[self.positions.of(column)] = code.to_string();
            }
        }
        row
    }
}

fn assemble_row(
    row_number: usize,
    row: &[String],
    positions: &ColumnPositions,
) -> std::result::Result<FeatureRecord, RowIssue> {
    let get = |column: &'static str| cell(row, positions, row_number, column);

    let age = parse_count(row_number, AGE, get(AGE)?)?;
    let tenure = parse_count(row_number, TENURE, get(TENURE)?)?;
    let monthly_charges = parse_amount(row_number, MONTHLY_CHARGES, get(MONTHLY_CHARGES)?)?;
    let total_charges = parse_amount(row_number, TOTAL_CHARGES, get(TOTAL_CHARGES)?)?;
    let contract = parse_category::<Contract>(row_number, get(CONTRACT)?)?;
    let payment_method = parse_category::<PaymentMethod>(row_number, get(PAYMENT_METHOD)?)?;
    let internet_service = parse_category::<InternetService>(row_number, get(INTERNET_SERVICE)?)?;

    let record = FeatureRecord {
        age,
        tenure,
        monthly_charges,
        total_charges,
        contract,
        payment_method,
        internet_service,
    };

    match record.out_of_range_column() {
        Some(column) => Err(RowIssue::OutOfRange {
            row: row_number,
            column,
            value: row[positions.of(column)].clone(),
        }),
        None => Ok(record),
    }
}

fn cell<'a>(
    row: &'a [String],
    positions: &ColumnPositions,
    row_number: usize,
    column: &'static str,
) -> std::result::Result<&'a str, RowIssue> {
    let value = row
        .get(positions.of(column))
        .map(|v| v.as_str())
        .unwrap_or_default();
    if value.is_empty() {
        Err(RowIssue::Missing {
            row: row_number,
            column,
        })
    } else {
        Ok(value)
    }
}

/// Whole number, also accepting a float with no fractional part ("35.0")
fn parse_count(
    row: usize,
    column: &'static str,
    value: &str,
) -> std::result::Result<u32, RowIssue> {
    let parsed = match value.parse::<i64>() {
        Ok(v) => v,
        Err(_) => match value.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 => v as i64,
            _ => {
                return Err(RowIssue::InvalidNumber {
                    row,
                    column,
                    value: value.to_string(),
                })
            }
        },
    };

    u32::try_from(parsed).map_err(|_| RowIssue::OutOfRange {
        row,
        column,
        value: value.to_string(),
    })
}

fn parse_amount(
    row: usize,
    column: &'static str,
    value: &str,
) -> std::result::Result<f64, RowIssue> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RowIssue::InvalidNumber {
            row,
            column,
            value: value.to_string(),
        }),
    }
}

fn parse_category<V: Vocabulary>(row: usize, value: &str) -> std::result::Result<V, RowIssue> {
    V::from_label(value).ok_or_else(|| RowIssue::UnknownCategory {
        row,
        column: V::FEATURE.column(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Age,Tenure,MonthlyCharges,TotalCharges,Contract,PaymentMethod,InternetService";

    fn assemble(csv: &str) -> Result<AssembledUpload> {
        AssembledUpload::assemble(UploadedFrame::from_bytes(csv.as_bytes())?)
    }

    #[test]
    fn test_valid_upload() {
        let csv = format!(
            "{}\n35,24,50.0,1200.0,Month-to-Month,Electronic Check,DSL\n61,70,99.9,6900,Two Year,Credit Card,None\n",
            HEADER
        );
        let upload = assemble(&csv).unwrap();

        assert_eq!(upload.len(), 2);
        assert!(upload.issues().is_empty());

        let table = upload.table();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.records()[0].to_vec(),
            vec![35.0, 24.0, 50.0, 1200.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(table.records()[1].codes(), (2, 3, 2));
    }

    #[test]
    fn test_missing_total_charges_is_schema_error() {
        let csv = "Age,Tenure,MonthlyCharges,Contract,PaymentMethod,InternetService\n\
                   35,24,50.0,Month-to-Month,Electronic Check,DSL\n";
        match assemble(csv) {
            Err(ChurnError::Schema { missing }) => assert_eq!(missing, vec!["TotalCharges"]),
            other => panic!("expected schema error, got {:?}", other.map(|u| u.len())),
        }
    }

    #[test]
    fn test_each_missing_column_is_detected() {
        for skip in 0..REQUIRED_COLUMNS.len() {
            let header: Vec<&str> = REQUIRED_COLUMNS
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, c)| *c)
                .collect();
            let csv = format!("{}\n", header.join(","));

            match assemble(&csv) {
                Err(ChurnError::Schema { missing }) => {
                    assert_eq!(missing, vec![REQUIRED_COLUMNS[skip].to_string()])
                }
                _ => panic!("missing {} not detected", REQUIRED_COLUMNS[skip]),
            }
        }
    }

    #[test]
    fn test_empty_input_is_schema_error() {
        match assemble("") {
            Err(ChurnError::Schema { missing }) => assert_eq!(missing.len(), 7),
            _ => panic!("expected schema error"),
        }
    }

    #[test]
    fn test_unknown_category_is_flagged() {
        let csv = format!(
            "{}\n35,24,50.0,1200.0,Month-to-Month,Electronic Check,Satellite\n",
            HEADER
        );
        let upload = assemble(&csv).unwrap();

        assert!(upload.table().is_empty());
        assert_eq!(
            upload.entries[0],
            Err(RowIssue::UnknownCategory {
                row: 1,
                column: "InternetService",
                value: "Satellite".to_string(),
            })
        );
        assert!(matches!(
            upload.ensure_all_accepted(),
            Err(ChurnError::InvalidRow(RowIssue::UnknownCategory { .. }))
        ));
    }

    #[test]
    fn test_row_issues_are_per_row() {
        let csv = format!(
            "{}\n\
             35,24,50.0,1200.0,Month-to-Month,Electronic Check,DSL\n\
             abc,24,50.0,1200.0,Month-to-Month,Electronic Check,DSL\n\
             35,,50.0,1200.0,Month-to-Month,Electronic Check,DSL\n\
             12,24,50.0,1200.0,Month-to-Month,Electronic Check,DSL\n\
             35,24,-5,1200.0,Month-to-Month,Electronic Check,DSL\n\
             40,80,50.0,1200.0,One Year,Mailed Check,Fiber Optic\n\
             35.0,-1,50.0,1200.0,Month-to-Month,Electronic Check,DSL\n\
             35,24,50.0,1200.0,Monthly,Electronic Check,DSL\n",
            HEADER
        );
        let upload = assemble(&csv).unwrap();

        assert_eq!(upload.len(), 8);
        assert_eq!(upload.table().len(), 1);

        let issues = upload.issues();
        assert_eq!(issues.len(), 7);
        assert!(matches!(issues[0], RowIssue::InvalidNumber { row: 2, column: "Age", .. }));
        assert!(matches!(issues[1], RowIssue::Missing { row: 3, column: "Tenure" }));
        assert!(matches!(issues[2], RowIssue::OutOfRange { row: 4, column: "Age", .. }));
        assert!(matches!(issues[3], RowIssue::OutOfRange { row: 5, column: "MonthlyCharges", .. }));
        assert!(matches!(issues[4], RowIssue::OutOfRange { row: 6, column: "Tenure", .. }));
        assert!(matches!(issues[5], RowIssue::OutOfRange { row: 7, column: "Tenure", .. }));
        assert!(matches!(issues[6], RowIssue::UnknownCategory { row: 8, column: "Contract", .. }));
        assert_eq!(issues[6].row(), 8);
    }

    #[test]
    fn test_extra_columns_and_reordering() {
        let csv = "CustomerID,InternetService,Contract,PaymentMethod,TotalCharges,MonthlyCharges,Tenure,Age\n\
                   C-1, Fiber Optic ,One Year,Bank Transfer,300,30,10,45\n";
        let upload = assemble(csv).unwrap();

        let record = upload.table().records()[0];
        assert_eq!(record.age, 45);
        assert_eq!(record.tenure, 10);
        assert_eq!(record.monthly_charges, 30.0);
        assert_eq!(record.codes(), (1, 2, 1));

        // Extra column carried through, categoricals encoded in place
        assert_eq!(
            upload.encoded_row(0),
            vec!["C-1", "1", "1", "2", "300", "30", "10", "45"]
        );
    }

    #[test]
    fn test_rejected_row_keeps_raw_cells() {
        let csv = format!("{}\n35,24,50.0,1200.0,Month-to-Month,Cash,DSL\n", HEADER);
        let upload = assemble(&csv).unwrap();
        assert_eq!(upload.encoded_row(0)[5], "Cash");
    }

    #[test]
    fn test_header_only_upload_has_no_rows() {
        let upload = assemble(&format!("{}\n", HEADER)).unwrap();
        assert!(upload.is_empty());
        assert!(upload.table().is_empty());
        assert!(upload.ensure_all_accepted().is_ok());
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let csv = format!("{}\n35,24\n", HEADER);
        assert!(matches!(
            UploadedFrame::from_bytes(csv.as_bytes()),
            Err(ChurnError::Csv(_))
        ));
    }

    #[test]
    fn test_preview_limits_rows() {
        let mut csv = format!("{}\n", HEADER);
        for _ in 0..8 {
            csv.push_str("35,24,50.0,1200.0,Month-to-Month,Electronic Check,DSL\n");
        }
        let frame = UploadedFrame::from_bytes(csv.as_bytes()).unwrap();
        assert_eq!(frame.preview(5).len(), 5);
        assert_eq!(frame.preview(50).len(), 8);
    }
}
