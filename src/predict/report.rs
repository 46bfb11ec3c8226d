//! Prediction results and their rendering
//!
//! Results are shown as the uploaded columns (categoricals encoded in place)
//! with one prediction column appended.

use serde::Serialize;

use crate::data::{RowIssue, UploadedFrame};
use crate::{ChurnError, ChurnLabel, Result};

pub const PREDICTION_COLUMN: &str = "Churn Prediction";

/// What happened to one uploaded row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    Predicted(ChurnLabel),
    Rejected(RowIssue),
}

impl RowOutcome {
    pub fn label(&self) -> Option<ChurnLabel> {
        match self {
            RowOutcome::Predicted(label) => Some(*label),
            RowOutcome::Rejected(_) => None,
        }
    }

    /// Text for the prediction column
    pub fn display(&self) -> String {
        match self {
            RowOutcome::Predicted(label) => label.to_string(),
            RowOutcome::Rejected(issue) => format!("Rejected: {}", issue),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// Input cells as displayed
    pub values: Vec<String>,
    pub outcome: RowOutcome,
}

/// Uploaded rows annotated with their predictions, in file order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    pub headers: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl PredictionReport {
    pub fn labels(&self) -> Vec<Option<ChurnLabel>> {
        self.rows.iter().map(|r| r.outcome.label()).collect()
    }

    pub fn predicted_count(&self) -> usize {
        self.rows.iter().filter(|r| r.outcome.label().is_some()).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.rows.len() - self.predicted_count()
    }

    pub fn churn_count(&self) -> usize {
        self.labels()
            .into_iter()
            .filter(|l| l.is_some_and(|l| l.is_churn()))
            .count()
    }

    fn headers_with_prediction(&self) -> Vec<String> {
        let mut headers = self.headers.clone();
        headers.push(PREDICTION_COLUMN.to_string());
        headers
    }

    fn cells(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                let mut cells = r.values.clone();
                cells.push(r.outcome.display());
                cells
            })
            .collect()
    }

    /// Aligned text table
    pub fn to_table_string(&self) -> String {
        render_table(&self.headers_with_prediction(), &self.cells())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.headers_with_prediction())?;
        for row in self.cells() {
            writer.write_record(&row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ChurnError::Io(e.into_error()))?;
        String::from_utf8(bytes)
            .map_err(|e| ChurnError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    pub fn to_json(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let input: serde_json::Map<String, serde_json::Value> = self
                    .headers
                    .iter()
                    .cloned()
                    .zip(row.values.iter().cloned().map(serde_json::Value::String))
                    .collect();
                match &row.outcome {
                    RowOutcome::Predicted(label) => serde_json::json!({
                        "row": i + 1,
                        "input": input,
                        "prediction": label.to_string(),
                        "code": label.code(),
                    }),
                    RowOutcome::Rejected(issue) => serde_json::json!({
                        "row": i + 1,
                        "input": input,
                        "prediction": null,
                        "issue": issue.to_string(),
                    }),
                }
            })
            .collect();

        serde_json::json!({
            "predicted": self.predicted_count(),
            "rejected": self.rejected_count(),
            "rows": rows,
        })
    }
}

/// First rows of the raw upload
pub fn format_preview(frame: &UploadedFrame, rows: usize) -> String {
    render_table(&frame.headers, frame.preview(rows))
}

/// Single-line result for a manual prediction
pub fn format_manual(label: ChurnLabel) -> String {
    format!("Prediction: {}", label)
}

/// Render rows as space-padded columns under a ruled header
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = rows
        .iter()
        .map(|r| r.len())
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);

    let mut widths = vec![0usize; columns];
    for row in std::iter::once(headers).chain(rows.iter().map(|r| r.as_slice())) {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let format_row = |row: &[String]| -> String {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect::<Vec<_>>()
            .join("  ");
        line.trim_end().to_string()
    };

    let total: usize = widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1);
    let mut out = String::new();
    out.push_str(&format_row(headers));
    out.push('\n');
    out.push_str(&"─".repeat(total));
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> PredictionReport {
        PredictionReport {
            headers: vec!["Age".to_string(), "Contract".to_string()],
            rows: vec![
                ReportRow {
                    values: vec!["35".to_string(), "0".to_string()],
                    outcome: RowOutcome::Predicted(ChurnLabel::Churn),
                },
                ReportRow {
                    values: vec!["61".to_string(), "Weekly".to_string()],
                    outcome: RowOutcome::Rejected(RowIssue::UnknownCategory {
                        row: 2,
                        column: "Contract",
                        value: "Weekly".to_string(),
                    }),
                },
                ReportRow {
                    values: vec!["40".to_string(), "2".to_string()],
                    outcome: RowOutcome::Predicted(ChurnLabel::NotChurn),
                },
            ],
        }
    }

    #[test]
    fn test_counts() {
        let report = report();
        assert_eq!(report.predicted_count(), 2);
        assert_eq!(report.rejected_count(), 1);
        assert_eq!(report.churn_count(), 1);
    }

    #[test]
    fn test_csv_output() {
        let csv = report().to_csv_string().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Age,Contract,Churn Prediction");
        assert_eq!(lines[1], "35,0,Churn");
        assert_eq!(
            lines[2],
            "61,Weekly,\"Rejected: row 2: unknown Contract value \"\"Weekly\"\"\""
        );
        assert_eq!(lines[3], "40,2,Not Churn");
    }

    #[test]
    fn test_json_output() {
        let json = report().to_json();
        assert_eq!(json["predicted"], 2);
        assert_eq!(json["rows"][0]["prediction"], "Churn");
        assert_eq!(json["rows"][0]["code"], 1);
        assert_eq!(json["rows"][0]["input"]["Age"], "35");
        assert!(json["rows"][1]["prediction"].is_null());
        assert_eq!(json["rows"][2]["row"], 3);
    }

    #[test]
    fn test_table_output() {
        let table = report().to_table_string();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Age  Contract  Churn Prediction"));
        assert!(lines[2].starts_with("35   0         Churn"));
        assert!(lines[1].chars().all(|c| c == '─'));
    }

    #[test]
    fn test_manual_line() {
        assert_eq!(format_manual(ChurnLabel::Churn), "Prediction: Churn");
        assert_eq!(format_manual(ChurnLabel::NotChurn), "Prediction: Not Churn");
    }

    #[test]
    fn test_preview() {
        let frame = UploadedFrame {
            headers: vec!["A".to_string(), "B".to_string()],
            rows: (0..10).map(|i| vec![i.to_string(), "x".to_string()]).collect(),
        };
        let preview = format_preview(&frame, 5);
        assert_eq!(preview.lines().count(), 7);
    }
}
