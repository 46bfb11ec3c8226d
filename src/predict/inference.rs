//! Model inference for predictions

use crate::data::{AssembledUpload, ManualInput};
use crate::features::FeatureTable;
use crate::model::{load_model, ChurnModel};
use crate::predict::report::{PredictionReport, ReportRow, RowOutcome};
use crate::{ChurnError, ChurnLabel, ModelConfig, Result};

/// Predictor holding the loaded model for the life of the process
pub struct Predictor {
    model: Box<dyn ChurnModel>,
}

impl Predictor {
    /// Create a new predictor
    pub fn new(model: Box<dyn ChurnModel>) -> Self {
        Predictor { model }
    }

    /// Load predictor from the configured artifact
    pub fn load(config: &ModelConfig) -> Result<Self> {
        Ok(Self::new(load_model(config)?))
    }

    pub fn model(&self) -> &dyn ChurnModel {
        self.model.as_ref()
    }

    /// Run the model once over a table
    ///
    /// Returns exactly one label per row, in row order. Any model failure or
    /// a label count that does not match the row count is an inference error.
    pub fn predict_table(&self, table: &FeatureTable) -> Result<Vec<ChurnLabel>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        log::debug!("Running inference on {} rows", table.len());
        let labels = self.model.predict(table).map_err(|e| match e {
            ChurnError::Inference(_) => e,
            other => ChurnError::Inference(other.to_string()),
        })?;

        if labels.len() != table.len() {
            return Err(ChurnError::Inference(format!(
                "model returned {} labels for {} rows",
                labels.len(),
                table.len()
            )));
        }
        Ok(labels)
    }

    /// Predict a single manually entered customer
    pub fn predict_manual(&self, input: &ManualInput) -> Result<ChurnLabel> {
        self.predict_table(&input.to_table())?
            .into_iter()
            .next()
            .ok_or_else(|| ChurnError::Inference("model returned no label".to_string()))
    }

    /// Predict every accepted row of an upload
    ///
    /// Accepted rows go to the model in a single call; labels are matched
    /// back by position so report row `i` is file row `i`.
    pub fn predict_upload(&self, upload: &AssembledUpload) -> Result<PredictionReport> {
        let labels = self.predict_table(&upload.table())?;
        let mut labels = labels.into_iter();

        let mut rows = Vec::with_capacity(upload.len());
        for (i, entry) in upload.entries.iter().enumerate() {
            let outcome = match entry {
                Ok(_) => RowOutcome::Predicted(labels.next().ok_or_else(|| {
                    ChurnError::Inference(format!("no label for row {}", i + 1))
                })?),
                Err(issue) => RowOutcome::Rejected(issue.clone()),
            };
            rows.push(ReportRow {
                values: upload.encoded_row(i),
                outcome,
            });
        }

        Ok(PredictionReport {
            headers: upload.frame.headers.clone(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UploadedFrame;
    use crate::features::{Contract, FeatureRecord};
    use crate::model::Forest;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Churns short-tenure month-to-month customers, counting calls
    struct RuleModel {
        calls: Rc<Cell<usize>>,
    }

    impl RuleModel {
        fn new() -> Self {
            RuleModel {
                calls: Rc::new(Cell::new(0)),
            }
        }

        fn rule(record: &FeatureRecord) -> ChurnLabel {
            if record.contract == Contract::MonthToMonth && record.tenure < 12 {
                ChurnLabel::Churn
            } else {
                ChurnLabel::NotChurn
            }
        }
    }

    impl ChurnModel for RuleModel {
        fn predict(&self, table: &FeatureTable) -> Result<Vec<ChurnLabel>> {
            self.calls.set(self.calls.get() + 1);
            Ok(table.records().iter().map(Self::rule).collect())
        }

        fn describe(&self) -> String {
            "rule".to_string()
        }
    }

    /// Always drops the last label
    struct ShortModel;

    impl ChurnModel for ShortModel {
        fn predict(&self, table: &FeatureTable) -> Result<Vec<ChurnLabel>> {
            Ok(vec![ChurnLabel::NotChurn; table.len() - 1])
        }

        fn describe(&self) -> String {
            "short".to_string()
        }
    }

    struct FailingModel;

    impl ChurnModel for FailingModel {
        fn predict(&self, _table: &FeatureTable) -> Result<Vec<ChurnLabel>> {
            Err(ChurnError::Model("shape mismatch".to_string()))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    fn upload(csv: &str) -> AssembledUpload {
        AssembledUpload::assemble(UploadedFrame::from_bytes(csv.as_bytes()).unwrap()).unwrap()
    }

    const CSV: &str = "CustomerID,Age,Tenure,MonthlyCharges,TotalCharges,Contract,PaymentMethod,InternetService\n\
                       A,35,3,50.0,150.0,Month-to-Month,Electronic Check,DSL\n\
                       B,50,40,80.0,3200.0,Two Year,Credit Card,Fiber Optic\n\
                       C,28,5,70.0,350.0,Month-to-Month,Mailed Check,Satellite\n\
                       D,44,1,20.0,20.0,Month-to-Month,Bank Transfer,None\n";

    #[test]
    fn test_predict_manual() {
        let predictor = Predictor::new(Box::new(RuleModel::new()));

        let stayer = ManualInput::default();
        assert_eq!(predictor.predict_manual(&stayer).unwrap(), ChurnLabel::NotChurn);

        let churner = ManualInput {
            tenure: 2,
            ..ManualInput::default()
        };
        assert_eq!(predictor.predict_manual(&churner).unwrap(), ChurnLabel::Churn);
    }

    #[test]
    fn test_upload_report_preserves_order() {
        let predictor = Predictor::new(Box::new(RuleModel::new()));
        let report = predictor.predict_upload(&upload(CSV)).unwrap();

        assert_eq!(report.rows.len(), 4);
        assert_eq!(
            report.labels(),
            vec![
                Some(ChurnLabel::Churn),
                Some(ChurnLabel::NotChurn),
                None,
                Some(ChurnLabel::Churn)
            ]
        );
        assert_eq!(report.rows[0].values[0], "A");
        assert_eq!(report.rows[3].values[0], "D");
        assert!(matches!(
            &report.rows[2].outcome,
            RowOutcome::Rejected(issue) if issue.column() == "InternetService"
        ));
    }

    #[test]
    fn test_single_model_call_per_upload() {
        let model = RuleModel::new();
        let calls = Rc::clone(&model.calls);
        let predictor = Predictor::new(Box::new(model));

        predictor.predict_upload(&upload(CSV)).unwrap();
        assert_eq!(calls.get(), 1);

        // Empty tables never reach the model
        predictor.predict_table(&FeatureTable::default()).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_empty_table_skips_model() {
        let predictor = Predictor::new(Box::new(FailingModel));
        assert!(predictor.predict_table(&FeatureTable::default()).unwrap().is_empty());
    }

    #[test]
    fn test_upload_is_idempotent() {
        let predictor = Predictor::new(Box::new(RuleModel::new()));
        let first = predictor.predict_upload(&upload(CSV)).unwrap();
        let second = predictor.predict_upload(&upload(CSV)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_label_count_mismatch_is_inference_error() {
        let predictor = Predictor::new(Box::new(ShortModel));
        let err = predictor.predict_upload(&upload(CSV)).unwrap_err();
        assert!(matches!(err, ChurnError::Inference(_)));
    }

    #[test]
    fn test_model_failure_is_inference_error() {
        let predictor = Predictor::new(Box::new(FailingModel));
        match predictor.predict_manual(&ManualInput::default()) {
            Err(ChurnError::Inference(msg)) => assert!(msg.contains("shape mismatch")),
            other => panic!("expected inference error, got {:?}", other),
        }
    }

    #[test]
    fn test_with_forest_model() {
        let forest = Forest::from_json(
            r#"{"trees": [{"nodes": [
                {"feature": 1, "threshold": 12.0, "left": 1, "right": 2},
                {"value": [0.0, 1.0]},
                {"value": [1.0, 0.0]}
            ]}]}"#,
        )
        .unwrap();
        let predictor = Predictor::new(Box::new(forest));
        let report = predictor.predict_upload(&upload(CSV)).unwrap();
        assert_eq!(report.predicted_count(), 3);
        assert_eq!(report.rejected_count(), 1);
        assert_eq!(report.labels()[1], Some(ChurnLabel::NotChurn));
        assert_eq!(predictor.model().describe(), "tree ensemble: 1 trees, 3 nodes");
    }

    #[test]
    fn test_bundled_artifact_on_sample_file() {
        let root = env!("CARGO_MANIFEST_DIR");
        let mut config = crate::Config::default().model;
        config.path = format!("{}/model/churn_forest.json", root);
        let predictor = Predictor::load(&config).unwrap();

        let frame = UploadedFrame::from_path(format!("{}/samples/customers.csv", root)).unwrap();
        let upload = AssembledUpload::assemble(frame).unwrap();
        let report = predictor.predict_upload(&upload).unwrap();

        assert_eq!(report.rows.len(), 15);
        assert_eq!(report.rejected_count(), 1);
        assert!(report.labels()[14].is_none());
        assert_eq!(report.rows[0].values[5], "0");
    }
}
