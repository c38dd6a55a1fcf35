//! Multiclass meal classifier.
//!
//! Feature vectors are min-max scaled, then fed to a gradient-boosted tree
//! ensemble. The scaler and label encoder are fitted once at training and
//! travel with the trained model.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub mod boosting;
pub mod metrics;
pub mod preprocessing;

pub use boosting::{BoosterParams, GradientBoostedTrees};
pub use metrics::{ClassificationReport, FeatureImportance};
pub use preprocessing::{LabelEncoder, MinMaxScaler};

/// Training hyperparameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub lambda: f64,
    pub min_child_weight: f64,
    pub random_seed: u64,
    /// Share of each class held out for evaluation
    pub test_fraction: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            lambda: 1.0,
            min_child_weight: 1.0,
            random_seed: 42,
            test_fraction: 0.2,
        }
    }
}

impl ClassifierParams {
    fn booster(&self) -> BoosterParams {
        BoosterParams {
            n_estimators: self.n_estimators,
            learning_rate: self.learning_rate,
            max_depth: self.max_depth,
            lambda: self.lambda,
            min_child_weight: self.min_child_weight,
        }
    }
}

/// Held-out evaluation of a freshly trained classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingReport {
    pub accuracy: f64,
    pub train_size: usize,
    pub test_size: usize,
    pub report: ClassificationReport,
    /// Highest first
    pub feature_importance: Vec<FeatureImportance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealClassifier {
    encoder: LabelEncoder,
    scaler: MinMaxScaler,
    booster: GradientBoostedTrees,
    feature_names: Vec<String>,
}

impl MealClassifier {
    /// Trains on `rows` (unscaled) with labels already encoded by `encoder`.
    ///
    /// Holds out a stratified test share and reports accuracy, per-class
    /// metrics and feature importance on it.
    pub fn train(
        encoder: LabelEncoder,
        feature_names: &[&str],
        rows: &[Vec<f64>],
        labels: &[usize],
        params: &ClassifierParams,
    ) -> AppResult<(Self, TrainingReport)> {
        if rows.is_empty() {
            return Err(AppError::EmptyHistory);
        }
        if rows.len() != labels.len() {
            return Err(AppError::InvalidInput(format!(
                "{} feature rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if let Some(bad) = labels.iter().find(|&&l| l >= encoder.len()) {
            return Err(AppError::InvalidInput(format!("label code {} out of range", bad)));
        }

        let scaler = MinMaxScaler::fit(rows)?;
        if scaler.width() != feature_names.len() {
            return Err(AppError::InvalidInput(format!(
                "{} feature columns but {} names",
                scaler.width(),
                feature_names.len()
            )));
        }
        let scaled: Vec<Vec<f64>> = rows.iter().map(|r| scaler.transform(r)).collect();

        let (train_idx, test_idx) =
            preprocessing::stratified_split(labels, params.test_fraction, params.random_seed);
        let pick = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<usize>) {
            idx.iter().map(|&i| (scaled[i].clone(), labels[i])).unzip()
        };
        let (x_train, y_train) = pick(&train_idx);
        let (x_test, y_test) = pick(&test_idx);

        tracing::info!(
            train_size = y_train.len(),
            test_size = y_test.len(),
            classes = encoder.len(),
            features = feature_names.len(),
            "Fitting gradient-boosted trees"
        );

        let booster =
            GradientBoostedTrees::fit(&x_train, &y_train, encoder.len(), &params.booster());

        let classifier = Self {
            encoder,
            scaler,
            booster,
            feature_names: feature_names.iter().map(|s| s.to_string()).collect(),
        };

        let y_pred: Vec<usize> = x_test
            .iter()
            .map(|row| argmax(&classifier.booster.predict_proba(row)))
            .collect();
        if y_test.is_empty() {
            tracing::warn!("No rows held out for evaluation; accuracy reported as 0");
        }

        let report = ClassificationReport::compute(&y_test, &y_pred, classifier.encoder.classes());
        let importance = classifier.booster.feature_importance();
        let feature_importance = metrics::rank_features(&classifier.feature_names, &importance);

        let training = TrainingReport {
            accuracy: report.accuracy,
            train_size: y_train.len(),
            test_size: y_test.len(),
            report,
            feature_importance,
        };

        Ok((classifier, training))
    }

    /// Probability per known class, in encoder order; sums to 1
    pub fn predict_proba(&self, row: &[f64]) -> AppResult<Vec<f64>> {
        if row.len() != self.scaler.width() {
            return Err(AppError::InvalidInput(format!(
                "feature row has {} columns, expected {}",
                row.len(),
                self.scaler.width()
            )));
        }
        Ok(self.booster.predict_proba(&self.scaler.transform(row)))
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    pub fn classes(&self) -> &[String] {
        self.encoder.classes()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

/// Index of the largest value; ties go to the lowest index
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> (LabelEncoder, Vec<Vec<f64>>, Vec<usize>) {
        let encoder = LabelEncoder::fit(["Dosa", "Idli", "biryani"]);
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..60 {
            let class = i % 3;
            // Class is readable from the first column; the second is noise
            rows.push(vec![class as f64 * 10.0 + (i % 5) as f64, (i % 7) as f64]);
            labels.push(class);
        }
        (encoder, rows, labels)
    }

    #[test]
    fn test_train_reports_holdout_metrics() {
        let (encoder, rows, labels) = dataset();
        let params = ClassifierParams {
            n_estimators: 20,
            ..ClassifierParams::default()
        };
        let (classifier, report) =
            MealClassifier::train(encoder, &["signal", "noise"], &rows, &labels, &params).unwrap();

        assert_eq!(report.test_size, 12);
        assert_eq!(report.train_size, 48);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.report.classes.len(), 3);
        assert_eq!(report.feature_importance[0].feature, "signal");
        assert_eq!(classifier.classes(), &["Dosa", "Idli", "biryani"]);
    }

    #[test]
    fn test_predict_proba_distribution() {
        let (encoder, rows, labels) = dataset();
        let params = ClassifierParams {
            n_estimators: 20,
            ..ClassifierParams::default()
        };
        let (classifier, _) =
            MealClassifier::train(encoder, &["signal", "noise"], &rows, &labels, &params).unwrap();

        let p = classifier.predict_proba(&[21.0, 3.0]).unwrap();
        assert_eq!(p.len(), 3);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(argmax(&p), 2);

        assert!(matches!(
            classifier.predict_proba(&[1.0]),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_train_rejects_empty_and_mismatched() {
        let encoder = LabelEncoder::fit(["Dosa"]);
        let params = ClassifierParams::default();
        assert!(matches!(
            MealClassifier::train(encoder.clone(), &["a"], &[], &[], &params),
            Err(AppError::EmptyHistory)
        ));
        assert!(matches!(
            MealClassifier::train(encoder, &["a"], &[vec![1.0]], &[0, 0], &params),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_argmax_ties_take_first() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
    }
}
