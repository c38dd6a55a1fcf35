use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Share of predictions equal to the truth; 0 for an empty set
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassMetrics {
    pub class: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class precision, recall and F1 over a held-out set.
///
/// A ratio with a zero denominator is reported as 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    pub fn compute(y_true: &[usize], y_pred: &[usize], class_names: &[String]) -> Self {
        let classes: Vec<ClassMetrics> = class_names
            .iter()
            .enumerate()
            .map(|(k, name)| {
                let pairs = || y_true.iter().zip(y_pred);
                let tp = pairs().filter(|(t, p)| **t == k && **p == k).count();
                let predicted = y_pred.iter().filter(|p| **p == k).count();
                let support = y_true.iter().filter(|t| **t == k).count();

                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassMetrics {
                    class: name.clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let n_classes = classes.len().max(1) as f64;
        let macro_avg = AveragedMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n_classes,
        };

        let total = y_true.len();
        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|c| metric(c) * c.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = AveragedMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
        };

        Self {
            accuracy: accuracy(y_true, y_pred),
            classes,
            macro_avg,
            weighted_avg,
            support: total,
        }
    }
}

impl Display for ClassificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.class.len())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.class, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (label, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}

/// Normalised split gain of one feature
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Pairs names with importances, highest first; ties keep column order
pub fn rank_features(names: &[String], importance: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = names
        .iter()
        .zip(importance)
        .map(|(name, &importance)| FeatureImportance {
            feature: name.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names() -> Vec<String> {
        ["Dosa", "Idli", "biryani"].map(String::from).to_vec()
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 2, 2], &[0, 1, 1, 2]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_report_per_class() {
        let y_true = [0, 0, 1, 1, 2];
        let y_pred = [0, 1, 1, 1, 1];
        let report = ClassificationReport::compute(&y_true, &y_pred, &names());

        assert_eq!(report.classes[0].precision, 1.0);
        assert_eq!(report.classes[0].recall, 0.5);
        assert!((report.classes[1].precision - 0.5).abs() < 1e-12);
        assert_eq!(report.classes[1].recall, 1.0);
        // Never predicted: zero division yields 0
        assert_eq!(report.classes[2].precision, 0.0);
        assert_eq!(report.classes[2].f1, 0.0);
        assert_eq!(report.classes[2].support, 1);
        assert_eq!(report.support, 5);
        assert!((report.accuracy - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_report_renders_every_class() {
        let report = ClassificationReport::compute(&[0, 1], &[0, 1], &names());
        let text = report.to_string();
        for name in names() {
            assert!(text.contains(&name));
        }
        assert!(text.contains("weighted avg"));
        assert!(text.contains("accuracy"));
    }

    #[test]
    fn test_rank_features_descending() {
        let names = ["a", "b", "c"].map(String::from).to_vec();
        let ranked = rank_features(&names, &[0.2, 0.5, 0.3]);
        let order: Vec<&str> = ranked.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }
}
