use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};

/// Maps meal names to contiguous integer codes, in sorted name order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: BTreeSet<&str> = labels.into_iter().collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    /// Code of `label`, or [`AppError::UnknownLabel`] if it was not seen in fitting
    pub fn encode(&self, label: &str) -> AppResult<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| AppError::UnknownLabel(label.to_string()))
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Per-column min-max scaling to [0, 1] over the fitted data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    scale: Vec<f64>,
}

impl MinMaxScaler {
    pub fn fit(rows: &[Vec<f64>]) -> AppResult<Self> {
        let width = rows.first().map(Vec::len).ok_or(AppError::EmptyHistory)?;
        let mut min = vec![f64::INFINITY; width];
        let mut max = vec![f64::NEG_INFINITY; width];

        for row in rows {
            if row.len() != width {
                return Err(AppError::InvalidInput(format!(
                    "feature row has {} columns, expected {}",
                    row.len(),
                    width
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                min[j] = min[j].min(value);
                max[j] = max[j].max(value);
            }
        }

        // Constant columns map to 0
        let scale = min
            .iter()
            .zip(&max)
            .map(|(lo, hi)| if hi > lo { 1.0 / (hi - lo) } else { 1.0 })
            .collect();

        Ok(Self { min, scale })
    }

    pub fn width(&self) -> usize {
        self.min.len()
    }

    /// Scales one row; values outside the fitted range are not clipped
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.min.iter().zip(&self.scale))
            .map(|(x, (lo, scale))| (x - lo) * scale)
            .collect()
    }
}

/// Splits row indices into (train, test), holding out a share of every class.
///
/// Each class keeps at least one row in training; a class with two or more
/// rows puts at least one in the test set.
pub fn stratified_split(
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let n_classes = labels.iter().max().map_or(0, |m| m + 1);
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &label) in labels.iter().enumerate() {
        by_class[label].push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for mut indices in by_class.into_iter().filter(|c| !c.is_empty()) {
        indices.shuffle(&mut rng);
        let n = indices.len();
        let n_test = ((n as f64) * test_fraction)
            .round()
            .clamp(usize::from(n >= 2) as f64, (n - 1) as f64) as usize;
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}
