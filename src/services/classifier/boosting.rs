//! Gradient-boosted regression trees with a softmax objective.
//!
//! Every round fits one tree per class to the first and second derivatives
//! of the multiclass log loss. Splits are chosen greedily by exact
//! second-order gain.

use serde::{Deserialize, Serialize};

/// Hessians are floored here so leaf weights stay finite
const MIN_HESSIAN: f64 = 1e-16;

/// Smallest gain that justifies a split
const MIN_SPLIT_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoosterParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// L2 regularisation on leaf weights
    pub lambda: f64,
    /// Minimum hessian sum on each side of a split
    pub min_child_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Regression tree stored as a flat node list; node 0 is the root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn predict(&self, row: &[f64]) -> f64 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] < *threshold { *left } else { *right };
                }
            }
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeGrower<'a> {
    rows: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a BoosterParams,
    importance: &'a mut [f64],
    nodes: Vec<Node>,
}

impl TreeGrower<'_> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let g: f64 = indices.iter().map(|&i| self.grad[i]).sum();
        let h: f64 = indices.iter().map(|&i| self.hess[i]).sum();

        let at = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: -g / (h + self.params.lambda) * self.params.learning_rate,
        });

        if depth >= self.params.max_depth || indices.len() < 2 {
            return at;
        }

        if let Some(split) = self.best_split(&indices, g, h) {
            self.importance[split.feature] += split.gain;
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = indices
                .into_iter()
                .partition(|&i| self.rows[i][split.feature] < split.threshold);
            let left = self.grow(left_rows, depth + 1);
            let right = self.grow(right_rows, depth + 1);
            self.nodes[at] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
        }

        at
    }

    fn best_split(&self, indices: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
        let lambda = self.params.lambda;
        let parent = g * g / (h + lambda);
        let width = self.rows[indices[0]].len();
        let mut order = indices.to_vec();
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..width {
            order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let (mut gl, mut hl) = (0.0, 0.0);
            for pair in order.windows(2) {
                gl += self.grad[pair[0]];
                hl += self.hess[pair[0]];

                let value = self.rows[pair[0]][feature];
                let next = self.rows[pair[1]][feature];
                if value == next {
                    continue;
                }

                let (gr, hr) = (g - gl, h - hl);
                if hl < self.params.min_child_weight || hr < self.params.min_child_weight {
                    continue;
                }

                let gain = 0.5 * (gl * gl / (hl + lambda) + gr * gr / (hr + lambda) - parent);
                if gain > best.as_ref().map_or(MIN_SPLIT_GAIN, |b| b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (value + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// Trained boosted ensemble
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradientBoostedTrees {
    n_classes: usize,
    /// `rounds[r][k]` is the tree for class `k` in round `r`
    rounds: Vec<Vec<RegressionTree>>,
    /// Accumulated split gain per feature
    gain: Vec<f64>,
}

impl GradientBoostedTrees {
    /// Fits the ensemble; `labels[i]` must be below `n_classes`
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: &BoosterParams,
    ) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let n = rows.len();
        let mut margins = vec![vec![0.0; n_classes]; n];
        let mut gain = vec![0.0; width];
        let mut rounds = Vec::with_capacity(params.n_estimators);
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];

        for _ in 0..params.n_estimators {
            let probabilities: Vec<Vec<f64>> = margins.iter().map(|m| softmax(m)).collect();
            let mut trees = Vec::with_capacity(n_classes);

            for class in 0..n_classes {
                for i in 0..n {
                    let p = probabilities[i][class];
                    let y = if labels[i] == class { 1.0 } else { 0.0 };
                    grad[i] = p - y;
                    hess[i] = (2.0 * p * (1.0 - p)).max(MIN_HESSIAN);
                }

                let mut grower = TreeGrower {
                    rows,
                    grad: &grad,
                    hess: &hess,
                    params,
                    importance: &mut gain,
                    nodes: Vec::new(),
                };
                if n > 0 {
                    grower.grow((0..n).collect(), 0);
                } else {
                    grower.nodes.push(Node::Leaf { value: 0.0 });
                }
                trees.push(RegressionTree {
                    nodes: grower.nodes,
                });
            }

            for (row, margin) in rows.iter().zip(margins.iter_mut()) {
                for (class, tree) in trees.iter().enumerate() {
                    margin[class] += tree.predict(row);
                }
            }
            rounds.push(trees);
        }

        Self {
            n_classes,
            rounds,
            gain,
        }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Class probabilities for one scaled row; sums to 1
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut margin = vec![0.0; self.n_classes];
        for trees in &self.rounds {
            for (class, tree) in trees.iter().enumerate() {
                margin[class] += tree.predict(row);
            }
        }
        softmax(&margin)
    }

    /// Share of total split gain per feature; all zeros if no split was made
    pub fn feature_importance(&self) -> Vec<f64> {
        let total: f64 = self.gain.iter().sum();
        if total > 0.0 {
            self.gain.iter().map(|g| g / total).collect()
        } else {
            vec![0.0; self.gain.len()]
        }
    }
}

fn softmax(margin: &[f64]) -> Vec<f64> {
    let max = margin.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = margin.iter().map(|m| (m - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BoosterParams {
        BoosterParams {
            n_estimators: 30,
            learning_rate: 0.3,
            max_depth: 3,
            lambda: 1.0,
            min_child_weight: 0.1,
        }
    }

    /// Three well-separated clusters on the first feature
    fn clusters() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for class in 0..3 {
            for j in 0..8 {
                rows.push(vec![class as f64 + j as f64 * 0.01, 0.5]);
                labels.push(class);
            }
        }
        (rows, labels)
    }

    fn argmax(p: &[f64]) -> usize {
        p.iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);
        assert_eq!(softmax(&[0.0, 0.0]), vec![0.5, 0.5]);
    }

    #[test]
    fn test_learns_separable_clusters() {
        let (rows, labels) = clusters();
        let model = GradientBoostedTrees::fit(&rows, &labels, 3, &params());

        for (row, &label) in rows.iter().zip(&labels) {
            let p = model.predict_proba(row);
            assert_eq!(p.len(), 3);
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert_eq!(argmax(&p), label);
        }
    }

    #[test]
    fn test_importance_favours_informative_feature() {
        let (rows, labels) = clusters();
        let model = GradientBoostedTrees::fit(&rows, &labels, 3, &params());
        let importance = model.feature_importance();
        assert!((importance.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(importance[1], 0.0);
    }

    #[test]
    fn test_single_class_is_certain() {
        let rows = vec![vec![0.0], vec![1.0]];
        let model = GradientBoostedTrees::fit(&rows, &[0, 0], 1, &params());
        assert_eq!(model.predict_proba(&[0.5]), vec![1.0]);
        assert_eq!(model.feature_importance(), vec![0.0]);
    }
}
