//! Binary CART tree grown on a bootstrap sample.
//!
//! Nodes live in an arena (`Vec<Node>`) and refer to children by index.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data_handling::Diagnosis;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum Node {
    Leaf {
        /// Fraction of malignant samples that reached this leaf.
        malignant_fraction: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        /// Samples with `value <= threshold` go left.
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Stopping rules and feature sub-sampling for one tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of non-constant features examined per split.
    pub max_features: usize,
}

/// Class counts as `[benign, malignant]`.
type Counts = [usize; 2];

fn count(labels: &[Diagnosis], samples: &[usize]) -> Counts {
    let mut counts = [0usize; 2];
    for &s in samples {
        counts[labels[s].code() as usize] += 1;
    }
    counts
}

fn gini(counts: &Counts) -> f64 {
    let n = (counts[0] + counts[1]) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / n;
    let p1 = counts[1] as f64 / n;
    1.0 - p0 * p0 - p1 * p1
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Weighted child impurity, `n_left * gini_left + n_right * gini_right`.
    score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

impl DecisionTree {
    /// Grow a tree over `samples`, which index into the column-major
    /// `columns[feature][row]` and `labels[row]`. Repeated indices (from
    /// bootstrap draws) count once per occurrence.
    pub(crate) fn fit<R: Rng>(
        columns: &[Vec<f64>],
        labels: &[Diagnosis],
        samples: &[usize],
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut nodes = Vec::new();
        grow(columns, labels, samples, params, 0, rng, &mut nodes);
        DecisionTree {
            nodes,
            n_features: columns.len(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_nodes(nodes: Vec<Node>, n_features: usize) -> Self {
        DecisionTree { nodes, n_features }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Longest root-to-leaf path, counting edges.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Check the arena of a decoded tree: it is non-empty, every split names
    /// a known feature and points forward to existing nodes, and every leaf
    /// holds a fraction in [0, 1].
    pub(crate) fn check_structure(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf {
                    malignant_fraction, ..
                } => {
                    if !(0.0..=1.0).contains(malignant_fraction) {
                        return Err(format!(
                            "leaf {} has malignant fraction {}",
                            idx, malignant_fraction
                        ));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= self.n_features {
                        return Err(format!(
                            "split {} uses feature {} of {}",
                            idx, feature, self.n_features
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("split {} has a NaN threshold", idx));
                    }
                    // Children always come after their parent in the arena.
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!(
                                "split {} points to node {} of {}",
                                idx,
                                child,
                                self.nodes.len()
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Probability of the malignant class for one row.
    pub fn predict_proba_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf {
                    malignant_fraction, ..
                } => return *malignant_fraction,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Recursively grow the subtree for `samples` and return its arena index.
fn grow<R: Rng>(
    columns: &[Vec<f64>],
    labels: &[Diagnosis],
    samples: &[usize],
    params: &TreeParams,
    depth: usize,
    rng: &mut R,
    nodes: &mut Vec<Node>,
) -> usize {
    let counts = count(labels, samples);
    let n_samples = samples.len();

    let make_leaf = |nodes: &mut Vec<Node>| {
        let malignant_fraction = if n_samples == 0 {
            0.0
        } else {
            counts[1] as f64 / n_samples as f64
        };
        nodes.push(Node::Leaf {
            malignant_fraction,
            n_samples,
        });
        nodes.len() - 1
    };

    let pure = counts[0] == 0 || counts[1] == 0;
    let too_few = n_samples < params.min_samples_split || n_samples < 2 * params.min_samples_leaf;
    let too_deep = params.max_depth.is_some_and(|d| depth >= d);
    if pure || too_few || too_deep {
        return make_leaf(nodes);
    }

    let Some(split) = find_best_split(columns, labels, samples, &counts, params, rng) else {
        return make_leaf(nodes);
    };

    let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
        .iter()
        .copied()
        .partition(|&s| columns[split.feature][s] <= split.threshold);

    // Reserve the parent slot so children get larger indices.
    let node_idx = nodes.len();
    nodes.push(Node::Leaf {
        malignant_fraction: 0.0,
        n_samples,
    });

    let left = grow(columns, labels, &left_samples, params, depth + 1, rng, nodes);
    let right = grow(columns, labels, &right_samples, params, depth + 1, rng, nodes);

    log::trace!(
        "depth {} split on feature {} at {:.4} ({} | {}, score {:.4})",
        depth,
        split.feature,
        split.threshold,
        left_samples.len(),
        right_samples.len(),
        split.score
    );

    nodes[node_idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
    };
    node_idx
}

/// Draw features in random order and scan each for the threshold with the
/// lowest weighted Gini impurity. Constant features do not count towards
/// `max_features`; the draw continues until that many informative features
/// have been scanned or none are left.
fn find_best_split<R: Rng>(
    columns: &[Vec<f64>],
    labels: &[Diagnosis],
    samples: &[usize],
    parent: &Counts,
    params: &TreeParams,
    rng: &mut R,
) -> Option<BestSplit> {
    let n_features = columns.len();
    let n_samples = samples.len();
    let min_leaf = params.min_samples_leaf;

    let mut order: Vec<usize> = (0..n_features).collect();
    let mut best: Option<BestSplit> = None;
    let mut visited = 0;

    for i in 0..n_features {
        if visited >= params.max_features {
            break;
        }
        let j = rng.gen_range(i..n_features);
        order.swap(i, j);
        let feature = order[i];
        let column = &columns[feature];

        let mut sorted: Vec<(f64, Diagnosis)> =
            samples.iter().map(|&s| (column[s], labels[s])).collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        if sorted[0].0 == sorted[n_samples - 1].0 {
            continue;
        }
        visited += 1;

        let mut left: Counts = [0, 0];
        let mut right: Counts = *parent;

        for k in 0..n_samples - 1 {
            let class = sorted[k].1.code() as usize;
            left[class] += 1;
            right[class] -= 1;

            let n_left = k + 1;
            let n_right = n_samples - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }
            let (lo, hi) = (sorted[k].0, sorted[k + 1].0);
            if lo == hi {
                continue;
            }

            let score = n_left as f64 * gini(&left) + n_right as f64 * gini(&right);
            if best.as_ref().map_or(true, |b| score < b.score) {
                let mid = lo + (hi - lo) / 2.0;
                // Adjacent floats can round the midpoint up onto `hi`.
                let threshold = if mid >= hi { lo } else { mid };
                best = Some(BestSplit {
                    feature,
                    threshold,
                    score,
                });
            }
        }
    }

    best
}
