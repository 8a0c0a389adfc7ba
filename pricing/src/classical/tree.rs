// BSD 3-Clause License
//
// Copyright (c) 2025, BlackPortal ○
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this
//    list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
//    this list of conditions and the following disclaimer in the documentation
//    and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived from
//    this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index::sample;

/// A node of a fitted regression tree.
///
/// Samples with `x[feature] <= threshold` go to `left`.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Internal {
        feature: usize,
        threshold: f64,
        n_samples: usize,
        value: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        n_samples: usize,
        value: f64,
    },
}

impl TreeNode {
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Internal { feature, threshold, left, right, .. } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Internal { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }

    /// Renders the tree as indented `feature <= threshold` rules, one line per node.
    pub fn export_text(&self, feature_names: &[String]) -> String {
        let mut out = String::new();
        self.write_text(feature_names, 1, &mut out);
        out
    }

    fn write_text(&self, feature_names: &[String], depth: usize, out: &mut String) {
        let indent = format!("{}|--- ", "|   ".repeat(depth - 1));
        match self {
            TreeNode::Leaf { value, .. } => {
                out.push_str(&format!("{}value: [{:.2}]\n", indent, value));
            }
            TreeNode::Internal { feature, threshold, left, right, .. } => {
                let name = feature_names
                    .get(*feature)
                    .cloned()
                    .unwrap_or_else(|| format!("feature_{}", feature));
                out.push_str(&format!("{}{} <= {:.2}\n", indent, name, threshold));
                left.write_text(feature_names, depth + 1, out);
                out.push_str(&format!("{}{} >  {:.2}\n", indent, name, threshold));
                right.write_text(feature_names, depth + 1, out);
            }
        }
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    proxy: f64,
}

/// Column-major copy of the training data plus scratch space for partitioning.
struct Presorted {
    columns: Vec<Vec<f64>>,
    y: Vec<f64>,
    goes_left: Vec<bool>,
}

/// Grows a CART regression tree with the squared-error criterion.
///
/// Every feature's row order is sorted once per tree and then partitioned stably down
/// the tree, so each node scans its rows in feature order without re-sorting.
pub(crate) struct TreeGrower<'a> {
    pub x: &'a Array2<f64>,
    pub y: &'a Array1<f64>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
    pub rng: StdRng,
    pub importances: Array1<f64>,
}

impl TreeGrower<'_> {
    /// Grows a tree over `indices`, which may repeat rows (bootstrap samples).
    pub fn grow(&mut self, indices: Vec<usize>) -> TreeNode {
        let mut data = Presorted {
            columns: self.x.columns().into_iter().map(|c| c.to_vec()).collect(),
            y: self.y.to_vec(),
            goes_left: vec![false; self.x.nrows()],
        };
        if data.columns.is_empty() {
            let (value, _) = node_stats(&data.y, &indices);
            return TreeNode::Leaf { n_samples: indices.len(), value };
        }
        let orders = data
            .columns
            .iter()
            .map(|column| {
                let mut order = indices.clone();
                order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));
                order
            })
            .collect();
        self.grow_node(&mut data, orders, 0)
    }

    /// Importances normalized to sum to one (all zero for a single-leaf tree).
    pub fn normalized_importances(&self) -> Array1<f64> {
        let total = self.importances.sum();
        if total > 0.0 { &self.importances / total } else { self.importances.clone() }
    }

    /// `orders[f]` holds the node's rows sorted by feature `f`.
    fn grow_node(
        &mut self,
        data: &mut Presorted,
        orders: Vec<Vec<usize>>,
        depth: usize,
    ) -> TreeNode {
        let n_samples = orders[0].len();
        let (value, sse) = node_stats(&data.y, &orders[0]);

        let at_max_depth = self.max_depth.is_some_and(|d| depth >= d);
        if at_max_depth
            || n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || sse <= f64::EPSILON * value.abs().max(1.0)
        {
            return TreeNode::Leaf { n_samples, value };
        }

        let Some(split) = self.best_split(data, &orders) else {
            return TreeNode::Leaf { n_samples, value };
        };

        let column = &data.columns[split.feature];
        for &i in &orders[split.feature] {
            data.goes_left[i] = column[i] <= split.threshold;
        }
        let (left, right): (Vec<Vec<usize>>, Vec<Vec<usize>>) = orders
            .into_iter()
            .map(|order| -> (Vec<usize>, Vec<usize>) {
                order.into_iter().partition(|&i| data.goes_left[i])
            })
            .unzip();

        let (_, left_sse) = node_stats(&data.y, &left[0]);
        let (_, right_sse) = node_stats(&data.y, &right[0]);
        self.importances[split.feature] += (sse - left_sse - right_sse).max(0.0);

        let left = self.grow_node(data, left, depth + 1);
        let right = self.grow_node(data, right, depth + 1);
        TreeNode::Internal {
            feature: split.feature,
            threshold: split.threshold,
            n_samples,
            value,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let n_features = self.x.ncols();
        match self.max_features {
            Some(k) if k < n_features => sample(&mut self.rng, n_features, k).into_vec(),
            _ => (0..n_features).collect(),
        }
    }

    /// Maximizes `sum_l^2 / n_l + sum_r^2 / n_r`, which minimizes the children's SSE.
    fn best_split(&mut self, data: &Presorted, orders: &[Vec<usize>]) -> Option<Split> {
        let n = orders[0].len();
        let total: f64 = orders[0].iter().map(|&i| data.y[i]).sum();
        let min_leaf = self.min_samples_leaf.max(1);
        let mut best: Option<Split> = None;

        for feature in self.candidate_features() {
            let column = &data.columns[feature];
            let sorted = &orders[feature];
            let mut left_sum = 0.0;
            for pos in 0..n - 1 {
                left_sum += data.y[sorted[pos]];
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let current = column[sorted[pos]];
                let next = column[sorted[pos + 1]];
                if next <= current {
                    continue;
                }
                let right_sum = total - left_sum;
                let proxy =
                    left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
                if best.as_ref().is_none_or(|b| proxy > b.proxy) {
                    let mut threshold = current + (next - current) / 2.0;
                    if threshold >= next {
                        threshold = current;
                    }
                    best = Some(Split { feature, threshold, proxy });
                }
            }
        }
        best
    }
}

/// Mean and sum of squared deviations of `y` over `rows`.
fn node_stats(y: &[f64], rows: &[usize]) -> (f64, f64) {
    let n = rows.len() as f64;
    let mean = rows.iter().map(|&i| y[i]).sum::<f64>() / n;
    let sse = rows.iter().map(|&i| (y[i] - mean) * (y[i] - mean)).sum();
    (mean, sse)
}
