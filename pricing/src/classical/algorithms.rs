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

use log::debug;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tree::{TreeGrower, TreeNode};
use super::{Regressor, validate_fit_input, validate_predict_input};
use crate::errors::ModelFitError;

/// Relative norm below which a centered column is treated as linearly dependent.
const RANK_TOLERANCE: f64 = 1e-10;

pub struct LinearRegressionBuilder {
    fit_intercept: bool,
}

impl LinearRegressionBuilder {
    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn build(self) -> LinearRegression {
        LinearRegression { coefficients: None, intercept: 0.0, fit_intercept: self.fit_intercept }
    }
}

/// Ordinary least squares without regularization.
///
/// Solved by a re-orthogonalized Gram-Schmidt QR factorization of the centered features.
/// Columns that are linear combinations of earlier ones get a zero coefficient.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
    fit_intercept: bool,
}

impl LinearRegression {
    pub fn new() -> LinearRegressionBuilder {
        LinearRegressionBuilder { fit_intercept: true }
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelFitError> {
        validate_fit_input(x, y)?;
        let n_features = x.ncols();

        let (x_mean, y_mean) = if self.fit_intercept {
            (x.mean_axis(Axis(0)).ok_or(ModelFitError::EmptyInput)?, y.mean().unwrap_or(0.0))
        } else {
            (Array1::zeros(n_features), 0.0)
        };
        let xc = x - &x_mean;
        let yc = y - y_mean;

        let mut q: Vec<Array1<f64>> = Vec::with_capacity(n_features);
        let mut r: Vec<Vec<f64>> = Vec::with_capacity(n_features);
        let mut kept: Vec<usize> = Vec::with_capacity(n_features);

        for j in 0..n_features {
            let column = xc.column(j);
            let column_norm = column.dot(&column).sqrt();
            let mut v = column.to_owned();
            let mut projections = vec![0.0; q.len()];
            for _ in 0..2 {
                for (k, qk) in q.iter().enumerate() {
                    let c = qk.dot(&v);
                    v.scaled_add(-c, qk);
                    projections[k] += c;
                }
            }
            let norm = v.dot(&v).sqrt();
            if column_norm == 0.0 || norm <= RANK_TOLERANCE * column_norm {
                debug!("Column {} is linearly dependent; coefficient fixed at 0", j);
                continue;
            }
            projections.push(norm);
            r.push(projections);
            q.push(v / norm);
            kept.push(j);
        }

        let qty: Vec<f64> = q.iter().map(|qk| qk.dot(&yc)).collect();
        let mut beta = vec![0.0; kept.len()];
        for k in (0..kept.len()).rev() {
            let tail: f64 = ((k + 1)..kept.len()).map(|l| r[l][k] * beta[l]).sum();
            beta[k] = (qty[k] - tail) / r[k][k];
        }

        let mut coefficients = Array1::zeros(n_features);
        for (&j, &b) in kept.iter().zip(beta.iter()) {
            coefficients[j] = b;
        }
        if coefficients.iter().any(|c: &f64| !c.is_finite()) {
            return Err(ModelFitError::InvalidNumericValue);
        }
        self.intercept = y_mean - x_mean.dot(&coefficients);
        self.coefficients = Some(coefficients);
        debug!("Linear regression kept {} of {} columns", kept.len(), n_features);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelFitError> {
        let coefficients = self.coefficients.as_ref().ok_or(ModelFitError::NotFitted)?;
        validate_predict_input(x, coefficients.len())?;
        Ok(x.dot(coefficients) + self.intercept)
    }
}

fn check_tree_parameters(
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: Option<usize>,
) -> Result<(), ModelFitError> {
    if max_depth == Some(0) {
        return Err(ModelFitError::InvalidParameter("max_depth must be at least 1".to_string()));
    }
    if min_samples_split < 2 {
        return Err(ModelFitError::InvalidParameter(
            "min_samples_split must be at least 2".to_string(),
        ));
    }
    if min_samples_leaf < 1 {
        return Err(ModelFitError::InvalidParameter(
            "min_samples_leaf must be at least 1".to_string(),
        ));
    }
    if max_features == Some(0) {
        return Err(ModelFitError::InvalidParameter("max_features must be at least 1".to_string()));
    }
    Ok(())
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub struct DecisionTreeRegressorBuilder {
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: Option<usize>,
    seed: Option<u64>,
}

impl DecisionTreeRegressorBuilder {
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Number of features examined at each split, drawn at random. All of them by default.
    pub fn max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> DecisionTreeRegressor {
        DecisionTreeRegressor {
            root: None,
            n_features: 0,
            feature_importances: None,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
            seed: self.seed,
        }
    }
}

/// CART regression tree using the squared-error criterion.
#[derive(Debug, Clone)]
pub struct DecisionTreeRegressor {
    root: Option<TreeNode>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: Option<usize>,
    seed: Option<u64>,
}

impl DecisionTreeRegressor {
    pub fn new() -> DecisionTreeRegressorBuilder {
        DecisionTreeRegressorBuilder {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: None,
        }
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Total squared-error decrease contributed by each feature, normalized to sum to one.
    pub fn feature_importances(&self) -> Result<&Array1<f64>, ModelFitError> {
        self.feature_importances.as_ref().ok_or(ModelFitError::NotFitted)
    }

    pub fn export_text(&self, feature_names: &[String]) -> Result<String, ModelFitError> {
        let root = self.root.as_ref().ok_or(ModelFitError::NotFitted)?;
        Ok(root.export_text(feature_names))
    }

    fn fit_rows(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rows: Vec<usize>,
        rng: StdRng,
    ) -> Result<(), ModelFitError> {
        check_tree_parameters(
            self.max_depth,
            self.min_samples_split,
            self.min_samples_leaf,
            self.max_features,
        )?;
        let mut grower = TreeGrower {
            x,
            y,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
            rng,
            importances: Array1::zeros(x.ncols()),
        };
        let root = grower.grow(rows);
        self.feature_importances = Some(grower.normalized_importances());
        self.n_features = x.ncols();
        self.root = Some(root);
        Ok(())
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelFitError> {
        validate_fit_input(x, y)?;
        let rows = (0..x.nrows()).collect();
        self.fit_rows(x, y, rows, seeded_rng(self.seed))?;
        if let Some(root) = &self.root {
            debug!("Fitted decision tree: depth {}, {} leaves", root.depth(), root.n_leaves());
        }
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelFitError> {
        let root = self.root.as_ref().ok_or(ModelFitError::NotFitted)?;
        validate_predict_input(x, self.n_features)?;
        Ok(x.outer_iter().map(|row| root.predict_row(row)).collect())
    }
}

pub struct RandomForestRegressorBuilder {
    n_trees: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: Option<usize>,
    bootstrap: bool,
    seed: Option<u64>,
}

impl RandomForestRegressorBuilder {
    pub fn n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    pub fn max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> RandomForestRegressor {
        RandomForestRegressor {
            trees: Vec::new(),
            n_features: 0,
            feature_importances: None,
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
            bootstrap: self.bootstrap,
            seed: self.seed,
        }
    }
}

/// An average of regression trees, each grown on a bootstrap sample of the rows.
///
/// Every tree draws its own seed from a generator seeded with `seed`, so a fixed seed
/// gives identical forests across runs.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
    n_trees: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: Option<usize>,
    bootstrap: bool,
    seed: Option<u64>,
}

impl RandomForestRegressor {
    pub fn new() -> RandomForestRegressorBuilder {
        RandomForestRegressorBuilder {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: None,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    pub fn trees(&self) -> &[DecisionTreeRegressor] {
        &self.trees
    }

    /// Mean of the per-tree normalized importances.
    pub fn feature_importances(&self) -> Result<&Array1<f64>, ModelFitError> {
        self.feature_importances.as_ref().ok_or(ModelFitError::NotFitted)
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelFitError> {
        validate_fit_input(x, y)?;
        if self.n_trees == 0 {
            return Err(ModelFitError::InvalidParameter("n_trees must be at least 1".to_string()));
        }
        check_tree_parameters(
            self.max_depth,
            self.min_samples_split,
            self.min_samples_leaf,
            self.max_features,
        )?;

        let n_samples = x.nrows();
        let mut rng = seeded_rng(self.seed);
        self.trees.clear();
        let mut importances: Array1<f64> = Array1::zeros(x.ncols());

        for _ in 0..self.n_trees {
            let mut tree_rng = StdRng::seed_from_u64(rng.gen::<u64>());
            let rows: Vec<usize> = if self.bootstrap {
                (0..n_samples).map(|_| tree_rng.gen_range(0..n_samples)).collect()
            } else {
                (0..n_samples).collect()
            };

            let mut tree = DecisionTreeRegressor {
                root: None,
                n_features: 0,
                feature_importances: None,
                max_depth: self.max_depth,
                min_samples_split: self.min_samples_split,
                min_samples_leaf: self.min_samples_leaf,
                max_features: self.max_features,
                seed: None,
            };
            tree.fit_rows(x, y, rows, tree_rng)?;
            importances += tree.feature_importances()?;
            self.trees.push(tree);
        }

        self.feature_importances = Some(importances / self.n_trees as f64);
        self.n_features = x.ncols();
        debug!("Fitted random forest with {} trees on {} rows", self.trees.len(), n_samples);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelFitError> {
        if self.trees.is_empty() {
            return Err(ModelFitError::NotFitted);
        }
        validate_predict_input(x, self.n_features)?;
        let mut sum: Array1<f64> = Array1::zeros(x.nrows());
        for tree in &self.trees {
            sum += &tree.predict(x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}
