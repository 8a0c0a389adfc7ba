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

use std::fmt;

use log::{info, warn};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::classical::{DecisionTreeRegressor, LinearRegression, RandomForestRegressor, Regressor};
use crate::errors::{ModelFitError, PricingError};
use crate::metrics::{MAE, MSE, Metric, R2Score, RMSE};
use crate::preprocessing::Preprocessed;

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffles `0..n_rows` with a seeded generator and holds out the first
/// `ceil(n_rows * test_ratio)` indices. The same seed always gives the same partition.
pub fn train_test_split(
    n_rows: usize,
    test_ratio: f64,
    seed: u64,
) -> Result<TrainTestSplit, ModelFitError> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(ModelFitError::InvalidParameter(format!(
            "test_ratio must be in (0, 1), got {}",
            test_ratio
        )));
    }
    let n_test = (n_rows as f64 * test_ratio).ceil() as usize;
    if n_test == 0 || n_test >= n_rows {
        return Err(ModelFitError::InsufficientSamples { required: 2, actual: n_rows });
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = indices.split_off(n_test);
    Ok(TrainTestSplit { train, test: indices })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    LinearRegression,
    DecisionTree,
    RandomForest,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] =
        [ModelKind::LinearRegression, ModelKind::DecisionTree, ModelKind::RandomForest];

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::LinearRegression => "Linear Regression",
            ModelKind::DecisionTree => "Decision Tree",
            ModelKind::RandomForest => "Random Forest",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Holdout scores of one fitted model.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub kind: ModelKind,
    pub mae: f64,
    pub mse: f64,
    /// Only reported for linear regression.
    pub rmse: Option<f64>,
    pub r2: f64,
    /// Holdout predictions, aligned with [`Evaluation::actuals`].
    pub predictions: Array1<f64>,
    /// Normalized importance per feature name, for the tree models.
    pub feature_importances: Option<Vec<(String, f64)>>,
}

/// Results of one evaluation run. Each model either reports or carries its own fit error.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub feature_names: Vec<String>,
    pub split: TrainTestSplit,
    pub actuals: Array1<f64>,
    pub linear: Result<ModelReport, ModelFitError>,
    pub tree: Result<ModelReport, ModelFitError>,
    pub forest: Result<ModelReport, ModelFitError>,
    /// Text rendering of the fitted decision tree.
    pub tree_text: Option<String>,
}

impl Evaluation {
    pub fn report(&self, kind: ModelKind) -> &Result<ModelReport, ModelFitError> {
        match kind {
            ModelKind::LinearRegression => &self.linear,
            ModelKind::DecisionTree => &self.tree,
            ModelKind::RandomForest => &self.forest,
        }
    }

    /// MAE, MSE and R² side by side for every model that fitted.
    pub fn comparison(&self) -> ComparisonTable {
        let rows = ModelKind::ALL
            .iter()
            .filter_map(|&kind| self.report(kind).as_ref().ok())
            .map(|r| ComparisonRow { model: r.kind, mae: r.mae, mse: r.mse, r2: r.r2 })
            .collect();
        ComparisonTable { rows }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonRow {
    pub model: ModelKind,
    pub mae: f64,
    pub mse: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMetric {
    Mae,
    Mse,
    R2,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonTable {
    rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    pub fn get(&self, model: ModelKind) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.model == model)
    }

    /// The row with the lowest error, or the highest R².
    pub fn best_by(&self, metric: ComparisonMetric) -> Option<&ComparisonRow> {
        let score = |r: &ComparisonRow| match metric {
            ComparisonMetric::Mae => -r.mae,
            ComparisonMetric::Mse => -r.mse,
            ComparisonMetric::R2 => r.r2,
        };
        self.rows.iter().max_by(|a, b| score(a).total_cmp(&score(b)))
    }
}

/// Parameters of [`ModelEvaluator`]. The defaults are a 20% holdout, seed 42, a depth-4
/// tree and a 100-tree forest.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    pub test_ratio: f64,
    pub seed: u64,
    pub tree_depth: usize,
    pub n_trees: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig { test_ratio: 0.2, seed: 42, tree_depth: 4, n_trees: 100 }
    }
}

impl EvaluationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_ratio(mut self, test_ratio: f64) -> Self {
        self.test_ratio = test_ratio;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_tree_depth(mut self, tree_depth: usize) -> Self {
        self.tree_depth = tree_depth;
        self
    }

    pub fn with_forest_size(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }
}

/// Splits the preprocessed data, fits the three models on the training rows and scores
/// them on the holdout.
#[derive(Debug, Clone, Default)]
pub struct ModelEvaluator {
    config: EvaluationConfig,
}

impl ModelEvaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        ModelEvaluator { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn evaluate(&self, data: &Preprocessed) -> Result<Evaluation, PricingError> {
        let split = train_test_split(data.n_rows(), self.config.test_ratio, self.config.seed)?;
        info!(
            "Evaluating models on {} training and {} test rows",
            split.train.len(),
            split.test.len()
        );

        let features = data.reencode(&split.train)?;
        let x = features.values();
        let x_train = x.select(Axis(0), &split.train);
        let x_test = x.select(Axis(0), &split.test);
        let y_train = data.target.select(Axis(0), &split.train);
        let y_test = data.target.select(Axis(0), &split.test);
        let feature_names = features.columns().to_vec();
        let holdout =
            Holdout { x_train: &x_train, y_train: &y_train, x_test: &x_test, y_test: &y_test };

        let linear = holdout
            .score(ModelKind::LinearRegression, LinearRegression::new().build())
            .map(|(_, report)| report);

        let mut tree_text = None;
        let tree_model = DecisionTreeRegressor::new()
            .max_depth(self.config.tree_depth)
            .seed(self.config.seed)
            .build();
        let tree =
            holdout.score(ModelKind::DecisionTree, tree_model).and_then(|(model, mut report)| {
                tree_text = Some(model.export_text(&feature_names)?);
                report.feature_importances =
                    Some(named(&feature_names, model.feature_importances()?));
                Ok(report)
            });

        let forest_model = RandomForestRegressor::new()
            .n_trees(self.config.n_trees)
            .seed(self.config.seed)
            .build();
        let forest =
            holdout.score(ModelKind::RandomForest, forest_model).and_then(|(model, mut report)| {
                report.feature_importances =
                    Some(named(&feature_names, model.feature_importances()?));
                Ok(report)
            });

        Ok(Evaluation { feature_names, split, actuals: y_test, linear, tree, forest, tree_text })
    }
}

fn named(names: &[String], values: &Array1<f64>) -> Vec<(String, f64)> {
    names.iter().cloned().zip(values.iter().copied()).collect()
}

struct Holdout<'a> {
    x_train: &'a Array2<f64>,
    y_train: &'a Array1<f64>,
    x_test: &'a Array2<f64>,
    y_test: &'a Array1<f64>,
}

impl Holdout<'_> {
    fn score<M: Regressor>(
        &self,
        kind: ModelKind,
        mut model: M,
    ) -> Result<(M, ModelReport), ModelFitError> {
        let result = self.fit_and_score(kind, &mut model);
        match &result {
            Ok(report) => info!(
                "{}: MAE {:.2}, MSE {:.2}, R2 {:.4}",
                kind, report.mae, report.mse, report.r2
            ),
            Err(e) => warn!("{} failed: {}", kind, e),
        }
        result.map(|report| (model, report))
    }

    fn fit_and_score<M: Regressor>(
        &self,
        kind: ModelKind,
        model: &mut M,
    ) -> Result<ModelReport, ModelFitError> {
        model.fit(self.x_train, self.y_train)?;
        let predictions = model.predict(self.x_test)?;
        let rmse = match kind {
            ModelKind::LinearRegression => Some(RMSE.calculate(&predictions, self.y_test)?),
            _ => None,
        };
        Ok(ModelReport {
            kind,
            mae: MAE.calculate(&predictions, self.y_test)?,
            mse: MSE.calculate(&predictions, self.y_test)?,
            rmse,
            r2: R2Score.calculate(&predictions, self.y_test)?,
            predictions,
            feature_importances: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawTable;
    use crate::data::listing::fixtures::synthetic;
    use crate::preprocessing::{PreprocessingPipeline, TrainOnlyMean};
    use std::collections::HashSet;

    fn evaluator() -> ModelEvaluator {
        ModelEvaluator::new(EvaluationConfig::new().with_forest_size(10))
    }

    #[test]
    fn test_split_sizes_and_disjointness() {
        let split = train_test_split(101, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 21);
        assert_eq!(split.train.len(), 80);

        let all: HashSet<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        assert_eq!(all.len(), 101);
    }

    #[test]
    fn test_split_is_deterministic() {
        assert_eq!(train_test_split(50, 0.2, 42).unwrap(), train_test_split(50, 0.2, 42).unwrap());
        assert_ne!(train_test_split(50, 0.2, 42).unwrap(), train_test_split(50, 0.2, 7).unwrap());
    }

    #[test]
    fn test_split_rejects_bad_input() {
        assert!(matches!(train_test_split(10, 0.0, 1), Err(ModelFitError::InvalidParameter(_))));
        assert!(matches!(train_test_split(10, 1.5, 1), Err(ModelFitError::InvalidParameter(_))));
        assert!(matches!(
            train_test_split(1, 0.2, 1),
            Err(ModelFitError::InsufficientSamples { required: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_evaluation_reports_every_model() {
        let _ = env_logger::builder().is_test(true).try_init();
        let data = PreprocessingPipeline::new().build().run(&RawTable::new(synthetic(120))).unwrap();
        let evaluation = evaluator().evaluate(&data).unwrap();

        assert_eq!(evaluation.actuals.len(), 24);
        let linear = evaluation.linear.as_ref().unwrap();
        assert!(linear.rmse.is_some());
        assert!((linear.rmse.unwrap() - linear.mse.sqrt()).abs() < 1e-9);
        assert!(linear.feature_importances.is_none());

        let tree = evaluation.tree.as_ref().unwrap();
        assert!(tree.rmse.is_none());
        assert_eq!(tree.feature_importances.as_ref().unwrap().len(), data.features.ncols());
        assert!(evaluation.tree_text.as_ref().unwrap().starts_with("|--- "));

        let forest = evaluation.forest.as_ref().unwrap();
        assert_eq!(forest.predictions.len(), 24);
        assert!(forest.r2 > 0.5, "forest should explain most of the synthetic price, got {}", forest.r2);

        let table = evaluation.comparison();
        assert_eq!(table.rows().len(), 3);
        assert!(table.get(ModelKind::RandomForest).is_some());
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let data = PreprocessingPipeline::new().build().run(&RawTable::new(synthetic(80))).unwrap();
        let first = evaluator().evaluate(&data).unwrap();
        let second = evaluator().evaluate(&data).unwrap();

        assert_eq!(first.split, second.split);
        assert_eq!(first.comparison(), second.comparison());
        assert_eq!(first.tree_text, second.tree_text);
        for kind in ModelKind::ALL {
            let a = first.report(kind).as_ref().unwrap();
            let b = second.report(kind).as_ref().unwrap();
            assert_eq!(a.predictions, b.predictions, "{} predictions differ", kind);
        }
    }

    #[test]
    fn test_evaluation_with_train_only_encoding() {
        let data = PreprocessingPipeline::new()
            .encoding(TrainOnlyMean)
            .build()
            .run(&RawTable::new(synthetic(80)))
            .unwrap();
        let evaluation = evaluator().evaluate(&data).unwrap();
        assert!(evaluation.linear.is_ok());
        assert!(evaluation.forest.is_ok());
    }

    #[test]
    fn test_best_by() {
        let table = ComparisonTable {
            rows: vec![
                ComparisonRow { model: ModelKind::LinearRegression, mae: 30.0, mse: 900.0, r2: 0.4 },
                ComparisonRow { model: ModelKind::DecisionTree, mae: 25.0, mse: 1000.0, r2: 0.3 },
                ComparisonRow { model: ModelKind::RandomForest, mae: 28.0, mse: 800.0, r2: 0.6 },
            ],
        };
        assert_eq!(table.best_by(ComparisonMetric::Mae).unwrap().model, ModelKind::DecisionTree);
        assert_eq!(table.best_by(ComparisonMetric::Mse).unwrap().model, ModelKind::RandomForest);
        assert_eq!(table.best_by(ComparisonMetric::R2).unwrap().model, ModelKind::RandomForest);
        assert!(ComparisonTable::default().best_by(ComparisonMetric::R2).is_none());
    }
}
