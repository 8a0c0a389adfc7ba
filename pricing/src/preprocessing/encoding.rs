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

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

use ndarray::{Array1, Array2, ArrayView1};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::errors::SchemaError;

/// One-hot encoder for a single categorical column.
///
/// Categories are sorted and, by default, the first one is dropped as the reference level,
/// so `k` categories produce `k - 1` indicator columns named `<column>_<category>`.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    column: String,
    categories: Vec<String>,
    drop_first: bool,
}

impl OneHotEncoder {
    pub fn new(column: &str) -> Self {
        OneHotEncoder { column: column.to_string(), categories: Vec::new(), drop_first: true }
    }

    pub fn with_drop_first(mut self, drop_first: bool) -> Self {
        self.drop_first = drop_first;
        self
    }

    pub fn fit<S: AsRef<str>>(&mut self, values: &[S]) {
        let distinct: BTreeSet<&str> = values.iter().map(|v| v.as_ref()).collect();
        self.categories = distinct.into_iter().map(str::to_string).collect();
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Every category seen during `fit`, sorted, including the reference level.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// The category represented by all-zero indicators.
    pub fn reference(&self) -> Option<&str> {
        if self.drop_first { self.categories.first().map(String::as_str) } else { None }
    }

    fn encoded(&self) -> &[String] {
        if self.drop_first && !self.categories.is_empty() {
            &self.categories[1..]
        } else {
            &self.categories
        }
    }

    /// Names of the indicator columns, in output order.
    pub fn columns(&self) -> Vec<String> {
        self.encoded().iter().map(|c| format!("{}_{}", self.column, c)).collect()
    }

    /// Indicator values for a single category.
    pub fn encode_value(&self, value: &str) -> Result<Vec<f64>, SchemaError> {
        if !self.categories.iter().any(|c| c == value) {
            return Err(SchemaError::UnknownCategory {
                column: self.column.clone(),
                value: value.to_string(),
            });
        }
        Ok(self.encoded().iter().map(|c| if c == value { 1.0 } else { 0.0 }).collect())
    }

    pub fn transform<S: AsRef<str>>(&self, values: &[S]) -> Result<Array2<f64>, SchemaError> {
        let width = self.encoded().len();
        let mut out = Array2::zeros((values.len(), width));
        for (i, value) in values.iter().enumerate() {
            let row = self.encode_value(value.as_ref())?;
            for (j, v) in row.into_iter().enumerate() {
                out[[i, j]] = v;
            }
        }
        Ok(out)
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, values: &[S]) -> Result<Array2<f64>, SchemaError> {
        self.fit(values);
        self.transform(values)
    }
}

/// Running per-category price sums.
#[derive(Debug, Default)]
struct CategoryMeans {
    sums: HashMap<String, (f64, usize)>,
    total: f64,
    count: usize,
}

impl CategoryMeans {
    fn fit(categories: &[String], prices: ArrayView1<f64>, rows: &[usize]) -> Self {
        let mut means = CategoryMeans::default();
        for &i in rows {
            let entry = means.sums.entry(categories[i].clone()).or_insert((0.0, 0));
            entry.0 += prices[i];
            entry.1 += 1;
            means.total += prices[i];
            means.count += 1;
        }
        means
    }

    fn global(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.total / self.count as f64 }
    }

    fn get(&self, category: &str) -> f64 {
        match self.sums.get(category) {
            Some(&(sum, n)) if n > 0 => sum / n as f64,
            _ => self.global(),
        }
    }
}

/// How a categorical column is replaced by the mean price of its category.
///
/// `train` names the rows whose prices may inform the encoding; `None` means every row.
/// The result always has one value per row of `categories`.
pub trait TargetEncoding: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn encode(
        &self,
        categories: &[String],
        prices: ArrayView1<f64>,
        train: Option<&[usize]>,
    ) -> Array1<f64>;

    /// Whether the encoding must be recomputed from training rows after a split.
    fn refits_per_split(&self) -> bool;
}

fn all_rows(n: usize) -> Vec<usize> {
    (0..n).collect()
}

/// Mean price per category over every row, evaluation rows included.
///
/// This leaks the target into the features of held-out rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalMean;

impl TargetEncoding for GlobalMean {
    fn name(&self) -> &'static str {
        "global_mean"
    }

    fn encode(
        &self,
        categories: &[String],
        prices: ArrayView1<f64>,
        _train: Option<&[usize]>,
    ) -> Array1<f64> {
        let means = CategoryMeans::fit(categories, prices, &all_rows(categories.len()));
        categories.iter().map(|c| means.get(c)).collect()
    }

    fn refits_per_split(&self) -> bool {
        false
    }
}

/// Mean price per category over the training rows only. Categories absent from the
/// training rows get the training-rows mean price.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrainOnlyMean;

impl TargetEncoding for TrainOnlyMean {
    fn name(&self) -> &'static str {
        "train_only_mean"
    }

    fn encode(
        &self,
        categories: &[String],
        prices: ArrayView1<f64>,
        train: Option<&[usize]>,
    ) -> Array1<f64> {
        let rows = train.map(<[usize]>::to_vec).unwrap_or_else(|| all_rows(categories.len()));
        let means = CategoryMeans::fit(categories, prices, &rows);
        categories.iter().map(|c| means.get(c)).collect()
    }

    fn refits_per_split(&self) -> bool {
        true
    }
}

/// Out-of-fold means: each training row is encoded with means computed on the other
/// `k - 1` folds of the training rows; every other row uses the full training-rows means.
#[derive(Debug, Clone, Copy)]
pub struct KFoldMean {
    pub k: usize,
    pub seed: u64,
}

impl Default for KFoldMean {
    fn default() -> Self {
        KFoldMean { k: 5, seed: 42 }
    }
}

impl TargetEncoding for KFoldMean {
    fn name(&self) -> &'static str {
        "k_fold_mean"
    }

    fn encode(
        &self,
        categories: &[String],
        prices: ArrayView1<f64>,
        train: Option<&[usize]>,
    ) -> Array1<f64> {
        let rows = train.map(<[usize]>::to_vec).unwrap_or_else(|| all_rows(categories.len()));
        let full = CategoryMeans::fit(categories, prices, &rows);
        let mut encoded: Array1<f64> = categories.iter().map(|c| full.get(c)).collect();

        let k = self.k.max(2).min(rows.len());
        if k < 2 {
            return encoded;
        }
        let mut shuffled = rows;
        shuffled.shuffle(&mut StdRng::seed_from_u64(self.seed));
        let fold_of = |position: usize| position * k / shuffled.len();

        for fold in 0..k {
            let (held, rest): (Vec<(usize, usize)>, Vec<(usize, usize)>) =
                shuffled.iter().copied().enumerate().partition(|&(p, _)| fold_of(p) == fold);
            let rest: Vec<usize> = rest.into_iter().map(|(_, row)| row).collect();
            let means = CategoryMeans::fit(categories, prices, &rest);
            for (_, row) in held {
                encoded[row] = means.get(&categories[row]);
            }
        }
        encoded
    }

    fn refits_per_split(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_one_hot_drops_first_sorted_category() {
        let mut encoder = OneHotEncoder::new("room_type");
        let values = ["Shared room", "Entire home/apt", "Private room", "Private room"];
        let encoded = encoder.fit_transform(&values).unwrap();

        assert_eq!(encoder.reference(), Some("Entire home/apt"));
        assert_eq!(encoder.columns(), labels(&["room_type_Private room", "room_type_Shared room"]));
        assert_eq!(encoded, array![[0.0, 1.0], [0.0, 0.0], [1.0, 0.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_one_hot_k_minus_one_columns() {
        let mut encoder = OneHotEncoder::new("neighbourhood_group");
        encoder.fit(&["Queens", "Bronx", "Manhattan", "Brooklyn", "Staten Island", "Bronx"]);
        assert_eq!(encoder.categories().len(), 5);
        assert_eq!(encoder.columns().len(), 4);
        assert_eq!(encoder.columns()[0], "neighbourhood_group_Brooklyn");
    }

    #[test]
    fn test_one_hot_unknown_category() {
        let mut encoder = OneHotEncoder::new("room_type");
        encoder.fit(&["Private room", "Shared room"]);
        let result = encoder.encode_value("Hotel room");
        assert!(matches!(
            result,
            Err(SchemaError::UnknownCategory { column, value }) if column == "room_type" && value == "Hotel room"
        ));
        assert_eq!(encoder.encode_value("Private room").unwrap(), vec![0.0]);
        assert_eq!(encoder.encode_value("Shared room").unwrap(), vec![1.0]);
    }

    #[test]
    fn test_one_hot_without_drop() {
        let mut encoder = OneHotEncoder::new("g").with_drop_first(false);
        let encoded = encoder.fit_transform(&["b", "a"]).unwrap();
        assert_eq!(encoder.columns(), labels(&["g_a", "g_b"]));
        assert_eq!(encoded, array![[0.0, 1.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_global_mean_uses_every_row() {
        let categories = labels(&["A", "A", "B", "B"]);
        let prices = array![100.0, 200.0, 0.0, 50.0];
        let encoded = GlobalMean.encode(&categories, prices.view(), Some(&[0, 2]));
        assert_eq!(encoded, array![150.0, 150.0, 25.0, 25.0]);
        assert!(!GlobalMean.refits_per_split());
    }

    #[test]
    fn test_train_only_mean_ignores_held_out_prices() {
        let categories = labels(&["A", "A", "B", "C"]);
        let prices = array![100.0, 900.0, 50.0, 400.0];
        let encoded = TrainOnlyMean.encode(&categories, prices.view(), Some(&[0, 2]));
        // Row 1 is held out, so "A" only sees 100. "C" is unseen and gets the training mean.
        assert_eq!(encoded, array![100.0, 100.0, 50.0, 75.0]);
    }

    #[test]
    fn test_k_fold_mean_is_out_of_fold_and_deterministic() {
        let categories = labels(&["A", "A", "A", "A", "B", "B"]);
        let prices = array![1.0, 2.0, 4.0, 8.0, 100.0, 300.0];
        let strategy = KFoldMean { k: 2, seed: 7 };
        let first = strategy.encode(&categories, prices.view(), None);
        let second = strategy.encode(&categories, prices.view(), None);
        assert_eq!(first, second);
        for (i, &price) in prices.iter().enumerate() {
            assert!(first[i].is_finite());
            assert_ne!(first[i], price, "row {} must not see its own price", i);
        }
    }

    #[test]
    fn test_k_fold_mean_held_out_rows_use_training_means() {
        let categories = labels(&["A", "A", "A", "B"]);
        let prices = array![10.0, 20.0, 30.0, 1000.0];
        let encoded = KFoldMean { k: 2, seed: 1 }.encode(&categories, prices.view(), Some(&[0, 1]));
        assert_eq!(encoded[2], 15.0);
        assert_eq!(encoded[3], 15.0);
    }
}
