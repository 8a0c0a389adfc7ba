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

pub mod encoding;

use std::sync::Arc;

use libm::log1p;
use log::{debug, info, warn};
use ndarray::{Array1, Array2, Axis};

pub use encoding::{GlobalMean, KFoldMean, OneHotEncoder, TargetEncoding, TrainOnlyMean};

use crate::data::{Listing, RawTable, Table};
use crate::errors::{DataError, PricingError, SchemaError};
use crate::scalers::{PowerTransformer, Scaler};

pub const PRICE: &str = "price";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const MINIMUM_NIGHTS: &str = "minimum_nights";
pub const NUMBER_OF_REVIEWS: &str = "number_of_reviews";
pub const REVIEWS_PER_MONTH: &str = "reviews_per_month";
pub const HOST_LISTINGS_COUNT: &str = "calculated_host_listings_count";
pub const AVAILABILITY_365: &str = "availability_365";
pub const REVIEWS_PER_MONTH_ORIGINAL: &str = "reviews_per_month_original";
pub const NEIGHBOURHOOD_GROUP: &str = "neighbourhood_group";
pub const ROOM_TYPE: &str = "room_type";
pub const NEIGHBOURHOOD_ENCODED: &str = "neighbourhood_encoded";
pub const LOG_PRICE: &str = "log_price";
pub const MINIMUM_NIGHTS_LOG: &str = "minimum_nights_log";
pub const REVIEW_SCORE: &str = "review_score";

/// Raw columns that never reach the models.
pub const DROPPED_COLUMNS: [&str; 5] = ["id", "name", "host_id", "host_name", "last_review"];

/// Output of [`PreprocessingPipeline::run`].
///
/// `features`, `target`, `processed` and `neighbourhoods` share the same rows in the same
/// order. The fitted transformers are kept so single listings can be encoded the same way.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub features: Table,
    pub target: Array1<f64>,
    pub processed: Table,
    pub neighbourhoods: Vec<String>,
    pub power_transformer: PowerTransformer,
    pub group_encoder: OneHotEncoder,
    pub room_encoder: OneHotEncoder,
    pub encoding: Arc<dyn TargetEncoding>,
    /// Rows removed because their price was not positive.
    pub dropped_rows: usize,
}

impl Preprocessed {
    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    /// The feature matrix with `neighbourhood_encoded` recomputed from the `train` rows.
    ///
    /// Returns the features unchanged when the encoding strategy does not refit per split.
    pub fn reencode(&self, train: &[usize]) -> Result<Table, SchemaError> {
        if !self.encoding.refits_per_split() {
            return Ok(self.features.clone());
        }
        let encoded = self.encoding.encode(&self.neighbourhoods, self.target.view(), Some(train));
        let mut features = self.features.clone();
        features.replace_column(NEIGHBOURHOOD_ENCODED, encoded)?;
        debug!("Re-encoded {} from {} training rows", NEIGHBOURHOOD_ENCODED, train.len());
        Ok(features)
    }
}

pub struct PreprocessingPipelineBuilder {
    encoding: Arc<dyn TargetEncoding>,
}

impl PreprocessingPipelineBuilder {
    pub fn encoding(mut self, encoding: impl TargetEncoding + 'static) -> Self {
        self.encoding = Arc::new(encoding);
        self
    }

    pub fn shared_encoding(mut self, encoding: Arc<dyn TargetEncoding>) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn build(self) -> PreprocessingPipeline {
        PreprocessingPipeline { encoding: self.encoding }
    }
}

/// Turns the raw listings into a model-ready feature matrix and price target.
pub struct PreprocessingPipeline {
    encoding: Arc<dyn TargetEncoding>,
}

impl PreprocessingPipeline {
    pub fn new() -> PreprocessingPipelineBuilder {
        PreprocessingPipelineBuilder { encoding: Arc::new(GlobalMean) }
    }

    pub fn encoding(&self) -> &Arc<dyn TargetEncoding> {
        &self.encoding
    }

    pub fn run(&self, raw: &RawTable) -> Result<Preprocessed, PricingError> {
        if raw.is_empty() {
            return Err(DataError::EmptyTable.into());
        }
        info!("Preprocessing {} listings", raw.len());
        debug!("Dropping columns {:?}", DROPPED_COLUMNS);

        let listings = raw.listings();
        let numeric =
            |f: &dyn Fn(&Listing) -> f64| -> Array1<f64> { listings.iter().map(f).collect() };
        let price = numeric(&|l| l.price);

        let reviews_per_month =
            numeric(&|l| l.reviews_per_month.unwrap_or(0.0)).insert_axis(Axis(1));
        let mut power_transformer = PowerTransformer::new();
        let transformed = power_transformer.fit_transform(&reviews_per_month)?;
        let reconstructed = power_transformer.inverse_transform(&transformed)?;
        debug!("reviews_per_month lambda = {:?}", power_transformer.lambda());

        let groups: Vec<&str> = listings.iter().map(|l| l.neighbourhood_group.as_str()).collect();
        let rooms: Vec<&str> = listings.iter().map(|l| l.room_type.as_str()).collect();
        let mut group_encoder = OneHotEncoder::new(NEIGHBOURHOOD_GROUP);
        let mut room_encoder = OneHotEncoder::new(ROOM_TYPE);
        let group_indicators = group_encoder.fit_transform(&groups)?;
        let room_indicators = room_encoder.fit_transform(&rooms)?;

        let neighbourhoods: Vec<String> =
            listings.iter().map(|l| l.neighbourhood.clone()).collect();
        if !self.encoding.refits_per_split() {
            warn!(
                "{} uses {} over every row; evaluation rows leak their price into the features",
                NEIGHBOURHOOD_ENCODED,
                self.encoding.name()
            );
        }
        let neighbourhood_encoded = self.encoding.encode(&neighbourhoods, price.view(), None);

        let mut columns = vec![
            (LATITUDE.to_string(), numeric(&|l| l.latitude)),
            (LONGITUDE.to_string(), numeric(&|l| l.longitude)),
            (PRICE.to_string(), price),
            (MINIMUM_NIGHTS.to_string(), numeric(&|l| f64::from(l.minimum_nights))),
            (NUMBER_OF_REVIEWS.to_string(), numeric(&|l| f64::from(l.number_of_reviews))),
            (REVIEWS_PER_MONTH.to_string(), transformed.column(0).to_owned()),
            (
                HOST_LISTINGS_COUNT.to_string(),
                numeric(&|l| f64::from(l.calculated_host_listings_count)),
            ),
            (AVAILABILITY_365.to_string(), numeric(&|l| f64::from(l.availability_365))),
            (REVIEWS_PER_MONTH_ORIGINAL.to_string(), reconstructed.column(0).to_owned()),
        ];
        columns.extend(indicator_columns(&group_encoder, &group_indicators));
        columns.extend(indicator_columns(&room_encoder, &room_indicators));
        columns.push((NEIGHBOURHOOD_ENCODED.to_string(), neighbourhood_encoded));
        let table = Table::from_columns(columns)?;

        let keep = positive_price_rows(&table)?;
        if keep.is_empty() {
            return Err(DataError::NoPositivePrices.into());
        }
        let dropped_rows = table.nrows() - keep.len();
        let mut processed = table.select_rows(&keep);
        let neighbourhoods: Vec<String> = keep.iter().map(|&i| neighbourhoods[i].clone()).collect();
        debug!("Dropped {} listings with non-positive price", dropped_rows);

        let log_price = processed.column(PRICE)?.mapv(log1p);
        let minimum_nights_log = processed.column(MINIMUM_NIGHTS)?.mapv(log1p);
        let review_score =
            &processed.column(REVIEWS_PER_MONTH)? * &processed.column(NUMBER_OF_REVIEWS)?;
        processed.push_column(LOG_PRICE, log_price)?;
        processed.push_column(MINIMUM_NIGHTS_LOG, minimum_nights_log)?;
        processed.push_column(REVIEW_SCORE, review_score)?;

        let features = processed.drop_columns(&[PRICE, REVIEWS_PER_MONTH_ORIGINAL])?;
        let target = processed.column(PRICE)?.to_owned();
        info!(
            "Feature matrix has {} rows and {} columns",
            features.nrows(),
            features.ncols()
        );

        Ok(Preprocessed {
            features,
            target,
            processed,
            neighbourhoods,
            power_transformer,
            group_encoder,
            room_encoder,
            encoding: Arc::clone(&self.encoding),
            dropped_rows,
        })
    }
}

fn indicator_columns(encoder: &OneHotEncoder, values: &Array2<f64>) -> Vec<(String, Array1<f64>)> {
    encoder
        .columns()
        .into_iter()
        .zip(values.axis_iter(Axis(1)))
        .map(|(name, column)| (name, column.to_owned()))
        .collect()
}

/// Indices of the rows whose `price` is strictly positive, in order.
pub fn positive_price_rows(table: &Table) -> Result<Vec<usize>, SchemaError> {
    let price = table.column(PRICE)?;
    Ok(price.iter().enumerate().filter(|&(_, &p)| p > 0.0).map(|(i, _)| i).collect())
}

/// Removes rows whose `price` is zero or negative. Applying it twice changes nothing.
pub fn filter_positive_price(table: &Table) -> Result<Table, SchemaError> {
    Ok(table.select_rows(&positive_price_rows(table)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::listing::fixtures::{listing, synthetic};
    use crate::errors::TransformError;
    use ndarray::array;

    fn scenario() -> RawTable {
        let mut first = listing("Brooklyn", "A", "Private room", 100.0);
        first.reviews_per_month = Some(1.0);
        let mut second = listing("Manhattan", "A", "Entire home/apt", 200.0);
        second.reviews_per_month = Some(2.5);
        let mut third = listing("Brooklyn", "B", "Private room", 0.0);
        third.reviews_per_month = None;
        RawTable::new(vec![first, second, third])
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let _ = env_logger::builder().is_test(true).try_init();
        let result = PreprocessingPipeline::new().build().run(&scenario()).unwrap();

        assert_eq!(result.features.nrows(), 2);
        assert_eq!(result.target, array![100.0, 200.0]);
        assert_eq!(result.dropped_rows, 1);
        assert_eq!(result.neighbourhoods, names(&["A", "A"]));
        let encoded = result.features.column(NEIGHBOURHOOD_ENCODED).unwrap();
        assert_eq!(encoded.to_vec(), vec![150.0, 150.0]);
    }

    #[test]
    fn test_neighbourhood_mean_includes_dropped_rows() {
        let raw = RawTable::new(vec![
            listing("Queens", "A", "Private room", 100.0),
            {
                let mut l = listing("Queens", "A", "Shared room", 0.0);
                l.reviews_per_month = Some(3.0);
                l
            },
            listing("Queens", "B", "Private room", 80.0),
        ]);
        let result = PreprocessingPipeline::new().build().run(&raw).unwrap();
        let encoded = result.features.column(NEIGHBOURHOOD_ENCODED).unwrap();
        assert_eq!(encoded.to_vec(), vec![50.0, 80.0]);
    }

    #[test]
    fn test_feature_and_processed_column_order() {
        let raw = RawTable::new(synthetic(40));
        let result = PreprocessingPipeline::new().build().run(&raw).unwrap();

        let expected_features = names(&[
            "latitude",
            "longitude",
            "minimum_nights",
            "number_of_reviews",
            "reviews_per_month",
            "calculated_host_listings_count",
            "availability_365",
            "neighbourhood_group_Brooklyn",
            "neighbourhood_group_Manhattan",
            "neighbourhood_group_Queens",
            "neighbourhood_group_Staten Island",
            "room_type_Private room",
            "room_type_Shared room",
            "neighbourhood_encoded",
            "log_price",
            "minimum_nights_log",
            "review_score",
        ]);
        assert!(result.features.ensure_columns(&expected_features).is_ok());
        assert_eq!(&result.processed.columns()[2], "price");
        assert_eq!(&result.processed.columns()[8], "reviews_per_month_original");
        assert_eq!(result.processed.ncols(), expected_features.len() + 2);
    }

    #[test]
    fn test_row_counts_stay_aligned() {
        let mut listings = synthetic(60);
        for l in listings.iter_mut().step_by(7) {
            l.price = 0.0;
        }
        let raw = RawTable::new(listings);
        let result = PreprocessingPipeline::new().build().run(&raw).unwrap();

        let n = result.target.len();
        assert_eq!(n, 60 - 9);
        assert_eq!(result.features.nrows(), n);
        assert_eq!(result.processed.nrows(), n);
        assert_eq!(result.neighbourhoods.len(), n);
        assert!(result.target.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_derived_columns() {
        let raw = RawTable::new(synthetic(30));
        let result = PreprocessingPipeline::new().build().run(&raw).unwrap();
        let features = &result.features;

        let price = result.processed.column(PRICE).unwrap();
        let log_price = features.column(LOG_PRICE).unwrap();
        let nights = features.column(MINIMUM_NIGHTS).unwrap();
        let nights_log = features.column(MINIMUM_NIGHTS_LOG).unwrap();
        let rpm = features.column(REVIEWS_PER_MONTH).unwrap();
        let reviews = features.column(NUMBER_OF_REVIEWS).unwrap();
        let score = features.column(REVIEW_SCORE).unwrap();
        for i in 0..features.nrows() {
            assert!((log_price[i] - (1.0 + price[i]).ln()).abs() < 1e-12);
            assert!((nights_log[i] - (1.0 + nights[i]).ln()).abs() < 1e-12);
            assert!((score[i] - rpm[i] * reviews[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_reviews_per_month_original_reconstructs_input() {
        let listings = synthetic(30);
        let expected: Vec<f64> =
            listings.iter().map(|l: &Listing| l.reviews_per_month.unwrap_or(0.0)).collect();
        let result = PreprocessingPipeline::new().build().run(&RawTable::new(listings)).unwrap();
        let restored = result.processed.column(REVIEWS_PER_MONTH_ORIGINAL).unwrap();
        for (a, b) in expected.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_filter_positive_price_is_idempotent() {
        let table = Table::new(
            names(&["price", "x"]),
            array![[10.0, 1.0], [0.0, 2.0], [-5.0, 3.0], [20.0, 4.0]],
        )
        .unwrap();
        let once = filter_positive_price(&table).unwrap();
        let twice = filter_positive_price(&once).unwrap();
        assert_eq!(once.values(), &array![[10.0, 1.0], [20.0, 4.0]]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_positive_prices() {
        let mut listings = synthetic(10);
        for l in listings.iter_mut() {
            l.price = 0.0;
        }
        let result = PreprocessingPipeline::new().build().run(&RawTable::new(listings));
        assert!(matches!(result, Err(PricingError::Data(DataError::NoPositivePrices))));
    }

    #[test]
    fn test_empty_table() {
        let result = PreprocessingPipeline::new().build().run(&RawTable::default());
        assert!(matches!(result, Err(PricingError::Data(DataError::EmptyTable))));
    }

    #[test]
    fn test_constant_reviews_per_month() {
        let mut listings = synthetic(10);
        for l in listings.iter_mut() {
            l.reviews_per_month = None;
        }
        let result = PreprocessingPipeline::new().build().run(&RawTable::new(listings));
        assert!(matches!(result, Err(PricingError::Transform(TransformError::ConstantInput))));
    }

    #[test]
    fn test_reencode_with_train_only_mean() {
        let raw = RawTable::new(vec![
            listing("Queens", "A", "Private room", 100.0),
            {
                let mut l = listing("Queens", "A", "Private room", 300.0);
                l.reviews_per_month = Some(2.0);
                l
            },
            listing("Bronx", "B", "Shared room", 50.0),
        ]);
        let result = PreprocessingPipeline::new().encoding(TrainOnlyMean).build().run(&raw).unwrap();
        let features = result.reencode(&[0, 2]).unwrap();
        let encoded = features.column(NEIGHBOURHOOD_ENCODED).unwrap();
        assert_eq!(encoded.to_vec(), vec![100.0, 100.0, 50.0]);

        let global = PreprocessingPipeline::new().build().run(&raw).unwrap();
        assert_eq!(global.reencode(&[0, 2]).unwrap(), global.features);
    }
}
