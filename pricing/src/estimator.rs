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

use std::collections::HashMap;

use libm::log1p;
use log::{debug, info};

use crate::classical::{RandomForestRegressor, Regressor};
use crate::data::Table;
use crate::errors::{ModelFitError, PricingError, SchemaError};
use crate::preprocessing::{
    AVAILABILITY_365, HOST_LISTINGS_COUNT, LATITUDE, LOG_PRICE, LONGITUDE, MINIMUM_NIGHTS,
    MINIMUM_NIGHTS_LOG, NEIGHBOURHOOD_ENCODED, NUMBER_OF_REVIEWS, OneHotEncoder, Preprocessed,
    REVIEW_SCORE, REVIEWS_PER_MONTH,
};
use crate::scalers::PowerTransformer;

/// Accepted range of the neighbourhood mean price supplied by the user.
pub const NEIGHBOURHOOD_PRICE_RANGE: (f64, f64) = (20.0, 500.0);

/// Attributes of a listing whose price is to be estimated.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingInput {
    pub latitude: f64,
    pub longitude: f64,
    pub minimum_nights: u32,
    pub number_of_reviews: u32,
    pub reviews_per_month: f64,
    pub calculated_host_listings_count: u32,
    pub availability_365: u32,
    /// Mean nightly price of the listing's neighbourhood.
    pub neighbourhood_encoded: f64,
    pub neighbourhood_group: String,
    pub room_type: String,
}

impl Default for ListingInput {
    fn default() -> Self {
        ListingInput {
            latitude: 40.75,
            longitude: -73.98,
            minimum_nights: 3,
            number_of_reviews: 10,
            reviews_per_month: 0.5,
            calculated_host_listings_count: 1,
            availability_365: 180,
            neighbourhood_encoded: 150.0,
            neighbourhood_group: "Brooklyn".to_string(),
            room_type: "Private room".to_string(),
        }
    }
}

fn out_of_range(column: &str, value: f64) -> SchemaError {
    SchemaError::OutOfRange { column: column.to_string(), value }
}

impl ListingInput {
    pub fn validate(&self) -> Result<(), SchemaError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(out_of_range(LATITUDE, self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(out_of_range(LONGITUDE, self.longitude));
        }
        if self.minimum_nights < 1 {
            return Err(out_of_range(MINIMUM_NIGHTS, f64::from(self.minimum_nights)));
        }
        if !self.reviews_per_month.is_finite() || self.reviews_per_month < 0.0 {
            return Err(out_of_range(REVIEWS_PER_MONTH, self.reviews_per_month));
        }
        if self.calculated_host_listings_count < 1 {
            return Err(out_of_range(
                HOST_LISTINGS_COUNT,
                f64::from(self.calculated_host_listings_count),
            ));
        }
        if self.availability_365 > 365 {
            return Err(out_of_range(AVAILABILITY_365, f64::from(self.availability_365)));
        }
        let (low, high) = NEIGHBOURHOOD_PRICE_RANGE;
        if !(low..=high).contains(&self.neighbourhood_encoded) {
            return Err(out_of_range(NEIGHBOURHOOD_ENCODED, self.neighbourhood_encoded));
        }
        Ok(())
    }

    /// Assembles the one-row feature table the estimator expects.
    ///
    /// `reviews_per_month` goes through the same power transform as the training data and
    /// `review_score` is derived from the transformed value.
    pub fn to_feature_row(&self, estimator: &PriceEstimator) -> Result<Table, PricingError> {
        self.validate()?;
        let reviews_per_month =
            estimator.power_transformer.transform_value(self.reviews_per_month)?;
        let number_of_reviews = f64::from(self.number_of_reviews);
        let minimum_nights = f64::from(self.minimum_nights);

        let mut values: HashMap<String, f64> = HashMap::from([
            (LATITUDE.to_string(), self.latitude),
            (LONGITUDE.to_string(), self.longitude),
            (MINIMUM_NIGHTS.to_string(), minimum_nights),
            (NUMBER_OF_REVIEWS.to_string(), number_of_reviews),
            (REVIEWS_PER_MONTH.to_string(), reviews_per_month),
            (HOST_LISTINGS_COUNT.to_string(), f64::from(self.calculated_host_listings_count)),
            (AVAILABILITY_365.to_string(), f64::from(self.availability_365)),
            (NEIGHBOURHOOD_ENCODED.to_string(), self.neighbourhood_encoded),
            (MINIMUM_NIGHTS_LOG.to_string(), log1p(minimum_nights)),
            (REVIEW_SCORE.to_string(), reviews_per_month * number_of_reviews),
        ]);
        insert_indicators(&mut values, &estimator.group_encoder, &self.neighbourhood_group)?;
        insert_indicators(&mut values, &estimator.room_encoder, &self.room_type)?;

        let row = estimator
            .schema
            .iter()
            .map(|c| values.get(c).copied().ok_or_else(|| SchemaError::MissingColumn(c.clone())))
            .collect::<Result<Vec<f64>, SchemaError>>()?;
        Ok(Table::single_row(estimator.schema.clone(), row)?)
    }
}

fn insert_indicators(
    values: &mut HashMap<String, f64>,
    encoder: &OneHotEncoder,
    category: &str,
) -> Result<(), SchemaError> {
    let encoded = encoder.encode_value(category)?;
    values.extend(encoder.columns().into_iter().zip(encoded));
    Ok(())
}

pub struct PriceEstimatorBuilder {
    n_trees: usize,
    seed: u64,
}

impl PriceEstimatorBuilder {
    pub fn n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Trains a random forest on every preprocessed row.
    ///
    /// `log_price` is left out of the inference schema since it cannot be known for an
    /// unpriced listing.
    pub fn fit(self, data: &Preprocessed) -> Result<PriceEstimator, PricingError> {
        let features = data.features.drop_columns(&[LOG_PRICE])?;
        info!("Training price estimator on {} listings", features.nrows());

        let mut model = RandomForestRegressor::new().n_trees(self.n_trees).seed(self.seed).build();
        model.fit(features.values(), &data.target)?;

        let low = data.target.iter().copied().fold(f64::INFINITY, f64::min);
        let high = data.target.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        debug!("Estimator target range [{}, {}]", low, high);

        Ok(PriceEstimator {
            model,
            schema: features.columns().to_vec(),
            power_transformer: data.power_transformer.clone(),
            group_encoder: data.group_encoder.clone(),
            room_encoder: data.room_encoder.clone(),
            target_range: (low, high),
        })
    }
}

/// Estimates the nightly price of a single listing.
#[derive(Debug, Clone)]
pub struct PriceEstimator {
    model: RandomForestRegressor,
    schema: Vec<String>,
    power_transformer: PowerTransformer,
    group_encoder: OneHotEncoder,
    room_encoder: OneHotEncoder,
    target_range: (f64, f64),
}

impl PriceEstimator {
    pub fn new() -> PriceEstimatorBuilder {
        PriceEstimatorBuilder { n_trees: 100, seed: 42 }
    }

    /// Column names a feature row must have, in order.
    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    /// Lowest and highest price seen in training.
    pub fn target_range(&self) -> (f64, f64) {
        self.target_range
    }

    pub fn neighbourhood_groups(&self) -> &[String] {
        self.group_encoder.categories()
    }

    pub fn room_types(&self) -> &[String] {
        self.room_encoder.categories()
    }

    /// Predicts the price for a one-row table whose columns match [`schema`](Self::schema)
    /// exactly.
    pub fn predict(&self, row: &Table) -> Result<f64, PricingError> {
        row.ensure_columns(&self.schema)?;
        if row.nrows() != 1 {
            return Err(SchemaError::RowCount { expected: 1, actual: row.nrows() }.into());
        }
        let prediction = self.model.predict(row.values())?[0];
        if !prediction.is_finite() {
            return Err(ModelFitError::InvalidNumericValue.into());
        }
        Ok(prediction)
    }

    pub fn estimate(&self, input: &ListingInput) -> Result<f64, PricingError> {
        let row = input.to_feature_row(self)?;
        let price = self.predict(&row)?;
        info!("Estimated nightly price {:.2}", price);
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawTable;
    use crate::data::listing::fixtures::synthetic;
    use crate::preprocessing::PreprocessingPipeline;

    fn estimator() -> PriceEstimator {
        let data = PreprocessingPipeline::new().build().run(&RawTable::new(synthetic(90))).unwrap();
        PriceEstimator::new().n_trees(15).fit(&data).unwrap()
    }

    #[test]
    fn test_schema_excludes_log_price() {
        let estimator = estimator();
        assert!(!estimator.schema().iter().any(|c| c == LOG_PRICE));
        assert_eq!(estimator.schema().len(), 16);
        assert_eq!(estimator.schema()[0], LATITUDE);
        assert_eq!(estimator.schema()[15], REVIEW_SCORE);
    }

    #[test]
    fn test_estimate_within_training_range() {
        let estimator = estimator();
        let (low, high) = estimator.target_range();
        for room in ["Entire home/apt", "Private room", "Shared room"] {
            let input = ListingInput { room_type: room.to_string(), ..ListingInput::default() };
            let price = estimator.estimate(&input).unwrap();
            assert!(price.is_finite());
            assert!(price >= 0.0);
            assert!(price >= low && price <= high, "{} outside [{}, {}]", price, low, high);
        }
    }

    #[test]
    fn test_feature_row_values() {
        let estimator = estimator();
        let input = ListingInput { neighbourhood_group: "Queens".to_string(), ..Default::default() };
        let row = input.to_feature_row(&estimator).unwrap();

        assert!(row.ensure_columns(estimator.schema()).is_ok());
        assert_eq!(row.column("neighbourhood_group_Queens").unwrap()[0], 1.0);
        assert_eq!(row.column("neighbourhood_group_Brooklyn").unwrap()[0], 0.0);
        assert_eq!(row.column("room_type_Private room").unwrap()[0], 1.0);
        assert!((row.column(MINIMUM_NIGHTS_LOG).unwrap()[0] - 4.0_f64.ln()).abs() < 1e-12);
        let rpm = row.column(REVIEWS_PER_MONTH).unwrap()[0];
        assert_eq!(row.column(REVIEW_SCORE).unwrap()[0], rpm * 10.0);
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let estimator = estimator();
        let row = ListingInput::default().to_feature_row(&estimator).unwrap();
        let row = row.drop_columns(&[AVAILABILITY_365]).unwrap();
        let result = estimator.predict(&row);
        assert!(matches!(
            result,
            Err(PricingError::Schema(SchemaError::MissingColumn(c))) if c == AVAILABILITY_365
        ));
    }

    #[test]
    fn test_extra_and_reordered_columns_are_rejected() {
        let estimator = estimator();
        let mut row = ListingInput::default().to_feature_row(&estimator).unwrap();
        row.push_column(LOG_PRICE, ndarray::array![5.0]).unwrap();
        assert!(matches!(
            estimator.predict(&row),
            Err(PricingError::Schema(SchemaError::UnexpectedColumn(c))) if c == LOG_PRICE
        ));

        let mut schema = estimator.schema().to_vec();
        schema.swap(0, 1);
        let values = vec![0.0; schema.len()];
        let row = Table::single_row(schema, values).unwrap();
        assert!(matches!(
            estimator.predict(&row),
            Err(PricingError::Schema(SchemaError::ColumnOrder { position: 0, .. }))
        ));
    }

    #[test]
    fn test_invalid_inputs() {
        let estimator = estimator();
        let input = ListingInput { room_type: "Hotel room".to_string(), ..Default::default() };
        assert!(matches!(
            estimator.estimate(&input),
            Err(PricingError::Schema(SchemaError::UnknownCategory { .. }))
        ));

        let input = ListingInput { availability_365: 400, ..Default::default() };
        assert!(matches!(
            estimator.estimate(&input),
            Err(PricingError::Schema(SchemaError::OutOfRange { column, .. })) if column == AVAILABILITY_365
        ));

        let input = ListingInput { minimum_nights: 0, ..Default::default() };
        assert!(matches!(
            input.validate(),
            Err(SchemaError::OutOfRange { column, .. }) if column == MINIMUM_NIGHTS
        ));

        let input = ListingInput { neighbourhood_encoded: 900.0, ..Default::default() };
        assert!(input.validate().is_err());
    }
}
