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

use ndarray::Array1;

use crate::errors::MetricError;

/// A regression metric comparing predictions against actual values.
pub trait Metric {
    fn name(&self) -> &'static str;

    fn calculate(&self, predictions: &Array1<f64>, actuals: &Array1<f64>)
    -> Result<f64, MetricError>;
}

fn validate(predictions: &Array1<f64>, actuals: &Array1<f64>) -> Result<(), MetricError> {
    if predictions.is_empty() || actuals.is_empty() {
        return Err(MetricError::EmptyInput);
    }

    if predictions.len() != actuals.len() {
        return Err(MetricError::DimensionMismatch {
            expected: predictions.len(),
            actual: actuals.len(),
        });
    }

    if predictions.iter().any(|&v| !v.is_finite()) || actuals.iter().any(|&v| !v.is_finite()) {
        return Err(MetricError::InvalidNumericValue);
    }
    Ok(())
}

pub struct MAE;

impl Metric for MAE {
    fn name(&self) -> &'static str {
        "MAE"
    }

    fn calculate(
        &self,
        predictions: &Array1<f64>,
        actuals: &Array1<f64>,
    ) -> Result<f64, MetricError> {
        validate(predictions, actuals)?;
        let diff = predictions - actuals;
        diff.mapv(f64::abs).mean().ok_or(MetricError::EmptyInput)
    }
}

pub struct MSE;

impl Metric for MSE {
    fn name(&self) -> &'static str {
        "MSE"
    }

    fn calculate(
        &self,
        predictions: &Array1<f64>,
        actuals: &Array1<f64>,
    ) -> Result<f64, MetricError> {
        validate(predictions, actuals)?;
        let diff = predictions - actuals;
        diff.mapv(|x| x * x).mean().ok_or(MetricError::EmptyInput)
    }
}

pub struct RMSE;

impl Metric for RMSE {
    fn name(&self) -> &'static str {
        "RMSE"
    }

    fn calculate(
        &self,
        predictions: &Array1<f64>,
        actuals: &Array1<f64>,
    ) -> Result<f64, MetricError> {
        Ok(MSE.calculate(predictions, actuals)?.sqrt())
    }
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// When the actuals are constant `SS_tot` is zero; the score is then 1.0 for a perfect
/// fit and 0.0 otherwise.
pub struct R2Score;

impl Metric for R2Score {
    fn name(&self) -> &'static str {
        "R2"
    }

    fn calculate(
        &self,
        predictions: &Array1<f64>,
        actuals: &Array1<f64>,
    ) -> Result<f64, MetricError> {
        validate(predictions, actuals)?;
        let mean = actuals.mean().ok_or(MetricError::EmptyInput)?;
        let ss_res = (actuals - predictions).mapv(|x| x * x).sum();
        let ss_tot = actuals.mapv(|y| (y - mean) * (y - mean)).sum();
        if ss_tot == 0.0 {
            return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
        }
        Ok(1.0 - ss_res / ss_tot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, array};

    #[test]
    fn test_mae_empty_input() {
        let predictions: Array1<f64> = Array1::zeros(0);
        let actuals = array![1.0];
        let result = MAE.calculate(&predictions, &actuals);
        assert!(matches!(result, Err(MetricError::EmptyInput)));
    }

    #[test]
    fn test_mse_dimension_mismatch() {
        let predictions = array![1.0, 2.0];
        let actuals = array![1.0, 2.0, 3.0];
        let result = MSE.calculate(&predictions, &actuals);
        assert!(matches!(result, Err(MetricError::DimensionMismatch { expected: 2, actual: 3 })));
    }

    #[test]
    fn test_r2_invalid_numeric_value() {
        let predictions = array![1.0, f64::NAN];
        let actuals = array![1.0, 2.0];
        let result = R2Score.calculate(&predictions, &actuals);
        assert!(matches!(result, Err(MetricError::InvalidNumericValue)));
    }

    #[test]
    fn test_error_metrics() {
        let predictions = array![110.0, 90.0, 200.0];
        let actuals = array![100.0, 100.0, 180.0];
        let mae = MAE.calculate(&predictions, &actuals).unwrap();
        let mse = MSE.calculate(&predictions, &actuals).unwrap();
        let rmse = RMSE.calculate(&predictions, &actuals).unwrap();
        assert!((mae - 40.0 / 3.0).abs() < 1e-12);
        assert!((mse - 200.0).abs() < 1e-12);
        assert!((rmse - 200.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_r2_score() {
        let actuals = array![1.0, 2.0, 3.0, 4.0];
        assert_eq!(R2Score.calculate(&actuals, &actuals).unwrap(), 1.0);

        let mean_prediction = Array1::from_elem(4, 2.5);
        assert!(R2Score.calculate(&mean_prediction, &actuals).unwrap().abs() < 1e-12);

        let predictions = array![1.5, 2.0, 3.0, 3.5];
        let r2 = R2Score.calculate(&predictions, &actuals).unwrap();
        assert!((r2 - (1.0 - 0.5 / 5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_r2_constant_actuals() {
        let actuals = array![5.0, 5.0, 5.0];
        assert_eq!(R2Score.calculate(&actuals, &actuals).unwrap(), 1.0);
        assert_eq!(R2Score.calculate(&array![5.0, 6.0, 5.0], &actuals).unwrap(), 0.0);
    }
}
