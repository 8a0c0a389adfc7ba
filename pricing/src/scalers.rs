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

use libm::{expm1, log1p, pow};
use log::debug;
use ndarray::{Array1, Array2, Axis, Zip};

use crate::errors::TransformError;

const LAMBDA_BOUNDS: (f64, f64) = (-5.0, 5.0);
const LAMBDA_TOLERANCE: f64 = 1e-9;
const MAX_SEARCH_ITERATIONS: usize = 200;

pub trait Scaler {
    fn fit(&mut self, x: &Array2<f64>) -> Result<(), TransformError>;

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, TransformError>;

    fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, TransformError>;

    fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>, TransformError> {
        self.fit(x)?;
        self.transform(x)
    }
}

fn validate(x: &Array2<f64>) -> Result<(), TransformError> {
    if x.is_empty() {
        return Err(TransformError::EmptyInput);
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(TransformError::NonFiniteInput);
    }
    Ok(())
}

fn check_width(expected: usize, x: &Array2<f64>) -> Result<(), TransformError> {
    if x.ncols() != expected {
        return Err(TransformError::DimensionMismatch { expected, actual: x.ncols() });
    }
    Ok(())
}

/// Centers each column to zero mean and scales it to unit (population) variance.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    std: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        StandardScaler { mean: None, std: None }
    }

    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }

    pub fn std(&self) -> Option<&Array1<f64>> {
        self.std.as_ref()
    }

    fn params(&self) -> Result<(&Array1<f64>, &Array1<f64>), TransformError> {
        match (&self.mean, &self.std) {
            (Some(mean), Some(std)) => Ok((mean, std)),
            _ => Err(TransformError::NotFitted),
        }
    }
}

impl Scaler for StandardScaler {
    fn fit(&mut self, x: &Array2<f64>) -> Result<(), TransformError> {
        validate(x)?;
        let mean = x.mean_axis(Axis(0)).ok_or(TransformError::EmptyInput)?;
        let std = x.var_axis(Axis(0), 0.0).mapv(f64::sqrt);
        self.mean = Some(mean);
        // Constant columns are only centered.
        self.std = Some(std.mapv(|s| if s == 0.0 { 1.0 } else { s }));
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, TransformError> {
        let (mean, std) = self.params()?;
        check_width(mean.len(), x)?;
        Ok((x - mean) / std)
    }

    fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, TransformError> {
        let (mean, std) = self.params()?;
        check_width(mean.len(), x)?;
        Ok(x * std + mean)
    }
}

/// Yeo-Johnson transform of a single value.
pub fn yeo_johnson(x: f64, lambda: f64) -> f64 {
    if x >= 0.0 {
        if lambda.abs() < f64::EPSILON { log1p(x) } else { (pow(x + 1.0, lambda) - 1.0) / lambda }
    } else if (lambda - 2.0).abs() > f64::EPSILON {
        -(pow(1.0 - x, 2.0 - lambda) - 1.0) / (2.0 - lambda)
    } else {
        -log1p(-x)
    }
}

/// Inverse of [`yeo_johnson`] for the same `lambda`.
pub fn yeo_johnson_inverse(y: f64, lambda: f64) -> f64 {
    if y >= 0.0 {
        if lambda.abs() < f64::EPSILON {
            expm1(y)
        } else {
            pow(y * lambda + 1.0, 1.0 / lambda) - 1.0
        }
    } else if (lambda - 2.0).abs() > f64::EPSILON {
        1.0 - pow(1.0 - (2.0 - lambda) * y, 1.0 / (2.0 - lambda))
    } else {
        -expm1(-y)
    }
}

/// Negative Yeo-Johnson log-likelihood of `lambda` for the sample `x`.
fn negative_log_likelihood(x: &[f64], lambda: f64) -> f64 {
    let n = x.len() as f64;
    let transformed: Vec<f64> = x.iter().map(|&v| yeo_johnson(v, lambda)).collect();
    let mean = transformed.iter().sum::<f64>() / n;
    let var = transformed.iter().map(|t| (t - mean) * (t - mean)).sum::<f64>() / n;
    if !var.is_finite() || var < f64::MIN_POSITIVE {
        return f64::INFINITY;
    }
    let jacobian = x.iter().map(|&v| v.signum() * log1p(v.abs())).sum::<f64>();
    n / 2.0 * var.ln() - (lambda - 1.0) * jacobian
}

/// Maximum-likelihood lambda by golden-section search over [`LAMBDA_BOUNDS`].
fn fit_lambda(x: &[f64]) -> Result<f64, TransformError> {
    let ratio = (5.0_f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = LAMBDA_BOUNDS;
    let mut c = b - ratio * (b - a);
    let mut d = a + ratio * (b - a);
    let mut fc = negative_log_likelihood(x, c);
    let mut fd = negative_log_likelihood(x, d);

    for _ in 0..MAX_SEARCH_ITERATIONS {
        if (b - a).abs() < LAMBDA_TOLERANCE {
            let lambda = (a + b) / 2.0;
            if !negative_log_likelihood(x, lambda).is_finite() {
                break;
            }
            return Ok(lambda);
        }
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - ratio * (b - a);
            fc = negative_log_likelihood(x, c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + ratio * (b - a);
            fd = negative_log_likelihood(x, d);
        }
    }
    Err(TransformError::DidNotConverge { iterations: MAX_SEARCH_ITERATIONS })
}

/// Yeo-Johnson power transform with a per-column maximum-likelihood lambda, optionally
/// followed by standardization (on by default).
#[derive(Debug, Clone)]
pub struct PowerTransformer {
    lambdas: Option<Array1<f64>>,
    standardize: bool,
    scaler: StandardScaler,
}

impl Default for PowerTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerTransformer {
    pub fn new() -> Self {
        PowerTransformer { lambdas: None, standardize: true, scaler: StandardScaler::new() }
    }

    pub fn with_standardize(mut self, standardize: bool) -> Self {
        self.standardize = standardize;
        self
    }

    pub fn lambdas(&self) -> Option<&Array1<f64>> {
        self.lambdas.as_ref()
    }

    /// The lambda of the first column, the usual case of a single-column fit.
    pub fn lambda(&self) -> Option<f64> {
        self.lambdas.as_ref().and_then(|l| l.first().copied())
    }

    /// Transforms one value of a single-column fit.
    pub fn transform_value(&self, value: f64) -> Result<f64, TransformError> {
        let x = Array2::from_elem((1, 1), value);
        Ok(self.transform(&x)?[[0, 0]])
    }

    fn apply(
        &self,
        x: &Array2<f64>,
        f: fn(f64, f64) -> f64,
    ) -> Result<Array2<f64>, TransformError> {
        let lambdas = self.lambdas.as_ref().ok_or(TransformError::NotFitted)?;
        check_width(lambdas.len(), x)?;
        let mut out = x.clone();
        for (mut column, &lambda) in out.axis_iter_mut(Axis(1)).zip(lambdas.iter()) {
            column.mapv_inplace(|v| f(v, lambda));
        }
        Ok(out)
    }
}

impl Scaler for PowerTransformer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<(), TransformError> {
        validate(x)?;
        let mut lambdas = Array1::zeros(x.ncols());
        for (j, column) in x.axis_iter(Axis(1)).enumerate() {
            let first = column[0];
            if column.iter().all(|&v| v == first) {
                return Err(TransformError::ConstantInput);
            }
            let values: Vec<f64> = column.to_vec();
            lambdas[j] = fit_lambda(&values)?;
        }
        debug!("Fitted Yeo-Johnson lambdas {:?}", lambdas);
        self.lambdas = Some(lambdas);

        if self.standardize {
            let transformed = self.apply(x, yeo_johnson)?;
            let variances = transformed.var_axis(Axis(0), 0.0);
            if variances.iter().any(|&v| v < f64::MIN_POSITIVE) {
                self.lambdas = None;
                return Err(TransformError::ConstantInput);
            }
            self.scaler.fit(&transformed)?;
        }
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, TransformError> {
        if x.iter().any(|v| !v.is_finite()) {
            return Err(TransformError::NonFiniteInput);
        }
        let transformed = self.apply(x, yeo_johnson)?;
        if self.standardize { self.scaler.transform(&transformed) } else { Ok(transformed) }
    }

    fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, TransformError> {
        let unscaled = if self.standardize { self.scaler.inverse_transform(x)? } else { x.clone() };
        let mut restored = self.apply(&unscaled, yeo_johnson_inverse)?;
        // Guard against tiny negative drift around zero from the round trip.
        Zip::from(&mut restored).and(&unscaled).for_each(|r, &u| {
            if u == 0.0 {
                *r = 0.0;
            }
        });
        Ok(restored)
    }
}
