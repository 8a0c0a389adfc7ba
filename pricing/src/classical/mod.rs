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

pub mod algorithms;
pub mod tree;

use ndarray::{Array1, Array2};

use crate::errors::ModelFitError;

pub use algorithms::{DecisionTreeRegressor, LinearRegression, RandomForestRegressor};
pub use tree::TreeNode;

/// A model mapping a feature matrix to a continuous target.
pub trait Regressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelFitError>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelFitError>;
}

pub(crate) fn validate_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelFitError> {
    if x.nrows() == 0 || y.is_empty() {
        return Err(ModelFitError::EmptyInput);
    }
    if x.ncols() == 0 {
        return Err(ModelFitError::NoFeatures);
    }
    if x.nrows() != y.len() {
        return Err(ModelFitError::DimensionMismatch { expected: x.nrows(), actual: y.len() });
    }
    if x.iter().any(|v| !v.is_finite()) || y.iter().any(|v| !v.is_finite()) {
        return Err(ModelFitError::InvalidNumericValue);
    }
    Ok(())
}

pub(crate) fn validate_predict_input(
    x: &Array2<f64>,
    n_features: usize,
) -> Result<(), ModelFitError> {
    if x.ncols() != n_features {
        return Err(ModelFitError::DimensionMismatch { expected: n_features, actual: x.ncols() });
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ModelFitError::InvalidNumericValue);
    }
    Ok(())
}
