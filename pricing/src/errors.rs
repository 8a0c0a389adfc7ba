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

use thiserror::Error;

pub use crate::data::error::DataLoadError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Listing table has no rows")]
    EmptyTable,

    #[error("No listing has a positive price; nothing left to model")]
    NoPositivePrices,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Cannot fit a transform on empty input")]
    EmptyInput,

    #[error("Input contains NaN or infinite values")]
    NonFiniteInput,

    #[error("Input is constant; the power transform has no variance to stabilize")]
    ConstantInput,

    #[error("Lambda search did not converge after {iterations} iterations")]
    DidNotConverge { iterations: usize },

    #[error("Transform has not been fitted")]
    NotFitted,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Unexpected column '{0}'")]
    UnexpectedColumn(String),

    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("Column order mismatch at position {position}: expected '{expected}', found '{found}'")]
    ColumnOrder { position: usize, expected: String, found: String },

    #[error("Column count mismatch: expected {expected}, got {actual}")]
    ColumnCount { expected: usize, actual: usize },

    #[error("Row count mismatch: expected {expected}, got {actual}")]
    RowCount { expected: usize, actual: usize },

    #[error("Unknown category '{value}' for column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("Value {value} is out of range for '{column}'")]
    OutOfRange { column: String, value: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("Empty input provided")]
    EmptyInput,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Input contains NaN or infinite values")]
    InvalidNumericValue,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelFitError {
    #[error("Empty input provided")]
    EmptyInput,

    #[error("Feature matrix has no columns")]
    NoFeatures,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Input contains NaN or infinite values")]
    InvalidNumericValue,

    #[error("Need at least {required} samples, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Model has not been fitted")]
    NotFitted,

    #[error("Metric error: {0}")]
    Metric(#[from] MetricError),
}

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Data load error: {0}")]
    DataLoad(#[from] DataLoadError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Model fit error: {0}")]
    ModelFit(#[from] ModelFitError),
}
