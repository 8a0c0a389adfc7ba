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

//! Price modelling for the New York City Airbnb listings dataset.
//!
//! The crate loads the listings CSV, turns it into a numeric feature matrix, compares a
//! linear model, a decision tree and a random forest on a holdout split, and estimates
//! the nightly price of a single listing. [`dashboard::Dashboard`] exposes the same steps
//! page by page.

pub mod classical;
pub mod dashboard;
pub mod data;
pub mod errors;
pub mod estimator;
pub mod evaluation;
pub mod explore;
pub mod metrics;
pub mod preprocessing;
pub mod scalers;

pub use ndarray;

pub use dashboard::{Dashboard, DashboardConfig, Section};
pub use data::{DataSource, DatasetService, Listing, RawTable, Table};
pub use errors::PricingError;
pub use estimator::{ListingInput, PriceEstimator};
pub use evaluation::{EvaluationConfig, ModelEvaluator, ModelKind};
pub use preprocessing::{Preprocessed, PreprocessingPipeline};
