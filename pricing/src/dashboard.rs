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

use std::fmt::Display;
use std::sync::Arc;

use log::{error, info};
use ndarray::Array2;

use crate::data::error::DataLoadError;
use crate::data::{DataSource, DatasetService, RawTable};
use crate::errors::PricingError;
use crate::estimator::{ListingInput, PriceEstimator};
use crate::evaluation::{Evaluation, EvaluationConfig, ModelEvaluator};
use crate::explore::{
    self, CLUSTER_SAMPLE, CategoryColumn, HEATMAP_SAMPLE, Location, MAP_CENTER, MapPoint,
    Overview, PreprocessingDiagnostics, Summary,
};
use crate::preprocessing::encoding::{GlobalMean, TargetEncoding};
use crate::preprocessing::{Preprocessed, PreprocessingPipeline};

const HEAD_ROWS: usize = 5;
const HISTOGRAM_BINS: usize = 50;

/// Settings shared by every page.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub source: DataSource,
    pub seed: u64,
    pub test_ratio: f64,
    pub tree_depth: usize,
    pub forest_size: usize,
    pub encoding: Arc<dyn TargetEncoding>,
    pub heatmap_sample: usize,
    pub cluster_sample: usize,
}

impl DashboardConfig {
    pub fn new(source: DataSource) -> Self {
        DashboardConfig {
            source,
            seed: 42,
            test_ratio: 0.2,
            tree_depth: 4,
            forest_size: 100,
            encoding: Arc::new(GlobalMean),
            heatmap_sample: HEATMAP_SAMPLE,
            cluster_sample: CLUSTER_SAMPLE,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_test_ratio(mut self, test_ratio: f64) -> Self {
        self.test_ratio = test_ratio;
        self
    }

    pub fn with_tree_depth(mut self, tree_depth: usize) -> Self {
        self.tree_depth = tree_depth;
        self
    }

    pub fn with_forest_size(mut self, forest_size: usize) -> Self {
        self.forest_size = forest_size;
        self
    }

    pub fn with_encoding(mut self, encoding: impl TargetEncoding + 'static) -> Self {
        self.encoding = Arc::new(encoding);
        self
    }

    pub fn with_heatmap_sample(mut self, n: usize) -> Self {
        self.heatmap_sample = n;
        self
    }

    pub fn with_cluster_sample(mut self, n: usize) -> Self {
        self.cluster_sample = n;
        self
    }

    fn evaluation(&self) -> EvaluationConfig {
        EvaluationConfig::new()
            .with_seed(self.seed)
            .with_test_ratio(self.test_ratio)
            .with_tree_depth(self.tree_depth)
            .with_forest_size(self.forest_size)
    }
}

/// One stage of a page. A failed stage carries the message shown in its place.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Ready(T),
    Failed(String),
}

impl<T> Section<T> {
    fn from_result<E: Display>(stage: &str, result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Section::Ready(value),
            Err(e) => {
                error!("{} failed: {}", stage, e);
                Section::Failed(format!("{}: {}", stage, e))
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            Section::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HomePage {
    pub overview: Overview,
}

#[derive(Debug, Clone)]
pub struct InspectionPage {
    pub missing_values: Vec<(&'static str, usize)>,
    /// Non-missing `reviews_per_month` values; `None` when every value is missing.
    pub reviews_per_month: Option<Summary>,
}

/// Shape of the model-ready table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSummary {
    pub rows: usize,
    pub columns: Vec<String>,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone)]
pub struct PreprocessingPage {
    pub diagnostics: Section<PreprocessingDiagnostics>,
    pub processed: Section<ProcessedSummary>,
}

#[derive(Debug, Clone)]
pub struct Correlation {
    pub columns: Vec<String>,
    pub matrix: Array2<f64>,
}

#[derive(Debug, Clone)]
pub struct ModelResultsPage {
    pub evaluation: Section<Evaluation>,
    pub correlation: Section<Correlation>,
    pub price_by_neighbourhood_group: Vec<(String, f64)>,
    pub price_by_room_type: Vec<(String, f64)>,
}

#[derive(Debug, Clone)]
pub struct MapPage {
    pub center: (f64, f64),
    pub locations: Vec<Location>,
    pub heatmap: Vec<MapPoint>,
    pub clusters: Vec<MapPoint>,
}

#[derive(Debug, Clone)]
pub struct PriceEstimatePage {
    pub input: ListingInput,
    pub price: Section<f64>,
}

/// The dashboard pages over one cached dataset.
///
/// Every page reloads nothing but re-fits whatever models it shows.
#[derive(Debug)]
pub struct Dashboard {
    service: DatasetService,
    config: DashboardConfig,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Dashboard { service: DatasetService::new(config.source.clone()), config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Points the dashboard at a new dataset, e.g. an uploaded file.
    pub fn replace_source(&mut self, source: DataSource) {
        self.config.source = source.clone();
        self.service.replace_source(source);
    }

    fn table(&mut self, page: &str) -> Result<RawTable, DataLoadError> {
        info!("Rendering {} page", page);
        self.service.table().map_err(|e| {
            error!("Could not load data for the {} page: {}", page, e);
            e
        })
    }

    fn preprocess(&self, table: &RawTable) -> Result<Preprocessed, PricingError> {
        PreprocessingPipeline::new()
            .shared_encoding(Arc::clone(&self.config.encoding))
            .build()
            .run(table)
    }

    pub fn home(&mut self) -> Result<HomePage, DataLoadError> {
        let table = self.table("home")?;
        Ok(HomePage { overview: explore::overview(&table, HEAD_ROWS) })
    }

    pub fn inspection(&mut self) -> Result<InspectionPage, DataLoadError> {
        let table = self.table("inspection")?;
        Ok(InspectionPage {
            missing_values: explore::missing_values(&table),
            reviews_per_month: explore::summarize(table.iter().filter_map(|l| l.reviews_per_month)),
        })
    }

    pub fn preprocessing(&mut self) -> Result<PreprocessingPage, DataLoadError> {
        let table = self.table("preprocessing")?;
        let diagnostics = Section::from_result(
            "Preprocessing diagnostics",
            explore::preprocessing_diagnostics(&table, HISTOGRAM_BINS),
        );
        let processed = self.preprocess(&table).map(|p| ProcessedSummary {
            rows: p.processed.nrows(),
            columns: p.processed.columns().to_vec(),
            dropped_rows: p.dropped_rows,
        });
        Ok(PreprocessingPage {
            diagnostics,
            processed: Section::from_result("Preprocessing", processed),
        })
    }

    pub fn model_results(&mut self) -> Result<ModelResultsPage, DataLoadError> {
        let table = self.table("model results")?;
        let (evaluation, correlation) = match self.preprocess(&table) {
            Ok(data) => {
                let evaluation = ModelEvaluator::new(self.config.evaluation()).evaluate(&data);
                let columns = data.processed.columns().to_vec();
                let names: Vec<&str> = columns.iter().map(|c| c.as_str()).collect();
                let correlation = explore::correlation_matrix(&data.processed, &names)
                    .map(|matrix| Correlation { columns: columns.clone(), matrix });
                (
                    Section::from_result("Model evaluation", evaluation),
                    Section::from_result("Correlation", correlation),
                )
            }
            Err(e) => {
                error!("Preprocessing failed: {}", e);
                let message = format!("Preprocessing: {}", e);
                (Section::Failed(message.clone()), Section::Failed(message))
            }
        };
        Ok(ModelResultsPage {
            evaluation,
            correlation,
            price_by_neighbourhood_group: explore::mean_price_by(
                &table,
                CategoryColumn::NeighbourhoodGroup,
            ),
            price_by_room_type: explore::mean_price_by(&table, CategoryColumn::RoomType),
        })
    }

    pub fn map(&mut self) -> Result<MapPage, DataLoadError> {
        let table = self.table("map")?;
        Ok(MapPage {
            center: MAP_CENTER,
            locations: explore::locations(&table),
            heatmap: explore::map_sample(&table, self.config.heatmap_sample, self.config.seed),
            clusters: explore::map_sample(&table, self.config.cluster_sample, self.config.seed),
        })
    }

    pub fn price_estimate(
        &mut self,
        input: &ListingInput,
    ) -> Result<PriceEstimatePage, DataLoadError> {
        let table = self.table("price estimate")?;
        let price = self.preprocess(&table).and_then(|data| {
            PriceEstimator::new()
                .n_trees(self.config.forest_size)
                .seed(self.config.seed)
                .fit(&data)?
                .estimate(input)
        });
        Ok(PriceEstimatePage {
            input: input.clone(),
            price: Section::from_result("Price estimate", price),
        })
    }
}
