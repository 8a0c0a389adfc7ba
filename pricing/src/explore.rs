use std::collections::HashMap;

use libm::log1p;
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;

use crate::data::{Listing, RAW_COLUMNS, RawTable, Table};
use crate::errors::{SchemaError, TransformError};
use crate::scalers::{PowerTransformer, Scaler};

/// Centre of the New York maps.
pub const MAP_CENTER: (f64, f64) = (40.76586, -73.98436);
pub const HEATMAP_SAMPLE: usize = 5000;
pub const CLUSTER_SAMPLE: usize = 1000;

/// Shape of the raw table and its first rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub rows: usize,
    pub columns: usize,
    pub column_names: &'static [&'static str],
    pub head: Vec<Listing>,
}

pub fn overview(table: &RawTable, n: usize) -> Overview {
    let (rows, columns) = table.shape();
    Overview {
        rows,
        columns,
        column_names: &RAW_COLUMNS,
        head: table.iter().take(n).cloned().collect(),
    }
}

fn is_missing(listing: &Listing, column: &str) -> bool {
    match column {
        "name" => listing.name.is_empty(),
        "host_name" => listing.host_name.is_empty(),
        "neighbourhood_group" => listing.neighbourhood_group.is_empty(),
        "neighbourhood" => listing.neighbourhood.is_empty(),
        "room_type" => listing.room_type.is_empty(),
        "last_review" => listing.last_review.is_none(),
        "reviews_per_month" => listing.reviews_per_month.is_none(),
        _ => false,
    }
}

/// Missing-value count per raw column, listing only columns with at least one gap.
pub fn missing_values(table: &RawTable) -> Vec<(&'static str, usize)> {
    RAW_COLUMNS
        .iter()
        .map(|&column| (column, table.iter().filter(|l| is_missing(l, column)).count()))
        .filter(|&(_, count)| count > 0)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Mean, median and extremes of the finite values. `None` when nothing is left.
pub fn summarize<I: IntoIterator<Item = f64>>(values: I) -> Option<Summary> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let count = sorted.len();
    let mid = count / 2;
    let median = if count % 2 == 0 { (sorted[mid - 1] + sorted[mid]) / 2.0 } else { sorted[mid] };
    Some(Summary {
        count,
        mean: sorted.iter().sum::<f64>() / count as f64,
        median,
        min: sorted[0],
        max: sorted[count - 1],
    })
}

/// Equal-width histogram over `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    let summary = summarize(values.iter().copied())?;
    if bins == 0 {
        return None;
    }
    let width = (summary.max - summary.min) / bins as f64;
    let edges = (0..=bins).map(|i| summary.min + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for &v in values.iter().filter(|v| v.is_finite()) {
        let bin = if width > 0.0 { ((v - summary.min) / width) as usize } else { 0 };
        counts[bin.min(bins - 1)] += 1;
    }
    Some(Histogram { edges, counts })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryColumn {
    NeighbourhoodGroup,
    RoomType,
    Neighbourhood,
}

impl CategoryColumn {
    pub fn name(&self) -> &'static str {
        match self {
            CategoryColumn::NeighbourhoodGroup => "neighbourhood_group",
            CategoryColumn::RoomType => "room_type",
            CategoryColumn::Neighbourhood => "neighbourhood",
        }
    }

    fn value<'a>(&self, listing: &'a Listing) -> &'a str {
        match self {
            CategoryColumn::NeighbourhoodGroup => &listing.neighbourhood_group,
            CategoryColumn::RoomType => &listing.room_type,
            CategoryColumn::Neighbourhood => &listing.neighbourhood,
        }
    }
}

/// Mean raw price per category, most expensive first.
pub fn mean_price_by(table: &RawTable, column: CategoryColumn) -> Vec<(String, f64)> {
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    for listing in table {
        let entry = sums.entry(column.value(listing)).or_insert((0.0, 0));
        entry.0 += listing.price;
        entry.1 += 1;
    }
    let mut means: Vec<(String, f64)> =
        sums.into_iter().map(|(k, (sum, n))| (k.to_string(), sum / n as f64)).collect();
    means.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    means
}

/// Pearson correlation between every pair of the selected columns, in selection order.
///
/// A constant column correlates as NaN with everything but itself.
pub fn correlation_matrix(table: &Table, columns: &[&str]) -> Result<Array2<f64>, SchemaError> {
    let mut centered = Vec::with_capacity(columns.len());
    for &name in columns {
        let column = table.column(name)?;
        let mean = column.mean().unwrap_or(0.0);
        centered.push(column.mapv(|v| v - mean));
    }
    let norms: Vec<f64> = centered.iter().map(|c| c.dot(c).sqrt()).collect();

    let n = columns.len();
    let mut corr = Array2::from_elem((n, n), f64::NAN);
    for i in 0..n {
        corr[[i, i]] = 1.0;
        for j in (i + 1)..n {
            if norms[i] == 0.0 || norms[j] == 0.0 {
                continue;
            }
            let r = (centered[i].dot(&centered[j]) / (norms[i] * norms[j])).clamp(-1.0, 1.0);
            corr[[i, j]] = r;
            corr[[j, i]] = r;
        }
    }
    Ok(corr)
}

/// A listing's position with the categories used to colour location scatter plots.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub neighbourhood_group: String,
    pub room_type: String,
}

pub fn locations(table: &RawTable) -> Vec<Location> {
    table
        .iter()
        .map(|l| Location {
            latitude: l.latitude,
            longitude: l.longitude,
            neighbourhood_group: l.neighbourhood_group.clone(),
            room_type: l.room_type.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

fn label(listing: &Listing) -> String {
    format!(
        "Room type: {}, Availability (365 days): {}, Price: ${}",
        listing.room_type, listing.availability_365, listing.price
    )
}

/// Up to `n` listings drawn without replacement, labelled for map markers.
pub fn map_sample(table: &RawTable, n: usize, seed: u64) -> Vec<MapPoint> {
    let listings = table.listings();
    let amount = n.min(listings.len());
    let mut rng = StdRng::seed_from_u64(seed);
    sample(&mut rng, listings.len(), amount)
        .into_iter()
        .map(|i| {
            let l = &listings[i];
            MapPoint { latitude: l.latitude, longitude: l.longitude, label: label(l) }
        })
        .collect()
}

/// Before and after views of the two transformed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessingDiagnostics {
    pub lambda: f64,
    pub reviews_before: Summary,
    pub reviews_after: Summary,
    pub reviews_before_histogram: Histogram,
    pub reviews_after_histogram: Histogram,
    pub minimum_nights_before: Summary,
    pub minimum_nights_after: Summary,
}

/// Fits the reviews-per-month power transform on every raw row (gaps as 0) and reports
/// the distributions either side of it, plus `minimum_nights` against its log.
pub fn preprocessing_diagnostics(
    table: &RawTable,
    bins: usize,
) -> Result<PreprocessingDiagnostics, TransformError> {
    let before: Vec<f64> = table.iter().map(|l| l.reviews_per_month.unwrap_or(0.0)).collect();
    let column = Array2::from_shape_vec((before.len(), 1), before.clone())
        .map_err(|_| TransformError::EmptyInput)?;
    let mut transformer = PowerTransformer::new();
    let after = transformer.fit_transform(&column)?.column(0).to_vec();
    let lambda = transformer.lambda().ok_or(TransformError::NotFitted)?;

    let nights: Vec<f64> = table.iter().map(|l| f64::from(l.minimum_nights)).collect();
    let nights_log: Vec<f64> = nights.iter().map(|&v| log1p(v)).collect();

    let summary = |values: &[f64]| summarize(values.iter().copied()).ok_or(TransformError::EmptyInput);
    let hist = |values: &[f64]| histogram(values, bins).ok_or(TransformError::EmptyInput);
    Ok(PreprocessingDiagnostics {
        lambda,
        reviews_before: summary(&before)?,
        reviews_after: summary(&after)?,
        reviews_before_histogram: hist(&before)?,
        reviews_after_histogram: hist(&after)?,
        minimum_nights_before: summary(&nights)?,
        minimum_nights_after: summary(&nights_log)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::listing::fixtures::{listing, synthetic};
    use ndarray::array;

    #[test]
    fn test_overview() {
        let table = RawTable::new(synthetic(12));
        let overview = overview(&table, 5);
        assert_eq!((overview.rows, overview.columns), (12, 16));
        assert_eq!(overview.head.len(), 5);
        assert_eq!(overview.head[0], table.listings()[0]);
    }

    #[test]
    fn test_missing_values() {
        let mut first = listing("Bronx", "A", "Private room", 10.0);
        first.reviews_per_month = None;
        first.last_review = None;
        let mut second = listing("Bronx", "A", "Private room", 20.0);
        second.host_name = String::new();
        second.reviews_per_month = None;
        let table = RawTable::new(vec![first, second]);

        assert_eq!(
            missing_values(&table),
            vec![("host_name", 1), ("last_review", 1), ("reviews_per_month", 2)]
        );
        assert!(missing_values(&RawTable::new(synthetic(5).into_iter().skip(1).collect())).is_empty());
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(vec![3.0, f64::NAN, 1.0, 10.0, 2.0]).unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, 4.0);
        assert_eq!(summary.median, 2.5);
        assert_eq!((summary.min, summary.max), (1.0, 10.0));
        assert!(summarize(Vec::<f64>::new()).is_none());
    }

    #[test]
    fn test_histogram() {
        let hist = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(hist.edges, vec![0.0, 2.0, 4.0]);
        assert_eq!(hist.counts, vec![2, 3]);
        assert_eq!(histogram(&[5.0, 5.0], 3).unwrap().counts, vec![2, 0, 0]);
    }

    #[test]
    fn test_mean_price_by_sorted_descending() {
        let table = RawTable::new(vec![
            listing("Bronx", "A", "Private room", 50.0),
            listing("Manhattan", "B", "Entire home/apt", 250.0),
            listing("Manhattan", "C", "Private room", 150.0),
            listing("Bronx", "D", "Shared room", 30.0),
        ]);
        let by_group = mean_price_by(&table, CategoryColumn::NeighbourhoodGroup);
        assert_eq!(by_group, vec![("Manhattan".to_string(), 200.0), ("Bronx".to_string(), 40.0)]);
        let by_room = mean_price_by(&table, CategoryColumn::RoomType);
        assert_eq!(by_room[0].0, "Entire home/apt");
        assert_eq!(by_room[2], ("Shared room".to_string(), 30.0));
    }

    #[test]
    fn test_correlation_matrix() {
        let table = Table::new(
            vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()],
            array![[1.0, 2.0, 3.0, 7.0], [2.0, 4.0, 2.0, 7.0], [3.0, 6.0, 1.0, 7.0]],
        )
        .unwrap();
        let corr = correlation_matrix(&table, &["a", "b", "c", "d"]).unwrap();
        assert!((corr[[0, 1]] - 1.0).abs() < 1e-12);
        assert!((corr[[0, 2]] + 1.0).abs() < 1e-12);
        assert_eq!(corr[[3, 3]], 1.0);
        assert!(corr[[0, 3]].is_nan());
        assert_eq!(corr[[1, 0]], corr[[0, 1]]);

        let subset = correlation_matrix(&table, &["c", "a"]).unwrap();
        assert_eq!(subset.dim(), (2, 2));
        assert!((subset[[0, 1]] + 1.0).abs() < 1e-12);
        assert!(matches!(
            correlation_matrix(&table, &["a", "zzz"]),
            Err(SchemaError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_map_sample() {
        let table = RawTable::new(synthetic(30));
        let points = map_sample(&table, 10, 42);
        assert_eq!(points.len(), 10);
        assert_eq!(points, map_sample(&table, 10, 42));
        assert_eq!(map_sample(&table, CLUSTER_SAMPLE, 1).len(), 30);

        let single = RawTable::new(vec![listing("Queens", "A", "Shared room", 80.0)]);
        assert_eq!(
            map_sample(&single, 1, 0)[0].label,
            "Room type: Shared room, Availability (365 days): 100, Price: $80"
        );
    }

    #[test]
    fn test_preprocessing_diagnostics() {
        let table = RawTable::new(synthetic(40));
        let diagnostics = preprocessing_diagnostics(&table, 10).unwrap();
        assert_eq!(diagnostics.reviews_before.count, 40);
        assert!(diagnostics.reviews_after.mean.abs() < 1e-9);
        assert_eq!(diagnostics.reviews_before_histogram.counts.iter().sum::<usize>(), 40);
        assert!(diagnostics.minimum_nights_after.max < diagnostics.minimum_nights_before.max);
        assert!(diagnostics.lambda.is_finite());
    }
}
