use std::env;

use airbnb_pricing::{
    Dashboard, DashboardConfig, DataSource, ListingInput, ModelKind, Section,
    evaluation::ComparisonMetric,
};

#[tokio::main]
async fn main() {
    env_logger::init();

    // Path to the listings CSV, e.g. AB_NYC_2019.csv from Kaggle
    let path = env::args().nth(1).unwrap_or_else(|| "AB_NYC_2019.csv".to_string());
    let mut dashboard = Dashboard::new(DashboardConfig::new(DataSource::path(path)));

    let home = match dashboard.home() {
        Ok(home) => home,
        Err(e) => {
            eprintln!("Could not load the dataset: {}", e);
            return;
        }
    };
    println!("== Home ==");
    println!("Dataset shape: {} rows x {} columns", home.overview.rows, home.overview.columns);
    for listing in &home.overview.head {
        println!(
            "  {} | {} | {} | ${}",
            listing.name, listing.neighbourhood_group, listing.room_type, listing.price
        );
    }

    if let Ok(inspection) = dashboard.inspection() {
        println!("\n== Data inspection ==");
        for (column, count) in &inspection.missing_values {
            println!("  {:<32} {} missing", column, count);
        }
        if let Some(summary) = inspection.reviews_per_month {
            println!(
                "  reviews_per_month mean {:.3}, median {:.3}",
                summary.mean, summary.median
            );
        }
    }

    if let Ok(page) = dashboard.preprocessing() {
        println!("\n== Preprocessing ==");
        match &page.diagnostics {
            Section::Ready(d) => {
                println!("  Yeo-Johnson lambda: {:.4}", d.lambda);
                println!(
                    "  reviews_per_month mean {:.3} -> {:.3}, median {:.3} -> {:.3}",
                    d.reviews_before.mean,
                    d.reviews_after.mean,
                    d.reviews_before.median,
                    d.reviews_after.median
                );
                println!(
                    "  minimum_nights max {:.0} -> {:.3} after log1p",
                    d.minimum_nights_before.max, d.minimum_nights_after.max
                );
            }
            Section::Failed(message) => println!("  {}", message),
        }
        if let Section::Ready(processed) = &page.processed {
            println!(
                "  {} rows kept, {} dropped, {} columns",
                processed.rows,
                processed.dropped_rows,
                processed.columns.len()
            );
        }
    }

    if let Ok(page) = dashboard.model_results() {
        println!("\n== Model results ==");
        match &page.evaluation {
            Section::Ready(evaluation) => {
                for kind in ModelKind::ALL {
                    match evaluation.report(kind) {
                        Ok(report) => println!(
                            "  {:<18} MAE {:>8.2}  MSE {:>12.2}  R2 {:>6.3}",
                            kind.name(),
                            report.mae,
                            report.mse,
                            report.r2
                        ),
                        Err(e) => println!("  {:<18} failed: {}", kind.name(), e),
                    }
                }
                if let Some(best) = evaluation.comparison().best_by(ComparisonMetric::R2) {
                    println!("  Best model by R2: {}", best.model);
                }
                if let Some(text) = &evaluation.tree_text {
                    println!("\n{}", text);
                }
            }
            Section::Failed(message) => println!("  {}", message),
        }
        for (group, price) in &page.price_by_neighbourhood_group {
            println!("  {:<16} ${:.2}", group, price);
        }
        for (room, price) in &page.price_by_room_type {
            println!("  {:<16} ${:.2}", room, price);
        }
    }

    if let Ok(map) = dashboard.map() {
        println!("\n== Map ==");
        println!(
            "  centre {:?}, {} heat-map points, {} clustered markers",
            map.center,
            map.heatmap.len(),
            map.clusters.len()
        );
        if let Some(point) = map.clusters.first() {
            println!("  e.g. {}", point.label);
        }
    }

    let input = ListingInput::default();
    if let Ok(page) = dashboard.price_estimate(&input) {
        println!("\n== Price estimate ==");
        match page.price {
            Section::Ready(price) => println!(
                "  {} in {}: ${:.2} per night",
                input.room_type, input.neighbourhood_group, price
            ),
            Section::Failed(message) => println!("  {}", message),
        }
    }
}
