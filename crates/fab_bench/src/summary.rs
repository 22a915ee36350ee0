use crate::case_result::{CaseMetrics, CaseResult};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

type Extractor = (&'static str, Box<dyn Fn(&CaseMetrics) -> f64>);

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub case_count: usize,
    pub constrained_count: usize,
    pub metrics: Vec<MetricSummary>,
}

#[derive(Debug, Serialize)]
pub struct MetricSummary {
    pub name: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
}

/// One extractor per aggregated metric; both the console summary and
/// `summary.json` run off this list, so the two always agree.
fn metric_extractors() -> Vec<Extractor> {
    vec![
        ("demand_total", Box::new(|m| m.demand_total)),
        ("extracted_total", Box::new(|m| m.extracted_total)),
        ("produced_total", Box::new(|m| m.produced_total)),
        ("stock_total", Box::new(|m| m.stock_total)),
        ("shortfall_count", Box::new(|m| m.shortfall_count as f64)),
        ("deficit_total", Box::new(|m| m.deficit_total)),
        ("stalled_count", Box::new(|m| m.stalled_count as f64)),
        ("skipped_count", Box::new(|m| m.skipped_count as f64)),
        (
            "input_short_count",
            Box::new(|m| m.input_short_count as f64),
        ),
        ("event_count", Box::new(|m| m.event_count as f64)),
    ]
}

pub fn compute_summary(results: &[CaseResult]) -> SummaryStats {
    let case_count = results.len();
    let constrained_count = results.iter().filter(|r| r.constrained).count();

    let metrics = metric_extractors()
        .iter()
        .map(|(name, extract)| {
            let values: Vec<f64> = results.iter().map(|r| extract(&r.metrics)).collect();
            compute_metric_summary(name, &values)
        })
        .collect();

    SummaryStats {
        case_count,
        constrained_count,
        metrics,
    }
}

fn compute_metric_summary(name: &str, values: &[f64]) -> MetricSummary {
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    let stddev = variance.sqrt();

    MetricSummary {
        name: name.to_string(),
        mean,
        min,
        max,
        stddev,
    }
}

/// Aggregates in the map form `{ "name": { "mean": ..., ... }, ... }` used
/// inside `summary.json`.
pub fn build_aggregated_metrics(results: &[CaseResult]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (name, extract) in &metric_extractors() {
        let values: Vec<f64> = results.iter().map(|r| extract(&r.metrics)).collect();
        let summary = compute_metric_summary(name, &values);
        map.insert(
            (*name).to_string(),
            serde_json::json!({
                "mean": summary.mean,
                "min": summary.min,
                "max": summary.max,
                "stddev": summary.stddev,
            }),
        );
    }
    serde_json::Value::Object(map)
}

pub fn print_summary(scenario_name: &str, stats: &SummaryStats) {
    println!("\n=== {} ({} cases) ===\n", scenario_name, stats.case_count);
    println!(
        "{:<20} {:>12} {:>12} {:>12} {:>12}",
        "Metric", "Mean", "Min", "Max", "StdDev"
    );
    println!("{}", "-".repeat(72));
    for metric in &stats.metrics {
        println!(
            "{:<20} {:>12.3} {:>12.3} {:>12.3} {:>12.3}",
            metric.name, metric.mean, metric.min, metric.max, metric.stddev
        );
    }
    println!(
        "{:<20} {}/{}",
        "constrained_rate", stats.constrained_count, stats.case_count
    );
}

/// One CSV row per case: identity and knobs first, then the metric columns
/// in extractor order.
pub fn write_case_csv(path: &Path, results: &[CaseResult]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "case_id",
        "population",
        "utilization",
        "constrained",
        "wall_time_ms",
        "demand_total",
        "extracted_total",
        "produced_total",
        "stock_total",
        "shortfall_count",
        "deficit_total",
        "stalled_count",
        "skipped_count",
        "input_short_count",
        "event_count",
    ])?;
    for result in results {
        let m = &result.metrics;
        writer.write_record([
            result.case_id.clone(),
            result.population.to_string(),
            result.utilization.to_string(),
            result.constrained.to_string(),
            result.wall_time_ms.to_string(),
            m.demand_total.to_string(),
            m.extracted_total.to_string(),
            m.produced_total.to_string(),
            m.stock_total.to_string(),
            m.shortfall_count.to_string(),
            m.deficit_total.to_string(),
            m.stalled_count.to_string(),
            m.skipped_count.to_string(),
            m.input_short_count.to_string(),
            m.event_count.to_string(),
        ])?;
    }
    writer.flush().context("flushing case table")?;
    Ok(())
}
