use fab_core::{Event, RunReport, StockLedger};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Everything recorded about one grid case, written as `case_result.json`.
#[derive(Debug, Serialize)]
pub struct CaseResult {
    pub case_schema_version: u32,
    pub case_status: String,
    pub case_id: String,
    pub git_sha: String,
    pub git_dirty: bool,
    pub scenario_name: String,
    pub scenario_params: serde_json::Value,
    pub population: f64,
    pub utilization: f64,
    pub table_version: String,
    pub wall_time_ms: u64,
    pub metrics: CaseMetrics,
    pub constrained: bool,
    pub constrained_products: Vec<String>,
}

/// Scalar rollup of one run report, the unit the sweep aggregates over.
#[derive(Debug, Serialize)]
pub struct CaseMetrics {
    pub demand_total: f64,
    pub extracted_total: f64,
    pub produced_total: f64,
    pub stock_total: f64,
    pub shortfall_count: usize,
    pub deficit_total: f64,
    pub stalled_count: usize,
    pub skipped_count: usize,
    pub input_short_count: usize,
    pub event_count: usize,
}

impl CaseMetrics {
    pub fn from_run(report: &RunReport, ledger: &StockLedger) -> Self {
        let mut extracted_total = 0.0;
        let mut produced_total = 0.0;
        let mut stalled_count = 0;
        let mut skipped_count = 0;
        let mut input_short_count = 0;
        for envelope in &report.events {
            match &envelope.event {
                Event::Extracted { extracted, .. } => extracted_total += extracted,
                Event::Produced { produced, .. } => produced_total += produced,
                Event::Stalled { .. } => stalled_count += 1,
                Event::Skipped { .. } => skipped_count += 1,
                Event::InputShort { .. } => input_short_count += 1,
            }
        }

        Self {
            demand_total: report
                .demand
                .entries_sorted()
                .iter()
                .map(|entry| entry.1)
                .sum(),
            extracted_total,
            produced_total,
            stock_total: ledger.entries_sorted().iter().map(|entry| entry.1).sum(),
            shortfall_count: report.shortfalls.len(),
            deficit_total: report
                .shortfalls
                .iter()
                .flat_map(|record| &record.missing)
                .map(|deficit| deficit.deficit)
                .sum(),
            stalled_count,
            skipped_count,
            input_short_count,
            event_count: report.events.len(),
        }
    }
}

impl CaseResult {
    /// Writes JSON via a `.tmp` sibling and rename, so readers never see a
    /// partial file.
    pub fn write_atomic(&self, path: &Path) -> anyhow::Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

/// A case is supply-constrained when any row ended short of its inputs.
/// Returns the sorted, deduplicated products that fell short.
pub fn detect_constrained(report: &RunReport) -> (bool, Vec<String>) {
    let mut products: Vec<String> = report
        .shortfalls
        .iter()
        .map(|record| record.product.0.clone())
        .collect();
    products.sort();
    products.dedup();
    (!products.is_empty(), products)
}

pub fn git_sha() -> String {
    env!("GIT_SHA").to_string()
}

pub fn git_dirty() -> bool {
    env!("GIT_DIRTY") == "true"
}

#[cfg(test)]
mod tests {
    use super::*;
    use fab_core::test_fixtures::chain_table;
    use fab_core::{run, RunParams};

    fn run_chain(availability: f64) -> (RunReport, StockLedger) {
        let table = chain_table(availability);
        let mut ledger = StockLedger::new();
        let report = run(
            &table,
            RunParams {
                population: 0.0,
                utilization: 1.0,
            },
            &mut ledger,
        )
        .unwrap();
        (report, ledger)
    }

    fn make_result() -> CaseResult {
        let (report, ledger) = run_chain(100.0);
        CaseResult {
            case_schema_version: 1,
            case_status: "completed".to_string(),
            case_id: "test-uuid".to_string(),
            git_sha: "abc123".to_string(),
            git_dirty: false,
            scenario_name: "test_scenario".to_string(),
            scenario_params: serde_json::json!({"populations": [0.0]}),
            population: 0.0,
            utilization: 1.0,
            table_version: "v1".to_string(),
            wall_time_ms: 5,
            metrics: CaseMetrics::from_run(&report, &ledger),
            constrained: false,
            constrained_products: Vec::new(),
        }
    }

    #[test]
    fn test_metrics_from_unconstrained_run() {
        let (report, ledger) = run_chain(100.0);
        let metrics = CaseMetrics::from_run(&report, &ledger);

        assert!((metrics.demand_total - 30.0).abs() < 1e-9);
        assert!((metrics.extracted_total - 20.0).abs() < 1e-9);
        assert!((metrics.produced_total - 10.0).abs() < 1e-9);
        assert!((metrics.stock_total - 10.0).abs() < 1e-9);
        assert_eq!(metrics.shortfall_count, 0);
        assert!(metrics.deficit_total.abs() < 1e-9);
        assert_eq!(metrics.stalled_count, 0);
        assert_eq!(metrics.skipped_count, 0);
        assert_eq!(metrics.input_short_count, 0);
        assert_eq!(metrics.event_count, 2);
    }

    #[test]
    fn test_metrics_from_constrained_run() {
        let (report, ledger) = run_chain(5.0);
        let metrics = CaseMetrics::from_run(&report, &ledger);

        assert!((metrics.extracted_total - 5.0).abs() < 1e-9);
        assert!((metrics.produced_total - 2.5).abs() < 1e-9);
        assert!((metrics.stock_total - 2.5).abs() < 1e-9);
        assert_eq!(metrics.shortfall_count, 1);
        assert!((metrics.deficit_total - 15.0).abs() < 1e-9);
        assert_eq!(metrics.input_short_count, 1);
        assert_eq!(metrics.event_count, 3);
    }

    #[test]
    fn test_detect_constrained() {
        let (clean, _) = run_chain(100.0);
        let (flag, products) = detect_constrained(&clean);
        assert!(!flag);
        assert!(products.is_empty());

        let (short, _) = run_chain(5.0);
        let (flag, products) = detect_constrained(&short);
        assert!(flag);
        assert_eq!(products, vec!["good".to_string()]);
    }

    #[test]
    fn test_metrics_deterministic() {
        let (report_a, ledger_a) = run_chain(5.0);
        let (report_b, ledger_b) = run_chain(5.0);
        let a = CaseMetrics::from_run(&report_a, &ledger_a);
        let b = CaseMetrics::from_run(&report_b, &ledger_b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_case_result_serialization() {
        let result = make_result();
        let json = serde_json::to_string_pretty(&result).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["case_schema_version"], 1);
        assert_eq!(parsed["case_status"], "completed");
        assert_eq!(parsed["table_version"], "v1");
        assert!(parsed["metrics"]["produced_total"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_atomic_write() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("case_result.json");
        let result = make_result();

        result.write_atomic(&path).unwrap();
        assert!(path.exists());
        // Tmp file should not remain
        assert!(!path.with_extension("json.tmp").exists());

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["case_schema_version"], 1);
    }

    #[test]
    fn test_git_sha_not_empty() {
        // Build-time env vars should be set
        let sha = git_sha();
        assert!(!sha.is_empty());
    }
}
