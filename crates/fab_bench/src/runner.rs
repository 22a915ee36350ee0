use crate::case_result::{self, CaseMetrics, CaseResult};
use anyhow::{Context, Result};
use fab_core::RunParams;
use fab_world::LoadedTable;
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

/// Executes one grid case into `case_dir`: seeds a fresh ledger from the
/// table's initial stock, runs the engine, and leaves `run_info.json` plus
/// `case_result.json` behind.
pub fn run_case(
    loaded: &LoadedTable,
    params: RunParams,
    case_dir: &Path,
    scenario_name: &str,
    scenario_params: &serde_json::Value,
) -> Result<CaseResult> {
    let case_id = Uuid::new_v4().to_string();
    let start = Instant::now();

    std::fs::create_dir_all(case_dir)
        .with_context(|| format!("creating case directory: {}", case_dir.display()))?;

    fab_world::write_run_info(
        case_dir,
        &case_id,
        params,
        &loaded.table_version,
        "fab_bench",
        serde_json::json!({
            "scenario_name": scenario_name,
        }),
    )?;

    let mut ledger = loaded.ledger();
    let report = fab_core::run(&loaded.table, params, &mut ledger).with_context(|| {
        format!(
            "running case population={} utilization={}",
            params.population, params.utilization
        )
    })?;

    #[allow(clippy::cast_possible_truncation)]
    let wall_time_ms = start.elapsed().as_millis() as u64;

    let metrics = CaseMetrics::from_run(&report, &ledger);
    let (constrained, constrained_products) = case_result::detect_constrained(&report);

    let result = CaseResult {
        case_schema_version: 1,
        case_status: "completed".to_string(),
        case_id,
        git_sha: case_result::git_sha(),
        git_dirty: case_result::git_dirty(),
        scenario_name: scenario_name.to_string(),
        scenario_params: scenario_params.clone(),
        population: params.population,
        utilization: params.utilization,
        table_version: loaded.table_version.clone(),
        wall_time_ms,
        metrics,
        constrained,
        constrained_products,
    };

    result
        .write_atomic(&case_dir.join("case_result.json"))
        .context("writing case_result.json")?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fab_core::test_fixtures::chain_table;
    use fab_core::ProductId;
    use tempfile::TempDir;

    fn loaded_chain(availability: f64) -> LoadedTable {
        LoadedTable {
            table: chain_table(availability),
            table_version: "test".to_string(),
            initial_stock: Vec::new(),
            hazards: Vec::new(),
        }
    }

    fn params(utilization: f64) -> RunParams {
        RunParams {
            population: 0.0,
            utilization,
        }
    }

    #[test]
    fn test_run_case_produces_output() {
        let loaded = loaded_chain(100.0);
        let temp_dir = TempDir::new().unwrap();
        let case_dir = temp_dir.path().join("pop0_util1");
        let scenario_params = serde_json::json!({"populations": [0.0]});

        let result = run_case(
            &loaded,
            params(1.0),
            &case_dir,
            "test_scenario",
            &scenario_params,
        )
        .unwrap();

        assert_eq!(result.case_schema_version, 1);
        assert_eq!(result.case_status, "completed");
        assert!(!result.case_id.is_empty());
        assert!(!result.constrained);
        assert!((result.metrics.produced_total - 10.0).abs() < 1e-9);
        assert!(case_dir.join("run_info.json").exists());
        assert!(case_dir.join("case_result.json").exists());

        let info = std::fs::read_to_string(case_dir.join("run_info.json")).unwrap();
        let info: serde_json::Value = serde_json::from_str(&info).unwrap();
        assert_eq!(info["runner"], "fab_bench");
        assert_eq!(info["table_version"], "test");

        let content = std::fs::read_to_string(case_dir.join("case_result.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["case_schema_version"], 1);
        assert_eq!(parsed["scenario_name"], "test_scenario");
        assert!(parsed["metrics"].is_object());
    }

    #[test]
    fn test_run_case_flags_constrained_supply() {
        let loaded = loaded_chain(5.0);
        let temp_dir = TempDir::new().unwrap();
        let case_dir = temp_dir.path().join("pop0_util1");

        let result = run_case(
            &loaded,
            params(1.0),
            &case_dir,
            "scarce",
            &serde_json::json!({}),
        )
        .unwrap();

        assert!(result.constrained);
        assert_eq!(result.constrained_products, vec!["good".to_string()]);
        assert_eq!(result.metrics.shortfall_count, 1);
    }

    #[test]
    fn test_run_case_uses_initial_stock() {
        // No natural availability at all; production must come from the
        // seeded ledger alone.
        let mut loaded = loaded_chain(0.0);
        loaded.initial_stock = vec![(ProductId::from("raw_a"), 20.0)];
        let temp_dir = TempDir::new().unwrap();

        let result = run_case(
            &loaded,
            params(1.0),
            &temp_dir.path().join("pop0_util1"),
            "seeded",
            &serde_json::json!({}),
        )
        .unwrap();

        assert!((result.metrics.produced_total - 10.0).abs() < 1e-9);
        assert!(result.metrics.extracted_total.abs() < 1e-9);
        assert_eq!(result.metrics.stalled_count, 1);
    }

    #[test]
    fn test_run_case_determinism() {
        let loaded = loaded_chain(5.0);
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();

        let result_a = run_case(
            &loaded,
            params(1.0),
            &dir_a.path().join("case"),
            "test",
            &serde_json::json!({}),
        )
        .unwrap();
        let result_b = run_case(
            &loaded,
            params(1.0),
            &dir_b.path().join("case"),
            "test",
            &serde_json::json!({}),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_string(&result_a.metrics).unwrap(),
            serde_json::to_string(&result_b.metrics).unwrap()
        );
        assert_ne!(result_a.case_id, result_b.case_id);
    }

    #[test]
    fn test_run_case_invalid_utilization_fails() {
        let loaded = loaded_chain(100.0);
        let temp_dir = TempDir::new().unwrap();

        let result = run_case(
            &loaded,
            params(0.0),
            &temp_dir.path().join("case"),
            "bad",
            &serde_json::json!({}),
        );

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("utilization"));
    }
}
