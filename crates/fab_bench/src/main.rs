use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fab_core::RunParams;
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

mod case_result;
mod runner;
mod scenario;
mod summary;

#[derive(Parser)]
#[command(
    name = "fab_bench",
    about = "Grid sweep harness for production-chain runs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file across its full parameter grid.
    Run {
        /// Path to the scenario JSON file.
        #[arg(long)]
        scenario: String,
        /// Output directory (default: runs/).
        #[arg(long, default_value = "runs")]
        output_dir: String,
    },
}

fn run(scenario_path: &str, output_dir: &str) -> Result<()> {
    let scenario = scenario::load_scenario(Path::new(scenario_path))?;
    let populations = scenario.populations.expand();
    let utilizations = scenario.utilizations.expand();

    println!(
        "Loading scenario '{}': {} populations × {} utilizations",
        scenario.name,
        populations.len(),
        utilizations.len()
    );

    let loaded = fab_world::load_table(Path::new(&scenario.table))?;
    for hazard in &loaded.hazards {
        println!("warning: {hazard}");
    }

    let scenario_params = serde_json::json!({
        "table": scenario.table,
        "table_version": loaded.table_version,
        "populations": populations,
        "utilizations": utilizations,
    });

    // Timestamped output directory.
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let sweep_dir = PathBuf::from(output_dir).join(format!("{}_{}", scenario.name, timestamp));
    std::fs::create_dir_all(&sweep_dir)
        .with_context(|| format!("creating output directory: {}", sweep_dir.display()))?;

    // Copy scenario file into output dir.
    std::fs::copy(scenario_path, sweep_dir.join("scenario.json"))
        .context("copying scenario file")?;

    let mut grid = Vec::new();
    for &population in &populations {
        for &utilization in &utilizations {
            grid.push(RunParams {
                population,
                utilization,
            });
        }
    }

    println!("Output: {}", sweep_dir.display());
    println!("Running {} cases in parallel...", grid.len());

    // Run all cases in parallel.
    let outcomes: Vec<Result<case_result::CaseResult>> = grid
        .par_iter()
        .map(|&params| {
            let case_dir = sweep_dir.join(format!(
                "pop{}_util{}",
                params.population, params.utilization
            ));
            runner::run_case(&loaded, params, &case_dir, &scenario.name, &scenario_params)
        })
        .collect();

    // Collect results, reporting any failures.
    let mut results = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(err) => eprintln!("Case failed: {err:#}"),
        }
    }

    if results.is_empty() {
        anyhow::bail!("all cases failed");
    }

    let stats = summary::compute_summary(&results);
    summary::print_summary(&scenario.name, &stats);

    let csv_path = sweep_dir.join("sweep_summary.csv");
    summary::write_case_csv(&csv_path, &results)?;

    let sweep_id = Uuid::new_v4().to_string();
    let case_ids: Vec<&str> = results.iter().map(|r| r.case_id.as_str()).collect();
    let aggregated_metrics = summary::build_aggregated_metrics(&results);

    let sweep_summary = serde_json::json!({
        "sweep_schema_version": 1,
        "sweep_id": sweep_id,
        "scenario_name": scenario.name,
        "scenario_params": scenario_params,
        "case_count": results.len(),
        "constrained_count": stats.constrained_count,
        "case_ids": case_ids,
        "metrics": aggregated_metrics,
    });

    let summary_path = sweep_dir.join("summary.json");
    let summary_tmp = summary_path.with_extension("json.tmp");
    let summary_json =
        serde_json::to_string_pretty(&sweep_summary).context("serializing summary")?;
    let mut summary_file = std::fs::File::create(&summary_tmp)
        .with_context(|| format!("creating {}", summary_tmp.display()))?;
    summary_file
        .write_all(summary_json.as_bytes())
        .context("writing summary")?;
    summary_file.sync_all()?;
    std::fs::rename(&summary_tmp, &summary_path).context("renaming summary")?;

    println!("Case table written to {}", csv_path.display());
    println!("Summary written to {}", summary_path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scenario,
            output_dir,
        } => run(&scenario, &output_dir)?,
    }
    Ok(())
}
