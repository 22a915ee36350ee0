use super::*;
use crate::test_fixtures::{base_table, chain_table, material, row};

mod engine;
mod graph;

// --- Shared test helpers ------------------------------------------------

fn pid(s: &str) -> ProductId {
    ProductId::from(s)
}

fn iid(s: &str) -> IndustryId {
    IndustryId::from(s)
}

fn single_stage(stage: Stage, rows: Vec<RecipeRow>) -> RecipeTable {
    RecipeTable {
        stages: vec![StageRecipes { stage, rows }],
    }
}

/// Runs the balanced base economy and returns the report plus final stock.
fn run_base(population: f64, utilization: f64) -> (RunReport, StockLedger) {
    let mut ledger = StockLedger::new();
    let report = run(
        &base_table(),
        RunParams {
            population,
            utilization,
        },
        &mut ledger,
    )
    .expect("base table run succeeds");
    (report, ledger)
}

fn productivity_row<'a>(table: &'a ProductivityTable, industry: &str) -> &'a ProductivityRow {
    table
        .rows
        .iter()
        .find(|row| row.industry.0 == industry)
        .unwrap_or_else(|| panic!("no productivity row for industry '{industry}'"))
}

/// All fixture arithmetic is dyadic, so 1e-9 is generous.
#[track_caller]
fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "{what}: expected {expected}, got {actual}"
    );
}
