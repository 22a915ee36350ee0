//! Recipe table loading shared between fab_cli and fab_bench.
//!
//! The wire format mirrors the authored production sheets: one block per
//! stage, each row with dedicated water and energy slots plus free-form
//! material draws. Loading builds a validated [`RecipeTable`], surfaces
//! layering hazards as warnings, and seeds the initial stock ledger.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use fab_core::{
    table_hazards, IndustryId, InputDraw, InputKind, ProductId, RecipeRow, RecipeTable, RunParams,
    Stage, StageRecipes, StockLedger, TableHazard,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct TableFile {
    table_version: String,
    stages: Vec<StageSpec>,
    #[serde(default)]
    initial_stock: BTreeMap<String, f64>,
}

#[derive(Deserialize)]
struct StageSpec {
    stage: Stage,
    rows: Vec<RowSpec>,
}

#[derive(Deserialize)]
struct RowSpec {
    industry: String,
    product: String,
    difficulty: f64,
    labor: f64,
    #[serde(default)]
    demand: Option<f64>,
    #[serde(default)]
    popular_demand: Option<f64>,
    #[serde(default)]
    water: Option<InputSpec>,
    #[serde(default)]
    energy: Option<InputSpec>,
    #[serde(default)]
    materials: Vec<InputSpec>,
    #[serde(default)]
    availability: Option<f64>,
}

#[derive(Deserialize)]
struct InputSpec {
    product: String,
    per_unit: f64,
}

/// A validated table plus everything ingestion learned about it.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: RecipeTable,
    pub table_version: String,
    /// Stock carried over from before the run, keyed by product.
    pub initial_stock: Vec<(ProductId, f64)>,
    /// Advisory layering diagnostics. A hazardous table still runs.
    pub hazards: Vec<TableHazard>,
}

impl LoadedTable {
    /// Fresh ledger pre-seeded with the table's initial stock.
    pub fn ledger(&self) -> StockLedger {
        StockLedger::seeded(self.initial_stock.iter().cloned())
    }

    pub fn row_count(&self) -> usize {
        self.table.stages.iter().map(|block| block.rows.len()).sum()
    }
}

/// Reads and validates a recipe table file.
///
/// Structural errors (bad stage layering, non-positive labor, duplicate
/// utility slots) fail the load; ordering hazards are collected on the
/// returned [`LoadedTable`] instead so callers can warn and proceed.
pub fn load_table(path: &Path) -> Result<LoadedTable> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: TableFile =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    build_table(file).with_context(|| format!("validating {}", path.display()))
}

fn build_table(file: TableFile) -> Result<LoadedTable> {
    for (product, quantity) in &file.initial_stock {
        if !quantity.is_finite() || *quantity < 0.0 {
            bail!("initial stock of '{product}' must be finite and non-negative, got {quantity}");
        }
    }

    let table = RecipeTable {
        stages: file.stages.into_iter().map(stage_recipes).collect(),
    };
    table.validate()?;
    let hazards = table_hazards(&table);

    let initial_stock = file
        .initial_stock
        .into_iter()
        .map(|(product, quantity)| (ProductId(product), quantity))
        .collect();

    Ok(LoadedTable {
        table,
        table_version: file.table_version,
        initial_stock,
        hazards,
    })
}

fn stage_recipes(spec: StageSpec) -> StageRecipes {
    StageRecipes {
        stage: spec.stage,
        rows: spec.rows.into_iter().map(recipe_row).collect(),
    }
}

fn recipe_row(spec: RowSpec) -> RecipeRow {
    // Canonical draw order: water, energy, then materials as authored.
    let mut inputs: Vec<InputDraw> = Vec::new();
    if let Some(water) = spec.water {
        inputs.push(draw(InputKind::Water, water));
    }
    if let Some(energy) = spec.energy {
        inputs.push(draw(InputKind::Energy, energy));
    }
    inputs.extend(
        spec.materials
            .into_iter()
            .map(|material| draw(InputKind::Material, material)),
    );

    RecipeRow {
        industry: IndustryId(spec.industry),
        product: ProductId(spec.product),
        difficulty: spec.difficulty,
        labor: spec.labor,
        demand: spec.demand,
        popular_demand: spec.popular_demand,
        inputs: inputs.into(),
        availability: spec.availability,
    }
}

fn draw(kind: InputKind, spec: InputSpec) -> InputDraw {
    InputDraw {
        kind,
        product: ProductId(spec.product),
        per_unit: spec.per_unit,
    }
}

/// Writes the `run_info.json` artifact every run directory starts with.
/// fab_cli and fab_bench both call this so downstream tooling sees one shape.
pub fn write_run_info(
    dir: &Path,
    run_id: &str,
    params: RunParams,
    table_version: &str,
    runner: &str,
    args: serde_json::Value,
) -> Result<()> {
    let info = serde_json::json!({
        "run_id": run_id,
        "population": params.population,
        "utilization": params.utilization,
        "table_version": table_version,
        "runner": runner,
        "args": args,
    });
    let path = dir.join("run_info.json");
    let file = std::fs::File::create(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, &info)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
