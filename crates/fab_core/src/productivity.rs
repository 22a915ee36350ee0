//! Productivity sizing: accumulated demand → per-industry productivity.
//!
//! An industry runs every row it owns from one shared productivity pool, so
//! the pool is sized to the most demanding row — a bottleneck, not a sum.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::{DemandMap, IndustryId, InputKind, ProductId, RecipeTable, Stage};

/// One line of the productivity report: an industry within a stage, or a
/// synthetic utility supplier (`stage == None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityRow {
    pub industry: IndustryId,
    pub stage: Option<Stage>,
    /// Outputs of this industry in this stage, in table order.
    pub products: Vec<ProductId>,
    /// Raw materials drawn by those rows, in first-appearance order.
    pub inputs: Vec<ProductId>,
    /// Productivity required to meet accumulated demand at full utilization.
    pub full_productivity: f64,
    /// `full_productivity * utilization`; what allocation runs with.
    pub operating_productivity: f64,
}

/// The sizer output: report rows grouped per (stage, industry), plus an
/// industry → operating-productivity lookup for the allocator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductivityTable {
    pub rows: Vec<ProductivityRow>,
    #[serde(skip)]
    operating: AHashMap<IndustryId, f64>,
}

impl ProductivityTable {
    /// Rebuilds a table from report rows, e.g. ones sized in an earlier run.
    /// On duplicate industry names the first row wins the lookup.
    pub fn from_rows(rows: Vec<ProductivityRow>) -> Self {
        let mut operating = AHashMap::with_capacity(rows.len());
        for row in &rows {
            operating
                .entry(row.industry.clone())
                .or_insert(row.operating_productivity);
        }
        Self { rows, operating }
    }

    /// Operating productivity of an industry; 0 for industries the sizer
    /// never saw. An unknown industry degrades to zero capacity, it never
    /// fails the run.
    pub fn operating_productivity(&self, industry: &IndustryId) -> f64 {
        self.operating.get(industry).copied().unwrap_or(0.0)
    }
}

/// Sizes every industry to the accumulated demand of its outputs.
///
/// A row whose output carries demand needs `demand * difficulty / labor`
/// productivity; the industry's full productivity is the maximum over its
/// rows, across every stage it appears in. Operating productivity scales
/// that maximum by `utilization`, uniformly — utility suppliers included.
///
/// Every product drawn through a water or energy slot anywhere in the table
/// yields one synthetic `<product>_supply` row, sized 1:1 to the product's
/// accumulated demand, emitted even at zero demand.
pub fn size(table: &RecipeTable, demand: &DemandMap, utilization: f64) -> ProductivityTable {
    let mut required: AHashMap<IndustryId, f64> = AHashMap::new();
    for (_, row) in table.rows() {
        let output_demand = demand.get(&row.product);
        if output_demand <= 0.0 {
            continue;
        }
        let needed = output_demand * row.difficulty / row.labor;
        let entry = required.entry(row.industry.clone()).or_insert(0.0);
        *entry = entry.max(needed);
    }

    let mut rows = Vec::new();
    for block in &table.stages {
        for (industry, products, inputs) in group_by_industry(block.stage, table) {
            let full = required.get(&industry).copied().unwrap_or(0.0);
            rows.push(ProductivityRow {
                industry,
                stage: Some(block.stage),
                products,
                inputs,
                full_productivity: full,
                operating_productivity: full * utilization,
            });
        }
    }

    // Utility suppliers, after the staged rows.
    for product in utility_products(table) {
        let full = demand.get(&product);
        rows.push(ProductivityRow {
            industry: IndustryId(format!("{product}_supply")),
            stage: None,
            products: vec![product],
            inputs: Vec::new(),
            full_productivity: full,
            operating_productivity: full * utilization,
        });
    }

    let mut operating = AHashMap::with_capacity(rows.len());
    for row in &rows {
        // Staged rows land first, so a synthetic supplier never shadows a
        // real industry that happens to share its name.
        operating
            .entry(row.industry.clone())
            .or_insert(row.operating_productivity);
    }

    ProductivityTable { rows, operating }
}

type IndustryGroup = (IndustryId, Vec<ProductId>, Vec<ProductId>);

/// Groups a stage's rows per industry in first-appearance order, collecting
/// output products in table order and material inputs deduplicated.
fn group_by_industry(stage: Stage, table: &RecipeTable) -> Vec<IndustryGroup> {
    let mut groups: Vec<IndustryGroup> = Vec::new();
    for (row_stage, row) in table.rows() {
        if row_stage != stage {
            continue;
        }
        let idx = groups
            .iter()
            .position(|(industry, ..)| *industry == row.industry)
            .unwrap_or_else(|| {
                groups.push((row.industry.clone(), Vec::new(), Vec::new()));
                groups.len() - 1
            });
        let (_, products, inputs) = &mut groups[idx];
        products.push(row.product.clone());
        for draw in row.materials() {
            if !inputs.contains(&draw.product) {
                inputs.push(draw.product.clone());
            }
        }
    }
    groups
}

/// Products referenced by a water or energy slot anywhere in the table, in
/// first-appearance order.
fn utility_products(table: &RecipeTable) -> Vec<ProductId> {
    let mut utilities: Vec<ProductId> = Vec::new();
    for (_, row) in table.rows() {
        for draw in &row.inputs {
            if draw.kind != InputKind::Material && !utilities.contains(&draw.product) {
                utilities.push(draw.product.clone());
            }
        }
    }
    utilities
}
