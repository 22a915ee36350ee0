//! Demand propagation: consumer demand scaled by population, then a single
//! backward sweep pushing accumulated demand through recipe coefficients.

use ahash::AHashMap;

use crate::{ProductId, RecipeTable};

/// Product → accumulated demand. Monotonically built during propagation;
/// products the table never references are absent and read as 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandMap {
    demands: AHashMap<ProductId, f64>,
}

impl DemandMap {
    pub fn get(&self, product: &ProductId) -> f64 {
        self.demands.get(product).copied().unwrap_or(0.0)
    }

    pub fn add(&mut self, product: &ProductId, delta: f64) {
        *self.demands.entry(product.clone()).or_insert(0.0) += delta;
    }

    pub fn contains(&self, product: &ProductId) -> bool {
        self.demands.contains_key(product)
    }

    pub fn len(&self) -> usize {
        self.demands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demands.is_empty()
    }

    /// Snapshot sorted by product id.
    pub fn entries_sorted(&self) -> Vec<(ProductId, f64)> {
        let mut entries: Vec<(ProductId, f64)> = self
            .demands
            .iter()
            .map(|(product, demand)| (product.clone(), *demand))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    fn ensure(&mut self, product: &ProductId) {
        self.demands.entry(product.clone()).or_insert(0.0);
    }
}

/// Computes accumulated demand per product. Pure: identical inputs always
/// yield an identical map.
///
/// 1. Register every product appearing as an output or input, at demand 0.
/// 2. Pass 1: credit `popular_demand * population / 1000` to each row's
///    output.
/// 3. Pass 2, stages in reverse order and rows in table order: credit the
///    row's direct demand to its output, then push
///    `demand[output] * per_unit` into every declared input, using the
///    output's demand as accumulated at that point of the sweep.
///
/// The sweep is order-sensitive: a single pass is exact only when every
/// product is produced in a strictly earlier stage than all of its
/// consumers. [`crate::table_hazards`] reports violations.
pub fn propagate(table: &RecipeTable, population: f64) -> DemandMap {
    let mut demand = DemandMap::default();

    for (_, row) in table.rows() {
        demand.ensure(&row.product);
        for draw in &row.inputs {
            demand.ensure(&draw.product);
        }
    }

    for (_, row) in table.rows() {
        if let Some(coefficient) = row.popular_demand {
            demand.add(&row.product, coefficient * population / 1000.0);
        }
    }

    for block in table.stages.iter().rev() {
        for row in &block.rows {
            if let Some(direct) = row.demand {
                demand.add(&row.product, direct);
            }
            let output_demand = demand.get(&row.product);
            for draw in &row.inputs {
                demand.add(&draw.product, output_demand * draw.per_unit);
            }
        }
    }

    demand
}
