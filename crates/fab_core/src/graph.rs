//! Structural checks over the recipe table: the product dependency graph and
//! the advisory hazards that make a single-sweep propagation unreliable.
//!
//! Hazards are warnings, not errors. A hazardous table still runs with the
//! documented order-sensitive semantics; these checks exist so ingestion can
//! tell the author what the sweep will silently get wrong.

use std::fmt;

use crate::{IndustryId, ProductId, RecipeTable, Stage};

/// Input → output edges implied by the table, across every input kind,
/// deduplicated, in table order.
pub fn dependency_edges(table: &RecipeTable) -> Vec<(ProductId, ProductId)> {
    let mut edges: Vec<(ProductId, ProductId)> = Vec::new();
    for (_, row) in table.rows() {
        for draw in &row.inputs {
            let edge = (draw.product.clone(), row.product.clone());
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }
    }
    edges
}

/// A table shape the engine accepts but cannot honor exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableHazard {
    /// More than one row outputs the product; each producing row propagates
    /// the full accumulated demand into its own inputs, overcounting
    /// upstream.
    MultipleProducers {
        product: ProductId,
        producers: Vec<IndustryId>,
    },
    /// The product is produced in a stage that is not strictly earlier than
    /// a stage consuming it. Demand for it may undercount and allocation may
    /// look for it in the ledger before it exists. A cycle always surfaces
    /// as at least one of these.
    OrderingHazard {
        product: ProductId,
        produced_in: Stage,
        consumed_in: Stage,
    },
}

impl fmt::Display for TableHazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableHazard::MultipleProducers { product, producers } => {
                let names: Vec<&str> = producers.iter().map(|id| id.0.as_str()).collect();
                write!(
                    f,
                    "product '{product}' has {} producing rows ({}); upstream demand will be overcounted",
                    producers.len(),
                    names.join(", ")
                )
            }
            TableHazard::OrderingHazard {
                product,
                produced_in,
                consumed_in,
            } => write!(
                f,
                "product '{product}' is produced in {produced_in} but consumed in {consumed_in}; \
                 its demand may be undercounted and its stock consumed before production"
            ),
        }
    }
}

/// Scans the table for hazards: `MultipleProducers` first (one per affected
/// product, in table order), then `OrderingHazard`s (deduplicated by
/// product and stage pair, in consumer table order).
pub fn table_hazards(table: &RecipeTable) -> Vec<TableHazard> {
    let mut producers: Vec<(ProductId, Vec<(Stage, IndustryId)>)> = Vec::new();
    for (stage, row) in table.rows() {
        match producers.iter_mut().find(|(product, _)| *product == row.product) {
            Some((_, rows)) => rows.push((stage, row.industry.clone())),
            None => producers.push((row.product.clone(), vec![(stage, row.industry.clone())])),
        }
    }

    let mut hazards: Vec<TableHazard> = Vec::new();
    for (product, rows) in &producers {
        if rows.len() > 1 {
            hazards.push(TableHazard::MultipleProducers {
                product: product.clone(),
                producers: rows.iter().map(|(_, industry)| industry.clone()).collect(),
            });
        }
    }

    for (consumed_in, row) in table.rows() {
        for draw in &row.inputs {
            let Some((_, rows)) = producers.iter().find(|(p, _)| *p == draw.product) else {
                continue;
            };
            for (produced_in, _) in rows {
                if *produced_in < consumed_in {
                    continue;
                }
                let hazard = TableHazard::OrderingHazard {
                    product: draw.product.clone(),
                    produced_in: *produced_in,
                    consumed_in,
                };
                if !hazards.contains(&hazard) {
                    hazards.push(hazard);
                }
            }
        }
    }

    hazards
}
