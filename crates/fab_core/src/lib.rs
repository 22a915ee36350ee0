//! Deterministic production-chain engine: backward demand propagation,
//! bottleneck productivity sizing, and forward stock-constrained allocation.
//!
//! The crate is pure computation: no I/O, no clocks, no global state. A run
//! takes a [`RecipeTable`], [`RunParams`], and a caller-owned
//! [`StockLedger`]; everything in the report is derived from those three.

pub mod allocate;
pub mod demand;
pub mod engine;
pub mod graph;
pub mod ledger;
pub mod productivity;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

#[cfg(test)]
mod tests;

pub use allocate::{allocate, AllocationOutcome};
pub use demand::{propagate, DemandMap};
pub use engine::{run, RunError, RunParams, RunReport};
pub use graph::{dependency_edges, table_hazards, TableHazard};
pub use ledger::{InsufficientStock, StockLedger};
pub use productivity::{size, ProductivityRow, ProductivityTable};
pub use types::{
    Event, EventEnvelope, EventId, ExtractionRecord, IndustryId, InputDeficit, InputDraw,
    InputKind, ProductId, RecipeRow, RecipeTable, ShortfallRecord, Stage, StageRecipes, TableError,
};

/// Mints the next event envelope. Ids are dense and ordinal within one
/// allocation pass, so an event log is replayable in order by id alone.
pub(crate) fn emit(seq: &mut u64, stage: Stage, event: Event) -> EventEnvelope {
    let id = EventId(format!("evt_{seq:06}"));
    *seq += 1;
    EventEnvelope { id, stage, event }
}
