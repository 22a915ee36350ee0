//! Run orchestration: one run is one propagation sweep, one sizing pass,
//! and one allocation pass over a validated table.

use serde::{Deserialize, Serialize};

use crate::allocate::{allocate, AllocationOutcome};
use crate::demand::{propagate, DemandMap};
use crate::productivity::{size, ProductivityTable};
use crate::{
    EventEnvelope, ExtractionRecord, RecipeTable, ShortfallRecord, StockLedger, TableError,
};

/// The two knobs of a run. Population scales popular demand; utilization
/// scales every industry's operating productivity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    pub population: f64,
    pub utilization: f64,
}

impl RunParams {
    fn validate(self) -> Result<(), RunError> {
        if !self.population.is_finite() || self.population < 0.0 {
            return Err(RunError::InvalidParameter {
                name: "population",
                value: self.population,
            });
        }
        if !self.utilization.is_finite() || self.utilization <= 0.0 || self.utilization > 1.0 {
            return Err(RunError::InvalidParameter {
                name: "utilization",
                value: self.utilization,
            });
        }
        Ok(())
    }
}

/// Why a run refused to start. Once allocation begins the run always
/// completes; runtime scarcity lands in the report, not here.
#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    Table(TableError),
    InvalidParameter { name: &'static str, value: f64 },
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Table(err) => write!(f, "invalid recipe table: {err}"),
            RunError::InvalidParameter { name, value } => {
                write!(f, "invalid run parameter {name} = {value}")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Table(err) => Some(err),
            RunError::InvalidParameter { .. } => None,
        }
    }
}

impl From<TableError> for RunError {
    fn from(err: TableError) -> Self {
        RunError::Table(err)
    }
}

/// Everything a run computes. The final stock snapshot is not here: it lives
/// in the ledger the caller passed to [`run`].
#[derive(Debug, Clone)]
pub struct RunReport {
    pub demand: DemandMap,
    pub productivity: ProductivityTable,
    pub shortfalls: Vec<ShortfallRecord>,
    pub extraction: Vec<ExtractionRecord>,
    pub events: Vec<EventEnvelope>,
}

/// Executes one full run against `ledger`.
///
/// Fails only on a structurally invalid table or out-of-range parameters;
/// scarcity during allocation is reported, never fatal.
pub fn run(
    table: &RecipeTable,
    params: RunParams,
    ledger: &mut StockLedger,
) -> Result<RunReport, RunError> {
    table.validate()?;
    params.validate()?;

    let demand = propagate(table, params.population);
    let productivity = size(table, &demand, params.utilization);
    let AllocationOutcome {
        shortfalls,
        extraction,
        events,
    } = allocate(table, &productivity, &demand, ledger);

    Ok(RunReport {
        demand,
        productivity,
        shortfalls,
        extraction,
        events,
    })
}
