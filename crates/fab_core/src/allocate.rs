//! Forward allocation: walks stages in order and turns accumulated demand
//! into production, constrained by operating productivity and by whatever
//! the stock ledger actually holds.
//!
//! Row order inside a stage is the fairness policy: earlier rows get first
//! claim on contested inputs. Input shortages degrade production and leave a
//! shortfall trail; they never abort the run.

use crate::{
    emit, DemandMap, Event, EventEnvelope, ExtractionRecord, InputDeficit, ProductivityTable,
    RecipeRow, RecipeTable, ShortfallRecord, Stage, StockLedger,
};

/// Everything a single allocation pass leaves behind, besides the mutated
/// ledger itself.
#[derive(Debug, Clone, Default)]
pub struct AllocationOutcome {
    pub shortfalls: Vec<ShortfallRecord>,
    pub extraction: Vec<ExtractionRecord>,
    pub events: Vec<EventEnvelope>,
}

/// Runs every stage in forward order against `ledger`.
///
/// Rows with zero accumulated demand are skipped untouched. Extraction rows
/// mint stock out of natural availability without consuming anything;
/// downstream rows produce `min(capacity, demand, max producible from
/// stock)`, debiting inputs and crediting output. Partial production is the
/// norm when an input binds, never all-or-nothing.
pub fn allocate(
    table: &RecipeTable,
    productivity: &ProductivityTable,
    demand: &DemandMap,
    ledger: &mut StockLedger,
) -> AllocationOutcome {
    let mut outcome = AllocationOutcome::default();
    let mut seq = 0u64;

    for block in &table.stages {
        for row in &block.rows {
            let demanded = demand.get(&row.product);
            if demanded <= 0.0 {
                outcome.events.push(emit(
                    &mut seq,
                    block.stage,
                    Event::Skipped {
                        industry: row.industry.clone(),
                        product: row.product.clone(),
                    },
                ));
                continue;
            }
            if block.stage == Stage::Extraction {
                extract_row(row, demanded, productivity, ledger, &mut outcome, &mut seq);
            } else {
                produce_row(
                    block.stage,
                    row,
                    demanded,
                    productivity,
                    ledger,
                    &mut outcome,
                    &mut seq,
                );
            }
        }
    }

    outcome
}

/// Extraction mints stock: no ledger debits even when the row declares
/// inputs. Quantity is capped by capacity, demand, and the row's remaining
/// natural availability; an absent availability reads as 0.
fn extract_row(
    row: &RecipeRow,
    demanded: f64,
    productivity: &ProductivityTable,
    ledger: &mut StockLedger,
    outcome: &mut AllocationOutcome,
    seq: &mut u64,
) {
    let capacity = theoretical_capacity(row, productivity);
    let available = row.availability.unwrap_or(0.0);
    let quantity = capacity.min(demanded).min(available);

    if quantity > 0.0 {
        ledger.add(&row.product, quantity);
        outcome.events.push(emit(
            seq,
            Stage::Extraction,
            Event::Extracted {
                industry: row.industry.clone(),
                product: row.product.clone(),
                extracted: quantity,
                availability_left: available - quantity,
            },
        ));
    } else {
        outcome.events.push(emit(
            seq,
            Stage::Extraction,
            Event::Stalled {
                industry: row.industry.clone(),
                product: row.product.clone(),
                demanded,
            },
        ));
    }

    outcome.extraction.push(ExtractionRecord {
        industry: row.industry.clone(),
        product: row.product.clone(),
        extracted: quantity,
        availability_left: available - quantity,
    });
}

/// One post-extraction row: size against stock, debit inputs, credit output.
fn produce_row(
    stage: Stage,
    row: &RecipeRow,
    demanded: f64,
    productivity: &ProductivityTable,
    ledger: &mut StockLedger,
    outcome: &mut AllocationOutcome,
    seq: &mut u64,
) {
    let capacity = theoretical_capacity(row, productivity);

    // One pass over the inputs finds every deficit and the binding ratio.
    let mut max_producible = f64::INFINITY;
    let mut missing: Vec<InputDeficit> = Vec::new();
    for draw in &row.inputs {
        if draw.per_unit <= 0.0 {
            continue;
        }
        let required = draw.per_unit * demanded;
        let available = ledger.available(&draw.product);
        if available < required {
            missing.push(InputDeficit {
                input: draw.product.clone(),
                deficit: required - available,
            });
        }
        max_producible = max_producible.min(available / draw.per_unit);
    }

    let quantity = capacity.min(demanded).min(max_producible);

    if quantity > 0.0 {
        for draw in &row.inputs {
            if draw.per_unit <= 0.0 {
                continue;
            }
            // Clamped so float drift in quantity * per_unit cannot push the
            // debit past the balance.
            let debit = (quantity * draw.per_unit).min(ledger.available(&draw.product));
            let _ = ledger.consume(&draw.product, debit);
        }
        ledger.add(&row.product, quantity);
        outcome.events.push(emit(
            seq,
            stage,
            Event::Produced {
                industry: row.industry.clone(),
                product: row.product.clone(),
                produced: quantity,
                demanded,
            },
        ));
    } else {
        outcome.events.push(emit(
            seq,
            stage,
            Event::Stalled {
                industry: row.industry.clone(),
                product: row.product.clone(),
                demanded,
            },
        ));
    }

    if !missing.is_empty() {
        for deficit in &missing {
            outcome.events.push(emit(
                seq,
                stage,
                Event::InputShort {
                    industry: row.industry.clone(),
                    product: row.product.clone(),
                    input: deficit.input.clone(),
                    deficit: deficit.deficit,
                },
            ));
        }
        outcome.shortfalls.push(ShortfallRecord {
            industry: row.industry.clone(),
            product: row.product.clone(),
            missing,
        });
    }
}

/// `operating_productivity * labor / difficulty`; what the industry could
/// make of this row's product if inputs were unlimited. Industries the sizer
/// never saw run at zero.
fn theoretical_capacity(row: &RecipeRow, productivity: &ProductivityTable) -> f64 {
    productivity.operating_productivity(&row.industry) * row.labor / row.difficulty
}
