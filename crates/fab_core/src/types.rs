//! Type definitions for `fab_core`.
//!
//! The normalized recipe table, its structural validation, and the record
//! types the engine reports with.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(ProductId);
string_id!(IndustryId);
string_id!(EventId);

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

/// Ordered phases of the production chain. Demand propagation walks them in
/// reverse; allocation walks them forward. A table may use any subset, in
/// ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extraction,
    Beneficiation,
    Processing,
    Packaging,
    Goods,
    HeavyIndustry,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Extraction,
        Stage::Beneficiation,
        Stage::Processing,
        Stage::Packaging,
        Stage::Goods,
        Stage::HeavyIndustry,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Extraction => "extraction",
            Stage::Beneficiation => "beneficiation",
            Stage::Processing => "processing",
            Stage::Packaging => "packaging",
            Stage::Goods => "goods",
            Stage::HeavyIndustry => "heavy_industry",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Discriminates the utility input slots from open-ended raw materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Water,
    Energy,
    Material,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            InputKind::Water => "water",
            InputKind::Energy => "energy",
            InputKind::Material => "material",
        })
    }
}

// ---------------------------------------------------------------------------
// Recipe table
// ---------------------------------------------------------------------------

/// One input slot of a recipe row. `per_unit` is the quantity consumed per
/// unit of output produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDraw {
    pub kind: InputKind,
    pub product: ProductId,
    pub per_unit: f64,
}

/// One industry→product production rule within a stage.
///
/// `inputs` holds the declared draws in canonical order: water, then energy,
/// then raw materials. Optional fields read as "not applicable" when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRow {
    pub industry: IndustryId,
    /// Output product of this row.
    pub product: ProductId,
    pub difficulty: f64,
    pub labor: f64,
    /// Direct demand credited to the output during propagation.
    pub demand: Option<f64>,
    /// Consumer demand per 1000 population.
    pub popular_demand: Option<f64>,
    pub inputs: SmallVec<[InputDraw; 4]>,
    /// Natural ceiling on total output; Extraction rows only. Absent reads
    /// as 0, so an Extraction row without it never produces.
    pub availability: Option<f64>,
}

impl RecipeRow {
    pub fn input(&self, kind: InputKind) -> Option<&InputDraw> {
        self.inputs.iter().find(|draw| draw.kind == kind)
    }

    pub fn materials(&self) -> impl Iterator<Item = &InputDraw> {
        self.inputs
            .iter()
            .filter(|draw| draw.kind == InputKind::Material)
    }
}

/// The rows of one stage, in table order. Table order is significant: it is
/// the fairness policy for contested inputs during allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecipes {
    pub stage: Stage,
    pub rows: Vec<RecipeRow>,
}

/// The normalized recipe table: stages in ascending order, rows in authoring
/// order. Immutable for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeTable {
    pub stages: Vec<StageRecipes>,
}

impl RecipeTable {
    /// Every row paired with its stage, in forward table order.
    pub fn rows(&self) -> impl Iterator<Item = (Stage, &RecipeRow)> {
        self.stages
            .iter()
            .flat_map(|block| block.rows.iter().map(move |row| (block.stage, row)))
    }

    /// Structural validation. Rejects rows that would make capacity division
    /// undefined and tables whose stage blocks are out of order.
    pub fn validate(&self) -> Result<(), TableError> {
        let mut previous: Option<Stage> = None;
        for block in &self.stages {
            if let Some(prev) = previous {
                if block.stage == prev {
                    return Err(TableError::DuplicateStage { stage: block.stage });
                }
                if block.stage < prev {
                    return Err(TableError::StageOutOfOrder {
                        stage: block.stage,
                        after: prev,
                    });
                }
            }
            previous = Some(block.stage);
            for row in &block.rows {
                validate_row(block.stage, row)?;
            }
        }
        Ok(())
    }
}

fn validate_row(stage: Stage, row: &RecipeRow) -> Result<(), TableError> {
    let invalid = |field: &'static str, value: f64| TableError::InvalidRecipe {
        industry: row.industry.clone(),
        product: row.product.clone(),
        field,
        value,
    };

    if row.difficulty <= 0.0 || !row.difficulty.is_finite() {
        return Err(invalid("difficulty", row.difficulty));
    }
    if row.labor <= 0.0 || !row.labor.is_finite() {
        return Err(invalid("labor", row.labor));
    }
    for (field, value) in [("demand", row.demand), ("popular_demand", row.popular_demand)] {
        if let Some(v) = value {
            if v < 0.0 || !v.is_finite() {
                return Err(invalid(field, v));
            }
        }
    }
    if let Some(v) = row.availability {
        if stage != Stage::Extraction {
            return Err(invalid("availability", v));
        }
        if v < 0.0 || !v.is_finite() {
            return Err(invalid("availability", v));
        }
    }
    for kind in [InputKind::Water, InputKind::Energy] {
        if row.inputs.iter().filter(|draw| draw.kind == kind).count() > 1 {
            return Err(TableError::DuplicateInputSlot {
                industry: row.industry.clone(),
                product: row.product.clone(),
                kind,
            });
        }
    }
    for draw in &row.inputs {
        if draw.per_unit < 0.0 || !draw.per_unit.is_finite() {
            return Err(invalid("per_unit", draw.per_unit));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Report records
// ---------------------------------------------------------------------------

/// A single input deficit: how much of `input` the row was short of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDeficit {
    pub input: ProductId,
    pub deficit: f64,
}

/// Emitted for every row whose inputs could not cover its full demand,
/// whether production was partial or none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortfallRecord {
    pub industry: IndustryId,
    pub product: ProductId,
    pub missing: Vec<InputDeficit>,
}

/// Depletion bookkeeping for one executed Extraction row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub industry: IndustryId,
    pub product: ProductId,
    pub extracted: f64,
    pub availability_left: f64,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub stage: Stage,
    pub event: Event,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Extracted {
        industry: IndustryId,
        product: ProductId,
        extracted: f64,
        availability_left: f64,
    },
    Produced {
        industry: IndustryId,
        product: ProductId,
        produced: f64,
        demanded: f64,
    },
    Stalled {
        industry: IndustryId,
        product: ProductId,
        demanded: f64,
    },
    Skipped {
        industry: IndustryId,
        product: ProductId,
    },
    InputShort {
        industry: IndustryId,
        product: ProductId,
        input: ProductId,
        deficit: f64,
    },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structural rejection of a recipe table. Only these abort a run; every
/// runtime shortage degrades into the shortfall report instead.
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    InvalidRecipe {
        industry: IndustryId,
        product: ProductId,
        field: &'static str,
        value: f64,
    },
    StageOutOfOrder {
        stage: Stage,
        after: Stage,
    },
    DuplicateStage {
        stage: Stage,
    },
    DuplicateInputSlot {
        industry: IndustryId,
        product: ProductId,
        kind: InputKind,
    },
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::InvalidRecipe {
                industry,
                product,
                field,
                value,
            } => write!(
                f,
                "invalid recipe: industry '{industry}', product '{product}': {field} = {value}"
            ),
            TableError::StageOutOfOrder { stage, after } => write!(
                f,
                "stage '{stage}' listed after '{after}'; stages must appear in ascending order"
            ),
            TableError::DuplicateStage { stage } => {
                write!(f, "stage '{stage}' appears more than once")
            }
            TableError::DuplicateInputSlot {
                industry,
                product,
                kind,
            } => write!(
                f,
                "industry '{industry}', product '{product}' declares more than one {kind} input"
            ),
        }
    }
}

impl std::error::Error for TableError {}
