use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default = "default_table")]
    pub table: String,
    pub populations: GridSpec,
    pub utilizations: GridSpec,
}

fn default_table() -> String {
    "./content/recipes.json".to_string()
}

/// One sweep axis: either explicit values or an inclusive arithmetic range.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GridSpec {
    List(Vec<f64>),
    Range { start: f64, end: f64, step: f64 },
}

impl GridSpec {
    /// Grid points along the axis. Range endpoints are inclusive, with
    /// half-step slack so accumulated float error cannot drop the last
    /// point. A range without finite bounds and a positive step expands
    /// to nothing.
    pub fn expand(&self) -> Vec<f64> {
        match self {
            GridSpec::List(values) => values.clone(),
            GridSpec::Range { start, end, step } => {
                if !(start.is_finite() && end.is_finite() && step.is_finite() && *step > 0.0) {
                    return Vec::new();
                }
                let mut values = Vec::new();
                let mut value = *start;
                while value <= end + step / 2.0 {
                    values.push(value);
                    let next = value + step;
                    // Stop if the step is absorbed by rounding.
                    if next <= value {
                        break;
                    }
                    value = next;
                }
                values
            }
        }
    }
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario file: {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&json)
        .with_context(|| format!("parsing scenario file: {}", path.display()))?;
    if scenario.name.is_empty() {
        bail!("scenario 'name' must not be empty");
    }
    if scenario.populations.expand().is_empty() {
        bail!("scenario 'populations' must expand to at least one value");
    }
    if scenario.utilizations.expand().is_empty() {
        bail!("scenario 'utilizations' must expand to at least one value");
    }
    Ok(scenario)
}
