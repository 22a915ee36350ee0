//! Shared table builders for unit tests, integration tests, and the
//! determinism harness. Compiled only under `cfg(test)` or the
//! `test-support` feature.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use smallvec::{smallvec, SmallVec};

use crate::{
    IndustryId, InputDraw, InputKind, ProductId, RecipeRow, RecipeTable, Stage, StageRecipes,
};

/// Deterministic RNG for generated tables. Fixed seed: fixtures must come
/// out identical across runs and platforms.
pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

/// A bare row with no demand and no inputs. Tests fill in what they need
/// with struct update syntax.
pub fn row(industry: &str, product: &str, difficulty: f64, labor: f64) -> RecipeRow {
    RecipeRow {
        industry: IndustryId::from(industry),
        product: ProductId::from(product),
        difficulty,
        labor,
        demand: None,
        popular_demand: None,
        inputs: SmallVec::new(),
        availability: None,
    }
}

pub fn water(product: &str, per_unit: f64) -> InputDraw {
    draw(InputKind::Water, product, per_unit)
}

pub fn energy(product: &str, per_unit: f64) -> InputDraw {
    draw(InputKind::Energy, product, per_unit)
}

pub fn material(product: &str, per_unit: f64) -> InputDraw {
    draw(InputKind::Material, product, per_unit)
}

fn draw(kind: InputKind, product: &str, per_unit: f64) -> InputDraw {
    InputDraw {
        kind,
        product: ProductId::from(product),
        per_unit,
    }
}

/// A three-stage economy that is exactly balanced at population 1000 and
/// utilization 1.0: every intermediate is consumed to the last unit and no
/// row falls short. Labor figures are powers of two and every coefficient
/// is dyadic, so all derived quantities are exact in f64 and tests can
/// assert with `==`.
///
/// `toolworks` owns two rows with different per-row requirements, which
/// pins the max-per-industry sizing policy.
pub fn base_table() -> RecipeTable {
    RecipeTable {
        stages: vec![
            StageRecipes {
                stage: Stage::Extraction,
                rows: vec![
                    RecipeRow {
                        availability: Some(100_000.0),
                        ..row("wells", "water", 1.0, 256.0)
                    },
                    RecipeRow {
                        availability: Some(100_000.0),
                        ..row("power_plant", "energy", 1.0, 256.0)
                    },
                    RecipeRow {
                        availability: Some(50_000.0),
                        ..row("mine", "ore", 2.0, 128.0)
                    },
                    RecipeRow {
                        availability: Some(80_000.0),
                        ..row("farm", "grain", 1.0, 128.0)
                    },
                ],
            },
            StageRecipes {
                stage: Stage::Processing,
                rows: vec![RecipeRow {
                    inputs: smallvec![
                        water("water", 0.5),
                        energy("energy", 1.0),
                        material("ore", 2.0),
                    ],
                    ..row("smelter", "metal", 2.0, 128.0)
                }],
            },
            StageRecipes {
                stage: Stage::Goods,
                rows: vec![
                    RecipeRow {
                        popular_demand: Some(100.0),
                        inputs: smallvec![
                            water("water", 0.25),
                            energy("energy", 0.5),
                            material("grain", 1.25),
                        ],
                        ..row("bakery", "bread", 1.0, 64.0)
                    },
                    RecipeRow {
                        popular_demand: Some(30.0),
                        inputs: smallvec![energy("energy", 0.5), material("metal", 0.75)],
                        ..row("toolworks", "tools", 1.0, 64.0)
                    },
                    RecipeRow {
                        popular_demand: Some(10.0),
                        inputs: smallvec![material("metal", 0.5)],
                        ..row("toolworks", "fixtures", 2.0, 64.0)
                    },
                ],
            },
        ],
    }
}

/// A two-row chain: `quarry` extracts `raw_a` against the given natural
/// availability, `works` turns 2 `raw_a` into one `good` under a fixed
/// direct demand of 10. The smallest table where extraction, stock flow,
/// and shortfall semantics are all observable.
pub fn chain_table(availability: f64) -> RecipeTable {
    RecipeTable {
        stages: vec![
            StageRecipes {
                stage: Stage::Extraction,
                rows: vec![RecipeRow {
                    availability: Some(availability),
                    ..row("quarry", "raw_a", 1.0, 50.0)
                }],
            },
            StageRecipes {
                stage: Stage::Goods,
                rows: vec![RecipeRow {
                    demand: Some(10.0),
                    inputs: smallvec![material("raw_a", 2.0)],
                    ..row("works", "good", 1.0, 10.0)
                }],
            },
        ],
    }
}

/// A three-stage table with a fixed shape and randomized coefficients:
/// four raws, three intermediates drawing water plus two raws each, three
/// goods. Identical seeds yield identical tables.
pub fn random_table(rng: &mut ChaCha8Rng) -> RecipeTable {
    let mut extraction = Vec::new();
    for i in 0..4 {
        extraction.push(RecipeRow {
            availability: Some(rng.gen_range(10_000.0..100_000.0)),
            ..row(
                &format!("extractor_{i}"),
                &format!("raw_{i}"),
                rng.gen_range(1.0..3.0),
                rng.gen_range(50.0..300.0),
            )
        });
    }

    let mut processing = Vec::new();
    for i in 0..3 {
        processing.push(RecipeRow {
            inputs: smallvec![
                water("water", rng.gen_range(0.1..0.5)),
                material(&format!("raw_{i}"), rng.gen_range(0.5..2.0)),
                material(&format!("raw_{}", (i + 1) % 4), rng.gen_range(0.25..1.0)),
            ],
            ..row(
                &format!("refiner_{i}"),
                &format!("mid_{i}"),
                rng.gen_range(1.0..3.0),
                rng.gen_range(40.0..200.0),
            )
        });
    }

    let mut goods = Vec::new();
    for i in 0..3 {
        let mut inputs: SmallVec<[InputDraw; 4]> =
            smallvec![material(&format!("mid_{i}"), rng.gen_range(0.25..1.5))];
        if i % 2 == 0 {
            inputs.push(material(&format!("mid_{}", (i + 1) % 3), rng.gen_range(0.25..1.0)));
        }
        goods.push(RecipeRow {
            popular_demand: Some(rng.gen_range(5.0..80.0)),
            inputs,
            ..row(
                &format!("factory_{i}"),
                &format!("good_{i}"),
                rng.gen_range(1.0..4.0),
                rng.gen_range(30.0..150.0),
            )
        });
    }

    RecipeTable {
        stages: vec![
            StageRecipes {
                stage: Stage::Extraction,
                rows: extraction,
            },
            StageRecipes {
                stage: Stage::Processing,
                rows: processing,
            },
            StageRecipes {
                stage: Stage::Goods,
                rows: goods,
            },
        ],
    }
}
