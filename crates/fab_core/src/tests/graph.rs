use super::*;

fn consumer(industry: &str, product: &str, input: &str) -> RecipeRow {
    let mut r = row(industry, product, 1.0, 10.0);
    r.demand = Some(1.0);
    r.inputs.push(material(input, 1.0));
    r
}

#[test]
fn test_edges_cover_every_input_kind() {
    let edges = dependency_edges(&base_table());

    // 3 smelter draws + 3 bakery + 2 tools + 1 fixtures.
    assert_eq!(edges.len(), 9);
    assert!(edges.contains(&(pid("water"), pid("metal"))), "water slot");
    assert!(edges.contains(&(pid("energy"), pid("bread"))), "energy slot");
    assert!(edges.contains(&(pid("metal"), pid("fixtures"))), "material");
    assert_eq!(
        edges[0],
        (pid("water"), pid("metal")),
        "table order preserved"
    );
}

#[test]
fn test_duplicate_edges_collapse() {
    let table = single_stage(
        Stage::Goods,
        vec![
            consumer("joinery_a", "plank", "timber"),
            consumer("joinery_b", "plank", "timber"),
        ],
    );

    let edges = dependency_edges(&table);
    assert_eq!(edges, vec![(pid("timber"), pid("plank"))]);
}

#[test]
fn test_clean_table_has_no_hazards() {
    assert!(table_hazards(&base_table()).is_empty());
    assert!(table_hazards(&chain_table(10.0)).is_empty());
}

#[test]
fn test_multiple_producers_flagged() {
    let table = RecipeTable {
        stages: vec![
            StageRecipes {
                stage: Stage::Processing,
                rows: vec![consumer("sawmill", "plank", "timber")],
            },
            StageRecipes {
                stage: Stage::Goods,
                rows: vec![consumer("workshop", "plank", "timber")],
            },
        ],
    };

    let hazards = table_hazards(&table);
    assert_eq!(
        hazards,
        vec![TableHazard::MultipleProducers {
            product: pid("plank"),
            producers: vec![iid("sawmill"), iid("workshop")],
        }]
    );
}

#[test]
fn test_same_stage_consumption_is_an_ordering_hazard() {
    let table = single_stage(
        Stage::Goods,
        vec![
            consumer("maker", "part", "scrap"),
            consumer("user", "gadget", "part"),
        ],
    );

    let hazards = table_hazards(&table);
    assert_eq!(
        hazards,
        vec![TableHazard::OrderingHazard {
            product: pid("part"),
            produced_in: Stage::Goods,
            consumed_in: Stage::Goods,
        }]
    );
}

#[test]
fn test_later_stage_producer_flagged() {
    let table = RecipeTable {
        stages: vec![
            StageRecipes {
                stage: Stage::Processing,
                rows: vec![consumer("refiner", "mid", "widget")],
            },
            StageRecipes {
                stage: Stage::Goods,
                rows: vec![consumer("factory", "widget", "mid")],
            },
        ],
    };

    let hazards = table_hazards(&table);
    assert_eq!(
        hazards,
        vec![TableHazard::OrderingHazard {
            product: pid("widget"),
            produced_in: Stage::Goods,
            consumed_in: Stage::Processing,
        }]
    );
}

#[test]
fn test_cycle_surfaces_as_ordering_hazard() {
    // mid needs assembly, assembly needs mid.
    let table = RecipeTable {
        stages: vec![
            StageRecipes {
                stage: Stage::Processing,
                rows: vec![consumer("refiner", "mid", "assembly")],
            },
            StageRecipes {
                stage: Stage::Goods,
                rows: vec![consumer("assembler", "assembly", "mid")],
            },
        ],
    };

    let hazards = table_hazards(&table);
    assert!(
        hazards
            .iter()
            .any(|h| matches!(h, TableHazard::OrderingHazard { .. })),
        "a cycle always breaks stage ordering somewhere"
    );
}

#[test]
fn test_duplicate_hazards_collapse() {
    let table = single_stage(
        Stage::Goods,
        vec![
            consumer("maker", "part", "scrap"),
            consumer("user_a", "gadget_a", "part"),
            consumer("user_b", "gadget_b", "part"),
        ],
    );

    let ordering = table_hazards(&table)
        .into_iter()
        .filter(|h| matches!(h, TableHazard::OrderingHazard { .. }))
        .count();
    assert_eq!(ordering, 1, "same (product, stages) pair reported once");
}

#[test]
fn test_hazard_display_names_the_product() {
    let hazard = TableHazard::OrderingHazard {
        product: pid("part"),
        produced_in: Stage::Goods,
        consumed_in: Stage::Goods,
    };
    let text = hazard.to_string();
    assert!(text.contains("part"), "display names the product: {text}");

    let multi = TableHazard::MultipleProducers {
        product: pid("plank"),
        producers: vec![iid("sawmill"), iid("workshop")],
    };
    let text = multi.to_string();
    assert!(text.contains("sawmill") && text.contains("workshop"));
}
