use demesne::{
    catalog::BuildingKind,
    config::GameConfig,
    engine::CommandError,
    resources::ResourceSet,
    Engine,
};

const T0: u64 = 1_700_000_000_000;

fn config_with(starting: ResourceSet) -> GameConfig {
    GameConfig {
        starting_resources: starting,
        ..GameConfig::default()
    }
}

fn engine_with(starting: ResourceSet) -> Engine {
    Engine::new(config_with(starting), T0)
}

#[test]
fn building_a_wheat_field_deducts_cost_and_schedules_harvest() {
    let mut engine = engine_with(ResourceSet {
        food: 50,
        population: 2,
        ..ResourceSet::NONE
    });

    let outcome = engine
        .build_building(0, BuildingKind::WheatField, T0)
        .expect("plot 0 starts unlocked and empty");

    assert_eq!(outcome.resources.food, 40);
    let plot = engine.plot(0).unwrap();
    assert_eq!(plot.building, Some(BuildingKind::WheatField));
    assert_eq!(
        plot.next_harvest,
        T0 + 60_000,
        "base harvest time with no bonuses and no starvation"
    );
    assert!(!plot.harvest_ready);
}

#[test]
fn build_rejections_leave_state_untouched() {
    let mut engine = engine_with(ResourceSet {
        food: 5,
        population: 2,
        ..ResourceSet::NONE
    });
    let before = engine.state().clone();

    assert_eq!(
        engine.build_building(0, BuildingKind::WheatField, T0),
        Err(CommandError::CannotAfford)
    );
    assert_eq!(
        engine.build_building(5, BuildingKind::WheatField, T0),
        Err(CommandError::PlotLocked),
        "plots beyond the starting two are locked"
    );
    assert_eq!(
        engine.build_building(42, BuildingKind::WheatField, T0),
        Err(CommandError::PlotOutOfBounds { index: 42 })
    );
    assert_eq!(engine.state(), &before);
}

#[test]
fn harvest_collects_output_and_restarts_the_cycle() {
    let mut engine = engine_with(ResourceSet {
        food: 50,
        population: 2,
        ..ResourceSet::NONE
    });
    engine.build_building(0, BuildingKind::WheatField, T0).unwrap();

    // Not ready yet: a no-op failure.
    assert_eq!(
        engine.harvest_building(0, T0 + 1_000),
        Err(CommandError::NotReady)
    );

    let ready_at = T0 + 60_000;
    let report = engine.production_tick(ready_at);
    assert_eq!(report.newly_ready, vec![0]);
    assert!(engine.plot(0).unwrap().harvest_ready);

    let outcome = engine.harvest_building(0, ready_at).unwrap();
    assert_eq!(outcome.resources.food, 50, "40 remaining + 10 harvested");
    let plot = engine.plot(0).unwrap();
    assert!(!plot.harvest_ready);
    assert_eq!(plot.next_harvest, ready_at + 60_000);
}

#[test]
fn starvation_skips_the_deduction_and_doubles_pending_timers() {
    let mut engine = engine_with(ResourceSet {
        food: 11,
        population: 2,
        ..ResourceSet::NONE
    });
    engine.build_building(0, BuildingKind::WheatField, T0).unwrap();
    assert_eq!(engine.resources().food, 1);

    let at = T0 + 10_000;
    let report = engine.consume_food(at);
    assert!(!report.consumed);
    assert!(report.starving);
    assert!(engine.is_starving());
    assert_eq!(engine.resources().food, 1, "shortfall path does not deduct");
    assert_eq!(
        engine.plot(0).unwrap().next_harvest,
        at + 100_000,
        "50s remaining doubled to 100s"
    );
}

#[test]
fn feeding_again_clears_starvation_without_shrinking_timers() {
    let mut engine = engine_with(ResourceSet {
        food: 11,
        population: 2,
        ..ResourceSet::NONE
    });
    engine.build_building(0, BuildingKind::WheatField, T0).unwrap();
    engine.consume_food(T0 + 10_000);
    assert!(engine.is_starving());

    // The doubled cycle completes; its halved yield refills the larder.
    let ready_at = T0 + 110_000;
    engine.production_tick(ready_at);
    engine.harvest_building(0, ready_at).unwrap();
    assert_eq!(engine.resources().food, 6);
    let stretched = engine.plot(0).unwrap().next_harvest;
    assert_eq!(stretched, ready_at + 120_000, "reset while starving");

    let report = engine.consume_food(T0 + 130_000);
    assert!(report.consumed);
    assert!(!engine.is_starving());
    assert_eq!(
        engine.plot(0).unwrap().next_harvest,
        stretched,
        "recovery does not retroactively shrink in-flight timers"
    );
}

#[test]
fn starving_halves_output_and_doubles_future_cycles() {
    let mut engine = engine_with(ResourceSet {
        food: 11,
        population: 2,
        ..ResourceSet::NONE
    });
    engine.build_building(0, BuildingKind::WheatField, T0).unwrap();
    engine.consume_food(T0 + 10_000);
    assert!(engine.is_starving());

    let ready_at = T0 + 110_000;
    engine.production_tick(ready_at);
    let before = engine.resources().food;
    engine.harvest_building(0, ready_at).unwrap();
    let plot = engine.plot(0).unwrap();
    assert_eq!(
        engine.resources().food - before,
        5,
        "floor(10 * 1.0 * 0.5) while starving"
    );
    assert_eq!(
        plot.next_harvest,
        ready_at + 120_000,
        "floor(60000 * 2 / 1.0) while starving"
    );
}

#[test]
fn speed_upgrades_shrink_the_cycle_per_the_linear_formula() {
    let mut engine = engine_with(ResourceSet {
        food: 50,
        gold: 100,
        population: 2,
        ..ResourceSet::NONE
    });
    engine.build_building(0, BuildingKind::WheatField, T0).unwrap();
    engine.purchase_speed_upgrade(0).expect("level 1 costs 10 gold");
    engine.purchase_speed_upgrade(0).expect("level 2 costs 28 gold");
    assert_eq!(engine.resources().gold, 62);

    let plot = engine.plot(0).unwrap();
    assert_eq!(plot.speed_level, 2);
    assert_eq!(plot.production_speed, 2.0, "1 + 2 * 0.5");

    let ready_at = T0 + 60_000;
    engine.production_tick(ready_at);
    engine.harvest_building(0, ready_at).unwrap();
    assert_eq!(
        engine.plot(0).unwrap().next_harvest,
        ready_at + 30_000,
        "floor(60000 / 2.0)"
    );
}

#[test]
fn adjacency_bonus_applies_to_matching_neighbors_only() {
    let mut engine = engine_with(ResourceSet {
        food: 100,
        wood: 100,
        population: 4,
        ..ResourceSet::NONE
    });
    engine.build_building(0, BuildingKind::WheatField, T0).unwrap();
    engine
        .build_building(1, BuildingKind::WoodcuttersHut, T0)
        .unwrap();
    assert_eq!(
        engine.plot(0).unwrap().adjacency_bonus,
        0.0,
        "different building kinds do not match"
    );

    // Replace the hut with a second wheat field.
    engine.demolish(1).unwrap();
    engine.build_building(1, BuildingKind::WheatField, T0).unwrap();
    assert_eq!(engine.plot(0).unwrap().adjacency_bonus, 0.1);
    assert_eq!(engine.plot(1).unwrap().adjacency_bonus, 0.1);

    let ready_at = T0 + 60_000;
    engine.production_tick(ready_at);
    engine.harvest_building(0, ready_at).unwrap();
    assert_eq!(
        engine.plot(0).unwrap().next_harvest,
        ready_at + 54_545,
        "floor(60000 / 1.1)"
    );
}

#[test]
fn auto_harvest_collects_in_the_tick_and_blocks_manual_collection() {
    let mut engine = engine_with(ResourceSet {
        food: 50,
        wood: 20,
        population: 4,
        ..ResourceSet::NONE
    });
    engine
        .build_building(0, BuildingKind::WoodcuttersHut, T0)
        .unwrap();
    engine.purchase_auto_harvest(0).expect("costs 2 population");
    assert_eq!(engine.resources().population, 2);
    assert_eq!(
        engine.purchase_auto_harvest(0),
        Err(CommandError::AlreadyAutomated)
    );

    let at = T0 + 10_000;
    let report = engine.production_tick(at);
    assert_eq!(report.auto_harvested.len(), 1);
    assert_eq!(engine.resources().wood, 11, "10 left after building + 1 cycle");
    let plot = engine.plot(0).unwrap();
    assert!(!plot.harvest_ready, "auto plots never rest in Ready");
    assert_eq!(plot.next_harvest, at + 10_000);

    engine.production_tick(at + 10_000);
    assert_eq!(
        engine.harvest_building(0, at + 10_000),
        Err(CommandError::Automated)
    );
}

#[test]
fn evolution_requires_both_tracks_maxed_and_resets_them() {
    let mut engine = engine_with(ResourceSet {
        food: 500,
        wood: 100,
        gold: 1_000_000,
        population: 2,
        ..ResourceSet::NONE
    });
    engine.build_building(0, BuildingKind::WheatField, T0).unwrap();

    assert_eq!(
        engine.purchase_evolution(0),
        Err(CommandError::EvolutionBlocked)
    );

    for _ in 0..5 {
        engine.purchase_speed_upgrade(0).unwrap();
        engine.purchase_output_upgrade(0).unwrap();
    }
    assert_eq!(
        engine.purchase_speed_upgrade(0),
        Err(CommandError::UpgradeCapped),
        "tier 0 caps both tracks at level 5"
    );

    let food_before = engine.resources().food;
    let wood_before = engine.resources().wood;
    engine.purchase_evolution(0).expect("both tracks maxed");
    assert_eq!(engine.resources().food, food_before - 50);
    assert_eq!(engine.resources().wood, wood_before - 10);

    let plot = engine.plot(0).unwrap();
    assert_eq!(plot.evolution, 1);
    assert_eq!((plot.speed_level, plot.output_level), (0, 0));
    assert!((plot.production_speed - 1.2).abs() < 1e-12);
    assert!((plot.harvest_multiplier - 1.15).abs() < 1e-12);

    // The new stage reopens the speed track at its higher cap.
    engine.purchase_speed_upgrade(0).expect("tier 1 level 1");
}

#[test]
fn demolition_refunds_a_quarter_and_consumes_population() {
    let mut engine = engine_with(ResourceSet {
        food: 50,
        wood: 20,
        population: 4,
        ..ResourceSet::NONE
    });
    engine.build_building(0, BuildingKind::Shelter, T0).unwrap();
    assert_eq!(engine.resources().wood, 5);

    let quote = engine.demolition_quote(0).unwrap();
    assert_eq!(quote.recovered.wood, 3, "floor(15 * 0.25)");
    assert_eq!(
        quote.population_cost, 4,
        "total cost 15 lands in the second tier bucket"
    );

    engine.demolish(0).unwrap();
    assert_eq!(engine.resources().wood, 8);
    assert_eq!(engine.resources().population, 0);
    let plot = engine.plot(0).unwrap();
    assert!(plot.unlocked, "demolition keeps the plot unlocked");
    assert!(!plot.has_building());
    assert!(!plot.harvest_ready);
    assert_eq!((plot.speed_level, plot.output_level), (0, 0));
}

#[test]
fn demolition_fails_without_population() {
    let mut engine = engine_with(ResourceSet {
        food: 50,
        wood: 20,
        population: 3,
        ..ResourceSet::NONE
    });
    engine.build_building(0, BuildingKind::Shelter, T0).unwrap();
    let before = engine.state().clone();
    assert_eq!(
        engine.demolish(0),
        Err(CommandError::CannotAfford),
        "tearing down a shelter takes 4 population"
    );
    assert_eq!(engine.state(), &before);
}

#[test]
fn unlocking_plots_doubles_the_price() {
    let mut engine = engine_with(ResourceSet {
        gold: 300,
        population: 2,
        ..ResourceSet::NONE
    });
    assert_eq!(engine.next_plot_cost(), 100);
    engine.unlock_plot(2).unwrap();
    assert_eq!(engine.resources().gold, 200);
    assert_eq!(engine.next_plot_cost(), 200);
    engine.unlock_plot(3).unwrap();
    assert_eq!(engine.resources().gold, 0);
    assert_eq!(engine.next_plot_cost(), 400);
    assert_eq!(engine.unlock_plot(4), Err(CommandError::CannotAfford));
    assert_eq!(engine.unlock_plot(0), Err(CommandError::AlreadyUnlocked));
}

#[test]
fn progress_runs_from_zero_to_one() {
    let mut engine = engine_with(ResourceSet {
        food: 50,
        population: 2,
        ..ResourceSet::NONE
    });
    engine.build_building(0, BuildingKind::WheatField, T0).unwrap();
    assert_eq!(engine.progress(0, T0), 0.0);
    assert!((engine.progress(0, T0 + 30_000) - 0.5).abs() < 1e-9);
    engine.production_tick(T0 + 60_000);
    assert_eq!(engine.progress(0, T0 + 60_000), 1.0);
    assert_eq!(engine.progress(1, T0), 1.0, "empty plots report 1");
}

#[test]
fn listings_reflect_plot_state_and_affordability() {
    let mut engine = engine_with(ResourceSet {
        food: 10,
        population: 2,
        ..ResourceSet::NONE
    });
    let listings = engine.available_buildings(0);
    assert_eq!(listings.len(), 3);
    let wheat = listings
        .iter()
        .find(|l| l.kind == BuildingKind::WheatField)
        .unwrap();
    assert!(wheat.affordable);
    let hut = listings
        .iter()
        .find(|l| l.kind == BuildingKind::WoodcuttersHut)
        .unwrap();
    assert!(!hut.affordable, "needs wood we do not have");

    assert!(engine.available_buildings(5).is_empty(), "locked plot");
    assert!(engine.available_upgrades(0).is_none(), "empty plot");

    engine.build_building(0, BuildingKind::WheatField, T0).unwrap();
    assert!(engine.available_buildings(0).is_empty(), "occupied plot");
    let upgrades = engine.available_upgrades(0).unwrap();
    assert_eq!(upgrades.stage_name, "Wheat Field");
    let speed = upgrades.speed.unwrap();
    assert_eq!(speed.cost, 10);
    assert!(!speed.affordable, "no gold yet");
    let auto = upgrades.auto_harvest.unwrap();
    assert_eq!(auto.cost, 2);
    assert!(auto.affordable);
    let evolution = upgrades.evolution.unwrap();
    assert!(!evolution.tracks_maxed);
}

#[test]
fn identical_command_scripts_produce_identical_states() {
    let starting = ResourceSet {
        food: 100,
        wood: 50,
        gold: 200,
        population: 4,
        ..ResourceSet::NONE
    };
    let run = || {
        let mut engine = engine_with(starting);
        engine.build_building(0, BuildingKind::WheatField, T0).unwrap();
        engine
            .build_building(1, BuildingKind::WoodcuttersHut, T0 + 500)
            .unwrap();
        engine.purchase_speed_upgrade(0).unwrap();
        engine.purchase_auto_harvest(1).unwrap();
        let mut now = T0;
        for _ in 0..120 {
            now += 1_000;
            let report = engine.production_tick(now);
            for index in report.newly_ready {
                let _ = engine.harvest_building(index, now);
            }
            if engine.food_due(now) {
                engine.consume_food(now);
            }
            engine.event_tick(now);
        }
        engine
    };

    let first = run();
    let second = run();
    assert_eq!(first.state(), second.state());
    assert_eq!(first.resources(), second.resources());
}

#[test]
fn events_trigger_and_resolve_deterministically() {
    let mut engine = engine_with(ResourceSet {
        food: 100,
        wood: 100,
        gold: 100,
        population: 2,
        ..ResourceSet::NONE
    });
    assert_eq!(engine.accept_event(T0), Err(CommandError::NoActiveEvent));

    // The first trigger lands within the configured 20-60s window.
    let mut now = T0;
    while engine.active_event().is_none() {
        now += 1_000;
        assert!(now <= T0 + 61_000, "an event must trigger within the window");
        engine.event_tick(now);
    }

    let before = engine.resources();
    use demesne::systems::ActiveEvent;
    let expected = match engine.active_event().unwrap().clone() {
        ActiveEvent::WanderingTrader { offer, .. } => {
            let mut after = before;
            after.set(offer.give, before.amount(offer.give) - offer.give_amount);
            after.set(
                offer.receive,
                after.amount(offer.receive) + offer.receive_amount,
            );
            after
        }
        ActiveEvent::BountifulHarvest {
            bonus_food,
            bonus_wood,
            ..
        } => ResourceSet {
            food: before.food + bonus_food,
            wood: before.wood + bonus_wood,
            ..before
        },
        ActiveEvent::RoyalTax { amount, .. } => ResourceSet {
            gold: before.gold - amount,
            ..before
        },
    };
    engine.accept_event(now).unwrap();
    assert_eq!(engine.resources(), expected);
    assert!(engine.active_event().is_none());
    assert_eq!(engine.dismiss_event(now), Err(CommandError::NoActiveEvent));
}
