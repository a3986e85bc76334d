//! Per-plot purchases (speed, output, auto-harvest, evolution) and the
//! derived bonus stack: upgrade multipliers, adjacency, and the established
//! age bonus.

use crate::engine::CommandError;
use crate::resources::{Resource, ResourceSet};
use crate::state::{adjacent_indices, GameState, Plot, PLOT_COUNT};

/// Population consumed by the one-shot auto-harvest purchase.
pub(crate) const AUTO_HARVEST_POPULATION_COST: u64 = 2;

const ADJACENCY_BONUS_PER_MATCH: f64 = 0.1;
const ADJACENCY_BONUS_CAP: f64 = 0.3;
const ESTABLISHED_INTERVAL_MS: u64 = 10 * 60 * 1_000;
const ESTABLISHED_BONUS_PER_INTERVAL: f64 = 0.05;
const ESTABLISHED_BONUS_CAP: f64 = 1.0;

/// Recomputes both derived multipliers from the level and evolution state.
/// The evolution bonus multiplies the level-derived bonus.
pub(crate) fn apply_multipliers(plot: &mut Plot) {
    let tier = plot.evolution as f64;
    plot.production_speed = (1.0 + plot.speed_level as f64 * 0.5) * (1.0 + tier * 0.2);
    plot.harvest_multiplier = (1.0 + plot.output_level as f64 * 0.25) * (1.0 + tier * 0.15);
}

/// Grows 5% per ten minutes of uptime, capped at 100%. Computed lazily from
/// the stored placement time; never decays.
pub(crate) fn established_bonus(plot: &Plot, now: u64) -> f64 {
    let placed = match plot.placement_time {
        Some(placed) => placed,
        None => return 0.0,
    };
    let intervals = now.saturating_sub(placed) / ESTABLISHED_INTERVAL_MS;
    (intervals as f64 * ESTABLISHED_BONUS_PER_INTERVAL).min(ESTABLISHED_BONUS_CAP)
}

/// Refreshes the cached adjacency bonus on every plot. Called whenever a
/// building is placed or demolished.
pub(crate) fn recompute_adjacency(state: &mut GameState) {
    for index in 0..PLOT_COUNT {
        let bonus = match state.plots[index].building {
            Some(kind) => {
                let matching = adjacent_indices(index)
                    .into_iter()
                    .filter(|&adj| state.plots[adj].building == Some(kind))
                    .count();
                (matching as f64 * ADJACENCY_BONUS_PER_MATCH).min(ADJACENCY_BONUS_CAP)
            }
            None => 0.0,
        };
        state.plots[index].adjacency_bonus = bonus;
    }
}

fn occupied_plot(state: &GameState, index: usize) -> Result<&Plot, CommandError> {
    let plot = state
        .plot(index)
        .ok_or(CommandError::PlotOutOfBounds { index })?;
    if !plot.has_building() {
        return Err(CommandError::PlotEmpty);
    }
    Ok(plot)
}

fn deduct_gold(state: &mut GameState, cost: u64) -> Result<(), CommandError> {
    let cost = ResourceSet {
        gold: cost,
        ..ResourceSet::NONE
    };
    if state.ledger.deduct(&cost) {
        Ok(())
    } else {
        Err(CommandError::CannotAfford)
    }
}

pub(crate) fn purchase_speed(state: &mut GameState, index: usize) -> Result<(), CommandError> {
    let plot = occupied_plot(state, index)?;
    let def = plot.building.expect("occupied plot").def();
    let stage = def.stage(plot.evolution);
    if plot.speed_level >= stage.max_level {
        return Err(CommandError::UpgradeCapped);
    }
    let cost = def.speed_upgrade_cost(plot.speed_level, plot.evolution);
    deduct_gold(state, cost)?;
    let plot = &mut state.plots[index];
    plot.speed_level += 1;
    apply_multipliers(plot);
    Ok(())
}

pub(crate) fn purchase_output(state: &mut GameState, index: usize) -> Result<(), CommandError> {
    let plot = occupied_plot(state, index)?;
    let def = plot.building.expect("occupied plot").def();
    let stage = def.stage(plot.evolution);
    if plot.output_level >= stage.max_level {
        return Err(CommandError::UpgradeCapped);
    }
    let cost = def.output_upgrade_cost(plot.output_level, plot.evolution);
    deduct_gold(state, cost)?;
    let plot = &mut state.plots[index];
    plot.output_level += 1;
    apply_multipliers(plot);
    Ok(())
}

/// One-shot and irreversible; paid in population rather than gold.
pub(crate) fn purchase_auto_harvest(
    state: &mut GameState,
    index: usize,
) -> Result<(), CommandError> {
    let plot = occupied_plot(state, index)?;
    if plot.auto_harvest {
        return Err(CommandError::AlreadyAutomated);
    }
    let cost = ResourceSet {
        population: AUTO_HARVEST_POPULATION_COST,
        ..ResourceSet::NONE
    };
    if !state.ledger.deduct(&cost) {
        return Err(CommandError::CannotAfford);
    }
    state.plots[index].auto_harvest = true;
    Ok(())
}

/// Advances the evolution tier. Requires both upgrade tracks maxed for the
/// current stage; resets them to zero on success so the new, higher cap
/// starts fresh.
pub(crate) fn purchase_evolution(state: &mut GameState, index: usize) -> Result<(), CommandError> {
    let plot = occupied_plot(state, index)?;
    let def = plot.building.expect("occupied plot").def();
    if plot.evolution >= def.max_tier() {
        return Err(CommandError::EvolutionMaxed);
    }
    let stage = def.stage(plot.evolution);
    if plot.speed_level < stage.max_level || plot.output_level < stage.max_level {
        return Err(CommandError::EvolutionBlocked);
    }
    let cost = def.evolution_cost(plot.evolution);
    if !state.ledger.deduct(&cost) {
        return Err(CommandError::CannotAfford);
    }
    let plot = &mut state.plots[index];
    plot.evolution += 1;
    plot.speed_level = 0;
    plot.output_level = 0;
    apply_multipliers(plot);
    Ok(())
}

pub(crate) fn unlock_plot(state: &mut GameState, index: usize) -> Result<(), CommandError> {
    let plot = state
        .plot(index)
        .ok_or(CommandError::PlotOutOfBounds { index })?;
    if plot.unlocked {
        return Err(CommandError::AlreadyUnlocked);
    }
    let cost = state.next_plot_cost;
    if state.ledger.amount(Resource::Gold) < cost {
        return Err(CommandError::CannotAfford);
    }
    let deducted = state.ledger.deduct(&ResourceSet {
        gold: cost,
        ..ResourceSet::NONE
    });
    debug_assert!(deducted);
    state.plots[index].unlocked = true;
    state.next_plot_cost = cost.saturating_mul(2);
    Ok(())
}
