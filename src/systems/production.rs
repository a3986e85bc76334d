//! The harvest state machine. A plot with a building is either Producing
//! (`now < next_harvest`) or Ready (`harvest_ready`, awaiting collection);
//! the tick loop flips the first into the second and drains auto-harvest
//! plots in place.

use serde::Serialize;

use crate::catalog::BuildingKind;
use crate::engine::CommandError;
use crate::resources::ResourceSet;
use crate::state::{GameState, Plot, PLOT_COUNT};
use crate::systems::upgrade;

/// What a single production tick did, for the host to re-render from.
#[derive(Debug, Default, Clone, Serialize)]
pub struct TickReport {
    pub newly_ready: Vec<usize>,
    pub auto_harvested: Vec<(usize, ResourceSet)>,
}

/// Milliseconds a full cycle takes for `plot` under the current bonus stack.
///
/// Starvation doubles the duration; production speed and the efficiency
/// bonus (adjacency + established) shrink it. Floored to whole milliseconds
/// so replays are exact.
pub(crate) fn effective_harvest_time(plot: &Plot, starving: bool, now: u64) -> u64 {
    let kind = match plot.building {
        Some(kind) => kind,
        None => return 0,
    };
    let base = kind.def().harvest_time_ms as f64;
    let starvation_multiplier = if starving { 2.0 } else { 1.0 };
    let efficiency = 1.0 + plot.adjacency_bonus + upgrade::established_bonus(plot, now);
    (base * starvation_multiplier / (plot.production_speed * efficiency)).floor() as u64
}

/// Schedules the next cycle for the plot at `index` and clears the ready
/// flag. Called on build, on harvest, and by the offline replay.
pub(crate) fn reset_harvest_timer(state: &mut GameState, index: usize, now: u64) {
    let starving = state.is_starving;
    let plot = &mut state.plots[index];
    if !plot.has_building() {
        return;
    }
    let effective = effective_harvest_time(plot, starving, now);
    plot.next_harvest = now + effective;
    plot.harvest_ready = false;
}

pub(crate) fn place_building(
    state: &mut GameState,
    index: usize,
    kind: BuildingKind,
    now: u64,
) -> Result<(), CommandError> {
    let plot = state
        .plots
        .get(index)
        .ok_or(CommandError::PlotOutOfBounds { index })?;
    if !plot.unlocked {
        return Err(CommandError::PlotLocked);
    }
    if plot.has_building() {
        return Err(CommandError::PlotOccupied);
    }
    if !state.ledger.deduct(&kind.def().cost) {
        return Err(CommandError::CannotAfford);
    }

    let plot = &mut state.plots[index];
    plot.building = Some(kind);
    plot.level = 1;
    plot.evolution = 0;
    plot.speed_level = 0;
    plot.output_level = 0;
    plot.auto_harvest = false;
    plot.production_speed = 1.0;
    plot.harvest_multiplier = 1.0;
    plot.placement_time = Some(now);

    upgrade::recompute_adjacency(state);
    reset_harvest_timer(state, index, now);
    Ok(())
}

/// Output of one completed cycle under the current multipliers, floored per
/// resource. Starvation halves yields.
fn harvest_output(plot: &Plot, starving: bool) -> ResourceSet {
    let kind = plot.building.expect("harvest on an occupied plot");
    let starvation_factor = if starving { 0.5 } else { 1.0 };
    kind.def()
        .produces
        .scaled_floor(plot.harvest_multiplier * starvation_factor)
}

/// Collects a ready plot unconditionally and restarts its cycle. Shared by
/// the manual command and the auto-harvest path in the tick loop.
fn collect(state: &mut GameState, index: usize, now: u64) -> ResourceSet {
    let output = harvest_output(&state.plots[index], state.is_starving);
    state.ledger.add(&output);
    reset_harvest_timer(state, index, now);
    output
}

/// Manual harvest. Rejected on empty, not-yet-ready, and automated plots;
/// automated buildings are drained only by the tick loop.
pub(crate) fn harvest(
    state: &mut GameState,
    index: usize,
    now: u64,
) -> Result<ResourceSet, CommandError> {
    let plot = state
        .plots
        .get(index)
        .ok_or(CommandError::PlotOutOfBounds { index })?;
    if !plot.has_building() {
        return Err(CommandError::PlotEmpty);
    }
    if plot.auto_harvest {
        return Err(CommandError::Automated);
    }
    if !plot.harvest_ready {
        return Err(CommandError::NotReady);
    }
    Ok(collect(state, index, now))
}

/// One production tick: flip deadlines that have passed into Ready, then
/// immediately drain any automated plot so it never rests visibly in the
/// Ready state.
pub(crate) fn tick(state: &mut GameState, now: u64) -> TickReport {
    let mut report = TickReport::default();
    for index in 0..PLOT_COUNT {
        let plot = &mut state.plots[index];
        if !plot.has_building() || !plot.unlocked {
            continue;
        }
        if !plot.harvest_ready && now >= plot.next_harvest {
            plot.harvest_ready = true;
            report.newly_ready.push(index);
        }
        if state.plots[index].harvest_ready && state.plots[index].auto_harvest {
            let output = collect(state, index, now);
            report.auto_harvested.push((index, output));
        }
    }
    report
}

/// Fraction of the current cycle already elapsed, in `[0, 1]`. Ready and
/// empty plots report 1.
pub(crate) fn progress(state: &GameState, index: usize, now: u64) -> f64 {
    let plot = match state.plot(index) {
        Some(plot) => plot,
        None => return 1.0,
    };
    if !plot.has_building() || plot.harvest_ready {
        return 1.0;
    }
    let remaining = plot.next_harvest.saturating_sub(now);
    if remaining == 0 {
        return 1.0;
    }
    let effective = effective_harvest_time(plot, state.is_starving, now);
    if effective == 0 {
        return 1.0;
    }
    (1.0 - remaining as f64 / effective as f64).max(0.0)
}
