//! Periodic food upkeep. Each cycle the population eats one food per head;
//! a shortfall flips the starving flag and, once, doubles the remaining time
//! of every in-flight production cycle. While starving, future timer resets
//! and harvest yields are penalized by the production formulas.

use serde::Serialize;
use tracing::debug;

use crate::resources::{Resource, ResourceSet};
use crate::state::GameState;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FoodReport {
    pub required: u64,
    pub consumed: bool,
    pub starving: bool,
}

pub(crate) fn consume_food(state: &mut GameState, now: u64) -> FoodReport {
    let required = state.ledger.amount(Resource::Population);
    let upkeep = ResourceSet {
        food: required,
        ..ResourceSet::NONE
    };

    let consumed = if state.ledger.deduct(&upkeep) {
        state.is_starving = false;
        true
    } else {
        if !state.is_starving {
            debug!(required, "food shortfall, kingdom is starving");
        }
        state.is_starving = true;
        // One-time penalty at onset: in-flight cycles lose half their pace.
        for plot in state.plots.iter_mut() {
            if plot.has_building() && plot.unlocked && !plot.harvest_ready {
                let remaining = plot.next_harvest.saturating_sub(now);
                if remaining > 0 {
                    plot.next_harvest = now + remaining * 2;
                }
            }
        }
        false
    };

    state.last_food_consumption = now;
    FoodReport {
        required,
        consumed,
        starving: state.is_starving,
    }
}

/// The consume-or-starve arithmetic alone, with no timer penalty. Used by
/// the offline replay, which reconstructs timers separately.
pub(crate) fn replay_cycle(state: &mut GameState) {
    let upkeep = ResourceSet {
        food: state.ledger.amount(Resource::Population),
        ..ResourceSet::NONE
    };
    if state.ledger.deduct(&upkeep) {
        state.is_starving = false;
    } else {
        state.is_starving = true;
    }
}
