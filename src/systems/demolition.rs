//! Tear-down. Demolishing refunds a quarter of the original build cost and
//! consumes population scaled by the building's cost tier; the vacated plot
//! stays unlocked and every adjacency bonus is refreshed.

use serde::Serialize;

use crate::catalog::BuildingDef;
use crate::engine::CommandError;
use crate::resources::{Resource, ResourceSet};
use crate::state::GameState;
use crate::systems::upgrade;

const RECOVERY_RATE: f64 = 0.25;

#[derive(Debug, Clone, Serialize)]
pub struct DemolitionReport {
    pub recovered: ResourceSet,
    pub population_cost: u64,
}

/// A quarter of each original cost component, floored.
pub(crate) fn recovery(def: &BuildingDef) -> ResourceSet {
    def.cost.scaled_floor(RECOVERY_RATE)
}

/// Buildings bucket into tiers by total build cost; tearing one down takes
/// tier-squared population.
pub(crate) fn population_cost(def: &BuildingDef) -> u64 {
    let tier = match def.cost.total() {
        0..=10 => 1,
        11..=25 => 2,
        26..=50 => 3,
        _ => 4,
    };
    tier * tier
}

pub(crate) fn demolish(
    state: &mut GameState,
    index: usize,
) -> Result<DemolitionReport, CommandError> {
    let plot = state
        .plot(index)
        .ok_or(CommandError::PlotOutOfBounds { index })?;
    let def = plot.building.ok_or(CommandError::PlotEmpty)?.def();

    let population_needed = population_cost(def);
    if state.ledger.amount(Resource::Population) < population_needed {
        return Err(CommandError::CannotAfford);
    }

    let recovered = recovery(def);
    let deducted = state.ledger.deduct(&ResourceSet {
        population: population_needed,
        ..ResourceSet::NONE
    });
    debug_assert!(deducted);
    state.ledger.add(&recovered);
    state.clear_plot(index);
    upgrade::recompute_adjacency(state);

    Ok(DemolitionReport {
        recovered,
        population_cost: population_needed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuildingKind;

    #[test]
    fn recovery_floors_a_quarter_of_each_component() {
        let recovered = recovery(BuildingKind::Shelter.def());
        assert_eq!(recovered.wood, 3, "floor(15 * 0.25)");
        assert_eq!(recovered.food, 0);
    }

    #[test]
    fn population_cost_squares_the_tier_bucket() {
        // wheat field costs 10 total -> tier 1
        assert_eq!(population_cost(BuildingKind::WheatField.def()), 1);
        // woodcutter's hut costs 20 total -> tier 2
        assert_eq!(population_cost(BuildingKind::WoodcuttersHut.def()), 4);
        // shelter costs 15 total -> tier 2
        assert_eq!(population_cost(BuildingKind::Shelter.def()), 4);
    }
}
