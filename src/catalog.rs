//! Static building definitions: costs, harvest cycles, evolution chains,
//! and the upgrade cost formulas. Pure data and pure functions; nothing in
//! here mutates game state.

use serde::{Deserialize, Serialize};

use crate::resources::ResourceSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildingKind {
    WheatField,
    WoodcuttersHut,
    Shelter,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 3] = [
        BuildingKind::WheatField,
        BuildingKind::WoodcuttersHut,
        BuildingKind::Shelter,
    ];

    /// Stable string id used in the save format and the web API.
    pub fn id(self) -> &'static str {
        match self {
            BuildingKind::WheatField => "wheatField",
            BuildingKind::WoodcuttersHut => "woodcuttersHut",
            BuildingKind::Shelter => "shelter",
        }
    }

    /// Inverse of [`BuildingKind::id`]. Unknown ids (saves written by a
    /// different catalog) resolve to `None` and the caller clears the plot.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn def(self) -> &'static BuildingDef {
        match self {
            BuildingKind::WheatField => &WHEAT_FIELD,
            BuildingKind::WoodcuttersHut => &WOODCUTTERS_HUT,
            BuildingKind::Shelter => &SHELTER,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EvolutionStage {
    pub name: &'static str,
    pub tier: u32,
    /// Cap for both the speed and output upgrade tracks while at this tier.
    pub max_level: u32,
}

#[derive(Debug, Serialize)]
pub struct BuildingDef {
    pub kind: BuildingKind,
    pub name: &'static str,
    pub cost: ResourceSet,
    pub harvest_time_ms: u64,
    pub produces: ResourceSet,
    pub stages: &'static [EvolutionStage],
    pub speed_cost_base: u64,
    pub output_cost_base: u64,
    pub evolution_cost_base: ResourceSet,
}

pub static WHEAT_FIELD: BuildingDef = BuildingDef {
    kind: BuildingKind::WheatField,
    name: "Wheat Field",
    cost: ResourceSet {
        food: 10,
        ..ResourceSet::NONE
    },
    harvest_time_ms: 60_000,
    produces: ResourceSet {
        food: 10,
        ..ResourceSet::NONE
    },
    stages: &[
        EvolutionStage {
            name: "Wheat Field",
            tier: 0,
            max_level: 5,
        },
        EvolutionStage {
            name: "Golden Field",
            tier: 1,
            max_level: 10,
        },
        EvolutionStage {
            name: "Royal Granary Field",
            tier: 2,
            max_level: 15,
        },
        EvolutionStage {
            name: "Blessed Harvestland",
            tier: 3,
            max_level: 20,
        },
    ],
    speed_cost_base: 10,
    output_cost_base: 15,
    evolution_cost_base: ResourceSet {
        food: 50,
        wood: 10,
        ..ResourceSet::NONE
    },
};

pub static WOODCUTTERS_HUT: BuildingDef = BuildingDef {
    kind: BuildingKind::WoodcuttersHut,
    name: "Woodcutter's Hut",
    cost: ResourceSet {
        food: 10,
        wood: 10,
        ..ResourceSet::NONE
    },
    harvest_time_ms: 10_000,
    produces: ResourceSet {
        wood: 1,
        ..ResourceSet::NONE
    },
    stages: &[
        EvolutionStage {
            name: "Woodcutter's Hut",
            tier: 0,
            max_level: 5,
        },
        EvolutionStage {
            name: "Lumber Camp",
            tier: 1,
            max_level: 10,
        },
        EvolutionStage {
            name: "Sawmill",
            tier: 2,
            max_level: 15,
        },
        EvolutionStage {
            name: "Timber Guildhall",
            tier: 3,
            max_level: 20,
        },
    ],
    speed_cost_base: 10,
    output_cost_base: 15,
    evolution_cost_base: ResourceSet {
        wood: 30,
        food: 20,
        ..ResourceSet::NONE
    },
};

pub static SHELTER: BuildingDef = BuildingDef {
    kind: BuildingKind::Shelter,
    name: "Shelter",
    cost: ResourceSet {
        wood: 15,
        ..ResourceSet::NONE
    },
    harvest_time_ms: 240_000,
    produces: ResourceSet {
        population: 1,
        ..ResourceSet::NONE
    },
    stages: &[
        EvolutionStage {
            name: "Shelter",
            tier: 0,
            max_level: 5,
        },
        EvolutionStage {
            name: "Cottage",
            tier: 1,
            max_level: 10,
        },
        EvolutionStage {
            name: "Longhouse",
            tier: 2,
            max_level: 15,
        },
        EvolutionStage {
            name: "Manor",
            tier: 3,
            max_level: 20,
        },
    ],
    speed_cost_base: 12,
    output_cost_base: 18,
    evolution_cost_base: ResourceSet {
        population: 5,
        wood: 20,
        ..ResourceSet::NONE
    },
};

impl BuildingDef {
    /// The stage for `tier`, clamped to the last defined stage.
    pub fn stage(&self, tier: u32) -> &EvolutionStage {
        let index = (tier as usize).min(self.stages.len() - 1);
        &self.stages[index]
    }

    pub fn max_tier(&self) -> u32 {
        self.stages[self.stages.len() - 1].tier
    }

    /// Gold cost of the next speed level at `level` within `tier`.
    pub fn speed_upgrade_cost(&self, level: u32, tier: u32) -> u64 {
        let base = self.speed_cost_base as f64;
        (base * ((level + 1) as f64).powf(1.5) * (1.0 + tier as f64 * 0.5)).floor() as u64
    }

    /// Gold cost of the next output level at `level` within `tier`.
    pub fn output_upgrade_cost(&self, level: u32, tier: u32) -> u64 {
        let base = self.output_cost_base as f64;
        (base * ((level + 1) as f64).powf(1.6) * (1.0 + tier as f64 * 0.6)).floor() as u64
    }

    /// Multi-resource cost of evolving out of `tier`; doubles per tier.
    pub fn evolution_cost(&self, tier: u32) -> ResourceSet {
        let mut cost = ResourceSet::NONE;
        for (kind, amount) in self.evolution_cost_base.entries() {
            cost.set(kind, amount << tier.min(63));
        }
        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for kind in BuildingKind::ALL {
            assert_eq!(BuildingKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(BuildingKind::from_id("castleKeep"), None);
    }

    #[test]
    fn speed_upgrade_cost_scales_with_level_and_tier() {
        let def = BuildingKind::WheatField.def();
        // floor(10 * 1^1.5 * 1.0)
        assert_eq!(def.speed_upgrade_cost(0, 0), 10);
        // floor(10 * 3^1.5 * 1.0) = floor(51.96)
        assert_eq!(def.speed_upgrade_cost(2, 0), 51);
        // floor(10 * 1^1.5 * 2.0)
        assert_eq!(def.speed_upgrade_cost(0, 2), 20);
    }

    #[test]
    fn output_upgrade_cost_uses_its_own_curve() {
        let def = BuildingKind::WheatField.def();
        assert_eq!(def.output_upgrade_cost(0, 0), 15);
        // floor(15 * 2^1.6 * 1.6) = floor(72.75)
        assert_eq!(def.output_upgrade_cost(1, 1), 72);
    }

    #[test]
    fn evolution_cost_doubles_per_tier() {
        let def = BuildingKind::Shelter.def();
        let tier0 = def.evolution_cost(0);
        assert_eq!((tier0.population, tier0.wood), (5, 20));
        let tier2 = def.evolution_cost(2);
        assert_eq!((tier2.population, tier2.wood), (20, 80));
    }

    #[test]
    fn stage_lookup_clamps_past_the_chain() {
        let def = BuildingKind::WheatField.def();
        assert_eq!(def.stage(0).max_level, 5);
        assert_eq!(def.stage(99).name, "Blessed Harvestland");
        assert_eq!(def.max_tier(), 3);
    }
}
