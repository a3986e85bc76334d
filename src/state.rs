use serde::Serialize;

use crate::catalog::BuildingKind;
use crate::config::GameConfig;
use crate::resources::{Ledger, ResourceSet};

pub const GRID_SIZE: usize = 3;
pub const PLOT_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// One cell of the 3x3 grid. Timestamps are epoch milliseconds supplied by
/// the host; the core never reads a clock of its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plot {
    pub unlocked: bool,
    pub building: Option<BuildingKind>,
    pub level: u32,
    pub evolution: u32,
    pub speed_level: u32,
    pub output_level: u32,
    pub production_speed: f64,
    pub harvest_multiplier: f64,
    pub auto_harvest: bool,
    pub next_harvest: u64,
    pub harvest_ready: bool,
    pub placement_time: Option<u64>,
    pub adjacency_bonus: f64,
}

impl Plot {
    pub fn empty(unlocked: bool) -> Self {
        Self {
            unlocked,
            building: None,
            level: 1,
            evolution: 0,
            speed_level: 0,
            output_level: 0,
            production_speed: 1.0,
            harvest_multiplier: 1.0,
            auto_harvest: false,
            next_harvest: 0,
            harvest_ready: false,
            placement_time: None,
            adjacency_bonus: 0.0,
        }
    }

    pub fn has_building(&self) -> bool {
        self.building.is_some()
    }

    /// Occupied, counting down toward the next harvest.
    pub fn is_producing(&self) -> bool {
        self.has_building() && !self.harvest_ready
    }
}

/// The full mutable simulation state: the ledger, the grid, and the
/// starvation/plot-cost bookkeeping. Owned by the engine and passed
/// explicitly into every system; there are no ambient globals.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub(crate) ledger: Ledger,
    pub(crate) plots: [Plot; PLOT_COUNT],
    pub(crate) next_plot_cost: u64,
    pub(crate) is_starving: bool,
    pub(crate) last_food_consumption: u64,
}

impl GameState {
    pub fn new(config: &GameConfig, now: u64) -> Self {
        let plots =
            std::array::from_fn(|index| Plot::empty(index < config.starting_unlocked_plots));
        Self {
            ledger: Ledger::new(config.starting_resources),
            plots,
            next_plot_cost: config.first_plot_cost,
            is_starving: false,
            last_food_consumption: now,
        }
    }

    pub fn resources(&self) -> ResourceSet {
        self.ledger.totals()
    }

    pub fn plots(&self) -> &[Plot; PLOT_COUNT] {
        &self.plots
    }

    pub fn plot(&self, index: usize) -> Option<&Plot> {
        self.plots.get(index)
    }

    pub fn is_starving(&self) -> bool {
        self.is_starving
    }

    pub fn next_plot_cost(&self) -> u64 {
        self.next_plot_cost
    }

    pub fn last_food_consumption(&self) -> u64 {
        self.last_food_consumption
    }

    /// Resets a plot to its empty state after demolition, keeping only the
    /// unlocked flag.
    pub(crate) fn clear_plot(&mut self, index: usize) {
        let unlocked = self.plots[index].unlocked;
        self.plots[index] = Plot::empty(unlocked);
    }
}

/// Indices of the up-to-8 neighbors of `index` in the 3x3 grid, bounds
/// checked with no wraparound.
pub fn adjacent_indices(index: usize) -> Vec<usize> {
    let row = (index / GRID_SIZE) as isize;
    let col = (index % GRID_SIZE) as isize;
    let mut adjacent = Vec::with_capacity(8);
    for dr in -1..=1_isize {
        for dc in -1..=1_isize {
            if dr == 0 && dc == 0 {
                continue;
            }
            let (r, c) = (row + dr, col + dc);
            if (0..GRID_SIZE as isize).contains(&r) && (0..GRID_SIZE as isize).contains(&c) {
                adjacent.push((r * GRID_SIZE as isize + c) as usize);
            }
        }
    }
    adjacent
}
