//! The state-owning engine. Hosts construct one, feed it commands and the
//! three periodic callbacks (production tick, food upkeep, event tick), and
//! re-render from its queries. All mutation funnels through here; every
//! command is atomic and every rejection leaves the state untouched.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::BuildingKind;
use crate::config::GameConfig;
use crate::resources::{Resource, ResourceSet};
use crate::save::{self, SaveData};
use crate::state::{GameState, Plot};
use crate::systems::events::EventScheduler;
use crate::systems::{
    demolition, production, starvation, upgrade, ActiveEvent, DemolitionReport, FoodReport,
    TickReport,
};

/// Expected domain rejections. These are return values, not failures: a
/// rejected command is a silent no-op on the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("plot index {index} is outside the grid")]
    PlotOutOfBounds { index: usize },
    #[error("plot is locked")]
    PlotLocked,
    #[error("plot is already unlocked")]
    AlreadyUnlocked,
    #[error("plot already holds a building")]
    PlotOccupied,
    #[error("plot holds no building")]
    PlotEmpty,
    #[error("harvest is not ready")]
    NotReady,
    #[error("automated buildings are collected by the tick loop")]
    Automated,
    #[error("insufficient resources")]
    CannotAfford,
    #[error("upgrade track is at this stage's cap")]
    UpgradeCapped,
    #[error("both upgrade tracks must be maxed before evolving")]
    EvolutionBlocked,
    #[error("building is at its final evolution stage")]
    EvolutionMaxed,
    #[error("auto-harvest is already purchased")]
    AlreadyAutomated,
    #[error("no event is currently active")]
    NoActiveEvent,
}

/// Enough to re-render after a successful command: the new resource totals
/// and, where one plot was touched, its new state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutcome {
    pub resources: ResourceSet,
    pub plot: Option<Plot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildingListing {
    pub kind: BuildingKind,
    pub name: &'static str,
    pub cost: ResourceSet,
    pub affordable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpgradeQuote {
    pub cost: u64,
    pub currency: Resource,
    pub affordable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvolutionQuote {
    pub next_stage: &'static str,
    pub cost: ResourceSet,
    pub tracks_maxed: bool,
    pub affordable: bool,
}

/// Everything purchasable on one occupied plot right now.
#[derive(Debug, Clone, Serialize)]
pub struct UpgradeListing {
    pub stage_name: &'static str,
    pub speed: Option<UpgradeQuote>,
    pub output: Option<UpgradeQuote>,
    pub auto_harvest: Option<UpgradeQuote>,
    pub evolution: Option<EvolutionQuote>,
}

pub struct Engine {
    state: GameState,
    config: GameConfig,
    rng: ChaCha8Rng,
    events: EventScheduler,
}

impl Engine {
    pub fn new(config: GameConfig, now: u64) -> Self {
        let state = GameState::new(&config, now);
        Self::with_state(state, config, now)
    }

    pub fn with_state(state: GameState, config: GameConfig, now: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let events = EventScheduler::new(&config, &mut rng, now);
        Self {
            state,
            config,
            rng,
            events,
        }
    }

    /// Restores from a save when one is present and compatible, otherwise
    /// starts fresh. Offline time is replayed inside the restore.
    pub fn from_save(data: Option<SaveData>, config: GameConfig, now: u64) -> Self {
        match data.and_then(|data| save::restore(data, &config, now)) {
            Some(state) => Self::with_state(state, config, now),
            None => Self::new(config, now),
        }
    }

    // ---- commands -------------------------------------------------------

    pub fn build_building(
        &mut self,
        plot: usize,
        kind: BuildingKind,
        now: u64,
    ) -> Result<CommandOutcome, CommandError> {
        production::place_building(&mut self.state, plot, kind, now)?;
        Ok(self.outcome(Some(plot)))
    }

    pub fn harvest_building(
        &mut self,
        plot: usize,
        now: u64,
    ) -> Result<CommandOutcome, CommandError> {
        production::harvest(&mut self.state, plot, now)?;
        Ok(self.outcome(Some(plot)))
    }

    pub fn unlock_plot(&mut self, plot: usize) -> Result<CommandOutcome, CommandError> {
        upgrade::unlock_plot(&mut self.state, plot)?;
        Ok(self.outcome(Some(plot)))
    }

    pub fn purchase_speed_upgrade(&mut self, plot: usize) -> Result<CommandOutcome, CommandError> {
        upgrade::purchase_speed(&mut self.state, plot)?;
        Ok(self.outcome(Some(plot)))
    }

    pub fn purchase_output_upgrade(
        &mut self,
        plot: usize,
    ) -> Result<CommandOutcome, CommandError> {
        upgrade::purchase_output(&mut self.state, plot)?;
        Ok(self.outcome(Some(plot)))
    }

    pub fn purchase_auto_harvest(&mut self, plot: usize) -> Result<CommandOutcome, CommandError> {
        upgrade::purchase_auto_harvest(&mut self.state, plot)?;
        Ok(self.outcome(Some(plot)))
    }

    pub fn purchase_evolution(&mut self, plot: usize) -> Result<CommandOutcome, CommandError> {
        upgrade::purchase_evolution(&mut self.state, plot)?;
        Ok(self.outcome(Some(plot)))
    }

    pub fn demolish(&mut self, plot: usize) -> Result<CommandOutcome, CommandError> {
        demolition::demolish(&mut self.state, plot)?;
        Ok(self.outcome(Some(plot)))
    }

    pub fn accept_event(&mut self, now: u64) -> Result<CommandOutcome, CommandError> {
        self.events
            .accept(&mut self.state, &self.config, &mut self.rng, now)?;
        Ok(self.outcome(None))
    }

    pub fn dismiss_event(&mut self, now: u64) -> Result<CommandOutcome, CommandError> {
        self.events.dismiss(&self.config, &mut self.rng, now)?;
        Ok(self.outcome(None))
    }

    // ---- periodic callbacks ---------------------------------------------

    pub fn production_tick(&mut self, now: u64) -> TickReport {
        production::tick(&mut self.state, now)
    }

    pub fn consume_food(&mut self, now: u64) -> FoodReport {
        starvation::consume_food(&mut self.state, now)
    }

    pub fn event_tick(&mut self, now: u64) {
        self.events
            .tick(&self.state, &self.config, &mut self.rng, now);
    }

    /// Whether the food upkeep interval has elapsed since the last cycle.
    pub fn food_due(&self, now: u64) -> bool {
        now.saturating_sub(self.state.last_food_consumption) >= self.config.food_interval_ms
    }

    // ---- queries --------------------------------------------------------

    pub fn plot(&self, index: usize) -> Option<&Plot> {
        self.state.plot(index)
    }

    pub fn resources(&self) -> ResourceSet {
        self.state.resources()
    }

    pub fn progress(&self, index: usize, now: u64) -> f64 {
        production::progress(&self.state, index, now)
    }

    pub fn is_starving(&self) -> bool {
        self.state.is_starving()
    }

    pub fn next_plot_cost(&self) -> u64 {
        self.state.next_plot_cost()
    }

    pub fn active_event(&self) -> Option<&ActiveEvent> {
        self.events.active()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The catalog entries placeable on an unlocked, empty plot; empty for
    /// any other plot.
    pub fn available_buildings(&self, index: usize) -> Vec<BuildingListing> {
        let placeable = self
            .state
            .plot(index)
            .map(|plot| plot.unlocked && !plot.has_building())
            .unwrap_or(false);
        if !placeable {
            return Vec::new();
        }
        BuildingKind::ALL
            .into_iter()
            .map(|kind| {
                let def = kind.def();
                BuildingListing {
                    kind,
                    name: def.name,
                    cost: def.cost,
                    affordable: self.state.ledger.can_afford(&def.cost),
                }
            })
            .collect()
    }

    /// What demolishing the plot's building would refund and cost, for the
    /// host's confirmation dialog. `None` when the plot is empty.
    pub fn demolition_quote(&self, index: usize) -> Option<DemolitionReport> {
        let def = self.state.plot(index)?.building?.def();
        Some(DemolitionReport {
            recovered: demolition::recovery(def),
            population_cost: demolition::population_cost(def),
        })
    }

    /// The purchase menu for an occupied plot, or `None` when the plot is
    /// empty or out of bounds.
    pub fn available_upgrades(&self, index: usize) -> Option<UpgradeListing> {
        let plot = self.state.plot(index)?;
        let def = plot.building?.def();
        let stage = def.stage(plot.evolution);

        let speed = (plot.speed_level < stage.max_level).then(|| {
            let cost = def.speed_upgrade_cost(plot.speed_level, plot.evolution);
            UpgradeQuote {
                cost,
                currency: Resource::Gold,
                affordable: self.state.ledger.amount(Resource::Gold) >= cost,
            }
        });
        let output = (plot.output_level < stage.max_level).then(|| {
            let cost = def.output_upgrade_cost(plot.output_level, plot.evolution);
            UpgradeQuote {
                cost,
                currency: Resource::Gold,
                affordable: self.state.ledger.amount(Resource::Gold) >= cost,
            }
        });
        let auto_harvest = (!plot.auto_harvest).then(|| UpgradeQuote {
            cost: upgrade::AUTO_HARVEST_POPULATION_COST,
            currency: Resource::Population,
            affordable: self.state.ledger.amount(Resource::Population)
                >= upgrade::AUTO_HARVEST_POPULATION_COST,
        });
        let evolution = (plot.evolution < def.max_tier()).then(|| {
            let cost = def.evolution_cost(plot.evolution);
            EvolutionQuote {
                next_stage: def.stage(plot.evolution + 1).name,
                cost,
                tracks_maxed: plot.speed_level >= stage.max_level
                    && plot.output_level >= stage.max_level,
                affordable: self.state.ledger.can_afford(&cost),
            }
        });

        Some(UpgradeListing {
            stage_name: stage.name,
            speed,
            output,
            auto_harvest,
            evolution,
        })
    }

    pub fn snapshot(&self, now: u64) -> SaveData {
        save::snapshot(&self.state, now)
    }

    fn outcome(&self, plot: Option<usize>) -> CommandOutcome {
        CommandOutcome {
            resources: self.state.resources(),
            plot: plot.and_then(|index| self.state.plot(index).cloned()),
        }
    }
}
