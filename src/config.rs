use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::resources::ResourceSet;

fn default_seed() -> u64 {
    7
}

fn default_production_tick_ms() -> u64 {
    1_000
}

fn default_food_interval_ms() -> u64 {
    60_000
}

fn default_autosave_interval_ms() -> u64 {
    30_000
}

fn default_starting_unlocked_plots() -> usize {
    2
}

fn default_starting_resources() -> ResourceSet {
    ResourceSet {
        food: 50,
        population: 2,
        ..ResourceSet::NONE
    }
}

fn default_first_plot_cost() -> u64 {
    100
}

fn default_event_min_interval_ms() -> u64 {
    20_000
}

fn default_event_max_interval_ms() -> u64 {
    60_000
}

fn default_event_duration_ms() -> u64 {
    180_000
}

/// Every tunable constant of the simulation. Hosts load one from YAML or use
/// the defaults; the engine treats it as read-only.
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_production_tick_ms")]
    pub production_tick_ms: u64,
    #[serde(default = "default_food_interval_ms")]
    pub food_interval_ms: u64,
    #[serde(default = "default_autosave_interval_ms")]
    pub autosave_interval_ms: u64,
    #[serde(default = "default_starting_unlocked_plots")]
    pub starting_unlocked_plots: usize,
    #[serde(default = "default_starting_resources")]
    pub starting_resources: ResourceSet,
    #[serde(default = "default_first_plot_cost")]
    pub first_plot_cost: u64,
    #[serde(default = "default_event_min_interval_ms")]
    pub event_min_interval_ms: u64,
    #[serde(default = "default_event_max_interval_ms")]
    pub event_max_interval_ms: u64,
    #[serde(default = "default_event_duration_ms")]
    pub event_duration_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            production_tick_ms: default_production_tick_ms(),
            food_interval_ms: default_food_interval_ms(),
            autosave_interval_ms: default_autosave_interval_ms(),
            starting_unlocked_plots: default_starting_unlocked_plots(),
            starting_resources: default_starting_resources(),
            first_plot_cost: default_first_plot_cost(),
            event_min_interval_ms: default_event_min_interval_ms(),
            event_max_interval_ms: default_event_max_interval_ms(),
            event_duration_ms: default_event_duration_ms(),
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: GameConfig = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }
}
