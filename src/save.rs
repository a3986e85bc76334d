//! Versioned snapshot/restore and the offline catch-up replay. The save
//! format uses dedicated serde structs so the runtime types can evolve
//! without breaking old files; a version mismatch or unreadable file simply
//! means "no save data", never a crash.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::BuildingKind;
use crate::config::GameConfig;
use crate::resources::ResourceSet;
use crate::state::{GameState, Plot, PLOT_COUNT};
use crate::systems::{production, starvation, upgrade};

pub const SAVE_VERSION: &str = "1.0";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("save encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub version: String,
    pub saved_at: u64,
    pub resources: ResourceSet,
    pub plots: Vec<PlotSave>,
    pub next_plot_cost: u64,
    pub is_starving: bool,
    pub last_food_consumption: u64,
}

/// One plot as persisted. Only purchased state is stored; the derived
/// multipliers and adjacency bonuses are recomputed on restore. The building
/// is kept as its string id so a save written against a different catalog
/// degrades to a cleared plot instead of a failed load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotSave {
    pub unlocked: bool,
    pub building: Option<String>,
    pub level: u32,
    pub evolution: u32,
    pub speed_level: u32,
    pub output_level: u32,
    pub auto_harvest: bool,
    pub next_harvest: u64,
    pub harvest_ready: bool,
    pub placement_time: Option<u64>,
}

pub fn snapshot(state: &GameState, now: u64) -> SaveData {
    SaveData {
        version: SAVE_VERSION.to_string(),
        saved_at: now,
        resources: state.resources(),
        plots: state
            .plots()
            .iter()
            .map(|plot| PlotSave {
                unlocked: plot.unlocked,
                building: plot.building.map(|kind| kind.id().to_string()),
                level: plot.level,
                evolution: plot.evolution,
                speed_level: plot.speed_level,
                output_level: plot.output_level,
                auto_harvest: plot.auto_harvest,
                next_harvest: plot.next_harvest,
                harvest_ready: plot.harvest_ready,
                placement_time: plot.placement_time,
            })
            .collect(),
        next_plot_cost: state.next_plot_cost(),
        is_starving: state.is_starving(),
        last_food_consumption: state.last_food_consumption(),
    }
}

/// Rebuilds the game state from a save and replays the wall-clock time that
/// passed while the game was closed. Returns `None` on a version mismatch,
/// which callers treat as "start fresh".
pub fn restore(data: SaveData, config: &GameConfig, now: u64) -> Option<GameState> {
    if data.version != SAVE_VERSION {
        warn!(
            found = %data.version,
            expected = SAVE_VERSION,
            "save version mismatch, starting fresh"
        );
        return None;
    }

    let mut state = GameState::new(config, now);
    state.ledger = crate::resources::Ledger::new(data.resources);
    state.next_plot_cost = data.next_plot_cost;
    state.is_starving = data.is_starving;

    for (index, saved) in data.plots.into_iter().take(PLOT_COUNT).enumerate() {
        let building = match saved.building.as_deref() {
            Some(id) => match BuildingKind::from_id(id) {
                Some(kind) => Some(kind),
                None => {
                    warn!(id, index, "unknown building in save, clearing plot");
                    state.plots[index] = Plot::empty(saved.unlocked);
                    continue;
                }
            },
            None => None,
        };
        let plot = &mut state.plots[index];
        plot.unlocked = saved.unlocked;
        plot.building = building;
        if building.is_some() {
            plot.level = saved.level.max(1);
            plot.evolution = saved.evolution;
            plot.speed_level = saved.speed_level;
            plot.output_level = saved.output_level;
            plot.auto_harvest = saved.auto_harvest;
            plot.next_harvest = saved.next_harvest;
            plot.harvest_ready = saved.harvest_ready;
            plot.placement_time = saved.placement_time;
            upgrade::apply_multipliers(plot);
        }
    }
    upgrade::recompute_adjacency(&mut state);

    let offline = now.saturating_sub(data.saved_at);
    replay_offline(&mut state, config, data.saved_at, data.last_food_consumption, offline, now);
    Some(state)
}

/// Deterministic catch-up: production timers shift or complete, automated
/// buildings bank every whole cycle, and food upkeep replays numerically.
fn replay_offline(
    state: &mut GameState,
    config: &GameConfig,
    saved_at: u64,
    last_food_consumption: u64,
    offline: u64,
    now: u64,
) {
    for index in 0..PLOT_COUNT {
        let plot = &state.plots[index];
        if !plot.has_building() || !plot.unlocked {
            continue;
        }
        if plot.auto_harvest {
            // Starvation is excluded from the offline cycle length; only the
            // upgrade and efficiency stack applies.
            let cycle = production::effective_harvest_time(plot, false, now);
            if cycle == 0 {
                continue;
            }
            let harvests = offline / cycle;
            if harvests > 0 {
                let kind = plot.building.expect("occupied plot");
                let multiplier = plot.harvest_multiplier;
                let banked = kind
                    .def()
                    .produces
                    .scaled_floor(multiplier * harvests as f64);
                state.ledger.add(&banked);
                debug!(index, harvests, "banked offline auto-harvests");
                let remainder = offline % cycle;
                let plot = &mut state.plots[index];
                plot.next_harvest = now + (cycle - remainder);
                plot.harvest_ready = false;
            } else {
                shift_pending(&mut state.plots[index], saved_at, offline, now);
            }
        } else if !plot.harvest_ready {
            let plot = &mut state.plots[index];
            let remaining = plot.next_harvest.saturating_sub(saved_at);
            if offline >= remaining {
                plot.harvest_ready = true;
            } else {
                shift_pending(plot, saved_at, offline, now);
            }
        }
    }

    // Upkeep cycles are counted from the last consumption, so the partial
    // cycle in progress at save time carries over exactly.
    let interval = config.food_interval_ms;
    if interval > 0 {
        let since_meal = saved_at.saturating_sub(last_food_consumption) + offline;
        let cycles = since_meal / interval;
        for _ in 0..cycles {
            starvation::replay_cycle(state);
        }
        state.last_food_consumption = now - (since_meal % interval);
    } else {
        state.last_food_consumption = last_food_consumption;
    }
}

/// Carries a not-yet-elapsed deadline across the offline gap unchanged in
/// remaining duration.
fn shift_pending(plot: &mut Plot, saved_at: u64, offline: u64, now: u64) {
    let remaining = plot.next_harvest.saturating_sub(saved_at);
    plot.next_harvest = now + remaining.saturating_sub(offline);
}

/// File-backed store with an autosave interval, mirroring the periodic
/// snapshot writer pattern: the host calls [`SaveStore::maybe_autosave`]
/// every tick and the store decides whether the moment has come.
#[derive(Debug)]
pub struct SaveStore {
    path: PathBuf,
    autosave_interval_ms: u64,
    last_autosave: u64,
}

impl SaveStore {
    pub fn new(path: impl Into<PathBuf>, autosave_interval_ms: u64) -> Self {
        Self {
            path: path.into(),
            autosave_interval_ms,
            last_autosave: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the save file. Any failure — missing file, unreadable bytes,
    /// corrupt JSON — degrades to `None` so the game starts fresh.
    pub fn load(&self) -> Option<SaveData> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), %err, "save file unreadable, starting fresh");
                }
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(data) => Some(data),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "save file corrupt, starting fresh");
                None
            }
        }
    }

    pub fn save(&mut self, data: &SaveData) -> Result<(), SaveError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, json)?;
        self.last_autosave = data.saved_at;
        Ok(())
    }

    /// Writes a snapshot when the autosave interval has elapsed. Returns
    /// whether a write happened.
    pub fn maybe_autosave(&mut self, state: &GameState, now: u64) -> Result<bool, SaveError> {
        if self.autosave_interval_ms == 0
            || now.saturating_sub(self.last_autosave) < self.autosave_interval_ms
        {
            return Ok(false);
        }
        self.save(&snapshot(state, now))?;
        Ok(true)
    }
}
