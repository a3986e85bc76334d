//! HTTP/JSON driver. Presentation layers talk to the simulation through
//! this boundary: commands go in as POSTs, state comes back as JSON, and an
//! SSE stream pushes a fresh view after every tick. All game rules live in
//! the core; this module only schedules the periodic callbacks and
//! serializes views.

use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Result;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{error, info, warn};

use crate::{
    catalog::BuildingKind,
    config::GameConfig,
    engine::Engine,
    resources::ResourceSet,
    save::SaveStore,
    state::PLOT_COUNT,
    systems::ActiveEvent,
};

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub game: GameConfig,
    pub save_path: PathBuf,
}

struct AppState {
    engine: Mutex<Engine>,
    store: Mutex<SaveStore>,
    broadcaster: broadcast::Sender<String>,
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

pub async fn run(config: ServerConfig) -> Result<()> {
    let ServerConfig {
        host,
        port,
        game,
        save_path,
    } = config;

    let store = SaveStore::new(save_path, game.autosave_interval_ms);
    let now = now_ms();
    let loaded = store.load();
    if loaded.is_some() {
        info!(path = %store.path().display(), "resuming from save");
    } else {
        info!(path = %store.path().display(), "no usable save, starting fresh");
    }
    let engine = Engine::from_save(loaded, game.clone(), now);

    let (tx, _) = broadcast::channel::<String>(256);
    let state = Arc::new(AppState {
        engine: Mutex::new(engine),
        store: Mutex::new(store),
        broadcaster: tx,
    });

    let ticker_state = state.clone();
    let tick_interval = Duration::from_millis(game.production_tick_ms.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        loop {
            interval.tick().await;
            let now = now_ms();
            let view = {
                let mut engine = ticker_state.engine.lock().expect("engine lock poisoned");
                engine.production_tick(now);
                if engine.food_due(now) {
                    engine.consume_food(now);
                }
                engine.event_tick(now);
                {
                    let mut store = ticker_state.store.lock().expect("store lock poisoned");
                    if let Err(err) = store.maybe_autosave(engine.state(), now) {
                        warn!(%err, "autosave failed");
                    }
                }
                StateView::capture(&engine, now)
            };
            if let Ok(payload) = serde_json::to_string(&view) {
                let _ = ticker_state.broadcaster.send(payload);
            }
        }
    });

    let router = Router::new()
        .route("/api/state", get(current_state))
        .route("/api/command", post(execute_command))
        .route("/api/events", get(stream_events))
        .with_state(state.clone());

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!(%addr, "demesne API listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Final save so nothing earned since the last autosave is lost.
    let now = now_ms();
    let engine = state.engine.lock().expect("engine lock poisoned");
    let mut store = state.store.lock().expect("store lock poisoned");
    if let Err(err) = store.save(&engine.snapshot(now)) {
        error!(%err, "final save failed");
    }
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

/// One renderable frame of the whole game.
#[derive(Debug, Serialize)]
struct StateView {
    resources: ResourceSet,
    starving: bool,
    next_plot_cost: u64,
    plots: Vec<PlotView>,
    active_event: Option<ActiveEvent>,
}

#[derive(Debug, Serialize)]
struct PlotView {
    index: usize,
    unlocked: bool,
    building: Option<&'static str>,
    stage_name: Option<&'static str>,
    evolution: u32,
    speed_level: u32,
    output_level: u32,
    auto_harvest: bool,
    harvest_ready: bool,
    progress: f64,
}

impl StateView {
    fn capture(engine: &Engine, now: u64) -> Self {
        let plots = (0..PLOT_COUNT)
            .map(|index| {
                let plot = engine.plot(index).expect("index within grid");
                PlotView {
                    index,
                    unlocked: plot.unlocked,
                    building: plot.building.map(|kind| kind.id()),
                    stage_name: plot
                        .building
                        .map(|kind| kind.def().stage(plot.evolution).name),
                    evolution: plot.evolution,
                    speed_level: plot.speed_level,
                    output_level: plot.output_level,
                    auto_harvest: plot.auto_harvest,
                    harvest_ready: plot.harvest_ready,
                    progress: engine.progress(index, now),
                }
            })
            .collect();
        Self {
            resources: engine.resources(),
            starving: engine.is_starving(),
            next_plot_cost: engine.next_plot_cost(),
            plots,
            active_event: engine.active_event().cloned(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum CommandRequest {
    Build { plot: usize, building: BuildingKind },
    Harvest { plot: usize },
    UnlockPlot { plot: usize },
    SpeedUpgrade { plot: usize },
    OutputUpgrade { plot: usize },
    AutoHarvest { plot: usize },
    Evolve { plot: usize },
    Demolish { plot: usize },
    AcceptEvent,
    DismissEvent,
}

#[derive(Debug, Serialize)]
struct CommandResponse {
    ok: bool,
    error: Option<String>,
    resources: ResourceSet,
}

async fn current_state(State(state): State<Arc<AppState>>) -> Json<StateView> {
    let engine = state.engine.lock().expect("engine lock poisoned");
    Json(StateView::capture(&engine, now_ms()))
}

async fn execute_command(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CommandRequest>,
) -> Json<CommandResponse> {
    let now = now_ms();
    let mut engine = state.engine.lock().expect("engine lock poisoned");
    let result = match request {
        CommandRequest::Build { plot, building } => engine.build_building(plot, building, now),
        CommandRequest::Harvest { plot } => engine.harvest_building(plot, now),
        CommandRequest::UnlockPlot { plot } => engine.unlock_plot(plot),
        CommandRequest::SpeedUpgrade { plot } => engine.purchase_speed_upgrade(plot),
        CommandRequest::OutputUpgrade { plot } => engine.purchase_output_upgrade(plot),
        CommandRequest::AutoHarvest { plot } => engine.purchase_auto_harvest(plot),
        CommandRequest::Evolve { plot } => engine.purchase_evolution(plot),
        CommandRequest::Demolish { plot } => engine.demolish(plot),
        CommandRequest::AcceptEvent => engine.accept_event(now),
        CommandRequest::DismissEvent => engine.dismiss_event(now),
    };
    let response = match result {
        Ok(outcome) => CommandResponse {
            ok: true,
            error: None,
            resources: outcome.resources,
        },
        Err(err) => CommandResponse {
            ok: false,
            error: Some(err.to_string()),
            resources: engine.resources(),
        },
    };
    Json(response)
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
