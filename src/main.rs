use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use demesne::{
    catalog::BuildingKind,
    config::GameConfig,
    state::PLOT_COUNT,
    web::{self, ServerConfig},
    Engine,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Demesne kingdom-builder simulation")]
struct Cli {
    /// Path to a YAML config overriding the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save file location
    #[arg(long, default_value = "demesne_save.json")]
    save: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fast-forward a self-playing session and print the outcome
    Run {
        /// Simulated session length in seconds
        #[arg(long, default_value_t = 600)]
        seconds: u64,
    },
    /// Serve the HTTP/JSON API and drive the simulation in real time
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8711)]
        port: u16,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    match cli.command {
        Command::Run { seconds } => run_session(config, seconds),
        Command::Serve { host, port } => serve(config, cli.save, host, port),
    }
}

/// Drives the engine against a simulated clock: harvests whatever is ready
/// and builds greedily on empty unlocked plots. Exercises the whole command
/// surface without a UI and finishes instantly regardless of `seconds`.
fn run_session(config: GameConfig, seconds: u64) -> Result<()> {
    let start = Utc::now().timestamp_millis().max(0) as u64;
    let tick_ms = config.production_tick_ms.max(1);
    let mut engine = Engine::new(config, start);

    let build_order = [
        BuildingKind::WheatField,
        BuildingKind::WoodcuttersHut,
        BuildingKind::Shelter,
    ];

    let mut now = start;
    let end = start + seconds * 1_000;
    while now < end {
        now += tick_ms;
        let report = engine.production_tick(now);
        for index in report.newly_ready {
            let _ = engine.harvest_building(index, now);
        }
        if engine.food_due(now) {
            let food = engine.consume_food(now);
            if food.starving {
                info!(required = food.required, "the kingdom is starving");
            }
        }
        engine.event_tick(now);
        if engine.active_event().is_some() {
            let _ = engine.accept_event(now);
        }

        for index in 0..PLOT_COUNT {
            let placeable = engine
                .plot(index)
                .map(|plot| plot.unlocked && !plot.has_building())
                .unwrap_or(false);
            if !placeable {
                continue;
            }
            for kind in build_order {
                if engine.build_building(index, kind, now).is_ok() {
                    info!(plot = index, building = kind.id(), "built");
                    break;
                }
            }
        }
    }

    let resources = engine.resources();
    println!(
        "After {seconds}s: food {}, wood {}, stone {}, gold {}, population {}{}",
        resources.food,
        resources.wood,
        resources.stone,
        resources.gold,
        resources.population,
        if engine.is_starving() { " (starving)" } else { "" },
    );
    for (index, plot) in engine.state().plots().iter().enumerate() {
        if let Some(kind) = plot.building {
            println!(
                "  plot {index}: {} (evolution {}, speed {}, output {})",
                kind.def().stage(plot.evolution).name,
                plot.evolution,
                plot.speed_level,
                plot.output_level,
            );
        }
    }
    Ok(())
}

fn serve(config: GameConfig, save: PathBuf, host: String, port: u16) -> Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(web::run(ServerConfig {
            host,
            port,
            game: config,
            save_path: save,
        }))
}
