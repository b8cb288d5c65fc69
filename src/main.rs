use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use arcade_drive::config::AppConfig;
use arcade_drive::net::start_websocket_server;
use arcade_drive::physics::PhysicsWorld;
use arcade_drive::sim::run_tick;
use arcade_drive::state::SharedGameState;

#[derive(Parser, Debug)]
#[command(name = "arcade-drive", about = "Arcade vehicle physics server")]
struct Opts {
    /// JSON tuning file; built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides server.bind_addr.
    #[arg(long)]
    bind: Option<String>,

    /// Overrides server.tick_hz.
    #[arg(long)]
    tick_hz: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arcade_drive=info")))
        .init();

    let opts = Opts::parse();

    let mut config = AppConfig::load(opts.config.as_deref()).context("loading config")?;
    if let Some(bind) = opts.bind {
        config.server.bind_addr = bind;
    }
    if let Some(hz) = opts.tick_hz {
        config.server.tick_hz = hz;
    }
    config.validate().context("validating config")?;

    tracing::info!(bind = %config.server.bind_addr, tick_hz = config.server.tick_hz, "starting physics server");

    let mut world = PhysicsWorld::new();
    world.spawn_ball_from(&config.server);

    let tick_interval = config.server.tick_interval();
    let dt = tick_interval.as_secs_f32();
    let bind_addr = config.server.bind_addr.clone();

    let state = Arc::new(Mutex::new(SharedGameState::new(config)));
    let physics = Arc::new(Mutex::new(world));

    // Start WebSocket server
    let server = tokio::spawn(start_websocket_server(bind_addr, Arc::clone(&state)));

    // Fixed timestep
    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let start = Instant::now();

    loop {
        ticker.tick().await;

        if server.is_finished() {
            return match server.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(err).context("websocket server stopped"),
                Err(err) => Err(err).context("websocket task panicked"),
            };
        }

        // physics first, then game: same order everywhere that takes both
        let mut phys = physics.lock().await;
        let mut game = state.lock().await;

        if let Err(err) = run_tick(&mut game, &mut phys, start.elapsed(), dt) {
            tracing::error!(%err, tick = game.tick, "simulation invariant broken");
            return Err(err).context("simulation stopped");
        }
    }
}
