use anyhow::{Context, Result};
use spacing_core::Game;
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod session;
mod source_runner;

const BUS_NAME: &str = "org.spacing.Game1";
const OBJECT_PATH: &str = "/org/spacing/Game1";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("spacingd starting");

    let config = config::Config::from_env().context("failed to load configuration")?;
    tracing::info!(
        tick_hz = config.tick_hz,
        source_fps = config.source_fps,
        source = ?config.source,
        pixels_per_meter = config.game.pixels_per_meter,
        camera_scale = config.viewport.camera_scale,
        "configuration loaded"
    );

    let runner = source_runner::SourceRunner::from_config(&config)
        .context("failed to open detection source")?;
    let session = session::Session::new(Game::new(config.game.clone()), runner.name());
    let channels = session::spawn_session(session, config.tick_hz);

    source_runner::spawn_source_thread(
        runner,
        config.source_fps,
        channels.batches,
        channels.context,
    )
    .context("failed to spawn source thread")?;

    let service = dbus_interface::SpacingService {
        handle: channels.handle,
    };
    let _conn = zbus::connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, service)?
        .build()
        .await
        .context("failed to register on the session bus")?;

    tracing::info!(bus = BUS_NAME, path = OBJECT_PATH, "spacingd ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("spacingd shutting down");

    Ok(())
}
