use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spacing_core::{DetectionBatch, Game, GameConfig, GameResult, Mode, Phase};
use spacing_sources::{DetectionSource, SimulatedSource, Viewport};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "spacing", about = "Spacing game CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a local game against simulated players
    Play {
        /// 1 = relaxed (1.2 m), 2 = crowded (0.6 m)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
        mode: u8,
        /// Seed for the simulated players
        #[arg(long, default_value_t = 0x5eed)]
        seed: u64,
        /// Frame ticks per second
        #[arg(long, default_value_t = 60)]
        tick_hz: u32,
        /// Game config TOML file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Run on simulated time without sleeping
        #[arg(long)]
        fast: bool,
    },
    /// Select a mode on the running daemon
    Select {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=2))]
        mode: u8,
    },
    /// Pause or resume the running game
    Pause,
    /// Return to mode selection
    Restart,
    /// Show daemon status
    Status,
}

#[zbus::proxy(
    interface = "org.spacing.Game1",
    default_service = "org.spacing.Game1",
    default_path = "/org/spacing/Game1"
)]
trait SpacingGame {
    async fn select_mode(&self, mode: u8) -> zbus::Result<bool>;
    async fn toggle_pause(&self) -> zbus::Result<bool>;
    async fn restart(&self) -> zbus::Result<()>;
    async fn status(&self) -> zbus::Result<String>;
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            mode,
            seed,
            tick_hz,
            config,
            fast,
        } => {
            let mode = Mode::from_number(mode).context("unknown mode")?;
            let config = match config {
                Some(path) => GameConfig::load(&path)?,
                None => GameConfig::default(),
            };
            let result = play_local(config, mode, seed, tick_hz, !fast, |line| {
                println!("{line}")
            })
            .await?;
            println!(
                "Game over: score {} with {} player(s)",
                result.score, result.player_count
            );
        }
        Commands::Select { mode } => {
            let accepted = proxy().await?.select_mode(mode).await?;
            if accepted {
                println!("Mode {mode} selected; countdown started");
            } else {
                println!("A game is already in progress; restart first");
            }
        }
        Commands::Pause => {
            let paused = proxy().await?.toggle_pause().await?;
            println!("{}", if paused { "Paused" } else { "Running" });
        }
        Commands::Restart => {
            proxy().await?.restart().await?;
            println!("Restarted");
        }
        Commands::Status => {
            let raw = proxy().await?.status().await?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

async fn proxy() -> Result<SpacingGameProxy<'static>> {
    let conn = zbus::Connection::session()
        .await
        .context("failed to connect to the session bus")?;
    SpacingGameProxy::new(&conn)
        .await
        .context("spacingd is not reachable")
}

/// Run one game against simulated players, reporting once per displayed second.
///
/// Time advances by one tick period per frame; with `realtime` each frame
/// also sleeps for that period.
async fn play_local(
    config: GameConfig,
    mode: Mode,
    seed: u64,
    tick_hz: u32,
    realtime: bool,
    mut report: impl FnMut(String),
) -> Result<GameResult> {
    let period = Duration::from_secs_f64(1.0 / f64::from(tick_hz.max(1)));
    let mut source = SimulatedSource::for_mode(&config.profile(mode), Viewport::default(), seed);
    let mut game = Game::new(config);

    tracing::debug!(mode = mode.number(), seed, tick_hz, realtime, "local game starting");
    let mut now = Instant::now();
    game.select_mode(mode, now);
    let mut last_shown: Option<(Phase, u64)> = None;

    while game.phase() != Phase::GameOver {
        now += period;
        let points = source.next_points()?.unwrap_or_default();
        game.deliver(DetectionBatch {
            epoch: game.epoch(),
            points,
            captured_at: now,
        });
        game.tick(now);

        let shown = (game.phase(), game.remaining_seconds().ceil() as u64);
        if game.phase().is_timed() && last_shown != Some(shown) {
            report(format!(
                "{:<9} {:>2}s  players: {}",
                shown.0.to_string(),
                shown.1,
                game.player_count()
            ));
            last_shown = Some(shown);
        }

        if realtime {
            tokio::time::sleep(period).await;
        }
    }

    game.last_result()
        .cloned()
        .context("game ended without a result")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_play() {
        let cli = Cli::try_parse_from(["spacing", "play", "--mode", "2", "--fast"]).unwrap();
        match cli.command {
            Commands::Play {
                mode, seed, fast, ..
            } => {
                assert_eq!(mode, 2);
                assert_eq!(seed, 0x5eed);
                assert!(fast);
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["spacing", "select", "3"]).is_err());
    }

    #[tokio::test]
    async fn test_play_local_fast_reaches_game_over() {
        let mut lines = Vec::new();
        let result = play_local(GameConfig::default(), Mode::Crowded, 7, 60, false, |l| {
            lines.push(l)
        })
        .await
        .unwrap();

        assert_eq!(result.mode, Mode::Crowded);
        assert!((1..=2).contains(&result.player_count));
        assert!(lines.first().unwrap().starts_with("countdown"));
        assert!(lines.iter().any(|l| l.starts_with("playing")));
    }
}
