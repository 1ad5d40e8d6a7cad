use crate::session::{SessionError, SessionHandle};
use spacing_core::Mode;
use zbus::interface;

/// D-Bus control surface for the spacing game.
///
/// Bus name: org.spacing.Game1
/// Object path: /org/spacing/Game1
pub struct SpacingService {
    pub handle: SessionHandle,
}

fn session_failed(err: SessionError) -> zbus::fdo::Error {
    tracing::error!(error = %err, "session unavailable");
    zbus::fdo::Error::Failed(err.to_string())
}

#[interface(name = "org.spacing.Game1")]
impl SpacingService {
    /// Start the countdown for mode 1 (relaxed) or 2 (crowded).
    ///
    /// Returns false when a game is already in progress.
    async fn select_mode(&self, mode: u8) -> zbus::fdo::Result<bool> {
        let Some(mode) = Mode::from_number(mode) else {
            return Err(zbus::fdo::Error::InvalidArgs(format!(
                "unknown mode {mode}; expected 1 or 2"
            )));
        };
        tracing::info!(?mode, "select_mode requested");
        self.handle.select_mode(mode).await.map_err(session_failed)
    }

    /// Pause or resume. Returns whether the game is now paused.
    async fn toggle_pause(&self) -> zbus::fdo::Result<bool> {
        tracing::info!("toggle_pause requested");
        self.handle.toggle_pause().await.map_err(session_failed)
    }

    /// Abandon the current game and return to mode selection.
    async fn restart(&self) -> zbus::fdo::Result<()> {
        tracing::info!("restart requested");
        self.handle.restart().await.map_err(session_failed)
    }

    /// Return the game state as JSON.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let report = self.handle.status().await.map_err(session_failed)?;
        serde_json::to_string(&report).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }
}
