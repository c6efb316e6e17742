//! The wired-up gateway: configuration, sockets, relay engine and local input
//! behind one value.
//!
//! The binary wraps a [`Gateway`] in `Arc<tokio::sync::Mutex<_>>`.  The cycle
//! task locks it once per tick to run [`Gateway::tick`]; the console locks it
//! for each command.  Table mutations never need the lock: network cursors
//! travel through the operation queue, the local pointer through its latest
//! state slot, and both are applied inside `tick`.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;
use tuio_core::{RelaySettings, RelayState, SessionTable};

use super::mode_controller::ModeController;
use super::storage::config::{config_file_path, save_config_to, ConfigError, GatewayConfig};
use crate::application::local_input::{local_pointer, LocalInputAdapter};
use crate::application::operation_queue::{operation_queue, QueueSender};
use crate::application::relay_cycle::{CycleReport, RelayEngine, SendOutcome};

/// Shared gateway state.
#[derive(Debug)]
pub struct Gateway {
    config: GatewayConfig,
    /// Explicit `--config` path; `None` means the platform location.
    config_path: Option<PathBuf>,
    /// Snapshot of `config`, refreshed by [`Gateway::update_config`].
    settings: RelaySettings,
    controller: ModeController,
    engine: RelayEngine,
    queue: QueueSender,
    input: LocalInputAdapter,
}

impl Gateway {
    /// Builds an idle gateway.  Nothing is bound until [`Gateway::connect`].
    pub fn new(config: GatewayConfig, config_path: Option<PathBuf>) -> Self {
        let (queue, operations) = operation_queue();
        let (input, pointer) = local_pointer();
        let settings = config.snapshot();
        Self {
            config,
            config_path,
            settings,
            controller: ModeController::new(),
            engine: RelayEngine::new(operations, pointer),
            queue,
            input,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The settings the next cycle and the next connect will use.
    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    pub fn state(&self) -> RelayState {
        self.controller.state()
    }

    pub fn frame_interval(&self) -> Duration {
        self.settings.frame_interval
    }

    /// Table contents as of the last cycle.
    pub fn table(&self) -> &SessionTable {
        self.engine.table()
    }

    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    /// Local pointer adapter.  Operations take effect on the next tick.
    pub fn input(&mut self) -> &mut LocalInputAdapter {
        &mut self.input
    }

    /// Edits the configuration and refreshes the settings snapshot.
    ///
    /// Partition and mirror limits apply from the next cycle; socket-related
    /// changes (mode, ports, remote host) apply at the next [`Gateway::connect`].
    pub fn update_config(&mut self, edit: impl FnOnce(&mut GatewayConfig)) {
        edit(&mut self.config);
        self.settings = self.config.snapshot();
    }

    /// Runs the mode controller with the current settings.
    ///
    /// Cursors reported by the previous listener are removed from the table
    /// before this returns.  Must be called from within a Tokio runtime.
    pub fn connect(&mut self) -> RelayState {
        let state = self.controller.connect(&self.settings, &self.queue);
        self.engine.retire(self.controller.take_released());
        state
    }

    /// Runs one output cycle.
    pub async fn tick(&mut self) -> CycleReport {
        let state = self.controller.state();
        let outputs = self.controller.outputs();
        self.engine.run_cycle(state, &self.settings, outputs).await
    }

    /// The connect status plus, while sending, the last send outcome.
    pub fn status_line(&self) -> String {
        let status = self.controller.status();
        match self.engine.last_send() {
            SendOutcome::NotAttempted => status.to_string(),
            _ if !self.state().is_sending() => status.to_string(),
            outcome => format!("{status} | {outcome}"),
        }
    }

    /// Writes the configuration back to disk and returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the path cannot be determined or written.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = match &self.config_path {
            Some(path) => path.clone(),
            None => config_file_path()?,
        };
        save_config_to(&self.config, &path)?;
        info!("configuration saved to {}", path.display());
        Ok(path)
    }

    /// Releases every socket.
    pub fn shutdown(&mut self) {
        self.controller.release();
        self.engine.retire(self.controller.take_released());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::status::IDLE_STATUS;
    use tuio_core::{
        encode_cursor_bundle, CursorSession, DisplayPartition, Mode, Vec2, LOCAL_POINTER_SESSION,
    };

    fn loopback_config(mode: Mode) -> GatewayConfig {
        let mut cfg = GatewayConfig::default();
        cfg.gateway.mode = mode.index();
        cfg.network.local_tuio_port = 0;
        cfg
    }

    #[test]
    fn test_new_gateway_is_idle() {
        let gateway = Gateway::new(GatewayConfig::default(), None);
        assert_eq!(gateway.state(), RelayState::Idle);
        assert_eq!(gateway.status_line(), IDLE_STATUS);
    }

    #[test]
    fn test_update_config_refreshes_snapshot() {
        // Arrange
        let mut gateway = Gateway::new(GatewayConfig::default(), None);

        // Act
        gateway.update_config(|cfg| {
            cfg.display.n_displays = 4;
            cfg.display.remote_display_id = 9;
        });

        // Assert
        assert_eq!(gateway.settings().partition, DisplayPartition::new(4, 4));
        assert_eq!(gateway.config().display.remote_display_id, 9, "stored as written");
    }

    #[tokio::test]
    async fn test_local_pointer_reaches_table_on_next_tick() {
        // Arrange
        let mut gateway = Gateway::new(loopback_config(Mode::Sender), None);
        gateway.connect();

        // Act
        gateway.input().pointer_down(0.5, 0.5, 1.0, 1.0);
        assert!(!gateway.table().contains(LOCAL_POINTER_SESSION));
        gateway.tick().await;

        // Assert
        assert!(gateway.table().contains(LOCAL_POINTER_SESSION));
        gateway.shutdown();
    }

    #[tokio::test]
    async fn test_random_cursor_does_not_survive_switch_to_sender() {
        // Arrange
        let mut gateway = Gateway::new(loopback_config(Mode::RandomSender), None);
        assert_eq!(gateway.connect(), RelayState::RandomSending);
        gateway.tick().await;
        assert!(gateway.table().contains(LOCAL_POINTER_SESSION));

        // Act
        gateway.update_config(|cfg| cfg.gateway.mode = Mode::Sender.index());
        assert_eq!(gateway.connect(), RelayState::Sending);
        gateway.tick().await;

        // Assert
        assert!(!gateway.table().contains(LOCAL_POINTER_SESSION));
        gateway.shutdown();
    }

    #[tokio::test]
    async fn test_reconnect_removes_cursors_of_closed_listener() {
        // Arrange
        let mut gateway = Gateway::new(loopback_config(Mode::Receiver), None);
        gateway.connect();
        let port = gateway.controller().inbound_addr().expect("listener bound").port();
        let upstream = std::net::UdpSocket::bind("127.0.0.1:0").expect("upstream bind");
        let bytes = encode_cursor_bundle(&[CursorSession::at(9, Vec2::new(0.5, 0.5))], 1)
            .expect("encode");
        upstream
            .send_to(&bytes, std::net::SocketAddr::from(([127, 0, 0, 1], port)))
            .expect("send");
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !gateway.table().contains(9) && std::time::Instant::now() < deadline {
            gateway.tick().await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(gateway.table().contains(9));

        // Act
        gateway.update_config(|cfg| cfg.gateway.mode = Mode::Sender.index());
        gateway.connect();

        // Assert – gone before the next tick
        assert!(!gateway.table().contains(9));
        gateway.shutdown();
    }

    #[tokio::test]
    async fn test_status_line_includes_last_send_while_sending() {
        // Arrange
        let mut gateway = Gateway::new(loopback_config(Mode::Sender), None);
        gateway.connect();

        // Act
        gateway.tick().await;

        // Assert
        let line = gateway.status_line();
        assert!(line.starts_with("TuioGateway - Sender Mode"), "{line}");
        assert!(line.ends_with("last frame #1 (0 cursors)"), "{line}");
        gateway.shutdown();
    }

    #[test]
    fn test_save_writes_to_explicit_path() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("tuio_gateway_save_{}", std::process::id()));
        let path = dir.join("config.toml");
        let mut gateway = Gateway::new(GatewayConfig::default(), Some(path.clone()));
        gateway.update_config(|cfg| cfg.network.remote_tuio_port = 4000);

        // Act
        let written = gateway.save().expect("save");

        // Assert
        assert_eq!(written, path);
        let text = std::fs::read_to_string(&path).expect("read back");
        assert!(text.contains("remote_tuio_port = 4000"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
