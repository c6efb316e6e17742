//! TUIO gateway entry point.
//!
//! Receives TUIO 1.x cursor bundles, keeps the live cursor table, and re-emits
//! the cursors that fall on the target display tile to a downstream receiver.
//!
//! # Usage
//!
//! ```text
//! tuio-gateway [OPTIONS]
//!
//! Options:
//!   --config       <PATH>  Config file [default: platform location]
//!   --mode         <MODE>  receiver | sender | router | random
//!   --local-port   <PORT>  Inbound TUIO port
//!   --remote-ip    <HOST>  Downstream receiver host
//!   --remote-port  <PORT>  Downstream receiver port
//!   --displays     <N>     Number of display tiles
//!   --display-id   <N>     One-based target tile
//!   --fps          <HZ>    Output cycles per second
//!   --log-level    <LVL>   Log filter when RUST_LOG is unset
//! ```
//!
//! Every option can also be set with a `TUIO_GATEWAY_*` environment variable
//! and overrides the value from the config file.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ Gateway::new()         -- config snapshot, engine, queue
//!  └─ Gateway::connect()     -- binds sockets for the selected mode
//!  └─ cycle task             -- Gateway::tick() every frame interval
//!  └─ console loop           -- stdin commands until quit or Ctrl-C
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tuio_core::Mode;
use tuio_gateway::infrastructure::console::{execute, Command};
use tuio_gateway::infrastructure::gateway::Gateway;
use tuio_gateway::infrastructure::storage::config::{
    load_config, load_config_from, GatewayConfig,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Receiver,
    Sender,
    Router,
    Random,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Receiver => Mode::Receiver,
            ModeArg::Sender => Mode::Sender,
            ModeArg::Router => Mode::Router,
            ModeArg::Random => Mode::RandomSender,
        }
    }
}

/// TUIO cursor gateway.
///
/// Options left unset keep the value from the config file.
#[derive(Debug, Parser)]
#[command(
    name = "tuio-gateway",
    about = "Receive, partition and re-emit TUIO cursors over UDP",
    version
)]
struct Cli {
    /// Path of the TOML config file.
    #[arg(long, env = "TUIO_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Operating mode.
    #[arg(long, value_enum, env = "TUIO_GATEWAY_MODE")]
    mode: Option<ModeArg>,

    /// UDP port to receive TUIO on.
    #[arg(long, env = "TUIO_GATEWAY_LOCAL_PORT")]
    local_port: Option<u16>,

    /// Hostname or IP address of the downstream receiver.
    #[arg(long, env = "TUIO_GATEWAY_REMOTE_IP")]
    remote_ip: Option<String>,

    /// UDP port of the downstream receiver.
    #[arg(long, env = "TUIO_GATEWAY_REMOTE_PORT")]
    remote_port: Option<u16>,

    /// Number of display tiles the x axis is split into.
    #[arg(long, env = "TUIO_GATEWAY_DISPLAYS")]
    displays: Option<i32>,

    /// One-based tile to forward.
    #[arg(long, env = "TUIO_GATEWAY_DISPLAY_ID")]
    display_id: Option<i32>,

    /// Output cycles per second.
    #[arg(long, env = "TUIO_GATEWAY_FPS")]
    fps: Option<u32>,

    /// Log filter used when `RUST_LOG` is unset, e.g. `debug`.
    #[arg(long, env = "TUIO_GATEWAY_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Writes every option that was given over the loaded config.
    fn apply_to(&self, cfg: &mut GatewayConfig) {
        if let Some(mode) = self.mode {
            cfg.gateway.mode = Mode::from(mode).index();
        }
        if let Some(port) = self.local_port {
            cfg.network.local_tuio_port = port;
        }
        if let Some(ip) = &self.remote_ip {
            cfg.network.remote_ip = ip.clone();
        }
        if let Some(port) = self.remote_port {
            cfg.network.remote_tuio_port = port;
        }
        if let Some(n) = self.displays {
            cfg.display.n_displays = n;
        }
        if let Some(id) = self.display_id {
            cfg.display.remote_display_id = id;
        }
        if let Some(fps) = self.fps {
            cfg.gateway.frame_rate_hz = fps;
        }
        if let Some(level) = &self.log_level {
            cfg.gateway.log_level = level.clone();
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => load_config().unwrap_or_else(|e| {
            eprintln!("using default configuration: {e}");
            GatewayConfig::default()
        }),
    };
    cli.apply_to(&mut config);

    // Initialise structured logging.  `RUST_LOG` wins over the config level.
    let fallback_level = config.gateway.log_level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level)),
        )
        .init();

    info!("TUIO gateway starting");

    let gateway = Arc::new(Mutex::new(Gateway::new(config, cli.config.clone())));
    let running = Arc::new(AtomicBool::new(true));

    let frame_interval = {
        let mut gw = gateway.lock().await;
        gw.connect();
        println!("{}", gw.status_line());
        gw.frame_interval()
    };

    // ── Output cycle ──────────────────────────────────────────────────────────
    let cycle = {
        let gateway = Arc::clone(&gateway);
        let running = Arc::clone(&running);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            while running.load(Ordering::Relaxed) {
                ticker.tick().await;
                gateway.lock().await.tick().await;
            }
        })
    };

    // ── Console ───────────────────────────────────────────────────────────────
    info!("TUIO gateway ready.  Type 'help' for commands, Ctrl-C to exit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        };
        // EOF: keep relaying until Ctrl-C.
        let Some(line) = line else {
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => {
                let reply = execute(&mut *gateway.lock().await, command);
                println!("{reply}");
            }
            Err(e) => warn!("{e}"),
        }
    }

    running.store(false, Ordering::Relaxed);
    if let Err(e) = cycle.await {
        warn!("cycle task ended abnormally: {e}");
    }
    gateway.lock().await.shutdown();

    info!("TUIO gateway stopped");
    Ok(())
}
