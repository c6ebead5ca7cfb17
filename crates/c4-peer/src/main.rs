//! LAN Connect Four peer entry point.
//!
//! Finds an opponent on the local network, then plays one game against them
//! from the terminal.  The exit status reports how the session ended:
//!
//! | Status | Meaning |
//! |---|---|
//! | 0 | the game finished (win, loss or tie) |
//! | 1 | configuration or discovery failed |
//! | 2 | the game was aborted by a protocol error |
//! | 130 | interrupted with Ctrl+C |
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()            -- file + CLI overrides, validated
//!  └─ discover()               -- announce / listen race → (stream, role)
//!  └─ TurnCoordinator::run()   -- turn exchange until a SessionOutcome
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use c4_core::{Board, SessionOutcome};
use c4_peer::application::turn_coordinator::TurnCoordinator;
use c4_peer::infrastructure::console::terminal::TerminalMoves;
use c4_peer::infrastructure::console::{connection_banner, outcome_message, start_banner};
use c4_peer::infrastructure::network::discovery::{choose_rendezvous_port, discover};
use c4_peer::infrastructure::storage::config::{load_config, AppConfig};

/// Exit status after Ctrl+C, following the shell convention of 128 + SIGINT.
const INTERRUPTED: u8 = 130;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// LAN Connect Four.
///
/// Run the same program on two machines of the same network; they find each
/// other by UDP broadcast and play over a direct TCP connection.
#[derive(Debug, Parser)]
#[command(
    name = "c4-peer",
    about = "Play Connect Four against another peer on the local network",
    version
)]
struct Cli {
    /// Path to a TOML configuration file.
    ///
    /// Defaults to `config.toml` in the platform configuration directory.
    #[arg(long, env = "C4LAN_CONFIG")]
    config: Option<PathBuf>,

    /// Address announcements are sent to (e.g. `192.168.1.255`).
    #[arg(long, env = "C4LAN_BROADCAST_ADDRESS")]
    broadcast_address: Option<String>,

    /// UDP port used for discovery announcements.
    #[arg(long, env = "C4LAN_DISCOVERY_PORT")]
    discovery_port: Option<u16>,

    /// Log filter, e.g. `info` or `c4_peer=debug`.  `RUST_LOG` takes precedence.
    #[arg(long, env = "C4LAN_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Applies the flags that were given on top of the file configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(address) = &self.broadcast_address {
            config.network.broadcast_address = Some(address.clone());
        }
        if let Some(port) = self.discovery_port {
            config.network.discovery_port = port;
        }
        if let Some(level) = &self.log_level {
            config.peer.log_level = level.clone();
        }
    }
}

fn exit_code(outcome: SessionOutcome) -> ExitCode {
    if outcome.is_completed_game() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config =
        load_config(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config);

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.peer.log_level)),
        )
        .init();

    config.validate().context("invalid configuration")?;

    // ── Discovery ─────────────────────────────────────────────────────────────
    let rendezvous_port = choose_rendezvous_port(config.network.rendezvous_ports());
    let discovery_config = config.discovery_config(rendezvous_port)?;
    let board = Board::with_dimensions(config.game.board)?;
    let column_base = config.game.column_base;

    info!(
        rendezvous_port,
        broadcast = %discovery_config.broadcast_target,
        "LAN Connect Four starting"
    );
    println!("Looking for an opponent on the local network...");

    let peer = tokio::select! {
        found = discover(&discovery_config) => found.context("peer discovery failed")?,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted before an opponent was found");
            return Ok(ExitCode::from(INTERRUPTED));
        }
    };

    let local_addr = peer
        .stream
        .local_addr()
        .context("connection has no local address")?;
    println!("{}", connection_banner(local_addr, peer.peer_addr));
    println!("{}", start_banner(peer.role));

    // ── Game ──────────────────────────────────────────────────────────────────
    let moves = TerminalMoves::stdio(column_base);
    let mut coordinator = TurnCoordinator::new(peer.stream, peer.role, moves)
        .with_board(board)
        .with_column_base(column_base);

    let outcome = tokio::select! {
        outcome = coordinator.run() => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted during the game");
            return Ok(ExitCode::from(INTERRUPTED));
        }
    };

    println!("\n{}\n", coordinator.board().render(column_base.offset()));
    println!("{}", outcome_message(outcome));
    Ok(exit_code(outcome))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_without_flags_keeps_file_config() {
        // Arrange
        let cli = Cli::parse_from(["c4-peer"]);
        let mut config = AppConfig::default();

        // Act
        cli.apply_overrides(&mut config);

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_cli_flags_override_network_and_log_level() {
        // Arrange
        let cli = Cli::parse_from([
            "c4-peer",
            "--broadcast-address",
            "192.168.1.255",
            "--discovery-port",
            "8123",
            "--log-level",
            "debug",
        ]);
        let mut config = AppConfig::default();

        // Act
        cli.apply_overrides(&mut config);

        // Assert
        assert_eq!(
            config.network.broadcast_address.as_deref(),
            Some("192.168.1.255")
        );
        assert_eq!(config.network.discovery_port, 8123);
        assert_eq!(config.peer.log_level, "debug");
    }

    #[test]
    fn test_cli_accepts_config_path() {
        let cli = Cli::parse_from(["c4-peer", "--config", "/tmp/c4.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c4.toml")));
    }

    #[test]
    fn test_exit_code_distinguishes_protocol_error() {
        assert_eq!(exit_code(SessionOutcome::Tie), ExitCode::SUCCESS);
        assert_eq!(exit_code(SessionOutcome::LocalWin), ExitCode::SUCCESS);
        assert_eq!(exit_code(SessionOutcome::RemoteWin), ExitCode::SUCCESS);
        assert_eq!(exit_code(SessionOutcome::ProtocolError), ExitCode::from(2));
    }
}
