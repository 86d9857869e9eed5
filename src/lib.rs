use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub mod bridge;
pub mod config;
pub mod error;
pub mod listener;
pub mod navigation;
pub mod relay;
pub mod surface;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use listener::{DiagnosisEvent, DiagnosisListener, FileTarget, MessageFilter};
pub use navigation::Navigator;
pub use relay::RelayServer;
pub use surface::{CommandSurface, EditingSurface, LocalSurface};

// ============ Command Line ============

#[derive(Debug, Parser)]
#[command(name = "diagbridge", version, about = "Jump an editor to the lines named by diagnosis messages")]
struct Cli {
    /// Config file (defaults to <config dir>/diagbridge/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connect to the diagnosis channel and navigate on each event
    Listen(ListenArgs),
    /// Run the local relay that producers and listeners connect to
    Relay(RelayArgs),
}

#[derive(Debug, Args)]
struct ListenArgs {
    /// WebSocket endpoint, e.g. ws://localhost:8765
    #[arg(long)]
    endpoint: Option<String>,

    /// Identity events must be addressed to
    #[arg(long)]
    recipient: Option<String>,

    /// Base directory for relative paths
    #[arg(long)]
    workspace_root: Option<PathBuf>,

    /// Editor command, e.g. "code --goto {path}:{line}:{column}"
    #[arg(long)]
    editor_command: Option<String>,
}

impl ListenArgs {
    fn apply(self, config: &mut BridgeConfig) {
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(recipient) = self.recipient {
            config.recipient = recipient;
        }
        if let Some(root) = self.workspace_root {
            config.workspace_root = Some(root);
        }
        if let Some(command) = self.editor_command {
            config.editor_command = command.split_whitespace().map(String::from).collect();
        }
    }
}

#[derive(Debug, Args)]
struct RelayArgs {
    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,
}

// ============ Commands ============

async fn listen(config: BridgeConfig) -> Result<()> {
    if config.editor_command.is_empty() {
        log::info!("No editor command configured, navigating headless");
        run_bridge(&config, LocalSurface::new()).await
    } else {
        let surface = CommandSurface::new(config.editor_command.clone())?;
        run_bridge(&config, surface).await
    }
}

async fn run_bridge<S: EditingSurface>(config: &BridgeConfig, surface: S) -> Result<()> {
    let mut bridge = Bridge::activate(config, surface).await?;

    tokio::select! {
        _ = bridge.run() => {}
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, shutting down");
        }
    }

    bridge.deactivate();
    Ok(())
}

async fn relay(bind: &str) -> Result<()> {
    RelayServer::bind(bind).await?.serve().await
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = BridgeConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Listen(args) => {
            args.apply(&mut config);
            listen(config).await
        }
        Command::Relay(args) => {
            let bind = args.bind.unwrap_or(config.relay_bind);
            relay(&bind).await
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Also installs the `log` bridge, so `log::` records reach the subscriber.
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_listen_overrides_config() {
        let cli = Cli::try_parse_from([
            "diagbridge",
            "listen",
            "--recipient",
            "Zed",
            "--editor-command",
            "code --goto {path}:{line}:{column}",
        ])
        .unwrap();

        let mut config = BridgeConfig::default();
        match cli.command {
            Command::Listen(args) => args.apply(&mut config),
            Command::Relay(_) => panic!("expected listen"),
        }
        assert_eq!(config.recipient, "Zed");
        assert_eq!(config.endpoint, crate::config::DEFAULT_ENDPOINT);
        assert_eq!(
            config.editor_command,
            vec!["code", "--goto", "{path}:{line}:{column}"]
        );
    }

    #[test]
    fn test_cli_relay_with_global_config() {
        let cli = Cli::try_parse_from([
            "diagbridge",
            "relay",
            "--bind",
            "127.0.0.1:9000",
            "--config",
            "/tmp/diagbridge.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/diagbridge.json")));
        assert!(matches!(cli.command, Command::Relay(RelayArgs { bind: Some(_) })));
    }
}
