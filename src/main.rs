use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wa_bridge::session::{SessionState, SidecarSession};
use wa_bridge::{Config, Daemon};

/// wa-bridge - HTTP and webhook bridge for a WhatsApp Web session
#[derive(Parser)]
#[command(name = "wa-bridge", version, about)]
struct Cli {
    /// Port to listen on (overrides WEBHOOK_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Query the session sidecar and print its status
    Status,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::load();

    // Set up logging based on verbosity, falling back to LOG_LEVEL
    let filter = match cli.verbose {
        0 => config
            .as_ref()
            .map_or_else(|_| "info".to_string(), |c| c.log_level.clone()),
        1 => "info,wa_bridge=debug".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Status => cmd_status(&config).await,
            Command::Config => {
                println!("{config:#?}");
                Ok(())
            }
        };
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        forward = config.forward.url.is_some(),
        "starting wa-bridge"
    );

    Daemon::new(config).run().await?;
    Ok(())
}

async fn cmd_status(config: &Config) -> anyhow::Result<()> {
    let session = SidecarSession::new(config.session.api_url.clone(), SessionState::shared());
    let status = session.probe_status().await?;

    println!("Session API: {}", config.session.api_url);
    println!("Ready:       {}", status.ready);
    if let Some(qr) = status.qr {
        println!("Pending QR:  {qr}");
    }
    Ok(())
}
