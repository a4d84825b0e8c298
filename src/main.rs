//! path-proxy
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  PATH PROXY                   │
//!   Client Request      │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!   ────────────────────┼─▶│ server │──▶│path_proxy│──▶│  security  │  │
//!   /proxy/8080/x       │  │ layers │   │  mount   │   │    gate    │  │
//!                       │  └────────┘   └──────────┘   └─────┬──────┘  │
//!                       │                                    │         │
//!                       │                         ┌──────────▼───────┐ │
//!                       │                         │ routing: target  │ │
//!                       │                         │ + route context  │ │
//!                       │                         └──────────┬───────┘ │
//!   Client Response     │  ┌──────────┐   ┌───────────┐      │         │
//!   ◀───────────────────┼──│ response │◀──│ transport │◀─────┘         │     0.0.0.0:8080
//!                       │  │ rewrite  │   │ http / ws │────────────────┼──▶ Backend
//!                       │  └──────────┘   └───────────┘                │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use path_proxy::config::loader::{read_config, ConfigError};
use path_proxy::config::validation::validate_config;
use path_proxy::lifecycle::wait_for_signal;
use path_proxy::observability::{logging, metrics};
use path_proxy::{HttpServer, ProxyConfig, Shutdown};

#[derive(Parser)]
#[command(name = "path-proxy")]
#[command(about = "Forward /{prefix}/{port}/... to services on local ports", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener address, overrides `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level, overrides `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,

    /// Sign-in password, overrides `auth.password`.
    #[arg(long, env = "PATH_PROXY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the effective settings as JSON
    CheckConfig,
}

impl Cli {
    fn effective_config(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(password) = &self.password {
            config.auth.password = password.clone();
        }
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.effective_config()?;

    if let Some(Commands::CheckConfig) = cli.command {
        let mut shown = config.clone();
        if !shown.auth.password.is_empty() {
            shown.auth.password = "<redacted>".to_string();
        }
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("path-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        auth_mode = ?config.auth.mode,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation guarantees the address parses.
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                tracing::info!(signal, "Stopping");
                signal_shutdown.trigger();
            }
            Err(e) => tracing::error!(error = %e, "Failed to install signal handlers"),
        }
    });

    HttpServer::new(config).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
