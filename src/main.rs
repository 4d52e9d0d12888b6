//! Loki Mock Server - CLI Entry Point

use anyhow::Result;
use clap::Parser;
use loki_mock_server::config::ENDPOINTS_ENV_VAR;
use loki_mock_server::{
    Dispatcher, MockError, MockServer, MockServerConfig, ServerConfig, TemplateEngine,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "loki",
    about = "Configuration-driven HTTP mock server with templated JSON responses",
    version
)]
struct Args {
    /// Path to the endpoint file (.json, .yaml or .yml)
    #[arg(short, long, env = ENDPOINTS_ENV_VAR)]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long, env = "MOCK_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "MOCK_PORT", default_value_t = 5000)]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Enable debug logging
    #[arg(long, env = "DEBUG")]
    debug: bool,

    /// JSON-escape parameter values before substituting them
    #[arg(long)]
    escape_values: bool,

    /// Print a sample endpoint file and exit
    #[arg(long)]
    print_config: bool,

    /// Validate the endpoint file and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.debug {
        Level::DEBUG.max(args.log_level)
    } else {
        args.log_level
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        let sample = include_str!("../demos/endpoints.json");
        println!("{}", sample);
        return Ok(());
    }

    let path = args.config.ok_or(MockError::MissingEnvironmentVariable {
        name: ENDPOINTS_ENV_VAR,
    })?;
    info!(path = %path.display(), "Loading endpoints");
    let config = MockServerConfig::from_file(&path)?;

    if args.validate {
        config.validate()?;
        println!(
            "Configuration is valid ({} endpoints defined)",
            config.endpoints.len()
        );
        return Ok(());
    }

    let engine = TemplateEngine::new().with_escaping(args.escape_values);
    let dispatcher = Dispatcher::from_config(&config, engine)?;

    let server_config = ServerConfig::new(args.host, args.port);
    let server = MockServer::bind(&server_config, dispatcher).await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    Ok(())
}
