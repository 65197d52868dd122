pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod services;

use anyhow::Context;
use std::path::Path;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;

/// Loads the config named on the command line, or searches the default
/// locations. `init-config` may point at a file that doesn't exist yet.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) if path.exists() => Config::load_from_path(path),
        Some(_) if matches!(cli.command(), Commands::InitConfig) => Ok(Config::default()),
        Some(path) => anyhow::bail!("Config file not found: {}", path.display()),
        None => Config::load(),
    }
}

pub fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json = config.general.log_format == "json";
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let fmt_layer = (!json).then(|| tracing_subscriber::fmt::layer());

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(fmt_layer)
        .try_init();
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    init_tracing(&config);

    match cli.command() {
        Commands::Serve => {
            config.validate()?;
            run_server(config).await
        }
        Commands::InitConfig => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(Config::default_config_path);
            init_config(&path)
        }
        Commands::CheckConfig => {
            config.validate()?;
            println!("Configuration is valid");
            println!("  database:      {}", config.general.database_path);
            println!(
                "  listen:        {}:{}",
                config.server.bind_address, config.server.port
            );
            println!("  token expiry:  {}s", config.auth.token_expiry_seconds);
            Ok(())
        }
    }
}

fn init_config(path: &Path) -> anyhow::Result<()> {
    if Config::create_default_if_missing(path)? {
        println!("Wrote default config to {}", path.display());
    } else {
        println!("Config already exists at {}", path.display());
    }
    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("pam v{} starting...", env!("CARGO_PKG_VERSION"));

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);

    let api_state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(api_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
