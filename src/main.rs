use anyhow::Context;
use clap::Parser;
use license_exporter::{
    cli::Cli,
    config::AppConfig,
    observability::{init_logging, init_metrics, log_config_info},
    startup::bootstrap_from_config,
    APP_NAME, VERSION,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env file if it exists. This must happen before any config is read
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = AppConfig::from_env().context("Failed to read configuration")?;
    config.validate().context("Invalid configuration")?;

    if cli.check_config {
        println!("Configuration OK");
        return Ok(());
    }

    init_logging(&config.observability)?;
    info!(app_name = APP_NAME, version = VERSION, "Starting license exporter");
    log_config_info(&config);

    let metrics = init_metrics(&config.observability).await?;
    let mut scheduler = bootstrap_from_config(&config, metrics)
        .await
        .context("Startup failed: could not load the GitLab credential from Vault")?;

    if cli.once {
        let outcome = scheduler.tick().await.join().await;
        info!(outcome = ?outcome, "Single tick complete");
        return Ok(());
    }

    scheduler.run(shutdown_signal()).await;
    info!("License exporter stopped");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
