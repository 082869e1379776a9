use anyhow::{Context, Result as AnyResult};
use clap::Parser;
use kube::Client as KubeClient;
use openfaas_deployment_sync_rs::{
    accessor::ClusterAccessor,
    cli::{Cli, Commands},
    consts::DEFAULT_LOG_FILTER,
    controller::FunctionsController,
    server,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", DEFAULT_LOG_FILTER);
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_level(true)
        .with_ansi(true)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received."),
        Err(error) => tracing::error!(%error, "Failed to listen for shutdown signal."),
    }
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            functions_namespace,
            address,
        } => {
            tracing::info!(%functions_namespace, %address, "Running with current config.");

            let client = KubeClient::try_default()
                .await
                .context("Failed to create kubernetes client")?;

            let controller =
                FunctionsController::new(ClusterAccessor::new(client), functions_namespace);

            server::serve(controller, address, shutdown_signal())
                .await
                .context("Failed to serve")?;
        }
    }

    Ok(())
}
