use std::sync::Arc;

use anyhow::{Context, Error, Result};
use push_webhooks::{
    api::{AppState, run_api_server},
    clients::{health::HealthChecker, notifier::Notifier, rbmq::RabbitMqClient},
    config::Config,
    handler::MessageHandler,
    worker,
};
use tokio::{net::TcpListener, signal, sync::watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::load()?;
    init_tracing(&config.log_level);

    info!(
        system_code = %config.app_system_code,
        app_name = %config.app_name,
        port = config.server_port,
        "notifications-push-webhooks is starting"
    );

    let subscriptions = config.subscriptions()?;
    let notifier = Notifier::new(Arc::new(config.http_client()?), subscriptions);
    let handler = Arc::new(MessageHandler::new(notifier));

    let rabbitmq = Arc::new(RabbitMqClient::connect(&config).await?);
    let consumer = rabbitmq.create_consumer().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let state = Arc::new(AppState {
        health_checker: HealthChecker::new(
            config.app_system_code.clone(),
            config.app_name.clone(),
            config.panic_guide_url.clone(),
            rabbitmq.clone(),
        ),
    });
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.server_port))
        .await
        .context("Failed to bind health check server")?;
    let server = tokio::spawn(run_api_server(
        listener,
        state,
        wait_for_shutdown(shutdown_rx.clone()),
    ));

    let signal_tx = Arc::clone(&shutdown_tx);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("notifications-push-webhooks is shutting down");
        signal_tx.send_replace(true);
    });

    let exit = worker::run(
        consumer,
        rabbitmq.clone(),
        handler,
        config.worker_concurrency,
        wait_for_shutdown(shutdown_rx),
    )
    .await;

    // The health server only stops once the shutdown flag is set.
    shutdown_tx.send_replace(true);

    if let Err(e) = rabbitmq.close().await {
        warn!(error = %e, "Failed to close RabbitMQ connection cleanly");
    }

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Unable to stop http server"),
        Err(e) => error!(error = %e, "Health check server task failed"),
    }

    exit.into_result()
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .init();
}

async fn wait_for_shutdown(mut shutdown_rx: watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
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
