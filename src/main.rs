use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use weathercast::broker::{Broker, Coordinator};
use weathercast::config::load_config;
use weathercast::poller::Poller;
use weathercast::source::OpenMeteoClient;
use weathercast::transport::start_websocket_server;
use weathercast::utils::logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = run_server().await {
        logging::init("info");
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_config()?;
    logging::init(&settings.server.log_level);

    let source = OpenMeteoClient::new(&settings.source)?;
    let coordinator = Coordinator::new(Broker::new(&settings.topics), Arc::new(source));
    coordinator.seed_topics(&settings.topics.seed).await;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let poller = Poller::new(coordinator.clone(), settings.poller.clone());
    let poller_handle = tokio::spawn(poller.run(shutdown_rx));

    tokio::select! {
        _ = start_websocket_server(listener, coordinator) => {
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    let _ = shutdown_tx.send(());
    let _ = poller_handle.await;

    Ok(())
}
