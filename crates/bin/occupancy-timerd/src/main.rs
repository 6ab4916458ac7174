//! # occupancy-timerd — occupancy timer daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise structured logging
//! - Build virtual switches and register one aggregator per accessory
//! - Build the axum router, injecting the accessory service
//! - Bind to a TCP port and serve
//! - On Ctrl-C, stop serving and tear every accessory down
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use occupancy_timer_adapter_http_axum::router;
use occupancy_timer_adapter_http_axum::state::AppState;
use occupancy_timer_app::event_bus::InProcessEventBus;
use occupancy_timer_app::services::accessory_service::AccessoryService;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(256));

    // Accessories
    let service = Arc::new(AccessoryService::new(
        Arc::clone(&event_bus),
        config.aggregator_settings(),
    ));
    let simulations = config.simulations();
    for (accessory, simulation) in config.accessory_configs()?.into_iter().zip(simulations) {
        let switches = occupancy_timer_adapter_virtual::switches_for(&accessory, &simulation);
        service.register(accessory, switches)?;
    }

    // HTTP
    let app = router::build(AppState::new(Arc::clone(&service), event_bus));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "occupancy-timerd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown().await;
    tracing::info!("occupancy-timerd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
