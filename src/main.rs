//! Mobile Access Bridge - Main Entry Point

use std::sync::Arc;

use clap::Parser;
use listenfd::ListenFd;
use mobile_access_bridge::{
    config::{CliArgs, Settings},
    core::bridge::MobileAccessBridge,
    sdk::{SimulatedSdk, SimulatedSdkProvider},
    transport::unix_socket::UnixSocketServer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mobile_access_bridge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    info!(?args, "Starting mobile access bridge");
    let settings = Settings::from(args);

    // The vendor SDK is not linked into this binary; the simulated one
    // stands in for it.
    let sdk = Arc::new(SimulatedSdk::new());
    sdk.set_second_factor_required(settings.simulate_second_factor);
    let bridge = Arc::new(MobileAccessBridge::new(
        SimulatedSdkProvider::new(sdk),
        settings.continuation_ttl,
        settings.event_capacity,
    ));

    // Prefer a socket passed by the service manager
    let (server, owns_socket_file) = match ListenFd::from_env().take_unix_listener(0)? {
        Some(listener) => (UnixSocketServer::from_std(listener, bridge)?, false),
        None => (
            UnixSocketServer::bind(&settings.socket_path, settings.socket_mode, bridge).await?,
            true,
        ),
    };
    let server_task = tokio::spawn(server.run());

    #[cfg(feature = "systemd")]
    if let Err(e) = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]) {
        warn!("Failed to notify systemd: {}", e);
    }

    info!("Service started successfully");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully");
        }
        _ = shutdown_signal() => {
            info!("Received SIGTERM, shutting down gracefully");
        }
        result = server_task => match result {
            Ok(Err(e)) => error!("Unix socket server error: {}", e),
            Err(e) => error!("Unix socket server task failed: {}", e),
            Ok(Ok(())) => info!("Unix socket server stopped"),
        },
    }

    #[cfg(feature = "systemd")]
    if let Err(e) = sd_notify::notify(false, &[sd_notify::NotifyState::Stopping]) {
        warn!("Failed to notify systemd: {}", e);
    }

    if owns_socket_file {
        if let Err(e) = tokio::fs::remove_file(&settings.socket_path).await {
            warn!("Could not remove socket file: {}", e);
        }
    }

    info!("Shutting down...");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    // On non-Unix platforms, just wait forever
    std::future::pending::<()>().await
}
