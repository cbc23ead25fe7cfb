pub mod directory_tests;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::Level;

use huddle_server::{RelayConfig, RelayService, RoomDirectory};

use crate::utils::RecordingOutput;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_directory() -> (RoomDirectory, RecordingOutput) {
    let output = RecordingOutput::new();
    let directory = RoomDirectory::new(Arc::new(output.clone()), &RelayConfig::default());
    (directory, output)
}

/// Bind the relay on an ephemeral port. Dropping the sender stops it.
pub async fn spawn_relay() -> (SocketAddr, oneshot::Sender<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind relay");
    let addr = listener.local_addr().expect("No local addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let relay = RelayService::new(RelayConfig::default());
    tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = huddle_server::serve(listener, relay, shutdown).await {
            tracing::error!("Relay test server failed: {}", e);
        }
    });

    (addr, shutdown_tx)
}
