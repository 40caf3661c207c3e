//! Tenant Notify - Binary Entry Point
//!
//! Connects as the session stored in `NOTIFY_STORAGE_DIR` and logs every
//! notification overlay until Ctrl-C.

use std::sync::Arc;

use tenant_notify::presenter::RecordingNavigator;
use tenant_notify::transport::websocket::WsConnector;
use tenant_notify::{
    logging, Config, LocalStorage, NotificationClient, NotifyResult, RouterCallbacks,
    SessionBootstrap,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> NotifyResult<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    logging::init(&config.log_filter);
    info!(version = tenant_notify::VERSION, url = %config.socket_url, "Starting notify-console");

    let storage = LocalStorage::new(&config.storage_dir);
    let session = match SessionBootstrap::load(&storage)? {
        Some(session) => session,
        None => {
            warn!(dir = %config.storage_dir.display(), "No stored session, nothing to connect");
            return Ok(());
        }
    };
    info!(user = %session.display_name, tenant_id = %session.identity.tenant_id, "Loaded session");

    let connector = WsConnector::new(&config.socket_url, session.token.clone(), config.reconnect.clone());
    let navigator = Arc::new(RecordingNavigator::new(config.initial_route.clone()));
    let callbacks = RouterCallbacks::new()
        .on_private_status_change(|status| info!(status = %status, "Private status changed"))
        .on_company_message(|payload| info!(payload = %payload, "Company message"))
        .on_global_message(|payload| info!(payload = %payload, "Broadcast message"));

    let mut client = NotificationClient::new(&config, Box::new(connector), navigator, callbacks);
    client.set_session(Some(session.identity));

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
        }
        signal_token.cancel();
    });

    client.run(shutdown).await;
    info!("notify-console stopped");
    Ok(())
}
