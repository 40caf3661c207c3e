//! Tenant Notify
//!
//! Realtime notification client for a multi-tenant WhatsApp-business admin
//! console. Keeps one socket.io connection per logged-in session, joins the
//! tenant's room, and turns tenant events into dismissible overlays.
//!
//! # Features
//!
//! - **One connection per session**: opened when a tenant is known, closed
//!   (after leaving the room) on logout or tenant switch
//! - **Typed events**: customer added, chat assigned, task assigned, private
//!   chat started, plus privacy status changes
//! - **Self-suppression**: nobody is notified about their own actions
//! - **Auto-dismiss**: every modal overlay hides itself after 30 seconds
//!
//! # Modules
//!
//! - `config`: environment configuration and reconnect policy
//! - `session`: session bootstrap from the stored token and profile
//! - `transport`: connection manager, socket.io codec and transports
//! - `router`: inbound event decoding and dispatch
//! - `store`: per-category notification slots
//! - `presenter`: overlays, dismiss timers and navigation
//! - `client`: the assembled pipeline
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tenant_notify::presenter::RecordingNavigator;
//! use tenant_notify::transport::websocket::WsConnector;
//! use tenant_notify::{Config, NotificationClient, RouterCallbacks, SessionIdentity};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default();
//!     let connector = WsConnector::new(&config.socket_url, None, config.reconnect.clone());
//!     let navigator = Arc::new(RecordingNavigator::new("/dashboard"));
//!     let mut client =
//!         NotificationClient::new(&config, Box::new(connector), navigator, RouterCallbacks::new());
//!
//!     client.set_session(Some(SessionIdentity::new("u1", "c1")));
//!     client.run(CancellationToken::new()).await;
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod presenter;
pub mod router;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

// Re-export commonly used items at crate root
pub use client::NotificationClient;
pub use config::{Config, ReconnectPolicy};
pub use error::{NotifyError, NotifyResult};
pub use presenter::{Action, Navigation, Navigator, Overlay, OverlayMode, PresenterHost};
pub use router::{EventRouter, RouteOutcome, RouterCallbacks};
pub use session::{LocalStorage, Session, SessionBootstrap};
pub use store::{NotificationStore, StoreEvent};
pub use transport::{ConnectionManager, ConnectionState};
pub use types::{Actor, Category, Notification, PendingNotification, SessionIdentity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
