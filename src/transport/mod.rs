//! Connection management for the session's realtime socket
//!
//! ## Pieces
//! - [`ConnectionManager`]: owns the single live transport and the tenant
//!   room membership, drives the connect/disconnect state machine
//! - [`Transport`] / [`Connector`]: the seam between the manager and the
//!   actual socket
//! - [`websocket`]: socket.io over `tokio-tungstenite`, with reconnect backoff
//! - [`memory`]: an in-process transport that records emitted control events
//! - [`codec`]: Engine.IO v4 / Socket.IO v5 text packet codec

pub mod codec;
pub mod control;
pub mod manager;
pub mod memory;
pub mod websocket;

pub use control::ControlEvent;
pub use manager::{ConnectionChange, ConnectionManager};

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::NotifyResult;

/// Connection state as seen by the rest of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Server-to-client event channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundChannel {
    /// `companyMessage`: broadcast to the tenant room
    Company,
    /// `message`: broadcast to every connected session
    Global,
}

impl InboundChannel {
    pub fn event_name(&self) -> &'static str {
        match self {
            InboundChannel::Company => "companyMessage",
            InboundChannel::Global => "message",
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "companyMessage" => Some(InboundChannel::Company),
            "message" => Some(InboundChannel::Global),
            _ => None,
        }
    }
}

/// Something the transport observed
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Socket is up and the namespace handshake completed
    Connected,
    /// Socket went away; the transport retries on its own
    Disconnected { reason: String },
    /// Connect attempt or protocol failure
    Error { message: String },
    /// Inbound data event
    Message { channel: InboundChannel, payload: Value },
}

/// A transport event tagged with the connection that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct TransportEnvelope {
    pub connection_id: u64,
    pub event: TransportEvent,
}

/// Where a transport reports its events
#[derive(Debug, Clone)]
pub struct EventSink {
    connection_id: u64,
    tx: mpsc::UnboundedSender<TransportEnvelope>,
}

impl EventSink {
    pub fn new(connection_id: u64, tx: mpsc::UnboundedSender<TransportEnvelope>) -> Self {
        Self { connection_id, tx }
    }

    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Report an event; returns false once the client stopped listening
    pub fn send(&self, event: TransportEvent) -> bool {
        self.tx
            .send(TransportEnvelope {
                connection_id: self.connection_id,
                event,
            })
            .is_ok()
    }
}

/// A live socket owned by the [`ConnectionManager`]
pub trait Transport: Send {
    /// Queue a control event for the server
    fn emit(&mut self, event: &ControlEvent) -> NotifyResult<()>;

    /// Tear the socket down and stop reconnecting
    fn close(&mut self);
}

/// Opens transports for a tenant
pub trait Connector: Send {
    fn connect(&mut self, tenant_id: &str, sink: EventSink) -> NotifyResult<Box<dyn Transport>>;
}
