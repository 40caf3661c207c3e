//! Connection Manager
//!
//! Owns the one live transport for the session and the membership of the
//! tenant room. State machine:
//!
//! ```text
//! Disconnected --tenant known--> Connecting --Connected--> Connected
//!      ^                             |                         |
//!      +------ error / disconnect ---+-------------------------+
//! ```
//!
//! Every `Connected` report (first connect and each reconnect) joins the
//! tenant room. An explicit teardown (logout, tenant switch) leaves the room
//! before the transport is closed. A transport-side drop only flips the state:
//! the transport keeps retrying and the room is joined again on reconnect.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{
    ConnectionState, Connector, ControlEvent, EventSink, Transport, TransportEnvelope,
    TransportEvent,
};

/// What a transport event meant for the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionChange {
    /// Event came from a transport that is no longer current
    Stale,
    /// Connection is up; listeners for this generation may attach
    Connected { generation: u64 },
    /// Connection went down
    Disconnected,
    /// Data event on a live connection
    Message,
    /// Nothing changed
    Unchanged,
}

/// Single owner of the raw transport
pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    transport: Option<Box<dyn Transport>>,
    events_tx: mpsc::UnboundedSender<TransportEnvelope>,
    state: ConnectionState,
    tenant_id: Option<String>,
    joined: Option<String>,
    /// Bumped for every transport opened
    connection_id: u64,
    /// Bumped for every successful (re)connect
    generation: u64,
}

impl ConnectionManager {
    /// Create a manager; transports report into `events_tx`
    pub fn new(
        connector: Box<dyn Connector>,
        events_tx: mpsc::UnboundedSender<TransportEnvelope>,
    ) -> Self {
        Self {
            connector,
            transport: None,
            events_tx,
            state: ConnectionState::Disconnected,
            tenant_id: None,
            joined: None,
            connection_id: 0,
            generation: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected && self.transport.is_some()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Tenant room currently joined, if any
    pub fn joined_group(&self) -> Option<&str> {
        self.joined.as_deref()
    }

    /// Id of the current transport
    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Id of the current live connection; changes on every reconnect
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Point the manager at a tenant (or none, on logout).
    ///
    /// Same tenant with a transport already open is a no-op. A different
    /// tenant tears the old connection down first.
    pub fn set_tenant(&mut self, tenant_id: Option<&str>) {
        let tenant_id = tenant_id.filter(|t| !t.is_empty());

        if tenant_id.is_some() && tenant_id == self.tenant_id.as_deref() && self.transport.is_some() {
            return;
        }

        self.teardown();
        self.tenant_id = tenant_id.map(str::to_string);

        let Some(tenant) = tenant_id else {
            return;
        };

        self.connection_id += 1;
        self.state = ConnectionState::Connecting;
        let sink = EventSink::new(self.connection_id, self.events_tx.clone());

        match self.connector.connect(tenant, sink) {
            Ok(transport) => {
                info!(tenant_id = %tenant, connection_id = self.connection_id, "Connecting");
                self.transport = Some(transport);
            }
            Err(e) => {
                error!(tenant_id = %tenant, error = %e, "Failed to open transport");
                self.state = ConnectionState::Disconnected;
            }
        }
    }

    /// Explicit disconnect: leave the room, close the transport, forget the tenant
    pub fn disconnect(&mut self) {
        self.set_tenant(None);
    }

    fn teardown(&mut self) {
        if let Some(joined) = self.joined.clone() {
            self.leave_group(&joined);
        }
        if let Some(mut transport) = self.transport.take() {
            transport.close();
            info!(
                tenant_id = ?self.tenant_id,
                connection_id = self.connection_id,
                "Transport closed"
            );
        }
        self.joined = None;
        self.state = ConnectionState::Disconnected;
    }

    /// Apply a transport report to the state machine
    pub fn handle_transport_event(&mut self, envelope: &TransportEnvelope) -> ConnectionChange {
        if envelope.connection_id != self.connection_id || self.transport.is_none() {
            debug!(
                connection_id = envelope.connection_id,
                current = self.connection_id,
                "Ignoring event from stale transport"
            );
            return ConnectionChange::Stale;
        }

        match &envelope.event {
            TransportEvent::Connected => {
                self.state = ConnectionState::Connected;
                self.generation += 1;
                info!(tenant_id = ?self.tenant_id, generation = self.generation, "Socket connected");
                if let Some(tenant) = self.tenant_id.clone() {
                    self.join_group(&tenant);
                }
                ConnectionChange::Connected {
                    generation: self.generation,
                }
            }
            TransportEvent::Disconnected { reason } => {
                warn!(tenant_id = ?self.tenant_id, reason = %reason, "Socket disconnected");
                self.mark_down()
            }
            TransportEvent::Error { message } => {
                error!(tenant_id = ?self.tenant_id, error = %message, "Socket connection error");
                self.mark_down()
            }
            TransportEvent::Message { .. } => {
                if self.is_connected() {
                    ConnectionChange::Message
                } else {
                    ConnectionChange::Unchanged
                }
            }
        }
    }

    fn mark_down(&mut self) -> ConnectionChange {
        let was_up = self.state == ConnectionState::Connected;
        self.state = ConnectionState::Disconnected;
        // Room membership dies with the socket on the server side
        self.joined = None;
        if was_up {
            ConnectionChange::Disconnected
        } else {
            ConnectionChange::Unchanged
        }
    }

    fn emit(&mut self, event: ControlEvent) -> bool {
        let Some(transport) = self.transport.as_mut() else {
            warn!(event = event.name(), "No transport, dropping control event");
            return false;
        };
        match transport.emit(&event) {
            Ok(()) => {
                debug!(event = event.name(), "Emitted control event");
                true
            }
            Err(e) => {
                warn!(event = event.name(), error = %e, "Failed to emit control event");
                false
            }
        }
    }

    /// Ask the server to add this session to a tenant room
    pub fn join_group(&mut self, tenant_id: &str) {
        if tenant_id.is_empty() {
            warn!("join_group called without a tenant id");
            return;
        }
        if !self.is_connected() {
            warn!(tenant_id = %tenant_id, "join_group called without a connection");
            return;
        }
        if self.emit(ControlEvent::JoinRoom {
            company_id: tenant_id.to_string(),
        }) {
            info!(tenant_id = %tenant_id, "Joined tenant room");
            self.joined = Some(tenant_id.to_string());
        }
    }

    /// Ask the server to remove this session from a tenant room
    pub fn leave_group(&mut self, tenant_id: &str) {
        if tenant_id.is_empty() {
            warn!("leave_group called without a tenant id");
            return;
        }
        if !self.is_connected() {
            warn!(tenant_id = %tenant_id, "leave_group called without a connection");
            return;
        }
        if self.emit(ControlEvent::LeaveRoom {
            company_id: tenant_id.to_string(),
        }) {
            info!(tenant_id = %tenant_id, "Left tenant room");
        }
        if self.joined.as_deref() == Some(tenant_id) {
            self.joined = None;
        }
    }

    /// Send a message to every session of a tenant
    pub fn send_to_tenant(&mut self, tenant_id: &str, message: Value) {
        if !self.is_connected() {
            warn!(tenant_id = %tenant_id, "Not connected, dropping tenant message");
            return;
        }
        if tenant_id.is_empty() || message.is_null() {
            warn!("send_to_tenant requires a tenant id and a message");
            return;
        }
        self.emit(ControlEvent::SendToCompany {
            company_id: tenant_id.to_string(),
            message,
        });
    }

    /// Send a message to every connected session
    pub fn broadcast(&mut self, message: Value) {
        if !self.is_connected() {
            warn!("Not connected, dropping broadcast");
            return;
        }
        if message.is_null() {
            warn!("broadcast requires a message");
            return;
        }
        self.emit(ControlEvent::SendToAll { message });
    }

    /// Turn agent-private mode on or off for a customer conversation
    pub fn set_privacy(&mut self, tenant_id: &str, customer_id: &str, on: bool) {
        if !self.is_connected() {
            warn!(customer_id = %customer_id, "Not connected, dropping privacy change");
            return;
        }
        if tenant_id.is_empty() || customer_id.is_empty() {
            warn!("set_privacy requires a tenant id and a customer id");
            return;
        }
        let company_id = tenant_id.to_string();
        let customer_id = customer_id.to_string();
        self.emit(if on {
            ControlEvent::IsPrivateOn {
                company_id,
                customer_id,
            }
        } else {
            ControlEvent::IsPrivateOff {
                company_id,
                customer_id,
            }
        });
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.teardown();
    }
}
