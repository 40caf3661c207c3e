//! In-process transport
//!
//! Records every connect and control event and lets the caller inject
//! transport events through the sink handed to the last connect. Useful for
//! embedding the pipeline without a socket server and for tests.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{Connector, ControlEvent, EventSink, Transport, TransportEvent};
use crate::error::{NotifyError, NotifyResult};

#[derive(Default)]
struct LogInner {
    connects: Vec<String>,
    emitted: Vec<ControlEvent>,
    closed: usize,
    sinks: Vec<EventSink>,
}

/// Shared view of everything the memory transports did
#[derive(Clone, Default)]
pub struct MemoryLog {
    inner: Arc<Mutex<LogInner>>,
}

impl MemoryLog {
    /// Tenant ids passed to each connect, in order
    pub fn connects(&self) -> Vec<String> {
        self.inner.lock().connects.clone()
    }

    /// Control events emitted across all transports, in order
    pub fn emitted(&self) -> Vec<ControlEvent> {
        self.inner.lock().emitted.clone()
    }

    /// Number of transports closed
    pub fn closed(&self) -> usize {
        self.inner.lock().closed
    }

    /// Sink of the most recent connect
    pub fn last_sink(&self) -> Option<EventSink> {
        self.inner.lock().sinks.last().cloned()
    }

    /// Report an event as the most recent transport; false if none exists
    pub fn push(&self, event: TransportEvent) -> bool {
        match self.last_sink() {
            Some(sink) => sink.send(event),
            None => false,
        }
    }
}

/// Connector producing [`MemoryTransport`]s
pub struct MemoryConnector {
    log: MemoryLog,
    fail: bool,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self {
            log: MemoryLog::default(),
            fail: false,
        }
    }

    /// A connector whose every connect fails
    pub fn failing() -> Self {
        Self {
            log: MemoryLog::default(),
            fail: true,
        }
    }

    pub fn log(&self) -> MemoryLog {
        self.log.clone()
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for MemoryConnector {
    fn connect(&mut self, tenant_id: &str, sink: EventSink) -> NotifyResult<Box<dyn Transport>> {
        if self.fail {
            return Err(NotifyError::Transport("connection refused".to_string()));
        }
        let mut inner = self.log.inner.lock();
        inner.connects.push(tenant_id.to_string());
        inner.sinks.push(sink);
        Ok(Box::new(MemoryTransport {
            log: self.log.clone(),
            open: true,
        }))
    }
}

/// Transport that appends emitted events to a [`MemoryLog`]
pub struct MemoryTransport {
    log: MemoryLog,
    open: bool,
}

impl Transport for MemoryTransport {
    fn emit(&mut self, event: &ControlEvent) -> NotifyResult<()> {
        if !self.open {
            return Err(NotifyError::Transport("transport closed".to_string()));
        }
        self.log.inner.lock().emitted.push(event.clone());
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.log.inner.lock().closed += 1;
        }
    }
}
