//! socket.io client transport over `tokio-tungstenite`
//!
//! Each [`WsTransport`] runs one background task that:
//! 1. Opens the websocket and completes the Engine.IO / Socket.IO handshake
//! 2. Answers engine pings and drops the socket when they stop coming
//! 3. Forwards `companyMessage` / `message` events to the [`EventSink`]
//! 4. Writes queued control events
//! 5. Reconnects with exponential backoff until closed

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::codec::{self, EnginePacket, SocketPacket};
use super::{Connector, ControlEvent, EventSink, InboundChannel, Transport, TransportEvent};
use crate::config::ReconnectPolicy;
use crate::error::{NotifyError, NotifyResult};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens [`WsTransport`]s against one socket server
#[derive(Debug, Clone)]
pub struct WsConnector {
    base_url: String,
    token: Option<String>,
    policy: ReconnectPolicy,
}

impl WsConnector {
    pub fn new(base_url: impl Into<String>, token: Option<String>, policy: ReconnectPolicy) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            policy,
        }
    }
}

impl Connector for WsConnector {
    fn connect(&mut self, tenant_id: &str, sink: EventSink) -> NotifyResult<Box<dyn Transport>> {
        let url = codec::endpoint_url(&self.base_url, self.token.as_deref())?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| NotifyError::Transport("no tokio runtime available".to_string()))?;

        let auth = self.token.as_ref().map(|t| json!({ "token": t }));
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let connected = Arc::new(AtomicBool::new(false));

        debug!(tenant_id = %tenant_id, url = %url, "Spawning socket task");
        let task = runtime.spawn(run_socket(
            url,
            auth,
            self.policy.clone(),
            sink,
            out_rx,
            connected.clone(),
            cancel.clone(),
        ));

        Ok(Box::new(WsTransport {
            out_tx,
            connected,
            cancel,
            _task: task,
        }))
    }
}

/// Handle to a running socket task
pub struct WsTransport {
    out_tx: mpsc::UnboundedSender<String>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl Transport for WsTransport {
    fn emit(&mut self, event: &ControlEvent) -> NotifyResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("socket is not connected".to_string()));
        }
        self.out_tx
            .send(codec::encode_event(event.name(), &event.payload()))
            .map_err(|_| NotifyError::Transport("socket task has stopped".to_string()))
    }

    fn close(&mut self) {
        self.cancel.cancel();
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// How a single socket session ended
enum SessionEnd {
    Cancelled,
    Closed { reason: String, established: bool },
}

async fn run_socket(
    url: String,
    auth: Option<Value>,
    policy: ReconnectPolicy,
    sink: EventSink,
    mut out_rx: mpsc::UnboundedReceiver<String>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    let mut failures: u32 = 0;

    loop {
        let attempt = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connect_async(url.as_str()) => result,
        };

        match attempt {
            Ok((socket, _response)) => {
                debug!(connection_id = sink.connection_id(), "Websocket open");
                match drive_session(socket, auth.as_ref(), &sink, &mut out_rx, &connected, &cancel).await {
                    SessionEnd::Cancelled => break,
                    SessionEnd::Closed { reason, established } => {
                        connected.store(false, Ordering::SeqCst);
                        if established {
                            failures = 0;
                            sink.send(TransportEvent::Disconnected { reason });
                        } else {
                            sink.send(TransportEvent::Error { message: reason });
                        }
                    }
                }
            }
            Err(e) => {
                sink.send(TransportEvent::Error {
                    message: e.to_string(),
                });
            }
        }

        failures += 1;
        if !policy.allows(failures) {
            warn!(failures, "Giving up on socket reconnects");
            sink.send(TransportEvent::Disconnected {
                reason: "reconnect attempts exhausted".to_string(),
            });
            break;
        }

        let delay = policy.delay_for(failures - 1);
        debug!(delay_ms = delay.as_millis() as u64, failures, "Reconnecting after delay");
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    connected.store(false, Ordering::SeqCst);
    debug!(connection_id = sink.connection_id(), "Socket task stopped");
}

async fn drive_session(
    socket: Socket,
    auth: Option<&Value>,
    sink: &EventSink,
    out_rx: &mut mpsc::UnboundedReceiver<String>,
    connected: &AtomicBool,
    cancel: &CancellationToken,
) -> SessionEnd {
    let (mut write, mut read) = socket.split();
    let mut established = false;

    // Anything queued for a previous socket is dropped, delivery is at-most-once
    while out_rx.try_recv().is_ok() {}

    let closed = |reason: String, established: bool| SessionEnd::Closed { reason, established };

    // Server must ping within pingInterval + pingTimeout, armed by the handshake
    let mut liveness: Option<Duration> = None;
    let ping_deadline = tokio::time::sleep(Duration::ZERO);
    tokio::pin!(ping_deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                if established {
                    // Control events queued before the close, such as leaveRoom, still go out
                    while let Ok(text) = out_rx.try_recv() {
                        if write.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    let _ = write.send(Message::Text(codec::encode_disconnect())).await;
                }
                let _ = write.close().await;
                return SessionEnd::Cancelled;
            }

            _ = &mut ping_deadline, if liveness.is_some() => {
                warn!(connection_id = sink.connection_id(), "No ping from server, dropping socket");
                return closed("ping timeout".to_string(), established);
            }

            outbound = out_rx.recv(), if established => {
                match outbound {
                    Some(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            return closed(e.to_string(), established);
                        }
                    }
                    None => return SessionEnd::Cancelled,
                }
            }

            frame = read.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                        continue;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return closed("socket closed by server".to_string(), established);
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return closed(e.to_string(), established),
                };

                let packet = match codec::decode(&text) {
                    Ok(packet) => packet,
                    Err(e) => {
                        warn!(error = %e, "Dropping undecodable frame");
                        continue;
                    }
                };

                match packet {
                    EnginePacket::Open(handshake) => {
                        debug!(sid = %handshake.sid, ping_interval = handshake.ping_interval, "Engine handshake");
                        let window = Duration::from_millis(handshake.ping_interval.saturating_add(handshake.ping_timeout));
                        if !window.is_zero() {
                            liveness = Some(window);
                            ping_deadline.as_mut().reset(Instant::now() + window);
                        }
                        if let Err(e) = write.send(Message::Text(codec::encode_connect(auth))).await {
                            return closed(e.to_string(), established);
                        }
                    }
                    EnginePacket::Ping(data) => {
                        if let Some(window) = liveness {
                            ping_deadline.as_mut().reset(Instant::now() + window);
                        }
                        if let Err(e) = write.send(Message::Text(codec::encode_pong(&data))).await {
                            return closed(e.to_string(), established);
                        }
                    }
                    EnginePacket::Close => {
                        return closed("engine close".to_string(), established);
                    }
                    EnginePacket::Message(SocketPacket::Connect(_)) => {
                        established = true;
                        connected.store(true, Ordering::SeqCst);
                        info!(connection_id = sink.connection_id(), "Socket namespace connected");
                        sink.send(TransportEvent::Connected);
                    }
                    EnginePacket::Message(SocketPacket::ConnectError(detail)) => {
                        return closed(format!("connect rejected: {}", detail), established);
                    }
                    EnginePacket::Message(SocketPacket::Disconnect) => {
                        return closed("server disconnected namespace".to_string(), established);
                    }
                    EnginePacket::Message(SocketPacket::Event { name, args, .. }) => {
                        match InboundChannel::from_event_name(&name) {
                            Some(channel) => {
                                let payload = args.into_iter().next().unwrap_or(Value::Null);
                                sink.send(TransportEvent::Message { channel, payload });
                            }
                            None => debug!(event = %name, "Ignoring unsubscribed event"),
                        }
                    }
                    EnginePacket::Message(SocketPacket::Ack { .. })
                    | EnginePacket::Pong(_)
                    | EnginePacket::Upgrade
                    | EnginePacket::Noop => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_requires_runtime() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut connector = WsConnector::new("http://127.0.0.1:1", None, ReconnectPolicy::default());
        let result = connector.connect("c1", EventSink::new(1, tx));
        assert!(matches!(result, Err(NotifyError::Transport(_))));
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut connector = WsConnector::new("ftp://nowhere", None, ReconnectPolicy::default());
        assert!(matches!(
            connector.connect("c1", EventSink::new(1, tx)),
            Err(NotifyError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_emit_before_connect_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let policy = ReconnectPolicy {
            max_attempts: 1,
            ..ReconnectPolicy::default()
        };
        let mut connector = WsConnector::new("http://127.0.0.1:1", None, policy);
        let mut transport = connector.connect("c1", EventSink::new(1, tx)).unwrap();

        let result = transport.emit(&ControlEvent::JoinRoom {
            company_id: "c1".to_string(),
        });
        assert!(result.is_err());
        transport.close();
    }
}
