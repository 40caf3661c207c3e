//! Notification client
//!
//! Wires the pipeline together:
//!
//! ```text
//! transport --envelope--> ConnectionManager --Message--> EventRouter
//!                                                           |
//!                                         NotificationStore <+
//!                                                |
//!                                     StoreEvent v
//!                                         PresenterHost --View--> Navigator
//! ```
//!
//! The client is driven either by [`NotificationClient::run`] or, when
//! embedded in another loop, by feeding envelopes to
//! [`NotificationClient::handle`].

use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::presenter::{Action, Navigation, Navigator, Overlay, PresenterHost};
use crate::router::{EventRouter, RouteOutcome, RouterCallbacks};
use crate::store::{NotificationStore, StoreEvent};
use crate::transport::{
    ConnectionChange, ConnectionManager, ConnectionState, Connector, TransportEnvelope,
    TransportEvent,
};
use crate::types::{Category, SessionIdentity};

pub struct NotificationClient {
    manager: ConnectionManager,
    router: EventRouter,
    store: NotificationStore,
    presenter: PresenterHost,
    events_rx: mpsc::UnboundedReceiver<TransportEnvelope>,
    store_events: BroadcastStream<StoreEvent>,
}

impl NotificationClient {
    pub fn new(
        config: &Config,
        connector: Box<dyn Connector>,
        navigator: Arc<dyn Navigator>,
        callbacks: RouterCallbacks,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let store = NotificationStore::new();
        let store_events = BroadcastStream::new(store.subscribe());

        Self {
            manager: ConnectionManager::new(connector, events_tx),
            router: EventRouter::new(store.clone(), callbacks),
            presenter: PresenterHost::new(store.clone(), navigator, config.dismiss_after),
            store,
            events_rx,
            store_events,
        }
    }

    /// Login, logout or tenant switch.
    ///
    /// A new tenant closes the old connection (leaving its room) and opens
    /// one for the new tenant. Pending notifications belong to the old
    /// session and are cleared.
    pub fn set_session(&mut self, session: Option<SessionIdentity>) {
        let tenant = session.as_ref().map(|s| s.tenant_id.clone());
        let tenant_changed = tenant.as_deref() != self.manager.tenant_id();

        match &session {
            Some(identity) => info!(user_id = %identity.user_id, tenant_id = %identity.tenant_id, "Session set"),
            None => info!("Session cleared"),
        }
        self.router.set_session(session);

        if tenant_changed {
            self.router.detach();
            self.presenter.reset();
        }
        self.manager.set_tenant(tenant.as_deref());
        self.sync_presenter();
    }

    /// Apply one transport report
    pub fn handle(&mut self, envelope: TransportEnvelope) -> ConnectionChange {
        let change = self.manager.handle_transport_event(&envelope);

        match &change {
            ConnectionChange::Connected { generation } => self.router.attach(*generation),
            ConnectionChange::Disconnected => self.router.detach(),
            ConnectionChange::Message => {
                if let TransportEvent::Message { channel, payload } = envelope.event {
                    let outcome = self.router.route(self.manager.generation(), channel, payload);
                    if let RouteOutcome::Suppressed(category, reason) = outcome {
                        debug!(category = %category, reason = ?reason, "Event not shown");
                    }
                }
            }
            ConnectionChange::Stale | ConnectionChange::Unchanged => {}
        }

        self.sync_presenter();
        change
    }

    /// Handle every envelope already queued; returns how many were handled
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.events_rx.try_recv() {
            self.handle(envelope);
            handled += 1;
        }
        self.sync_presenter();
        handled
    }

    /// Feed store changes that are already published to the presenter
    fn sync_presenter(&mut self) {
        while let Some(Some(item)) = self.store_events.next().now_or_never() {
            self.on_store_item(item);
        }
    }

    fn on_store_item(&mut self, item: Result<StoreEvent, BroadcastStreamRecvError>) {
        match item {
            Ok(event) => self.presenter.on_store_event(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "Presenter lagged behind the store, resyncing");
                for category in Category::ALL {
                    let event = if self.store.is_visible(category) {
                        StoreEvent::Shown {
                            category,
                            epoch: self.store.epoch(category),
                        }
                    } else {
                        StoreEvent::Hidden { category }
                    };
                    self.presenter.on_store_event(event);
                }
            }
        }
    }

    /// Drive the client until `shutdown` fires or every transport is gone
    pub async fn run(&mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                envelope = self.events_rx.recv() => match envelope {
                    Some(envelope) => {
                        self.handle(envelope);
                    }
                    None => break,
                },
                Some(item) = self.store_events.next() => self.on_store_item(item),
            }
        }
        self.shutdown();
    }

    /// Leave the tenant room and close the transport
    pub fn shutdown(&mut self) {
        self.router.detach();
        self.manager.disconnect();
        self.sync_presenter();
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn presenter(&self) -> &PresenterHost {
        &self.presenter
    }

    pub fn overlays(&self) -> Vec<Overlay> {
        self.presenter.overlays()
    }

    pub fn dismiss(&mut self, category: Category) -> bool {
        let hidden = self.presenter.dismiss(category);
        self.sync_presenter();
        hidden
    }

    pub fn view(&mut self, category: Category) -> Option<Navigation> {
        let navigation = self.presenter.view(category);
        self.sync_presenter();
        navigation
    }

    pub fn act(&mut self, category: Category, action: Action) {
        self.presenter.act(category, action);
        self.sync_presenter();
    }

    /// Send to every session of the current tenant
    pub fn send_to_tenant(&mut self, message: Value) {
        match self.manager.tenant_id().map(str::to_string) {
            Some(tenant) => self.manager.send_to_tenant(&tenant, message),
            None => warn!("No tenant, dropping tenant message"),
        }
    }

    pub fn broadcast(&mut self, message: Value) {
        self.manager.broadcast(message);
    }

    /// Toggle agent-private mode for a customer of the current tenant
    pub fn set_privacy(&mut self, customer_id: &str, on: bool) {
        match self.manager.tenant_id().map(str::to_string) {
            Some(tenant) => self.manager.set_privacy(&tenant, customer_id, on),
            None => warn!(customer_id = %customer_id, "No tenant, dropping privacy change"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::RecordingNavigator;
    use crate::transport::memory::{MemoryConnector, MemoryLog};
    use crate::transport::{ControlEvent, InboundChannel};
    use crate::types::{Actor, CustomerAddedData, Notification};
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;

    fn client() -> (NotificationClient, MemoryLog, Arc<RecordingNavigator>) {
        let connector = MemoryConnector::new();
        let log = connector.log();
        let navigator = Arc::new(RecordingNavigator::new("/dashboard"));
        let client = NotificationClient::new(
            &Config::default(),
            Box::new(connector),
            navigator.clone(),
            RouterCallbacks::new(),
        );
        (client, log, navigator)
    }

    fn task_payload(actor: &str) -> Value {
        json!({
            "type": "task assigned",
            "taskId": "t1",
            "taskName": "Call back",
            "assignedBy": {"userId": actor, "userName": "Jane"}
        })
    }

    #[tokio::test]
    async fn test_message_reaches_presenter() {
        let (mut client, log, _nav) = client();
        client.set_session(Some(SessionIdentity::new("u1", "c1")));
        log.push(TransportEvent::Connected);
        log.push(TransportEvent::Message {
            channel: InboundChannel::Company,
            payload: task_payload("u2"),
        });
        assert_eq!(client.pump(), 2);

        assert_eq!(client.state(), ConnectionState::Connected);
        let overlays = client.overlays();
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].category, Category::TaskAssigned);
        assert!(client.presenter().timers().is_armed(Category::TaskAssigned));
    }

    #[tokio::test]
    async fn test_logout_clears_and_leaves() {
        let (mut client, log, _nav) = client();
        client.set_session(Some(SessionIdentity::new("u1", "c1")));
        log.push(TransportEvent::Connected);
        log.push(TransportEvent::Message {
            channel: InboundChannel::Company,
            payload: task_payload("u2"),
        });
        client.pump();

        client.set_session(None);
        assert!(client.overlays().is_empty());
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(
            log.emitted().last(),
            Some(&ControlEvent::LeaveRoom {
                company_id: "c1".to_string()
            })
        );
        assert_eq!(log.closed(), 1);
    }

    #[tokio::test]
    async fn test_send_helpers_use_current_tenant() {
        let (mut client, log, _nav) = client();
        client.send_to_tenant(json!("nobody home"));
        assert!(log.emitted().is_empty());

        client.set_session(Some(SessionIdentity::new("u1", "c1")));
        log.push(TransportEvent::Connected);
        client.pump();
        client.send_to_tenant(json!({"text": "hi"}));
        client.set_privacy("cust9", true);

        let emitted = log.emitted();
        assert_eq!(
            emitted[1],
            ControlEvent::SendToCompany {
                company_id: "c1".to_string(),
                message: json!({"text": "hi"})
            }
        );
        assert_eq!(
            emitted[2],
            ControlEvent::IsPrivateOn {
                company_id: "c1".to_string(),
                customer_id: "cust9".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_lag_resync_keeps_timer_deadline() {
        let (mut client, log, _nav) = client();
        client.set_session(Some(SessionIdentity::new("u1", "c1")));
        log.push(TransportEvent::Connected);
        log.push(TransportEvent::Message {
            channel: InboundChannel::Company,
            payload: task_payload("u2"),
        });
        client.pump();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        tokio::time::advance(Duration::from_secs(20)).await;

        // Overflow the presenter's feed with another category
        for i in 0..100 {
            client.store().show(Notification::CustomerAdded(CustomerAddedData {
                customer_id: format!("c{}", i),
                customer_name: "Acme".to_string(),
                added_by: Actor::new("u2", "Jane"),
                timestamp: Utc::now(),
            }));
        }
        client.pump();

        tokio::time::advance(Duration::from_secs(10)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert!(!client.store().is_visible(Category::TaskAssigned));
        assert!(client.store().is_visible(Category::CustomerAdded));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (mut client, log, _nav) = client();
        client.set_session(Some(SessionIdentity::new("u1", "c1")));
        log.push(TransportEvent::Connected);

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        client.run(shutdown).await;

        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(log.closed(), 1);
    }
}
