//! Event Router
//!
//! Receives payloads from the tenant and global channels, classifies them
//! with [`inbound::decode`], drops events the viewer caused, writes the rest
//! into the [`NotificationStore`] and fires the matching callback.
//!
//! The router is attached to exactly one live connection generation at a
//! time. Payloads tagged with any other generation are ignored, so a
//! reconnect never leaves a second listener behind.

pub mod callbacks;
pub mod inbound;

pub use callbacks::RouterCallbacks;
pub use inbound::{decode, InboundEvent};

use serde_json::Value;
use tracing::{debug, info};

use crate::store::NotificationStore;
use crate::transport::InboundChannel;
use crate::types::{Category, Notification, SessionIdentity};

/// Why a category event was not shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The viewer triggered it
    SelfCaused,
    /// Addressed to a different user
    OtherRecipient,
}

/// What happened to one routed payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// No listener for this generation
    Detached,
    Suppressed(Category, SuppressReason),
    Notified(Category),
    PrivateStatus,
    Forwarded(InboundChannel),
}

pub struct EventRouter {
    session: Option<SessionIdentity>,
    store: NotificationStore,
    callbacks: RouterCallbacks,
    attached: Option<u64>,
}

impl EventRouter {
    pub fn new(store: NotificationStore, callbacks: RouterCallbacks) -> Self {
        Self {
            session: None,
            store,
            callbacks,
            attached: None,
        }
    }

    pub fn set_session(&mut self, session: Option<SessionIdentity>) {
        self.session = session;
    }

    /// Start listening on connection `generation`, replacing any older listener
    pub fn attach(&mut self, generation: u64) {
        if let Some(previous) = self.attached.replace(generation) {
            if previous != generation {
                debug!(previous, generation, "Replaced router listener");
            }
        } else {
            debug!(generation, "Router listener attached");
        }
    }

    pub fn detach(&mut self) {
        if let Some(generation) = self.attached.take() {
            debug!(generation, "Router listener detached");
        }
    }

    pub fn attached_generation(&self) -> Option<u64> {
        self.attached
    }

    /// Route one payload received on `channel` from connection `generation`
    pub fn route(&self, generation: u64, channel: InboundChannel, payload: Value) -> RouteOutcome {
        if self.attached != Some(generation) {
            debug!(generation, attached = ?self.attached, "Dropping payload for detached listener");
            return RouteOutcome::Detached;
        }

        match decode(payload) {
            InboundEvent::Notification(notification) => self.route_notification(notification),
            InboundEvent::PrivateStatusChange(raw) => {
                debug!(status = %raw, "Private status change");
                if let Some(cb) = &self.callbacks.on_private_status_change {
                    cb(&raw);
                }
                RouteOutcome::PrivateStatus
            }
            InboundEvent::Unknown(raw) => {
                let callback = match channel {
                    InboundChannel::Company => &self.callbacks.on_company_message,
                    InboundChannel::Global => &self.callbacks.on_global_message,
                };
                if let Some(cb) = callback {
                    cb(&raw);
                }
                RouteOutcome::Forwarded(channel)
            }
        }
    }

    fn suppress_reason(&self, notification: &Notification) -> Option<SuppressReason> {
        let session = self.session.as_ref()?;
        if session.is_self(notification.actor()) {
            return Some(SuppressReason::SelfCaused);
        }
        match notification.recipient().and_then(|r| r.user_id.as_deref()) {
            Some(recipient) if !recipient.is_empty() && recipient != session.user_id => {
                Some(SuppressReason::OtherRecipient)
            }
            _ => None,
        }
    }

    fn route_notification(&self, notification: Notification) -> RouteOutcome {
        let category = notification.category();

        if let Some(reason) = self.suppress_reason(&notification) {
            debug!(category = %category, reason = ?reason, "Suppressed notification");
            return RouteOutcome::Suppressed(category, reason);
        }

        info!(
            category = %category,
            actor = notification.actor().display_name(),
            sent_at = %notification.timestamp(),
            "Notification received"
        );

        match &notification {
            Notification::CustomerAdded(data) => {
                if let Some(cb) = &self.callbacks.on_customer_added {
                    cb(data);
                }
            }
            Notification::ChatAssigned(data) => {
                if let Some(cb) = &self.callbacks.on_chat_assigned {
                    cb(data);
                }
            }
            Notification::TaskAssigned(data) => {
                if let Some(cb) = &self.callbacks.on_task_assigned {
                    cb(data);
                }
            }
            Notification::PrivateChatStarted(data) => {
                if let Some(cb) = &self.callbacks.on_private_chat_started {
                    cb(data);
                }
            }
        }

        self.store.show(notification);
        RouteOutcome::Notified(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn customer_added(actor_id: &str) -> Value {
        json!({
            "type": "new customer add",
            "customerId": "c1",
            "content": "new customer added of name Acme Corp",
            "addedBy": {"userId": actor_id, "userName": "Jane"}
        })
    }

    fn router_with(callbacks: RouterCallbacks) -> (EventRouter, NotificationStore) {
        let store = NotificationStore::new();
        let mut router = EventRouter::new(store.clone(), callbacks);
        router.set_session(Some(SessionIdentity::new("u1", "t1")));
        router.attach(1);
        (router, store)
    }

    #[test]
    fn test_other_users_customer_is_shown() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let (router, store) = router_with(RouterCallbacks::new().on_customer_added(move |data| {
            assert_eq!(data.customer_name, "Acme Corp");
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let outcome = router.route(1, InboundChannel::Company, customer_added("u2"));
        assert_eq!(outcome, RouteOutcome::Notified(Category::CustomerAdded));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let slot = store.customer_added();
        assert!(slot.is_visible);
        assert_eq!(slot.data.unwrap().customer_id, "c1");
    }

    #[test]
    fn test_own_customer_is_suppressed() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let (router, store) = router_with(RouterCallbacks::new().on_customer_added(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let outcome = router.route(1, InboundChannel::Company, customer_added("u1"));
        assert_eq!(
            outcome,
            RouteOutcome::Suppressed(Category::CustomerAdded, SuppressReason::SelfCaused)
        );
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!store.customer_added().is_visible);
    }

    #[test]
    fn test_own_customer_with_malformed_name_is_suppressed() {
        let (router, store) = router_with(RouterCallbacks::new());
        let payload = json!({
            "type": "new customer add",
            "customerId": "c1",
            "content": "new customer added of name Acme Corp",
            "addedBy": {"userId": "u1", "userName": 7}
        });
        assert_eq!(
            router.route(1, InboundChannel::Company, payload),
            RouteOutcome::Suppressed(Category::CustomerAdded, SuppressReason::SelfCaused)
        );
        assert!(!store.customer_added().is_visible);
    }

    #[test]
    fn test_unknown_actor_is_shown() {
        let (router, store) = router_with(RouterCallbacks::new());
        let payload = json!({"type": "new customer add", "customerId": "c1", "content": "x"});
        router.route(1, InboundChannel::Company, payload);
        assert!(store.customer_added().is_visible);
    }

    #[test]
    fn test_assignment_for_someone_else_is_suppressed() {
        let (router, store) = router_with(RouterCallbacks::new());
        let payload = json!({
            "type": "chat assigned",
            "customerId": "c1",
            "assignedBy": {"userId": "u2"},
            "assignedTo": {"userId": "u3"}
        });
        assert_eq!(
            router.route(1, InboundChannel::Company, payload),
            RouteOutcome::Suppressed(Category::ChatAssigned, SuppressReason::OtherRecipient)
        );
        assert!(!store.chat_assigned().is_visible);
    }

    #[test]
    fn test_private_status_goes_to_callback() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let (router, _store) = router_with(
            RouterCallbacks::new().on_private_status_change(move |raw| sink.lock().push(raw.to_string())),
        );

        let outcome = router.route(1, InboundChannel::Company, json!("c1 isPrivate on"));
        assert_eq!(outcome, RouteOutcome::PrivateStatus);
        assert_eq!(*seen.lock(), vec!["c1 isPrivate on".to_string()]);
    }

    #[test]
    fn test_unknown_payload_forwarded_per_channel() {
        let company = Arc::new(AtomicUsize::new(0));
        let global = Arc::new(AtomicUsize::new(0));
        let (c, g) = (company.clone(), global.clone());
        let (router, store) = router_with(
            RouterCallbacks::new()
                .on_company_message(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .on_global_message(move |_| {
                    g.fetch_add(1, Ordering::SeqCst);
                }),
        );

        router.route(1, InboundChannel::Company, json!({"type": "new message"}));
        router.route(1, InboundChannel::Global, json!("maintenance at 9pm"));
        router.route(1, InboundChannel::Global, json!(42));

        assert_eq!(company.load(Ordering::SeqCst), 1);
        assert_eq!(global.load(Ordering::SeqCst), 2);
        assert!(store.visible().is_empty());
    }

    #[test]
    fn test_detached_generation_is_ignored() {
        let (mut router, store) = router_with(RouterCallbacks::new());
        assert_eq!(
            router.route(0, InboundChannel::Company, customer_added("u2")),
            RouteOutcome::Detached
        );

        router.attach(2);
        assert_eq!(
            router.route(1, InboundChannel::Company, customer_added("u2")),
            RouteOutcome::Detached
        );
        router.detach();
        assert_eq!(
            router.route(2, InboundChannel::Company, customer_added("u2")),
            RouteOutcome::Detached
        );
        assert!(!store.customer_added().is_visible);
    }
}
