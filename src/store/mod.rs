//! Notification Store
//!
//! Four independent slots, one per [`Category`]. `show` overwrites the slot
//! (last write wins, nothing is queued); `hide` resets it. Every `show`
//! bumps the slot's epoch so a delayed hide can tell whether the
//! notification it was scheduled for is still the one on screen.
//!
//! Changes are published on a broadcast feed for the presenter.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::types::{
    Category, ChatAssignedData, CustomerAddedData, Notification, PendingNotification,
    PrivateChatStartedData, TaskAssignedData,
};

/// Buffered store events before slow subscribers start lagging
const EVENT_CAPACITY: usize = 64;

/// Change published by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Shown { category: Category, epoch: u64 },
    Hidden { category: Category },
}

#[derive(Debug)]
struct Slot<T> {
    pending: PendingNotification<T>,
    epoch: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            pending: PendingNotification::hidden(),
            epoch: 0,
        }
    }
}

impl<T: Clone> Slot<T> {
    fn show(&mut self, data: T) -> u64 {
        self.epoch += 1;
        self.pending = PendingNotification::visible(data);
        self.epoch
    }

    fn hide(&mut self) -> bool {
        let was_visible = self.pending.is_visible;
        self.pending = PendingNotification::hidden();
        was_visible
    }

    fn snapshot(&self) -> PendingNotification<T> {
        self.pending.clone()
    }
}

#[derive(Debug, Default)]
struct Slots {
    customer_added: Slot<CustomerAddedData>,
    chat_assigned: Slot<ChatAssignedData>,
    task_assigned: Slot<TaskAssignedData>,
    private_chat_started: Slot<PrivateChatStartedData>,
}

impl Slots {
    fn epoch(&self, category: Category) -> u64 {
        match category {
            Category::CustomerAdded => self.customer_added.epoch,
            Category::ChatAssigned => self.chat_assigned.epoch,
            Category::TaskAssigned => self.task_assigned.epoch,
            Category::PrivateChatStarted => self.private_chat_started.epoch,
        }
    }

    fn hide(&mut self, category: Category) -> bool {
        match category {
            Category::CustomerAdded => self.customer_added.hide(),
            Category::ChatAssigned => self.chat_assigned.hide(),
            Category::TaskAssigned => self.task_assigned.hide(),
            Category::PrivateChatStarted => self.private_chat_started.hide(),
        }
    }

    fn get(&self, category: Category) -> Option<Notification> {
        match category {
            Category::CustomerAdded => self.customer_added.pending.data.clone().map(Notification::CustomerAdded),
            Category::ChatAssigned => self.chat_assigned.pending.data.clone().map(Notification::ChatAssigned),
            Category::TaskAssigned => self.task_assigned.pending.data.clone().map(Notification::TaskAssigned),
            Category::PrivateChatStarted => self
                .private_chat_started
                .pending
                .data
                .clone()
                .map(Notification::PrivateChatStarted),
        }
    }
}

/// Shared handle to the four notification slots
#[derive(Clone)]
pub struct NotificationStore {
    slots: Arc<Mutex<Slots>>,
    events: broadcast::Sender<StoreEvent>,
}

impl NotificationStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            slots: Arc::new(Mutex::new(Slots::default())),
            events,
        }
    }

    /// Receive every show/hide from now on
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Make `notification` the pending one for its category; returns the new epoch
    pub fn show(&self, notification: Notification) -> u64 {
        let category = notification.category();
        let epoch = {
            let mut slots = self.slots.lock();
            match notification {
                Notification::CustomerAdded(data) => slots.customer_added.show(data),
                Notification::ChatAssigned(data) => slots.chat_assigned.show(data),
                Notification::TaskAssigned(data) => slots.task_assigned.show(data),
                Notification::PrivateChatStarted(data) => slots.private_chat_started.show(data),
            }
        };
        debug!(category = %category, epoch, "Notification shown");
        self.publish(StoreEvent::Shown { category, epoch });
        epoch
    }

    /// Clear a slot. Hiding an empty slot does nothing and returns false.
    pub fn hide(&self, category: Category) -> bool {
        let was_visible = self.slots.lock().hide(category);
        if was_visible {
            debug!(category = %category, "Notification hidden");
            self.publish(StoreEvent::Hidden { category });
        }
        was_visible
    }

    /// Clear a slot only if it still holds the notification shown at `epoch`
    pub fn hide_if_current(&self, category: Category, epoch: u64) -> bool {
        let was_visible = {
            let mut slots = self.slots.lock();
            if slots.epoch(category) != epoch {
                debug!(category = %category, epoch, "Skipping hide for superseded notification");
                return false;
            }
            slots.hide(category)
        };
        if was_visible {
            self.publish(StoreEvent::Hidden { category });
        }
        was_visible
    }

    /// Epoch of the latest `show` for a category (0 if never shown)
    pub fn epoch(&self, category: Category) -> u64 {
        self.slots.lock().epoch(category)
    }

    pub fn get(&self, category: Category) -> Option<Notification> {
        self.slots.lock().get(category)
    }

    pub fn is_visible(&self, category: Category) -> bool {
        self.get(category).is_some()
    }

    /// All visible notifications in category order
    pub fn visible(&self) -> Vec<Notification> {
        let slots = self.slots.lock();
        Category::ALL.iter().filter_map(|c| slots.get(*c)).collect()
    }

    pub fn customer_added(&self) -> PendingNotification<CustomerAddedData> {
        self.slots.lock().customer_added.snapshot()
    }

    pub fn chat_assigned(&self) -> PendingNotification<ChatAssignedData> {
        self.slots.lock().chat_assigned.snapshot()
    }

    pub fn task_assigned(&self) -> PendingNotification<TaskAssignedData> {
        self.slots.lock().task_assigned.snapshot()
    }

    pub fn private_chat_started(&self) -> PendingNotification<PrivateChatStartedData> {
        self.slots.lock().private_chat_started.snapshot()
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}
