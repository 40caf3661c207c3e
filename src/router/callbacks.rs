//! Per-category callbacks registered on the router

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::types::{ChatAssignedData, CustomerAddedData, PrivateChatStartedData, TaskAssignedData};

pub type OnCustomerAdded = Arc<dyn Fn(&CustomerAddedData) + Send + Sync>;
pub type OnChatAssigned = Arc<dyn Fn(&ChatAssignedData) + Send + Sync>;
pub type OnTaskAssigned = Arc<dyn Fn(&TaskAssignedData) + Send + Sync>;
pub type OnPrivateChatStarted = Arc<dyn Fn(&PrivateChatStartedData) + Send + Sync>;
pub type OnPrivateStatusChange = Arc<dyn Fn(&str) + Send + Sync>;
pub type OnRawMessage = Arc<dyn Fn(&Value) + Send + Sync>;

/// Optional hooks invoked by the router after classification.
///
/// Category hooks only fire for events that were not suppressed.
#[derive(Clone, Default)]
pub struct RouterCallbacks {
    pub(crate) on_customer_added: Option<OnCustomerAdded>,
    pub(crate) on_chat_assigned: Option<OnChatAssigned>,
    pub(crate) on_task_assigned: Option<OnTaskAssigned>,
    pub(crate) on_private_chat_started: Option<OnPrivateChatStarted>,
    pub(crate) on_private_status_change: Option<OnPrivateStatusChange>,
    pub(crate) on_company_message: Option<OnRawMessage>,
    pub(crate) on_global_message: Option<OnRawMessage>,
}

impl fmt::Debug for RouterCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterCallbacks")
            .field("on_customer_added", &self.on_customer_added.is_some())
            .field("on_chat_assigned", &self.on_chat_assigned.is_some())
            .field("on_task_assigned", &self.on_task_assigned.is_some())
            .field("on_private_chat_started", &self.on_private_chat_started.is_some())
            .field("on_private_status_change", &self.on_private_status_change.is_some())
            .field("on_company_message", &self.on_company_message.is_some())
            .field("on_global_message", &self.on_global_message.is_some())
            .finish()
    }
}

impl RouterCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_customer_added(mut self, f: impl Fn(&CustomerAddedData) + Send + Sync + 'static) -> Self {
        self.on_customer_added = Some(Arc::new(f));
        self
    }

    pub fn on_chat_assigned(mut self, f: impl Fn(&ChatAssignedData) + Send + Sync + 'static) -> Self {
        self.on_chat_assigned = Some(Arc::new(f));
        self
    }

    pub fn on_task_assigned(mut self, f: impl Fn(&TaskAssignedData) + Send + Sync + 'static) -> Self {
        self.on_task_assigned = Some(Arc::new(f));
        self
    }

    pub fn on_private_chat_started(
        mut self,
        f: impl Fn(&PrivateChatStartedData) + Send + Sync + 'static,
    ) -> Self {
        self.on_private_chat_started = Some(Arc::new(f));
        self
    }

    /// Raw privacy status strings
    pub fn on_private_status_change(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_private_status_change = Some(Arc::new(f));
        self
    }

    /// Unclassified payloads from the tenant channel
    pub fn on_company_message(mut self, f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_company_message = Some(Arc::new(f));
        self
    }

    /// Unclassified payloads from the global channel
    pub fn on_global_message(mut self, f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_global_message = Some(Arc::new(f));
        self
    }
}
