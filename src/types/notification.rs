//! Notification categories and their payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::Actor;

/// The four kinds of notification a session can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    CustomerAdded,
    ChatAssigned,
    TaskAssigned,
    PrivateChatStarted,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 4] = [
        Category::CustomerAdded,
        Category::ChatAssigned,
        Category::TaskAssigned,
        Category::PrivateChatStarted,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::CustomerAdded => write!(f, "customer_added"),
            Category::ChatAssigned => write!(f, "chat_assigned"),
            Category::TaskAssigned => write!(f, "task_assigned"),
            Category::PrivateChatStarted => write!(f, "private_chat_started"),
        }
    }
}

/// A new customer was added by a team member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddedData {
    pub customer_id: String,
    pub customer_name: String,
    pub added_by: Actor,
    pub timestamp: DateTime<Utc>,
}

/// A customer conversation was assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAssignedData {
    pub customer_id: String,
    pub customer_name: String,
    pub assigned_by: Actor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Actor>,
    pub timestamp: DateTime<Utc>,
}

/// A task was assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignedData {
    pub task_id: String,
    pub task_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub assigned_by: Actor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Actor>,
    pub timestamp: DateTime<Utc>,
}

/// An agent took a customer conversation private
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateChatStartedData {
    pub customer_id: String,
    pub customer_name: String,
    pub started_by: Actor,
    pub timestamp: DateTime<Utc>,
}

/// A notification of any category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "data", rename_all = "camelCase")]
pub enum Notification {
    CustomerAdded(CustomerAddedData),
    ChatAssigned(ChatAssignedData),
    TaskAssigned(TaskAssignedData),
    PrivateChatStarted(PrivateChatStartedData),
}

impl Notification {
    pub fn category(&self) -> Category {
        match self {
            Notification::CustomerAdded(_) => Category::CustomerAdded,
            Notification::ChatAssigned(_) => Category::ChatAssigned,
            Notification::TaskAssigned(_) => Category::TaskAssigned,
            Notification::PrivateChatStarted(_) => Category::PrivateChatStarted,
        }
    }

    /// The user who caused the notification
    pub fn actor(&self) -> &Actor {
        match self {
            Notification::CustomerAdded(d) => &d.added_by,
            Notification::ChatAssigned(d) => &d.assigned_by,
            Notification::TaskAssigned(d) => &d.assigned_by,
            Notification::PrivateChatStarted(d) => &d.started_by,
        }
    }

    /// The user the notification is addressed to, if the server named one
    pub fn recipient(&self) -> Option<&Actor> {
        match self {
            Notification::ChatAssigned(d) => d.assigned_to.as_ref(),
            Notification::TaskAssigned(d) => d.assigned_to.as_ref(),
            _ => None,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Notification::CustomerAdded(d) => d.timestamp,
            Notification::ChatAssigned(d) => d.timestamp,
            Notification::TaskAssigned(d) => d.timestamp,
            Notification::PrivateChatStarted(d) => d.timestamp,
        }
    }
}

/// Visible state of one notification slot
#[derive(Debug, Clone, PartialEq)]
pub struct PendingNotification<T> {
    pub is_visible: bool,
    pub data: Option<T>,
}

impl<T> PendingNotification<T> {
    pub fn hidden() -> Self {
        Self {
            is_visible: false,
            data: None,
        }
    }

    pub fn visible(data: T) -> Self {
        Self {
            is_visible: true,
            data: Some(data),
        }
    }
}

impl<T> Default for PendingNotification<T> {
    fn default() -> Self {
        Self::hidden()
    }
}
