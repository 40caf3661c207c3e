//! Notification Presenter
//!
//! Turns pending notifications into [`Overlay`] view-models and carries out
//! the user's Dismiss / View choice.
//!
//! - one [`NotificationView`] per category decides title, message,
//!   destination and blocking mode
//! - [`PresenterHost`] watches the store, owns the auto-dismiss timers and
//!   performs navigation
//! - [`Navigator`] is the seam to whatever shows screens

mod chat_assigned;
mod customer_added;
mod host;
mod private_chat;
mod task_assigned;
pub mod timer;

pub use chat_assigned::ChatAssignedView;
pub use customer_added::CustomerAddedView;
pub use host::PresenterHost;
pub use private_chat::PrivateChatView;
pub use task_assigned::TaskAssignedView;
pub use timer::DismissTimers;

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::types::{Category, Notification};

pub const CUSTOMERS_PATH: &str = "/customers";
pub const CHATS_PATH: &str = "/chats";
pub const TASKS_PATH: &str = "/tasks";

/// How an overlay occupies the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayMode {
    /// Full-screen, blocks the page until acted on or timed out
    Modal,
    /// Non-blocking confirmation inside the current page
    Inline,
}

/// A user choice on an overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Dismiss,
    View,
}

/// A screen change, with optional state for the destination to pre-select an entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Navigation {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

impl Navigation {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: None,
        }
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }
}

/// Rendered notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub category: Category,
    pub mode: OverlayMode,
    pub title: String,
    pub message: String,
    pub actions: Vec<Action>,
    /// `None` when the overlay stays until the user acts
    #[serde(skip)]
    pub auto_dismiss: Option<Duration>,
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            OverlayMode::Modal => "modal",
            OverlayMode::Inline => "inline",
        };
        write!(f, "[{}] {}: {}", mode, self.title, self.message)
    }
}

/// Screen navigation used by View actions
pub trait Navigator: Send + Sync {
    /// Path of the screen the user is on
    fn current_path(&self) -> String;

    fn navigate(&self, navigation: Navigation);
}

/// Navigator that tracks the current path and remembers every navigation
pub struct RecordingNavigator {
    current: Mutex<String>,
    history: Mutex<Vec<Navigation>>,
}

impl RecordingNavigator {
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(initial_path.into()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Move to a path without recording it as a View navigation
    pub fn set_path(&self, path: impl Into<String>) {
        *self.current.lock() = path.into();
    }

    pub fn history(&self) -> Vec<Navigation> {
        self.history.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current.lock().clone()
    }

    fn navigate(&self, navigation: Navigation) {
        info!(path = %navigation.path, state = ?navigation.state, "Navigating");
        *self.current.lock() = navigation.path.clone();
        self.history.lock().push(navigation);
    }
}

/// Presentation rules for one category
pub trait NotificationView {
    type Data;

    const CATEGORY: Category;

    fn title(&self) -> &'static str;

    fn message(&self, data: &Self::Data) -> String;

    /// Where View takes the user
    fn destination(&self, data: &Self::Data) -> Navigation;

    fn mode(&self, _data: &Self::Data, _current_path: &str) -> OverlayMode {
        OverlayMode::Modal
    }

    /// Build the overlay; inline overlays never auto-dismiss
    fn render(&self, data: &Self::Data, current_path: &str, dismiss_after: Duration) -> Overlay {
        let mode = self.mode(data, current_path);
        Overlay {
            category: Self::CATEGORY,
            mode,
            title: self.title().to_string(),
            message: self.message(data),
            actions: vec![Action::Dismiss, Action::View],
            auto_dismiss: match mode {
                OverlayMode::Modal => Some(dismiss_after),
                OverlayMode::Inline => None,
            },
        }
    }
}

/// Render any notification with its category's view
pub fn render(notification: &Notification, current_path: &str, dismiss_after: Duration) -> Overlay {
    match notification {
        Notification::CustomerAdded(d) => CustomerAddedView.render(d, current_path, dismiss_after),
        Notification::ChatAssigned(d) => ChatAssignedView.render(d, current_path, dismiss_after),
        Notification::TaskAssigned(d) => TaskAssignedView.render(d, current_path, dismiss_after),
        Notification::PrivateChatStarted(d) => PrivateChatView.render(d, current_path, dismiss_after),
    }
}

/// Destination of the View action for any notification
pub fn destination(notification: &Notification) -> Navigation {
    match notification {
        Notification::CustomerAdded(d) => CustomerAddedView.destination(d),
        Notification::ChatAssigned(d) => ChatAssignedView.destination(d),
        Notification::TaskAssigned(d) => TaskAssignedView.destination(d),
        Notification::PrivateChatStarted(d) => PrivateChatView.destination(d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_navigator() {
        let nav = RecordingNavigator::new("/dashboard");
        assert_eq!(nav.current_path(), "/dashboard");

        nav.navigate(Navigation::to("/chats").with_state(serde_json::json!({"selectCustomer": "c1"})));
        assert_eq!(nav.current_path(), "/chats");
        assert_eq!(nav.history().len(), 1);

        nav.set_path("/tasks");
        assert_eq!(nav.current_path(), "/tasks");
        assert_eq!(nav.history().len(), 1);
    }

    #[test]
    fn test_overlay_display() {
        let overlay = Overlay {
            category: Category::TaskAssigned,
            mode: OverlayMode::Modal,
            title: "Task assigned".to_string(),
            message: "Jane assigned you a task".to_string(),
            actions: vec![Action::Dismiss, Action::View],
            auto_dismiss: Some(Duration::from_secs(30)),
        };
        assert_eq!(overlay.to_string(), "[modal] Task assigned: Jane assigned you a task");
    }
}
