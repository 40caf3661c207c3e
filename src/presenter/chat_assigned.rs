//! Chat-assigned overlay

use serde_json::json;

use super::{Navigation, NotificationView, CHATS_PATH};
use crate::types::{Category, ChatAssignedData};

pub struct ChatAssignedView;

impl NotificationView for ChatAssignedView {
    type Data = ChatAssignedData;

    const CATEGORY: Category = Category::ChatAssigned;

    fn title(&self) -> &'static str {
        "Chat assigned"
    }

    fn message(&self, data: &ChatAssignedData) -> String {
        format!(
            "{} assigned you the chat with {}",
            data.assigned_by.display_name(),
            data.customer_name
        )
    }

    fn destination(&self, data: &ChatAssignedData) -> Navigation {
        Navigation::to(CHATS_PATH).with_state(json!({
            "selectCustomer": data.customer_id,
            "customerName": data.customer_name,
        }))
    }
}
