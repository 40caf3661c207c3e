//! Private-chat-started overlay

use serde_json::json;

use super::{Navigation, NotificationView, CHATS_PATH};
use crate::types::{Category, PrivateChatStartedData};

pub struct PrivateChatView;

impl NotificationView for PrivateChatView {
    type Data = PrivateChatStartedData;

    const CATEGORY: Category = Category::PrivateChatStarted;

    fn title(&self) -> &'static str {
        "Private chat started"
    }

    fn message(&self, data: &PrivateChatStartedData) -> String {
        format!(
            "{} started a private chat with {}",
            data.started_by.display_name(),
            data.customer_name
        )
    }

    fn destination(&self, data: &PrivateChatStartedData) -> Navigation {
        Navigation::to(CHATS_PATH).with_state(json!({
            "selectCustomer": data.customer_id,
            "customerName": data.customer_name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Actor;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_render_private_chat() {
        let data = PrivateChatStartedData {
            customer_id: "c2".to_string(),
            customer_name: "Globex".to_string(),
            started_by: Actor::new("u3", "Omar"),
            timestamp: Utc::now(),
        };
        let overlay = PrivateChatView.render(&data, "/dashboard", Duration::from_secs(30));
        assert_eq!(overlay.title, "Private chat started");
        assert_eq!(overlay.message, "Omar started a private chat with Globex");
        assert_eq!(PrivateChatView.destination(&data).path, "/chats");
    }
}
