//! Typed decoding of inbound payloads
//!
//! Server payloads are loosely shaped: an object with a `type` field for
//! domain events, or a bare string for privacy toggles. [`decode`] turns
//! each payload into one variant of a closed set; anything it does not
//! recognise is `Unknown` and keeps the raw value.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::types::{
    lenient_id, Actor, ChatAssignedData, CustomerAddedData, Notification,
    PrivateChatStartedData, TaskAssignedData,
};

/// `type` of a customer-added event
pub const CUSTOMER_ADDED_TYPE: &str = "new customer add";

/// Prefix the server puts in front of the customer name in `content`
pub const CUSTOMER_NAME_PREFIX: &str = "new customer added of name ";

pub const CHAT_ASSIGNED_TYPE: &str = "chat assigned";
pub const TASK_ASSIGNED_TYPE: &str = "task assigned";
pub const PRIVATE_CHAT_STARTED_TYPE: &str = "private chat started";

/// Marker substring of a privacy status string payload
pub const PRIVATE_STATUS_MARKER: &str = "isPrivate";

/// An inbound payload after classification
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// One of the four notification categories
    Notification(Notification),
    /// Raw privacy status string (`"...isPrivate..."`)
    PrivateStatusChange(String),
    /// Anything else, untouched
    Unknown(Value),
}

/// Classify a payload
pub fn decode(payload: Value) -> InboundEvent {
    match payload {
        Value::String(text) if text.contains(PRIVATE_STATUS_MARKER) => {
            InboundEvent::PrivateStatusChange(text)
        }
        Value::Object(ref fields) => match decode_object(fields) {
            Some(notification) => InboundEvent::Notification(notification),
            None => InboundEvent::Unknown(payload),
        },
        other => InboundEvent::Unknown(other),
    }
}

fn decode_object(fields: &Map<String, Value>) -> Option<Notification> {
    let kind = fields.get("type")?.as_str()?.trim();

    if kind == CUSTOMER_ADDED_TYPE {
        let customer_id = id_field(fields, "customerId")?;
        let customer_name = match str_field(fields, "content") {
            Some(content) => customer_name_from_content(content),
            None => str_field(fields, "customerName")
                .map(str::to_string)
                .unwrap_or_else(|| customer_id.clone()),
        };
        return Some(Notification::CustomerAdded(CustomerAddedData {
            customer_id,
            customer_name,
            added_by: actor_field(fields, "addedBy"),
            timestamp: timestamp_field(fields),
        }));
    }

    if kind == CHAT_ASSIGNED_TYPE {
        let customer_id = id_field(fields, "customerId")?;
        return Some(Notification::ChatAssigned(ChatAssignedData {
            customer_name: name_or(fields, &["customerName", "content"], &customer_id),
            customer_id,
            assigned_by: actor_field(fields, "assignedBy"),
            assigned_to: optional_actor_field(fields, "assignedTo"),
            timestamp: timestamp_field(fields),
        }));
    }

    if kind == TASK_ASSIGNED_TYPE {
        let task_id = id_field(fields, "taskId")?;
        return Some(Notification::TaskAssigned(TaskAssignedData {
            task_name: name_or(fields, &["taskName", "title", "content"], &task_id),
            task_id,
            customer_id: id_field(fields, "customerId"),
            assigned_by: actor_field(fields, "assignedBy"),
            assigned_to: optional_actor_field(fields, "assignedTo"),
            timestamp: timestamp_field(fields),
        }));
    }

    if kind == PRIVATE_CHAT_STARTED_TYPE {
        let customer_id = id_field(fields, "customerId")?;
        return Some(Notification::PrivateChatStarted(PrivateChatStartedData {
            customer_name: name_or(fields, &["customerName", "content"], &customer_id),
            customer_id,
            started_by: actor_field(fields, "startedBy"),
            timestamp: timestamp_field(fields),
        }));
    }

    None
}

/// "new customer added of name Acme Corp" -> "Acme Corp"
pub fn customer_name_from_content(content: &str) -> String {
    content
        .strip_prefix(CUSTOMER_NAME_PREFIX)
        .unwrap_or(content)
        .trim()
        .to_string()
}

fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn id_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(lenient_id).filter(|id| !id.is_empty())
}

fn name_or(fields: &Map<String, Value>, keys: &[&str], fallback: &str) -> String {
    keys.iter()
        .find_map(|key| str_field(fields, key))
        .unwrap_or(fallback)
        .to_string()
}

/// Each actor field is read on its own so a bad `userName` never hides the `userId`
fn optional_actor_field(fields: &Map<String, Value>, key: &str) -> Option<Actor> {
    let actor = fields.get(key)?.as_object()?;
    Some(Actor {
        user_id: id_field(actor, "userId"),
        user_name: str_field(actor, "userName").map(str::to_string),
    })
}

fn actor_field(fields: &Map<String, Value>, key: &str) -> Actor {
    optional_actor_field(fields, key).unwrap_or_default()
}

fn timestamp_field(fields: &Map<String, Value>) -> DateTime<Utc> {
    ["timestamp", "createdAt"]
        .iter()
        .find_map(|key| str_field(fields, key))
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use serde_json::json;

    #[test]
    fn test_decode_customer_added() {
        let event = decode(json!({
            "type": "new customer add",
            "customerId": "c1",
            "content": "new customer added of name Acme Corp",
            "addedBy": {"userId": "u2", "userName": "Jane"},
            "timestamp": "2026-01-05T10:00:00Z"
        }));

        match event {
            InboundEvent::Notification(Notification::CustomerAdded(data)) => {
                assert_eq!(data.customer_id, "c1");
                assert_eq!(data.customer_name, "Acme Corp");
                assert_eq!(data.added_by, Actor::new("u2", "Jane"));
                assert_eq!(data.timestamp.to_rfc3339(), "2026-01-05T10:00:00+00:00");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_actor_id_survives_bad_name() {
        let event = decode(json!({
            "type": "new customer add",
            "customerId": "c1",
            "content": "new customer added of name Acme Corp",
            "addedBy": {"userId": 42, "userName": 7}
        }));

        match event {
            InboundEvent::Notification(Notification::CustomerAdded(data)) => {
                assert_eq!(data.added_by.user_id.as_deref(), Some("42"));
                assert_eq!(data.added_by.user_name, None);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_customer_name_without_prefix() {
        assert_eq!(customer_name_from_content("Globex"), "Globex");
        assert_eq!(
            customer_name_from_content("new customer added of name  Initech "),
            "Initech"
        );
    }

    #[test]
    fn test_customer_added_without_id_is_unknown() {
        let raw = json!({"type": "new customer add", "content": "x"});
        assert_eq!(decode(raw.clone()), InboundEvent::Unknown(raw));
    }

    #[test]
    fn test_decode_chat_assigned() {
        let event = decode(json!({
            "type": "chat assigned",
            "customerId": 55,
            "customerName": "Wayne",
            "assignedBy": {"userId": "u2", "userName": "Jane"},
            "assignedTo": {"userId": "u1"}
        }));
        match event {
            InboundEvent::Notification(n) => {
                assert_eq!(n.category(), Category::ChatAssigned);
                assert_eq!(n.recipient().and_then(|a| a.user_id.as_deref()), Some("u1"));
                if let Notification::ChatAssigned(data) = n {
                    assert_eq!(data.customer_id, "55");
                    assert_eq!(data.customer_name, "Wayne");
                }
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_task_assigned_name_fallback() {
        let event = decode(json!({"type": "task assigned", "taskId": "t1", "title": "Call back"}));
        match event {
            InboundEvent::Notification(Notification::TaskAssigned(data)) => {
                assert_eq!(data.task_name, "Call back");
                assert!(data.customer_id.is_none());
                assert_eq!(data.assigned_by, Actor::default());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_private_chat_started() {
        let event = decode(json!({
            "type": "private chat started",
            "customerId": "c3",
            "startedBy": {"userId": "u4", "userName": "Team Member"}
        }));
        match event {
            InboundEvent::Notification(Notification::PrivateChatStarted(data)) => {
                assert_eq!(data.customer_name, "c3");
                assert_eq!(data.started_by.display_name(), "a team member");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_private_status_string() {
        let raw = json!("customer c1 isPrivate true");
        assert_eq!(
            decode(raw),
            InboundEvent::PrivateStatusChange("customer c1 isPrivate true".to_string())
        );
    }

    #[test]
    fn test_unrecognised_payloads_fall_through() {
        for raw in [
            json!("plain broadcast"),
            json!({"type": "something else"}),
            json!({"no_type": true}),
            json!({"type": 5}),
            json!([1, 2, 3]),
            json!(null),
        ] {
            assert_eq!(decode(raw.clone()), InboundEvent::Unknown(raw));
        }
    }
}
