//! Data types for the notification pipeline
//!
//! Session identity, event actors and the per-category notification payloads.

mod notification;
mod session;

pub use notification::{
    Category, ChatAssignedData, CustomerAddedData, Notification, PendingNotification,
    PrivateChatStartedData, TaskAssignedData,
};
pub use session::{Actor, SessionIdentity, GENERIC_ACTOR_LABEL, TEAM_MEMBER_PLACEHOLDER};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Read an id that the server may send as a string, a number, or null
pub fn de_lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(lenient_id))
}

/// Stringify an id value; anything that is not a string or number is no id
pub fn lenient_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
