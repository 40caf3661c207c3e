//! Session identity and event actors

use serde::{Deserialize, Serialize};

use super::de_lenient_id;

/// Display name the server uses when it has no real name for an actor
pub const TEAM_MEMBER_PLACEHOLDER: &str = "Team Member";

/// Label shown instead of the placeholder name
pub const GENERIC_ACTOR_LABEL: &str = "a team member";

/// Who the current session belongs to
///
/// Fixed for the lifetime of a connection. A tenant switch or logout
/// produces a new identity (or none) and a new connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionIdentity {
    pub user_id: String,
    pub tenant_id: String,
}

impl SessionIdentity {
    pub fn new(user_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
        }
    }

    /// True when `actor` is the user viewing this session.
    ///
    /// An actor without a user id is never treated as self.
    pub fn is_self(&self, actor: &Actor) -> bool {
        matches!(&actor.user_id, Some(id) if !id.is_empty() && *id == self.user_id)
    }
}

/// The user who triggered an event (`{userId, userName}` on the wire)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(default, deserialize_with = "de_lenient_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            user_name: Some(user_name.into()),
        }
    }

    /// Name to show in a notification
    pub fn display_name(&self) -> &str {
        match self.user_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() && name != TEAM_MEMBER_PLACEHOLDER => name,
            _ => GENERIC_ACTOR_LABEL,
        }
    }
}
