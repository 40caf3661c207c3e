//! Session bootstrap
//!
//! Reads the `token` and `profile` blobs from local storage and turns them
//! into a [`SessionIdentity`]. The result is passed explicitly to the
//! pipeline and recomputed whenever the stored session changes.

mod profile;
mod storage;

pub use profile::{user_id_from_token, CompanyRef, PersonName, Profile};
pub use storage::{LocalStorage, PROFILE_KEY, TOKEN_KEY};

use tracing::{debug, warn};

use crate::error::{NotifyError, NotifyResult};
use crate::types::SessionIdentity;

/// A resolved session: identity plus the token used to authenticate the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: SessionIdentity,
    pub token: Option<String>,
    pub display_name: String,
    pub role: Option<String>,
}

/// Builds a [`Session`] from local storage
pub struct SessionBootstrap;

impl SessionBootstrap {
    /// Load the current session.
    ///
    /// Returns `Ok(None)` when nobody is logged in (no stored profile).
    pub fn load(storage: &LocalStorage) -> NotifyResult<Option<Session>> {
        let raw_profile = match storage.get(PROFILE_KEY)? {
            Some(raw) => raw,
            None => {
                debug!(dir = %storage.dir().display(), "No stored profile, session is logged out");
                return Ok(None);
            }
        };
        let profile = Profile::from_json(&raw_profile)?;
        let token = storage.get(TOKEN_KEY)?;

        let tenant_id = profile
            .company_id()
            .ok_or_else(|| NotifyError::Profile("profile has no company id".to_string()))?
            .to_string();

        let user_id = match profile.id.clone().filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                let from_token = match token.as_deref().map(user_id_from_token) {
                    Some(Ok(id)) => id,
                    Some(Err(e)) => {
                        warn!(tenant_id = %tenant_id, error = %e, "Stored token is unreadable");
                        None
                    }
                    None => None,
                };
                match from_token {
                    Some(id) => id,
                    None => {
                        // Suppression needs a viewer id; without one every event is shown
                        warn!(tenant_id = %tenant_id, "No user id in profile or token");
                        String::new()
                    }
                }
            }
        };

        Ok(Some(Session {
            identity: SessionIdentity::new(user_id, tenant_id),
            token,
            display_name: profile.full_name(),
            role: profile.role.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::profile::tests::make_token;
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_logged_out_without_profile() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(SessionBootstrap::load(&storage).unwrap().is_none());
    }

    #[test]
    fn test_identity_from_profile() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage
            .set(
                PROFILE_KEY,
                r#"{"_id":"u1","company":{"_id":"c1"},"role":"admin","profile":{"firstName":"Sam","lastName":"Lee"}}"#,
            )
            .unwrap();

        let session = SessionBootstrap::load(&storage).unwrap().unwrap();
        assert_eq!(session.identity, SessionIdentity::new("u1", "c1"));
        assert_eq!(session.display_name, "Sam Lee");
        assert_eq!(session.role.as_deref(), Some("admin"));
        assert!(session.token.is_none());
    }

    #[test]
    fn test_user_id_falls_back_to_token() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.set(PROFILE_KEY, r#"{"company":{"_id":"c1"}}"#).unwrap();
        storage.set(TOKEN_KEY, &make_token(json!({"userId": "u5"}))).unwrap();

        let session = SessionBootstrap::load(&storage).unwrap().unwrap();
        assert_eq!(session.identity.user_id, "u5");
        assert!(session.token.is_some());
    }

    #[test]
    fn test_malformed_token_treated_as_missing() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.set(PROFILE_KEY, r#"{"company":{"_id":"c1"}}"#).unwrap();
        storage.set(TOKEN_KEY, "not-a-jwt").unwrap();

        let session = SessionBootstrap::load(&storage).unwrap().unwrap();
        assert_eq!(session.identity, SessionIdentity::new("", "c1"));
        assert_eq!(session.token.as_deref(), Some("not-a-jwt"));
    }

    #[test]
    fn test_missing_company_is_error() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.set(PROFILE_KEY, r#"{"_id":"u1"}"#).unwrap();

        assert!(matches!(
            SessionBootstrap::load(&storage),
            Err(NotifyError::Profile(_))
        ));
    }
}
