//! Stored profile and session token decoding

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::NotifyResult;
use crate::types::de_lenient_id;

/// Company reference inside a profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyRef {
    #[serde(rename = "_id", default, deserialize_with = "de_lenient_id")]
    pub id: Option<String>,
}

/// Personal names inside a profile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// The profile blob as returned by `POST /get-profile`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(rename = "_id", default, deserialize_with = "de_lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub company: Option<CompanyRef>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub profile: Option<PersonName>,
}

impl Profile {
    pub fn from_json(raw: &str) -> NotifyResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn company_id(&self) -> Option<&str> {
        self.company
            .as_ref()
            .and_then(|c| c.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// "First Last", trimmed
    pub fn full_name(&self) -> String {
        match &self.profile {
            Some(p) => format!("{} {}", p.first_name, p.last_name).trim().to_string(),
            None => String::new(),
        }
    }
}

/// Claim names that may carry the user id, in lookup order
const USER_ID_CLAIMS: [&str; 4] = ["userId", "_id", "id", "sub"];

/// Pull the user id out of a session token.
///
/// The signature is not checked: the token was issued to this session and
/// is only read here to identify the viewer.
pub fn user_id_from_token(token: &str) -> NotifyResult<Option<String>> {
    let token = unquote(token);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Map<String, Value>>(&token, &DecodingKey::from_secret(&[]), &validation)?;

    Ok(USER_ID_CLAIMS
        .iter()
        .filter_map(|claim| data.claims.get(*claim))
        .find_map(crate::types::lenient_id)
        .filter(|id| !id.is_empty()))
}

/// Tokens are sometimes stored JSON-encoded (`"eyJ..."`)
fn unquote(raw: &str) -> String {
    match serde_json::from_str::<String>(raw) {
        Ok(inner) => inner,
        Err(_) => raw.trim().to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    pub(crate) fn make_token(claims: Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_profile_parsing() {
        let profile = Profile::from_json(
            r#"{"_id":"u1","company":{"_id":"c1"},"role":"agent","profile":{"firstName":"Ada","lastName":"Lovelace"}}"#,
        )
        .unwrap();
        assert_eq!(profile.id.as_deref(), Some("u1"));
        assert_eq!(profile.company_id(), Some("c1"));
        assert_eq!(profile.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_profile_without_company() {
        let profile = Profile::from_json(r#"{"role":"admin"}"#).unwrap();
        assert_eq!(profile.company_id(), None);
        assert_eq!(profile.full_name(), "");
    }

    #[test]
    fn test_user_id_from_token_claims() {
        let token = make_token(json!({"userId": "u7", "exp": 1}));
        assert_eq!(user_id_from_token(&token).unwrap().as_deref(), Some("u7"));
    }

    #[test]
    fn test_user_id_from_sub_claim_quoted() {
        let token = make_token(json!({"sub": "u8"}));
        let quoted = serde_json::to_string(&token).unwrap();
        assert_eq!(user_id_from_token(&quoted).unwrap().as_deref(), Some("u8"));
    }

    #[test]
    fn test_garbage_token_is_error() {
        assert!(user_id_from_token("not-a-jwt").is_err());
    }
}
