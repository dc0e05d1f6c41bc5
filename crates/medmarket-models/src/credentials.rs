//! Credential types persisted by the token store.
//!
//! A [`CredentialPair`] is what the login endpoint hands out; each half is
//! stored under its own [`TokenKey`].

use serde::{Deserialize, Serialize};

/// Access / refresh token pair returned by `POST /auth/login`.
///
/// Both tokens are opaque JWT-shaped strings. The client never verifies
/// them; the server is the authority.
///
/// # Examples
///
/// ```
/// use medmarket_models::CredentialPair;
///
/// let pair: CredentialPair =
///     serde_json::from_str(r#"{"accessToken":"a.b.c","refreshToken":"r"}"#).unwrap();
/// assert_eq!(pair.access_token, "a.b.c");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    /// Short-lived bearer credential.
    pub access_token: String,
    /// Longer-lived credential exchanged for a new access token.
    pub refresh_token: String,
}

impl CredentialPair {
    /// Build a pair from its two halves.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Storage key for one half of a [`CredentialPair`].
///
/// The string form is the key used in persisted storage.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
pub enum TokenKey {
    /// The access token.
    #[serde(rename = "accessToken")]
    #[strum(serialize = "accessToken")]
    Access,
    /// The refresh token.
    #[serde(rename = "refreshToken")]
    #[strum(serialize = "refreshToken")]
    Refresh,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn credential_pair_uses_camel_case() {
        let pair = CredentialPair::new("acc", "ref");
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["accessToken"], "acc");
        assert_eq!(json["refreshToken"], "ref");
    }

    #[test]
    fn token_key_storage_names() {
        assert_eq!(TokenKey::Access.to_string(), "accessToken");
        assert_eq!(TokenKey::Refresh.as_ref(), "refreshToken");
        assert_eq!(TokenKey::from_str("refreshToken").unwrap(), TokenKey::Refresh);
    }

    #[test]
    fn token_key_serde_matches_display() {
        for key in TokenKey::iter() {
            let json = serde_json::to_value(key).unwrap();
            assert_eq!(json.as_str().unwrap(), key.to_string());
        }
    }
}
