//! Advisory JWT claim decoding.
//!
//! The client peeks into the access token's payload segment to learn when
//! it expires and who it belongs to. The signature is **not** verified:
//! these claims drive UX decisions (proactive refresh, displaying the user)
//! and never authorization. The gateway remains the authority.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::SdkError;

/// Claims the client reads from an access token.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Subject, the user's e-mail on this gateway.
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry, seconds since the epoch.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub exp: Option<i64>,
    #[serde(default)]
    roles: Option<Value>,
    #[serde(default)]
    authorities: Option<Value>,
    #[serde(default)]
    scope: Option<Value>,
    #[serde(default)]
    scopes: Option<Value>,
}

/// Accepts integer or fractional second counts.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[allow(clippy::cast_possible_truncation)]
    Ok(Option::<f64>::deserialize(deserializer)?.map(|secs| secs.floor() as i64))
}

impl TokenClaims {
    /// Decode the payload segment of a JWT-shaped token.
    pub fn decode(token: &str) -> Result<Self, SdkError> {
        let payload = token
            .split('.')
            .nth(1)
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| SdkError::Token("not a JWT".into()))?;
        let payload = payload.trim_end_matches('=');

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .or_else(|_| STANDARD_NO_PAD.decode(payload))
            .map_err(|e| SdkError::Token(format!("payload is not base64: {e}")))?;

        serde_json::from_slice(&bytes).map_err(|e| SdkError::Token(format!("bad payload: {e}")))
    }

    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Whether the token expires at or before `now + margin_secs`.
    ///
    /// A token without an `exp` claim never expires from the client's
    /// point of view.
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now + margin_secs)
    }

    /// Role names from `roles`, `authorities`, `scope` and `scopes`.
    ///
    /// Arrays are flattened, strings split on spaces and commas, objects
    /// walked through their values. Names are upper-cased and
    /// de-duplicated, keeping first-seen order.
    pub fn roles(&self) -> Vec<String> {
        let mut roles = Vec::new();
        for claim in [&self.roles, &self.authorities, &self.scope, &self.scopes]
            .into_iter()
            .flatten()
        {
            collect_roles(claim, &mut roles);
        }
        roles
    }
}

fn collect_roles(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_roles(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_roles(item, out)),
        Value::String(s) => {
            for part in s.split([' ', ',']).filter(|p| !p.is_empty()) {
                let role = part.to_uppercase();
                if !out.contains(&role) {
                    out.push(role);
                }
            }
        }
        _ => {}
    }
}

/// Whether `token` must be refreshed before use at time `now`.
///
/// Undecodable tokens count as expired.
pub fn is_expired(token: &str, now: i64, margin_secs: i64) -> bool {
    TokenClaims::decode(token).map_or(true, |claims| claims.expires_within(now, margin_secs))
}

/// Whether `roles` grants `role`, in any of the spellings the backend
/// emits (`ADMIN`, `ROLE_ADMIN`, `scope:ADMIN`).
pub fn has_role(roles: &[String], role: &str) -> bool {
    let prefixed = format!("ROLE_{role}");
    let scoped = format!(":{role}");
    let spaced = format!(" {role}");
    roles.iter().any(|r| {
        r == role || *r == prefixed || r.ends_with(&scoped) || r.ends_with(&spaced)
    })
}
