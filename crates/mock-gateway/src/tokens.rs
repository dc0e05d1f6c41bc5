//! Access / refresh token issuing.
//!
//! Tokens are HS256 JWTs. Access and refresh tokens share the claim layout
//! and are told apart by the `typ` claim, so a refresh token can never be
//! used as a bearer credential and vice versa.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use medmarket_models::CredentialPair;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Which half of a credential pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Bearer credential.
    Access,
    /// Exchanged for new access tokens.
    Refresh,
}

/// Claims carried by every gateway token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User e-mail.
    pub sub: String,
    /// Issued at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
    /// Granted roles (`ROLE_*`).
    pub roles: Vec<String>,
    /// Access or refresh.
    pub typ: TokenKind,
}

/// Signs and checks tokens with one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    /// Create an issuer.
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Issue a fresh access / refresh pair.
    pub fn issue_pair(&self, sub: &str, roles: &[String]) -> Result<CredentialPair, GatewayError> {
        Ok(CredentialPair::new(
            self.issue(sub, roles, TokenKind::Access)?,
            self.issue(sub, roles, TokenKind::Refresh)?,
        ))
    }

    /// Issue one token.
    pub fn issue(&self, sub: &str, roles: &[String], typ: TokenKind) -> Result<String, GatewayError> {
        let now = Utc::now().timestamp();
        let ttl = match typ {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        };
        let claims = Claims {
            sub: sub.to_string(),
            iat: now,
            exp: now + ttl,
            jti: uuid::Uuid::new_v4().to_string(),
            roles: roles.to_vec(),
            typ,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verify signature, expiry and kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, GatewayError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| GatewayError::Unauthorized(format!("invalid token: {e}")))?;
        if data.claims.typ != expected {
            return Err(GatewayError::Unauthorized("wrong token type".into()));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", 600, 3600)
    }

    #[test]
    fn pair_roundtrip() {
        let issuer = issuer();
        let roles = vec!["ROLE_SELLER".to_string()];
        let pair = issuer.issue_pair("seller@acme.com", &roles).unwrap();

        let access = issuer.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(access.sub, "seller@acme.com");
        assert_eq!(access.roles, roles);
        assert_eq!(access.exp - access.iat, 600);

        let refresh = issuer.verify(&pair.refresh_token, TokenKind::Refresh).unwrap();
        assert_eq!(refresh.exp - refresh.iat, 3600);
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let issuer = issuer();
        let pair = issuer.issue_pair("a@b.c", &[]).unwrap();
        assert!(issuer.verify(&pair.refresh_token, TokenKind::Access).is_err());
        assert!(issuer.verify(&pair.access_token, TokenKind::Refresh).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", -5, 3600);
        let token = issuer.issue("a@b.c", &[], TokenKind::Access).unwrap();
        assert!(matches!(
            issuer.verify(&token, TokenKind::Access),
            Err(GatewayError::Unauthorized(_))
        ));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = TokenIssuer::new("other", 600, 600)
            .issue("a@b.c", &[], TokenKind::Access)
            .unwrap();
        assert!(issuer().verify(&token, TokenKind::Access).is_err());
    }
}
