//! Session state derived from the stored access token.
//!
//! [`Session`] keeps a decoded view of the current access token
//! ([`SessionClaims`]) and follows the client's events: a refreshed token
//! is re-decoded, a forced logout clears the session.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use medmarket_models::{Company, CredentialPair, TokenKey};
use tracing::info;

use crate::claims::{self, TokenClaims};
use crate::client::ApiClient;
use crate::error::SdkError;
use crate::events::Subscription;

/// What the UI may know about the signed-in user.
///
/// Advisory only: decoded from an unverified token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionClaims {
    /// User e-mail (`sub`).
    pub email: Option<String>,
    /// Upper-cased role names.
    pub roles: Vec<String>,
    /// Access token expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionClaims {
    /// Decode `token`; an undecodable token yields empty claims.
    pub fn from_token(token: &str) -> Self {
        TokenClaims::decode(token)
            .map(|claims| Self {
                email: claims.sub.clone(),
                roles: claims.roles(),
                expires_at: claims.expires_at(),
            })
            .unwrap_or_default()
    }

    /// Whether the user holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        claims::has_role(&self.roles, role)
    }

    /// Platform administrator.
    pub fn is_admin(&self) -> bool {
        self.has_role("ADMIN")
    }

    /// Company director.
    pub fn is_director(&self) -> bool {
        self.has_role("DIRECTOR")
    }

    /// Seller staff.
    pub fn is_seller(&self) -> bool {
        self.has_role("SELLER")
    }
}

/// The signed-in user, kept in sync with the client's token store.
pub struct Session {
    client: ApiClient,
    state: Arc<RwLock<Option<SessionClaims>>>,
    _subscriptions: [Subscription; 2],
}

impl Session {
    /// Attach to `client`, decoding whatever token is already stored.
    pub fn new(client: ApiClient) -> Self {
        let initial = client
            .store()
            .get(TokenKey::Access)
            .map(|token| SessionClaims::from_token(&token));
        let state = Arc::new(RwLock::new(initial));

        let on_refresh = {
            let state = Arc::clone(&state);
            client.events().token_refreshed.subscribe(move |token: &String| {
                *state.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(SessionClaims::from_token(token));
            })
        };
        let on_logout = {
            let state = Arc::clone(&state);
            client.events().force_logout.subscribe(move |()| {
                info!("session ended by forced logout");
                *state.write().unwrap_or_else(PoisonError::into_inner) = None;
            })
        };

        Self {
            client,
            state,
            _subscriptions: [on_refresh, on_logout],
        }
    }

    /// Store `credentials` and start a session with them.
    pub fn login(&self, credentials: &CredentialPair) -> SessionClaims {
        self.client.store().store_credentials(credentials);
        let claims = SessionClaims::from_token(&credentials.access_token);
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(claims.clone());
        info!(email = claims.email.as_deref().unwrap_or("?"), "logged in");
        claims
    }

    /// Exchange e-mail and password for credentials, then [`login`](Self::login).
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionClaims, SdkError> {
        let credentials = self.client.auth().login(email, password).await?;
        Ok(self.login(&credentials))
    }

    /// Remove the stored tokens and end the session.
    pub fn logout(&self) {
        self.client.store().clear();
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("logged out");
    }

    /// Decoded claims, while signed in.
    pub fn claims(&self) -> Option<SessionClaims> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.claims().is_some()
    }

    /// The signed-in user's e-mail.
    pub fn email(&self) -> Option<String> {
        self.claims().and_then(|c| c.email)
    }

    /// See [`SessionClaims::is_admin`].
    pub fn is_admin(&self) -> bool {
        self.claims().is_some_and(|c| c.is_admin())
    }

    /// See [`SessionClaims::is_director`].
    pub fn is_director(&self) -> bool {
        self.claims().is_some_and(|c| c.is_director())
    }

    /// See [`SessionClaims::is_seller`].
    pub fn is_seller(&self) -> bool {
        self.claims().is_some_and(|c| c.is_seller())
    }

    /// The company the signed-in user belongs to.
    pub async fn company(&self) -> Result<Option<Company>, SdkError> {
        let Some(email) = self.email() else {
            return Ok(None);
        };
        self.client.companies().for_user(&email).await.map(Some)
    }

    /// The underlying client.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::events::AuthEvents;
    use crate::store::MemoryTokenStore;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use serde_json::json;

    fn token(payload: &serde_json::Value) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(payload.to_string())
        )
    }

    fn client_with(store: MemoryTokenStore) -> ApiClient {
        ApiClient::new(
            ClientConfig::new("http://127.0.0.1:9/api"),
            Arc::new(store),
            AuthEvents::new(),
        )
        .unwrap()
    }

    #[test]
    fn decodes_stored_token_on_start() {
        let access = token(&json!({"sub": "director@clinic.org", "roles": ["ROLE_DIRECTOR"]}));
        let session = Session::new(client_with(MemoryTokenStore::with_credentials(
            &CredentialPair::new(access, "r"),
        )));

        assert!(session.is_authenticated());
        assert_eq!(session.email().as_deref(), Some("director@clinic.org"));
        assert!(session.is_director());
        assert!(!session.is_admin());
    }

    #[test]
    fn follows_refresh_and_forced_logout() {
        let session = Session::new(client_with(MemoryTokenStore::new()));
        assert!(!session.is_authenticated());

        let events = session.client().events().clone();
        events
            .token_refreshed
            .emit(&token(&json!({"sub": "seller@acme.com", "authorities": "SELLER"})));
        assert!(session.is_seller());
        assert_eq!(session.email().as_deref(), Some("seller@acme.com"));

        events.force_logout.emit(&());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn login_and_logout_update_store() {
        let session = Session::new(client_with(MemoryTokenStore::new()));
        let claims = session.login(&CredentialPair::new(
            token(&json!({"sub": "admin@medmarket.io", "scope": "admin"})),
            "refresh",
        ));
        assert!(claims.is_admin());
        assert!(session.client().store().credentials().is_some());

        session.logout();
        assert!(session.claims().is_none());
        assert!(session.client().store().get(TokenKey::Refresh).is_none());
    }

    #[test]
    fn opaque_token_gives_empty_claims() {
        let claims = SessionClaims::from_token("opaque");
        assert_eq!(claims, SessionClaims::default());
    }

    #[test]
    fn dropping_session_unsubscribes() {
        let client = client_with(MemoryTokenStore::new());
        let session = Session::new(client.clone());
        assert_eq!(client.events().force_logout.listener_count(), 1);
        drop(session);
        assert_eq!(client.events().force_logout.listener_count(), 0);
    }
}
