//! Credential endpoints under `/auth`.

use medmarket_models::{CredentialPair, PasswordChange};
use serde::Serialize;

use super::segment;
use crate::client::ApiClient;
use crate::error::SdkError;
use crate::request::ApiRequest;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Credential endpoints.
pub struct AuthService<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Exchange e-mail and password for a [`CredentialPair`].
    ///
    /// A 401 here means bad credentials, so it is never answered with a
    /// token refresh.
    pub async fn login(&self, email: &str, password: &str) -> Result<CredentialPair, SdkError> {
        let request = ApiRequest::post("/auth/login")
            .json(&LoginRequest { email, password })?
            .skip_refresh();
        self.client.fetch(request).await
    }

    /// Replace the password of `email`. The backend rejects a wrong
    /// `old_password` with a client error, not a 401.
    pub async fn change_password(
        &self,
        email: &str,
        change: &PasswordChange,
    ) -> Result<(), SdkError> {
        let request = ApiRequest::put(format!("/auth/password/{}", segment(email))).json(change)?;
        self.client.dispatch(request).await.map(|_| ())
    }
}
