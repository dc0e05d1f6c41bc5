//! User-service staff administration.

use medmarket_models::{Page, RegisterUser, UpdateUser, User};
use serde::Serialize;

use super::USER_SERVICE;
use crate::client::ApiClient;
use crate::error::SdkError;
use crate::request::ApiRequest;

/// Filters for [`UserService::list`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    /// Staff of this company.
    pub company_id: Option<u64>,
    /// Availability flag.
    pub availability: Option<bool>,
    /// Substring of `"name surname"`.
    pub full_name: Option<String>,
    /// Zero-based page.
    pub page: Option<u32>,
    /// Page size.
    pub size: Option<u32>,
}

/// User endpoints.
pub struct UserService<'a> {
    client: &'a ApiClient,
}

impl<'a> UserService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// One page of users.
    pub async fn list(&self, query: &UserQuery) -> Result<Page<User>, SdkError> {
        let request = ApiRequest::get(format!("{USER_SERVICE}/users")).query_params(query)?;
        self.client.fetch(request).await
    }

    /// The account registered under `email`.
    pub async fn profile(&self, email: &str) -> Result<User, SdkError> {
        let request = ApiRequest::get(format!("{USER_SERVICE}/users/profile")).query("email", email);
        self.client.fetch(request).await
    }

    /// Create an account in a company (directors, administrators).
    pub async fn register(&self, registration: &RegisterUser) -> Result<(), SdkError> {
        let request =
            ApiRequest::post(format!("{USER_SERVICE}/users/register")).json(registration)?;
        self.client.dispatch(request).await.map(|_| ())
    }

    /// Change profile fields.
    pub async fn update(&self, id: u64, update: &UpdateUser) -> Result<User, SdkError> {
        let request = ApiRequest::put(format!("{USER_SERVICE}/users/{id}")).json(update)?;
        self.client.fetch(request).await
    }

    /// Enable or disable an account.
    pub async fn set_availability(&self, id: u64, available: bool) -> Result<(), SdkError> {
        let request = ApiRequest::patch(format!("{USER_SERVICE}/users/{id}"))
            .query("availability", available);
        self.client.dispatch(request).await.map(|_| ())
    }

    /// Make a user the director of their company.
    pub async fn promote_to_director(&self, id: u64) -> Result<(), SdkError> {
        let request = ApiRequest::patch(format!("{USER_SERVICE}/users/to-director/{id}"));
        self.client.dispatch(request).await.map(|_| ())
    }
}
