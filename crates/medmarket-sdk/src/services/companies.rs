//! User-service company lookups and administration.

use medmarket_models::{Company, CompanyDraft, Page, UpdateCompany};
use serde::Serialize;

use super::{segment, USER_SERVICE};
use crate::client::ApiClient;
use crate::error::SdkError;
use crate::request::ApiRequest;

/// Filters for [`CompanyService::list`] and [`CompanyService::limited`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompanyQuery {
    /// Restrict to these company ids.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<u64>,
    /// Name substring.
    pub name: Option<String>,
    /// Company type, `BUYER` or `SELLER`.
    #[serde(rename = "type")]
    pub company_type: Option<String>,
    /// Availability flag.
    pub availability: Option<bool>,
    /// Zero-based page.
    pub page: Option<u32>,
    /// Page size.
    pub size: Option<u32>,
}

/// Company endpoints.
pub struct CompanyService<'a> {
    client: &'a ApiClient,
}

impl<'a> CompanyService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// The company a user belongs to.
    pub async fn for_user(&self, email: &str) -> Result<Company, SdkError> {
        let path = format!("{USER_SERVICE}/companies/user/{}", segment(email));
        self.client.fetch(ApiRequest::get(path)).await
    }

    /// A company by id.
    pub async fn get(&self, id: u64) -> Result<Company, SdkError> {
        self.client
            .fetch(ApiRequest::get(format!("{USER_SERVICE}/companies/{id}")))
            .await
    }

    /// One page of companies with every field (administrators).
    pub async fn list(&self, query: &CompanyQuery) -> Result<Page<Company>, SdkError> {
        let request = ApiRequest::get(format!("{USER_SERVICE}/companies")).query_params(query)?;
        self.client.fetch(request).await
    }

    /// One page of public company cards, open to every user. The backend
    /// leaves out the company type.
    pub async fn limited(&self, query: &CompanyQuery) -> Result<Page<Company>, SdkError> {
        let request =
            ApiRequest::get(format!("{USER_SERVICE}/companies/limited")).query_params(query)?;
        self.client.fetch(request).await
    }

    /// Register a company.
    pub async fn create(&self, draft: &CompanyDraft) -> Result<Company, SdkError> {
        let request = ApiRequest::post(format!("{USER_SERVICE}/companies")).json(draft)?;
        self.client.fetch(request).await
    }

    /// Change company fields.
    pub async fn update(&self, id: u64, update: &UpdateCompany) -> Result<Company, SdkError> {
        let request = ApiRequest::put(format!("{USER_SERVICE}/companies/{id}")).json(update)?;
        self.client.fetch(request).await
    }

    /// Enable or disable a company.
    pub async fn set_availability(&self, id: u64, available: bool) -> Result<(), SdkError> {
        let request = ApiRequest::patch(format!("{USER_SERVICE}/companies/{id}"))
            .query("availability", available);
        self.client.dispatch(request).await.map(|_| ())
    }
}
