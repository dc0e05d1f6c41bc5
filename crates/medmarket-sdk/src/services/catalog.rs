//! Product and category endpoints.

use medmarket_models::{Category, CategoryDraft, CreateProduct, Page, Product, UpdateProduct};
use serde::Serialize;

use super::PRODUCT_SERVICE;
use crate::client::ApiClient;
use crate::error::SdkError;
use crate::request::ApiRequest;

/// Filters for [`ProductService::list`]. Unset fields are not sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    /// Restrict to these product ids.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<u64>,
    /// Seller company.
    pub company_id: Option<u64>,
    /// Category.
    pub category_id: Option<u64>,
    /// Name substring.
    pub name: Option<String>,
    /// Availability flag.
    pub availability: Option<bool>,
    /// Lower price bound.
    pub min_price: Option<f64>,
    /// Upper price bound.
    pub max_price: Option<f64>,
    /// Zero-based page.
    pub page: Option<u32>,
    /// Page size.
    pub size: Option<u32>,
}

/// Filters for [`CategoryService::list`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryQuery {
    /// Restrict to these category ids.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<u64>,
    /// Name substring.
    pub name: Option<String>,
    /// Availability flag.
    pub availability: Option<bool>,
    /// Zero-based page.
    pub page: Option<u32>,
    /// Page size.
    pub size: Option<u32>,
}

/// Product endpoints.
pub struct ProductService<'a> {
    client: &'a ApiClient,
}

impl<'a> ProductService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// One page of products.
    pub async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, SdkError> {
        let request = ApiRequest::get(format!("{PRODUCT_SERVICE}/products")).query_params(query)?;
        self.client.fetch(request).await
    }

    /// A product by id.
    pub async fn get(&self, id: u64) -> Result<Product, SdkError> {
        self.client
            .fetch(ApiRequest::get(format!("{PRODUCT_SERVICE}/products/{id}")))
            .await
    }

    /// List a new product.
    pub async fn create(&self, product: &CreateProduct) -> Result<Product, SdkError> {
        let request = ApiRequest::post(format!("{PRODUCT_SERVICE}/products")).json(product)?;
        self.client.fetch(request).await
    }

    /// Change product fields.
    pub async fn update(&self, id: u64, update: &UpdateProduct) -> Result<Product, SdkError> {
        let request = ApiRequest::put(format!("{PRODUCT_SERVICE}/products/{id}")).json(update)?;
        self.client.fetch(request).await
    }

    /// Enable or disable a product.
    pub async fn set_status(&self, id: u64, active: bool) -> Result<(), SdkError> {
        let request =
            ApiRequest::patch(format!("{PRODUCT_SERVICE}/products/{id}")).query("status", active);
        self.client.dispatch(request).await.map(|_| ())
    }
}

/// Category endpoints.
pub struct CategoryService<'a> {
    client: &'a ApiClient,
}

impl<'a> CategoryService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// One page of categories.
    pub async fn list(&self, query: &CategoryQuery) -> Result<Page<Category>, SdkError> {
        let request =
            ApiRequest::get(format!("{PRODUCT_SERVICE}/categories")).query_params(query)?;
        self.client.fetch(request).await
    }

    /// A category by id.
    pub async fn get(&self, id: u64) -> Result<Category, SdkError> {
        self.client
            .fetch(ApiRequest::get(format!("{PRODUCT_SERVICE}/categories/{id}")))
            .await
    }

    /// Create a category.
    pub async fn create(&self, draft: &CategoryDraft) -> Result<Category, SdkError> {
        let request = ApiRequest::post(format!("{PRODUCT_SERVICE}/categories")).json(draft)?;
        self.client.fetch(request).await
    }

    /// Rename or re-describe a category.
    pub async fn update(&self, id: u64, draft: &CategoryDraft) -> Result<Category, SdkError> {
        let request = ApiRequest::put(format!("{PRODUCT_SERVICE}/categories/{id}")).json(draft)?;
        self.client.fetch(request).await
    }

    /// Enable or disable a category.
    pub async fn set_status(&self, id: u64, active: bool) -> Result<(), SdkError> {
        let request =
            ApiRequest::patch(format!("{PRODUCT_SERVICE}/categories/{id}")).query("status", active);
        self.client.dispatch(request).await.map(|_| ())
    }

    /// Delete a category.
    pub async fn delete(&self, id: u64) -> Result<(), SdkError> {
        self.client
            .delete(&format!("{PRODUCT_SERVICE}/categories/{id}"))
            .await
            .map(|_| ())
    }
}
