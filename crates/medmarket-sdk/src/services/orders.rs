//! Order endpoints.

use medmarket_models::{Order, OrderStatus, Page, Receipt, SalesFilter, SalesStatistics};
use serde::Serialize;
use serde_json::json;

use super::{segment, PRODUCT_SERVICE};
use crate::client::ApiClient;
use crate::error::SdkError;
use crate::request::ApiRequest;

/// Filters for order listings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderQuery {
    /// Only orders in this status.
    pub status: Option<OrderStatus>,
    /// Zero-based page.
    pub page: Option<u32>,
    /// Page size.
    pub size: Option<u32>,
}

/// Orders fetched for a sales report.
const SALES_PAGE_SIZE: u32 = 1000;

/// Order endpoints.
pub struct OrderService<'a> {
    client: &'a ApiClient,
}

impl<'a> OrderService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Turn the current cart into an order.
    pub async fn create(&self) -> Result<Order, SdkError> {
        self.client
            .fetch(ApiRequest::post(format!("{PRODUCT_SERVICE}/orders/create")))
            .await
    }

    /// An order by id.
    pub async fn get(&self, id: u64) -> Result<Order, SdkError> {
        self.client
            .fetch(ApiRequest::get(format!("{PRODUCT_SERVICE}/orders/{id}")))
            .await
    }

    /// The signed-in user's orders.
    pub async fn mine(&self, query: &OrderQuery) -> Result<Page<Order>, SdkError> {
        let request =
            ApiRequest::get(format!("{PRODUCT_SERVICE}/orders/user")).query_params(query)?;
        self.client.fetch(request).await
    }

    /// Every order visible to the caller (sellers, administrators).
    pub async fn all(&self, query: &OrderQuery) -> Result<Page<Order>, SdkError> {
        let request = ApiRequest::get(format!("{PRODUCT_SERVICE}/orders")).query_params(query)?;
        self.client.fetch(request).await
    }

    /// Move an order to `status`.
    pub async fn set_status(&self, id: u64, status: OrderStatus) -> Result<Order, SdkError> {
        let request = ApiRequest::patch(format!("{PRODUCT_SERVICE}/orders/{id}/status"))
            .json_value(json!({ "status": status }));
        self.client.fetch(request).await
    }

    /// Receipt of an order.
    pub async fn receipt(&self, id: u64) -> Result<Receipt, SdkError> {
        self.client
            .fetch(ApiRequest::get(format!("{PRODUCT_SERVICE}/orders/{id}/receipt")))
            .await
    }

    /// Receipt by its number.
    pub async fn receipt_by_number(&self, number: &str) -> Result<Receipt, SdkError> {
        self.client
            .fetch(ApiRequest::get(format!(
                "{PRODUCT_SERVICE}/orders/receipt/{}",
                segment(number)
            )))
            .await
    }

    /// Sales report for a seller, aggregated from the orders visible to
    /// the caller. Only the first page of 1000 orders is read.
    pub async fn sales(&self, filter: &SalesFilter) -> Result<SalesStatistics, SdkError> {
        let query = OrderQuery {
            page: Some(0),
            size: Some(SALES_PAGE_SIZE),
            ..OrderQuery::default()
        };
        let page = self.all(&query).await?;
        Ok(SalesStatistics::compute(&page.content, filter))
    }
}
