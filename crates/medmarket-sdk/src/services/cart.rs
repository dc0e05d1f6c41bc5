//! Cart endpoints.

use medmarket_models::{AddToCart, Cart};

use super::PRODUCT_SERVICE;
use crate::client::ApiClient;
use crate::error::SdkError;
use crate::request::ApiRequest;

/// Cart endpoints for the signed-in user.
pub struct CartService<'a> {
    client: &'a ApiClient,
}

impl<'a> CartService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// The current cart.
    pub async fn get(&self) -> Result<Cart, SdkError> {
        self.client
            .fetch(ApiRequest::get(format!("{PRODUCT_SERVICE}/cart")))
            .await
    }

    /// Add units of a product.
    pub async fn add(&self, item: AddToCart) -> Result<Cart, SdkError> {
        let request = ApiRequest::post(format!("{PRODUCT_SERVICE}/cart/items")).json(&item)?;
        self.client.fetch(request).await
    }

    /// Set the quantity of a product already in the cart.
    pub async fn set_quantity(&self, product_id: u64, quantity: u32) -> Result<Cart, SdkError> {
        let request = ApiRequest::put(format!("{PRODUCT_SERVICE}/cart/items/{product_id}"))
            .query("quantity", quantity);
        self.client.fetch(request).await
    }

    /// Remove a product from the cart.
    pub async fn remove(&self, product_id: u64) -> Result<(), SdkError> {
        self.client
            .delete(&format!("{PRODUCT_SERVICE}/cart/items/{product_id}"))
            .await
            .map(|_| ())
    }

    /// Empty the cart.
    pub async fn clear(&self) -> Result<(), SdkError> {
        self.client
            .delete(&format!("{PRODUCT_SERVICE}/cart"))
            .await
            .map(|_| ())
    }
}
