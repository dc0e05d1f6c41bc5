//! Typed wrappers over the gateway's REST endpoints.
//!
//! Each service borrows an [`ApiClient`] and goes through
//! [`ApiClient::dispatch`], so typed calls get the same authorization,
//! refresh and error reporting as raw requests.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod companies;
pub mod orders;
pub mod users;

pub use auth::AuthService;
pub use cart::CartService;
pub use catalog::{CategoryQuery, CategoryService, ProductQuery, ProductService};
pub use companies::{CompanyQuery, CompanyService};
pub use orders::{OrderQuery, OrderService};
pub use users::{UserQuery, UserService};

use std::borrow::Cow;

use crate::client::ApiClient;

/// Prefix of the product/order management service.
pub const PRODUCT_SERVICE: &str = "/product-service";

/// Prefix of the user/company management service.
pub const USER_SERVICE: &str = "/user-service";

/// Percent-encode `raw` for use as a single path segment.
pub(crate) fn segment(raw: &str) -> Cow<'_, str> {
    urlencoding::encode(raw)
}

impl ApiClient {
    /// Login and password endpoints.
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self)
    }

    /// Product endpoints.
    pub fn products(&self) -> ProductService<'_> {
        ProductService::new(self)
    }

    /// Category endpoints.
    pub fn categories(&self) -> CategoryService<'_> {
        CategoryService::new(self)
    }

    /// Cart endpoints.
    pub fn cart(&self) -> CartService<'_> {
        CartService::new(self)
    }

    /// Order endpoints.
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(self)
    }

    /// Company endpoints.
    pub fn companies(&self) -> CompanyService<'_> {
        CompanyService::new(self)
    }

    /// User endpoints.
    pub fn users(&self) -> UserService<'_> {
        UserService::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_escape_path_delimiters() {
        assert_eq!(segment("buyer@clinic.org"), "buyer%40clinic.org");
        assert_eq!(segment("a/b?c#d"), "a%2Fb%3Fc%23d");
        assert_eq!(segment("plain-name_1.x"), "plain-name_1.x");
    }
}
