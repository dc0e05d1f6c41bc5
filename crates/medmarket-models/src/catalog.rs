//! Catalog types served by the product and user services.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the category is active.
    #[serde(default)]
    pub is_active: bool,
    /// Availability flag toggled by administrators.
    #[serde(default)]
    pub availability: Option<bool>,
}

/// A buyer or seller company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Company identifier.
    pub id: u64,
    /// Legal name.
    pub name: String,
    /// Company type, `BUYER` or `SELLER`. Empty in limited listings,
    /// which omit it.
    #[serde(rename = "type", default)]
    pub company_type: String,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Contact e-mail.
    #[serde(default)]
    pub contact_email: Option<String>,
    /// Logo URL.
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Availability flag toggled by administrators.
    #[serde(default)]
    pub availability: Option<bool>,
}

impl Company {
    /// Whether this company buys on the marketplace.
    pub fn is_buyer(&self) -> bool {
        self.company_type.eq_ignore_ascii_case("BUYER")
    }

    /// Whether this company sells on the marketplace.
    pub fn is_seller(&self) -> bool {
        self.company_type.eq_ignore_ascii_case("SELLER")
    }
}

/// An image attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Image identifier.
    pub id: u64,
    /// Public URL.
    pub url: String,
}

/// A product listed by a seller company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product identifier.
    pub id: u64,
    /// Owning company.
    pub company_id: u64,
    /// Owning company details, when expanded by the backend.
    #[serde(default)]
    pub company: Option<Company>,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Price before tax.
    pub net_price: f64,
    /// Price including tax.
    pub price: f64,
    /// Stock keeping unit.
    pub sku: String,
    /// Units in stock.
    pub stock: u32,
    /// Whether the product is active.
    #[serde(default)]
    pub is_active: bool,
    /// Availability flag toggled by the seller.
    #[serde(default)]
    pub availability: Option<bool>,
    /// Creation time.
    pub created_at: NaiveDateTime,
    /// Last update time.
    pub updated_at: NaiveDateTime,
    /// Category.
    pub category: Category,
    /// Images.
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

/// Body of `POST /product-service/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    /// Owning company.
    pub company_id: u64,
    /// Category.
    pub category_id: u64,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Price before tax.
    pub net_price: f64,
    /// Stock keeping unit.
    pub sku: String,
    /// Units in stock.
    pub stock: u32,
    /// Already-uploaded image URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
}

/// Body of `PUT /product-service/products/{id}`. Absent fields are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New net price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_price: Option<f64>,
    /// New SKU.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// New stock level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    /// Replacement image URLs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

/// Body of `POST`/`PUT` on `/product-service/categories`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    /// Name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `POST /user-service/companies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDraft {
    /// Legal name.
    pub name: String,
    /// Company type, `BUYER` or `SELLER`.
    #[serde(rename = "type")]
    pub company_type: String,
    /// Postal address.
    pub address: String,
    /// Contact e-mail.
    pub contact_email: String,
    /// Already-uploaded logo URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Body of `PUT /user-service/companies/{id}`. Absent fields are unchanged.
///
/// The user service reads the contact and logo fields of this body in
/// snake case, unlike every other company payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCompany {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New company type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub company_type: Option<String>,
    /// New address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// New contact e-mail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    /// New logo URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_type_is_case_insensitive() {
        let company: Company =
            serde_json::from_str(r#"{"id": 1, "name": "Acme", "type": "seller"}"#).unwrap();
        assert!(company.is_seller());
        assert!(!company.is_buyer());
    }

    #[test]
    fn product_from_backend_json() {
        let json = r#"{
            "id": 7,
            "companyId": 3,
            "name": "Stethoscope",
            "description": "Dual head",
            "netPrice": 100.0,
            "price": 120.0,
            "sku": "ST-1",
            "stock": 4,
            "isActive": true,
            "createdAt": "2024-05-01T10:00:00",
            "updatedAt": "2024-05-02T10:00:00",
            "category": {"id": 2, "name": "Diagnostics", "isActive": true},
            "images": [{"id": 1, "url": "https://img/1.png"}]
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.category.name, "Diagnostics");
        assert_eq!(product.images.len(), 1);
        assert!(product.company.is_none());
    }

    #[test]
    fn update_product_skips_unset_fields() {
        let update = UpdateProduct {
            stock: Some(10),
            ..UpdateProduct::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"stock":10}"#);
    }

    #[test]
    fn company_payloads_use_their_wire_names() {
        let draft = CompanyDraft {
            name: "Acme".into(),
            company_type: "SELLER".into(),
            address: "1 Main St".into(),
            contact_email: "info@acme.com".into(),
            logo_url: None,
        };
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            serde_json::json!({
                "name": "Acme",
                "type": "SELLER",
                "address": "1 Main St",
                "contactEmail": "info@acme.com"
            })
        );

        let update = UpdateCompany {
            contact_email: Some("sales@acme.com".into()),
            ..UpdateCompany::default()
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"contact_email":"sales@acme.com"}"#
        );
    }
}
