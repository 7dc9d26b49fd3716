//! Storefront DTOs as served inside the API `data` envelope.
//!
//! Field names follow the commerce API (a mix of `camelCase` and
//! `snake_case`); optional members default so that a missing decoration
//! never rejects a whole catalog page.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifiers arrive as JSON numbers or strings; they are kept as strings.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// `image_url` is a single URL on listings and a list on detail pages.
fn images_from_one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawImages {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<RawImages>::deserialize(deserializer)? {
        Some(RawImages::One(url)) => vec![url],
        Some(RawImages::Many(urls)) => urls,
        None => Vec::new(),
    })
}

// =============================================================================
// CATALOG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    pub slug: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "images_from_one_or_many")]
    pub image_url: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    pub slug: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "images_from_one_or_many")]
    pub image_url: Vec<String>,
    #[serde(default)]
    pub stock_qty: u32,
    #[serde(rename = "isAvailable", default)]
    pub is_available: bool,
    #[serde(default)]
    pub specifications: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub grinding: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<ProductSummary>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

// =============================================================================
// CART
// =============================================================================

/// Body of `POST /cart/item` and `PUT /cart/item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItemRequest {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub quantity: u32,
}

/// Parse a submitted quantity; absent, non-numeric or non-positive input is 1.
/// Integral decimals such as `2.0` count; fractions do not. Stock limits are
/// the server's to enforce.
#[must_use]
pub fn parse_quantity(raw: Option<&str>) -> u32 {
    let Some(raw) = raw.map(str::trim) else {
        return 1;
    };
    let parsed = match raw.parse::<u32>() {
        Ok(q) => Some(q),
        Err(_) => raw.parse::<f64>().ok().and_then(integral_quantity),
    };
    parsed.filter(|q| *q > 0).unwrap_or(1)
}

fn integral_quantity(value: f64) -> Option<u32> {
    if value.fract() != 0.0 || !(1.0..=f64::from(u32::MAX)).contains(&value) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let quantity = value as u32;
    Some(quantity)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "productId", alias = "product_id", deserialize_with = "id_from_string_or_number")]
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub product: Option<ProductSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(rename = "totalPrice", alias = "total_price", default)]
    pub total_price: f64,
}

// =============================================================================
// ORDERS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "productId", alias = "product_id", deserialize_with = "id_from_string_or_number")]
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub product: Option<ProductSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "totalPrice", alias = "total_price", default)]
    pub total_price: f64,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

// =============================================================================
// ACCOUNT
// =============================================================================

/// Signed-in customer from `GET /auth/me`. `name` and `email` are required so
/// a profile is never built from a partial payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

// =============================================================================
// QUANTITY SELECTOR
// =============================================================================

/// Quantity picker state for the product page. Clamping here is purely for
/// the shopper's convenience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantitySelector {
    quantity: u32,
    stock: u32,
    available: bool,
}

impl QuantitySelector {
    #[must_use]
    pub fn for_product(product: &Product) -> Self {
        Self::new(product.stock_qty, product.is_available)
    }

    #[must_use]
    pub fn new(stock: u32, available: bool) -> Self {
        let quantity = if available && stock > 0 { 1 } else { 0 };
        Self { quantity, stock, available }
    }

    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub fn can_purchase(&self) -> bool {
        self.available && self.stock > 0
    }

    pub fn increase(&mut self) {
        if self.can_purchase() {
            self.quantity = (self.quantity + 1).min(self.stock);
        }
    }

    pub fn decrease(&mut self) {
        if self.can_purchase() {
            self.quantity = if self.quantity > 1 { self.quantity - 1 } else { 1 };
        }
    }

    /// Accept a typed value only when it lies in `1..=stock`.
    pub fn set(&mut self, value: u32) {
        if self.can_purchase() && value > 0 && value <= self.stock {
            self.quantity = value;
        }
    }
}

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;
