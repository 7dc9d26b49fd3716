//! `/product/:slug`: product page and the add-to-cart action.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{
    ActionOutcome, FormData, Navigation, Route, RouteContext, RouteFailure, RouteParams, api_path,
    report_action_failure,
};
use crate::api::{Method, RequestDescriptor};
use crate::models::{CartItemRequest, Product, parse_quantity};

pub const PRODUCT_ID_REQUIRED: &str = "Product ID is required";
pub const LOGIN_TO_ADD_NOTICE: &str = "Please log in to add items to the cart.";
pub const ADD_FAILED_NOTICE: &str = "Failed to add item to cart.";
pub const ADDED_NOTICE: &str = "Item added to cart!";
pub const CART_PATH: &str = "/carts";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub product: Product,
}

/// Any failure to fetch the product is shown as not found.
///
/// # Errors
///
/// Returns a 404 failure when the slug is missing or the fetch fails.
pub async fn loader(ctx: &RouteContext, params: &RouteParams) -> Result<Navigation<ProductView>, RouteFailure> {
    let Some(slug) = params.param("slug").filter(|s| !s.is_empty()) else {
        return Err(RouteFailure::not_found("Product not found"));
    };

    match ctx.fetch::<Product>(&RequestDescriptor::get(api_path(&["products", slug]))).await {
        Ok(product) => Ok(Navigation::Render(ProductView { product })),
        Err(e) => {
            tracing::debug!(%slug, status = e.status, error = %e, "product lookup failed");
            Err(RouteFailure::not_found("Product not found"))
        }
    }
}

/// Add the submitted product to the cart.
///
/// `productId` is required and checked before anything is sent; `quantity`
/// defaults to 1 and is not clamped against stock here.
pub async fn action(ctx: &RouteContext, form: &FormData) -> ActionOutcome {
    let Some(product_id) = form.required("productId") else {
        return ActionOutcome::Rejected { error: PRODUCT_ID_REQUIRED.to_owned() };
    };
    let item = CartItemRequest { product_id: product_id.to_owned(), quantity: parse_quantity(form.get("quantity")) };

    let sent = match RequestDescriptor::new(Method::Post, "/cart/item").with_json(&item) {
        Ok(request) => ctx.api.send(&request).await.into_result(),
        Err(e) => Err(e),
    };
    match sent {
        Ok(_) => {
            tracing::info!(product_id = %item.product_id, quantity = item.quantity, "item added to cart");
            ctx.notifier.success(ADDED_NOTICE);
            ActionOutcome::Redirect(CART_PATH.to_owned())
        }
        Err(e) => report_action_failure(ctx, &e, LOGIN_TO_ADD_NOTICE, ADD_FAILED_NOTICE),
    }
}

pub struct ProductDetail;

#[async_trait]
impl Route for ProductDetail {
    async fn load(&self, ctx: &RouteContext, params: &RouteParams) -> Result<Navigation<Value>, RouteFailure> {
        loader(ctx, params).await?.into_json()
    }

    async fn submit(
        &self,
        ctx: &RouteContext,
        _params: &RouteParams,
        form: &FormData,
    ) -> Result<ActionOutcome, RouteFailure> {
        Ok(action(ctx, form).await)
    }
}

#[cfg(test)]
#[path = "product_detail_test.rs"]
mod tests;
