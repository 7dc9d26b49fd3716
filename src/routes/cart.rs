//! `/carts`: cart contents plus update, remove and checkout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::product_detail::{CART_PATH, PRODUCT_ID_REQUIRED};
use super::{
    ActionOutcome, FormData, LOGIN_PATH, Navigation, Route, RouteContext, RouteFailure, RouteParams, api_path,
    report_action_failure,
};
use crate::api::{Method, RequestDescriptor, decode_data};
use crate::models::{Cart, CartItemRequest, parse_quantity};

pub const LOGIN_FOR_CART_NOTICE: &str = "Please log in to manage your cart.";
pub const UNKNOWN_INTENT: &str = "Unknown cart action";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub cart: Cart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartIntent {
    Update,
    Remove,
    Checkout,
}

impl CartIntent {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "update" => Some(Self::Update),
            "remove" => Some(Self::Remove),
            "checkout" => Some(Self::Checkout),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct PlacedOrder {
    #[serde(default)]
    id: Option<Value>,
}

/// # Errors
///
/// Returns a failure for the error view on any non-auth request error.
pub async fn loader(ctx: &RouteContext) -> Result<Navigation<CartView>, RouteFailure> {
    match ctx.fetch::<Cart>(&RequestDescriptor::get("/cart")).await {
        Ok(cart) => Ok(Navigation::Render(CartView { cart })),
        Err(e) if e.is_auth_unrecoverable() => Ok(Navigation::redirect(LOGIN_PATH)),
        Err(e) => Err(RouteFailure::from_api(&e)),
    }
}

/// Dispatch on the submitted `intent` field.
pub async fn action(ctx: &RouteContext, form: &FormData) -> ActionOutcome {
    let Some(intent) = form.get("intent").and_then(CartIntent::parse) else {
        return ActionOutcome::Rejected { error: UNKNOWN_INTENT.to_owned() };
    };
    tracing::debug!(?intent, "cart action");

    match intent {
        CartIntent::Update => update(ctx, form).await,
        CartIntent::Remove => remove(ctx, form).await,
        CartIntent::Checkout => checkout(ctx).await,
    }
}

async fn update(ctx: &RouteContext, form: &FormData) -> ActionOutcome {
    let Some(product_id) = form.required("productId") else {
        return ActionOutcome::Rejected { error: PRODUCT_ID_REQUIRED.to_owned() };
    };
    let item = CartItemRequest { product_id: product_id.to_owned(), quantity: parse_quantity(form.get("quantity")) };
    let sent = match RequestDescriptor::new(Method::Put, "/cart/item").with_json(&item) {
        Ok(request) => ctx.api.send(&request).await.into_result(),
        Err(e) => Err(e),
    };
    match sent {
        Ok(_) => {
            ctx.notifier.success("Cart updated.");
            ActionOutcome::Redirect(CART_PATH.to_owned())
        }
        Err(e) => report_action_failure(ctx, &e, LOGIN_FOR_CART_NOTICE, "Failed to update cart."),
    }
}

async fn remove(ctx: &RouteContext, form: &FormData) -> ActionOutcome {
    let Some(product_id) = form.required("productId") else {
        return ActionOutcome::Rejected { error: PRODUCT_ID_REQUIRED.to_owned() };
    };

    let request = RequestDescriptor::delete(api_path(&["cart", "item", product_id]));
    match ctx.api.send(&request).await.into_result() {
        Ok(_) => {
            ctx.notifier.success("Item removed from cart.");
            ActionOutcome::Redirect(CART_PATH.to_owned())
        }
        Err(e) => report_action_failure(ctx, &e, LOGIN_FOR_CART_NOTICE, "Failed to remove item."),
    }
}

async fn checkout(ctx: &RouteContext) -> ActionOutcome {
    let placed = ctx.api.send(&RequestDescriptor::post("/orders", json!({}))).await.into_result();
    match placed.and_then(decode_data::<Option<PlacedOrder>>) {
        Ok(order) => {
            ctx.notifier.success("Order placed!");
            ActionOutcome::Redirect(order_destination(order.and_then(|o| o.id).as_ref()))
        }
        Err(e) => report_action_failure(ctx, &e, LOGIN_FOR_CART_NOTICE, "Checkout failed."),
    }
}

/// `/order/:id` when the server returned an id, the order list otherwise.
fn order_destination(id: Option<&Value>) -> String {
    let id = match id {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return "/orders".to_owned(),
    };
    format!("/order/{id}")
}

pub struct CartRoute;

#[async_trait]
impl Route for CartRoute {
    async fn load(&self, ctx: &RouteContext, _params: &RouteParams) -> Result<Navigation<Value>, RouteFailure> {
        loader(ctx).await?.into_json()
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
#[path = "cart_test.rs"]
mod tests;
