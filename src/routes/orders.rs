//! `/orders`: order history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{LOGIN_PATH, Navigation, Route, RouteContext, RouteFailure, RouteParams};
use crate::api::RequestDescriptor;
use crate::models::Order;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrdersView {
    pub orders: Vec<Order>,
}

/// `data` is either the list itself or `{ "orders": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum OrderList {
    Bare(Vec<Order>),
    Wrapped { orders: Vec<Order> },
}

/// # Errors
///
/// Returns a failure for the error view on any non-auth request error.
pub async fn loader(ctx: &RouteContext) -> Result<Navigation<OrdersView>, RouteFailure> {
    match ctx.fetch::<OrderList>(&RequestDescriptor::get("/orders")).await {
        Ok(OrderList::Bare(orders) | OrderList::Wrapped { orders }) => Ok(Navigation::Render(OrdersView { orders })),
        Err(e) if e.is_auth_unrecoverable() => Ok(Navigation::redirect(LOGIN_PATH)),
        Err(e) => Err(RouteFailure::from_api(&e)),
    }
}

pub struct Orders;

#[async_trait]
impl Route for Orders {
    async fn load(&self, ctx: &RouteContext, _params: &RouteParams) -> Result<Navigation<Value>, RouteFailure> {
        loader(ctx).await?.into_json()
    }
}

#[cfg(test)]
#[path = "orders_test.rs"]
mod tests;
