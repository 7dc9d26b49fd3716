//! `/order/:orderId`: a single order.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{LOGIN_PATH, Navigation, Route, RouteContext, RouteFailure, RouteParams, api_path};
use crate::api::RequestDescriptor;
use crate::models::Order;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub order: Order,
}

/// # Errors
///
/// Returns a failure for the error view on any non-auth request error.
pub async fn loader(ctx: &RouteContext, params: &RouteParams) -> Result<Navigation<OrderView>, RouteFailure> {
    let Some(order_id) = params.param("orderId").filter(|id| !id.is_empty()) else {
        return Err(RouteFailure::not_found("Order not found"));
    };

    match ctx.fetch::<Order>(&RequestDescriptor::get(api_path(&["orders", order_id]))).await {
        Ok(order) => Ok(Navigation::Render(OrderView { order })),
        Err(e) if e.is_auth_unrecoverable() => Ok(Navigation::redirect(LOGIN_PATH)),
        Err(e) => Err(RouteFailure::from_api(&e)),
    }
}

pub struct OrderDetail;

#[async_trait]
impl Route for OrderDetail {
    async fn load(&self, ctx: &RouteContext, params: &RouteParams) -> Result<Navigation<Value>, RouteFailure> {
        loader(ctx, params).await?.into_json()
    }
}
