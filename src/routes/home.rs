//! `/`: featured products, newest first.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{Navigation, Route, RouteContext, RouteFailure, RouteParams, path_with_query};
use crate::api::RequestDescriptor;
use crate::models::{ProductPage, ProductSummary};

pub const FEATURED_LIMIT: &str = "6";
const NEWEST_FIRST: &str = r#"{"createdAt":"desc"}"#;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeView {
    pub products: Vec<ProductSummary>,
}

/// # Errors
///
/// Returns a failure for the error view when the catalog cannot be fetched.
pub async fn loader(ctx: &RouteContext) -> Result<Navigation<HomeView>, RouteFailure> {
    let path = path_with_query("/products", &[("limit", FEATURED_LIMIT), ("sorts", NEWEST_FIRST)]);
    match ctx.fetch::<ProductPage>(&RequestDescriptor::get(path)).await {
        Ok(page) => Ok(Navigation::Render(HomeView { products: page.products })),
        Err(e) => {
            tracing::warn!(status = e.status, error = %e, "failed to fetch featured products");
            let mut failure = RouteFailure::from_api(&e);
            failure.message = "Failed to fetch products".to_owned();
            Err(failure)
        }
    }
}

pub struct Home;

#[async_trait]
impl Route for Home {
    async fn load(&self, ctx: &RouteContext, _params: &RouteParams) -> Result<Navigation<Value>, RouteFailure> {
        loader(ctx).await?.into_json()
    }
}

#[cfg(test)]
#[path = "home_test.rs"]
mod tests;
