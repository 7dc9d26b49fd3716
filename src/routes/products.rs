//! `/products`: paginated catalog with search and category filters.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{Navigation, Route, RouteContext, RouteFailure, RouteParams, path_with_query};
use crate::api::RequestDescriptor;
use crate::models::{Pagination, ProductPage, ProductSummary};

/// Query parameters passed through to `GET /products`.
pub const FORWARDED_QUERY: [&str; 5] = ["page", "limit", "search", "category", "sorts"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogView {
    pub products: Vec<ProductSummary>,
    pub pagination: Option<Pagination>,
    pub search: Option<String>,
    pub category: Option<String>,
}

/// # Errors
///
/// Returns a failure for the error view when the catalog cannot be fetched.
pub async fn loader(ctx: &RouteContext, params: &RouteParams) -> Result<Navigation<CatalogView>, RouteFailure> {
    let forwarded: Vec<(&str, &str)> = FORWARDED_QUERY
        .iter()
        .filter_map(|name| params.query(name).filter(|v| !v.is_empty()).map(|v| (*name, v)))
        .collect();
    let request = RequestDescriptor::get(path_with_query("/products", &forwarded));

    let page = ctx.fetch::<ProductPage>(&request).await.map_err(|e| {
        tracing::warn!(status = e.status, error = %e, "failed to fetch catalog");
        RouteFailure::from_api(&e)
    })?;

    Ok(Navigation::Render(CatalogView {
        products: page.products,
        pagination: page.pagination,
        search: params.query("search").map(str::to_owned),
        category: params.query("category").map(str::to_owned),
    }))
}

pub struct Products;

#[async_trait]
impl Route for Products {
    async fn load(&self, ctx: &RouteContext, params: &RouteParams) -> Result<Navigation<Value>, RouteFailure> {
        loader(ctx, params).await?.into_json()
    }
}

#[cfg(test)]
#[path = "products_test.rs"]
mod tests;
