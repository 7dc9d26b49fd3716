//! Thin router adapter over the route table.
//!
//! Owns which stage runs when: `load` resolves a path through the matching
//! route's loader, `submit` runs its action. Patterns are `/`-separated with
//! `:name` segments captured into [`RouteParams`].

use std::sync::Arc;

use serde_json::Value;

use crate::routes::{
    ActionOutcome, FormData, Navigation, Route, RouteContext, RouteFailure, RouteParams, cart, home, login, logout,
    order_detail, orders, product_detail, products, profile, register,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

struct RouteEntry {
    pattern: String,
    segments: Vec<Segment>,
    handler: Arc<dyn Route>,
}

impl RouteEntry {
    fn matches(&self, path: &[String]) -> Option<RouteParams> {
        if path.len() != self.segments.len() {
            return None;
        }
        let mut params = RouteParams::new();
        for (segment, value) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => params = params.with_param(name.clone(), value.clone()),
            }
        }
        Some(params)
    }
}

pub struct Router {
    ctx: RouteContext,
    routes: Vec<RouteEntry>,
}

impl Router {
    #[must_use]
    pub fn new(ctx: RouteContext) -> Self {
        Self { ctx, routes: Vec::new() }
    }

    /// The full storefront route table.
    #[must_use]
    pub fn storefront(ctx: RouteContext) -> Self {
        Self::new(ctx)
            .route("/", home::Home)
            .route("/products", products::Products)
            .route("/product/:slug", product_detail::ProductDetail)
            .route("/register", register::Register)
            .route("/login", login::Login)
            .route("/carts", cart::CartRoute)
            .route("/orders", orders::Orders)
            .route("/order/:orderId", order_detail::OrderDetail)
            .route("/profile", profile::Profile)
            .route("/logout", logout::Logout)
    }

    /// Register `handler` for `pattern`. Earlier registrations win.
    #[must_use]
    pub fn route(mut self, pattern: &str, handler: impl Route + 'static) -> Self {
        let segments = split_path(pattern)
            .into_iter()
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Literal(s),
            })
            .collect();
        self.routes.push(RouteEntry { pattern: pattern.to_owned(), segments, handler: Arc::new(handler) });
        self
    }

    #[must_use]
    pub fn context(&self) -> &RouteContext {
        &self.ctx
    }

    /// Run the loader for `path_and_query`, e.g. `/products?page=2`.
    ///
    /// # Errors
    ///
    /// Returns 404 for an unknown path, otherwise whatever the loader fails with.
    pub async fn load(&self, path_and_query: &str) -> Result<Navigation<Value>, RouteFailure> {
        let (handler, params) = self.resolve(path_and_query)?;
        let result = handler.load(&self.ctx, &params).await;
        if let Ok(Navigation::Redirect(to)) = &result {
            tracing::debug!(path = %path_and_query, %to, "loader redirected");
        }
        result
    }

    /// Run the action for `path` with the submitted form.
    ///
    /// # Errors
    ///
    /// Returns 404 for an unknown path and 405 for a route without an action.
    pub async fn submit(&self, path: &str, form: &FormData) -> Result<ActionOutcome, RouteFailure> {
        let (handler, params) = self.resolve(path)?;
        handler.submit(&self.ctx, &params, form).await
    }

    fn resolve(&self, path_and_query: &str) -> Result<(&dyn Route, RouteParams), RouteFailure> {
        let (path, query) = path_and_query.split_once('?').unwrap_or((path_and_query, ""));
        let segments: Vec<String> = split_path(path).iter().map(|s| decode(s)).collect();

        let Some((entry, mut params)) = self.routes.iter().find_map(|e| e.matches(&segments).map(|p| (e, p))) else {
            tracing::debug!(%path, "no route matched");
            return Err(RouteFailure::not_found("Not Found"));
        };
        tracing::debug!(%path, pattern = %entry.pattern, "route matched");

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            params = params.with_query(decode_query(name), decode_query(value));
        }
        Ok((entry.handler.as_ref(), params))
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/').filter(|s| !s.is_empty()).map(str::to_owned).collect()
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_owned(), std::borrow::Cow::into_owned)
}

/// Query components also use `+` for spaces.
fn decode_query(raw: &str) -> String {
    decode(&raw.replace('+', " "))
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
