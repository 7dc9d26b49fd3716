//! Storefront client core: authenticated API access with single-flight token
//! refresh, and the loader/action routes built on it.

pub mod api;
pub mod config;
pub mod models;
pub mod notify;
pub mod router;
pub mod routes;
pub mod session;
