//! Session gates run as loaders ahead of a view.
//!
//! [`AuthGate::require_session`] never lets a view render with a partial
//! user: any failure on `GET /auth/me`, including a body that does not
//! decode into a complete [`User`], becomes a redirect to `/login`.
//! [`AuthGate::guest_only`] keeps signed-in customers off the login and
//! registration pages.

use super::{LOGIN_PATH, Navigation, RouteContext};
use crate::api::RequestDescriptor;
use crate::models::User;

pub const CURRENT_USER_PATH: &str = "/auth/me";
pub const HOME_PATH: &str = "/";

pub struct AuthGate;

impl AuthGate {
    /// Render with the signed-in user, or redirect to `/login`.
    pub async fn require_session(ctx: &RouteContext) -> Navigation<User> {
        match ctx.fetch::<User>(&RequestDescriptor::get(CURRENT_USER_PATH)).await {
            Ok(user) => Navigation::Render(user),
            Err(e) => {
                tracing::debug!(status = e.status, error = %e, to = LOGIN_PATH, "session required");
                Navigation::redirect(LOGIN_PATH)
            }
        }
    }

    /// Allow a guest through; send a signed-in customer home.
    ///
    /// Without a stored token there is nothing to check and no request is made.
    pub async fn guest_only(ctx: &RouteContext) -> Navigation<()> {
        if ctx.api.store().get().is_none() {
            return Navigation::Render(());
        }
        match ctx.fetch::<User>(&RequestDescriptor::get(CURRENT_USER_PATH)).await {
            Ok(_) => {
                tracing::debug!(to = HOME_PATH, "already signed in");
                Navigation::redirect(HOME_PATH)
            }
            Err(_) => Navigation::Render(()),
        }
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
