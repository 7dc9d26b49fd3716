//! `/logout`: end the session.

use async_trait::async_trait;

use super::{ActionOutcome, FormData, LOGIN_PATH, Route, RouteContext, RouteFailure, RouteParams};

pub const SIGNED_OUT_NOTICE: &str = "You have been logged out.";

/// The local session is gone even when the server call fails.
pub async fn action(ctx: &RouteContext) -> ActionOutcome {
    if let Some(e) = ctx.api.logout().await.error() {
        tracing::warn!(status = e.status, error = %e, "logout request failed; local session cleared");
    }
    ctx.notifier.success(SIGNED_OUT_NOTICE);
    ActionOutcome::Redirect(LOGIN_PATH.to_owned())
}

pub struct Logout;

#[async_trait]
impl Route for Logout {
    async fn submit(
        &self,
        ctx: &RouteContext,
        _params: &RouteParams,
        _form: &FormData,
    ) -> Result<ActionOutcome, RouteFailure> {
        Ok(action(ctx).await)
    }
}
