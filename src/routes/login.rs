//! `/login`: guest-only sign-in form.

use async_trait::async_trait;
use serde_json::Value;

use super::gate::{AuthGate, HOME_PATH};
use super::{ActionOutcome, FormData, Navigation, Route, RouteContext, RouteFailure, RouteParams, user_message};

pub const CREDENTIALS_REQUIRED: &str = "Email and password are required";
pub const SIGNED_IN_NOTICE: &str = "Login successful!";
pub const LOGIN_FAILED_NOTICE: &str = "Login failed.";

/// Exchange credentials for an access token and go home.
pub async fn action(ctx: &RouteContext, form: &FormData) -> ActionOutcome {
    let (Some(email), Some(password)) = (form.required("email"), form.get("password").filter(|p| !p.is_empty()))
    else {
        return ActionOutcome::Rejected { error: CREDENTIALS_REQUIRED.to_owned() };
    };

    match ctx.api.login(email, password).await.into_result() {
        Ok(_) => {
            ctx.notifier.success(SIGNED_IN_NOTICE);
            ActionOutcome::Redirect(HOME_PATH.to_owned())
        }
        Err(e) => {
            ctx.notifier.error(user_message(&e, LOGIN_FAILED_NOTICE));
            ActionOutcome::Handled
        }
    }
}

pub struct Login;

#[async_trait]
impl Route for Login {
    async fn load(&self, ctx: &RouteContext, _params: &RouteParams) -> Result<Navigation<Value>, RouteFailure> {
        AuthGate::guest_only(ctx).await.into_json()
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
#[path = "login_test.rs"]
mod tests;
