//! `/register`: guest-only sign-up form.

use async_trait::async_trait;
use serde_json::Value;

use super::gate::AuthGate;
use super::{
    ActionOutcome, FormData, LOGIN_PATH, Navigation, Route, RouteContext, RouteFailure, RouteParams, user_message,
};

pub const FIELDS_REQUIRED: &str = "Name, email and password are required";
pub const REGISTERED_NOTICE: &str = "Registration successful! Please log in.";
pub const REGISTER_FAILED_NOTICE: &str = "Registration failed.";

/// Create the account, then send the customer to the login page.
pub async fn action(ctx: &RouteContext, form: &FormData) -> ActionOutcome {
    let (Some(name), Some(email), Some(password)) =
        (form.required("name"), form.required("email"), form.get("password").filter(|p| !p.is_empty()))
    else {
        return ActionOutcome::Rejected { error: FIELDS_REQUIRED.to_owned() };
    };

    match ctx.api.register(name, email, password).await.into_result() {
        Ok(_) => {
            tracing::info!("account registered");
            ctx.notifier.success(REGISTERED_NOTICE);
            ActionOutcome::Redirect(LOGIN_PATH.to_owned())
        }
        Err(e) => {
            ctx.notifier.error(user_message(&e, REGISTER_FAILED_NOTICE));
            ActionOutcome::Handled
        }
    }
}

pub struct Register;

#[async_trait]
impl Route for Register {
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
#[path = "register_test.rs"]
mod tests;
