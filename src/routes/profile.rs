//! `/profile`: the signed-in customer's account.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::gate::AuthGate;
use super::{Navigation, Route, RouteContext, RouteFailure, RouteParams};
use crate::models::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub user: User,
}

pub async fn loader(ctx: &RouteContext) -> Navigation<ProfileView> {
    match AuthGate::require_session(ctx).await {
        Navigation::Render(user) => Navigation::Render(ProfileView { user }),
        Navigation::Redirect(to) => Navigation::Redirect(to),
    }
}

pub struct Profile;

#[async_trait]
impl Route for Profile {
    async fn load(&self, ctx: &RouteContext, _params: &RouteParams) -> Result<Navigation<Value>, RouteFailure> {
        loader(ctx).await.into_json()
    }
}
