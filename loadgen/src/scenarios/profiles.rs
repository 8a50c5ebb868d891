//! Profile and user-lookup traffic

use async_trait::async_trait;

use crate::action;
use crate::api::ApiClient;
use crate::api::models::UserHeader;
use crate::harness::{
    ActionResult, ActionSet, Actor, BootstrapContext, BootstrapError, Completion,
};
use crate::session::UserSession;

use super::login;

/// Reads its own profile and looks up other users through `/api/v3/user(s)`
pub struct ProfileApiActor {
    client: ApiClient,
    session: UserSession,
    /// Username of another account, for the lookup action
    partner_name: String,
}

#[async_trait]
impl Actor for ProfileApiActor {
    const KIND: &'static str = "profile_api";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let roster = ctx.roster();
        let session = login(&client, roster.third()?).await?;
        let partner_name = roster.second()?.username.clone();
        Ok(Self {
            client,
            session,
            partner_name,
        })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("own_profile", 3, own_profile))
            .register(action!("whoami", 2, whoami))
            .register(action!("find_user", 1, find_user))
            .register(action!("user_header", 1, user_header))
            .register(action!("match_names", 1, match_names))
    }
}

async fn own_profile(state: &mut ProfileApiActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/user/profile",
            "/api/v3/user/profile",
            Some(&state.session),
        )
        .await?;
    Ok(Completion::Done)
}

async fn whoami(state: &mut ProfileApiActor) -> ActionResult {
    let _: UserHeader = state
        .client
        .get_json(
            "/api/v3/user/whoami",
            "/api/v3/user/whoami",
            Some(&state.session),
        )
        .await?;
    Ok(Completion::Done)
}

async fn find_user(state: &mut ProfileApiActor) -> ActionResult {
    state
        .client
        .get_ok(
            &format!("/api/v3/users/find/{}", state.partner_name),
            "/api/v3/users/find/:username",
            Some(&state.session),
        )
        .await?;
    Ok(Completion::Done)
}

async fn user_header(state: &mut ProfileApiActor) -> ActionResult {
    let _: UserHeader = state
        .client
        .get_json(
            &format!("/api/v3/users/{}", state.session.user_id),
            "/api/v3/users/:user_id",
            Some(&state.session),
        )
        .await?;
    Ok(Completion::Done)
}

async fn match_names(state: &mut ProfileApiActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/users/match/allnames/admin",
            "/api/v3/users/match/allnames/admin",
            Some(&state.session),
        )
        .await?;
    Ok(Completion::Done)
}
