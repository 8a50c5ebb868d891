//! Notification polling and the realtime socket probe

use async_trait::async_trait;

use crate::action;
use crate::api::ApiClient;
use crate::harness::{
    ActionResult, ActionSet, Actor, BootstrapContext, BootstrapError, Completion,
};
use crate::session::UserSession;

use super::login;

/// Polls the alert endpoints and periodically checks the notification socket
pub struct NotificationsActor {
    client: ApiClient,
    session: UserSession,
}

#[async_trait]
impl Actor for NotificationsActor {
    const KIND: &'static str = "notifications";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let account = ctx.roster().third()?;
        let session = login(&client, account).await?;
        // The socket upgrade authenticates by cookie, so log in on the web
        // side as well
        client
            .login_web(account)
            .await
            .map_err(|err| BootstrapError::login(&account.username, err))?;
        Ok(Self { client, session })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("global", 3, global))
            .register(action!("announcements", 2, announcements))
            .register(action!("daily_themes", 1, daily_themes))
            .register(action!("socket_probe", 1, socket_probe))
    }
}

async fn global(state: &mut NotificationsActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/notification/global",
            "/api/v3/notification/global",
            Some(&state.session),
        )
        .await?;
    Ok(Completion::Done)
}

async fn announcements(state: &mut NotificationsActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/notification/announcements",
            "/api/v3/notification/announcements",
            Some(&state.session),
        )
        .await?;
    Ok(Completion::Done)
}

async fn daily_themes(state: &mut NotificationsActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/notification/dailythemes",
            "/api/v3/notification/dailythemes",
            Some(&state.session),
        )
        .await?;
    Ok(Completion::Done)
}

/// Upgrade to the notification socket, send one frame, close
async fn socket_probe(state: &mut NotificationsActor) -> ActionResult {
    state
        .client
        .socket_probe(
            "/api/v3/notification/socket",
            "/api/v3/notification/socket",
        )
        .await?;
    Ok(Completion::Done)
}
