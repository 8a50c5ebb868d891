//! Plain page browsing

use async_trait::async_trait;

use crate::action;
use crate::api::ApiClient;
use crate::harness::{
    ActionResult, ActionSet, Actor, BootstrapContext, BootstrapError, Completion,
};

/// Wanders the public web pages with a fresh session cookie
pub struct LoggedOutBrowser {
    client: ApiClient,
}

#[async_trait]
impl Actor for LoggedOutBrowser {
    const KIND: &'static str = "logged_out";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let account = ctx.roster().first()?;
        client
            .login_web(account)
            .await
            .map_err(|err| BootstrapError::login(&account.username, err))?;
        Ok(Self { client })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("home", 1, home))
            .register(action!("events_page", 1, events_page))
            .register(action!("boardgames_page", 1, boardgames_page))
            .register(action!("karaoke_page", 1, karaoke_page))
    }
}

async fn home(state: &mut LoggedOutBrowser) -> ActionResult {
    state.client.get_ok("/", "/", None).await?;
    Ok(Completion::Done)
}

async fn events_page(state: &mut LoggedOutBrowser) -> ActionResult {
    state.client.get_ok("/events", "/events", None).await?;
    Ok(Completion::Done)
}

async fn boardgames_page(state: &mut LoggedOutBrowser) -> ActionResult {
    state.client.get_ok("/boardgames", "/boardgames", None).await?;
    Ok(Completion::Done)
}

async fn karaoke_page(state: &mut LoggedOutBrowser) -> ActionResult {
    state.client.get_ok("/karaoke", "/karaoke", None).await?;
    Ok(Completion::Done)
}
