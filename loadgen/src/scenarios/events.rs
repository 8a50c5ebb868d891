//! Schedule browsing, API and web

use async_trait::async_trait;

use crate::action;
use crate::api::ApiClient;
use crate::api::models::EventData;
use crate::harness::{
    ActionResult, ActionSet, Actor, ActorRng, BootstrapContext, BootstrapError, Completion,
};
use crate::session::{IdCache, UserSession};

use super::login;

// ============================================================================
// events_api
// ============================================================================

/// Browses the schedule through `/api/v3/events`
pub struct EventsApiActor {
    client: ApiClient,
    browser: UserSession,
    searcher: UserSession,
    events: IdCache<String>,
    rng: ActorRng,
}

#[async_trait]
impl Actor for EventsApiActor {
    const KIND: &'static str = "events_api";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let roster = ctx.roster();
        let browser = login(&client, roster.third()?).await?;
        let searcher = login(&client, roster.second()?).await?;
        Ok(Self {
            client,
            browser,
            searcher,
            events: IdCache::new(),
            rng: ctx.rng(),
        })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("browse", 3, browse))
            .register(action!("search", 1, search))
            .register(action!("favorites", 1, favorites))
    }
}

/// List the schedule, open one event, toggle its favorite flag
async fn browse(state: &mut EventsApiActor) -> ActionResult {
    let listed: Vec<EventData> = state
        .client
        .get_json("/api/v3/events", "/api/v3/events", Some(&state.browser))
        .await?;
    state.events.refresh(listed.into_iter().map(|event| event.event_id));

    let Some(event_id) = state.events.pick(&mut state.rng) else {
        return Ok(Completion::Skipped);
    };
    let _: EventData = state
        .client
        .get_json(
            &format!("/api/v3/events/{event_id}"),
            "/api/v3/events/:event_id",
            Some(&state.browser),
        )
        .await?;

    let path = format!("/api/v3/events/{event_id}/favorite");
    state
        .client
        .post_empty(&path, "/api/v3/events/:event_id/favorite", Some(&state.browser))
        .await?;
    state
        .client
        .delete_ok(&path, "/api/v3/events/:event_id/favorite", Some(&state.browser))
        .await?;
    Ok(Completion::Done)
}

async fn search(state: &mut EventsApiActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/events?search=cruise",
            "/api/v3/events?search",
            Some(&state.searcher),
        )
        .await?;
    Ok(Completion::Done)
}

async fn favorites(state: &mut EventsApiActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/events/favorites",
            "/api/v3/events/favorites",
            Some(&state.browser),
        )
        .await?;
    Ok(Completion::Done)
}

// ============================================================================
// events_web
// ============================================================================

/// Browses the schedule pages with a logged-in cookie
pub struct EventsWebActor {
    client: ApiClient,
}

#[async_trait]
impl Actor for EventsWebActor {
    const KIND: &'static str = "events_web";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let roster = ctx.roster();
        let account = roster.second()?;
        client
            .login_web(account)
            .await
            .map_err(|err| BootstrapError::login(&account.username, err))?;
        // The pages ride the cookie; the token isn't kept
        login(&client, roster.third()?).await?;
        Ok(Self { client })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("events_page", 3, events_page))
            .register(action!("search_page", 1, search_page))
    }
}

async fn events_page(state: &mut EventsWebActor) -> ActionResult {
    state.client.get_ok("/events", "/events", None).await?;
    Ok(Completion::Done)
}

async fn search_page(state: &mut EventsWebActor) -> ActionResult {
    state
        .client
        .get_ok("/events?search=cruise", "/events?search", None)
        .await?;
    Ok(Completion::Done)
}
