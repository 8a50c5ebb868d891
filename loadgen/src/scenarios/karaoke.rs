//! Karaoke catalog traffic
//!
//! The song search is open to anyone on the target; only the favorites
//! listing needs a token. The web kind never authenticates at all.

use async_trait::async_trait;

use crate::action;
use crate::api::ApiClient;
use crate::harness::{
    ActionResult, ActionSet, Actor, BootstrapContext, BootstrapError, Completion,
};
use crate::session::UserSession;

use super::login;

// ============================================================================
// karaoke_api
// ============================================================================

/// Searches the song catalog through `/api/v3/karaoke`
pub struct KaraokeApiActor {
    client: ApiClient,
    session: UserSession,
}

#[async_trait]
impl Actor for KaraokeApiActor {
    const KIND: &'static str = "karaoke_api";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let session = login(&client, ctx.roster().second()?).await?;
        Ok(Self { client, session })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("song_search", 3, song_search))
            .register(action!("latest_performances", 1, latest_performances))
            .register(action!("favorites", 1, favorites))
    }
}

async fn song_search(state: &mut KaraokeApiActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/karaoke?search=radiohead",
            "/api/v3/karaoke?search",
            None,
        )
        .await?;
    Ok(Completion::Done)
}

async fn latest_performances(state: &mut KaraokeApiActor) -> ActionResult {
    state
        .client
        .get_ok("/api/v3/karaoke/latest", "/api/v3/karaoke/latest", None)
        .await?;
    Ok(Completion::Done)
}

async fn favorites(state: &mut KaraokeApiActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/karaoke?favorite=true",
            "/api/v3/karaoke?favorite",
            Some(&state.session),
        )
        .await?;
    Ok(Completion::Done)
}

// ============================================================================
// karaoke_web
// ============================================================================

/// Browses the karaoke pages without ever logging in
pub struct KaraokeWebActor {
    client: ApiClient,
}

#[async_trait]
impl Actor for KaraokeWebActor {
    const KIND: &'static str = "karaoke_web";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        Ok(Self {
            client: ctx.client()?,
        })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("karaoke_page", 3, karaoke_page))
            .register(action!("search_page", 1, search_page))
    }
}

async fn karaoke_page(state: &mut KaraokeWebActor) -> ActionResult {
    state.client.get_ok("/karaoke", "/karaoke", None).await?;
    Ok(Completion::Done)
}

async fn search_page(state: &mut KaraokeWebActor) -> ActionResult {
    state
        .client
        .get_ok("/karaoke?search=prince", "/karaoke?search", None)
        .await?;
    Ok(Completion::Done)
}
