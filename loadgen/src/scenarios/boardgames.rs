//! Boardgame library traffic

use async_trait::async_trait;
use rand::Rng;

use crate::action;
use crate::api::ApiClient;
use crate::api::models::{BoardgameData, BoardgameResponseData};
use crate::harness::{
    ActionResult, ActionSet, Actor, ActorRng, BootstrapContext, BootstrapError, Completion,
};
use crate::session::{IdCache, UserSession};

use super::login;

// ============================================================================
// boardgames_api
// ============================================================================

/// Browses the game library through `/api/v3/boardgames`
pub struct BoardgamesApiActor {
    client: ApiClient,
    session: UserSession,
    games: IdCache<String>,
    rng: ActorRng,
}

#[async_trait]
impl Actor for BoardgamesApiActor {
    const KIND: &'static str = "boardgames_api";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let session = login(&client, ctx.roster().third()?).await?;
        Ok(Self {
            client,
            session,
            games: IdCache::new(),
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

/// List the library, open one game and its expansions, toggle its favorite
async fn browse(state: &mut BoardgamesApiActor) -> ActionResult {
    let listed: BoardgameResponseData = state
        .client
        .get_json("/api/v3/boardgames", "/api/v3/boardgames", Some(&state.session))
        .await?;
    state
        .games
        .refresh(listed.game_array.into_iter().map(|game| game.game_id));

    let Some(game_id) = state.games.pick(&mut state.rng) else {
        return Ok(Completion::Skipped);
    };
    let _: BoardgameData = state
        .client
        .get_json(
            &format!("/api/v3/boardgames/{game_id}"),
            "/api/v3/boardgames/:game_id",
            Some(&state.session),
        )
        .await?;
    state
        .client
        .get_ok(
            &format!("/api/v3/boardgames/expansions/{game_id}"),
            "/api/v3/boardgames/expansions/:game_id",
            Some(&state.session),
        )
        .await?;

    let path = format!("/api/v3/boardgames/{game_id}/favorite");
    state
        .client
        .post_empty(&path, "/api/v3/boardgames/:game_id/favorite", Some(&state.session))
        .await?;
    state
        .client
        .delete_ok(&path, "/api/v3/boardgames/:game_id/favorite", Some(&state.session))
        .await?;
    Ok(Completion::Done)
}

async fn search(state: &mut BoardgamesApiActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/boardgames?search=catan",
            "/api/v3/boardgames?search",
            Some(&state.session),
        )
        .await?;
    Ok(Completion::Done)
}

async fn favorites(state: &mut BoardgamesApiActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/boardgames?favorite=true",
            "/api/v3/boardgames?favorite",
            Some(&state.session),
        )
        .await?;
    Ok(Completion::Done)
}

// ============================================================================
// boardgames_web
// ============================================================================

/// Browses the game pages, with the API supplying IDs for the deep links
pub struct BoardgamesWebActor {
    client: ApiClient,
    session: UserSession,
    rng: ActorRng,
}

#[async_trait]
impl Actor for BoardgamesWebActor {
    const KIND: &'static str = "boardgames_web";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let account = ctx.roster().second()?;
        client
            .login_web(account)
            .await
            .map_err(|err| BootstrapError::login(&account.username, err))?;
        let session = login(&client, account).await?;
        Ok(Self {
            client,
            session,
            rng: ctx.rng(),
        })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("games_page", 3, games_page))
            .register(action!("search_page", 1, search_page))
            .register(action!("create_fez_page", 1, create_fez_page))
    }
}

async fn games_page(state: &mut BoardgamesWebActor) -> ActionResult {
    state.client.get_ok("/boardgames", "/boardgames", None).await?;
    Ok(Completion::Done)
}

async fn search_page(state: &mut BoardgamesWebActor) -> ActionResult {
    state
        .client
        .get_ok("/boardgames?search=star", "/boardgames?search", None)
        .await?;
    Ok(Completion::Done)
}

/// Open the "plan a game night" page for a random game
async fn create_fez_page(state: &mut BoardgamesWebActor) -> ActionResult {
    let listed: BoardgameResponseData = state
        .client
        .get_json("/api/v3/boardgames", "/api/v3/boardgames", Some(&state.session))
        .await?;
    if listed.game_array.is_empty() {
        return Ok(Completion::Skipped);
    }
    let game = &listed.game_array[state.rng.random_range(0..listed.game_array.len())];
    state
        .client
        .get_ok(
            &format!("/boardgames/{}/createfez", game.game_id),
            "/boardgames/:game_id/createfez",
            None,
        )
        .await?;
    Ok(Completion::Done)
}
