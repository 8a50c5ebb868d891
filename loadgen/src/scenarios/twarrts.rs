//! Microblog traffic, over the versioned API and over the web paths
//!
//! Both kinds keep a cache of twarrt IDs they have seen, so reads and
//! reactions land on real content. An empty cache skips the action without
//! touching the network.

use async_trait::async_trait;

use crate::action;
use crate::api::models::{PostContentData, ReportData, TwarrtData, TwarrtDetailData, WebPostForm};
use crate::api::{ApiClient, ApiError};
use crate::harness::{
    ActionResult, ActionSet, Actor, ActorRng, BootstrapContext, BootstrapError, Completion,
};
use crate::session::{IdCache, UserSession};

use super::{login, stamp};

/// Fetch the public stream and return the IDs it carries
async fn stream_ids(client: &ApiClient, auth: &UserSession) -> Result<Vec<i64>, ApiError> {
    let stream: Vec<TwarrtData> = client
        .get_json("/api/v3/twitarr", "/api/v3/twitarr", Some(auth))
        .await?;
    Ok(stream.into_iter().map(|twarrt| twarrt.twarrt_id).collect())
}

/// Create one twarrt and return its ID
async fn create_twarrt(
    client: &ApiClient,
    auth: &UserSession,
    text: &str,
) -> Result<i64, ApiError> {
    let created: TwarrtData = client
        .post_json(
            "/api/v3/twitarr/create",
            "/api/v3/twitarr/create",
            Some(auth),
            &PostContentData::text(text),
        )
        .await?;
    Ok(created.twarrt_id)
}

// ============================================================================
// twarrt_api
// ============================================================================

/// Reads, writes, and reacts through `/api/v3/twitarr`
pub struct TwarrtApiActor {
    client: ApiClient,
    poster: UserSession,
    reactor: UserSession,
    bookmarker: UserSession,
    twarrts: IdCache<i64>,
    rng: ActorRng,
}

#[async_trait]
impl Actor for TwarrtApiActor {
    const KIND: &'static str = "twarrt_api";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let roster = ctx.roster();
        let poster = login(&client, roster.first()?).await?;
        let reactor = login(&client, roster.second()?).await?;
        let bookmarker = login(&client, roster.third()?).await?;

        let mut twarrts = IdCache::new();
        twarrts.refresh(stream_ids(&client, &poster).await?);

        Ok(Self {
            client,
            poster,
            reactor,
            bookmarker,
            twarrts,
            rng: ctx.rng(),
        })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("read_stream", 3, read_stream))
            .register(action!("read_detail", 3, read_detail))
            .register(action!("create_and_react", 1, create_and_react))
            .register(action!("create_and_delete", 1, create_and_delete))
            .register(action!("reply", 2, reply))
            .register(action!("report", 1, report))
    }
}

async fn read_stream(state: &mut TwarrtApiActor) -> ActionResult {
    let ids = stream_ids(&state.client, &state.poster).await?;
    state.twarrts.refresh(ids);
    Ok(Completion::Done)
}

async fn read_detail(state: &mut TwarrtApiActor) -> ActionResult {
    let Some(id) = state.twarrts.pick(&mut state.rng) else {
        return Ok(Completion::Skipped);
    };
    let _: TwarrtDetailData = state
        .client
        .get_json(
            &format!("/api/v3/twitarr/{id}"),
            "/api/v3/twitarr/:twarrt_id",
            Some(&state.poster),
        )
        .await?;
    Ok(Completion::Done)
}

/// One post, loved and liked by the others, then edited by its author
async fn create_and_react(state: &mut TwarrtApiActor) -> ActionResult {
    let n = stamp(&mut state.rng);
    let id = create_twarrt(
        &state.client,
        &state.poster,
        &format!("Sunrise on the lido deck, not bad at all #{n}"),
    )
    .await?;
    let base = format!("/api/v3/twitarr/{id}");

    state
        .client
        .post_empty(
            &format!("{base}/love"),
            "/api/v3/twitarr/:twarrt_id/love",
            Some(&state.reactor),
        )
        .await?;
    state
        .client
        .post_empty(
            &format!("{base}/like"),
            "/api/v3/twitarr/:twarrt_id/like",
            Some(&state.reactor),
        )
        .await?;
    state
        .client
        .post_empty(
            &format!("{base}/love"),
            "/api/v3/twitarr/:twarrt_id/love",
            Some(&state.bookmarker),
        )
        .await?;
    state
        .client
        .post_empty(
            &format!("{base}/unreact"),
            "/api/v3/twitarr/:twarrt_id/unreact",
            Some(&state.bookmarker),
        )
        .await?;
    state
        .client
        .post_empty(
            &format!("{base}/bookmark"),
            "/api/v3/twitarr/:twarrt_id/bookmark",
            Some(&state.bookmarker),
        )
        .await?;
    state
        .client
        .post_empty(
            &format!("{base}/bookmark/remove"),
            "/api/v3/twitarr/:twarrt_id/bookmark/remove",
            Some(&state.bookmarker),
        )
        .await?;
    state
        .client
        .post_ok(
            &format!("{base}/update"),
            "/api/v3/twitarr/:twarrt_id/update",
            Some(&state.poster),
            &PostContentData::text(&format!("Sunrise on the lido deck, glorious even #{n}")),
        )
        .await?;

    state.twarrts.remember(id);
    Ok(Completion::Done)
}

async fn create_and_delete(state: &mut TwarrtApiActor) -> ActionResult {
    let n = stamp(&mut state.rng);
    let id = create_twarrt(
        &state.client,
        &state.poster,
        &format!("Posting this by accident #{n}"),
    )
    .await?;
    state
        .client
        .delete_ok(
            &format!("/api/v3/twitarr/{id}"),
            "/api/v3/twitarr/:twarrt_id",
            Some(&state.poster),
        )
        .await?;
    Ok(Completion::Done)
}

async fn reply(state: &mut TwarrtApiActor) -> ActionResult {
    let Some(id) = state.twarrts.pick(&mut state.rng) else {
        return Ok(Completion::Skipped);
    };
    let n = stamp(&mut state.rng);
    let created: TwarrtData = state
        .client
        .post_json(
            &format!("/api/v3/twitarr/{id}/reply"),
            "/api/v3/twitarr/:twarrt_id/reply",
            Some(&state.reactor),
            &PostContentData::text(&format!("Couldn't agree more #{n}")),
        )
        .await?;
    state.twarrts.remember(created.twarrt_id);
    Ok(Completion::Done)
}

async fn report(state: &mut TwarrtApiActor) -> ActionResult {
    let n = stamp(&mut state.rng);
    let id = create_twarrt(
        &state.client,
        &state.poster,
        &format!("Extremely reportable content #{n}"),
    )
    .await?;
    state
        .client
        .post_ok(
            &format!("/api/v3/twitarr/{id}/report"),
            "/api/v3/twitarr/:twarrt_id/report",
            Some(&state.reactor),
            &ReportData {
                message: "This one seemed off".to_string(),
            },
        )
        .await?;
    Ok(Completion::Done)
}

// ============================================================================
// twarrt_web
// ============================================================================

/// Browses and posts through the `/tweets` web paths, with the API filling
/// in IDs the pages would normally carry
pub struct TwarrtWebActor {
    client: ApiClient,
    session: UserSession,
    twarrts: IdCache<i64>,
    rng: ActorRng,
}

#[async_trait]
impl Actor for TwarrtWebActor {
    const KIND: &'static str = "twarrt_web";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let account = ctx.roster().first()?;
        client
            .login_web(account)
            .await
            .map_err(|err| BootstrapError::login(&account.username, err))?;
        let session = login(&client, account).await?;

        let mut twarrts = IdCache::new();
        twarrts.refresh(stream_ids(&client, &session).await?);

        Ok(Self {
            client,
            session,
            twarrts,
            rng: ctx.rng(),
        })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("tweets_page", 3, tweets_page))
            .register(action!("tweet_detail", 2, tweet_detail))
            .register(action!("mentions", 1, mentions))
            .register(action!("reply_thread", 1, reply_thread))
            .register(action!("edit_page", 1, edit_page))
            .register(action!("bookmark_toggle", 1, bookmark_toggle))
            .register(action!("compose_edit_delete", 1, compose_edit_delete))
    }
}

async fn tweets_page(state: &mut TwarrtWebActor) -> ActionResult {
    state.client.get_ok("/tweets", "/tweets", None).await?;
    Ok(Completion::Done)
}

/// Open a tweet page; when it belongs to someone else, toggle a like on it
async fn tweet_detail(state: &mut TwarrtWebActor) -> ActionResult {
    let Some(id) = state.twarrts.pick(&mut state.rng) else {
        return Ok(Completion::Skipped);
    };
    state
        .client
        .get_ok(&format!("/tweets/{id}"), "/tweets/:twarrt_id", None)
        .await?;
    let detail: TwarrtDetailData = state
        .client
        .get_json(
            &format!("/api/v3/twitarr/{id}"),
            "/api/v3/twitarr/:twarrt_id",
            Some(&state.session),
        )
        .await?;
    if detail.author.username != state.session.username {
        state
            .client
            .post_empty(&format!("/tweets/{id}/like"), "/tweets/:twarrt_id/like", None)
            .await?;
        state
            .client
            .post_empty(
                &format!("/tweets/{id}/unreact"),
                "/tweets/:twarrt_id/unreact",
                None,
            )
            .await?;
    }
    Ok(Completion::Done)
}

async fn mentions(state: &mut TwarrtWebActor) -> ActionResult {
    state
        .client
        .get_ok("/tweets?mentionSelf=true", "/tweets?mentionSelf", None)
        .await?;
    Ok(Completion::Done)
}

async fn reply_thread(state: &mut TwarrtWebActor) -> ActionResult {
    let Some(id) = state.twarrts.pick(&mut state.rng) else {
        return Ok(Completion::Skipped);
    };
    state
        .client
        .get_ok(
            &format!("/tweets?replyGroup={id}"),
            "/tweets?replyGroup=:twarrt_id",
            None,
        )
        .await?;
    Ok(Completion::Done)
}

async fn edit_page(state: &mut TwarrtWebActor) -> ActionResult {
    let Some(id) = state.twarrts.pick(&mut state.rng) else {
        return Ok(Completion::Skipped);
    };
    state
        .client
        .get_ok(
            &format!("/tweets/edit/{id}"),
            "/tweets/edit/:twarrt_id",
            None,
        )
        .await?;
    Ok(Completion::Done)
}

async fn bookmark_toggle(state: &mut TwarrtWebActor) -> ActionResult {
    let Some(id) = state.twarrts.pick(&mut state.rng) else {
        return Ok(Completion::Skipped);
    };
    let path = format!("/tweets/{id}/bookmark");
    state
        .client
        .post_empty(&path, "/tweets/:twarrt_id/bookmark", None)
        .await?;
    state
        .client
        .delete_ok(&path, "/tweets/:twarrt_id/bookmark", None)
        .await?;
    Ok(Completion::Done)
}

/// The full web posting loop: compose, edit, reply, delete
async fn compose_edit_delete(state: &mut TwarrtWebActor) -> ActionResult {
    let n = stamp(&mut state.rng);
    state
        .client
        .post_ok(
            "/tweets/create",
            "/tweets/create",
            None,
            &WebPostForm {
                post_text: format!("Trivia night at the aft bar #{n}"),
            },
        )
        .await?;

    // The page flow has the new ID in the rendered HTML; take it from the
    // API instead.
    let id = create_twarrt(
        &state.client,
        &state.session,
        &format!("Trivia night moved to the forward bar #{n}"),
    )
    .await?;

    state
        .client
        .post_ok(
            &format!("/tweets/edit/{id}"),
            "/tweets/edit/:twarrt_id",
            None,
            &WebPostForm {
                post_text: format!("Trivia night moved again, promenade #{n}"),
            },
        )
        .await?;
    state
        .client
        .post_ok(
            &format!("/tweets/reply/{id}"),
            "/tweets/reply/:twarrt_id",
            None,
            &WebPostForm {
                post_text: "See you there".to_string(),
            },
        )
        .await?;
    state
        .client
        .post_empty(
            &format!("/tweets/{id}/delete"),
            "/tweets/:twarrt_id/delete",
            None,
        )
        .await?;
    state.twarrts.forget(&id);
    Ok(Completion::Done)
}
