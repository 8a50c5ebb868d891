//! Forum traffic
//!
//! The API kind works the category/thread/post tree through `/api/v3/forum`;
//! the web kind walks the rendered `/forums` pages. Thread and post targets
//! come from live listings, so a bare category makes the chain skip rather
//! than fail.

use async_trait::async_trait;
use rand::Rng;

use crate::action;
use crate::api::models::{
    CategoryData, CategoryForumsData, ForumCreateData, ForumData, PostContentData, PostData,
};
use crate::api::{ApiClient, ApiError};
use crate::harness::{
    ActionResult, ActionSet, Actor, ActorRng, BootstrapContext, BootstrapError, Completion,
};
use crate::session::{IdCache, UserSession};

use super::{login, stamp};

/// Category reads land here
const READING_CATEGORY: &str = "Egype";
/// Creates, renames, and favorites land here
const SCRATCH_CATEGORY: &str = "Lower Decks";
/// The web kind browses this category's threads
const WEB_CATEGORY: &str = "Event Forums";

/// Fetch the category list and find one by title
async fn find_category(
    client: &ApiClient,
    auth: &UserSession,
    title: &str,
) -> Result<Option<CategoryData>, ApiError> {
    let categories: Vec<CategoryData> = client
        .get_json(
            "/api/v3/forum/categories",
            "/api/v3/forum/categories",
            Some(auth),
        )
        .await?;
    Ok(categories.into_iter().find(|category| category.title == title))
}

/// Fetch one category's thread listing
async fn category_threads(
    client: &ApiClient,
    auth: &UserSession,
    category_id: &str,
) -> Result<CategoryForumsData, ApiError> {
    client
        .get_json(
            &format!("/api/v3/forum/categories/{category_id}"),
            "/api/v3/forum/categories/:category_id",
            Some(auth),
        )
        .await
}

/// Create a thread in the given category and return it with its seed post
async fn create_thread(
    client: &ApiClient,
    auth: &UserSession,
    category_id: &str,
    title: String,
) -> Result<ForumData, ApiError> {
    client
        .post_json(
            &format!("/api/v3/forum/categories/{category_id}/create"),
            "/api/v3/forum/categories/:category_id/create",
            Some(auth),
            &ForumCreateData {
                title,
                first_post: PostContentData::text("Starting this one off"),
            },
        )
        .await
}

/// Add one reply to a thread
async fn add_reply(
    client: &ApiClient,
    auth: &UserSession,
    forum_id: &str,
    text: &str,
) -> Result<PostData, ApiError> {
    client
        .post_json(
            &format!("/api/v3/forum/{forum_id}/create"),
            "/api/v3/forum/:forum_id/create",
            Some(auth),
            &PostContentData::text(text),
        )
        .await
}

// ============================================================================
// forum_api
// ============================================================================

/// Reads, authors, and curates forums through `/api/v3/forum`
pub struct ForumApiActor {
    client: ApiClient,
    reader: UserSession,
    author: UserSession,
    curator: UserSession,
    rng: ActorRng,
}

#[async_trait]
impl Actor for ForumApiActor {
    const KIND: &'static str = "forum_api";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let roster = ctx.roster();
        let reader = login(&client, roster.first()?).await?;
        let author = login(&client, roster.second()?).await?;
        let curator = login(&client, roster.third()?).await?;
        Ok(Self {
            client,
            reader,
            author,
            curator,
            rng: ctx.rng(),
        })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("read_forum", 3, read_forum))
            .register(action!("search_forums", 1, search_forums))
            .register(action!("search_posts", 1, search_posts))
            .register(action!("own_forums", 1, own_forums))
            .register(action!("create_forum", 1, create_forum))
            .register(action!("rename_forum", 1, rename_forum))
            .register(action!("favorite_forum", 1, favorite_forum))
    }
}

/// Walk categories to a thread, then toggle reactions on someone else's post
async fn read_forum(state: &mut ForumApiActor) -> ActionResult {
    let Some(category) = find_category(&state.client, &state.reader, READING_CATEGORY).await?
    else {
        return Ok(Completion::Skipped);
    };
    let threads = category_threads(&state.client, &state.reader, &category.category_id).await?;
    let Some(thread) = threads.forum_threads.first() else {
        return Ok(Completion::Skipped);
    };
    let forum: ForumData = state
        .client
        .get_json(
            &format!("/api/v3/forum/{}", thread.forum_id),
            "/api/v3/forum/:forum_id",
            Some(&state.reader),
        )
        .await?;

    let foreign: Vec<&PostData> = forum
        .posts
        .iter()
        .filter(|post| post.author.username != state.reader.username)
        .collect();
    if foreign.is_empty() {
        return Ok(Completion::Skipped);
    }
    let post = foreign[state.rng.random_range(0..foreign.len())];

    let base = format!("/api/v3/forum/post/{}", post.post_id);
    state
        .client
        .post_empty(
            &format!("{base}/like"),
            "/api/v3/forum/post/:post_id/like",
            Some(&state.reader),
        )
        .await?;
    state
        .client
        .post_empty(
            &format!("{base}/unreact"),
            "/api/v3/forum/post/:post_id/unreact",
            Some(&state.reader),
        )
        .await?;
    state
        .client
        .post_empty(
            &format!("{base}/bookmark"),
            "/api/v3/forum/post/:post_id/bookmark",
            Some(&state.reader),
        )
        .await?;
    state
        .client
        .post_empty(
            &format!("{base}/bookmark/remove"),
            "/api/v3/forum/post/:post_id/bookmark/remove",
            Some(&state.reader),
        )
        .await?;
    Ok(Completion::Done)
}

async fn search_forums(state: &mut ForumApiActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/forum/match/hello",
            "/api/v3/forum/match/:string",
            Some(&state.reader),
        )
        .await?;
    Ok(Completion::Done)
}

async fn search_posts(state: &mut ForumApiActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/forum/post/search?search=hello",
            "/api/v3/forum/post/search",
            Some(&state.reader),
        )
        .await?;
    Ok(Completion::Done)
}

async fn own_forums(state: &mut ForumApiActor) -> ActionResult {
    state
        .client
        .get_ok("/api/v3/forum/owner", "/api/v3/forum/owner", Some(&state.reader))
        .await?;
    Ok(Completion::Done)
}

/// New thread, two replies, then read and delete the second reply
async fn create_forum(state: &mut ForumApiActor) -> ActionResult {
    let Some(category) = find_category(&state.client, &state.author, SCRATCH_CATEGORY).await?
    else {
        return Ok(Completion::Skipped);
    };
    let n = stamp(&mut state.rng);
    let forum = create_thread(
        &state.client,
        &state.author,
        &category.category_id,
        format!("Shuffleboard standings #{n}"),
    )
    .await?;
    let _: PostData = add_reply(
        &state.client,
        &state.author,
        &forum.forum_id,
        "Current champion checking in",
    )
    .await?;
    let second = add_reply(
        &state.client,
        &state.author,
        &forum.forum_id,
        "Posting the bracket shortly",
    )
    .await?;

    let fetched: PostData = state
        .client
        .get_json(
            &format!("/api/v3/forum/post/{}", second.post_id),
            "/api/v3/forum/post/:post_id",
            Some(&state.author),
        )
        .await?;
    state
        .client
        .post_empty(
            &format!("/api/v3/forum/post/{}/delete", fetched.post_id),
            "/api/v3/forum/post/:post_id/delete",
            Some(&state.author),
        )
        .await?;
    Ok(Completion::Done)
}

/// New thread with one reply; edit the reply, then retitle the thread
async fn rename_forum(state: &mut ForumApiActor) -> ActionResult {
    let Some(category) = find_category(&state.client, &state.author, SCRATCH_CATEGORY).await?
    else {
        return Ok(Completion::Skipped);
    };
    let n = stamp(&mut state.rng);
    let forum = create_thread(
        &state.client,
        &state.author,
        &category.category_id,
        format!("Deck games #{n}"),
    )
    .await?;
    let reply = add_reply(
        &state.client,
        &state.author,
        &forum.forum_id,
        "Sign-ups open",
    )
    .await?;

    state
        .client
        .post_ok(
            &format!("/api/v3/forum/post/{}/update", reply.post_id),
            "/api/v3/forum/post/:post_id/update",
            Some(&state.author),
            &PostContentData::text("Sign-ups open until noon"),
        )
        .await?;
    // The new name rides in the path; the URL layer percent-encodes it
    state
        .client
        .post_empty(
            &format!("/api/v3/forum/{}/rename/Deck games {n} final", forum.forum_id),
            "/api/v3/forum/:forum_id/rename/:new_name",
            Some(&state.author),
        )
        .await?;
    Ok(Completion::Done)
}

/// Favorite a random scratch-category thread, then unfavorite it
async fn favorite_forum(state: &mut ForumApiActor) -> ActionResult {
    let Some(category) = find_category(&state.client, &state.curator, SCRATCH_CATEGORY).await?
    else {
        return Ok(Completion::Skipped);
    };
    let threads = category_threads(&state.client, &state.curator, &category.category_id).await?;
    if threads.forum_threads.is_empty() {
        return Ok(Completion::Skipped);
    }
    let thread = &threads.forum_threads[state.rng.random_range(0..threads.forum_threads.len())];

    let path = format!("/api/v3/forum/{}/favorite", thread.forum_id);
    state
        .client
        .post_empty(&path, "/api/v3/forum/:forum_id/favorite", Some(&state.curator))
        .await?;
    state
        .client
        .delete_ok(&path, "/api/v3/forum/:forum_id/favorite", Some(&state.curator))
        .await?;
    Ok(Completion::Done)
}

// ============================================================================
// forum_web
// ============================================================================

/// Walks the rendered forum pages, anchored on one category's threads
pub struct ForumWebActor {
    client: ApiClient,
    category_id: Option<String>,
    threads: IdCache<String>,
    rng: ActorRng,
}

#[async_trait]
impl Actor for ForumWebActor {
    const KIND: &'static str = "forum_web";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let account = ctx.roster().third()?;
        client
            .login_web(account)
            .await
            .map_err(|err| BootstrapError::login(&account.username, err))?;
        let session = login(&client, account).await?;

        let mut category_id = None;
        let mut threads = IdCache::new();
        if let Some(category) = find_category(&client, &session, WEB_CATEGORY).await? {
            let listing = category_threads(&client, &session, &category.category_id).await?;
            threads.refresh(listing.forum_threads.into_iter().map(|t| t.forum_id));
            category_id = Some(category.category_id);
        }

        Ok(Self {
            client,
            category_id,
            threads,
            rng: ctx.rng(),
        })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("categories_page", 3, categories_page))
            .register(action!("category_page", 2, category_page))
            .register(action!("thread_page", 2, thread_page))
            .register(action!("search_forums", 1, web_search_forums))
            .register(action!("search_posts", 1, web_search_posts))
            .register(action!("favorites_page", 1, favorites_page))
            .register(action!("owned_page", 1, owned_page))
            .register(action!("post_mentions", 1, post_mentions))
            .register(action!("post_favorites", 1, post_favorites))
            .register(action!("own_posts", 1, own_posts))
            .register(action!("post_search", 1, post_search))
    }
}

async fn categories_page(state: &mut ForumWebActor) -> ActionResult {
    state.client.get_ok("/forums", "/forums", None).await?;
    Ok(Completion::Done)
}

async fn category_page(state: &mut ForumWebActor) -> ActionResult {
    let Some(category_id) = &state.category_id else {
        return Ok(Completion::Skipped);
    };
    state
        .client
        .get_ok(
            &format!("/forums/{category_id}"),
            "/forums/:category_id",
            None,
        )
        .await?;
    Ok(Completion::Done)
}

async fn thread_page(state: &mut ForumWebActor) -> ActionResult {
    let Some(forum_id) = state.threads.pick(&mut state.rng) else {
        return Ok(Completion::Skipped);
    };
    state
        .client
        .get_ok(&format!("/forum/{forum_id}"), "/forum/:forum_id", None)
        .await?;
    Ok(Completion::Done)
}

async fn web_search_forums(state: &mut ForumWebActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/forum/search?search=lido&searchType=forums",
            "/forum/search?search=lido&searchType=forums",
            None,
        )
        .await?;
    Ok(Completion::Done)
}

async fn web_search_posts(state: &mut ForumWebActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/forum/search?search=lido&searchType=posts",
            "/forum/search?search=lido&searchType=posts",
            None,
        )
        .await?;
    Ok(Completion::Done)
}

async fn favorites_page(state: &mut ForumWebActor) -> ActionResult {
    state
        .client
        .get_ok("/forum/favorites", "/forum/favorites", None)
        .await?;
    Ok(Completion::Done)
}

async fn owned_page(state: &mut ForumWebActor) -> ActionResult {
    state.client.get_ok("/forum/owned", "/forum/owned", None).await?;
    Ok(Completion::Done)
}

async fn post_mentions(state: &mut ForumWebActor) -> ActionResult {
    state
        .client
        .get_ok("/forumpost/mentions", "/forumpost/mentions", None)
        .await?;
    Ok(Completion::Done)
}

async fn post_favorites(state: &mut ForumWebActor) -> ActionResult {
    state
        .client
        .get_ok("/forumpost/favorite", "/forumpost/favorite", None)
        .await?;
    Ok(Completion::Done)
}

async fn own_posts(state: &mut ForumWebActor) -> ActionResult {
    state
        .client
        .get_ok("/forumpost/owned", "/forumpost/owned", None)
        .await?;
    Ok(Completion::Done)
}

async fn post_search(state: &mut ForumWebActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/forumpost/search?search=hello",
            "/forumpost/search?search=hello",
            None,
        )
        .await?;
    Ok(Completion::Done)
}
