//! Private group messaging ("fez" on the wire, "seamail" on the pages)

use async_trait::async_trait;

use crate::action;
use crate::api::models::{
    FezContentData, FezData, FezPostData, PostContentData, SeamailComposeForm,
};
use crate::api::{ApiClient, ApiError};
use crate::harness::{
    ActionResult, ActionSet, Actor, ActorRng, BootstrapContext, BootstrapError, Completion,
};
use crate::session::{IdCache, UserSession};

use super::{login, stamp};

/// Create a closed conversation and return it
async fn create_fez(
    client: &ApiClient,
    auth: &UserSession,
    title: String,
    participants: Vec<String>,
) -> Result<FezData, ApiError> {
    client
        .post_json(
            "/api/v3/fez/create",
            "/api/v3/fez/create",
            Some(auth),
            &FezContentData::closed(&title, "Meet me at the gangway", participants),
        )
        .await
}

// ============================================================================
// seamail_api
// ============================================================================

/// Creates conversations, posts into them, and reads them back, all over
/// `/api/v3/fez`
pub struct SeamailApiActor {
    client: ApiClient,
    owner: UserSession,
    guest: UserSession,
    other_guest: UserSession,
    fezzes: IdCache<String>,
    rng: ActorRng,
}

#[async_trait]
impl Actor for SeamailApiActor {
    const KIND: &'static str = "seamail_api";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let roster = ctx.roster();
        let guest = login(&client, roster.first()?).await?;
        let owner = login(&client, roster.second()?).await?;
        let other_guest = login(&client, roster.third()?).await?;
        let mut rng = ctx.rng();

        // One seed conversation so posting has somewhere to land right away
        let n = stamp(&mut rng);
        let seed = create_fez(
            &client,
            &owner,
            format!("Muster station chat #{n}"),
            vec![guest.user_id.clone(), other_guest.user_id.clone()],
        )
        .await?;
        let mut fezzes = IdCache::new();
        fezzes.remember(seed.fez_id);

        Ok(Self {
            client,
            owner,
            guest,
            other_guest,
            fezzes,
            rng,
        })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("joined_list", 3, joined_list))
            .register(action!("owned_list", 1, owned_list))
            .register(action!("create_and_fetch", 1, create_and_fetch))
            .register(action!("post_and_delete", 2, post_and_delete))
    }
}

async fn joined_list(state: &mut SeamailApiActor) -> ActionResult {
    let joined: Vec<FezData> = state
        .client
        .get_json(
            "/api/v3/fez/joined?type=private",
            "/api/v3/fez/joined?type",
            Some(&state.owner),
        )
        .await?;
    state.fezzes.refresh(joined.into_iter().map(|fez| fez.fez_id));
    Ok(Completion::Done)
}

async fn owned_list(state: &mut SeamailApiActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/api/v3/fez/owner?type=private",
            "/api/v3/fez/owner?type",
            Some(&state.owner),
        )
        .await?;
    Ok(Completion::Done)
}

/// New conversation; both invitees open it
async fn create_and_fetch(state: &mut SeamailApiActor) -> ActionResult {
    let n = stamp(&mut state.rng);
    let fez = create_fez(
        &state.client,
        &state.owner,
        format!("Shore excursion plans #{n}"),
        vec![state.guest.user_id.clone(), state.other_guest.user_id.clone()],
    )
    .await?;

    let path = format!("/api/v3/fez/{}", fez.fez_id);
    let _: FezData = state
        .client
        .get_json(&path, "/api/v3/fez/:fez_id", Some(&state.guest))
        .await?;
    let _: FezData = state
        .client
        .get_json(&path, "/api/v3/fez/:fez_id", Some(&state.other_guest))
        .await?;

    state.fezzes.remember(fez.fez_id);
    Ok(Completion::Done)
}

/// Post into a random conversation, then delete that message
async fn post_and_delete(state: &mut SeamailApiActor) -> ActionResult {
    let Some(fez_id) = state.fezzes.pick(&mut state.rng) else {
        return Ok(Completion::Skipped);
    };
    let n = stamp(&mut state.rng);
    let posted: FezPostData = state
        .client
        .post_json(
            &format!("/api/v3/fez/{fez_id}/post"),
            "/api/v3/fez/:fez_id/post",
            Some(&state.owner),
            &PostContentData::text(&format!("Running late, hold the tender #{n}")),
        )
        .await?;
    state
        .client
        .delete_ok(
            &format!("/api/v3/fez/post/{}", posted.post_id),
            "/api/v3/fez/post/:post_id",
            Some(&state.owner),
        )
        .await?;
    Ok(Completion::Done)
}

// ============================================================================
// seamail_web
// ============================================================================

/// Reads and composes seamail through the web pages
pub struct SeamailWebActor {
    client: ApiClient,
    session: UserSession,
    /// The other participant's user ID, for compose bodies
    partner_id: String,
    rng: ActorRng,
}

#[async_trait]
impl Actor for SeamailWebActor {
    const KIND: &'static str = "seamail_web";

    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError> {
        let client = ctx.client()?;
        let roster = ctx.roster();
        let account = roster.third()?;
        client
            .login_web(account)
            .await
            .map_err(|err| BootstrapError::login(&account.username, err))?;
        let session = login(&client, account).await?;
        let partner = login(&client, roster.second()?).await?;

        Ok(Self {
            client,
            session,
            partner_id: partner.user_id,
            rng: ctx.rng(),
        })
    }

    fn actions() -> ActionSet<Self> {
        ActionSet::new()
            .register(action!("inbox_page", 3, inbox_page))
            .register(action!("compose_page", 1, compose_page))
            .register(action!("username_search", 1, username_search))
            .register(action!("compose_send", 1, compose_send))
            .register(action!("create_and_view", 1, create_and_view))
    }
}

async fn inbox_page(state: &mut SeamailWebActor) -> ActionResult {
    state.client.get_ok("/seamail", "/seamail", None).await?;
    Ok(Completion::Done)
}

async fn compose_page(state: &mut SeamailWebActor) -> ActionResult {
    state
        .client
        .get_ok("/seamail/create", "/seamail/create", None)
        .await?;
    Ok(Completion::Done)
}

async fn username_search(state: &mut SeamailWebActor) -> ActionResult {
    state
        .client
        .get_ok(
            "/seamail/usernames/search/adm",
            "/seamail/usernames/search/adm",
            None,
        )
        .await?;
    Ok(Completion::Done)
}

async fn compose_send(state: &mut SeamailWebActor) -> ActionResult {
    let n = stamp(&mut state.rng);
    state
        .client
        .post_ok(
            "/seamail/create",
            "/seamail/create",
            None,
            &SeamailComposeForm {
                subject: format!("Dinner seating #{n}"),
                post_text: "Second seating tonight?".to_string(),
                participants: state.partner_id.clone(),
            },
        )
        .await?;
    Ok(Completion::Done)
}

/// Create over the API, then open the conversation's page
async fn create_and_view(state: &mut SeamailWebActor) -> ActionResult {
    let n = stamp(&mut state.rng);
    let fez = create_fez(
        &state.client,
        &state.session,
        format!("Casino night #{n}"),
        vec![state.partner_id.clone()],
    )
    .await?;
    state
        .client
        .get_ok(&format!("/seamail/{}", fez.fez_id), "/seamail/:fez_id", None)
        .await?;
    Ok(Completion::Done)
}
