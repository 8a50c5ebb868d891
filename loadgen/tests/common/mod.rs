//! Common Test Utilities for Integration Tests
//!
//! An in-process stand-in for the target platform: enough of the API and web
//! surface for every actor kind to run against, with per-request hit counts
//! so tests can assert exactly what was (and was not) called.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::prelude::{BASE64_STANDARD, Engine as _};
use uuid::Uuid;

use shipload_loadgen::api::models::{
    BoardgameData, BoardgameResponseData, CategoryData, CategoryForumsData, EventData,
    FezContentData, FezData, FezMembersData, FezPostData, ForumCreateData, ForumData,
    ForumListData, PostContentData, PostData, SeamailComposeForm, TokenStringData, TwarrtData,
    TwarrtDetailData, UserHeader, WebLoginForm, WebPostForm,
};

const SESSION_COOKIE: &str = "twitarr_session";

// ============================================================================
// State
// ============================================================================

struct MockUser {
    id: String,
    password: String,
}

struct MockTwarrt {
    id: i64,
    author: String,
    text: String,
}

struct MockForum {
    id: String,
    category_id: String,
    title: String,
    posts: Vec<MockPost>,
}

struct MockPost {
    id: i64,
    author: String,
    text: String,
}

struct MockFez {
    id: String,
    owner: String,
    title: String,
    participants: Vec<String>,
}

pub struct PlatformState {
    users: HashMap<String, MockUser>,
    tokens: HashMap<String, String>,
    sessions: HashMap<String, String>,
    twarrts: Vec<MockTwarrt>,
    next_twarrt_id: i64,
    categories: Vec<(String, String)>,
    forums: Vec<MockForum>,
    next_post_id: i64,
    fezzes: Vec<MockFez>,
    fez_posts: Vec<(i64, String)>,
    events: Vec<(String, String)>,
    games: Vec<(String, String)>,
    songs: Vec<String>,
    hits: HashMap<String, u64>,
}

type Shared = Arc<Mutex<PlatformState>>;

impl PlatformState {
    fn new(seeded: bool) -> Self {
        let mut users = HashMap::new();
        for name in ["sam", "heidi", "james"] {
            users.insert(
                name.to_string(),
                MockUser {
                    id: Uuid::new_v4().to_string(),
                    password: "password".to_string(),
                },
            );
        }

        let categories = vec![
            ("c-egype".to_string(), "Egype".to_string()),
            ("c-lower".to_string(), "Lower Decks".to_string()),
            ("c-event".to_string(), "Event Forums".to_string()),
        ];

        let mut state = Self {
            users,
            tokens: HashMap::new(),
            sessions: HashMap::new(),
            twarrts: Vec::new(),
            next_twarrt_id: 200,
            categories,
            forums: Vec::new(),
            next_post_id: 500,
            fezzes: Vec::new(),
            fez_posts: Vec::new(),
            events: Vec::new(),
            games: Vec::new(),
            songs: Vec::new(),
            hits: HashMap::new(),
        };

        if seeded {
            state.twarrts = vec![
                MockTwarrt {
                    id: 101,
                    author: "heidi".to_string(),
                    text: "First one to the pool wins".to_string(),
                },
                MockTwarrt {
                    id: 102,
                    author: "james".to_string(),
                    text: "The buffet has outdone itself".to_string(),
                },
                MockTwarrt {
                    id: 103,
                    author: "heidi".to_string(),
                    text: "Spotted dolphins off the port side".to_string(),
                },
            ];
            state.forums = vec![
                MockForum {
                    id: "f-401".to_string(),
                    category_id: "c-egype".to_string(),
                    title: "Pool deck conditions".to_string(),
                    posts: vec![
                        MockPost {
                            id: 401,
                            author: "heidi".to_string(),
                            text: "Windy but warm".to_string(),
                        },
                        MockPost {
                            id: 402,
                            author: "james".to_string(),
                            text: "Towels restocked".to_string(),
                        },
                    ],
                },
                MockForum {
                    id: "f-410".to_string(),
                    category_id: "c-lower".to_string(),
                    title: "Crew talent show".to_string(),
                    posts: vec![MockPost {
                        id: 410,
                        author: "james".to_string(),
                        text: "Sign-up sheet is by the galley".to_string(),
                    }],
                },
                MockForum {
                    id: "f-420".to_string(),
                    category_id: "c-event".to_string(),
                    title: "Trivia night recap".to_string(),
                    posts: vec![MockPost {
                        id: 420,
                        author: "heidi".to_string(),
                        text: "Table six was robbed".to_string(),
                    }],
                },
            ];
            state.events = vec![
                ("ev-1".to_string(), "Welcome Aboard Cruise Kickoff".to_string()),
                ("ev-2".to_string(), "Midnight Buffet".to_string()),
                ("ev-3".to_string(), "Farewell Cruise Gala".to_string()),
            ];
            state.games = vec![
                ("g-1".to_string(), "Catan".to_string()),
                ("g-2".to_string(), "Star Realms".to_string()),
                ("g-3".to_string(), "Twilight Struggle".to_string()),
            ];
            state.songs = vec![
                "Radiohead - Creep".to_string(),
                "Prince - Kiss".to_string(),
                "Queen - Bohemian Rhapsody".to_string(),
            ];
        }

        state
    }

    fn header_for(&self, username: &str) -> UserHeader {
        UserHeader {
            user_id: self
                .users
                .get(username)
                .map(|user| user.id.clone())
                .unwrap_or_default(),
            username: username.to_string(),
        }
    }

    fn username_for_id(&self, user_id: &str) -> Option<String> {
        self.users
            .iter()
            .find(|(_, user)| user.id == user_id)
            .map(|(name, _)| name.clone())
    }

    fn twarrt_data(&self, twarrt: &MockTwarrt) -> TwarrtData {
        TwarrtData {
            twarrt_id: twarrt.id,
            author: self.header_for(&twarrt.author),
            text: twarrt.text.clone(),
        }
    }

    fn post_data(&self, post: &MockPost) -> PostData {
        PostData {
            post_id: post.id,
            author: self.header_for(&post.author),
            text: post.text.clone(),
        }
    }

    fn fez_data(&self, fez: &MockFez) -> FezData {
        FezData {
            fez_id: fez.id.clone(),
            owner: self.header_for(&fez.owner),
            title: fez.title.clone(),
            members: Some(FezMembersData {
                participants: fez
                    .participants
                    .iter()
                    .map(|name| self.header_for(name))
                    .collect(),
            }),
        }
    }
}

// ============================================================================
// Auth helpers
// ============================================================================

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(BASE64_STANDARD.decode(encoded).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn bearer_user(state: &PlatformState, headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    state.tokens.get(token).cloned()
}

fn cookie_user(state: &PlatformState, headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::COOKIE)?.to_str().ok()?;
    let session = value
        .split(';')
        .find_map(|part| part.trim().strip_prefix(&format!("{SESSION_COOKIE}=")))?;
    state.sessions.get(session).cloned()
}

// ============================================================================
// Handlers: auth and web session
// ============================================================================

async fn api_login(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = shared.lock().unwrap();
    let Some((username, password)) = basic_credentials(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let user_id = match state.users.get(&username) {
        Some(user) if user.password == password => user.id.clone(),
        _ => return StatusCode::UNAUTHORIZED.into_response(),
    };
    let token = Uuid::new_v4().simple().to_string();
    state.tokens.insert(token.clone(), username);
    Json(TokenStringData { token, user_id }).into_response()
}

async fn web_login(State(shared): State<Shared>, Json(form): Json<WebLoginForm>) -> Response {
    let mut state = shared.lock().unwrap();
    match state.users.get(&form.username) {
        Some(user) if user.password == form.password => {}
        _ => return StatusCode::UNAUTHORIZED.into_response(),
    }
    let session = Uuid::new_v4().simple().to_string();
    state.sessions.insert(session.clone(), form.username);
    let cookie = format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly");
    ([(header::SET_COOKIE, cookie)], page_body()).into_response()
}

fn page_body() -> Html<&'static str> {
    Html("<html><body>aboard</body></html>")
}

async fn page() -> Html<&'static str> {
    page_body()
}

// ============================================================================
// Handlers: twarrts
// ============================================================================

async fn twarrt_stream(State(shared): State<Shared>) -> Json<Vec<TwarrtData>> {
    let state = shared.lock().unwrap();
    Json(state.twarrts.iter().map(|t| state.twarrt_data(t)).collect())
}

async fn twarrt_detail(State(shared): State<Shared>, Path(twarrt_id): Path<i64>) -> Response {
    let state = shared.lock().unwrap();
    match state.twarrts.iter().find(|t| t.id == twarrt_id) {
        Some(twarrt) => Json(TwarrtDetailData {
            post_id: twarrt.id,
            author: state.header_for(&twarrt.author),
            text: twarrt.text.clone(),
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn push_twarrt(state: &mut PlatformState, author: String, text: String) -> TwarrtData {
    let id = state.next_twarrt_id;
    state.next_twarrt_id += 1;
    state.twarrts.push(MockTwarrt {
        id,
        author,
        text,
    });
    let twarrt = state.twarrts.last().unwrap();
    TwarrtData {
        twarrt_id: twarrt.id,
        author: state.header_for(&twarrt.author),
        text: twarrt.text.clone(),
    }
}

async fn twarrt_create(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<PostContentData>,
) -> Response {
    let mut state = shared.lock().unwrap();
    let Some(author) = bearer_user(&state, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let created = push_twarrt(&mut state, author, body.text);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn twarrt_reply(
    State(shared): State<Shared>,
    Path(twarrt_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<PostContentData>,
) -> Response {
    let mut state = shared.lock().unwrap();
    let Some(author) = bearer_user(&state, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if !state.twarrts.iter().any(|t| t.id == twarrt_id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let created = push_twarrt(&mut state, author, body.text);
    (StatusCode::CREATED, Json(created)).into_response()
}

/// Reaction, bookmark, update, and report endpoints share one shape: the
/// twarrt must exist and the caller must hold a token
async fn twarrt_touch(
    State(shared): State<Shared>,
    Path(twarrt_id): Path<i64>,
    headers: HeaderMap,
) -> StatusCode {
    let state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    if state.twarrts.iter().any(|t| t.id == twarrt_id) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn twarrt_update(
    State(shared): State<Shared>,
    Path(twarrt_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<PostContentData>,
) -> StatusCode {
    let mut state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    match state.twarrts.iter_mut().find(|t| t.id == twarrt_id) {
        Some(twarrt) => {
            twarrt.text = body.text;
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn twarrt_delete(
    State(shared): State<Shared>,
    Path(twarrt_id): Path<i64>,
    headers: HeaderMap,
) -> StatusCode {
    let mut state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    let before = state.twarrts.len();
    state.twarrts.retain(|t| t.id != twarrt_id);
    if state.twarrts.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn twarrt_report(
    State(shared): State<Shared>,
    Path(twarrt_id): Path<i64>,
    headers: HeaderMap,
    Json(_body): Json<serde_json::Value>,
) -> StatusCode {
    let state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    if state.twarrts.iter().any(|t| t.id == twarrt_id) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

// ============================================================================
// Handlers: forums
// ============================================================================

async fn forum_categories(State(shared): State<Shared>) -> Json<Vec<CategoryData>> {
    let state = shared.lock().unwrap();
    Json(
        state
            .categories
            .iter()
            .map(|(id, title)| CategoryData {
                category_id: id.clone(),
                title: title.clone(),
            })
            .collect(),
    )
}

async fn forum_category_detail(
    State(shared): State<Shared>,
    Path(category_id): Path<String>,
) -> Response {
    let state = shared.lock().unwrap();
    let Some((id, title)) = state.categories.iter().find(|(id, _)| *id == category_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    Json(CategoryForumsData {
        category_id: id.clone(),
        title: title.clone(),
        forum_threads: state
            .forums
            .iter()
            .filter(|forum| forum.category_id == category_id)
            .map(|forum| ForumListData {
                forum_id: forum.id.clone(),
                title: forum.title.clone(),
            })
            .collect(),
    })
    .into_response()
}

async fn forum_create(
    State(shared): State<Shared>,
    Path(category_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ForumCreateData>,
) -> Response {
    let mut state = shared.lock().unwrap();
    let Some(author) = bearer_user(&state, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if !state.categories.iter().any(|(id, _)| *id == category_id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let post_id = state.next_post_id;
    state.next_post_id += 1;
    let forum = MockForum {
        id: format!("f-{post_id}"),
        category_id,
        title: body.title,
        posts: vec![MockPost {
            id: post_id,
            author,
            text: body.first_post.text,
        }],
    };
    let data = ForumData {
        forum_id: forum.id.clone(),
        title: forum.title.clone(),
        posts: forum.posts.iter().map(|p| state.post_data(p)).collect(),
    };
    state.forums.push(forum);
    (StatusCode::CREATED, Json(data)).into_response()
}

async fn forum_detail(State(shared): State<Shared>, Path(forum_id): Path<String>) -> Response {
    let state = shared.lock().unwrap();
    match state.forums.iter().find(|forum| forum.id == forum_id) {
        Some(forum) => Json(ForumData {
            forum_id: forum.id.clone(),
            title: forum.title.clone(),
            posts: forum.posts.iter().map(|p| state.post_data(p)).collect(),
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn forum_post_create(
    State(shared): State<Shared>,
    Path(forum_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<PostContentData>,
) -> Response {
    let mut state = shared.lock().unwrap();
    let Some(author) = bearer_user(&state, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let post_id = state.next_post_id;
    state.next_post_id += 1;
    let header = state.header_for(&author);
    let Some(forum) = state.forums.iter_mut().find(|forum| forum.id == forum_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    forum.posts.push(MockPost {
        id: post_id,
        author,
        text: body.text.clone(),
    });
    (
        StatusCode::CREATED,
        Json(PostData {
            post_id,
            author: header,
            text: body.text,
        }),
    )
        .into_response()
}

async fn forum_rename(
    State(shared): State<Shared>,
    Path((forum_id, new_name)): Path<(String, String)>,
    headers: HeaderMap,
) -> StatusCode {
    let mut state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    match state.forums.iter_mut().find(|forum| forum.id == forum_id) {
        Some(forum) => {
            forum.title = new_name;
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn forum_favorite(
    State(shared): State<Shared>,
    Path(forum_id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    let state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    if state.forums.iter().any(|forum| forum.id == forum_id) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn forum_match(
    State(shared): State<Shared>,
    Path(needle): Path<String>,
) -> Json<Vec<ForumListData>> {
    let state = shared.lock().unwrap();
    let needle = needle.to_lowercase();
    Json(
        state
            .forums
            .iter()
            .filter(|forum| forum.title.to_lowercase().contains(&needle))
            .map(|forum| ForumListData {
                forum_id: forum.id.clone(),
                title: forum.title.clone(),
            })
            .collect(),
    )
}

async fn forum_owner() -> Json<Vec<ForumListData>> {
    Json(Vec::new())
}

async fn forum_post_search() -> Json<Vec<PostData>> {
    Json(Vec::new())
}

async fn forum_post_detail(State(shared): State<Shared>, Path(post_id): Path<i64>) -> Response {
    let state = shared.lock().unwrap();
    for forum in &state.forums {
        if let Some(post) = forum.posts.iter().find(|post| post.id == post_id) {
            return Json(state.post_data(post)).into_response();
        }
    }
    StatusCode::NOT_FOUND.into_response()
}

async fn forum_post_touch(
    State(shared): State<Shared>,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
) -> StatusCode {
    let state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    if state
        .forums
        .iter()
        .any(|forum| forum.posts.iter().any(|post| post.id == post_id))
    {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn forum_post_update(
    State(shared): State<Shared>,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<PostContentData>,
) -> StatusCode {
    let mut state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    for forum in &mut state.forums {
        if let Some(post) = forum.posts.iter_mut().find(|post| post.id == post_id) {
            post.text = body.text;
            return StatusCode::OK;
        }
    }
    StatusCode::NOT_FOUND
}

async fn forum_post_delete(
    State(shared): State<Shared>,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
) -> StatusCode {
    let mut state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    for forum in &mut state.forums {
        let before = forum.posts.len();
        forum.posts.retain(|post| post.id != post_id);
        if forum.posts.len() < before {
            return StatusCode::OK;
        }
    }
    StatusCode::NOT_FOUND
}

// ============================================================================
// Handlers: fez / seamail
// ============================================================================

fn create_fez_record(
    state: &mut PlatformState,
    owner: String,
    title: String,
    initial_user_ids: &[String],
) -> FezData {
    let mut participants = vec![owner.clone()];
    for user_id in initial_user_ids {
        if let Some(name) = state.username_for_id(user_id) {
            if !participants.contains(&name) {
                participants.push(name);
            }
        }
    }
    let fez = MockFez {
        id: format!("fez-{}", Uuid::new_v4().simple()),
        owner,
        title,
        participants,
    };
    let data = state.fez_data(&fez);
    state.fezzes.push(fez);
    data
}

async fn fez_create(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<FezContentData>,
) -> Response {
    let mut state = shared.lock().unwrap();
    let Some(owner) = bearer_user(&state, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let data = create_fez_record(&mut state, owner, body.title, &body.initial_users);
    (StatusCode::CREATED, Json(data)).into_response()
}

async fn fez_joined(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = shared.lock().unwrap();
    let Some(user) = bearer_user(&state, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let joined: Vec<FezData> = state
        .fezzes
        .iter()
        .filter(|fez| fez.participants.contains(&user))
        .map(|fez| state.fez_data(fez))
        .collect();
    Json(joined).into_response()
}

async fn fez_owned(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = shared.lock().unwrap();
    let Some(user) = bearer_user(&state, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let owned: Vec<FezData> = state
        .fezzes
        .iter()
        .filter(|fez| fez.owner == user)
        .map(|fez| state.fez_data(fez))
        .collect();
    Json(owned).into_response()
}

async fn fez_detail(
    State(shared): State<Shared>,
    Path(fez_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let state = shared.lock().unwrap();
    let Some(user) = bearer_user(&state, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let Some(fez) = state.fezzes.iter().find(|fez| fez.id == fez_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    // Conversations are only visible to their participants
    if !fez.participants.contains(&user) {
        return StatusCode::FORBIDDEN.into_response();
    }
    Json(state.fez_data(fez)).into_response()
}

async fn fez_post(
    State(shared): State<Shared>,
    Path(fez_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<PostContentData>,
) -> Response {
    let mut state = shared.lock().unwrap();
    let Some(user) = bearer_user(&state, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let Some(fez) = state.fezzes.iter().find(|fez| fez.id == fez_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !fez.participants.contains(&user) {
        return StatusCode::FORBIDDEN.into_response();
    }
    let post_id = state.next_post_id;
    state.next_post_id += 1;
    state.fez_posts.push((post_id, fez_id));
    (
        StatusCode::CREATED,
        Json(FezPostData {
            post_id,
            text: body.text,
        }),
    )
        .into_response()
}

async fn fez_post_delete(
    State(shared): State<Shared>,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
) -> StatusCode {
    let mut state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    let before = state.fez_posts.len();
    state.fez_posts.retain(|(id, _)| *id != post_id);
    if state.fez_posts.len() < before {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

// ============================================================================
// Handlers: events, boardgames, karaoke
// ============================================================================

async fn events_list(
    State(shared): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<EventData>> {
    let state = shared.lock().unwrap();
    let needle = params.get("search").map(|s| s.to_lowercase());
    Json(
        state
            .events
            .iter()
            .filter(|(_, title)| match &needle {
                Some(needle) => title.to_lowercase().contains(needle),
                None => true,
            })
            .map(|(id, title)| EventData {
                event_id: id.clone(),
                title: title.clone(),
            })
            .collect(),
    )
}

async fn event_detail(State(shared): State<Shared>, Path(event_id): Path<String>) -> Response {
    let state = shared.lock().unwrap();
    match state.events.iter().find(|(id, _)| *id == event_id) {
        Some((id, title)) => Json(EventData {
            event_id: id.clone(),
            title: title.clone(),
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn event_favorite(
    State(shared): State<Shared>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    let state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    if state.events.iter().any(|(id, _)| *id == event_id) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn event_favorites(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(Vec::<EventData>::new()).into_response()
}

async fn boardgames_list(
    State(shared): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let state = shared.lock().unwrap();
    if params.contains_key("favorite") && bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let needle = params.get("search").map(|s| s.to_lowercase());
    let game_array = state
        .games
        .iter()
        .filter(|(_, name)| match &needle {
            Some(needle) => name.to_lowercase().contains(needle),
            None => true,
        })
        .map(|(id, name)| BoardgameData {
            game_id: id.clone(),
            game_name: name.clone(),
        })
        .collect();
    Json(BoardgameResponseData { game_array }).into_response()
}

async fn boardgame_detail(State(shared): State<Shared>, Path(game_id): Path<String>) -> Response {
    let state = shared.lock().unwrap();
    match state.games.iter().find(|(id, _)| *id == game_id) {
        Some((id, name)) => Json(BoardgameData {
            game_id: id.clone(),
            game_name: name.clone(),
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn boardgame_expansions(
    State(shared): State<Shared>,
    Path(game_id): Path<String>,
) -> Response {
    let state = shared.lock().unwrap();
    if !state.games.iter().any(|(id, _)| *id == game_id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(BoardgameResponseData {
        game_array: Vec::new(),
    })
    .into_response()
}

async fn boardgame_favorite(
    State(shared): State<Shared>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    let state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    if state.games.iter().any(|(id, _)| *id == game_id) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn karaoke_list(
    State(shared): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let state = shared.lock().unwrap();
    if params.contains_key("favorite") && bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let needle = params.get("search").map(|s| s.to_lowercase());
    let songs: Vec<&String> = state
        .songs
        .iter()
        .filter(|song| match &needle {
            Some(needle) => song.to_lowercase().contains(needle),
            None => true,
        })
        .collect();
    Json(serde_json::json!({ "songs": songs })).into_response()
}

async fn karaoke_latest() -> Json<serde_json::Value> {
    Json(serde_json::json!([]))
}

// ============================================================================
// Handlers: notifications and users
// ============================================================================

async fn notification_feed(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = shared.lock().unwrap();
    if bearer_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(serde_json::json!({})).into_response()
}

async fn notification_socket(
    State(shared): State<Shared>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let authorized = {
        let state = shared.lock().unwrap();
        cookie_user(&state, &headers).is_some()
    };
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ws.on_upgrade(|mut socket| async move {
        // Drain frames until the client closes
        while let Some(Ok(message)) = socket.recv().await {
            if matches!(message, axum::extract::ws::Message::Close(_)) {
                break;
            }
        }
    })
}

async fn user_whoami(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = shared.lock().unwrap();
    match bearer_user(&state, &headers) {
        Some(user) => Json(state.header_for(&user)).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn user_find(State(shared): State<Shared>, Path(username): Path<String>) -> Response {
    let state = shared.lock().unwrap();
    if state.users.contains_key(&username) {
        Json(state.header_for(&username)).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn user_by_id(State(shared): State<Shared>, Path(user_id): Path<String>) -> Response {
    let state = shared.lock().unwrap();
    match state.username_for_id(&user_id) {
        Some(name) => Json(state.header_for(&name)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn user_match(State(shared): State<Shared>, Path(needle): Path<String>) -> Response {
    let state = shared.lock().unwrap();
    let needle = needle.to_lowercase();
    let matches: Vec<UserHeader> = state
        .users
        .keys()
        .filter(|name| name.to_lowercase().contains(&needle))
        .map(|name| state.header_for(name))
        .collect();
    Json(matches).into_response()
}

// ============================================================================
// Handlers: web posting
// ============================================================================

async fn web_tweet_create(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(form): Json<WebPostForm>,
) -> StatusCode {
    let mut state = shared.lock().unwrap();
    let Some(author) = cookie_user(&state, &headers) else {
        return StatusCode::UNAUTHORIZED;
    };
    push_twarrt(&mut state, author, form.post_text);
    StatusCode::CREATED
}

async fn web_tweet_reply(
    State(shared): State<Shared>,
    Path(twarrt_id): Path<i64>,
    headers: HeaderMap,
    Json(form): Json<WebPostForm>,
) -> StatusCode {
    let mut state = shared.lock().unwrap();
    let Some(author) = cookie_user(&state, &headers) else {
        return StatusCode::UNAUTHORIZED;
    };
    if !state.twarrts.iter().any(|t| t.id == twarrt_id) {
        return StatusCode::NOT_FOUND;
    }
    push_twarrt(&mut state, author, form.post_text);
    StatusCode::CREATED
}

async fn web_tweet_edit(
    State(shared): State<Shared>,
    Path(twarrt_id): Path<i64>,
    headers: HeaderMap,
    Json(form): Json<WebPostForm>,
) -> StatusCode {
    let mut state = shared.lock().unwrap();
    if cookie_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    match state.twarrts.iter_mut().find(|t| t.id == twarrt_id) {
        Some(twarrt) => {
            twarrt.text = form.post_text;
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn web_tweet_delete(
    State(shared): State<Shared>,
    Path(twarrt_id): Path<i64>,
    headers: HeaderMap,
) -> StatusCode {
    let mut state = shared.lock().unwrap();
    if cookie_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    state.twarrts.retain(|t| t.id != twarrt_id);
    StatusCode::OK
}

async fn web_tweet_touch(
    State(shared): State<Shared>,
    Path(twarrt_id): Path<i64>,
    headers: HeaderMap,
) -> StatusCode {
    let state = shared.lock().unwrap();
    if cookie_user(&state, &headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    if state.twarrts.iter().any(|t| t.id == twarrt_id) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn web_seamail_create(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(form): Json<SeamailComposeForm>,
) -> StatusCode {
    let mut state = shared.lock().unwrap();
    let Some(owner) = cookie_user(&state, &headers) else {
        return StatusCode::UNAUTHORIZED;
    };
    let initial = vec![form.participants];
    create_fez_record(&mut state, owner, form.subject, &initial);
    StatusCode::CREATED
}

// ============================================================================
// Router and the platform handle
// ============================================================================

async fn track_hits(State(shared): State<Shared>, request: Request, next: Next) -> Response {
    let key = format!("{} {}", request.method(), request.uri().path());
    {
        let mut state = shared.lock().unwrap();
        *state.hits.entry(key).or_insert(0) += 1;
    }
    next.run(request).await
}

fn router(shared: Shared) -> Router {
    Router::new()
        // auth + web session
        .route("/api/v3/auth/login", post(api_login))
        .route("/login", post(web_login))
        // twarrts
        .route("/api/v3/twitarr", get(twarrt_stream))
        .route("/api/v3/twitarr/create", post(twarrt_create))
        .route(
            "/api/v3/twitarr/:twarrt_id",
            get(twarrt_detail).delete(twarrt_delete),
        )
        .route("/api/v3/twitarr/:twarrt_id/reply", post(twarrt_reply))
        .route("/api/v3/twitarr/:twarrt_id/love", post(twarrt_touch))
        .route("/api/v3/twitarr/:twarrt_id/like", post(twarrt_touch))
        .route("/api/v3/twitarr/:twarrt_id/unreact", post(twarrt_touch))
        .route("/api/v3/twitarr/:twarrt_id/bookmark", post(twarrt_touch))
        .route(
            "/api/v3/twitarr/:twarrt_id/bookmark/remove",
            post(twarrt_touch),
        )
        .route("/api/v3/twitarr/:twarrt_id/update", post(twarrt_update))
        .route("/api/v3/twitarr/:twarrt_id/report", post(twarrt_report))
        // forums
        .route("/api/v3/forum/categories", get(forum_categories))
        .route(
            "/api/v3/forum/categories/:category_id",
            get(forum_category_detail),
        )
        .route(
            "/api/v3/forum/categories/:category_id/create",
            post(forum_create),
        )
        .route("/api/v3/forum/match/:string", get(forum_match))
        .route("/api/v3/forum/owner", get(forum_owner))
        .route("/api/v3/forum/post/search", get(forum_post_search))
        .route("/api/v3/forum/post/:post_id", get(forum_post_detail))
        .route("/api/v3/forum/post/:post_id/like", post(forum_post_touch))
        .route(
            "/api/v3/forum/post/:post_id/unreact",
            post(forum_post_touch),
        )
        .route(
            "/api/v3/forum/post/:post_id/bookmark",
            post(forum_post_touch),
        )
        .route(
            "/api/v3/forum/post/:post_id/bookmark/remove",
            post(forum_post_touch),
        )
        .route("/api/v3/forum/post/:post_id/update", post(forum_post_update))
        .route("/api/v3/forum/post/:post_id/delete", post(forum_post_delete))
        .route("/api/v3/forum/:forum_id", get(forum_detail))
        .route("/api/v3/forum/:forum_id/create", post(forum_post_create))
        .route(
            "/api/v3/forum/:forum_id/rename/:new_name",
            post(forum_rename),
        )
        .route(
            "/api/v3/forum/:forum_id/favorite",
            post(forum_favorite).delete(forum_favorite),
        )
        // fez
        .route("/api/v3/fez/create", post(fez_create))
        .route("/api/v3/fez/joined", get(fez_joined))
        .route("/api/v3/fez/owner", get(fez_owned))
        .route("/api/v3/fez/post/:post_id", delete(fez_post_delete))
        .route("/api/v3/fez/:fez_id", get(fez_detail))
        .route("/api/v3/fez/:fez_id/post", post(fez_post))
        // events
        .route("/api/v3/events", get(events_list))
        .route("/api/v3/events/favorites", get(event_favorites))
        .route("/api/v3/events/:event_id", get(event_detail))
        .route(
            "/api/v3/events/:event_id/favorite",
            post(event_favorite).delete(event_favorite),
        )
        // boardgames
        .route("/api/v3/boardgames", get(boardgames_list))
        .route(
            "/api/v3/boardgames/expansions/:game_id",
            get(boardgame_expansions),
        )
        .route("/api/v3/boardgames/:game_id", get(boardgame_detail))
        .route(
            "/api/v3/boardgames/:game_id/favorite",
            post(boardgame_favorite).delete(boardgame_favorite),
        )
        // karaoke
        .route("/api/v3/karaoke", get(karaoke_list))
        .route("/api/v3/karaoke/latest", get(karaoke_latest))
        // notifications
        .route("/api/v3/notification/global", get(notification_feed))
        .route("/api/v3/notification/announcements", get(notification_feed))
        .route("/api/v3/notification/dailythemes", get(notification_feed))
        .route("/api/v3/notification/socket", get(notification_socket))
        // users
        .route("/api/v3/user/profile", get(user_whoami))
        .route("/api/v3/user/whoami", get(user_whoami))
        .route("/api/v3/users/find/:username", get(user_find))
        .route("/api/v3/users/match/allnames/:string", get(user_match))
        .route("/api/v3/users/:user_id", get(user_by_id))
        // web pages
        .route("/", get(page))
        .route("/events", get(page))
        .route("/boardgames", get(page))
        .route("/boardgames/:game_id/createfez", get(page))
        .route("/karaoke", get(page))
        .route("/tweets", get(page))
        .route("/tweets/create", post(web_tweet_create))
        .route("/tweets/edit/:twarrt_id", get(page).post(web_tweet_edit))
        .route("/tweets/reply/:twarrt_id", post(web_tweet_reply))
        .route("/tweets/:twarrt_id", get(page))
        .route("/tweets/:twarrt_id/delete", post(web_tweet_delete))
        .route("/tweets/:twarrt_id/like", post(web_tweet_touch))
        .route("/tweets/:twarrt_id/unreact", post(web_tweet_touch))
        .route(
            "/tweets/:twarrt_id/bookmark",
            post(web_tweet_touch).delete(web_tweet_touch),
        )
        .route("/forums", get(page))
        .route("/forums/:category_id", get(page))
        .route("/forum/search", get(page))
        .route("/forum/favorites", get(page))
        .route("/forum/owned", get(page))
        .route("/forum/:forum_id", get(page))
        .route("/forumpost/mentions", get(page))
        .route("/forumpost/favorite", get(page))
        .route("/forumpost/owned", get(page))
        .route("/forumpost/search", get(page))
        .route("/seamail", get(page))
        .route("/seamail/create", get(page).post(web_seamail_create))
        .route("/seamail/usernames/search/:string", get(page))
        .route("/seamail/:fez_id", get(page))
        .layer(middleware::from_fn_with_state(shared.clone(), track_hits))
        .with_state(shared)
}

/// One running mock platform, listening on an ephemeral local port
pub struct MockPlatform {
    addr: SocketAddr,
    state: Shared,
    server: tokio::task::JoinHandle<()>,
}

impl MockPlatform {
    /// Spawn with seeded content (twarrts, forums, events, games, songs)
    pub async fn spawn() -> Self {
        Self::start(true).await
    }

    /// Spawn with accounts and categories only; every listing starts empty
    #[allow(dead_code)]
    pub async fn spawn_bare() -> Self {
        Self::start(false).await
    }

    async fn start(seeded: bool) -> Self {
        let state: Shared = Arc::new(Mutex::new(PlatformState::new(seeded)));
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            addr,
            state,
            server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests seen for an exact `"METHOD /path"` key
    #[allow(dead_code)]
    pub fn hits(&self, key: &str) -> u64 {
        self.state
            .lock()
            .unwrap()
            .hits
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Requests seen whose `"METHOD /path"` key starts with `prefix`
    #[allow(dead_code)]
    pub fn hits_with_prefix(&self, prefix: &str) -> u64 {
        self.state
            .lock()
            .unwrap()
            .hits
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(_, count)| count)
            .sum()
    }

    /// Total requests seen since spawn
    #[allow(dead_code)]
    pub fn hits_total(&self) -> u64 {
        self.state.lock().unwrap().hits.values().sum()
    }

    #[allow(dead_code)]
    pub fn twarrt_count(&self) -> usize {
        self.state.lock().unwrap().twarrts.len()
    }
}

impl Drop for MockPlatform {
    fn drop(&mut self) {
        self.server.abort();
    }
}
