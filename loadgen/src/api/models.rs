//! Wire models for the target platform
//!
//! Decoded subsets of the platform's JSON: only the fields the scenarios
//! actually consume, with the platform's exact key spellings (`twarrtID`,
//! `userID`, ...). Unknown fields are ignored on decode. Everything derives
//! both directions so the mock target in the test suite can speak the same
//! wire format.

use serde::{Deserialize, Serialize};

/// Response of `POST /api/v3/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStringData {
    pub token: String,
    #[serde(rename = "userID")]
    pub user_id: String,
}

/// Minimal identification of a user, embedded in most content types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserHeader {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub username: String,
}

/// One microblog post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwarrtData {
    #[serde(rename = "twarrtID")]
    pub twarrt_id: i64,
    pub author: UserHeader,
    pub text: String,
}

/// Detail view of one microblog post. The detail endpoint keys the ID as
/// `postID`, unlike the stream's `twarrtID`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwarrtDetailData {
    #[serde(rename = "postID")]
    pub post_id: i64,
    pub author: UserHeader,
    pub text: String,
}

/// One forum category, as returned by the category list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryData {
    #[serde(rename = "categoryID")]
    pub category_id: String,
    pub title: String,
}

/// Category detail: the threads it contains
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryForumsData {
    #[serde(rename = "categoryID")]
    pub category_id: String,
    pub title: String,
    #[serde(rename = "forumThreads", default)]
    pub forum_threads: Vec<ForumListData>,
}

/// One thread in a category listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumListData {
    #[serde(rename = "forumID")]
    pub forum_id: String,
    pub title: String,
}

/// One forum thread with its posts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumData {
    #[serde(rename = "forumID")]
    pub forum_id: String,
    pub title: String,
    #[serde(default)]
    pub posts: Vec<PostData>,
}

/// One forum post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostData {
    #[serde(rename = "postID")]
    pub post_id: i64,
    pub author: UserHeader,
    pub text: String,
}

/// One private group-messaging conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FezData {
    #[serde(rename = "fezID")]
    pub fez_id: String,
    pub owner: UserHeader,
    pub title: String,
    #[serde(default)]
    pub members: Option<FezMembersData>,
}

/// Membership block of a conversation, present for participants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FezMembersData {
    #[serde(default)]
    pub participants: Vec<UserHeader>,
}

/// One message inside a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FezPostData {
    #[serde(rename = "postID")]
    pub post_id: i64,
    pub text: String,
}

/// One schedule event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    #[serde(rename = "eventID")]
    pub event_id: String,
    pub title: String,
}

/// Response of the boardgame list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardgameResponseData {
    #[serde(rename = "gameArray")]
    pub game_array: Vec<BoardgameData>,
}

/// One boardgame in the library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardgameData {
    #[serde(rename = "gameID")]
    pub game_id: String,
    #[serde(rename = "gameName")]
    pub game_name: String,
}

// ============================================================================
// Request bodies
// ============================================================================

/// Content of a new or edited post (twarrt, forum post, or fez message)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostContentData {
    pub text: String,
    pub images: Vec<String>,
}

impl PostContentData {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            images: Vec::new(),
        }
    }
}

/// Body of `POST /api/v3/forum/categories/:category_id/create`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumCreateData {
    pub title: String,
    #[serde(rename = "firstPost")]
    pub first_post: PostContentData,
}

/// Body of `POST /api/v3/fez/create`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FezContentData {
    pub fez_type: String,
    pub title: String,
    pub info: String,
    pub min_capacity: i32,
    pub max_capacity: i32,
    pub initial_users: Vec<String>,
}

impl FezContentData {
    /// A closed conversation with the given initial participants
    pub fn closed(title: &str, info: &str, initial_users: Vec<String>) -> Self {
        Self {
            fez_type: "closed".to_string(),
            title: title.to_string(),
            info: info.to_string(),
            min_capacity: 0,
            max_capacity: 0,
            initial_users,
        }
    }
}

/// Body of `POST /api/v3/twitarr/:twarrt_id/report`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub message: String,
}

/// Body of the web `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebLoginForm {
    pub username: String,
    pub password: String,
}

/// Body of the web `POST /tweets/create` and friends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPostForm {
    pub post_text: String,
}

/// Body of the web `POST /seamail/create`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeamailComposeForm {
    pub subject: String,
    pub post_text: String,
    /// User ID of the other participant
    pub participants: String,
}
