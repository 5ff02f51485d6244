//! The boundary between application logic and the system of record.
//!
//! Everything the client side reads or writes goes through
//! [`RemoteDataService`]. The store ships two implementations: the in-process
//! [`crate::backend::LocalBackend`] and the RPC-backed
//! [`crate::rpc::RpcRemote`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    entity::prelude::{CommentModel, PostModel, UserModel},
    error::ClientError,
    feed::ReactionType,
    ids::{CommentId, PostId, ReactionId, UserId},
};

/// Author fields embedded in post and comment listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub username: String,
    pub image_url: Option<String>,
}

impl From<UserModel> for AuthorSummary {
    fn from(user: UserModel) -> Self {
        Self {
            username: user.username,
            image_url: user.image_url,
        }
    }
}

/// Reaction as embedded in a post listing. `kind` is the raw column value and
/// may name a type that no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReaction {
    pub kind: String,
    pub user_id: UserId,
}

impl RawReaction {
    pub fn new(kind: ReactionType, user_id: UserId) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            user_id,
        }
    }
}

/// A post row with its author profile and raw reactions embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPost {
    pub post: PostModel,
    pub author: Option<AuthorSummary>,
    pub reactions: Vec<RawReaction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentCount {
    pub post_id: PostId,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    pub comment: CommentModel,
    pub author: Option<AuthorSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub user_id: UserId,
    pub content: String,
    pub image_url: Option<String>,
}

/// Fields to overwrite on a post; `None` leaves the column alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostChanges {
    pub content: Option<String>,
    pub image_url: Option<Option<String>>,
}

/// Reaction row as written by the client: id and timestamp are generated at
/// the call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReaction {
    pub id: ReactionId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub reaction_type: ReactionType,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: PostId,
    pub user_id: UserId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChanges {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
}

#[async_trait]
pub trait RemoteDataService: Send + Sync {
    /// Posts newest first, optionally restricted to one author, with author
    /// profile and raw reactions embedded.
    async fn query_posts(&self, author: Option<UserId>) -> Result<Vec<RawPost>, ClientError>;

    /// Comment counts for the given posts. Posts without comments may be absent.
    async fn comment_counts(&self, post_ids: Vec<PostId>)
        -> Result<Vec<CommentCount>, ClientError>;

    async fn insert_reaction(&self, reaction: NewReaction) -> Result<(), ClientError>;

    /// Deletes the matching reaction rows and reports how many went away.
    async fn delete_reactions(
        &self,
        post_id: PostId,
        user_id: UserId,
        reaction_type: ReactionType,
    ) -> Result<u64, ClientError>;

    async fn find_post(&self, post_id: PostId) -> Result<Option<PostModel>, ClientError>;

    async fn insert_post(&self, post: NewPost) -> Result<PostModel, ClientError>;

    async fn update_post(
        &self,
        post_id: PostId,
        actor: UserId,
        changes: PostChanges,
    ) -> Result<PostModel, ClientError>;

    async fn delete_post(&self, post_id: PostId, actor: UserId) -> Result<(), ClientError>;

    /// Comments on a post, oldest first.
    async fn list_comments(&self, post_id: PostId)
        -> Result<Vec<CommentWithAuthor>, ClientError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<CommentModel, ClientError>;

    async fn delete_comment(&self, comment_id: CommentId, actor: UserId)
        -> Result<(), ClientError>;

    async fn find_user(&self, user_id: UserId) -> Result<Option<UserModel>, ClientError>;

    async fn insert_user(&self, user: NewUser) -> Result<UserModel, ClientError>;

    async fn update_user(
        &self,
        user_id: UserId,
        actor: UserId,
        changes: UserChanges,
    ) -> Result<UserModel, ClientError>;
}
