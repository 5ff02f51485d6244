use std::collections::HashMap;

use sea_orm::DatabaseConnection;
use thiserror::Error;
use zel_core::prelude::*;

use crate::{
    error::ClientError,
    entity::prelude::*,
    ids::{PostId, UserId},
    remote::{AuthorSummary, NewPost, PostChanges, RawPost, RawReaction},
};

#[derive(Debug, Error)]
pub enum PostsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("post not found")]
    PostNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("post content is empty")]
    EmptyContent,

    #[error("unauthorized: not post author")]
    Unauthorized,
}

impl From<PostsServiceError> for ResourceError {
    fn from(error: PostsServiceError) -> Self {
        match error {
            PostsServiceError::DbError(error) => ResourceError::infra(error),
            // Carries its client kind over RPC
            error => ClientError::from(error).into(),
        }
    }
}

#[derive(Clone)]
pub struct PostsService {
    db: DatabaseConnection,
}

impl PostsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new post for an existing user
    pub async fn _create_post(&self, new_post: NewPost) -> Result<PostModel, PostsServiceError> {
        if new_post.content.trim().is_empty() {
            return Err(PostsServiceError::EmptyContent);
        }

        let user_exists = User::find_by_id(new_post.user_id)
            .one(&self.db)
            .await?
            .is_some();

        if !user_exists {
            return Err(PostsServiceError::UserNotFound);
        }

        let post = PostActiveModel {
            id: Set(PostId::new()),
            user_id: Set(new_post.user_id),
            content: Set(new_post.content),
            image_url: Set(new_post.image_url),
            created_at: Set(crate::now_rfc3339()),
        };

        let post = Post::insert(post).exec_with_returning(&self.db).await?;
        tracing::info!(post_id = %post.id, user_id = %post.user_id, "post created");

        Ok(post)
    }

    pub async fn _find_post(&self, post_id: PostId) -> Result<Option<PostModel>, PostsServiceError> {
        Ok(Post::find_by_id(post_id).one(&self.db).await?)
    }

    /// Get a specific post by ID
    pub async fn _get_post(&self, post_id: PostId) -> Result<PostModel, PostsServiceError> {
        self._find_post(post_id)
            .await?
            .ok_or(PostsServiceError::PostNotFound)
    }

    /// Newest-first listing with author profile and raw reactions embedded.
    pub async fn _list_feed(
        &self,
        author: Option<UserId>,
    ) -> Result<Vec<RawPost>, PostsServiceError> {
        let mut query = Post::find();
        if let Some(author) = author {
            query = query.filter(PostColumn::UserId.eq(author));
        }

        let posts = query
            .order_by_desc(PostColumn::CreatedAt)
            .order_by_desc(PostColumn::Id)
            .all(&self.db)
            .await?;

        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<PostId> = posts.iter().map(|post| post.id).collect();
        let mut author_ids: Vec<UserId> = posts.iter().map(|post| post.user_id).collect();
        author_ids.sort();
        author_ids.dedup();

        let authors: HashMap<UserId, AuthorSummary> = User::find()
            .filter(UserColumn::Id.is_in(author_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|user| (user.id, AuthorSummary::from(user)))
            .collect();

        let mut reactions: HashMap<PostId, Vec<RawReaction>> = HashMap::new();
        for reaction in Reaction::find()
            .filter(ReactionColumn::PostId.is_in(post_ids))
            .order_by_asc(ReactionColumn::CreatedAt)
            .all(&self.db)
            .await?
        {
            reactions.entry(reaction.post_id).or_default().push(RawReaction {
                kind: reaction.kind,
                user_id: reaction.user_id,
            });
        }

        tracing::debug!(?author, posts = posts.len(), "feed listed");

        Ok(posts
            .into_iter()
            .map(|post| RawPost {
                author: authors.get(&post.user_id).cloned(),
                reactions: reactions.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect())
    }

    /// Update a post (only by author)
    pub async fn _update_post(
        &self,
        post_id: PostId,
        user_id: UserId,
        changes: PostChanges,
    ) -> Result<PostModel, PostsServiceError> {
        let post = self._get_post(post_id).await?;

        if post.user_id != user_id {
            return Err(PostsServiceError::Unauthorized);
        }

        let mut post_active: PostActiveModel = post.into();

        if let Some(content) = changes.content {
            if content.trim().is_empty() {
                return Err(PostsServiceError::EmptyContent);
            }
            post_active.content = Set(content);
        }

        if let Some(image_url) = changes.image_url {
            post_active.image_url = Set(image_url);
        }

        let updated = post_active.update(&self.db).await?;
        tracing::info!(%post_id, "post updated");

        Ok(updated)
    }

    /// Delete a post (only by author). Reactions and comments go with it.
    pub async fn _delete_post(
        &self,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<(), PostsServiceError> {
        let post = self._get_post(post_id).await?;

        if post.user_id != user_id {
            return Err(PostsServiceError::Unauthorized);
        }

        Post::delete_by_id(post_id).exec(&self.db).await?;
        tracing::info!(%post_id, "post deleted");

        Ok(())
    }
}

#[zel_service(name = "posts")]
trait Posts {
    #[doc = "Newest-first feed, optionally for one author"]
    #[method(name = "list_feed")]
    async fn list_feed(&self, author: Option<UserId>) -> Result<Vec<RawPost>, ResourceError>;

    #[method(name = "find_post")]
    async fn find_post(&self, post_id: PostId) -> Result<Option<PostModel>, ResourceError>;

    #[method(name = "create_post")]
    async fn create_post(&self, post: NewPost) -> Result<PostModel, ResourceError>;

    #[doc = "Update a post (only by author)"]
    #[method(name = "update_post")]
    async fn update_post(
        &self,
        post_id: PostId,
        user_id: UserId,
        changes: PostChanges,
    ) -> Result<PostModel, ResourceError>;

    #[doc = "Delete a post (only by author)"]
    #[method(name = "delete_post")]
    async fn delete_post(&self, post_id: PostId, user_id: UserId) -> Result<(), ResourceError>;
}

#[async_trait]
impl PostsServer for PostsService {
    async fn list_feed(
        &self,
        _ctx: RequestContext,
        author: Option<UserId>,
    ) -> Result<Vec<RawPost>, ResourceError> {
        Ok(self._list_feed(author).await?)
    }

    async fn find_post(
        &self,
        _ctx: RequestContext,
        post_id: PostId,
    ) -> Result<Option<PostModel>, ResourceError> {
        Ok(self._find_post(post_id).await?)
    }

    async fn create_post(
        &self,
        _ctx: RequestContext,
        post: NewPost,
    ) -> Result<PostModel, ResourceError> {
        Ok(self._create_post(post).await?)
    }

    async fn update_post(
        &self,
        _ctx: RequestContext,
        post_id: PostId,
        user_id: UserId,
        changes: PostChanges,
    ) -> Result<PostModel, ResourceError> {
        Ok(self._update_post(post_id, user_id, changes).await?)
    }

    async fn delete_post(
        &self,
        _ctx: RequestContext,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<(), ResourceError> {
        Ok(self._delete_post(post_id, user_id).await?)
    }
}
