use sea_orm::{sea_query::Expr, DatabaseConnection};
use thiserror::Error;
use zel_core::prelude::*;

use crate::{
    error::ClientError,
    entity::prelude::*,
    ids::{CommentId, PostId, UserId},
    remote::{AuthorSummary, CommentCount, CommentWithAuthor, NewComment},
};

#[derive(Debug, Error)]
pub enum CommentsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("comment not found")]
    CommentNotFound,

    #[error("post not found")]
    PostNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("comment is empty")]
    EmptyContent,

    #[error("unauthorized: neither comment author nor post author")]
    Unauthorized,
}

impl From<CommentsServiceError> for ResourceError {
    fn from(error: CommentsServiceError) -> Self {
        match error {
            CommentsServiceError::DbError(error) => ResourceError::infra(error),
            // Carries its client kind over RPC
            error => ClientError::from(error).into(),
        }
    }
}

#[derive(Clone)]
pub struct CommentsService {
    db: DatabaseConnection,
}

impl CommentsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn _create_comment(
        &self,
        new_comment: NewComment,
    ) -> Result<CommentModel, CommentsServiceError> {
        if new_comment.content.trim().is_empty() {
            return Err(CommentsServiceError::EmptyContent);
        }

        let post_exists = Post::find_by_id(new_comment.post_id)
            .one(&self.db)
            .await?
            .is_some();
        if !post_exists {
            return Err(CommentsServiceError::PostNotFound);
        }

        let user_exists = User::find_by_id(new_comment.user_id)
            .one(&self.db)
            .await?
            .is_some();
        if !user_exists {
            return Err(CommentsServiceError::UserNotFound);
        }

        let comment = CommentActiveModel {
            id: Set(CommentId::new()),
            post_id: Set(new_comment.post_id),
            user_id: Set(new_comment.user_id),
            content: Set(new_comment.content),
            created_at: Set(crate::now_rfc3339()),
        };

        let comment = Comment::insert(comment).exec_with_returning(&self.db).await?;
        tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");

        Ok(comment)
    }

    /// Comments on a post, oldest first (conversation order)
    pub async fn _list_comments(
        &self,
        post_id: PostId,
    ) -> Result<Vec<CommentWithAuthor>, CommentsServiceError> {
        let comments = Comment::find()
            .filter(CommentColumn::PostId.eq(post_id))
            .order_by_asc(CommentColumn::CreatedAt)
            .order_by_asc(CommentColumn::Id)
            .find_also_related(User)
            .all(&self.db)
            .await?;

        Ok(comments
            .into_iter()
            .map(|(comment, author)| CommentWithAuthor {
                comment,
                author: author.map(AuthorSummary::from),
            })
            .collect())
    }

    /// Per-post comment counts. Posts without comments are left out.
    pub async fn _count_comments(
        &self,
        post_ids: Vec<PostId>,
    ) -> Result<Vec<CommentCount>, CommentsServiceError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(PostId, i64)> = Comment::find()
            .select_only()
            .column(CommentColumn::PostId)
            .column_as(Expr::col(CommentColumn::Id).count(), "comment_count")
            .filter(CommentColumn::PostId.is_in(post_ids))
            .group_by(CommentColumn::PostId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(post_id, count)| CommentCount {
                post_id,
                count: count.max(0) as u64,
            })
            .collect())
    }

    /// Delete a comment (only by its author or by the post's author)
    pub async fn _delete_comment(
        &self,
        comment_id: CommentId,
        user_id: UserId,
    ) -> Result<(), CommentsServiceError> {
        let (comment, post) = Comment::find_by_id(comment_id)
            .find_also_related(Post)
            .one(&self.db)
            .await?
            .ok_or(CommentsServiceError::CommentNotFound)?;

        let post_author = post.map(|post| post.user_id);
        if comment.user_id != user_id && post_author != Some(user_id) {
            return Err(CommentsServiceError::Unauthorized);
        }

        Comment::delete_by_id(comment_id).exec(&self.db).await?;
        tracing::info!(%comment_id, "comment deleted");

        Ok(())
    }
}

#[zel_service(name = "comments")]
trait Comments {
    #[method(name = "create_comment")]
    async fn create_comment(&self, comment: NewComment) -> Result<CommentModel, ResourceError>;

    #[doc = "Comments on a post, oldest first"]
    #[method(name = "list_comments")]
    async fn list_comments(&self, post_id: PostId)
        -> Result<Vec<CommentWithAuthor>, ResourceError>;

    #[doc = "Comment counts for a set of posts"]
    #[method(name = "count_comments")]
    async fn count_comments(&self, post_ids: Vec<PostId>)
        -> Result<Vec<CommentCount>, ResourceError>;

    #[method(name = "delete_comment")]
    async fn delete_comment(
        &self,
        comment_id: CommentId,
        user_id: UserId,
    ) -> Result<(), ResourceError>;
}

#[async_trait]
impl CommentsServer for CommentsService {
    async fn create_comment(
        &self,
        _ctx: RequestContext,
        comment: NewComment,
    ) -> Result<CommentModel, ResourceError> {
        Ok(self._create_comment(comment).await?)
    }

    async fn list_comments(
        &self,
        _ctx: RequestContext,
        post_id: PostId,
    ) -> Result<Vec<CommentWithAuthor>, ResourceError> {
        Ok(self._list_comments(post_id).await?)
    }

    async fn count_comments(
        &self,
        _ctx: RequestContext,
        post_ids: Vec<PostId>,
    ) -> Result<Vec<CommentCount>, ResourceError> {
        Ok(self._count_comments(post_ids).await?)
    }

    async fn delete_comment(
        &self,
        _ctx: RequestContext,
        comment_id: CommentId,
        user_id: UserId,
    ) -> Result<(), ResourceError> {
        Ok(self._delete_comment(comment_id, user_id).await?)
    }
}
