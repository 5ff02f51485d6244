//! In-process [`RemoteDataService`] that calls the store services directly.

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::{
    entity::prelude::{CommentModel, PostModel, UserModel},
    error::ClientError,
    feed::ReactionType,
    ids::{CommentId, PostId, UserId},
    remote::{
        CommentCount, CommentWithAuthor, NewComment, NewPost, NewReaction, NewUser, PostChanges,
        RawPost, RemoteDataService, UserChanges,
    },
    service::{
        comments::{CommentsService, CommentsServiceError},
        posts::{PostsService, PostsServiceError},
        reactions::{ReactionsService, ReactionsServiceError},
        users::{UsersService, UsersServiceError},
    },
};

#[derive(Clone)]
pub struct LocalBackend {
    posts: PostsService,
    reactions: ReactionsService,
    comments: CommentsService,
    users: UsersService,
}

impl LocalBackend {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            posts: PostsService::new(db.clone()),
            reactions: ReactionsService::new(db.clone()),
            comments: CommentsService::new(db.clone()),
            users: UsersService::new(db),
        }
    }
}

impl From<PostsServiceError> for ClientError {
    fn from(error: PostsServiceError) -> Self {
        match error {
            PostsServiceError::DbError(e) => ClientError::remote(e),
            PostsServiceError::PostNotFound => ClientError::NotFound("post".to_string()),
            PostsServiceError::UserNotFound => ClientError::NotFound("user".to_string()),
            PostsServiceError::EmptyContent => ClientError::validation(error.to_string()),
            PostsServiceError::Unauthorized => ClientError::Auth(error.to_string()),
        }
    }
}

impl From<ReactionsServiceError> for ClientError {
    fn from(error: ReactionsServiceError) -> Self {
        match error {
            ReactionsServiceError::DbError(e) => ClientError::remote(e),
            ReactionsServiceError::PostNotFound => ClientError::NotFound("post".to_string()),
        }
    }
}

impl From<CommentsServiceError> for ClientError {
    fn from(error: CommentsServiceError) -> Self {
        match error {
            CommentsServiceError::DbError(e) => ClientError::remote(e),
            CommentsServiceError::CommentNotFound => ClientError::NotFound("comment".to_string()),
            CommentsServiceError::PostNotFound => ClientError::NotFound("post".to_string()),
            CommentsServiceError::UserNotFound => ClientError::NotFound("user".to_string()),
            CommentsServiceError::EmptyContent => ClientError::validation(error.to_string()),
            CommentsServiceError::Unauthorized => ClientError::Auth(error.to_string()),
        }
    }
}

impl From<UsersServiceError> for ClientError {
    fn from(error: UsersServiceError) -> Self {
        match error {
            UsersServiceError::DbError(e) => ClientError::remote(e),
            UsersServiceError::UserNotFound => ClientError::NotFound("user".to_string()),
            UsersServiceError::AlreadyRegistered | UsersServiceError::EmptyUsername => {
                ClientError::validation(error.to_string())
            }
            UsersServiceError::Unauthorized => ClientError::Auth(error.to_string()),
        }
    }
}

#[async_trait]
impl RemoteDataService for LocalBackend {
    async fn query_posts(&self, author: Option<UserId>) -> Result<Vec<RawPost>, ClientError> {
        Ok(self.posts._list_feed(author).await?)
    }

    async fn comment_counts(
        &self,
        post_ids: Vec<PostId>,
    ) -> Result<Vec<CommentCount>, ClientError> {
        Ok(self.comments._count_comments(post_ids).await?)
    }

    async fn insert_reaction(&self, reaction: NewReaction) -> Result<(), ClientError> {
        self.reactions._add_reaction(reaction).await?;
        Ok(())
    }

    async fn delete_reactions(
        &self,
        post_id: PostId,
        user_id: UserId,
        reaction_type: ReactionType,
    ) -> Result<u64, ClientError> {
        Ok(self
            .reactions
            ._remove_reactions(post_id, user_id, reaction_type)
            .await?)
    }

    async fn find_post(&self, post_id: PostId) -> Result<Option<PostModel>, ClientError> {
        Ok(self.posts._find_post(post_id).await?)
    }

    async fn insert_post(&self, post: NewPost) -> Result<PostModel, ClientError> {
        Ok(self.posts._create_post(post).await?)
    }

    async fn update_post(
        &self,
        post_id: PostId,
        actor: UserId,
        changes: PostChanges,
    ) -> Result<PostModel, ClientError> {
        Ok(self.posts._update_post(post_id, actor, changes).await?)
    }

    async fn delete_post(&self, post_id: PostId, actor: UserId) -> Result<(), ClientError> {
        Ok(self.posts._delete_post(post_id, actor).await?)
    }

    async fn list_comments(
        &self,
        post_id: PostId,
    ) -> Result<Vec<CommentWithAuthor>, ClientError> {
        Ok(self.comments._list_comments(post_id).await?)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<CommentModel, ClientError> {
        Ok(self.comments._create_comment(comment).await?)
    }

    async fn delete_comment(
        &self,
        comment_id: CommentId,
        actor: UserId,
    ) -> Result<(), ClientError> {
        Ok(self.comments._delete_comment(comment_id, actor).await?)
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<UserModel>, ClientError> {
        Ok(self.users._find_user(user_id).await?)
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserModel, ClientError> {
        Ok(self.users._create_user(user).await?)
    }

    async fn update_user(
        &self,
        user_id: UserId,
        actor: UserId,
        changes: UserChanges,
    ) -> Result<UserModel, ClientError> {
        Ok(self.users._update_user(user_id, actor, changes).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ids::ReactionId;
    use crate::models::test_db;

    async fn backend_with_user(username: &str) -> (LocalBackend, UserId) {
        let backend = LocalBackend::new(test_db().await);
        let user = backend
            .insert_user(NewUser {
                id: UserId::new(),
                username: username.to_string(),
            })
            .await
            .unwrap();
        (backend, user.id)
    }

    #[tokio::test]
    async fn test_reaction_insert_is_idempotent() {
        let (backend, author) = backend_with_user("author").await;
        let reader = UserId::new();
        backend
            .insert_user(NewUser {
                id: reader,
                username: "reader".to_string(),
            })
            .await
            .unwrap();
        let post = backend
            .insert_post(NewPost {
                user_id: author,
                content: "tried sourdough".to_string(),
                image_url: None,
            })
            .await
            .unwrap();

        for _ in 0..2 {
            backend
                .insert_reaction(NewReaction {
                    id: ReactionId::new(),
                    post_id: post.id,
                    user_id: reader,
                    reaction_type: ReactionType::Like,
                    created_at: crate::now_rfc3339(),
                })
                .await
                .unwrap();
        }

        let feed = backend.query_posts(None).await.unwrap();
        assert_eq!(feed[0].reactions.len(), 1);

        let removed = backend
            .delete_reactions(post.id, reader, ReactionType::Like)
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_errors_map_to_client_taxonomy() {
        let (backend, author) = backend_with_user("author").await;

        let blank = backend
            .insert_post(NewPost {
                user_id: author,
                content: " ".to_string(),
                image_url: None,
            })
            .await
            .unwrap_err();
        assert_eq!(blank.kind(), ErrorKind::Validation);

        let missing = backend
            .delete_post(PostId::new(), author)
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let post = backend
            .insert_post(NewPost {
                user_id: author,
                content: "hello".to_string(),
                image_url: None,
            })
            .await
            .unwrap();
        let stranger = backend.delete_post(post.id, UserId::new()).await.unwrap_err();
        assert_eq!(stranger.kind(), ErrorKind::Auth);
    }

    #[tokio::test]
    async fn test_find_missing_rows_is_none() {
        let backend = LocalBackend::new(test_db().await);

        assert_eq!(backend.find_post(PostId::new()).await.unwrap(), None);
        assert_eq!(backend.find_user(UserId::new()).await.unwrap(), None);
        assert!(backend.comment_counts(Vec::new()).await.unwrap().is_empty());
    }

    #[test]
    fn test_store_errors_keep_kind_over_rpc() {
        use sea_orm::DbErr;
        use zel_core::{protocol::ClientError as RpcError, ResourceError};

        let cases = [
            (ResourceError::from(PostsServiceError::Unauthorized), ErrorKind::Auth),
            (ResourceError::from(CommentsServiceError::Unauthorized), ErrorKind::Auth),
            (ResourceError::from(PostsServiceError::EmptyContent), ErrorKind::Validation),
            (ResourceError::from(UsersServiceError::AlreadyRegistered), ErrorKind::Validation),
            (ResourceError::from(CommentsServiceError::CommentNotFound), ErrorKind::NotFound),
            (ResourceError::from(ReactionsServiceError::PostNotFound), ErrorKind::NotFound),
            (
                ResourceError::from(PostsServiceError::DbError(DbErr::Custom("down".into()))),
                ErrorKind::Remote,
            ),
        ];

        for (resource, kind) in cases {
            let error = ClientError::from(RpcError::Resource(resource));
            assert_eq!(error.kind(), kind, "{error}");
        }

        let missing = ResourceError::from(CommentsServiceError::CommentNotFound);
        assert_eq!(
            ClientError::from(RpcError::Resource(missing)),
            ClientError::NotFound("comment".to_string())
        );
    }
}
