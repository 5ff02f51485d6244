//! [`RemoteDataService`] over the zel RPC clients of a running store node.

use async_trait::async_trait;
use zel_core::protocol::RpcClient;

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
        comments::CommentsClient, posts::PostsClient, reactions::ReactionsClient,
        users::UsersClient,
    },
};

/// Typed clients sharing one RPC connection.
#[derive(Clone)]
pub struct RpcRemote {
    pub posts: PostsClient,
    pub reactions: ReactionsClient,
    pub comments: CommentsClient,
    pub users: UsersClient,
}

impl RpcRemote {
    pub fn new(rpc: RpcClient) -> Self {
        Self {
            posts: PostsClient::new(rpc.clone()),
            reactions: ReactionsClient::new(rpc.clone()),
            comments: CommentsClient::new(rpc.clone()),
            users: UsersClient::new(rpc),
        }
    }
}

#[async_trait]
impl RemoteDataService for RpcRemote {
    async fn query_posts(&self, author: Option<UserId>) -> Result<Vec<RawPost>, ClientError> {
        self.posts
            .list_feed(author)
            .await
            .map_err(ClientError::from)
    }

    async fn comment_counts(
        &self,
        post_ids: Vec<PostId>,
    ) -> Result<Vec<CommentCount>, ClientError> {
        self.comments
            .count_comments(post_ids)
            .await
            .map_err(ClientError::from)
    }

    async fn insert_reaction(&self, reaction: NewReaction) -> Result<(), ClientError> {
        self.reactions
            .add_reaction(reaction)
            .await
            .map(|_| ())
            .map_err(ClientError::from)
    }

    async fn delete_reactions(
        &self,
        post_id: PostId,
        user_id: UserId,
        reaction_type: ReactionType,
    ) -> Result<u64, ClientError> {
        self.reactions
            .remove_reactions(post_id, user_id, reaction_type)
            .await
            .map_err(ClientError::from)
    }

    async fn find_post(&self, post_id: PostId) -> Result<Option<PostModel>, ClientError> {
        self.posts
            .find_post(post_id)
            .await
            .map_err(ClientError::from)
    }

    async fn insert_post(&self, post: NewPost) -> Result<PostModel, ClientError> {
        self.posts
            .create_post(post)
            .await
            .map_err(ClientError::from)
    }

    async fn update_post(
        &self,
        post_id: PostId,
        actor: UserId,
        changes: PostChanges,
    ) -> Result<PostModel, ClientError> {
        self.posts
            .update_post(post_id, actor, changes)
            .await
            .map_err(ClientError::from)
    }

    async fn delete_post(&self, post_id: PostId, actor: UserId) -> Result<(), ClientError> {
        self.posts
            .delete_post(post_id, actor)
            .await
            .map_err(ClientError::from)
    }

    async fn list_comments(
        &self,
        post_id: PostId,
    ) -> Result<Vec<CommentWithAuthor>, ClientError> {
        self.comments
            .list_comments(post_id)
            .await
            .map_err(ClientError::from)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<CommentModel, ClientError> {
        self.comments
            .create_comment(comment)
            .await
            .map_err(ClientError::from)
    }

    async fn delete_comment(
        &self,
        comment_id: CommentId,
        actor: UserId,
    ) -> Result<(), ClientError> {
        self.comments
            .delete_comment(comment_id, actor)
            .await
            .map_err(ClientError::from)
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<UserModel>, ClientError> {
        self.users
            .find_user(user_id)
            .await
            .map_err(ClientError::from)
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserModel, ClientError> {
        self.users
            .create_user(user)
            .await
            .map_err(ClientError::from)
    }

    async fn update_user(
        &self,
        user_id: UserId,
        actor: UserId,
        changes: UserChanges,
    ) -> Result<UserModel, ClientError> {
        self.users
            .update_user(user_id, actor, changes)
            .await
            .map_err(ClientError::from)
    }
}
