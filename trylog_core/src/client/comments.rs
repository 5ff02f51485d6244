use crate::{
    client::ClientServices,
    error::ClientError,
    ids::{CommentId, PostId, UserId},
    remote::{CommentWithAuthor, NewComment},
};

/// The comment list under one post.
pub struct CommentThread {
    services: ClientServices,
    viewer: Option<UserId>,
    post_id: PostId,
    post_author: Option<UserId>,
    comments: Vec<CommentWithAuthor>,
}

impl CommentThread {
    pub fn new(services: ClientServices, viewer: Option<UserId>, post_id: PostId) -> Self {
        Self {
            services,
            viewer,
            post_id,
            post_author: None,
            comments: Vec::new(),
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn post_author(&self) -> Option<UserId> {
        self.post_author
    }

    /// Oldest first.
    pub fn comments(&self) -> &[CommentWithAuthor] {
        &self.comments
    }

    /// Fetches the comments and the post's author side by side.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let remote = &self.services.remote;
        let (comments, post) = tokio::join!(
            remote.list_comments(self.post_id),
            remote.find_post(self.post_id)
        );

        let comments = match comments {
            Ok(comments) => comments,
            Err(e) => return Err(self.services.failure("Failed to load comments", e)),
        };

        let post = match post {
            Ok(Some(post)) => post,
            Ok(None) => {
                return Err(self.services.failure(
                    "Failed to load the post author",
                    ClientError::NotFound("post".to_string()),
                ))
            }
            Err(e) => return Err(self.services.failure("Failed to load the post author", e)),
        };

        tracing::debug!(post_id = %self.post_id, comments = comments.len(), "comments loaded");
        self.comments = comments;
        self.post_author = Some(post.user_id);
        Ok(())
    }

    /// The comment's author and the post's author may delete it.
    pub fn can_delete(&self, comment: &CommentWithAuthor) -> bool {
        match self.viewer {
            Some(viewer) => {
                comment.comment.user_id == viewer || self.post_author == Some(viewer)
            }
            None => false,
        }
    }

    pub async fn submit(&mut self, text: &str) -> Result<(), ClientError> {
        let Some(viewer) = self.viewer else {
            return Err(self.services.failure(
                "Failed to post comment",
                ClientError::Auth("sign in to comment".to_string()),
            ));
        };

        let content = text.trim();
        if content.is_empty() {
            return Err(self.services.failure(
                "Failed to post comment",
                ClientError::validation("comment is empty"),
            ));
        }

        let comment = NewComment {
            post_id: self.post_id,
            user_id: viewer,
            content: content.to_string(),
        };
        if let Err(e) = self.services.remote.insert_comment(comment).await {
            return Err(self.services.failure("Failed to post comment", e));
        }

        match self.services.remote.list_comments(self.post_id).await {
            Ok(comments) => {
                self.comments = comments;
                self.services.success("Comment posted");
                Ok(())
            }
            Err(e) => Err(self.services.failure("Failed to load comments", e)),
        }
    }

    pub async fn delete(&mut self, comment_id: CommentId) -> Result<(), ClientError> {
        let Some(comment) = self.comments.iter().find(|c| c.comment.id == comment_id) else {
            return Err(self.services.failure(
                "Failed to delete comment",
                ClientError::NotFound("comment".to_string()),
            ));
        };

        let (Some(viewer), true) = (self.viewer, self.can_delete(comment)) else {
            return Err(self.services.failure(
                "Failed to delete comment",
                ClientError::Auth("you cannot delete this comment".to_string()),
            ));
        };

        if let Err(e) = self.services.remote.delete_comment(comment_id, viewer).await {
            return Err(self.services.failure("Failed to delete comment", e));
        }

        self.comments.retain(|c| c.comment.id != comment_id);
        self.services.success("Comment deleted");
        Ok(())
    }
}
