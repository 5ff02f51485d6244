use crate::{
    client::ClientServices,
    entity::prelude::PostModel,
    error::ClientError,
    ids::{PostId, UserId},
    remote::{NewPost, PostChanges},
    storage::{object_path_from_url, post_image_path, ImageUpload, POST_IMAGES_BUCKET},
};

/// Writes new posts, uploading the optional image first.
pub struct PostComposer {
    services: ClientServices,
    viewer: Option<UserId>,
}

impl PostComposer {
    pub fn new(services: ClientServices, viewer: Option<UserId>) -> Self {
        Self { services, viewer }
    }

    /// Nothing is inserted when the image upload fails.
    pub async fn create(
        &self,
        content: &str,
        image: Option<ImageUpload>,
    ) -> Result<PostModel, ClientError> {
        let Some(viewer) = self.viewer else {
            return Err(self.services.failure(
                "Failed to create post",
                ClientError::Auth("sign in to post".to_string()),
            ));
        };

        if content.trim().is_empty() {
            return Err(self.services.failure(
                "Failed to create post",
                ClientError::validation("post content is empty"),
            ));
        }

        let image_url = match image {
            Some(upload) => {
                let path = post_image_path(viewer, &upload);
                match self
                    .services
                    .storage
                    .upload(POST_IMAGES_BUCKET, &path, upload.bytes, false)
                    .await
                {
                    Ok(url) => Some(url),
                    Err(e) => return Err(self.services.failure("Failed to upload image", e)),
                }
            }
            None => None,
        };

        let new_post = NewPost {
            user_id: viewer,
            content: content.to_string(),
            image_url,
        };

        match self.services.remote.insert_post(new_post).await {
            Ok(post) => {
                tracing::info!(post_id = %post.id, "post created");
                self.services.success("Post created");
                Ok(post)
            }
            Err(e) => Err(self.services.failure("Failed to create post", e)),
        }
    }
}

/// Editable copy of a post's content and image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub content: String,
    pub image_url: Option<String>,
}

/// Edits one of the viewer's posts.
pub struct PostEditor {
    services: ClientServices,
    viewer: Option<UserId>,
    post_id: PostId,
    draft: Option<PostDraft>,
}

impl PostEditor {
    pub fn new(services: ClientServices, viewer: Option<UserId>, post_id: PostId) -> Self {
        Self {
            services,
            viewer,
            post_id,
            draft: None,
        }
    }

    pub fn draft(&self) -> Option<&PostDraft> {
        self.draft.as_ref()
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        if let Some(draft) = self.draft.as_mut() {
            draft.content = content.into();
        }
    }

    /// Loads the post into the draft. Only its author may edit it.
    pub async fn open(&mut self) -> Result<&PostDraft, ClientError> {
        let viewer = self.require_viewer("Failed to load post")?;

        let post = match self.services.remote.find_post(self.post_id).await {
            Ok(Some(post)) => post,
            Ok(None) => {
                return Err(self.services.failure(
                    "Failed to load post",
                    ClientError::NotFound("post".to_string()),
                ))
            }
            Err(e) => return Err(self.services.failure("Failed to load post", e)),
        };

        if post.user_id != viewer {
            return Err(self.services.failure(
                "Failed to load post",
                ClientError::Auth("only the author can edit this post".to_string()),
            ));
        }

        Ok(self.draft.insert(PostDraft {
            content: post.content,
            image_url: post.image_url,
        }))
    }

    /// Swaps the draft's image: the old object is removed, the new one
    /// uploaded. The post itself changes only on [`PostEditor::save`].
    pub async fn replace_image(&mut self, upload: ImageUpload) -> Result<String, ClientError> {
        let viewer = self.require_viewer("Failed to upload image")?;
        let Some(old_url) = self.draft.as_ref().map(|draft| draft.image_url.clone()) else {
            return Err(self.not_open("Failed to upload image"));
        };

        if let Some(old_path) = old_url
            .as_deref()
            .and_then(|url| object_path_from_url(POST_IMAGES_BUCKET, url))
        {
            if let Err(e) = self
                .services
                .storage
                .remove(POST_IMAGES_BUCKET, &[old_path])
                .await
            {
                tracing::warn!(error = %e, "old post image not removed");
            }
        }

        let path = post_image_path(viewer, &upload);
        let url = match self
            .services
            .storage
            .upload(POST_IMAGES_BUCKET, &path, upload.bytes, false)
            .await
        {
            Ok(url) => url,
            Err(e) => return Err(self.services.failure("Failed to upload image", e)),
        };

        if let Some(draft) = self.draft.as_mut() {
            draft.image_url = Some(url.clone());
        }
        Ok(url)
    }

    pub async fn save(&mut self) -> Result<PostModel, ClientError> {
        let viewer = self.require_viewer("Failed to update post")?;
        let Some(draft) = self.draft.clone() else {
            return Err(self.not_open("Failed to update post"));
        };

        if draft.content.trim().is_empty() {
            return Err(self.services.failure(
                "Failed to update post",
                ClientError::validation("post content is empty"),
            ));
        }

        let changes = PostChanges {
            content: Some(draft.content),
            image_url: Some(draft.image_url),
        };

        match self
            .services
            .remote
            .update_post(self.post_id, viewer, changes)
            .await
        {
            Ok(post) => {
                self.services.success("Post updated");
                Ok(post)
            }
            Err(e) => Err(self.services.failure("Failed to update post", e)),
        }
    }

    fn require_viewer(&self, action: &str) -> Result<UserId, ClientError> {
        self.viewer.ok_or_else(|| {
            self.services
                .failure(action, ClientError::Auth("sign in to edit posts".to_string()))
        })
    }

    fn not_open(&self, action: &str) -> ClientError {
        self.services
            .failure(action, ClientError::validation("post is not loaded"))
    }
}
