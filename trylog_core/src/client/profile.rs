use crate::{
    client::{
        feed::{FeedController, FeedScope},
        ClientServices,
    },
    entity::prelude::UserModel,
    error::ClientError,
    ids::UserId,
    remote::UserChanges,
    storage::{avatar_path, ImageUpload, AVATARS_BUCKET},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    pub username: String,
    pub bio: String,
}

/// Edits the signed-in user's own profile.
pub struct ProfileEditor {
    services: ClientServices,
    user_id: Option<UserId>,
    draft: Option<ProfileDraft>,
}

impl ProfileEditor {
    pub fn new(services: ClientServices) -> Self {
        Self {
            services,
            user_id: None,
            draft: None,
        }
    }

    pub fn draft(&self) -> Option<&ProfileDraft> {
        self.draft.as_ref()
    }

    /// Requires a session; hosts send the user to sign-in on an auth error.
    pub async fn open(&mut self) -> Result<&ProfileDraft, ClientError> {
        let user_id = self.session_user("Failed to load profile").await?;

        let user = match self.services.remote.find_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                return Err(self.services.failure(
                    "Failed to load profile",
                    ClientError::NotFound("profile".to_string()),
                ))
            }
            Err(e) => return Err(self.services.failure("Failed to load profile", e)),
        };

        self.user_id = Some(user_id);
        Ok(self.draft.insert(ProfileDraft {
            username: user.username,
            bio: user.bio.unwrap_or_default(),
        }))
    }

    /// Writes username and bio. The avatar URL changes only when a new
    /// avatar is given; it is uploaded before the row is touched.
    pub async fn save(
        &mut self,
        username: &str,
        bio: &str,
        avatar: Option<ImageUpload>,
    ) -> Result<UserModel, ClientError> {
        let user_id = self.session_user("Failed to update profile").await?;

        let username = username.trim();
        if username.is_empty() {
            return Err(self.services.failure(
                "Failed to update profile",
                ClientError::validation("username is required"),
            ));
        }

        let image_url = match avatar {
            Some(upload) => {
                let path = avatar_path(user_id, &upload);
                match self
                    .services
                    .storage
                    .upload(AVATARS_BUCKET, &path, upload.bytes, true)
                    .await
                {
                    Ok(url) => Some(url),
                    Err(e) => return Err(self.services.failure("Failed to upload image", e)),
                }
            }
            None => None,
        };

        let changes = UserChanges {
            username: Some(username.to_string()),
            bio: Some(bio.to_string()),
            image_url,
        };

        match self
            .services
            .remote
            .update_user(user_id, user_id, changes)
            .await
        {
            Ok(user) => {
                self.draft = Some(ProfileDraft {
                    username: user.username.clone(),
                    bio: user.bio.clone().unwrap_or_default(),
                });
                self.user_id = Some(user_id);
                self.services.success("Profile updated");
                Ok(user)
            }
            Err(e) => Err(self.services.failure("Failed to update profile", e)),
        }
    }

    async fn session_user(&self, action: &str) -> Result<UserId, ClientError> {
        match self.services.auth.current_user().await {
            Ok(Some(user)) => Ok(user.id),
            Ok(None) => Err(self.services.failure(
                action,
                ClientError::Auth("sign in to edit your profile".to_string()),
            )),
            Err(e) => Err(self.services.failure(action, e)),
        }
    }
}

/// A user's public page: their profile and their posts.
pub struct UserPage {
    services: ClientServices,
    user_id: UserId,
    profile: Option<UserModel>,
    feed: FeedController,
}

impl UserPage {
    pub fn new(services: ClientServices, viewer: Option<UserId>, user_id: UserId) -> Self {
        let feed = FeedController::new(services.clone(), viewer);
        Self {
            services,
            user_id,
            profile: None,
            feed,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// `None` until loaded, or when the user row is missing.
    pub fn profile(&self) -> Option<&UserModel> {
        self.profile.as_ref()
    }

    pub fn feed(&self) -> &FeedController {
        &self.feed
    }

    /// For reactions, deletes and paging on the user's posts.
    pub fn feed_mut(&mut self) -> &mut FeedController {
        &mut self.feed
    }

    /// Fetches profile and posts together. A missing profile still shows
    /// the posts.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        self.feed.navigate(FeedScope::User(self.user_id));

        let (profile, snapshot) = tokio::join!(
            self.services.remote.find_user(self.user_id),
            self.feed.fetch_snapshot()
        );

        let profile_result = match profile {
            Ok(profile) => {
                if profile.is_none() {
                    tracing::debug!(user_id = %self.user_id, "profile missing, using placeholder");
                }
                self.profile = profile;
                Ok(())
            }
            Err(e) => {
                self.profile = None;
                Err(self.services.failure("Failed to load profile", e))
            }
        };

        match snapshot {
            Ok(snapshot) => {
                self.feed.apply_snapshot(snapshot);
            }
            Err(e) => return Err(self.services.failure("Failed to load posts", e)),
        }

        profile_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::Harness;
    use crate::error::ErrorKind;
    use crate::notify::NoticeLevel;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_open_requires_session() {
        let h = Harness::new().await;

        let mut editor = ProfileEditor::new(h.services.clone());
        let error = editor.open().await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Auth);
        assert!(editor.draft().is_none());
    }

    #[tokio::test]
    async fn test_open_and_save_with_avatar() {
        let h = Harness::new().await;
        let user_id = h.signed_in("taro@example.com", "taro").await;

        let mut editor = ProfileEditor::new(h.services.clone());
        let draft = editor.open().await.unwrap();
        assert_eq!(draft.username, "taro");
        assert_eq!(draft.bio, "");

        let avatar = ImageUpload::new("me.webp", Bytes::from_static(b"RIFF"));
        let user = editor
            .save(" taro_k ", "likes trying things", Some(avatar))
            .await
            .unwrap();

        assert_eq!(user.username, "taro_k");
        assert_eq!(user.bio.as_deref(), Some("likes trying things"));
        let url = user.image_url.unwrap();
        assert!(url.contains(&format!("/users-icon/{user_id}/avatar_")), "{url}");
        assert!(url.ends_with(".webp"));
        assert_eq!(h.last_level(), Some(NoticeLevel::Success));

        // No new avatar: the stored URL is kept
        let user = editor.save("taro_k", "", None).await.unwrap();
        assert_eq!(user.image_url.as_deref(), Some(url.as_str()));
    }

    #[tokio::test]
    async fn test_save_requires_username() {
        let h = Harness::new().await;
        h.signed_in("taro@example.com", "taro").await;

        let mut editor = ProfileEditor::new(h.services.clone());
        let error = editor.save("  ", "bio", None).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_user_page_shows_only_their_posts() {
        let h = Harness::new().await;
        let author = h.user("author").await;
        let other = h.user("other").await;
        h.post(author, "mine 1").await;
        h.post(other, "not mine").await;
        h.post(author, "mine 2").await;

        let mut page = UserPage::new(h.services.clone(), Some(other), author);
        page.load().await.unwrap();

        assert_eq!(page.profile().map(|p| p.username.as_str()), Some("author"));
        let contents: Vec<&str> = page
            .feed()
            .posts()
            .iter()
            .map(|p| p.content.as_str())
            .collect();
        assert_eq!(contents, vec!["mine 2", "mine 1"]);
    }

    #[tokio::test]
    async fn test_user_page_missing_profile_is_placeholder() {
        let h = Harness::new().await;

        let mut page = UserPage::new(h.services.clone(), None, UserId::new());
        page.load().await.unwrap();

        assert!(page.profile().is_none());
        assert!(page.feed().posts().is_empty());
    }

    #[tokio::test]
    async fn test_user_page_toggle_refreshes_user_scope() {
        let h = Harness::new().await;
        let author = h.user("author").await;
        let viewer = h.user("viewer").await;
        let post_id = h.post(author, "tried climbing").await;
        h.post(viewer, "viewer post").await;

        let mut page = UserPage::new(h.services.clone(), Some(viewer), author);
        page.load().await.unwrap();
        page.feed_mut()
            .toggle_reaction(post_id, crate::feed::ReactionType::HaveTried)
            .await
            .unwrap();

        let posts = page.feed().posts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].reaction(crate::feed::ReactionType::HaveTried).reacted_by_user);
    }
}
