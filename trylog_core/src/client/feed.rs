use serde::{Deserialize, Serialize};

use crate::{
    client::ClientServices,
    error::ClientError,
    feed::{
        aggregate_posts, comment_count_map, plan_toggle, FeedPager, PostView, ReactionType,
        ToggleAction,
    },
    ids::{PostId, UserId},
};

/// Which posts a feed shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedScope {
    Global,
    User(UserId),
}

impl FeedScope {
    pub fn author(self) -> Option<UserId> {
        match self {
            FeedScope::Global => None,
            FeedScope::User(user_id) => Some(user_id),
        }
    }
}

/// Aggregated posts fetched for one scope, tagged with the load they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSnapshot {
    generation: u64,
    scope: FeedScope,
    posts: Vec<PostView>,
}

impl FeedSnapshot {
    pub fn posts(&self) -> &[PostView] {
        &self.posts
    }
}

/// A scrollable post feed: the aggregated list, its display window and the
/// reaction and delete actions on it.
pub struct FeedController {
    services: ClientServices,
    viewer: Option<UserId>,
    scope: FeedScope,
    pager: FeedPager,
    generation: u64,
    posts: Vec<PostView>,
}

impl FeedController {
    pub fn new(services: ClientServices, viewer: Option<UserId>) -> Self {
        Self {
            services,
            viewer,
            scope: FeedScope::Global,
            pager: FeedPager::new(),
            generation: 0,
            posts: Vec::new(),
        }
    }

    pub fn viewer(&self) -> Option<UserId> {
        self.viewer
    }

    /// The list and any load in flight were aggregated for the old viewer,
    /// so both are dropped. Call [`FeedController::refresh`] afterwards.
    pub fn set_viewer(&mut self, viewer: Option<UserId>) {
        if self.viewer != viewer {
            self.viewer = viewer;
            self.generation += 1;
            self.posts.clear();
        }
    }

    pub fn scope(&self) -> FeedScope {
        self.scope
    }

    pub fn posts(&self) -> &[PostView] {
        &self.posts
    }

    pub fn visible_posts(&self) -> &[PostView] {
        self.pager.window(&self.posts)
    }

    pub fn visible_count(&self) -> usize {
        self.pager.visible_count()
    }

    pub fn show_more(&mut self) {
        self.pager.show_more();
    }

    pub fn has_more(&self) -> bool {
        self.pager.has_more(self.posts.len())
    }

    /// Switches scope and starts over: window back to one page, list cleared.
    pub fn navigate(&mut self, scope: FeedScope) {
        tracing::debug!(?scope, "feed navigate");
        self.scope = scope;
        self.pager.reset();
        self.generation += 1;
        self.posts.clear();
    }

    pub async fn load(&mut self, scope: FeedScope) -> Result<(), ClientError> {
        self.navigate(scope);
        self.refresh().await
    }

    /// Posts for the current scope, then their comment counts, aggregated for
    /// the viewer. Does not touch controller state.
    pub async fn fetch_snapshot(&self) -> Result<FeedSnapshot, ClientError> {
        let generation = self.generation;
        let scope = self.scope;

        let raw_posts = self.services.remote.query_posts(scope.author()).await?;

        let post_ids: Vec<PostId> = raw_posts.iter().map(|raw| raw.post.id).collect();
        let counts = if post_ids.is_empty() {
            Default::default()
        } else {
            comment_count_map(self.services.remote.comment_counts(post_ids).await?)
        };

        Ok(FeedSnapshot {
            generation,
            scope,
            posts: aggregate_posts(&raw_posts, &counts, self.viewer),
        })
    }

    /// Replaces the list with `snapshot` unless a newer load has started since
    /// it was fetched. Returns whether it was applied.
    pub fn apply_snapshot(&mut self, snapshot: FeedSnapshot) -> bool {
        if snapshot.generation != self.generation || snapshot.scope != self.scope {
            tracing::debug!(
                snapshot = snapshot.generation,
                current = self.generation,
                "stale feed snapshot dropped"
            );
            return false;
        }

        self.posts = snapshot.posts;
        true
    }

    /// Re-fetches the current scope. On failure the previous list stays.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        match self.fetch_snapshot().await {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot);
                Ok(())
            }
            Err(e) => Err(self.services.failure("Failed to load posts", e)),
        }
    }

    /// Adds or removes the viewer's reaction, then reloads the feed. A failed
    /// write leaves the list as it was and skips the reload.
    pub async fn toggle_reaction(
        &mut self,
        post_id: PostId,
        reaction_type: ReactionType,
    ) -> Result<(), ClientError> {
        let Some(post) = self.posts.iter().find(|post| post.id == post_id) else {
            return Err(self.services.failure(
                "Failed to update reaction",
                ClientError::NotFound("post".to_string()),
            ));
        };

        let action = match plan_toggle(post, reaction_type, self.viewer) {
            Ok(action) => action,
            Err(e) => return Err(self.services.failure("Failed to update reaction", e)),
        };

        let message = match action {
            ToggleAction::Add(reaction) => self
                .services
                .remote
                .insert_reaction(reaction)
                .await
                .map(|_| "Reaction added"),
            ToggleAction::Remove {
                post_id,
                user_id,
                reaction_type,
            } => {
                let removed = self
                    .services
                    .remote
                    .delete_reactions(post_id, user_id, reaction_type)
                    .await;

                match removed {
                    Ok(0) => {
                        // The list said reacted, the store had nothing to remove
                        let error = self.services.failure(
                            "Failed to update reaction",
                            ClientError::NotFound("reaction".to_string()),
                        );
                        let _ = self.refresh().await;
                        return Err(error);
                    }
                    Ok(_) => Ok("Reaction removed"),
                    Err(e) => Err(e),
                }
            }
        };

        match message {
            Ok(message) => {
                tracing::info!(%post_id, %reaction_type, outcome = message, "reaction toggled");
                self.services.success(message);
                self.refresh().await
            }
            Err(e) => Err(self.services.failure("Failed to update reaction", e)),
        }
    }

    /// Deletes one of the viewer's posts and drops it from the list.
    pub async fn delete_post(&mut self, post_id: PostId) -> Result<(), ClientError> {
        let Some(viewer) = self.viewer else {
            return Err(self.services.failure(
                "Failed to delete post",
                ClientError::Auth("sign in to delete posts".to_string()),
            ));
        };

        if let Err(e) = self.services.remote.delete_post(post_id, viewer).await {
            return Err(self.services.failure("Failed to delete post", e));
        }

        self.posts.retain(|post| post.id != post_id);
        self.services.success("Post deleted");
        Ok(())
    }
}
