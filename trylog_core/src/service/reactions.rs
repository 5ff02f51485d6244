use sea_orm::{sea_query::OnConflict, DatabaseConnection};
use thiserror::Error;
use zel_core::prelude::*;

use crate::{
    error::ClientError,
    entity::prelude::*,
    feed::ReactionType,
    ids::{PostId, UserId},
    remote::NewReaction,
};

#[derive(Debug, Error)]
pub enum ReactionsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("post not found")]
    PostNotFound,
}

impl From<ReactionsServiceError> for ResourceError {
    fn from(error: ReactionsServiceError) -> Self {
        match error {
            ReactionsServiceError::DbError(error) => ResourceError::infra(error),
            // Carries its client kind over RPC
            error => ClientError::from(error).into(),
        }
    }
}

#[derive(Clone)]
pub struct ReactionsService {
    db: DatabaseConnection,
}

impl ReactionsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a reaction. A second insert for the same (post, user, type) is
    /// absorbed by the unique index and reported as `false`.
    pub async fn _add_reaction(&self, reaction: NewReaction) -> Result<bool, ReactionsServiceError> {
        let post_exists = Post::find_by_id(reaction.post_id)
            .one(&self.db)
            .await?
            .is_some();

        if !post_exists {
            return Err(ReactionsServiceError::PostNotFound);
        }

        let row = ReactionActiveModel {
            id: Set(reaction.id),
            post_id: Set(reaction.post_id),
            user_id: Set(reaction.user_id),
            kind: Set(reaction.reaction_type.as_str().to_string()),
            created_at: Set(reaction.created_at),
        };

        let inserted = Reaction::insert(row)
            .on_conflict(
                OnConflict::columns([
                    ReactionColumn::PostId,
                    ReactionColumn::UserId,
                    ReactionColumn::Kind,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        tracing::info!(
            post_id = %reaction.post_id,
            user_id = %reaction.user_id,
            reaction_type = %reaction.reaction_type,
            inserted = inserted > 0,
            "reaction added"
        );

        Ok(inserted > 0)
    }

    /// Removes every row matching (post, user, type).
    pub async fn _remove_reactions(
        &self,
        post_id: PostId,
        user_id: UserId,
        reaction_type: ReactionType,
    ) -> Result<u64, ReactionsServiceError> {
        let result = Reaction::delete_many()
            .filter(ReactionColumn::PostId.eq(post_id))
            .filter(ReactionColumn::UserId.eq(user_id))
            .filter(ReactionColumn::Kind.eq(reaction_type.as_str()))
            .exec(&self.db)
            .await?;

        tracing::info!(
            %post_id,
            %user_id,
            %reaction_type,
            removed = result.rows_affected,
            "reaction removed"
        );

        Ok(result.rows_affected)
    }

    /// Raw rows on a post, oldest first
    pub async fn _list_reactions(
        &self,
        post_id: PostId,
    ) -> Result<Vec<ReactionModel>, ReactionsServiceError> {
        Ok(Reaction::find()
            .filter(ReactionColumn::PostId.eq(post_id))
            .order_by_asc(ReactionColumn::CreatedAt)
            .all(&self.db)
            .await?)
    }
}

#[zel_service(name = "reactions")]
trait Reactions {
    #[method(name = "add_reaction")]
    async fn add_reaction(&self, reaction: NewReaction) -> Result<bool, ResourceError>;

    #[doc = "Remove the caller's reaction of one type from a post"]
    #[method(name = "remove_reactions")]
    async fn remove_reactions(
        &self,
        post_id: PostId,
        user_id: UserId,
        reaction_type: ReactionType,
    ) -> Result<u64, ResourceError>;

    #[method(name = "list_reactions")]
    async fn list_reactions(&self, post_id: PostId) -> Result<Vec<ReactionModel>, ResourceError>;
}

#[async_trait]
impl ReactionsServer for ReactionsService {
    async fn add_reaction(
        &self,
        _ctx: RequestContext,
        reaction: NewReaction,
    ) -> Result<bool, ResourceError> {
        Ok(self._add_reaction(reaction).await?)
    }

    async fn remove_reactions(
        &self,
        _ctx: RequestContext,
        post_id: PostId,
        user_id: UserId,
        reaction_type: ReactionType,
    ) -> Result<u64, ResourceError> {
        Ok(self._remove_reactions(post_id, user_id, reaction_type).await?)
    }

    async fn list_reactions(
        &self,
        _ctx: RequestContext,
        post_id: PostId,
    ) -> Result<Vec<ReactionModel>, ResourceError> {
        Ok(self._list_reactions(post_id).await?)
    }
}
