use sea_orm::DatabaseConnection;
use thiserror::Error;
use zel_core::prelude::*;

use crate::{
    error::ClientError,
    entity::prelude::*,
    ids::UserId,
    remote::{NewUser, UserChanges},
};

#[derive(Debug, Error)]
pub enum UsersServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("user not found")]
    UserNotFound,

    #[error("user is already registered")]
    AlreadyRegistered,

    #[error("username is empty")]
    EmptyUsername,

    #[error("unauthorized: users may only edit their own profile")]
    Unauthorized,
}

impl From<UsersServiceError> for ResourceError {
    fn from(error: UsersServiceError) -> Self {
        match error {
            UsersServiceError::DbError(error) => ResourceError::infra(error),
            // Carries its client kind over RPC
            error => ClientError::from(error).into(),
        }
    }
}

#[derive(Clone)]
pub struct UsersService {
    db: DatabaseConnection,
}

impl UsersService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates the public profile row for a freshly signed-up account.
    pub async fn _create_user(&self, new_user: NewUser) -> Result<UserModel, UsersServiceError> {
        let username = new_user.username.trim().to_string();
        if username.is_empty() {
            return Err(UsersServiceError::EmptyUsername);
        }

        if self._find_user(new_user.id).await?.is_some() {
            return Err(UsersServiceError::AlreadyRegistered);
        }

        let user = UserActiveModel {
            id: Set(new_user.id),
            username: Set(username),
            image_url: Set(None),
            bio: Set(None),
        };

        let user = User::insert(user).exec_with_returning(&self.db).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user created");

        Ok(user)
    }

    pub async fn _find_user(&self, user_id: UserId) -> Result<Option<UserModel>, UsersServiceError> {
        Ok(User::find_by_id(user_id).one(&self.db).await?)
    }

    /// Overwrites the provided profile fields (only by the user themself)
    pub async fn _update_user(
        &self,
        user_id: UserId,
        actor: UserId,
        changes: UserChanges,
    ) -> Result<UserModel, UsersServiceError> {
        if user_id != actor {
            return Err(UsersServiceError::Unauthorized);
        }

        let user = self
            ._find_user(user_id)
            .await?
            .ok_or(UsersServiceError::UserNotFound)?;

        let mut user_active: UserActiveModel = user.into();

        if let Some(username) = changes.username {
            let username = username.trim().to_string();
            if username.is_empty() {
                return Err(UsersServiceError::EmptyUsername);
            }
            user_active.username = Set(username);
        }

        if let Some(bio) = changes.bio {
            user_active.bio = Set(Some(bio));
        }

        if let Some(image_url) = changes.image_url {
            user_active.image_url = Set(Some(image_url));
        }

        let updated = user_active.update(&self.db).await?;
        tracing::info!(%user_id, "user updated");

        Ok(updated)
    }
}

#[zel_service(name = "users")]
trait Users {
    #[method(name = "create_user")]
    async fn create_user(&self, user: NewUser) -> Result<UserModel, ResourceError>;

    #[method(name = "find_user")]
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserModel>, ResourceError>;

    #[doc = "Update a profile (only by its owner)"]
    #[method(name = "update_user")]
    async fn update_user(
        &self,
        user_id: UserId,
        actor: UserId,
        changes: UserChanges,
    ) -> Result<UserModel, ResourceError>;
}

#[async_trait]
impl UsersServer for UsersService {
    async fn create_user(
        &self,
        _ctx: RequestContext,
        user: NewUser,
    ) -> Result<UserModel, ResourceError> {
        Ok(self._create_user(user).await?)
    }

    async fn find_user(
        &self,
        _ctx: RequestContext,
        user_id: UserId,
    ) -> Result<Option<UserModel>, ResourceError> {
        Ok(self._find_user(user_id).await?)
    }

    async fn update_user(
        &self,
        _ctx: RequestContext,
        user_id: UserId,
        actor: UserId,
        changes: UserChanges,
    ) -> Result<UserModel, ResourceError> {
        Ok(self._update_user(user_id, actor, changes).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_db;

    async fn setup_test_service() -> UsersService {
        UsersService::new(test_db().await)
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            id: UserId::new(),
            username: username.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let service = setup_test_service().await;

        let created = service._create_user(new_user("  taro123 ")).await.unwrap();
        assert_eq!(created.username, "taro123");
        assert_eq!(created.bio, None);

        let found = service._find_user(created.id).await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_find_missing_user() {
        let service = setup_test_service().await;
        assert_eq!(service._find_user(UserId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_user_twice_fails() {
        let service = setup_test_service().await;
        let user = new_user("taro");

        service._create_user(user.clone()).await.unwrap();
        let result = service._create_user(user).await;
        assert!(matches!(result, Err(UsersServiceError::AlreadyRegistered)));
    }

    #[tokio::test]
    async fn test_empty_username_rejected() {
        let service = setup_test_service().await;
        let result = service._create_user(new_user("   ")).await;
        assert!(matches!(result, Err(UsersServiceError::EmptyUsername)));
    }

    #[tokio::test]
    async fn test_update_user() {
        let service = setup_test_service().await;
        let user = service._create_user(new_user("taro")).await.unwrap();

        let updated = service
            ._update_user(
                user.id,
                user.id,
                UserChanges {
                    username: Some("jiro".to_string()),
                    bio: Some("weekend hiker".to_string()),
                    image_url: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.username, "jiro");
        assert_eq!(updated.bio.as_deref(), Some("weekend hiker"));
        assert_eq!(updated.image_url, None);

        let with_avatar = service
            ._update_user(
                user.id,
                user.id,
                UserChanges {
                    image_url: Some("http://localhost/avatar.png".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(with_avatar.username, "jiro");
        assert_eq!(
            with_avatar.image_url.as_deref(),
            Some("http://localhost/avatar.png")
        );
    }

    #[tokio::test]
    async fn test_update_other_user_fails() {
        let service = setup_test_service().await;
        let user = service._create_user(new_user("taro")).await.unwrap();

        let result = service
            ._update_user(user.id, UserId::new(), UserChanges::default())
            .await;
        assert!(matches!(result, Err(UsersServiceError::Unauthorized)));
    }
}
