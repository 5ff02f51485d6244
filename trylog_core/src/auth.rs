use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};

use crate::{
    entity::prelude::AccountModel,
    error::ClientError,
    ids::UserId,
    service::accounts::{AccountsService, AuthServiceError},
};

/// The signed-in identity as the auth provider sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
}

impl From<AccountModel> for AuthUser {
    fn from(account: AccountModel) -> Self {
        Self {
            id: account.id,
            email: account.email,
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Registers credentials. Does not open a session.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, ClientError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, ClientError>;

    async fn sign_out(&self) -> Result<(), ClientError>;

    async fn current_user(&self) -> Result<Option<AuthUser>, ClientError>;

    /// Removes credentials created by [`AuthProvider::sign_up`], signing out
    /// first when they belong to the current session.
    async fn delete_account(&self, user_id: UserId) -> Result<(), ClientError>;

    /// Follows the signed-in user; a new value is published on every change.
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>>;
}

impl From<AuthServiceError> for ClientError {
    fn from(error: AuthServiceError) -> Self {
        match error {
            AuthServiceError::DbError(e) => ClientError::remote(e),
            AuthServiceError::Hashing(_) => ClientError::remote(error),
            AuthServiceError::EmailTaken => ClientError::validation(error.to_string()),
            AuthServiceError::InvalidCredentials => ClientError::Auth(error.to_string()),
        }
    }
}

/// Single-session auth over the account tables.
pub struct LocalAuth {
    accounts: AccountsService,
    token: Mutex<Option<String>>,
    current: watch::Sender<Option<AuthUser>>,
}

impl LocalAuth {
    pub fn new(accounts: AccountsService) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts,
            token: Mutex::new(None),
            current,
        }
    }

    fn publish(&self, user: Option<AuthUser>) {
        self.current.send_if_modified(|current| {
            if *current == user {
                false
            } else {
                *current = user;
                true
            }
        });
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, ClientError> {
        let account = self.accounts._create_account(email, password).await?;
        Ok(account.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, ClientError> {
        let (account, session) = self.accounts._sign_in(email, password).await?;

        let previous = self.token.lock().await.replace(session.token);
        if let Some(previous) = previous {
            self.accounts._sign_out(&previous).await?;
        }

        let user = AuthUser::from(account);
        self.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        let token = self.token.lock().await.take();
        if let Some(token) = token {
            self.accounts._sign_out(&token).await?;
        }

        self.publish(None);
        Ok(())
    }

    async fn delete_account(&self, user_id: UserId) -> Result<(), ClientError> {
        let signed_in = self
            .current
            .borrow()
            .as_ref()
            .is_some_and(|user| user.id == user_id);
        if signed_in {
            self.token.lock().await.take();
            self.publish(None);
        }

        self.accounts._delete_account(user_id).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, ClientError> {
        let mut token = self.token.lock().await;
        let Some(value) = token.clone() else {
            return Ok(None);
        };

        let account = self.accounts._resolve_session(&value).await?;
        match account {
            Some(account) => Ok(Some(account.into())),
            None => {
                tracing::debug!("session no longer valid");
                *token = None;
                drop(token);
                self.publish(None);
                Ok(None)
            }
        }
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.current.subscribe()
    }
}
