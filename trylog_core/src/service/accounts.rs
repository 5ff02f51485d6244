use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{distr::Alphanumeric, Rng};
use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::{entity::prelude::*, ids::UserId};

const SESSION_TOKEN_LEN: usize = 48;

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("email is already registered")]
    EmailTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Email/password accounts and their sign-in sessions.
#[derive(Clone)]
pub struct AccountsService {
    db: DatabaseConnection,
}

impl AccountsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn _create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccountModel, AuthServiceError> {
        let email = normalize_email(email);

        if self._find_by_email(&email).await?.is_some() {
            return Err(AuthServiceError::EmailTaken);
        }

        let password_hash = hash_password(password.to_string()).await?;

        let account = AccountActiveModel {
            id: Set(UserId::new()),
            email: Set(email),
            password_hash: Set(password_hash),
            created_at: Set(crate::now_rfc3339()),
        };

        let account = Account::insert(account)
            .exec_with_returning(&self.db)
            .await?;
        tracing::info!(account_id = %account.id, "account created");

        Ok(account)
    }

    /// Checks the credentials and opens a new session for the account.
    pub async fn _sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(AccountModel, SessionModel), AuthServiceError> {
        let account = self
            ._find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !verify_password(password.to_string(), account.password_hash.clone()).await? {
            tracing::warn!(account_id = %account.id, "sign-in rejected");
            return Err(AuthServiceError::InvalidCredentials);
        }

        let session = SessionActiveModel {
            token: Set(new_session_token()),
            account_id: Set(account.id),
            created_at: Set(crate::now_rfc3339()),
        };

        let session = Session::insert(session)
            .exec_with_returning(&self.db)
            .await?;
        tracing::info!(account_id = %account.id, "session opened");

        Ok((account, session))
    }

    /// Ends a session. Unknown tokens are ignored.
    pub async fn _sign_out(&self, token: &str) -> Result<(), AuthServiceError> {
        let result = Session::delete_by_id(token.to_string())
            .exec(&self.db)
            .await?;
        tracing::info!(closed = result.rows_affected, "session closed");
        Ok(())
    }

    /// Removes an account and, through the cascade, its sessions.
    pub async fn _delete_account(&self, account_id: UserId) -> Result<u64, AuthServiceError> {
        let result = Account::delete_by_id(account_id).exec(&self.db).await?;
        tracing::info!(%account_id, removed = result.rows_affected, "account deleted");
        Ok(result.rows_affected)
    }

    pub async fn _resolve_session(
        &self,
        token: &str,
    ) -> Result<Option<AccountModel>, AuthServiceError> {
        let found = Session::find_by_id(token.to_string())
            .find_also_related(Account)
            .one(&self.db)
            .await?;

        Ok(found.and_then(|(_, account)| account))
    }

    async fn _find_by_email(&self, email: &str) -> Result<Option<AccountModel>, AuthServiceError> {
        Ok(Account::find()
            .filter(AccountColumn::Email.eq(email))
            .one(&self.db)
            .await?)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn new_session_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Argon2id with a random salt, as a PHC string. Runs off the async runtime.
async fn hash_password(password: String) -> Result<String, AuthServiceError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthServiceError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthServiceError::Hashing(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, AuthServiceError> {
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&hash).map_err(|e| AuthServiceError::Hashing(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AuthServiceError::Hashing(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_db;

    async fn setup_test_service() -> AccountsService {
        AccountsService::new(test_db().await)
    }

    #[tokio::test]
    async fn test_create_account_hashes_password() {
        let service = setup_test_service().await;

        let account = service
            ._create_account(" Taro@Example.com ", "secret123")
            .await
            .unwrap();

        assert_eq!(account.email, "taro@example.com");
        assert_ne!(account.password_hash, "secret123");
        assert!(account.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let service = setup_test_service().await;

        service
            ._create_account("taro@example.com", "secret123")
            .await
            .unwrap();
        let result = service
            ._create_account("TARO@example.com", "another1")
            .await;

        assert!(matches!(result, Err(AuthServiceError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_sign_in_and_resolve_session() {
        let service = setup_test_service().await;
        let account = service
            ._create_account("taro@example.com", "secret123")
            .await
            .unwrap();

        let (signed_in, session) = service
            ._sign_in("taro@example.com", "secret123")
            .await
            .unwrap();
        assert_eq!(signed_in.id, account.id);
        assert_eq!(session.token.len(), SESSION_TOKEN_LEN);

        let resolved = service._resolve_session(&session.token).await.unwrap();
        assert_eq!(resolved.map(|a| a.id), Some(account.id));
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let service = setup_test_service().await;
        service
            ._create_account("taro@example.com", "secret123")
            .await
            .unwrap();

        let wrong = service._sign_in("taro@example.com", "secret124").await;
        assert!(matches!(wrong, Err(AuthServiceError::InvalidCredentials)));

        let unknown = service._sign_in("jiro@example.com", "secret123").await;
        assert!(matches!(unknown, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_out_ends_session() {
        let service = setup_test_service().await;
        service
            ._create_account("taro@example.com", "secret123")
            .await
            .unwrap();
        let (_, session) = service
            ._sign_in("taro@example.com", "secret123")
            .await
            .unwrap();

        service._sign_out(&session.token).await.unwrap();

        assert_eq!(service._resolve_session(&session.token).await.unwrap(), None);
        service._sign_out(&session.token).await.unwrap();
    }
}
