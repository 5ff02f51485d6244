use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::{
    auth::AuthUser,
    client::ClientServices,
    error::ClientError,
    ids::UserId,
    remote::NewUser,
};

const MIN_PASSWORD_LEN: usize = 6;

/// Sign-up, sign-in and sign-out with user-facing notices.
pub struct Accounts {
    services: ClientServices,
}

impl Accounts {
    pub fn new(services: ClientServices) -> Self {
        Self { services }
    }

    /// Registers the credentials and the public profile row. Does not sign in.
    /// When the row cannot be written the credentials are removed again.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<AuthUser, ClientError> {
        let email = email.trim();
        let username = username.trim();

        let invalid = if !email.contains('@') {
            Some("enter a valid email address")
        } else if password.chars().count() < MIN_PASSWORD_LEN {
            Some("password must be at least 6 characters")
        } else if username.is_empty() {
            Some("username is required")
        } else {
            None
        };
        if let Some(message) = invalid {
            return Err(self
                .services
                .failure("Failed to sign up", ClientError::validation(message)));
        }

        let user = match self.services.auth.sign_up(email, password).await {
            Ok(user) => user,
            Err(e) => return Err(self.services.failure("Failed to sign up", e)),
        };

        let profile = NewUser {
            id: user.id,
            username: username.to_string(),
        };
        if let Err(e) = self.services.remote.insert_user(profile).await {
            tracing::warn!(user_id = %user.id, error = %e, "users row not created");
            // Drop the credentials so the same email can sign up again
            if let Err(e) = self.services.auth.delete_account(user.id).await {
                tracing::warn!(user_id = %user.id, error = %e, "orphaned account not removed");
            }
            return Err(self.services.failure(
                "Failed to sign up",
                ClientError::validation("this user is already registered"),
            ));
        }

        tracing::info!(user_id = %user.id, "signed up");
        self.services.success("Account created. Please sign in.");
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, ClientError> {
        match self.services.auth.sign_in(email.trim(), password).await {
            Ok(user) => {
                self.services.success("Signed in");
                Ok(user)
            }
            Err(e) => Err(self.services.failure("Failed to sign in", e)),
        }
    }

    pub async fn sign_out(&self) -> Result<(), ClientError> {
        match self.services.auth.sign_out().await {
            Ok(()) => {
                self.services.success("Signed out");
                Ok(())
            }
            Err(e) => Err(self.services.failure("Failed to sign out", e)),
        }
    }
}

/// Who is looking. `username` is `None` when the profile row is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub user_id: UserId,
    pub username: Option<String>,
}

/// The current viewer, kept in step with the auth provider. Controllers get
/// [`SessionContext::user_id`] passed in explicitly.
pub struct SessionContext {
    services: ClientServices,
    changes: watch::Receiver<Option<AuthUser>>,
    viewer: Option<Viewer>,
}

impl SessionContext {
    pub fn new(services: ClientServices) -> Self {
        let changes = services.auth.subscribe();
        Self {
            services,
            changes,
            viewer: None,
        }
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.viewer.as_ref().map(|viewer| viewer.user_id)
    }

    /// Reads the signed-in user and their username.
    pub async fn refresh(&mut self) -> Result<Option<Viewer>, ClientError> {
        let user = match self.services.auth.current_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed");
                return Err(e);
            }
        };

        self.viewer = match user {
            Some(user) => {
                let username = match self.services.remote.find_user(user.id).await {
                    Ok(profile) => profile.map(|profile| profile.username),
                    Err(e) => {
                        tracing::warn!(user_id = %user.id, error = %e, "username lookup failed");
                        None
                    }
                };
                Some(Viewer {
                    user_id: user.id,
                    username,
                })
            }
            None => None,
        };

        tracing::debug!(viewer = ?self.viewer, "session refreshed");
        Ok(self.viewer.clone())
    }

    /// Waits for the next auth change and refreshes. Returns `false` once the
    /// auth provider is gone.
    pub async fn next_change(&mut self) -> bool {
        if self.changes.changed().await.is_err() {
            return false;
        }
        self.changes.borrow_and_update();

        let _ = self.refresh().await;
        true
    }

    /// Refreshes now and after every auth change, handing each viewer to
    /// `on_change`. Runs until the auth provider is dropped.
    pub async fn watch(mut self, mut on_change: impl FnMut(Option<&Viewer>) + Send) {
        let _ = self.refresh().await;
        on_change(self.viewer());

        while self.next_change().await {
            on_change(self.viewer());
        }
    }
}
