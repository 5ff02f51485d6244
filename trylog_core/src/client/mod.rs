//! Application logic on top of the store traits: feed, comments, posting,
//! profiles and the session. Every controller reports outcomes through the
//! shared [`Notifier`] and keeps its prior state when a call fails.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    auth::{AuthProvider, LocalAuth},
    backend::LocalBackend,
    error::ClientError,
    notify::{Notice, Notifier},
    remote::RemoteDataService,
    service::accounts::AccountsService,
    storage::ObjectStorage,
};

pub mod account;
pub mod comments;
pub mod composer;
pub mod feed;
pub mod profile;

#[cfg(test)]
pub(crate) mod testing;

/// Handles every controller needs.
#[derive(Clone)]
pub struct ClientServices {
    pub remote: Arc<dyn RemoteDataService>,
    pub auth: Arc<dyn AuthProvider>,
    pub storage: Arc<dyn ObjectStorage>,
    pub notifier: Arc<dyn Notifier>,
}

impl ClientServices {
    /// Wires the controllers straight to a database, skipping RPC.
    pub fn in_process(
        db: DatabaseConnection,
        storage: Arc<dyn ObjectStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            remote: Arc::new(LocalBackend::new(db.clone())),
            auth: Arc::new(LocalAuth::new(AccountsService::new(db))),
            storage,
            notifier,
        }
    }

    pub(crate) fn success(&self, message: impl Into<String>) {
        self.notifier.notify(Notice::success(message));
    }

    /// Raises an error notice and hands the error back for early return.
    pub(crate) fn failure(&self, action: &str, error: ClientError) -> ClientError {
        tracing::warn!(action, %error, "client operation failed");
        self.notifier.notify(Notice::failure(action, &error));
        error
    }
}
