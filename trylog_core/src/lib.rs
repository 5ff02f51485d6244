use tokio::sync::OnceCell;

use std::{sync::Arc, time::Duration};

use chrono::SecondsFormat;
use iroh::Endpoint;
use sea_orm::DatabaseConnection;
use zel_core::{prelude::RpcServerBuilder, protocol::RpcClient, IrohBundle};

use crate::{
    auth::LocalAuth,
    client::ClientServices,
    notify::Notifier,
    rpc::RpcRemote,
    service::{
        accounts::AccountsService, comments::CommentsServer, comments::CommentsService,
        posts::PostsServer, posts::PostsService, reactions::ReactionsServer,
        reactions::ReactionsService, users::UsersServer, users::UsersService,
    },
    storage::LocalObjectStorage,
};

pub mod entity;
pub mod ids;
pub mod models;

pub mod service;

pub mod error;

pub mod config;

pub mod auth;
pub mod backend;
pub mod client;
pub mod feed;
pub mod notify;
pub mod remote;
pub mod rpc;
pub mod storage;
pub mod telemetry;

static TRYLOG_CORE: OnceCell<Arc<TryLogCore>> = OnceCell::const_new();
static ALPN: &[u8] = b"trylog::0.1.0";

/// Starts the runtime on first use and hands out the shared handle.
pub async fn core() -> Result<Arc<TryLogCore>, Box<dyn std::error::Error>> {
    TRYLOG_CORE
        .get_or_try_init(|| async move { TryLogCore::start().await.map(Arc::new) })
        .await
        .cloned()
}

/// Timestamp format of every `created_at` column.
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Main runtime handle for TryLog.
pub struct TryLogCore {
    pub config: config::TryLogConfig,

    pub db: DatabaseConnection,

    /// Server bundle that accepts inbound RPC traffic.
    pub server: IrohBundle,

    /// Client-side endpoint connected to the local server.
    pub client_endpoint: Endpoint,

    /// Typed clients for the local server.
    pub remote: RpcRemote,

    pub auth: Arc<LocalAuth>,

    pub storage: Arc<LocalObjectStorage>,
}

impl TryLogCore {
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        telemetry::init_tracing();

        let config = config::get_or_init().await?;
        tracing::info!(
            database = %config.database_path().display(),
            storage = %config.storage_dir().display(),
            "starting trylog core"
        );

        // ----------------
        // Server endpoint
        // ----------------
        let mut server_builder = IrohBundle::builder(Some(config.secret_key.clone())).await?;
        let server_endpoint = server_builder.endpoint().clone();

        // DB + migrations
        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        // Register RPC servers
        let rpc_server_builder = RpcServerBuilder::new(ALPN, server_endpoint.clone());

        let rpc_server_builder = PostsService::new(db.clone()).register_service(rpc_server_builder);
        let rpc_server_builder =
            ReactionsService::new(db.clone()).register_service(rpc_server_builder);
        let rpc_server_builder =
            CommentsService::new(db.clone()).register_service(rpc_server_builder);
        let rpc_server_builder = UsersService::new(db.clone()).register_service(rpc_server_builder);

        let rpc_server = rpc_server_builder.build();

        let server = server_builder.accept(ALPN, rpc_server).finish().await;

        server.wait_online().await;

        // ----------------
        // Client endpoint
        // ----------------
        let client_endpoint = Endpoint::builder()
            .secret_key(config.client_secret_key.clone())
            .alpns(vec![ALPN.to_vec()])
            .bind()
            .await?;

        client_endpoint.online().await;

        // Connect client endpoint -> server endpoint
        let conn = client_endpoint
            .connect(server.endpoint.addr(), ALPN)
            .await?;

        let rpc = RpcClient::new(conn).await?;
        let remote = RpcRemote::new(rpc);

        let auth = Arc::new(LocalAuth::new(AccountsService::new(db.clone())));
        let storage = Arc::new(LocalObjectStorage::new(
            config.storage_dir(),
            config.public_base_url(),
        ));

        tracing::info!("trylog core online");

        Ok(Self {
            config,
            db,
            server,
            client_endpoint,
            remote,
            auth,
            storage,
        })
    }

    /// Bundles the runtime's remote, auth and storage for the client controllers.
    pub fn client_services(&self, notifier: Arc<dyn Notifier>) -> ClientServices {
        ClientServices {
            remote: Arc::new(self.remote.clone()),
            auth: self.auth.clone(),
            storage: self.storage.clone(),
            notifier,
        }
    }

    pub async fn shutdown(self) -> Result<(), Box<dyn std::error::Error>> {
        // Close client endpoint
        self.client_endpoint.close().await;

        // Shutdown server bundle
        self.server.shutdown(Duration::from_secs(5)).await?;
        tracing::info!("trylog core stopped");
        Ok(())
    }
}

pub mod prelude {
    pub use super::ids;
    pub use super::entity;
    pub use super::models;

    pub use super::service;

    pub use super::error;

    pub use super::config;

    pub use super::auth::{AuthProvider, AuthUser};
    pub use super::client::{
        account::{Accounts, SessionContext, Viewer},
        comments::CommentThread,
        composer::{PostComposer, PostEditor},
        feed::{FeedController, FeedScope},
        profile::{ProfileEditor, UserPage},
        ClientServices,
    };
    pub use super::error::{ClientError, ErrorKind};
    pub use super::feed::{PostView, ReactionSummary, ReactionType};
    pub use super::notify::{Notice, NoticeLevel, NoticeLog, Notifier};
    pub use super::remote::RemoteDataService;
    pub use super::storage::{ImageUpload, ObjectStorage};

    pub use zel_core;
}
