//! Shared fixtures for controller tests: an in-memory store behind a remote
//! that can be told to fail.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::{
    auth::{AuthProvider, LocalAuth},
    backend::LocalBackend,
    client::ClientServices,
    entity::prelude::{CommentModel, PostModel, UserModel},
    error::ClientError,
    feed::ReactionType,
    ids::{CommentId, PostId, ReactionId, UserId},
    models::test_db,
    notify::{NoticeLevel, NoticeLog},
    remote::{
        CommentCount, CommentWithAuthor, NewComment, NewPost, NewReaction, NewUser, PostChanges,
        RawPost, RemoteDataService, UserChanges,
    },
    service::accounts::AccountsService,
    storage::LocalObjectStorage,
};

/// Delegates to a [`LocalBackend`]; individual call groups can be switched to fail.
pub(crate) struct FlakyRemote {
    inner: LocalBackend,
    pub fail_writes: AtomicBool,
    pub fail_counts: AtomicBool,
    pub fail_reads: AtomicBool,
    pub query_calls: AtomicUsize,
}

impl FlakyRemote {
    fn new(inner: LocalBackend) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            fail_counts: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            query_calls: AtomicUsize::new(0),
        }
    }

    fn check(flag: &AtomicBool) -> Result<(), ClientError> {
        if flag.load(Ordering::SeqCst) {
            return Err(ClientError::Remote("injected failure".to_string()));
        }
        Ok(())
    }

    fn write(&self) -> Result<(), ClientError> {
        Self::check(&self.fail_writes)
    }

    fn read(&self) -> Result<(), ClientError> {
        Self::check(&self.fail_reads)
    }
}

#[async_trait]
impl RemoteDataService for FlakyRemote {
    async fn query_posts(&self, author: Option<UserId>) -> Result<Vec<RawPost>, ClientError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.read()?;
        self.inner.query_posts(author).await
    }

    async fn comment_counts(
        &self,
        post_ids: Vec<PostId>,
    ) -> Result<Vec<CommentCount>, ClientError> {
        Self::check(&self.fail_counts)?;
        self.inner.comment_counts(post_ids).await
    }

    async fn insert_reaction(&self, reaction: NewReaction) -> Result<(), ClientError> {
        self.write()?;
        self.inner.insert_reaction(reaction).await
    }

    async fn delete_reactions(
        &self,
        post_id: PostId,
        user_id: UserId,
        reaction_type: ReactionType,
    ) -> Result<u64, ClientError> {
        self.write()?;
        self.inner
            .delete_reactions(post_id, user_id, reaction_type)
            .await
    }

    async fn find_post(&self, post_id: PostId) -> Result<Option<PostModel>, ClientError> {
        self.read()?;
        self.inner.find_post(post_id).await
    }

    async fn insert_post(&self, post: NewPost) -> Result<PostModel, ClientError> {
        self.write()?;
        self.inner.insert_post(post).await
    }

    async fn update_post(
        &self,
        post_id: PostId,
        actor: UserId,
        changes: PostChanges,
    ) -> Result<PostModel, ClientError> {
        self.write()?;
        self.inner.update_post(post_id, actor, changes).await
    }

    async fn delete_post(&self, post_id: PostId, actor: UserId) -> Result<(), ClientError> {
        self.write()?;
        self.inner.delete_post(post_id, actor).await
    }

    async fn list_comments(
        &self,
        post_id: PostId,
    ) -> Result<Vec<CommentWithAuthor>, ClientError> {
        self.read()?;
        self.inner.list_comments(post_id).await
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<CommentModel, ClientError> {
        self.write()?;
        self.inner.insert_comment(comment).await
    }

    async fn delete_comment(
        &self,
        comment_id: CommentId,
        actor: UserId,
    ) -> Result<(), ClientError> {
        self.write()?;
        self.inner.delete_comment(comment_id, actor).await
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<UserModel>, ClientError> {
        self.read()?;
        self.inner.find_user(user_id).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserModel, ClientError> {
        self.write()?;
        self.inner.insert_user(user).await
    }

    async fn update_user(
        &self,
        user_id: UserId,
        actor: UserId,
        changes: UserChanges,
    ) -> Result<UserModel, ClientError> {
        self.write()?;
        self.inner.update_user(user_id, actor, changes).await
    }
}

pub(crate) struct Harness {
    pub services: ClientServices,
    pub backend: LocalBackend,
    pub remote: Arc<FlakyRemote>,
    pub notices: NoticeLog,
    pub auth: Arc<LocalAuth>,
    pub storage_dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        let db = test_db().await;
        let backend = LocalBackend::new(db.clone());
        let remote = Arc::new(FlakyRemote::new(backend.clone()));
        let notices = NoticeLog::new();
        let auth = Arc::new(LocalAuth::new(AccountsService::new(db)));
        let storage_dir = tempfile::tempdir().unwrap();

        let services = ClientServices {
            remote: remote.clone(),
            auth: auth.clone(),
            storage: Arc::new(LocalObjectStorage::new(
                storage_dir.path(),
                "http://localhost:54321",
            )),
            notifier: Arc::new(notices.clone()),
        };

        Self {
            services,
            backend,
            remote,
            notices,
            auth,
            storage_dir,
        }
    }

    pub async fn user(&self, username: &str) -> UserId {
        self.backend
            .insert_user(NewUser {
                id: UserId::new(),
                username: username.to_string(),
            })
            .await
            .unwrap()
            .id
    }

    /// Account plus users row, signed in.
    pub async fn signed_in(&self, email: &str, username: &str) -> UserId {
        let account = self.auth.sign_up(email, "secret123").await.unwrap();
        self.backend
            .insert_user(NewUser {
                id: account.id,
                username: username.to_string(),
            })
            .await
            .unwrap();
        self.auth.sign_in(email, "secret123").await.unwrap();
        account.id
    }

    /// Signed-in account with no users row.
    pub async fn auth_only(&self, email: &str) -> UserId {
        let account = self.auth.sign_up(email, "secret123").await.unwrap();
        self.auth.sign_in(email, "secret123").await.unwrap();
        account.id
    }

    pub async fn post(&self, author: UserId, content: &str) -> PostId {
        self.backend
            .insert_post(NewPost {
                user_id: author,
                content: content.to_string(),
                image_url: None,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn react(&self, post_id: PostId, user_id: UserId, reaction_type: ReactionType) {
        self.backend
            .insert_reaction(NewReaction {
                id: ReactionId::new(),
                post_id,
                user_id,
                reaction_type,
                created_at: crate::now_rfc3339(),
            })
            .await
            .unwrap();
    }

    pub async fn comment(&self, post_id: PostId, user_id: UserId, content: &str) -> CommentId {
        self.backend
            .insert_comment(NewComment {
                post_id,
                user_id,
                content: content.to_string(),
            })
            .await
            .unwrap()
            .id
    }

    pub async fn post_count(&self) -> usize {
        self.backend.query_posts(None).await.unwrap().len()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.remote.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.remote.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_counts(&self, fail: bool) {
        self.remote.fail_counts.store(fail, Ordering::SeqCst);
    }

    pub fn query_calls(&self) -> usize {
        self.remote.query_calls.load(Ordering::SeqCst)
    }

    pub fn last_level(&self) -> Option<NoticeLevel> {
        self.notices.last().map(|notice| notice.level)
    }
}
