//! Public object storage for post images and avatars.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::{error::ClientError, ids::UserId};

pub const POST_IMAGES_BUCKET: &str = "post-images";
pub const AVATARS_BUCKET: &str = "users-icon";

/// A file picked by the user, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Text after the last `.`, or the whole name when there is none.
    pub fn extension(&self) -> &str {
        self.file_name.rsplit('.').next().unwrap_or_default()
    }
}

/// `{user_id}/{unix_millis}.{ext}`
pub fn post_image_path(user_id: UserId, upload: &ImageUpload) -> String {
    format!(
        "{user_id}/{}.{}",
        chrono::Utc::now().timestamp_millis(),
        upload.extension()
    )
}

/// `{user_id}/avatar_{unix_millis}.{ext}`
pub fn avatar_path(user_id: UserId, upload: &ImageUpload) -> String {
    format!(
        "{user_id}/avatar_{}.{}",
        chrono::Utc::now().timestamp_millis(),
        upload.extension()
    )
}

/// Recovers the object path from a public URL of `bucket`, dropping any query.
pub fn object_path_from_url(bucket: &str, url: &str) -> Option<String> {
    let marker = format!("{bucket}/");
    let start = url.find(&marker)? + marker.len();
    let path = url[start..].split('?').next().unwrap_or_default();
    (!path.is_empty()).then(|| path.to_string())
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` and returns the public URL. Without `upsert` an
    /// existing object is an error.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        upsert: bool,
    ) -> Result<String, ClientError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Missing objects are skipped.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), ClientError>;
}

/// Buckets as directories under one root.
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_file(&self, bucket: &str, path: &str) -> Result<PathBuf, ClientError> {
        check_segments(bucket, "bucket")?;
        check_segments(path, "object path")?;

        let mut file = self.root.join(bucket);
        for segment in path.split('/') {
            file.push(segment);
        }
        Ok(file)
    }
}

fn check_segments(value: &str, what: &str) -> Result<(), ClientError> {
    let bad = value.split('/').any(|segment| {
        segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\')
    });

    if bad {
        return Err(ClientError::validation(format!("invalid {what}: {value:?}")));
    }
    Ok(())
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        upsert: bool,
    ) -> Result<String, ClientError> {
        let file_path = self.object_file(bucket, path)?;

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(ClientError::remote)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true);
        if upsert {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(&file_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                ClientError::Remote(format!("object already exists: {bucket}/{path}"))
            } else {
                ClientError::remote(e)
            }
        })?;
        file.write_all(&bytes).await.map_err(ClientError::remote)?;
        file.flush().await.map_err(ClientError::remote)?;

        tracing::info!(bucket, path, size = bytes.len(), "object stored");
        Ok(self.public_url(bucket, path))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{path}",
            self.public_base_url
        )
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), ClientError> {
        for path in paths {
            let file_path = self.object_file(bucket, path)?;
            match fs::remove_file(&file_path).await {
                Ok(()) => tracing::info!(bucket, %path, "object removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(bucket, %path, "object already gone")
                }
                Err(e) => return Err(ClientError::remote(e)),
            }
        }
        Ok(())
    }
}
