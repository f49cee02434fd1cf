//! File storage for slips and receipts.
//!
//! The engine only needs "store bytes, get a reference back". Serving the
//! stored files is left to whatever sits in front of `public_prefix`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// An uploaded file as received by the boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Where a file ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    /// Retrievable reference, e.g. `/uploads/slip_<uuid>_scan.png`.
    pub reference: String,
    /// Local path of the bytes.
    pub path: PathBuf,
    pub size: i64,
}

#[async_trait]
pub trait SlipStorage: Send + Sync + std::fmt::Debug {
    async fn store(&self, bytes: &[u8], suggested_name: &str) -> ResultEngine<StoredFile>;
}

/// Stores files in a local directory.
#[derive(Clone, Debug)]
pub struct LocalDiskStorage {
    root: PathBuf,
    public_prefix: String,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for LocalDiskStorage {
    fn default() -> Self {
        Self::new("./uploads", "/uploads")
    }
}

/// Keeps only the final path component and replaces anything outside
/// `[A-Za-z0-9._-]`.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl SlipStorage for LocalDiskStorage {
    async fn store(&self, bytes: &[u8], suggested_name: &str) -> ResultEngine<StoredFile> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| EngineError::Storage(format!("cannot create upload dir: {err}")))?;

        let name = format!("{}_{}", Uuid::new_v4().simple(), sanitize_file_name(suggested_name));
        let path = self.root.join(&name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|err| EngineError::Storage(format!("cannot write {name}: {err}")))?;

        let size = i64::try_from(bytes.len())
            .map_err(|_| EngineError::InvalidArgument("file too large".to_string()))?;
        Ok(StoredFile {
            reference: format!("{}/{}", self.public_prefix.trim_end_matches('/'), name),
            path,
            size,
        })
    }
}
