//! The resource tree a server serves from.
//!
//! Request paths are mapped onto files below one root directory. Paths that
//! would leave the root, and paths naming a directory, are treated as missing.

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::date;

#[derive(Debug, Clone)]
pub struct ResourceStore {
    root: PathBuf,
}

/// A file read from the store.
#[derive(Debug, Clone)]
pub struct Resource {
    pub content: Bytes,
    pub last_modified: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("can't access {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl StoreError {
    fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

impl ResourceStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps an unescaped request path to a file below the root.
    ///
    /// Returns `None` when the path contains `..` or any other component that
    /// could point outside of the root.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(request_path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    debug!(path = %request_path, "path leaves the resource root");
                    return None;
                }
            }
        }
        Some(resolved)
    }

    /// Reads a file. Returns `Ok(None)` when there is no regular file at `path`.
    pub async fn read(&self, path: &Path) -> Result<Option<Resource>, StoreError> {
        let metadata = match fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let modified = metadata.modified().map_err(|e| StoreError::io(path, e))?;
        let content = fs::read(path).await.map_err(|e| StoreError::io(path, e))?;

        Ok(Some(Resource { content: Bytes::from(content), last_modified: date::last_modified(modified) }))
    }

    /// Replaces the content of the file at `path`, creating it and its parent
    /// directories when needed.
    pub async fn write(&self, path: &Path, content: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| StoreError::io(parent, e))?;
        }
        fs::write(path, content).await.map_err(|e| StoreError::io(path, e))
    }

    /// Appends `content` to an existing file and returns the new content.
    ///
    /// Returns `Ok(None)` without touching anything when there is no file to
    /// append to.
    pub async fn append(&self, path: &Path, content: &[u8]) -> Result<Option<Bytes>, StoreError> {
        let Some(existing) = self.read(path).await? else {
            return Ok(None);
        };

        let mut combined = BytesMut::with_capacity(existing.content.len() + content.len());
        combined.extend_from_slice(&existing.content);
        combined.extend_from_slice(content);

        self.write(path, &combined).await?;
        Ok(Some(combined.freeze()))
    }
}
