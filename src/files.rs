//! Read-only access to the directory served under `/files/`.
//!
//! Names come straight from the request target, so they are checked before
//! touching the filesystem: only plain relative names made of normal
//! segments are resolved. Everything else reads as not found.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("file not found: {0}")]
    NotFound(String),

    /// The name would escape the root or is not a plain relative path.
    #[error("rejected file name: {0}")]
    Rejected(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a request name onto a path under the root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, FileError> {
        if name.is_empty() || name.contains('\\') || name.contains('\0') {
            return Err(FileError::Rejected(name.to_string()));
        }

        // `Path::components` silently drops `.` and empty segments, so check
        // the raw segments first.
        if name.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return Err(FileError::Rejected(name.to_string()));
        }

        let relative = Path::new(name);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(FileError::Rejected(name.to_string()));
        }

        Ok(self.root.join(relative))
    }

    /// Returns the exact bytes of `name`, or `NotFound` when there is no
    /// regular file by that name.
    pub async fn read(&self, name: &str) -> Result<Bytes, FileError> {
        let path = self.resolve(name)?;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(FileError::NotFound(name.to_string())),
            Err(e) => return Err(Self::classify(name, path, e)),
        }

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) => Err(Self::classify(name, path, e)),
        }
    }

    fn classify(name: &str, path: PathBuf, e: std::io::Error) -> FileError {
        match e.kind() {
            ErrorKind::NotFound | ErrorKind::NotADirectory => {
                FileError::NotFound(name.to_string())
            }
            _ => FileError::Io { path, source: e },
        }
    }
}
