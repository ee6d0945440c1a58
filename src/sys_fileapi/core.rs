//! Core upload-directory logic: no Hyper types here.

use std::fmt::Display;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::sys_fileapi::names;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid file name")]
    InvalidName,
    #[error("file not found")]
    NotFound,
    #[error("file already exists")]
    AlreadyExists,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("write error: {0}")]
    Write(#[source] io::Error),
    #[error("upload stream error: {0}")]
    Stream(String),
}

impl StoreError {
    fn from_open(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound,
            io::ErrorKind::AlreadyExists => StoreError::AlreadyExists,
            _ => StoreError::Io(e),
        }
    }
}

/// One directory entry as seen by a single listing.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub raw_name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: SystemTime,
}

/// The upload directory. Every call goes straight to the filesystem.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// Resolve a name to a path directly inside the root.
    fn path_for(&self, raw_name: &str) -> Result<PathBuf, StoreError> {
        let name = names::base_name(raw_name).ok_or(StoreError::InvalidName)?;
        Ok(self.root.join(name))
    }

    /// List the directory, sorted by name.
    ///
    /// A directory that cannot be read lists as empty.
    pub async fn list(&self) -> Vec<StoredEntry> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) => {
                warn!("cannot read upload dir {}: {}", self.root.display(), e);
                return Vec::new();
            }
        };

        let mut entries = Vec::new();
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("listing {} stopped early: {}", self.root.display(), e);
                    break;
                }
            };
            let raw_name = entry.file_name().to_string_lossy().into_owned();
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    debug!("skipping {raw_name}: {e}");
                    continue;
                }
            };
            entries.push(StoredEntry {
                raw_name,
                is_dir: meta.is_dir(),
                size: meta.len(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }

        entries.sort_by(|a, b| a.raw_name.cmp(&b.raw_name));
        entries
    }

    /// Create `raw_name` (never overwriting) and copy the stream into it.
    ///
    /// Returns the number of bytes written. If the copy fails the partial file
    /// is removed again.
    pub async fn save<S, E>(&self, raw_name: &str, mut stream: S) -> Result<u64, StoreError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Display,
    {
        let path = self.path_for(raw_name)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(StoreError::from_open)?;

        match copy_into(&mut file, &mut stream).await {
            Ok(written) => {
                info!("saved {} ({} bytes)", path.display(), written);
                Ok(written)
            }
            Err(e) => {
                drop(file);
                if let Err(rm) = fs::remove_file(&path).await {
                    warn!("could not remove partial file {}: {}", path.display(), rm);
                }
                Err(e)
            }
        }
    }

    /// Delete a file. Returns whether anything was removed; errors are only logged.
    pub async fn remove(&self, raw_name: &str) -> bool {
        let Ok(path) = self.path_for(raw_name) else {
            return false;
        };
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("removed {}", path.display());
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("remove {}: already gone", path.display());
                false
            }
            Err(e) => {
                warn!("remove {} failed: {}", path.display(), e);
                false
            }
        }
    }

    /// Open a regular file for reading. Directories count as not found.
    pub async fn open(&self, raw_name: &str) -> Result<(fs::File, Metadata), StoreError> {
        let path = self.path_for(raw_name)?;
        let meta = fs::metadata(&path).await.map_err(StoreError::from_open)?;
        if !meta.is_file() {
            return Err(StoreError::NotFound);
        }
        let file = fs::File::open(&path).await.map_err(StoreError::from_open)?;
        Ok((file, meta))
    }
}

async fn copy_into<S, E>(file: &mut fs::File, stream: &mut S) -> Result<u64, StoreError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| StoreError::Stream(e.to_string()))?;
        file.write_all(&chunk).await.map_err(StoreError::Write)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(StoreError::Write)?;
    Ok(written)
}
