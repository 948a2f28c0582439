//! Local-directory [`FileStore`] adapter.
//!
//! Files are named by random hex tokens and written flat into one
//! directory. All access goes through a `cap_std` directory handle so an id
//! can never escape the root.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tokio::task::{self, JoinError};
use tracing::debug;

use crate::domain::ports::{FileStore, FileStoreError};
use crate::domain::{generate_token, is_valid_token};

/// Stores media files under a root directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Use `root` as the storage directory. It is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn open_root(root: &Path, create: bool) -> io::Result<Dir> {
    if create {
        Dir::create_ambient_dir_all(root, ambient_authority())?;
    }
    Dir::open_ambient_dir(root, ambient_authority())
}

fn io_error(error: &io::Error) -> FileStoreError {
    FileStoreError::io(error.to_string())
}

fn join_failed(err: JoinError) -> FileStoreError {
    FileStoreError::io(format!("file task failed: {err}"))
}

fn write_file(root: &Path, id: &str, contents: &[u8]) -> Result<(), FileStoreError> {
    let dir = open_root(root, true).map_err(|err| io_error(&err))?;
    if let Err(err) = dir.write(id, contents) {
        // Never leave a partial file behind.
        if let Err(cleanup) = dir.remove_file(id) {
            debug!(file_id = %id, error = %cleanup, "partial file not removed");
        }
        return Err(io_error(&err));
    }
    Ok(())
}

fn read_file(root: &Path, id: &str) -> Result<Option<Vec<u8>>, FileStoreError> {
    let dir = match open_root(root, false) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_error(&err)),
    };
    match dir.read(id) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_error(&err)),
    }
}

// Disk access runs on the blocking pool so slow filesystems never stall
// runtime workers.
#[async_trait]
impl FileStore for LocalFileStore {
    async fn create_file(&self, contents: Vec<u8>) -> Result<String, FileStoreError> {
        let id = generate_token();
        let root = self.root.clone();
        let file_id = id.clone();
        let size = contents.len();
        task::spawn_blocking(move || write_file(&root, &file_id, &contents))
            .await
            .map_err(join_failed)??;
        debug!(file_id = %id, size, "file stored");
        Ok(id)
    }

    async fn find_file(&self, id: &str) -> Result<Option<Vec<u8>>, FileStoreError> {
        if !is_valid_token(id) {
            return Err(FileStoreError::invalid_id(id));
        }
        let root = self.root.clone();
        let id = id.to_owned();
        task::spawn_blocking(move || read_file(&root, &id))
            .await
            .map_err(join_failed)?
    }
}
