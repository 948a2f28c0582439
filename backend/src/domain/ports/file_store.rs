//! Port for storing produced media files.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by file store adapters.
    pub enum FileStoreError {
        /// The identifier is not a valid file name.
        InvalidId {
            /// Rejected identifier.
            id: String,
        } => "invalid file id: {id}",
        /// Reading or writing the backing storage failed.
        Io {
            /// Underlying i/o error text.
            message: String,
        } => "file store i/o failed: {message}",
    }
}

/// Content-addressed-by-token blob storage for media files.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `contents` under a freshly generated identifier and return it.
    async fn create_file(&self, contents: Vec<u8>) -> Result<String, FileStoreError>;

    /// Read a stored file. Missing files are `Ok(None)`.
    async fn find_file(&self, id: &str) -> Result<Option<Vec<u8>>, FileStoreError>;
}
