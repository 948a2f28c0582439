//! Port for user lookups and creation.

use async_trait::async_trait;

use crate::domain::{Playlist, User, UserId};

use super::RepositoryError;

/// Facade over user persistence consumed by inbound adapters and the job
/// executor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user through the mobile number index.
    async fn find_user_by_mobile_number(
        &self,
        mobile_number: &str,
    ) -> Result<Option<User>, RepositoryError>;

    /// Create a user together with its default playlist.
    async fn create_user(&self, mobile_number: &str) -> Result<User, RepositoryError>;

    /// Return the user registered under `mobile_number`, creating it on first
    /// contact.
    async fn find_or_create_user_by_mobile_number(
        &self,
        mobile_number: &str,
    ) -> Result<User, RepositoryError>;

    /// List the user's playlists in creation order.
    async fn user_playlists(&self, id: UserId) -> Result<Vec<Playlist>, RepositoryError>;
}
