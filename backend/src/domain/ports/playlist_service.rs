//! Port for playlist reads used by feed rendering.

use async_trait::async_trait;

use crate::domain::{Playlist, PlaylistFeed, PlaylistId, UserId};

use super::RepositoryError;

/// Read-side facade over playlists and their tracks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaylistService: Send + Sync {
    /// Fetch a playlist and its tracks by identifier.
    async fn find_playlist_by_id(
        &self,
        id: PlaylistId,
    ) -> Result<Option<PlaylistFeed>, RepositoryError>;

    /// Fetch a playlist and its tracks by public feed token.
    async fn find_playlist_by_token(
        &self,
        token: &str,
    ) -> Result<Option<PlaylistFeed>, RepositoryError>;

    /// List every playlist owned by `user_id`.
    async fn find_playlists_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Playlist>, RepositoryError>;
}
