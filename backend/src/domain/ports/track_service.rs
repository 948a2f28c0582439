//! Port for track persistence.

use async_trait::async_trait;

use crate::domain::{Track, TrackId};

use super::RepositoryError;

/// Facade over track persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackService: Send + Sync {
    /// Fetch a track by identifier.
    async fn find_track_by_id(&self, id: TrackId) -> Result<Option<Track>, RepositoryError>;

    /// Persist a new track on an existing playlist and return the stored
    /// record.
    async fn create_track(&self, track: Track) -> Result<Track, RepositoryError>;
}
