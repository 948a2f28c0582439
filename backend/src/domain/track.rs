//! Track data model.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PlaylistId, TrackId};

/// An audio file published on a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    id: TrackId,
    /// Playlist the track belongs to.
    pub playlist_id: PlaylistId,
    /// Opaque reference into the file store.
    pub file_id: String,
    /// Episode title.
    pub title: String,
    /// Optional longer description.
    pub description: String,
    /// Playback length.
    pub duration: Duration,
    /// Stored size in bytes.
    pub size: u64,
    /// MIME type of the stored media.
    pub content_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Track {
    /// Build an unsaved track referencing an already stored file.
    pub fn new(playlist_id: PlaylistId, file_id: impl Into<String>) -> Self {
        Self {
            id: TrackId::UNASSIGNED,
            playlist_id,
            file_id: file_id.into(),
            title: String::new(),
            description: String::new(),
            duration: Duration::ZERO,
            size: 0,
            content_type: String::new(),
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }

    /// Store-assigned identifier.
    #[must_use]
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last write timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn assign_id(&mut self, id: TrackId) {
        self.id = id;
    }

    pub(crate) fn stamp_created(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
    }

    pub(crate) fn stamp_updated(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
