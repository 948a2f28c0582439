//! Playlist data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PlaylistId, Track, UserId};

/// Name given to the playlist created alongside every new user.
pub const DEFAULT_PLAYLIST_NAME: &str = "Peapod";

/// A time-ordered list of tracks published as a podcast feed.
///
/// `token` is generated by the store at creation and is the only value the
/// public feed URL exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    id: PlaylistId,
    /// Owning user.
    pub owner_id: UserId,
    token: String,
    /// Display name.
    pub name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Playlist {
    /// Build an unsaved playlist for `owner_id`.
    pub fn new(owner_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: PlaylistId::UNASSIGNED,
            owner_id,
            token: String::new(),
            name: name.into(),
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }

    /// Store-assigned identifier.
    #[must_use]
    pub fn id(&self) -> PlaylistId {
        self.id
    }

    /// Public feed token; empty until the playlist is created.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
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

    pub(crate) fn assign_id(&mut self, id: PlaylistId) {
        self.id = id;
    }

    pub(crate) fn assign_token(&mut self, token: String) {
        self.token = token;
    }

    pub(crate) fn stamp_created(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
    }

    pub(crate) fn stamp_updated(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// A playlist together with its tracks in creation order, as rendered into
/// a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistFeed {
    /// The playlist itself.
    pub playlist: Playlist,
    /// Tracks ordered by ascending id.
    pub tracks: Vec<Track>,
}
