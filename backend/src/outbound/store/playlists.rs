//! Playlist persistence, the feed token index and the owner relation.

use chrono::{DateTime, Utc};

use crate::domain::ports::RepositoryError;
use crate::domain::{Playlist, PlaylistFeed, PlaylistId, User, UserId, generate_token};

use super::bucket::Bucket;
use super::db::Tx;
use super::index::{PLAYLIST_TOKENS, Relation, USER_PLAYLISTS};
use super::record::{self, Record, require_reference, require_text};
use super::tracks;

impl Record for Playlist {
    const BUCKET: Bucket = Bucket::Playlists;
    const ENTITY: &'static str = "playlist";

    fn raw_id(&self) -> u64 {
        self.id().get()
    }

    fn assign_raw_id(&mut self, id: u64) {
        self.assign_id(PlaylistId::new(id));
    }

    fn stamp_created(&mut self, now: DateTime<Utc>) {
        Playlist::stamp_created(self, now);
    }

    fn stamp_updated(&mut self, now: DateTime<Utc>) {
        Playlist::stamp_updated(self, now);
    }

    fn validate(&self, tx: &Tx) -> Result<(), RepositoryError> {
        require_reference::<User>(tx, self.owner_id.get(), "playlist owner")?;
        require_text(self.token(), "playlist token")?;
        require_text(&self.name, "playlist name")
    }
}

/// Create `playlist` with a fresh feed token and link it to its owner.
///
/// # Errors
///
/// [`RepositoryError::ReferenceNotFound`] for an unknown owner,
/// [`RepositoryError::Validation`] for a blank name.
pub fn create_playlist(tx: &Tx, mut playlist: Playlist) -> Result<Playlist, RepositoryError> {
    playlist.assign_token(generate_token());
    PLAYLIST_TOKENS.ensure_vacant(tx, playlist.token())?;
    let id = record::create(tx, &mut playlist)?;
    USER_PLAYLISTS.update(
        tx,
        Relation::NONE,
        Relation::new(playlist.owner_id.get(), id),
    )?;
    PLAYLIST_TOKENS.insert(tx, playlist.token(), id)?;
    Ok(playlist)
}

/// Fetch a playlist by id.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage or decode failure.
pub fn find_playlist_by_id(tx: &Tx, id: PlaylistId) -> Result<Option<Playlist>, RepositoryError> {
    record::find_by_id(tx, id.get())
}

/// Whether a playlist record exists.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure.
pub fn playlist_exists(tx: &Tx, id: PlaylistId) -> Result<bool, RepositoryError> {
    record::exists::<Playlist>(tx, id.get())
}

/// Resolve a feed token through its index.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure.
pub fn find_playlist_id_by_token(
    tx: &Tx,
    token: &str,
) -> Result<Option<PlaylistId>, RepositoryError> {
    Ok(PLAYLIST_TOKENS.lookup(tx, token)?.map(PlaylistId::new))
}

/// Every playlist owned by `user_id`, oldest first.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure or when the
/// relation names a playlist that no longer exists.
pub fn find_playlists_by_user_id(
    tx: &Tx,
    user_id: UserId,
) -> Result<Vec<Playlist>, RepositoryError> {
    USER_PLAYLISTS
        .children(tx, user_id.get())?
        .into_iter()
        .map(|id| {
            find_playlist_by_id(tx, PlaylistId::new(id))?.ok_or_else(|| {
                RepositoryError::substrate(format!(
                    "Users.Playlists references missing playlist {id}"
                ))
            })
        })
        .collect()
}

/// Load a playlist with its tracks.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure.
pub fn load_feed(tx: &Tx, id: PlaylistId) -> Result<Option<PlaylistFeed>, RepositoryError> {
    let Some(playlist) = find_playlist_by_id(tx, id)? else {
        return Ok(None);
    };
    let tracks = tracks::playlist_tracks(tx, id)?;
    Ok(Some(PlaylistFeed { playlist, tracks }))
}
