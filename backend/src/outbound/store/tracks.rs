//! Track persistence and the playlist relation.

use chrono::{DateTime, Utc};

use crate::domain::ports::RepositoryError;
use crate::domain::{Playlist, PlaylistId, Track, TrackId};

use super::bucket::Bucket;
use super::db::Tx;
use super::index::{PLAYLIST_TRACKS, Relation};
use super::record::{self, Record, require_reference, require_text};

impl Record for Track {
    const BUCKET: Bucket = Bucket::Tracks;
    const ENTITY: &'static str = "track";

    fn raw_id(&self) -> u64 {
        self.id().get()
    }

    fn assign_raw_id(&mut self, id: u64) {
        self.assign_id(TrackId::new(id));
    }

    fn stamp_created(&mut self, now: DateTime<Utc>) {
        Track::stamp_created(self, now);
    }

    fn stamp_updated(&mut self, now: DateTime<Utc>) {
        Track::stamp_updated(self, now);
    }

    fn validate(&self, tx: &Tx) -> Result<(), RepositoryError> {
        require_reference::<Playlist>(tx, self.playlist_id.get(), "track playlist")?;
        require_text(&self.file_id, "track file")
    }
}

/// Create `track` and append it to its playlist.
///
/// # Errors
///
/// [`RepositoryError::ReferenceNotFound`] for an unknown playlist,
/// [`RepositoryError::Validation`] for a missing file id.
pub fn create_track(tx: &Tx, mut track: Track) -> Result<Track, RepositoryError> {
    let id = record::create(tx, &mut track)?;
    PLAYLIST_TRACKS.update(
        tx,
        Relation::NONE,
        Relation::new(track.playlist_id.get(), id),
    )?;
    Ok(track)
}

/// Fetch a track by id.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage or decode failure.
pub fn find_track_by_id(tx: &Tx, id: TrackId) -> Result<Option<Track>, RepositoryError> {
    record::find_by_id(tx, id.get())
}

/// Tracks on `playlist_id`, oldest first.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure or when the
/// relation names a track that no longer exists.
pub fn playlist_tracks(tx: &Tx, playlist_id: PlaylistId) -> Result<Vec<Track>, RepositoryError> {
    PLAYLIST_TRACKS
        .children(tx, playlist_id.get())?
        .into_iter()
        .map(|id| {
            find_track_by_id(tx, TrackId::new(id))?.ok_or_else(|| {
                RepositoryError::substrate(format!("Playlists.Tracks references missing track {id}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::*;
    use crate::domain::User;
    use crate::outbound::store::playlists::find_playlists_by_user_id;
    use crate::outbound::store::users::create_user;
    use crate::test_support::memory_store;

    #[rstest]
    fn tracks_follow_their_playlist_in_order() {
        let store = memory_store();
        let (playlist_id, tracks) = store
            .update(|tx| {
                let user = create_user(tx, User::new("5550001"))?;
                let playlist_id = find_playlists_by_user_id(tx, user.id())?[0].id();
                for (file, title) in [("f1", "one"), ("f2", "two")] {
                    let mut track = Track::new(playlist_id, file);
                    track.title = title.to_owned();
                    track.duration = Duration::from_secs(61);
                    create_track(tx, track)?;
                }
                Ok((playlist_id, playlist_tracks(tx, playlist_id)?))
            })
            .expect("create");

        let titles: Vec<&str> = tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two"]);
        assert!(tracks.iter().all(|t| t.playlist_id == playlist_id));
        assert_eq!(tracks[0].duration, Duration::from_secs(61));
    }

    #[rstest]
    fn unknown_playlist_is_rejected() {
        let store = memory_store();
        let err = store
            .update(|tx| create_track(tx, Track::new(PlaylistId::new(8), "f1")))
            .expect_err("no playlist");
        assert_eq!(err, RepositoryError::reference_not_found("playlist", 8_u64));
    }
}
