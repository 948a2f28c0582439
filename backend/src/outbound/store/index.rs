//! Secondary indexes maintained inside the same transaction as the records
//! they describe.

use crate::domain::ports::RepositoryError;

use super::bucket::Bucket;
use super::codec::{decode_id, encode_id, relation_key, split_relation_key};
use super::db::Tx;

/// Maps a string value to exactly one record id.
#[derive(Debug, Clone, Copy)]
pub struct UniqueIndex {
    bucket: Bucket,
}

/// Mobile number → user id.
pub const MOBILE_NUMBERS: UniqueIndex = UniqueIndex::new(Bucket::UsersMobileNumber);
/// Feed token → playlist id.
pub const PLAYLIST_TOKENS: UniqueIndex = UniqueIndex::new(Bucket::PlaylistsToken);

impl UniqueIndex {
    const fn new(bucket: Bucket) -> Self {
        Self { bucket }
    }

    /// Id mapped to `value`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] on storage failure.
    pub fn lookup(&self, tx: &Tx, value: &str) -> Result<Option<u64>, RepositoryError> {
        tx.get(self.bucket, value.as_bytes())?
            .map(|bytes| decode_id(&bytes))
            .transpose()
    }

    /// Fail if `value` is already mapped.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DuplicateValue`] when taken.
    pub fn ensure_vacant(&self, tx: &Tx, value: &str) -> Result<(), RepositoryError> {
        if tx.contains(self.bucket, value.as_bytes())? {
            return Err(RepositoryError::duplicate_value(self.bucket.name(), value));
        }
        Ok(())
    }

    /// Map `value` to `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DuplicateValue`] when taken.
    pub fn insert(&self, tx: &Tx, value: &str, id: u64) -> Result<(), RepositoryError> {
        self.ensure_vacant(tx, value)?;
        tx.put(self.bucket, value.as_bytes(), &encode_id(id))
    }
}

/// One parent/child edge. Zero on both sides means "no edge".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relation {
    /// Owning record id.
    pub parent: u64,
    /// Owned record id.
    pub child: u64,
}

impl Relation {
    /// Sentinel for an absent edge.
    pub const NONE: Self = Self::new(0, 0);

    /// Build an edge.
    #[must_use]
    pub const fn new(parent: u64, child: u64) -> Self {
        Self { parent, child }
    }

    const fn is_none(self) -> bool {
        self.parent == 0 && self.child == 0
    }
}

/// Ordered one-to-many index keyed by `parent ‖ child`.
#[derive(Debug, Clone, Copy)]
pub struct RelationIndex {
    bucket: Bucket,
}

/// User → playlists.
pub const USER_PLAYLISTS: RelationIndex = RelationIndex::new(Bucket::UsersPlaylists);
/// Playlist → tracks.
pub const PLAYLIST_TRACKS: RelationIndex = RelationIndex::new(Bucket::PlaylistsTracks);

impl RelationIndex {
    const fn new(bucket: Bucket) -> Self {
        Self { bucket }
    }

    /// Replace edge `old` with edge `new`. Equal edges are a no-op; a
    /// [`Relation::NONE`] side is skipped, so creation passes `NONE` as
    /// `old` and deletion passes `NONE` as `new`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] on storage failure.
    pub fn update(&self, tx: &Tx, old: Relation, new: Relation) -> Result<(), RepositoryError> {
        if old == new {
            return Ok(());
        }
        if !old.is_none() {
            tx.delete(self.bucket, &relation_key(old.parent, old.child))?;
        }
        if !new.is_none() {
            tx.put(self.bucket, &relation_key(new.parent, new.child), &[])?;
        }
        Ok(())
    }

    /// Child ids of `parent` in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] on storage failure or a
    /// malformed key.
    pub fn children(&self, tx: &Tx, parent: u64) -> Result<Vec<u64>, RepositoryError> {
        tx.scan_prefix(self.bucket, &encode_id(parent))?
            .into_iter()
            .map(|(key, _)| split_relation_key(&key).map(|(_, child)| child))
            .collect()
    }
}
