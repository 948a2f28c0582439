//! User persistence and the mobile number index.

use chrono::{DateTime, Utc};

use crate::domain::ports::RepositoryError;
use crate::domain::{DEFAULT_PLAYLIST_NAME, Playlist, User, UserId};

use super::bucket::Bucket;
use super::db::Tx;
use super::index::MOBILE_NUMBERS;
use super::playlists;
use super::record::{self, Record, require_text};

impl Record for User {
    const BUCKET: Bucket = Bucket::Users;
    const ENTITY: &'static str = "user";

    fn raw_id(&self) -> u64 {
        self.id().get()
    }

    fn assign_raw_id(&mut self, id: u64) {
        self.assign_id(UserId::new(id));
    }

    fn stamp_created(&mut self, now: DateTime<Utc>) {
        User::stamp_created(self, now);
    }

    fn stamp_updated(&mut self, now: DateTime<Utc>) {
        User::stamp_updated(self, now);
    }

    fn validate(&self, _tx: &Tx) -> Result<(), RepositoryError> {
        require_text(&self.mobile_number, "mobile number")
    }
}

/// Create `user`, index its mobile number and give it a default playlist.
///
/// # Errors
///
/// [`RepositoryError::DuplicateValue`] if the number is already registered,
/// [`RepositoryError::Validation`] if it is empty.
pub fn create_user(tx: &Tx, mut user: User) -> Result<User, RepositoryError> {
    MOBILE_NUMBERS.ensure_vacant(tx, &user.mobile_number)?;
    let id = record::create(tx, &mut user)?;
    MOBILE_NUMBERS.insert(tx, &user.mobile_number, id)?;
    playlists::create_playlist(tx, Playlist::new(user.id(), DEFAULT_PLAYLIST_NAME))?;
    Ok(user)
}

/// Fetch a user by id.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage or decode failure.
pub fn find_user_by_id(tx: &Tx, id: UserId) -> Result<Option<User>, RepositoryError> {
    record::find_by_id(tx, id.get())
}

/// Whether a user record exists.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure.
pub fn user_exists(tx: &Tx, id: UserId) -> Result<bool, RepositoryError> {
    record::exists::<User>(tx, id.get())
}

/// Resolve a mobile number through its index.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure.
pub fn find_user_id_by_mobile_number(
    tx: &Tx,
    mobile_number: &str,
) -> Result<Option<UserId>, RepositoryError> {
    Ok(MOBILE_NUMBERS.lookup(tx, mobile_number)?.map(UserId::new))
}

/// Fetch a user by mobile number.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure.
pub fn find_user_by_mobile_number(
    tx: &Tx,
    mobile_number: &str,
) -> Result<Option<User>, RepositoryError> {
    match find_user_id_by_mobile_number(tx, mobile_number)? {
        Some(id) => find_user_by_id(tx, id),
        None => Ok(None),
    }
}
