//! Test utilities for the peapod crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled only for tests or with the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{PlaylistId, User, UserId};
use crate::outbound::store::{Store, playlists, users};

/// Clock whose reading only moves when a test advances it.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Instant every [`memory_store`] starts at.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0) {
        chrono::LocalResult::Single(now) => now,
        _ => panic!("fixed timestamp is unambiguous"),
    }
}

/// In-memory store on a frozen clock.
pub fn memory_store() -> Store {
    memory_store_with_clock(Arc::new(MutableClock::new(fixed_now())))
}

/// In-memory store reading time from `clock`.
pub fn memory_store_with_clock(clock: Arc<MutableClock>) -> Store {
    match Store::in_memory(clock) {
        Ok(store) => store,
        Err(error) => panic!("in-memory store: {error}"),
    }
}

/// Directory for a file-backed store that survives reopening.
pub fn store_dir() -> tempfile::TempDir {
    match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(error) => panic!("temporary store directory: {error}"),
    }
}

/// Open (or reopen) the store file inside `dir`.
pub fn open_store(dir: &tempfile::TempDir, clock: Arc<MutableClock>) -> Store {
    match Store::open(dir.path().join("peapod.db"), clock) {
        Ok(store) => store,
        Err(error) => panic!("open store: {error}"),
    }
}

/// Create a user and return its id with the id of its default playlist.
pub fn seed_user(store: &Store, mobile_number: &str) -> (UserId, PlaylistId) {
    let seeded = store.update(|tx| {
        let user = users::create_user(tx, User::new(mobile_number))?;
        let playlist = playlists::find_playlists_by_user_id(tx, user.id())?
            .into_iter()
            .next()
            .map(|playlist| playlist.id())
            .unwrap_or(PlaylistId::UNASSIGNED);
        Ok((user.id(), playlist))
    });
    match seeded {
        Ok(ids) => ids,
        Err(error) => panic!("seed user {mobile_number}: {error}"),
    }
}
