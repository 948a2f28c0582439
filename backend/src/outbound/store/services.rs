//! Domain port implementations over [`Store`].
//!
//! Each method runs exactly one transaction on tokio's blocking pool, so
//! redb's write lock and commit fsync never stall a runtime worker. No
//! transaction outlives the closure it was opened for.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::{self, JoinError};
use tracing::info;

use crate::domain::ports::{
    JobQueue, PlaylistService, RepositoryError, TrackService, UserService,
};
use crate::domain::{
    Job, JobId, JobSignal, JobStatus, Playlist, PlaylistFeed, PlaylistId, Track, TrackId, User,
    UserId,
};

use super::db::{Store, Tx};
use super::{job_queue, jobs, playlists, tracks, users};

fn join_failed(err: JoinError) -> RepositoryError {
    RepositoryError::substrate(format!("store task failed: {err}"))
}

/// Run `op` in a read snapshot on the blocking pool.
async fn view<T, F>(store: &Arc<Store>, op: F) -> Result<T, RepositoryError>
where
    T: Send + 'static,
    F: FnOnce(&Tx) -> Result<T, RepositoryError> + Send + 'static,
{
    let store = Arc::clone(store);
    task::spawn_blocking(move || store.view(op))
        .await
        .map_err(join_failed)?
}

/// Run `op` in a write transaction on the blocking pool.
async fn update<T, F>(store: &Arc<Store>, op: F) -> Result<T, RepositoryError>
where
    T: Send + 'static,
    F: FnOnce(&Tx) -> Result<T, RepositoryError> + Send + 'static,
{
    let store = Arc::clone(store);
    task::spawn_blocking(move || store.update(op))
        .await
        .map_err(join_failed)?
}

/// [`UserService`] backed by the store.
#[derive(Debug, Clone)]
pub struct StoreUserService {
    store: Arc<Store>,
}

impl StoreUserService {
    /// Wrap a shared store.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserService for StoreUserService {
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        view(&self.store, move |tx| users::find_user_by_id(tx, id)).await
    }

    async fn find_user_by_mobile_number(
        &self,
        mobile_number: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let mobile_number = mobile_number.to_owned();
        view(&self.store, move |tx| {
            users::find_user_by_mobile_number(tx, &mobile_number)
        })
        .await
    }

    async fn create_user(&self, mobile_number: &str) -> Result<User, RepositoryError> {
        let user = User::new(mobile_number);
        let user = update(&self.store, move |tx| users::create_user(tx, user)).await?;
        info!(user_id = %user.id(), "user created");
        Ok(user)
    }

    async fn find_or_create_user_by_mobile_number(
        &self,
        mobile_number: &str,
    ) -> Result<User, RepositoryError> {
        let mobile_number = mobile_number.to_owned();
        update(&self.store, move |tx| {
            match users::find_user_by_mobile_number(tx, &mobile_number)? {
                Some(user) => Ok(user),
                None => users::create_user(tx, User::new(mobile_number.as_str())),
            }
        })
        .await
    }

    async fn user_playlists(&self, id: UserId) -> Result<Vec<Playlist>, RepositoryError> {
        view(&self.store, move |tx| playlists::find_playlists_by_user_id(tx, id)).await
    }
}

/// [`PlaylistService`] backed by the store.
#[derive(Debug, Clone)]
pub struct StorePlaylistService {
    store: Arc<Store>,
}

impl StorePlaylistService {
    /// Wrap a shared store.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PlaylistService for StorePlaylistService {
    async fn find_playlist_by_id(
        &self,
        id: PlaylistId,
    ) -> Result<Option<PlaylistFeed>, RepositoryError> {
        view(&self.store, move |tx| playlists::load_feed(tx, id)).await
    }

    async fn find_playlist_by_token(
        &self,
        token: &str,
    ) -> Result<Option<PlaylistFeed>, RepositoryError> {
        let token = token.to_owned();
        view(&self.store, move |tx| {
            match playlists::find_playlist_id_by_token(tx, &token)? {
                Some(id) => playlists::load_feed(tx, id),
                None => Ok(None),
            }
        })
        .await
    }

    async fn find_playlists_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Playlist>, RepositoryError> {
        view(&self.store, move |tx| {
            playlists::find_playlists_by_user_id(tx, user_id)
        })
        .await
    }
}

/// [`TrackService`] backed by the store.
#[derive(Debug, Clone)]
pub struct StoreTrackService {
    store: Arc<Store>,
}

impl StoreTrackService {
    /// Wrap a shared store.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TrackService for StoreTrackService {
    async fn find_track_by_id(&self, id: TrackId) -> Result<Option<Track>, RepositoryError> {
        view(&self.store, move |tx| tracks::find_track_by_id(tx, id)).await
    }

    async fn create_track(&self, track: Track) -> Result<Track, RepositoryError> {
        let track = update(&self.store, move |tx| tracks::create_track(tx, track)).await?;
        info!(track_id = %track.id(), playlist_id = %track.playlist_id, "track created");
        Ok(track)
    }
}

/// [`JobQueue`] backed by the store. Wakes the scheduler after every
/// committed job creation.
///
/// The queue owns a [`JobSignal`], so while a scheduler holds this queue its
/// wake-up channel never closes; the scheduler is stopped through
/// [`crate::domain::JobScheduler::shutdown`].
#[derive(Debug, Clone)]
pub struct StoreJobQueue {
    store: Arc<Store>,
    signal: JobSignal,
}

impl StoreJobQueue {
    /// Wrap a shared store and the scheduler's wake-up signal.
    pub fn new(store: Arc<Store>, signal: JobSignal) -> Self {
        Self { store, signal }
    }
}

#[async_trait]
impl JobQueue for StoreJobQueue {
    async fn create_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let job = update(&self.store, move |tx| jobs::create_job(tx, job)).await?;
        info!(job_id = %job.id(), job_type = %job.job_type, "job queued");
        self.signal.notify();
        Ok(job)
    }

    async fn find_job_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        view(&self.store, move |tx| jobs::find_job_by_id(tx, id)).await
    }

    async fn next_job(&self) -> Result<Option<Job>, RepositoryError> {
        update(&self.store, |tx| {
            let Some(id) = job_queue::dequeue_next(tx)? else {
                return Ok(None);
            };
            jobs::set_job_status(tx, id, JobStatus::Processing, None)?;
            jobs::find_job_by_id(tx, id)
        })
        .await
    }

    async fn complete_job(&self, id: JobId, error: Option<String>) -> Result<(), RepositoryError> {
        let status = if error.is_some() {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        };
        update(&self.store, move |tx| {
            jobs::set_job_status(tx, id, status, error)
        })
        .await?;
        Ok(())
    }

    async fn reset_job_queue(&self) -> Result<usize, RepositoryError> {
        update(&self.store, job_queue::reset_all).await
    }
}
