//! Job persistence and status transitions.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::ports::RepositoryError;
use crate::domain::{Job, JobId, JobStatus, JobType, Playlist, User};

use super::bucket::Bucket;
use super::db::Tx;
use super::job_queue;
use super::record::{self, Record, require_reference, require_text};

impl Record for Job {
    const BUCKET: Bucket = Bucket::Jobs;
    const ENTITY: &'static str = "job";

    fn raw_id(&self) -> u64 {
        self.id().get()
    }

    fn assign_raw_id(&mut self, id: u64) {
        self.assign_id(JobId::new(id));
    }

    fn stamp_created(&mut self, now: DateTime<Utc>) {
        Job::stamp_created(self, now);
    }

    fn stamp_updated(&mut self, now: DateTime<Utc>) {
        Job::stamp_updated(self, now);
    }

    fn validate(&self, tx: &Tx) -> Result<(), RepositoryError> {
        require_reference::<User>(tx, self.owner_id.get(), "job owner")?;
        if self.playlist_id.is_assigned() {
            require_reference::<Playlist>(tx, self.playlist_id.get(), "job playlist")?;
        }
        match self.job_type {
            JobType::CreateTrackFromUrl => require_text(&self.url, "job url"),
            JobType::CreateTrackFromTts => require_text(&self.text, "job text"),
        }
    }
}

/// Persist `job` as pending and append it to the queue.
///
/// An unassigned playlist is allowed; the executor then publishes to the
/// owner's first playlist.
///
/// # Errors
///
/// [`RepositoryError::ReferenceNotFound`] for an unknown owner or playlist,
/// [`RepositoryError::Validation`] for a missing payload.
pub fn create_job(tx: &Tx, mut job: Job) -> Result<Job, RepositoryError> {
    job.set_status(JobStatus::Pending, None);
    let id = record::create(tx, &mut job)?;
    job_queue::enqueue(tx, JobId::new(id))?;
    Ok(job)
}

/// Fetch a job by id.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage or decode failure.
pub fn find_job_by_id(tx: &Tx, id: JobId) -> Result<Option<Job>, RepositoryError> {
    record::find_by_id(tx, id.get())
}

/// Move a job to `status`. Returns `false` when it already had that status.
///
/// Reaching a terminal status removes the job from the queue in the same
/// transaction. `error` is stored only for [`JobStatus::Failed`].
///
/// # Errors
///
/// [`RepositoryError::NotFound`] for an unknown job,
/// [`RepositoryError::InvalidTransition`] for a backwards or skipping move.
pub fn set_job_status(
    tx: &Tx,
    id: JobId,
    status: JobStatus,
    error: Option<String>,
) -> Result<bool, RepositoryError> {
    let mut job = find_job_by_id(tx, id)?
        .ok_or_else(|| RepositoryError::not_found(Job::ENTITY, id.get()))?;
    let current = job.status();
    if current == status {
        return Ok(false);
    }
    if !current.can_transition_to(status) {
        return Err(RepositoryError::invalid_transition(
            current.as_str(),
            status.as_str(),
        ));
    }
    if status.is_terminal() {
        job_queue::remove(tx, id)?;
    }
    job.set_status(status, error);
    record::save(tx, &mut job)?;
    debug!(job_id = %id, from = %current, to = %status, "job status changed");
    Ok(true)
}

/// Force `job` back to pending for crash recovery, whatever its status.
/// Returns `false` when it was already pending.
pub(crate) fn requeue_job(tx: &Tx, job: &mut Job) -> Result<bool, RepositoryError> {
    if job.status() == JobStatus::Pending {
        return Ok(false);
    }
    job.set_status(JobStatus::Pending, None);
    record::save(tx, job)?;
    Ok(true)
}
