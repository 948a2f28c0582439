//! Port describing the durable job queue consumed by the scheduler.

use async_trait::async_trait;

use crate::domain::{Job, JobId};

use super::RepositoryError;

/// Durable FIFO of jobs with status tracking.
///
/// Implementations guarantee that [`JobQueue::next_job`] marks the returned
/// job as processing in the same transaction that selects it, so two callers
/// can never receive the same job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Persist a pending job, append it to the queue and wake the scheduler.
    async fn create_job(&self, job: Job) -> Result<Job, RepositoryError>;

    /// Fetch a job by identifier.
    async fn find_job_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    /// Claim the oldest pending job, if any, and mark it processing.
    async fn next_job(&self) -> Result<Option<Job>, RepositoryError>;

    /// Record the outcome of a processing job. `error` is `None` on success.
    async fn complete_job(&self, id: JobId, error: Option<String>) -> Result<(), RepositoryError>;

    /// Return every queued job to pending. Called once at start-up before the
    /// scheduler runs; returns the number of queued jobs.
    async fn reset_job_queue(&self) -> Result<usize, RepositoryError>;
}
