//! Durable FIFO of job ids.
//!
//! Queue entries are keyed by their own sequence, independent of job ids, so
//! insertion order survives even when ids are handed out in a different
//! order. A job stays queued while it is processing and leaves only when it
//! reaches a terminal status; that is what lets [`reset_all`] find work a
//! crashed process left half done.

use tracing::{info, warn};

use crate::domain::ports::RepositoryError;
use crate::domain::{JobId, JobStatus};

use super::bucket::Bucket;
use super::codec::{decode_id, encode_id};
use super::db::Tx;
use super::jobs;

/// Append `job_id` at the tail.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure.
pub fn enqueue(tx: &Tx, job_id: JobId) -> Result<(), RepositoryError> {
    let slot = tx.next_sequence(Bucket::JobQueue)?;
    tx.put(Bucket::JobQueue, &encode_id(slot), &encode_id(job_id.get()))
}

/// Every queued job id, head first.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure.
pub fn queued(tx: &Tx) -> Result<Vec<JobId>, RepositoryError> {
    tx.scan_prefix(Bucket::JobQueue, &[])?
        .into_iter()
        .map(|(_, value)| decode_id(&value).map(JobId::new))
        .collect()
}

/// First queued job that is still pending. Entries for processing jobs are
/// skipped but kept.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure.
pub fn dequeue_next(tx: &Tx) -> Result<Option<JobId>, RepositoryError> {
    for id in queued(tx)? {
        match jobs::find_job_by_id(tx, id)? {
            Some(job) if job.status() == JobStatus::Pending => return Ok(Some(id)),
            Some(_) => {}
            None => warn!(job_id = %id, "queued job has no record; skipping"),
        }
    }
    Ok(None)
}

/// Delete every entry referencing `job_id`. Returns how many were removed.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure.
pub fn remove(tx: &Tx, job_id: JobId) -> Result<usize, RepositoryError> {
    let mut removed = 0;
    for (key, value) in tx.scan_prefix(Bucket::JobQueue, &[])? {
        if decode_id(&value)? == job_id.get() && tx.delete(Bucket::JobQueue, &key)? {
            removed += 1;
        }
    }
    Ok(removed)
}

/// Return every queued job to pending. Run once at start-up, before the
/// scheduler, so jobs a previous process left processing run again.
///
/// Returns the number of queued jobs found.
///
/// # Errors
///
/// Returns [`RepositoryError::Substrate`] on storage failure.
pub fn reset_all(tx: &Tx) -> Result<usize, RepositoryError> {
    let mut found = 0;
    let mut reset = 0;
    for id in queued(tx)? {
        let Some(mut job) = jobs::find_job_by_id(tx, id)? else {
            warn!(job_id = %id, "queued job has no record; leaving entry");
            continue;
        };
        found += 1;
        if jobs::requeue_job(tx, &mut job)? {
            reset += 1;
        }
    }
    info!(queued = found, reset, "job queue reset");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::Job;
    use crate::outbound::store::jobs::{create_job, set_job_status};
    use crate::test_support::{memory_store, seed_user};

    #[rstest]
    fn dequeue_skips_processing_entries_without_removing_them() {
        let store = memory_store();
        let (user_id, playlist_id) = seed_user(&store, "5550001");
        let (first, second) = store
            .update(|tx| {
                let first = create_job(tx, Job::from_text(user_id, playlist_id, "one"))?;
                let second = create_job(tx, Job::from_text(user_id, playlist_id, "two"))?;
                Ok((first.id(), second.id()))
            })
            .expect("create");

        let (head, next, queue) = store
            .update(|tx| {
                let head = dequeue_next(tx)?;
                set_job_status(tx, first, JobStatus::Processing, None)?;
                Ok((head, dequeue_next(tx)?, queued(tx)?))
            })
            .expect("dequeue");
        assert_eq!(head, Some(first));
        assert_eq!(next, Some(second));
        assert_eq!(queue, vec![first, second]);
    }

    #[rstest]
    fn fifo_follows_enqueue_order_not_job_ids() {
        let store = memory_store();
        let order = store
            .update(|tx| {
                enqueue(tx, JobId::new(7))?;
                enqueue(tx, JobId::new(3))?;
                enqueue(tx, JobId::new(5))?;
                queued(tx)
            })
            .expect("enqueue");
        assert_eq!(order, vec![JobId::new(7), JobId::new(3), JobId::new(5)]);
    }

    #[rstest]
    fn remove_deletes_duplicate_entries() {
        let store = memory_store();
        let (removed, left) = store
            .update(|tx| {
                enqueue(tx, JobId::new(1))?;
                enqueue(tx, JobId::new(2))?;
                enqueue(tx, JobId::new(1))?;
                Ok((remove(tx, JobId::new(1))?, queued(tx)?))
            })
            .expect("remove");
        assert_eq!(removed, 2);
        assert_eq!(left, vec![JobId::new(2)]);
    }

    #[rstest]
    fn empty_queue_yields_nothing() {
        let store = memory_store();
        assert_eq!(store.view(dequeue_next).expect("dequeue"), None);
        assert_eq!(store.update(reset_all).expect("reset"), 0);
    }

    #[rstest]
    fn dangling_entries_are_skipped() {
        let store = memory_store();
        let head = store
            .update(|tx| {
                enqueue(tx, JobId::new(99))?;
                dequeue_next(tx)
            })
            .expect("dequeue");
        assert_eq!(head, None);
    }
}
