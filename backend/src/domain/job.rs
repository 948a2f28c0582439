//! Job data model and status state machine.
//!
//! A job moves strictly forward:
//!
//! ```text
//! pending --dequeued--> processing --success--> completed
//!                                  \--failure--> failed
//! ```
//!
//! Crash recovery is the only path back to `pending` and bypasses
//! [`JobStatus::can_transition_to`] entirely.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JobId, PlaylistId, UserId};

/// Kind of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Download audio from a URL and publish it as a track.
    CreateTrackFromUrl,
    /// Synthesize speech from text and publish it as a track.
    CreateTrackFromTts,
}

impl JobType {
    /// Stable identifier used in logs and persisted records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTrackFromUrl => "create_track_from_url",
            Self::CreateTrackFromTts => "create_track_from_tts",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting in the queue.
    #[default]
    Pending,
    /// Handed to an executor.
    Processing,
    /// Finished successfully.
    Completed,
    /// Finished with an error recorded on the job.
    Failed,
}

impl JobStatus {
    /// Stable identifier used in logs and persisted records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the job has reached a final state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `next` is a permitted forward transition from `self`.
    ///
    /// Identical statuses are not transitions; callers treat them as no-ops.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of background work owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    /// User who requested the work.
    pub owner_id: UserId,
    /// Kind of work.
    pub job_type: JobType,
    status: JobStatus,
    /// Playlist receiving the produced track.
    pub playlist_id: PlaylistId,
    /// Source URL for [`JobType::CreateTrackFromUrl`].
    pub url: String,
    /// Source text for [`JobType::CreateTrackFromTts`].
    pub text: String,
    /// Requested track title; empty lets the executor choose one.
    pub title: String,
    error: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Job {
    /// Build an unsaved job that downloads `url` into `playlist_id`.
    pub fn from_url(owner_id: UserId, playlist_id: PlaylistId, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::empty(owner_id, JobType::CreateTrackFromUrl, playlist_id)
        }
    }

    /// Build an unsaved job that reads `text` aloud into `playlist_id`.
    pub fn from_text(owner_id: UserId, playlist_id: PlaylistId, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::empty(owner_id, JobType::CreateTrackFromTts, playlist_id)
        }
    }

    fn empty(owner_id: UserId, job_type: JobType, playlist_id: PlaylistId) -> Self {
        Self {
            id: JobId::UNASSIGNED,
            owner_id,
            job_type,
            status: JobStatus::Pending,
            playlist_id,
            url: String::new(),
            text: String::new(),
            title: String::new(),
            error: String::new(),
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }

    /// Store-assigned identifier.
    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Failure message; empty unless the job is [`JobStatus::Failed`].
    #[must_use]
    pub fn error(&self) -> &str {
        &self.error
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

    pub(crate) fn assign_id(&mut self, id: JobId) {
        self.id = id;
    }

    /// Set status and error together so `error` is only ever populated for
    /// failed jobs.
    pub(crate) fn set_status(&mut self, status: JobStatus, error: Option<String>) {
        self.status = status;
        self.error = match status {
            JobStatus::Failed => error.unwrap_or_default(),
            _ => String::new(),
        };
    }

    pub(crate) fn stamp_created(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
    }

    pub(crate) fn stamp_updated(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(JobStatus::Pending, JobStatus::Processing, true)]
    #[case(JobStatus::Processing, JobStatus::Completed, true)]
    #[case(JobStatus::Processing, JobStatus::Failed, true)]
    #[case(JobStatus::Pending, JobStatus::Completed, false)]
    #[case(JobStatus::Pending, JobStatus::Failed, false)]
    #[case(JobStatus::Processing, JobStatus::Pending, false)]
    #[case(JobStatus::Completed, JobStatus::Failed, false)]
    #[case(JobStatus::Failed, JobStatus::Processing, false)]
    #[case(JobStatus::Completed, JobStatus::Completed, false)]
    fn transitions_only_move_forward(
        #[case] from: JobStatus,
        #[case] to: JobStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    fn error_is_cleared_outside_failed() {
        let mut job = Job::from_url(UserId::new(1), PlaylistId::new(1), "https://example.com/a");
        job.set_status(JobStatus::Failed, Some("boom".to_owned()));
        assert_eq!(job.error(), "boom");

        job.set_status(JobStatus::Pending, Some("ignored".to_owned()));
        assert_eq!(job.status(), JobStatus::Pending);
        assert!(job.error().is_empty());
    }

    #[rstest]
    fn new_jobs_start_pending() {
        let job = Job::from_text(UserId::new(1), PlaylistId::new(2), "hello");
        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(job.job_type, JobType::CreateTrackFromTts);
        assert!(!job.id().is_assigned());
    }

    #[rstest]
    fn status_serialises_as_snake_case() {
        assert_eq!(JobStatus::Processing.to_string(), "processing");
        assert_eq!(JobType::CreateTrackFromUrl.to_string(), "create_track_from_url");
    }
}
