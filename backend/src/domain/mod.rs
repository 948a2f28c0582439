//! Domain primitives, aggregates and background job orchestration.
//!
//! Purpose: define the strongly typed entities persisted by the store, the
//! ports that adapters implement, and the scheduler/executor pair that drains
//! the job queue. Nothing in this module touches storage or the network
//! directly.
//!
//! Public surface:
//! - `User`, `Playlist`, `Track`, `Job` and their typed identifiers.
//! - `JobScheduler` runs queued jobs; `MediaJobExecutor` performs them.
//! - `job_signal` creates the wake-up channel shared by producers and the
//!   scheduler.

pub mod ids;
pub mod job;
pub mod job_executor;
pub mod job_scheduler;
pub mod job_signal;
pub mod playlist;
pub mod ports;
pub mod token;
pub mod track;
pub mod user;

pub use self::ids::{JobId, PlaylistId, TrackId, UserId};
pub use self::job::{Job, JobStatus, JobType};
pub use self::job_executor::{
    FINISHED_PROCESSING_MESSAGE, MediaJobExecutor, MediaJobExecutorPorts, TTS_CONTENT_TYPE,
};
pub use self::job_scheduler::{JobScheduler, JobSchedulerConfig, JobSchedulerPorts};
pub use self::job_signal::{JobSignal, JobWakeups, job_signal};
pub use self::playlist::{DEFAULT_PLAYLIST_NAME, Playlist, PlaylistFeed};
pub use self::token::{TOKEN_BYTES, generate_token, is_valid_token};
pub use self::track::Track;
pub use self::user::User;
