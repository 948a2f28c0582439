//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod file_store;
mod job_executor;
mod job_queue;
mod media_source;
mod playlist_service;
mod repository_error;
mod sms_sender;
mod track_service;
mod user_service;

#[cfg(test)]
pub use file_store::MockFileStore;
pub use file_store::{FileStore, FileStoreError};
#[cfg(test)]
pub use job_executor::MockJobExecutor;
pub use job_executor::{JobExecutionError, JobExecutor};
pub use job_queue::JobQueue;
#[cfg(test)]
pub use job_queue::MockJobQueue;
pub use media_source::{GeneratedAudio, MediaSourceError, SpeechSynthesizer, UrlTrackGenerator};
#[cfg(test)]
pub use media_source::{MockSpeechSynthesizer, MockUrlTrackGenerator};
pub use playlist_service::PlaylistService;
pub use repository_error::RepositoryError;
#[cfg(test)]
pub use sms_sender::MockSmsSender;
pub use sms_sender::{Sms, SmsError, SmsSender};
#[cfg(test)]
pub use track_service::MockTrackService;
pub use track_service::TrackService;
#[cfg(test)]
pub use user_service::MockUserService;
pub use user_service::UserService;
