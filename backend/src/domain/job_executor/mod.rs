//! Turns a claimed job into a published track.
//!
//! Both job types follow the same pipeline: obtain audio, store the bytes,
//! create a track on the target playlist, then text the owner. Every step is
//! safe to repeat; a retried job may leave an orphaned file but never a
//! half-created track.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use url::{Host, Url};

use crate::domain::ports::{
    FileStore, GeneratedAudio, JobExecutionError, JobExecutor, Sms, SmsSender, SpeechSynthesizer,
    TrackService, UrlTrackGenerator, UserService,
};
use crate::domain::{Job, JobType, PlaylistId, Track, User};

/// Body of the text sent when a track has been published.
pub const FINISHED_PROCESSING_MESSAGE: &str =
    "Finished processing. Your track has been added to your playlist.";

/// MIME type of synthesized speech.
pub const TTS_CONTENT_TYPE: &str = "audio/mpeg";

const DERIVED_TITLE_CHARS: usize = 40;

/// Port bundle required by [`MediaJobExecutor`].
pub struct MediaJobExecutorPorts {
    /// Resolves job owners and their playlists.
    pub users: Arc<dyn UserService>,
    /// Persists produced tracks.
    pub tracks: Arc<dyn TrackService>,
    /// Stores audio bytes.
    pub files: Arc<dyn FileStore>,
    /// Notifies owners.
    pub sms: Arc<dyn SmsSender>,
    /// Downloads audio for URL jobs.
    pub url_generator: Arc<dyn UrlTrackGenerator>,
    /// Synthesizes audio for text jobs.
    pub speech: Arc<dyn SpeechSynthesizer>,
}

/// Default [`JobExecutor`] for media jobs.
pub struct MediaJobExecutor {
    users: Arc<dyn UserService>,
    tracks: Arc<dyn TrackService>,
    files: Arc<dyn FileStore>,
    sms: Arc<dyn SmsSender>,
    url_generator: Arc<dyn UrlTrackGenerator>,
    speech: Arc<dyn SpeechSynthesizer>,
}

impl MediaJobExecutor {
    /// Build an executor from its collaborators.
    pub fn new(ports: MediaJobExecutorPorts) -> Self {
        Self {
            users: ports.users,
            tracks: ports.tracks,
            files: ports.files,
            sms: ports.sms,
            url_generator: ports.url_generator,
            speech: ports.speech,
        }
    }

    async fn owner(&self, job: &Job) -> Result<User, JobExecutionError> {
        self.users
            .find_user_by_id(job.owner_id)
            .await
            .map_err(failed)?
            .ok_or_else(|| {
                JobExecutionError::invalid_job(format!("owner not found: id={}", job.owner_id))
            })
    }

    async fn target_playlist(&self, job: &Job) -> Result<PlaylistId, JobExecutionError> {
        if job.playlist_id.is_assigned() {
            return Ok(job.playlist_id);
        }
        self.users
            .user_playlists(job.owner_id)
            .await
            .map_err(failed)?
            .first()
            .map(|playlist| playlist.id())
            .ok_or_else(|| JobExecutionError::invalid_job("owner has no playlist"))
    }

    async fn audio_from_url(&self, job: &Job) -> Result<GeneratedAudio, JobExecutionError> {
        let url = parse_remote_url(&job.url)?;
        debug!(job_id = %job.id(), %url, "fetching audio from url");
        self.url_generator
            .generate_track_from_url(&url)
            .await
            .map_err(failed)
    }

    async fn audio_from_text(&self, job: &Job) -> Result<GeneratedAudio, JobExecutionError> {
        let contents = self
            .speech
            .synthesize_speech(&job.text)
            .await
            .map_err(failed)?;
        let title = if job.title.trim().is_empty() {
            derive_title(&job.text)
        } else {
            job.title.trim().to_owned()
        };
        Ok(GeneratedAudio {
            title,
            description: String::new(),
            duration: Duration::ZERO,
            content_type: TTS_CONTENT_TYPE.to_owned(),
            contents,
        })
    }
}

#[async_trait]
impl JobExecutor for MediaJobExecutor {
    async fn execute(&self, job: &Job) -> Result<(), JobExecutionError> {
        let owner = self.owner(job).await?;
        let playlist_id = self.target_playlist(job).await?;

        let audio = match job.job_type {
            JobType::CreateTrackFromUrl => self.audio_from_url(job).await?,
            JobType::CreateTrackFromTts => self.audio_from_text(job).await?,
        };
        let size = u64::try_from(audio.contents.len()).unwrap_or(u64::MAX);
        let file_id = self
            .files
            .create_file(audio.contents)
            .await
            .map_err(failed)?;

        let mut track = Track::new(playlist_id, file_id);
        track.title = audio.title;
        track.description = audio.description;
        track.duration = audio.duration;
        track.size = size;
        track.content_type = audio.content_type;
        let track = self.tracks.create_track(track).await.map_err(failed)?;
        info!(job_id = %job.id(), track_id = %track.id(), %playlist_id, "track published");

        let message = Sms {
            to: owner.mobile_number,
            body: FINISHED_PROCESSING_MESSAGE.to_owned(),
        };
        self.sms.send_sms(&message).await.map_err(failed)
    }
}

fn failed(err: impl std::fmt::Display) -> JobExecutionError {
    JobExecutionError::failed(err.to_string())
}

/// Parse `raw` and refuse anything that is not an http(s) URL on a remote
/// host.
fn parse_remote_url(raw: &str) -> Result<Url, JobExecutionError> {
    let url = Url::parse(raw.trim()).map_err(|_| JobExecutionError::invalid_job("invalid url"))?;
    if !matches!(url.scheme(), "http" | "https") || is_local(&url) {
        return Err(JobExecutionError::invalid_job("invalid url"));
    }
    Ok(url)
}

/// Whether the URL's host is this machine. Host-less URLs count as local.
fn is_local(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => addr.is_loopback(),
        Some(Host::Ipv6(addr)) => addr.is_loopback(),
        None => true,
    }
}

fn derive_title(text: &str) -> String {
    let text = text.trim();
    let mut title: String = text.chars().take(DERIVED_TITLE_CHARS).collect();
    if title.len() < text.len() {
        title = title.trim_end().to_owned();
        title.push('…');
    }
    title
}
