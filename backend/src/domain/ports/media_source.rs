//! Ports for turning job payloads into audio.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::define_port_error;

define_port_error! {
    /// Errors raised by media source adapters.
    pub enum MediaSourceError {
        /// No adapter is configured for this kind of media.
        Unavailable {
            /// Which media kind lacks an adapter.
            message: String,
        } => "media source unavailable: {message}",
        /// The source rejected or failed to produce the media.
        Extraction {
            /// Source error text.
            message: String,
        } => "media extraction failed: {message}",
    }
}

/// Audio produced from a URL, with the metadata the source could recover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAudio {
    /// Title reported by the source.
    pub title: String,
    /// Description reported by the source.
    pub description: String,
    /// Playback length, zero when unknown.
    pub duration: Duration,
    /// MIME type of `contents`.
    pub content_type: String,
    /// Encoded audio bytes.
    pub contents: Vec<u8>,
}

/// Extracts audio from a web page or media URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlTrackGenerator: Send + Sync {
    /// Download and transcode the audio behind `url`.
    async fn generate_track_from_url(&self, url: &Url) -> Result<GeneratedAudio, MediaSourceError>;
}

/// Converts text to spoken audio.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and return MP3 bytes.
    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, MediaSourceError>;
}
