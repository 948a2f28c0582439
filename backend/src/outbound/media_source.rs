//! Placeholder media sources.
//!
//! Downloading and speech synthesis need external tooling that is wired in
//! per deployment. Until one is configured, [`UnconfiguredMediaSource`]
//! fails every request so the job is recorded as failed rather than lost.

use async_trait::async_trait;
use url::Url;

use crate::domain::ports::{
    GeneratedAudio, MediaSourceError, SpeechSynthesizer, UrlTrackGenerator,
};

/// Media source that rejects every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredMediaSource;

impl UnconfiguredMediaSource {
    /// Create a new source.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UrlTrackGenerator for UnconfiguredMediaSource {
    async fn generate_track_from_url(&self, url: &Url) -> Result<GeneratedAudio, MediaSourceError> {
        tracing::warn!(%url, "UnconfiguredMediaSource: url download requested");
        Err(MediaSourceError::unavailable("no url track generator configured"))
    }
}

#[async_trait]
impl SpeechSynthesizer for UnconfiguredMediaSource {
    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, MediaSourceError> {
        tracing::warn!(chars = text.chars().count(), "UnconfiguredMediaSource: speech requested");
        Err(MediaSourceError::unavailable("no speech synthesizer configured"))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn every_request_is_unavailable() {
        let source = UnconfiguredMediaSource::new();
        let url = Url::parse("https://example.com/a.mp3").expect("url");

        let download = source.generate_track_from_url(&url).await;
        let speech = source.synthesize_speech("hello").await;

        assert!(matches!(download, Err(MediaSourceError::Unavailable { .. })));
        assert!(matches!(speech, Err(MediaSourceError::Unavailable { .. })));
    }
}
