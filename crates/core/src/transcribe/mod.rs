mod fallback;
#[cfg(feature = "http-transcribe")]
mod http;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use fallback::FallbackTranscriber;
#[cfg(feature = "http-transcribe")]
pub use http::HttpTranscriber;

/// Display text shown when every attempt came back unintelligible.
pub const UNINTELLIGIBLE_TEXT: &str = "(Could not understand)";
/// Display text shown when transcription could not run at all.
pub const UNAVAILABLE_TEXT: &str = "(Voice Only)";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub language: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum TranscribeError {
    #[error("speech was unintelligible")]
    Unintelligible,

    #[error("transcription service not configured")]
    NotConfigured,

    #[error("invalid transcription endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("transcription service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid transcription response: {0}")]
    InvalidResponse(String),
}

impl TranscribeError {
    /// Text to display in place of a transcript. Emotion inference never
    /// depends on this.
    pub fn display_text(&self) -> &'static str {
        match self {
            TranscribeError::Unintelligible => UNINTELLIGIBLE_TEXT,
            _ => UNAVAILABLE_TEXT,
        }
    }
}

/// Speech-to-text for one encoded recording. Used for display text only.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, audio: Bytes) -> BoxFuture<'_, Result<Transcript, TranscribeError>>;
}

impl<T: Transcriber + ?Sized> Transcriber for Arc<T> {
    fn transcribe(&self, audio: Bytes) -> BoxFuture<'_, Result<Transcript, TranscribeError>> {
        (**self).transcribe(audio)
    }
}

/// Returns a fixed outcome; for offline runs and tests.
#[derive(Clone, Debug)]
pub struct StaticTranscriber {
    text: Option<String>,
}

impl StaticTranscriber {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// A transcriber that always reports `NotConfigured`.
    pub fn disabled() -> Self {
        Self { text: None }
    }
}

impl Transcriber for StaticTranscriber {
    fn transcribe(&self, _audio: Bytes) -> BoxFuture<'_, Result<Transcript, TranscribeError>> {
        async move {
            match &self.text {
                Some(text) => Ok(Transcript {
                    text: text.clone(),
                    language: None,
                }),
                None => Err(TranscribeError::NotConfigured),
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_transcriber_echoes_text() {
        let t = StaticTranscriber::new("hello there");
        let out = t.transcribe(Bytes::new()).await.unwrap();
        assert_eq!(out.text, "hello there");
    }

    #[tokio::test]
    async fn disabled_transcriber_is_not_configured() {
        let err = StaticTranscriber::disabled()
            .transcribe(Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TranscribeError::NotConfigured));
        assert_eq!(err.display_text(), UNAVAILABLE_TEXT);
    }

    #[tokio::test]
    async fn shared_trait_object_forwards() {
        let t: Arc<dyn Transcriber> = Arc::new(StaticTranscriber::new("shared"));
        assert_eq!(t.transcribe(Bytes::new()).await.unwrap().text, "shared");
    }

    #[test]
    fn unintelligible_has_its_own_display_text() {
        assert_eq!(
            TranscribeError::Unintelligible.display_text(),
            UNINTELLIGIBLE_TEXT
        );
    }
}
