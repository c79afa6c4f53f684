use crate::transcribe::{Transcriber, TranscribeError, Transcript};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;

const LOG_TARGET: &str = "transcribe::fallback";

/// Tries `primary` first and asks `secondary` only when the primary could
/// not make sense of the speech (e.g. a second recognition language).
/// Service failures of the primary are returned as-is.
#[derive(Clone)]
pub struct FallbackTranscriber<P, S>
where
    P: Transcriber + Clone,
    S: Transcriber + Clone,
{
    primary: P,
    secondary: S,
}

impl<P, S> FallbackTranscriber<P, S>
where
    P: Transcriber + Clone,
    S: Transcriber + Clone,
{
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P, S> Transcriber for FallbackTranscriber<P, S>
where
    P: Transcriber + Clone + 'static,
    S: Transcriber + Clone + 'static,
{
    fn transcribe(&self, audio: Bytes) -> BoxFuture<'_, Result<Transcript, TranscribeError>> {
        async move {
            match self.primary.transcribe(audio.clone()).await {
                Err(TranscribeError::Unintelligible) => {
                    tracing::debug!(target: LOG_TARGET, "primary unintelligible, trying secondary");
                    self.secondary.transcribe(audio).await
                }
                other => other,
            }
        }
        .boxed()
    }
}
