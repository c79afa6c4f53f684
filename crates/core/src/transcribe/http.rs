use crate::config::ApiKey;
use crate::transcribe::{Transcriber, TranscribeError, Transcript};
use crate::util::{is_http_retryable, retry_with_backoff, RetryConfig};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

const LOG_TARGET: &str = "transcribe::http";

/// Posts the uploaded recording to a speech-to-text endpoint and expects
/// `{"text": "..."}` back. An empty or missing text means the speech was
/// not understood.
///
/// The body is the upload as received; its `Content-Type` is sniffed from
/// the container header.
#[derive(Clone)]
pub struct HttpTranscriber {
    client: Client,
    endpoint: Url,
    api_key: Option<ApiKey>,
    language: String,
    retry: RetryConfig,
}

impl HttpTranscriber {
    pub fn new(endpoint: &str, language: &str) -> Result<Self, TranscribeError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| TranscribeError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        Ok(Self {
            client: Client::new(),
            endpoint,
            api_key: None,
            language: language.to_owned(),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_api_key(mut self, api_key: Option<ApiKey>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("lang", &self.language);
        url
    }

    async fn send_once(&self, audio: Bytes) -> Result<Transcript, TranscribeError> {
        let mut request = self
            .client
            .post(self.request_url())
            .header("Content-Type", content_type(&audio))
            .body(audio);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key.expose()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TranscribeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(TranscribeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| TranscribeError::InvalidResponse(e.to_string()))?;
        parse_response(parsed, &self.language)
    }
}

/// MIME type of an encoded recording, from its leading magic bytes.
fn content_type(audio: &[u8]) -> &'static str {
    match audio {
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => "audio/wav",
        [b'I', b'D', b'3', ..] => "audio/mpeg",
        [0xFF, second, ..] if second & 0xE0 == 0xE0 => "audio/mpeg",
        [b'f', b'L', b'a', b'C', ..] => "audio/flac",
        [b'O', b'g', b'g', b'S', ..] => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: Option<String>,
}

fn parse_response(
    resp: TranscriptionResponse,
    language: &str,
) -> Result<Transcript, TranscribeError> {
    match resp.text.map(|t| t.trim().to_owned()) {
        Some(text) if !text.is_empty() => Ok(Transcript {
            text,
            language: Some(language.to_owned()),
        }),
        _ => Err(TranscribeError::Unintelligible),
    }
}

fn is_retryable(err: &TranscribeError) -> bool {
    match err {
        TranscribeError::Network(_) => true,
        TranscribeError::Api { status, .. } => is_http_retryable(*status),
        _ => false,
    }
}

impl Transcriber for HttpTranscriber {
    fn transcribe(&self, audio: Bytes) -> BoxFuture<'_, Result<Transcript, TranscribeError>> {
        async move {
            let result =
                retry_with_backoff(&self.retry, || self.send_once(audio.clone()), is_retryable)
                    .await;
            if let Err(e) = &result {
                tracing::warn!(
                    target: LOG_TARGET,
                    language = %self.language,
                    error = %e,
                    "transcription failed"
                );
            }
            result
        }
        .boxed()
    }
}
