use crate::config::Thresholds;
use crate::decode::{decode_audio, DecodeError, DecodeOptions};
use crate::face::{
    classify_face, extract_facial_observation, FaceClassification, FaceDetection, FaceError,
    FacialObservation,
};
use crate::reaction::{Reaction, TrackLibrary};
use crate::session::MoodSession;
use crate::transcribe::Transcriber;
use crate::voice::{
    classify_voice, extract_acoustic_observation, AcousticObservation, VoiceEmotion, VoiceLabel,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "pipeline";

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Face(#[from] FaceError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("audio analysis task failed: {0}")]
    Worker(String),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FaceAnalysis {
    pub classification: FaceClassification,
    /// Absent when no face was detected.
    pub observation: Option<FacialObservation>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VoiceAnalysis {
    pub emotion: VoiceEmotion,
    pub observation: AcousticObservation,
    pub transcript: String,
    pub duration_secs: f32,
}

/// Runs the collaborators around the inference core for one request at a
/// time. Holds no per-user state; that lives in the `MoodSession` passed in.
pub struct MoodPipeline<T> {
    pub thresholds: Thresholds,
    pub tracks: TrackLibrary,
    pub decode: DecodeOptions,
    pub transcriber: T,
}

impl<T: Transcriber> MoodPipeline<T> {
    pub fn new(
        thresholds: Thresholds,
        tracks: TrackLibrary,
        decode: DecodeOptions,
        transcriber: T,
    ) -> Self {
        Self {
            thresholds,
            tracks,
            decode,
            transcriber,
        }
    }

    pub fn analyze_face(&self, detection: &FaceDetection) -> Result<FaceAnalysis, FaceError> {
        match detection {
            FaceDetection::NoFace => {
                tracing::info!(target: LOG_TARGET, "no face detected");
                Ok(FaceAnalysis {
                    classification: FaceClassification::no_face(),
                    observation: None,
                })
            }
            FaceDetection::Face(landmarks) => {
                let observation = extract_facial_observation(landmarks)?;
                let classification = classify_face(&observation, &self.thresholds.face);
                tracing::info!(target: LOG_TARGET, face = %classification, "face analyzed");
                Ok(FaceAnalysis {
                    classification,
                    observation: Some(observation),
                })
            }
        }
    }

    /// Decodes and classifies the recording while the transcriber runs
    /// alongside. Transcription is best effort: its failure only changes the
    /// display text.
    pub async fn analyze_voice(&self, encoded: Bytes) -> Result<VoiceAnalysis, PipelineError> {
        let decode = self.decode.clone();
        let thresholds = self.thresholds;
        let raw = encoded.clone();
        let acoustic = tokio::task::spawn_blocking(move || {
            let audio = decode_audio(raw, &decode)?;
            let observation =
                extract_acoustic_observation(&audio, &thresholds.noise_gate, &thresholds.frames);
            Ok::<_, DecodeError>((observation, audio.duration()))
        });

        let (acoustic, transcribed) = tokio::join!(acoustic, self.transcriber.transcribe(encoded));
        let (observation, duration) =
            acoustic.map_err(|e| PipelineError::Worker(e.to_string()))??;
        let emotion = classify_voice(&observation, &self.thresholds.voice);

        let transcript = match transcribed {
            Ok(t) => t.text,
            Err(e) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    error = %e,
                    "transcription unavailable; continuing"
                );
                e.display_text().to_owned()
            }
        };

        tracing::info!(
            target: LOG_TARGET,
            emotion = %emotion,
            energy = observation.energy,
            pitch_variability = observation.pitch_variability,
            "voice analyzed"
        );

        Ok(VoiceAnalysis {
            emotion,
            observation,
            transcript,
            duration_secs: duration.as_secs_f32(),
        })
    }

    pub fn record_face(&self, session: &mut MoodSession, analysis: &FaceAnalysis) {
        session.record_face(analysis.classification.clone());
    }

    /// Fuses the voice answer with the session's latest face and builds the
    /// reply payload.
    pub fn respond(&self, session: &mut MoodSession, voice: VoiceAnalysis) -> Reaction {
        let label = VoiceLabel::from(voice.emotion);
        let fusion = session.record_voice(label.clone(), Some(voice.transcript.clone()));
        Reaction::new(voice.transcript, &label, fusion, &self.tracks)
    }
}
