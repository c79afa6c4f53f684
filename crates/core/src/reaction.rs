use crate::fusion::FusionResult;
use crate::voice::VoiceLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const DEFAULT_TRACK_DIR: &str = "audio";
const DEFAULT_MOOD_KEY: &str = "neutral";

/// Mood key -> audio track. Keys are lower-case base moods.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackLibrary {
    pub tracks: BTreeMap<String, PathBuf>,
    pub default_track: PathBuf,
}

impl Default for TrackLibrary {
    fn default() -> Self {
        let tracks = ["happy", "sad", "angry", "surprised", "neutral", "calm"]
            .into_iter()
            .map(|mood| {
                (
                    mood.to_owned(),
                    Path::new(DEFAULT_TRACK_DIR).join(format!("{mood}.mp3")),
                )
            })
            .collect();
        Self {
            tracks,
            default_track: Path::new(DEFAULT_TRACK_DIR).join(format!("{DEFAULT_MOOD_KEY}.mp3")),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TrackLibraryError {
    #[error("invalid track library json: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl TrackLibrary {
    pub fn from_json_str(raw: &str) -> Result<Self, TrackLibraryError> {
        let mut lib: TrackLibrary = serde_json::from_str(raw)?;
        lib.tracks = lib
            .tracks
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Ok(lib)
    }

    pub fn select(&self, final_mood: &str) -> &Path {
        self.tracks
            .get(mood_key(final_mood).as_str())
            .map(PathBuf::as_path)
            .unwrap_or(self.default_track.as_path())
    }
}

/// Collapses a fused mood onto the base mood its track is filed under.
pub fn mood_key(final_mood: &str) -> String {
    let lower = final_mood.trim().to_ascii_lowercase();
    match lower.as_str() {
        "hidden sadness" | "sadness" => "sad".to_owned(),
        "frustration" | "anger" => "angry".to_owned(),
        "surprise" => "surprised".to_owned(),
        "excited" => "happy".to_owned(),
        _ => lower,
    }
}

/// Spoken-style reply; the fusion reasoning is appended only when fusion
/// overrode the voice label.
pub fn compose_reply(transcript: &str, voice: &VoiceLabel, fusion: &FusionResult) -> String {
    let mut reply = format!("I heard you say '{transcript}'. You sound {voice}.");
    if fusion.final_mood != voice.as_given {
        reply.push(' ');
        reply.push_str(&fusion.reasoning);
    }
    reply
}

/// Response payload for one voice answer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Reaction {
    pub bot_reply: String,
    pub transcript: String,
    pub final_mood: String,
    pub confidence: f32,
    pub reasoning: String,
    pub track: PathBuf,
}

impl Reaction {
    pub fn new(
        transcript: String,
        voice: &VoiceLabel,
        fusion: FusionResult,
        tracks: &TrackLibrary,
    ) -> Self {
        let bot_reply = compose_reply(&transcript, voice, &fusion);
        let track = tracks.select(&fusion.final_mood).to_path_buf();
        Self {
            bot_reply,
            transcript,
            final_mood: fusion.final_mood,
            confidence: fusion.confidence,
            reasoning: fusion.reasoning,
            track,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::FaceEmotion;
    use crate::fusion::fuse;
    use crate::voice::VoiceEmotion;

    #[test]
    fn compound_moods_map_to_base_tracks() {
        let lib = TrackLibrary::default();
        assert_eq!(lib.select("Hidden Sadness"), Path::new("audio/sad.mp3"));
        assert_eq!(lib.select("Frustration"), Path::new("audio/angry.mp3"));
        assert_eq!(lib.select("Surprise"), Path::new("audio/surprised.mp3"));
        assert_eq!(lib.select("Excited"), Path::new("audio/happy.mp3"));
        assert_eq!(lib.select("Calm"), Path::new("audio/calm.mp3"));
    }

    #[test]
    fn unknown_mood_uses_default_track() {
        let lib = TrackLibrary::default();
        assert_eq!(lib.select("Bewildered"), Path::new("audio/neutral.mp3"));
    }

    #[test]
    fn library_json_keys_are_case_insensitive() {
        let lib = TrackLibrary::from_json_str(
            r#"{"tracks": {"Happy": "songs/joy.mp3"}, "default_track": "songs/any.mp3"}"#,
        )
        .unwrap();
        assert_eq!(lib.select("happy"), Path::new("songs/joy.mp3"));
        assert_eq!(lib.select("Sad"), Path::new("songs/any.mp3"));
    }

    #[test]
    fn reply_mentions_reasoning_only_on_override() {
        let voice = VoiceLabel::from(VoiceEmotion::Sad);
        let agreed = fuse(FaceEmotion::Sad, &voice);
        assert_eq!(
            compose_reply("hello", &voice, &agreed),
            "I heard you say 'hello'. You sound Sad."
        );

        let masked = fuse(FaceEmotion::Happy, &voice);
        let reply = compose_reply("hello", &voice, &masked);
        assert!(reply.starts_with("I heard you say 'hello'. You sound Sad. "));
        assert!(reply.ends_with(&masked.reasoning));
    }

    #[test]
    fn reply_keeps_the_voice_label_spelling() {
        let voice = VoiceLabel::parse("Sadness");
        let fusion = fuse(FaceEmotion::NoFaceDetected, &voice);
        assert_eq!(
            compose_reply("meh", &voice, &fusion),
            "I heard you say 'meh'. You sound Sadness."
        );
    }

    #[test]
    fn reaction_carries_fusion_and_track() {
        let voice = VoiceLabel::from(VoiceEmotion::Angry);
        let fusion = fuse(FaceEmotion::Neutral, &voice);
        let r = Reaction::new("fine.".to_owned(), &voice, fusion, &TrackLibrary::default());
        assert_eq!(r.final_mood, "Frustration");
        assert_eq!(r.confidence, 0.9);
        assert_eq!(r.track, PathBuf::from("audio/angry.mp3"));
    }
}
