use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use mood_fusion_core::config::{
    resolve_api_key, resolve_f32_with_default, resolve_optional_string, AppConfig, AudioLimit,
    Env, StdEnv, Thresholds, TranscribeConfig, DEFAULT_FALLBACK_LANGUAGE, DEFAULT_LANGUAGE,
    DEFAULT_MAX_AUDIO_SECS, ENV_MAX_AUDIO_SECS, ENV_THRESHOLDS, ENV_TRACKS, ENV_TRANSCRIBE_API_KEY,
    ENV_TRANSCRIBE_URL,
};
use mood_fusion_core::decode::DecodeOptions;
use mood_fusion_core::face::FaceDetection;
use mood_fusion_core::fusion::fuse_descriptions;
use mood_fusion_core::pipeline::MoodPipeline;
use mood_fusion_core::reaction::TrackLibrary;
use mood_fusion_core::session::MoodSession;
use mood_fusion_core::transcribe::{StaticTranscriber, Transcriber};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mood-fusion")]
#[command(about = "Infer a final mood from a face and a voice recording")]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// JSON file overriding classifier thresholds.
    #[arg(long, global = true)]
    thresholds: Option<String>,

    /// JSON file mapping moods to audio tracks.
    #[arg(long, global = true)]
    tracks: Option<String>,

    #[arg(long, global = true)]
    transcribe_url: Option<String>,

    #[arg(long, global = true)]
    transcribe_api_key: Option<String>,

    #[arg(long, global = true, default_value = DEFAULT_LANGUAGE)]
    language: String,

    #[arg(long, global = true, default_value = DEFAULT_FALLBACK_LANGUAGE)]
    fallback_language: String,

    #[arg(long, global = true, default_value_t = false)]
    no_fallback_language: bool,

    #[arg(long, global = true)]
    max_audio_secs: Option<f32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a face from detector landmarks.
    Face {
        #[arg(long)]
        landmarks: PathBuf,
    },
    /// Classify a voice recording.
    Voice {
        #[arg(long)]
        audio: PathBuf,
    },
    /// Fuse two free-form labels.
    Fuse {
        #[arg(long)]
        face: String,
        #[arg(long)]
        voice: String,
    },
    /// Full round: optional face, then a voice answer, then the reaction.
    Respond {
        #[arg(long)]
        landmarks: Option<PathBuf>,
        #[arg(long)]
        audio: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let command = args.command;
    let cfg = build_config(
        ConfigArgs {
            thresholds: args.thresholds,
            tracks: args.tracks,
            transcribe_url: args.transcribe_url,
            transcribe_api_key: args.transcribe_api_key,
            language: args.language,
            fallback_language: (!args.no_fallback_language).then_some(args.fallback_language),
            max_audio_secs: args.max_audio_secs,
        },
        &env,
    )?;

    tracing::info!(
        max_audio_secs = cfg.audio_limit.max_secs,
        transcription = cfg.transcribe.endpoint.is_some(),
        language = %cfg.transcribe.language,
        "config loaded"
    );

    match command {
        Command::Fuse { face, voice } => print_json(&fuse_descriptions(&face, &voice)),
        Command::Face { landmarks } => {
            let pipeline = build_pipeline(&cfg, None)?;
            let detection = read_landmarks(&landmarks).await?;
            let analysis = pipeline.analyze_face(&detection)?;
            print_json(&FaceOutput {
                emotion: analysis.classification.to_string(),
                analysis: &analysis,
            })
        }
        Command::Voice { audio } => {
            let pipeline = build_pipeline(&cfg, extension_of(&audio))?;
            let encoded = read_audio(&audio).await?;
            let analysis = pipeline.analyze_voice(encoded).await?;
            print_json(&analysis)
        }
        Command::Respond { landmarks, audio } => {
            let pipeline = build_pipeline(&cfg, extension_of(&audio))?;
            let mut session = MoodSession::new();
            if let Some(path) = landmarks {
                let detection = read_landmarks(&path).await?;
                let face = pipeline.analyze_face(&detection)?;
                pipeline.record_face(&mut session, &face);
            }
            let encoded = read_audio(&audio).await?;
            let voice = pipeline.analyze_voice(encoded).await?;
            let reaction = pipeline.respond(&mut session, voice);
            tracing::debug!(session = ?session.snapshot(), "session updated");
            print_json(&reaction)
        }
    }
}

#[derive(Serialize)]
struct FaceOutput<'a> {
    emotion: String,
    analysis: &'a mood_fusion_core::pipeline::FaceAnalysis,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{out}");
    Ok(())
}

async fn read_landmarks(path: &Path) -> anyhow::Result<FaceDetection> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading landmarks from {}", path.display()))?;
    FaceDetection::from_json_str(&raw)
        .with_context(|| format!("parsing landmarks from {}", path.display()))
}

async fn read_audio(path: &Path) -> anyhow::Result<Bytes> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading audio from {}", path.display()))?;
    Ok(Bytes::from(raw))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

struct ConfigArgs {
    thresholds: Option<String>,
    tracks: Option<String>,
    transcribe_url: Option<String>,
    transcribe_api_key: Option<String>,
    language: String,
    fallback_language: Option<String>,
    max_audio_secs: Option<f32>,
}

fn build_config(args: ConfigArgs, env: &impl Env) -> anyhow::Result<AppConfig> {
    let thresholds = match resolve_optional_string(args.thresholds, ENV_THRESHOLDS, env) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading thresholds from {path}"))?;
            Thresholds::from_json_str(&raw)
                .with_context(|| format!("loading thresholds from {path}"))?
        }
        None => Thresholds::default(),
    };

    let max_secs = resolve_f32_with_default(
        args.max_audio_secs,
        ENV_MAX_AUDIO_SECS,
        env,
        DEFAULT_MAX_AUDIO_SECS,
    )?;

    let transcribe = TranscribeConfig {
        endpoint: resolve_optional_string(args.transcribe_url, ENV_TRANSCRIBE_URL, env),
        api_key: resolve_api_key(args.transcribe_api_key, ENV_TRANSCRIBE_API_KEY, env)?,
        language: args.language,
        fallback_language: args.fallback_language,
    };

    Ok(AppConfig {
        thresholds,
        tracks_path: resolve_optional_string(args.tracks, ENV_TRACKS, env).map(PathBuf::from),
        audio_limit: AudioLimit::new(max_secs)?,
        transcribe,
    })
}

fn load_tracks(cfg: &AppConfig) -> anyhow::Result<TrackLibrary> {
    match &cfg.tracks_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading track library from {}", path.display()))?;
            TrackLibrary::from_json_str(&raw)
                .with_context(|| format!("loading track library from {}", path.display()))
        }
        None => Ok(TrackLibrary::default()),
    }
}

fn build_pipeline(
    cfg: &AppConfig,
    extension: Option<String>,
) -> anyhow::Result<MoodPipeline<Arc<dyn Transcriber>>> {
    Ok(MoodPipeline::new(
        cfg.thresholds,
        load_tracks(cfg)?,
        DecodeOptions {
            limit: cfg.audio_limit,
            extension,
            ..DecodeOptions::default()
        },
        build_transcriber(&cfg.transcribe)?,
    ))
}

#[cfg(feature = "http-transcribe")]
fn build_transcriber(cfg: &TranscribeConfig) -> anyhow::Result<Arc<dyn Transcriber>> {
    use mood_fusion_core::transcribe::{FallbackTranscriber, HttpTranscriber};

    let Some(endpoint) = cfg.endpoint.as_deref() else {
        tracing::info!("no transcription endpoint configured; transcripts disabled");
        let disabled: Arc<dyn Transcriber> = Arc::new(StaticTranscriber::disabled());
        return Ok(disabled);
    };

    let primary =
        HttpTranscriber::new(endpoint, &cfg.language)?.with_api_key(cfg.api_key.clone());
    let transcriber: Arc<dyn Transcriber> = match cfg.fallback_language.as_deref() {
        Some(lang) => {
            let secondary =
                HttpTranscriber::new(endpoint, lang)?.with_api_key(cfg.api_key.clone());
            Arc::new(FallbackTranscriber::new(primary, secondary))
        }
        None => Arc::new(primary),
    };
    Ok(transcriber)
}

#[cfg(not(feature = "http-transcribe"))]
fn build_transcriber(cfg: &TranscribeConfig) -> anyhow::Result<Arc<dyn Transcriber>> {
    if cfg.endpoint.is_some() {
        tracing::warn!("built without http-transcribe; ignoring transcription endpoint");
    }
    let disabled: Arc<dyn Transcriber> = Arc::new(StaticTranscriber::disabled());
    Ok(disabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mood_fusion_core::config::MapEnv;

    fn args() -> ConfigArgs {
        ConfigArgs {
            thresholds: None,
            tracks: None,
            transcribe_url: None,
            transcribe_api_key: None,
            language: DEFAULT_LANGUAGE.to_owned(),
            fallback_language: Some(DEFAULT_FALLBACK_LANGUAGE.to_owned()),
            max_audio_secs: None,
        }
    }

    #[test]
    fn defaults_without_env() {
        let cfg = build_config(args(), &MapEnv::default()).unwrap();
        assert_eq!(cfg.thresholds, Thresholds::default());
        assert_eq!(cfg.audio_limit.max_secs, DEFAULT_MAX_AUDIO_SECS);
        assert!(cfg.transcribe.endpoint.is_none());
        assert!(cfg.tracks_path.is_none());
    }

    #[test]
    fn env_fills_in_missing_flags() {
        let env = MapEnv::default()
            .with_var(ENV_TRANSCRIBE_URL, "http://localhost:9000/stt")
            .with_var(ENV_MAX_AUDIO_SECS, "2.5")
            .with_var(ENV_TRACKS, "tracks.json");
        let cfg = build_config(args(), &env).unwrap();
        assert_eq!(
            cfg.transcribe.endpoint.as_deref(),
            Some("http://localhost:9000/stt")
        );
        assert_eq!(cfg.audio_limit.max_secs, 2.5);
        assert_eq!(cfg.tracks_path, Some(PathBuf::from("tracks.json")));
    }

    #[test]
    fn missing_thresholds_file_is_an_error() {
        let env = MapEnv::default().with_var(ENV_THRESHOLDS, "/nonexistent/thresholds.json");
        assert!(build_config(args(), &env).is_err());
    }

    #[test]
    fn non_positive_audio_limit_is_rejected() {
        let mut a = args();
        a.max_audio_secs = Some(0.0);
        assert!(build_config(a, &MapEnv::default()).is_err());
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of(Path::new("answer.WAV")).as_deref(), Some("wav"));
        assert_eq!(extension_of(Path::new("answer")), None);
    }

    #[test]
    fn cli_parses_fuse() {
        let a = Args::try_parse_from(["mood-fusion", "fuse", "--face", "Happy", "--voice", "Sad"])
            .unwrap();
        assert!(matches!(a.command, Command::Fuse { .. }));
    }
}
