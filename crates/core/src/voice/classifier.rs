use crate::config::VoiceThresholds;
use crate::voice::{AcousticObservation, VoiceEmotion};

/// Loudness x tonal-variability grid. Total over non-negative inputs.
pub fn classify_voice(obs: &AcousticObservation, t: &VoiceThresholds) -> VoiceEmotion {
    let AcousticObservation {
        energy,
        pitch_variability: zcr,
    } = *obs;

    let emotion = if energy < t.silence_energy {
        // background noise or silence
        VoiceEmotion::Neutral
    } else if energy > t.loud_energy {
        if zcr > t.loud_variability {
            VoiceEmotion::Excited
        } else {
            VoiceEmotion::Angry
        }
    } else if energy > t.quiet_energy {
        if zcr > t.moderate_variability {
            VoiceEmotion::Happy
        } else {
            VoiceEmotion::Neutral
        }
    } else if zcr < t.quiet_variability {
        VoiceEmotion::Sad
    } else {
        VoiceEmotion::Calm
    };

    tracing::debug!(energy, zcr, emotion = %emotion, "voice classified");
    emotion
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(energy: f32, zcr: f32) -> VoiceEmotion {
        classify_voice(
            &AcousticObservation {
                energy,
                pitch_variability: zcr,
            },
            &VoiceThresholds::default(),
        )
    }

    #[test]
    fn silence_is_neutral_regardless_of_variability() {
        assert_eq!(label(0.0, 0.0), VoiceEmotion::Neutral);
        assert_eq!(label(0.0149, 0.5), VoiceEmotion::Neutral);
    }

    #[test]
    fn loud_tier() {
        assert_eq!(label(0.10, 0.02), VoiceEmotion::Angry);
        assert_eq!(label(0.10, 0.051), VoiceEmotion::Excited);
        assert_eq!(label(0.10, 0.05), VoiceEmotion::Angry);
    }

    #[test]
    fn loud_boundary_is_strict() {
        // 0.08 belongs to the moderate tier.
        assert_eq!(label(0.08, 0.07), VoiceEmotion::Happy);
        assert_eq!(label(0.08, 0.055), VoiceEmotion::Neutral);
    }

    #[test]
    fn moderate_tier() {
        assert_eq!(label(0.05, 0.061), VoiceEmotion::Happy);
        assert_eq!(label(0.05, 0.06), VoiceEmotion::Neutral);
    }

    #[test]
    fn quiet_tier() {
        assert_eq!(label(0.015, 0.01), VoiceEmotion::Sad);
        assert_eq!(label(0.02, 0.029), VoiceEmotion::Sad);
        assert_eq!(label(0.02, 0.03), VoiceEmotion::Calm);
        assert_eq!(label(0.018, 0.2), VoiceEmotion::Calm);
    }

    #[test]
    fn total_over_a_grid() {
        let axis = [0.0f32, 0.01, 0.015, 0.02, 0.05, 0.08, 0.1, 1.0, 10.0];
        for &e in &axis {
            for &z in &axis {
                let got = label(e, z);
                assert!(VoiceEmotion::ALL.contains(&got));
                assert_eq!(got, label(e, z));
            }
        }
    }
}
