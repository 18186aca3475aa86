//! Maps a mood to the music-search parameters used for curation.

use crate::mood::Mood;
use serde::Serialize;

/// Search targets for one mood. A pure function of the mood label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoodParameters {
    /// Lower tempo bound in BPM.
    pub min_tempo: u32,
    /// Target energy in `[0, 1]`.
    pub target_energy: f32,
    /// Target valence (musical positiveness) in `[0, 1]`.
    pub target_valence: f32,
    /// Genre tags, most relevant first.
    pub genres: &'static [&'static str],
    /// Mood adjectives appended to the catalog query after the genres.
    pub descriptors: &'static [&'static str],
}

const NEUTRAL: MoodParameters = MoodParameters {
    min_tempo: 90,
    target_energy: 0.5,
    target_valence: 0.5,
    genres: &["ambient", "chill"],
    descriptors: &["calm", "relaxing"],
};

/// Resolve the parameters for `mood`.
///
/// Every emotion has its own entry; `Unknown` falls back to the neutral
/// parameters.
#[must_use]
pub fn resolve(mood: Mood) -> MoodParameters {
    match mood {
        Mood::Happy => MoodParameters {
            min_tempo: 120,
            target_energy: 0.8,
            target_valence: 0.8,
            genres: &["pop", "dance", "happy"],
            descriptors: &["happy", "upbeat", "energetic"],
        },
        Mood::Sad => MoodParameters {
            min_tempo: 60,
            target_energy: 0.3,
            target_valence: 0.2,
            genres: &["acoustic", "sad", "piano"],
            descriptors: &["sad", "melancholic"],
        },
        Mood::Angry => MoodParameters {
            min_tempo: 140,
            target_energy: 0.9,
            target_valence: 0.4,
            genres: &["rock", "metal", "intense"],
            descriptors: &["intense", "aggressive"],
        },
        Mood::Surprise => MoodParameters {
            min_tempo: 110,
            target_energy: 0.7,
            target_valence: 0.7,
            genres: &["electronic", "pop"],
            descriptors: &["exciting", "uplifting"],
        },
        Mood::Fear => MoodParameters {
            min_tempo: 80,
            target_energy: 0.4,
            target_valence: 0.3,
            genres: &["ambient", "atmospheric"],
            descriptors: &["atmospheric", "ambient"],
        },
        Mood::Disgust => MoodParameters {
            min_tempo: 100,
            target_energy: 0.6,
            target_valence: 0.3,
            genres: &["rock", "alternative"],
            descriptors: &["dark", "intense"],
        },
        Mood::Neutral | Mood::Unknown => NEUTRAL,
    }
}
