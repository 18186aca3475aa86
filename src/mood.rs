//! # Mood Data Model
//!
//! Core value types shared by every stage of the pipeline:
//!
//! - [`Mood`] - the enumerated emotion labels plus `Unknown`
//! - [`EmotionScores`] - one classifier sample (emotion → confidence)
//! - [`StableMood`] - the stabilizer's debounced output with its epoch
//! - [`TrackRef`], [`PlaylistId`], [`UserId`] - opaque external identifiers
//!
//! ## Classifier Output
//!
//! Classifiers are black boxes that print JSON. [`EmotionScores::from_json`]
//! accepts the shapes commonly emitted by face-emotion models:
//!
//! ```text
//! {"happy": 91.2, "sad": 0.4, ...}
//! {"emotion": {"happy": 91.2, ...}, "dominant_emotion": "happy"}
//! [{"emotion": {...}}, {"emotion": {...}}]   // one entry per face, first wins
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A mood label.
///
/// Variants are declared in tie-break priority order: when two emotions
/// score exactly the same, the one declared first wins. `Unknown` is last
/// and never appears inside [`EmotionScores`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Surprise,
    Fear,
    Disgust,
    Neutral,
    Unknown,
}

impl Mood {
    /// The seven classifiable emotions, in tie-break priority order.
    pub const EMOTIONS: [Mood; 7] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Angry,
        Mood::Surprise,
        Mood::Fear,
        Mood::Disgust,
        Mood::Neutral,
    ];

    /// Lowercase name used on the wire and in playlist descriptions.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Surprise => "surprise",
            Mood::Fear => "fear",
            Mood::Disgust => "disgust",
            Mood::Neutral => "neutral",
            Mood::Unknown => "unknown",
        }
    }

    /// Name with the first letter upper-cased, as shown in playlist titles.
    #[must_use]
    pub fn capitalized(self) -> String {
        let name = self.name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    #[must_use]
    pub fn is_unknown(self) -> bool {
        self == Mood::Unknown
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized mood: {0}")]
pub struct ParseMoodError(pub String);

impl FromStr for Mood {
    type Err = ParseMoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "sad" => Ok(Mood::Sad),
            "angry" => Ok(Mood::Angry),
            "surprise" => Ok(Mood::Surprise),
            "fear" => Ok(Mood::Fear),
            "disgust" => Ok(Mood::Disgust),
            "neutral" => Ok(Mood::Neutral),
            "unknown" => Ok(Mood::Unknown),
            other => Err(ParseMoodError(other.to_string())),
        }
    }
}

/// Errors raised while decoding classifier output.
#[derive(Debug, Error)]
pub enum ParseScoresError {
    #[error("classifier output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("classifier output has no emotion scores")]
    NoScores,
}

/// Per-frame emotion confidences, keyed by emotion.
///
/// Values are nominally in `[0, 100]`. Invalid values are kept as-is here and
/// filtered by the normalizer, so a sample can be inspected exactly as the
/// classifier produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmotionScores {
    scores: BTreeMap<Mood, f64>,
}

impl EmotionScores {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(emotion, value)` pairs. `Unknown` keys are dropped.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Mood, f64)>,
    {
        let mut scores = Self::new();
        for (mood, value) in pairs {
            scores.insert(mood, value);
        }
        scores
    }

    /// Set the confidence for `mood`. Returns `false` for `Mood::Unknown`,
    /// which is not a classifiable emotion.
    pub fn insert(&mut self, mood: Mood, value: f64) -> bool {
        if mood.is_unknown() {
            return false;
        }
        self.scores.insert(mood, value);
        true
    }

    #[must_use]
    pub fn get(&self, mood: Mood) -> Option<f64> {
        self.scores.get(&mood).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Entries in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (Mood, f64)> + '_ {
        self.scores.iter().map(|(mood, value)| (*mood, *value))
    }

    /// Decode one classifier output line.
    ///
    /// # Errors
    ///
    /// Returns [`ParseScoresError::Json`] for malformed JSON and
    /// [`ParseScoresError::NoScores`] when no score map can be located.
    pub fn from_json(input: &str) -> Result<Self, ParseScoresError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(&value).ok_or(ParseScoresError::NoScores)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.first().and_then(Self::from_value),
            Value::Object(map) => match map.get("emotion") {
                Some(inner @ Value::Object(_)) => Self::from_value(inner),
                _ => Some(Self::from_object(map)),
            },
            _ => None,
        }
    }

    fn from_object(map: &serde_json::Map<String, Value>) -> Self {
        let mut scores = Self::new();
        for (name, raw) in map {
            let Ok(mood) = name.parse::<Mood>() else {
                debug!("Ignoring unrecognized emotion '{name}' in classifier output");
                continue;
            };
            match raw.as_f64() {
                Some(value) => {
                    scores.insert(mood, value);
                }
                None => debug!("Ignoring non-numeric score for '{name}': {raw}"),
            }
        }
        scores
    }
}

/// The stabilizer's current output.
///
/// `epoch` only moves forward, and only when `label` actually changes, so
/// downstream stages can detect a mood change by comparing epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StableMood {
    pub label: Mood,
    pub epoch: u64,
}

impl Default for StableMood {
    fn default() -> Self {
        Self {
            label: Mood::Unknown,
            epoch: 0,
        }
    }
}

/// A playable catalog track, identified by its URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackRef(pub String);

impl TrackRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-assigned playlist identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaylistId(pub String);

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider account that owns created playlists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_round_trips_through_name() {
        for mood in Mood::EMOTIONS {
            assert_eq!(mood.name().parse::<Mood>().unwrap(), mood);
        }
        assert_eq!(" Happy ".parse::<Mood>().unwrap(), Mood::Happy);
        assert!("bored".parse::<Mood>().is_err());
    }

    #[test]
    fn test_capitalized() {
        assert_eq!(Mood::Happy.capitalized(), "Happy");
        assert_eq!(Mood::Surprise.capitalized(), "Surprise");
        assert_eq!(Mood::Unknown.capitalized(), "Unknown");
    }

    #[test]
    fn test_priority_order_matches_declaration() {
        let mut sorted = Mood::EMOTIONS;
        sorted.sort();
        assert_eq!(sorted, Mood::EMOTIONS);
        assert!(Mood::Happy < Mood::Sad);
        assert!(Mood::Disgust < Mood::Neutral);
    }

    #[test]
    fn test_unknown_is_not_a_score_key() {
        let mut scores = EmotionScores::new();
        assert!(!scores.insert(Mood::Unknown, 42.0));
        assert!(scores.is_empty());
    }

    #[test]
    fn test_parse_flat_object() {
        let scores = EmotionScores::from_json(r#"{"happy": 80.5, "sad": 3, "bored": 10}"#).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.get(Mood::Happy), Some(80.5));
        assert_eq!(scores.get(Mood::Sad), Some(3.0));
    }

    #[test]
    fn test_parse_classifier_envelope() {
        let line = r#"{"dominant_emotion": "fear", "emotion": {"fear": 60.0, "neutral": 30.0}}"#;
        let scores = EmotionScores::from_json(line).unwrap();
        assert_eq!(scores.get(Mood::Fear), Some(60.0));
        assert_eq!(scores.get(Mood::Neutral), Some(30.0));
    }

    #[test]
    fn test_parse_face_list_uses_first_entry() {
        let line = r#"[{"emotion": {"angry": 70}}, {"emotion": {"happy": 99}}]"#;
        let scores = EmotionScores::from_json(line).unwrap();
        assert_eq!(scores.get(Mood::Angry), Some(70.0));
        assert_eq!(scores.get(Mood::Happy), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            EmotionScores::from_json("not json"),
            Err(ParseScoresError::Json(_))
        ));
        assert!(matches!(
            EmotionScores::from_json("[]"),
            Err(ParseScoresError::NoScores)
        ));
        assert!(matches!(
            EmotionScores::from_json("12"),
            Err(ParseScoresError::NoScores)
        ));
    }

    #[test]
    fn test_non_numeric_scores_are_skipped() {
        let scores = EmotionScores::from_json(r#"{"happy": "lots", "sad": null}"#).unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn test_stable_mood_default_is_unseeded() {
        let stable = StableMood::default();
        assert_eq!(stable.label, Mood::Unknown);
        assert_eq!(stable.epoch, 0);
    }
}
