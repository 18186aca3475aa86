//! Turns one classifier sample into a single mood label.
//!
//! The normalizer is total: absent samples, empty maps and maps with no
//! usable value all collapse to [`Mood::Unknown`].

use crate::mood::{EmotionScores, Mood};

/// Select the dominant emotion of a sample.
///
/// Values that are NaN, infinite, zero or negative are ignored. Finite values
/// above 100 are kept and compared like any other: only the relative order
/// of the scores matters, so classifiers on another scale still work.
///
/// On an exact tie the emotion with the higher priority wins:
/// happy > sad > angry > surprise > fear > disgust > neutral.
///
/// # Examples
///
/// ```
/// use mood_dj::mood::{EmotionScores, Mood};
/// use mood_dj::normalizer::normalize;
///
/// let scores = EmotionScores::from_pairs([(Mood::Happy, 50.0), (Mood::Sad, 50.0)]);
/// assert_eq!(normalize(Some(&scores)), Mood::Happy);
/// assert_eq!(normalize(None), Mood::Unknown);
/// ```
#[must_use]
pub fn normalize(sample: Option<&EmotionScores>) -> Mood {
    let Some(scores) = sample else {
        return Mood::Unknown;
    };

    // iter() yields in priority order, so a strict `>` keeps the earlier entry on ties
    scores
        .iter()
        .filter(|(_, value)| value.is_finite() && *value > 0.0)
        .fold(None, |best: Option<(Mood, f64)>, (mood, value)| match best {
            Some((_, best_value)) if best_value >= value => best,
            _ => Some((mood, value)),
        })
        .map_or(Mood::Unknown, |(mood, _)| mood)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(Mood, f64)]) -> EmotionScores {
        EmotionScores::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_unique_maximum_wins() {
        for mood in Mood::EMOTIONS {
            let mut sample = scores(&[
                (Mood::Happy, 10.0),
                (Mood::Sad, 10.0),
                (Mood::Angry, 10.0),
                (Mood::Surprise, 10.0),
                (Mood::Fear, 10.0),
                (Mood::Disgust, 10.0),
                (Mood::Neutral, 10.0),
            ]);
            sample.insert(mood, 55.0);
            assert_eq!(normalize(Some(&sample)), mood, "expected {mood} to dominate");
        }
    }

    #[test]
    fn test_absent_and_empty_are_unknown() {
        assert_eq!(normalize(None), Mood::Unknown);
        assert_eq!(normalize(Some(&EmotionScores::new())), Mood::Unknown);
    }

    #[test]
    fn test_tie_break_prefers_happy_over_sad() {
        let sample = scores(&[(Mood::Sad, 50.0), (Mood::Happy, 50.0)]);
        assert_eq!(normalize(Some(&sample)), Mood::Happy);
    }

    #[test]
    fn test_tie_break_prefers_anything_over_neutral() {
        let sample = scores(&[(Mood::Neutral, 40.0), (Mood::Disgust, 40.0)]);
        assert_eq!(normalize(Some(&sample)), Mood::Disgust);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let all_bad = scores(&[
            (Mood::Happy, f64::NAN),
            (Mood::Sad, -3.0),
            (Mood::Angry, 0.0),
            (Mood::Fear, f64::INFINITY),
        ]);
        assert_eq!(normalize(Some(&all_bad)), Mood::Unknown);

        let one_good = scores(&[(Mood::Happy, f64::NAN), (Mood::Fear, 0.5)]);
        assert_eq!(normalize(Some(&one_good)), Mood::Fear);
    }

    #[test]
    fn test_values_above_hundred_are_ranked() {
        let sample = scores(&[(Mood::Sad, 90.0), (Mood::Angry, 150.0)]);
        assert_eq!(normalize(Some(&sample)), Mood::Angry);

        let sample = scores(&[(Mood::Happy, 250.0), (Mood::Neutral, 250.0)]);
        assert_eq!(normalize(Some(&sample)), Mood::Happy);
    }

    #[test]
    fn test_normalize_classifier_line() {
        let sample = EmotionScores::from_json(
            r#"{"angry": 0.2, "disgust": 0.0, "fear": 1.1, "happy": 2.3,
                "sad": 12.9, "surprise": 0.1, "neutral": 83.4}"#,
        )
        .unwrap();
        assert_eq!(normalize(Some(&sample)), Mood::Neutral);
    }
}
