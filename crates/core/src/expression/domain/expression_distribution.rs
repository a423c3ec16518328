use crate::expression::domain::emotion::Emotion;

/// Per-face scores over the fixed [`Emotion`] set.
///
/// Scores are comparable but need not sum to exactly 1.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ExpressionDistribution {
    scores: [f32; Emotion::COUNT],
}

impl ExpressionDistribution {
    pub fn new(scores: [f32; Emotion::COUNT]) -> Self {
        Self { scores }
    }

    /// Builds a distribution from `(emotion, score)` pairs. Labels not
    /// mentioned score 0; repeated labels accumulate.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Emotion, f32)>) -> Self {
        let mut scores = [0.0; Emotion::COUNT];
        for (emotion, score) in pairs {
            scores[emotion.index()] += score;
        }
        Self { scores }
    }

    pub fn score(&self, emotion: Emotion) -> f32 {
        self.scores[emotion.index()]
    }

    /// `(emotion, score)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        Emotion::ALL.into_iter().zip(self.scores.iter().copied())
    }

    /// The highest-scoring label. On ties the first label in canonical
    /// order wins. NaN scores never win over a number.
    pub fn top(&self) -> TopEmotion {
        let mut best = TopEmotion {
            emotion: Emotion::ALL[0],
            score: self.scores[0],
        };
        for (emotion, score) in self.iter().skip(1) {
            if score > best.score || (best.score.is_nan() && !score.is_nan()) {
                best = TopEmotion { emotion, score };
            }
        }
        best
    }
}

/// The single highest-scoring label/score pair of a distribution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TopEmotion {
    pub emotion: Emotion,
    pub score: f32,
}

impl TopEmotion {
    /// Score as a percentage with two decimals, e.g. `0.8675` → `"86.75"`.
    pub fn confidence_percent(&self) -> String {
        format!("{:.2}", self.score as f64 * 100.0)
    }

    /// Overlay label text, e.g. `neutral (85.00%)`.
    pub fn label_text(&self) -> String {
        format!("{} ({}%)", self.emotion, self.confidence_percent())
    }
}

impl std::fmt::Display for TopEmotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_top_picks_maximum() {
        let dist = ExpressionDistribution::from_pairs([
            (Emotion::Happy, 0.1),
            (Emotion::Sad, 0.05),
            (Emotion::Neutral, 0.85),
        ]);
        let top = dist.top();
        assert_eq!(top.emotion, Emotion::Neutral);
        assert_relative_eq!(top.score, 0.85);
        assert_eq!(top.label_text(), "neutral (85.00%)");
    }

    #[test]
    fn test_top_score_equals_max_value_for_every_position() {
        for winner in Emotion::ALL {
            let dist = ExpressionDistribution::from_pairs(
                Emotion::ALL
                    .into_iter()
                    .map(|e| (e, if e == winner { 0.6 } else { 0.05 })),
            );
            let top = dist.top();
            assert_eq!(top.emotion, winner);
            let max = dist.iter().map(|(_, s)| s).fold(f32::MIN, f32::max);
            assert_eq!(top.score, max);
            assert_eq!(dist.score(top.emotion), top.score);
        }
    }

    #[test]
    fn test_tie_goes_to_first_in_canonical_order() {
        let dist = ExpressionDistribution::from_pairs([
            (Emotion::Surprised, 0.4),
            (Emotion::Sad, 0.4),
            (Emotion::Angry, 0.2),
        ]);
        assert_eq!(dist.top().emotion, Emotion::Sad);
    }

    #[test]
    fn test_all_zero_picks_first_label() {
        let top = ExpressionDistribution::default().top();
        assert_eq!(top.emotion, Emotion::Neutral);
        assert_eq!(top.score, 0.0);
    }

    #[test]
    fn test_nan_does_not_win() {
        let mut scores = [0.1; Emotion::COUNT];
        scores[0] = f32::NAN;
        scores[4] = 0.3;
        let top = ExpressionDistribution::new(scores).top();
        assert_eq!(top.emotion, Emotion::Fearful);
    }

    #[test]
    fn test_from_pairs_accumulates_repeats() {
        let dist =
            ExpressionDistribution::from_pairs([(Emotion::Disgusted, 0.2), (Emotion::Disgusted, 0.1)]);
        assert_relative_eq!(dist.score(Emotion::Disgusted), 0.3);
    }

    #[rstest]
    #[case(0.8675, "86.75")]
    #[case(0.85, "85.00")]
    #[case(1.0, "100.00")]
    #[case(0.0, "0.00")]
    #[case(0.123_44, "12.34")]
    fn test_confidence_percent(#[case] score: f32, #[case] expected: &str) {
        let top = TopEmotion {
            emotion: Emotion::Happy,
            score,
        };
        assert_eq!(top.confidence_percent(), expected);
    }
}
