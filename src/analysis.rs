//! Prediction interpretation: class labels and result formatting

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of classes the model scores
pub const NUM_CLASSES: usize = 4;

/// Drum sample category, in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrumClass {
    Cymbal,
    Kick,
    PercOrTom,
    Snare,
}

impl DrumClass {
    /// All classes, indexed by model output position
    pub const ALL: [DrumClass; NUM_CLASSES] = [
        DrumClass::Cymbal,
        DrumClass::Kick,
        DrumClass::PercOrTom,
        DrumClass::Snare,
    ];

    /// Class for a model output index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of this class in the model output
    pub fn index(&self) -> usize {
        match self {
            DrumClass::Cymbal => 0,
            DrumClass::Kick => 1,
            DrumClass::PercOrTom => 2,
            DrumClass::Snare => 3,
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            DrumClass::Cymbal => "cymbal",
            DrumClass::Kick => "kick",
            DrumClass::PercOrTom => "perc or tom",
            DrumClass::Snare => "snare",
        }
    }
}

impl fmt::Display for DrumClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of interpreting a model output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Class(DrumClass),
    /// The scores could not be interpreted
    NoPrediction,
}

impl Label {
    pub fn class(&self) -> Option<DrumClass> {
        match self {
            Label::Class(class) => Some(*class),
            Label::NoPrediction => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Class(class) => class.fmt(f),
            Label::NoPrediction => f.write_str("no prediction"),
        }
    }
}

/// Exactly [`NUM_CLASSES`] finite scores, higher meaning more likely
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionVector([f32; NUM_CLASSES]);

impl PredictionVector {
    /// Accept raw model output only if it has the right length and every
    /// score is a finite number.
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        let scores: [f32; NUM_CLASSES] = scores.try_into().ok()?;
        if scores.iter().all(|s| s.is_finite()) {
            Some(Self(scores))
        } else {
            None
        }
    }

    pub fn scores(&self) -> &[f32; NUM_CLASSES] {
        &self.0
    }

    /// Index of the highest score; the lowest index wins a tie
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, &score) in self.0.iter().enumerate().skip(1) {
            if score > self.0[best] {
                best = i;
            }
        }
        best
    }

    pub fn label(&self) -> Label {
        DrumClass::from_index(self.argmax())
            .map(Label::Class)
            .unwrap_or(Label::NoPrediction)
    }
}

/// Map model scores to a label.
///
/// Picks the leftmost maximum (`[0.25; 4]` gives cymbal). Anything that is
/// not four finite scores gives [`Label::NoPrediction`].
pub fn translate_prediction(scores: &[f32]) -> Label {
    match PredictionVector::from_scores(scores) {
        Some(vector) => vector.label(),
        None => Label::NoPrediction,
    }
}

/// Sentence shown to the user for a label
pub fn format_prediction(label: &Label) -> String {
    match label {
        Label::Class(class) => format!("Your sample is most likely a {}!", class),
        Label::NoPrediction => "The model could not make a prediction.".to_string(),
    }
}

/// Label together with the scores it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    pub scores: Vec<f32>,
}

impl Prediction {
    pub fn from_scores(scores: Vec<f32>) -> Self {
        Self {
            label: translate_prediction(&scores),
            scores,
        }
    }

    /// Score of the winning class, if there is one
    pub fn confidence(&self) -> Option<f32> {
        self.label
            .class()
            .and_then(|class| self.scores.get(class.index()).copied())
    }

    pub fn sentence(&self) -> String {
        format_prediction(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for (i, class) in DrumClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
            assert_eq!(DrumClass::from_index(i), Some(*class));
        }
        assert_eq!(DrumClass::from_index(4), None);
    }

    #[test]
    fn test_argmax_prefers_leftmost() {
        let v = PredictionVector::from_scores(&[0.1, 0.4, 0.4, 0.1]).unwrap();
        assert_eq!(v.argmax(), 1);

        let v = PredictionVector::from_scores(&[0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(v.argmax(), 0);
    }

    #[test]
    fn test_non_finite_scores_rejected() {
        assert!(PredictionVector::from_scores(&[0.1, f32::NAN, 0.2, 0.3]).is_none());
        assert!(PredictionVector::from_scores(&[0.1, f32::INFINITY, 0.2, 0.3]).is_none());
        assert_eq!(
            translate_prediction(&[f32::NAN, 0.0, 0.0, 0.0]),
            Label::NoPrediction
        );
    }

    #[test]
    fn test_sentences() {
        assert_eq!(
            format_prediction(&Label::Class(DrumClass::PercOrTom)),
            "Your sample is most likely a perc or tom!"
        );
        assert_eq!(
            format_prediction(&Label::NoPrediction),
            "The model could not make a prediction."
        );
    }

    #[test]
    fn test_prediction_confidence() {
        let p = Prediction::from_scores(vec![0.05, 0.05, 0.1, 0.8]);
        assert_eq!(p.label, Label::Class(DrumClass::Snare));
        assert_eq!(p.confidence(), Some(0.8));

        let p = Prediction::from_scores(vec![1.0]);
        assert_eq!(p.confidence(), None);
    }

    #[test]
    fn test_label_serializes_snake_case() {
        let json = serde_json::to_string(&Label::Class(DrumClass::PercOrTom)).unwrap();
        assert_eq!(json, r#"{"class":"perc_or_tom"}"#);
        let json = serde_json::to_string(&Label::NoPrediction).unwrap();
        assert_eq!(json, r#""no_prediction""#);
    }
}
