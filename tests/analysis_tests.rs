//! Validation tests for turning model scores into labels

use drumclass::analysis::{
    format_prediction, translate_prediction, DrumClass, Label, Prediction, PredictionVector,
    NUM_CLASSES,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_winner() {
        assert_eq!(
            translate_prediction(&[0.1, 0.7, 0.1, 0.1]),
            Label::Class(DrumClass::Kick)
        );
        assert_eq!(
            translate_prediction(&[0.9, 0.05, 0.03, 0.02]),
            Label::Class(DrumClass::Cymbal)
        );
        assert_eq!(
            translate_prediction(&[0.0, 0.1, 0.8, 0.1]),
            Label::Class(DrumClass::PercOrTom)
        );
        assert_eq!(
            translate_prediction(&[0.2, 0.2, 0.2, 0.4]),
            Label::Class(DrumClass::Snare)
        );
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        assert_eq!(
            translate_prediction(&[0.25, 0.25, 0.25, 0.25]),
            Label::Class(DrumClass::Cymbal)
        );
        assert_eq!(
            translate_prediction(&[0.1, 0.1, 0.4, 0.4]),
            Label::Class(DrumClass::PercOrTom)
        );
    }

    #[test]
    fn test_invalid_length_is_no_prediction() {
        assert_eq!(translate_prediction(&[]), Label::NoPrediction);
        assert_eq!(translate_prediction(&[0.5, 0.5, 0.0]), Label::NoPrediction);
        assert_eq!(
            translate_prediction(&[0.1, 0.2, 0.3, 0.2, 0.2]),
            Label::NoPrediction
        );
    }

    #[test]
    fn test_raw_logits_still_rank() {
        // Unnormalized scores compare by magnitude like probabilities
        assert_eq!(
            translate_prediction(&[-2.0, -0.5, -3.0, -1.0]),
            Label::Class(DrumClass::Kick)
        );
    }

    #[test]
    fn test_prediction_vector_accessors() {
        let v = PredictionVector::from_scores(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(v.scores().len(), NUM_CLASSES);
        assert_eq!(v.argmax(), 3);
        assert_eq!(v.label(), Label::Class(DrumClass::Snare));
    }

    #[test]
    fn test_sentences_distinguish_no_prediction() {
        let kick = Prediction::from_scores(vec![0.1, 0.7, 0.1, 0.1]);
        assert_eq!(kick.sentence(), "Your sample is most likely a kick!");

        let broken = Prediction::from_scores(vec![0.7, 0.3]);
        assert_eq!(broken.label, Label::NoPrediction);
        assert_eq!(broken.sentence(), "The model could not make a prediction.");
        assert_ne!(broken.sentence(), format_prediction(&Label::Class(DrumClass::Cymbal)));
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::Class(DrumClass::PercOrTom).to_string(), "perc or tom");
        assert_eq!(Label::NoPrediction.to_string(), "no prediction");
        assert_eq!(Label::NoPrediction.class(), None);
    }
}
