//! Drum Sample Classifier
//!
//! Turns a one-shot drum sample into the fixed spectrogram a pre-trained
//! model expects and reads the model's verdict: cymbal, kick, perc/tom or
//! snare.
//!
//! The feature pipeline is strictly linear and stateless:
//! load (mono, 44.1 kHz) → fix length → peak normalize → magnitude STFT →
//! classifier → label.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod model;
pub mod spectral;

pub use analysis::{DrumClass, Label, Prediction};
pub use config::Config;
pub use error::{DrumError, Result as DrumErrorResult};
pub use model::Classifier;
pub use spectral::Spectrogram;

use audio::FixedWaveform;
use std::path::Path;
use tracing::{debug, info};

/// Load a sample and bring it to the model's fixed length
pub fn prepare_waveform<P: AsRef<Path>>(path: P) -> DrumErrorResult<FixedWaveform> {
    let waveform = audio::load_waveform(path)?;
    Ok(audio::fix_length(&waveform.samples))
}

/// Features for an in-memory mono 44.1 kHz signal
pub fn process_samples(samples: &[f32]) -> Spectrogram {
    let normalized = audio::peak_normalize(audio::fix_length(samples));
    spectral::extract_spectrogram(&normalized)
}

/// Run the full feature pipeline on a file
pub fn load_and_process<P: AsRef<Path>>(path: P) -> DrumErrorResult<Spectrogram> {
    let normalized = audio::peak_normalize(prepare_waveform(path)?);
    if normalized.is_silent() {
        info!("Sample is silent; classifying an all-zero spectrogram");
    }
    Ok(spectral::extract_spectrogram(&normalized))
}

/// Classification pipeline bound to one classifier instance
pub struct DrumClassifier<C> {
    classifier: C,
}

impl<C: Classifier> DrumClassifier<C> {
    /// Create a new pipeline around a loaded classifier
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn into_inner(self) -> C {
        self.classifier
    }

    /// Classify an audio file
    pub fn classify<P: AsRef<Path>>(&mut self, path: P) -> DrumErrorResult<Label> {
        Ok(self.predict_file(path)?.label)
    }

    /// Classify an audio file and phrase the result for display
    pub fn classify_to_sentence<P: AsRef<Path>>(&mut self, path: P) -> DrumErrorResult<String> {
        Ok(analysis::format_prediction(&self.classify(path)?))
    }

    /// Classify an audio file, keeping the raw scores
    pub fn predict_file<P: AsRef<Path>>(&mut self, path: P) -> DrumErrorResult<Prediction> {
        let path = path.as_ref();
        debug!("Classifying {}", path.display());
        let spectrogram = load_and_process(path)?;
        self.predict_spectrogram(&spectrogram)
    }

    /// Score an already extracted spectrogram
    pub fn predict_spectrogram(&mut self, spectrogram: &Spectrogram) -> DrumErrorResult<Prediction> {
        let scores = self.classifier.predict(spectrogram)?;
        let prediction = Prediction::from_scores(scores);
        debug!("Scores {:?} -> {}", prediction.scores, prediction.label);
        Ok(prediction)
    }
}

impl DrumClassifier<Box<dyn Classifier>> {
    /// Load the configured model and wrap it in a pipeline
    pub fn from_config(config: &Config) -> DrumErrorResult<Self> {
        config::validate_config(config)?;
        Ok(Self::new(model::load_classifier(&config.model)?))
    }
}
