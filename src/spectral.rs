//! Spectral processing: STFT and the model's input tensor
//!
//! Framing follows `tf.signal.stft` defaults, which the model was trained
//! with: periodic Hann window, FFT size equal to the frame length (already a
//! power of two), frames only where a full window fits, no end padding.

use crate::audio::{NormalizedWaveform, SAMPLE_LENGTH};
use crate::error::{DrumError, Result as DrumErrorResult};
use ndarray::{Array2, Array4};
use rustfft::{num_complex::Complex32, FftPlanner};

/// Analysis window length in samples
pub const FRAME_LENGTH: usize = 1 << 10;

/// Hop between consecutive frames
pub const FRAME_STEP: usize = FRAME_LENGTH / 8;

/// Time frames in a spectrogram of a fixed-length waveform
pub const N_FRAMES: usize = (SAMPLE_LENGTH - FRAME_LENGTH) / FRAME_STEP + 1;

/// Non-negative frequency bins per frame
pub const N_BINS: usize = FRAME_LENGTH / 2 + 1;

/// Model input layout: (batch, time, frequency, channel)
pub const SPECTROGRAM_SHAPE: [usize; 4] = [1, N_FRAMES, N_BINS, 1];

/// Compute the STFT of a signal with a periodic Hann window.
///
/// Returns complex bins shaped (n_fft / 2 + 1, n_frames) with
/// `(len - n_fft) / hop_length + 1` frames, or none when the signal is
/// shorter than one window.
pub fn stft(y: &[f32], n_fft: usize, hop_length: usize) -> Array2<Complex32> {
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_fft);

    let n_frames = if y.len() < n_fft {
        0
    } else {
        (y.len() - n_fft) / hop_length + 1
    };
    let mut s = Array2::<Complex32>::zeros((n_fft / 2 + 1, n_frames));

    let window_fn = hann_window(n_fft);
    let mut frame = vec![Complex32::new(0.0, 0.0); n_fft];

    for frame_idx in 0..n_frames {
        let start = frame_idx * hop_length;

        for ((bin, &sample), &win) in frame
            .iter_mut()
            .zip(&y[start..start + n_fft])
            .zip(&window_fn)
        {
            *bin = Complex32::new(sample * win, 0.0);
        }

        fft.process(&mut frame);

        for (i, &val) in frame[..n_fft / 2 + 1].iter().enumerate() {
            s[[i, frame_idx]] = val;
        }
    }

    s
}

/// Periodic Hann window, `0.5 - 0.5 cos(2πn/N)`
pub fn hann_window(size: usize) -> Vec<f32> {
    use std::f32::consts::PI;

    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / size as f32).cos())
        .collect()
}

/// Compute magnitude spectrogram, shape (n_bins, n_frames)
pub fn magnitude_spectrogram(bins: &Array2<Complex32>) -> Array2<f32> {
    bins.map(|c| c.norm())
}

/// Magnitude spectrogram in the layout the classifier consumes.
///
/// Always shaped [`SPECTROGRAM_SHAPE`]; the checked constructor is the only
/// way to wrap an arbitrary array.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    data: Array4<f32>,
}

impl Spectrogram {
    /// Wrap an array, rejecting any shape other than [`SPECTROGRAM_SHAPE`]
    pub fn from_array(data: Array4<f32>) -> DrumErrorResult<Self> {
        if data.shape() != SPECTROGRAM_SHAPE {
            return Err(DrumError::InvalidShape(format!(
                "spectrogram must be {:?}, got {:?}",
                SPECTROGRAM_SHAPE,
                data.shape()
            )));
        }
        Ok(Self { data })
    }

    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    pub fn into_array(self) -> Array4<f32> {
        self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Magnitude at a time frame and frequency bin
    pub fn get(&self, frame: usize, bin: usize) -> Option<f32> {
        self.data.get([0, frame, bin, 0]).copied()
    }

    pub fn max_magnitude(&self) -> f32 {
        self.data.iter().copied().fold(0.0f32, f32::max)
    }

    pub fn mean_magnitude(&self) -> f32 {
        self.data.mean().unwrap_or(0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}

/// Framed magnitude STFT of a normalized waveform, shaped (1, T, F, 1)
pub fn extract_spectrogram(waveform: &NormalizedWaveform) -> Spectrogram {
    let mag = magnitude_spectrogram(&stft(waveform.samples(), FRAME_LENGTH, FRAME_STEP));

    // (bins, frames) -> (batch, frames, bins, channel)
    let data = Array4::from_shape_fn(SPECTROGRAM_SHAPE, |(_, t, f, _)| mag[[f, t]]);

    Spectrogram { data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_shape_constants() {
        assert_eq!(FRAME_STEP, 128);
        assert_eq!(N_FRAMES, 1026);
        assert_eq!(N_BINS, 513);
    }

    #[test]
    fn test_periodic_hann() {
        let w = hann_window(8);
        assert_eq!(w[0], 0.0);
        assert!((w[4] - 1.0).abs() < 1e-6);
        // Periodic window is not symmetric about the last sample
        assert!(w[7] > 0.0);
        assert!((w[1] - w[7]).abs() < 1e-6);
    }

    #[test]
    fn test_stft_frame_count() {
        let y = vec![0.0; 4096];
        assert_eq!(stft(&y, 1024, 128).shape(), &[513, 25]);
        assert_eq!(stft(&y[..100], 1024, 128).shape(), &[513, 0]);
        assert_eq!(stft(&y[..1024], 1024, 128).shape(), &[513, 1]);
    }

    #[test]
    fn test_stft_sine_peak_bin() {
        // Bin-centred sine: bin 64 at 44.1 kHz / 1024
        let sr = 44100;
        let freq = 64.0 * sr as f32 / 1024.0;
        let y: Vec<f32> = (0..2048)
            .map(|i| (2.0 * PI * freq * i as f32 / sr as f32).sin())
            .collect();

        let mag = magnitude_spectrogram(&stft(&y, 1024, 128));
        let column = mag.column(0);
        let peak_bin = column
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, &m)| if m > best.1 { (i, m) } else { best })
            .0;
        assert_eq!(peak_bin, 64);
    }

    #[test]
    fn test_spectrogram_rejects_wrong_shape() {
        let bad = Array4::<f32>::zeros((1, 10, N_BINS, 1));
        assert!(matches!(
            Spectrogram::from_array(bad),
            Err(DrumError::InvalidShape(_))
        ));
        let good = Array4::<f32>::zeros(SPECTROGRAM_SHAPE);
        assert!(Spectrogram::from_array(good).is_ok());
    }
}
