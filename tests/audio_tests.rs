//! Validation tests for waveform conditioning: fixed length and peak normalization

use drumclass::audio::{fix_length, is_silent, peak, peak_normalize, FixedWaveform, SAMPLE_LENGTH};

/// Generate random audio in [-amplitude, amplitude]
fn generate_noise(n_samples: usize, amplitude: f32) -> Vec<f32> {
    (0..n_samples)
        .map(|_| (rand::random::<f32>() - 0.5) * 2.0 * amplitude)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_length_for_all_input_lengths() {
        for &len in &[0, 1, 44100, SAMPLE_LENGTH - 1, SAMPLE_LENGTH, SAMPLE_LENGTH + 1, 220500] {
            let samples = generate_noise(len, 0.5);
            let fixed = fix_length(&samples);
            assert_eq!(fixed.len(), SAMPLE_LENGTH, "input length {}", len);

            let kept = len.min(SAMPLE_LENGTH);
            assert_eq!(&fixed.samples()[..kept], &samples[..kept]);
            assert!(fixed.samples()[kept..].iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_fix_length_empty_is_silence() {
        let fixed = fix_length(&[]);
        assert_eq!(fixed.len(), SAMPLE_LENGTH);
        assert!(is_silent(fixed.samples()));
    }

    #[test]
    fn test_fix_length_is_idempotent() {
        let once = fix_length(&generate_noise(50_000, 0.8));
        let twice = fix_length(once.samples());
        assert_eq!(once, twice);

        let long = fix_length(&generate_noise(200_000, 0.8));
        assert_eq!(fix_length(long.samples()), long);
    }

    #[test]
    fn test_normalized_peak_is_one() {
        for &amplitude in &[1e-4, 0.1, 0.9, 3.0] {
            let normalized = peak_normalize(fix_length(&generate_noise(SAMPLE_LENGTH, amplitude)));
            assert!(
                (peak(normalized.samples()) - 1.0).abs() < 1e-6,
                "amplitude {}",
                amplitude
            );
            assert!(!normalized.is_silent());
        }
    }

    #[test]
    fn test_normalize_single_impulse() {
        let mut samples = vec![0.0; SAMPLE_LENGTH];
        samples[1234] = -0.003;
        let normalized = peak_normalize(FixedWaveform::from_samples(samples).unwrap());
        assert_eq!(normalized.samples()[1234], -1.0);
        assert_eq!(peak(normalized.samples()), 1.0);
    }

    #[test]
    fn test_silence_stays_silence() {
        let normalized = peak_normalize(fix_length(&vec![0.0; SAMPLE_LENGTH]));

        assert!(normalized.is_silent());
        assert_eq!(normalized.source_peak(), 0.0);
        assert_eq!(normalized.len(), SAMPLE_LENGTH);
        assert!(normalized.samples().iter().all(|&x| x == 0.0));
        assert!(normalized.samples().iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_normalize_preserves_shape_of_signal() {
        let samples: Vec<f32> = (0..SAMPLE_LENGTH)
            .map(|i| 0.5 * (i as f32 * 0.01).sin())
            .collect();
        let normalized = peak_normalize(fix_length(&samples));
        let scale = 1.0 / normalized.source_peak();

        for (orig, norm) in samples.iter().zip(normalized.samples()).step_by(997) {
            assert!((orig * scale - norm).abs() < 1e-5);
        }
    }
}
