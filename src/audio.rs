//! Audio I/O and waveform conditioning
//!
//! Loads a sample from disk as a mono 44.1 kHz waveform, then brings it to the
//! fixed length and amplitude range the model was trained on.

use crate::error::{DrumError, Result as DrumErrorResult};
use hound::WavReader;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Sample rate every waveform is converted to before analysis
pub const SAMPLE_RATE: u32 = 44100;

/// Number of samples the model sees (3.0 s at 44.1 kHz)
pub const SAMPLE_LENGTH: usize = 132_300;

/// Mono audio at a known sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Audio samples (mono)
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Get audio duration in seconds (0.0 when the rate is unknown)
    pub fn duration_sec(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Get number of samples
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }
}

/// A waveform of exactly [`SAMPLE_LENGTH`] samples.
///
/// Only [`fix_length`] and the checked [`FixedWaveform::from_samples`] build
/// one, so the length can be relied on downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedWaveform {
    samples: Vec<f32>,
}

impl FixedWaveform {
    /// Wrap samples that are already exactly [`SAMPLE_LENGTH`] long
    pub fn from_samples(samples: Vec<f32>) -> DrumErrorResult<Self> {
        if samples.len() != SAMPLE_LENGTH {
            return Err(DrumError::InvalidShape(format!(
                "expected {} samples, got {}",
                SAMPLE_LENGTH,
                samples.len()
            )));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// A fixed-length waveform scaled so its peak magnitude is 1.0, or all zeros
/// when the source was silent.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWaveform {
    samples: Vec<f32>,
    source_peak: f32,
}

impl NormalizedWaveform {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Peak magnitude of the waveform before scaling
    pub fn source_peak(&self) -> f32 {
        self.source_peak
    }

    /// True when the source had no non-zero sample
    pub fn is_silent(&self) -> bool {
        self.source_peak == 0.0
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Load a sample as a mono waveform at [`SAMPLE_RATE`]
pub fn load_waveform<P: AsRef<Path>>(path: P) -> DrumErrorResult<Waveform> {
    let (samples, sr) = load_audio_file(path)?;
    let samples = resample(&samples, sr, SAMPLE_RATE)?;
    Ok(Waveform::new(samples, SAMPLE_RATE))
}

/// Load audio file and return mono samples with the file's own sample rate
pub fn load_audio_file<P: AsRef<Path>>(path: P) -> DrumErrorResult<(Vec<f32>, u32)> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DrumError::FileRead(format!(
            "Audio file does not exist: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let (samples, sr) = match extension.as_str() {
        "wav" | "wave" => load_wav_file(path)?,
        _ => decode_file(path)?,
    };

    if sr == 0 {
        return Err(DrumError::FileRead(format!(
            "{} reports a sample rate of 0 Hz",
            path.display()
        )));
    }

    if let Some(index) = samples.iter().position(|x| !x.is_finite()) {
        return Err(DrumError::FileRead(format!(
            "{} contains a non-finite sample at index {}",
            path.display(),
            index
        )));
    }

    debug!(
        "Decoded {} ({} samples at {} Hz)",
        path.display(),
        samples.len(),
        sr
    );

    Ok((samples, sr))
}

/// Load WAV file
fn load_wav_file(path: &Path) -> DrumErrorResult<(Vec<f32>, u32)> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels == 0 {
        return Err(DrumError::FileRead("WAV file has no channels".to_string()));
    }

    if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
        return Err(DrumError::FileRead(format!(
            "Unsupported bit depth: {}",
            spec.bits_per_sample
        )));
    }

    let mut samples: Vec<f32> = Vec::with_capacity(reader.len() as usize);

    match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            for sample in reader.samples::<i32>() {
                samples.push(sample? as f32 / max_value);
            }
        }
        hound::SampleFormat::Float => {
            for sample in reader.samples::<f32>() {
                samples.push(sample?);
            }
        }
    }

    Ok((downmix(&samples, spec.channels as usize), spec.sample_rate))
}

/// Decode any container/codec symphonia knows about
fn decode_file(path: &Path) -> DrumErrorResult<(Vec<f32>, u32)> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DrumError::FileRead(format!("Unrecognized audio format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| DrumError::FileRead("No audio track found".to_string()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DrumError::FileRead("Unknown sample rate".to_string()))?;
    // Some codecs only report the layout once a packet is decoded
    let mut channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DrumError::FileRead(format!("Unsupported codec: {}", e)))?;

    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(DrumError::FileRead(format!("Packet read failed: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                warn!("Skipping corrupt packet in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => {
                return Err(DrumError::FileRead(format!("Decode failed: {}", e)));
            }
        };

        let spec = *decoded.spec();
        channels = Some(spec.channels.count());
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(sample_buf.samples());
    }

    Ok((downmix(&interleaved, channels.unwrap_or(1)), sample_rate))
}

/// Average interleaved channels down to mono
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resample mono audio with band-limited sinc interpolation.
///
/// Output length is `round(len * to_sr / from_sr)`, aligned so the filter
/// delay does not shift the signal.
pub fn resample(samples: &[f32], from_sr: u32, to_sr: u32) -> DrumErrorResult<Vec<f32>> {
    if from_sr == to_sr || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    debug!("Resampling {} samples from {} Hz to {} Hz", samples.len(), from_sr, to_sr);

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler =
        SincFixedIn::<f32>::new(to_sr as f64 / from_sr as f64, 1.0, params, samples.len(), 1)
            .map_err(|e| DrumError::FileRead(format!("Resampler setup failed: {}", e)))?;

    let delay = resampler.output_delay();
    let expected =
        ((samples.len() as u64 * to_sr as u64 + from_sr as u64 / 2) / from_sr as u64) as usize;

    let input = vec![samples.to_vec()];
    let mut output = resampler
        .process(&input, None)
        .map_err(|e| DrumError::FileRead(format!("Resampling failed: {}", e)))?
        .into_iter()
        .next()
        .unwrap_or_default();

    // Flush until the delayed tail of the input is out; short inputs need
    // several chunks of silence to push past the filter delay
    while output.len() < delay + expected {
        let tail = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| DrumError::FileRead(format!("Resampling failed: {}", e)))?
            .into_iter()
            .next()
            .unwrap_or_default();
        if tail.is_empty() {
            break;
        }
        output.extend(tail);
    }

    if output.len() < delay + expected {
        warn!(
            "Resampler produced {} of {} samples",
            output.len().saturating_sub(delay),
            expected
        );
    }

    Ok(output.into_iter().skip(delay).take(expected).collect())
}

/// Truncate or zero-pad to exactly [`SAMPLE_LENGTH`] samples
pub fn fix_length(samples: &[f32]) -> FixedWaveform {
    let mut fixed = Vec::with_capacity(SAMPLE_LENGTH);

    if samples.len() >= SAMPLE_LENGTH {
        if samples.len() > SAMPLE_LENGTH {
            debug!(
                "Truncating {} samples to {}",
                samples.len(),
                SAMPLE_LENGTH
            );
        }
        fixed.extend_from_slice(&samples[..SAMPLE_LENGTH]);
    } else {
        debug!(
            "Padding {} samples with {} zeros",
            samples.len(),
            SAMPLE_LENGTH - samples.len()
        );
        fixed.extend_from_slice(samples);
        fixed.resize(SAMPLE_LENGTH, 0.0);
    }

    FixedWaveform { samples: fixed }
}

/// Peak magnitude of a signal (0.0 for empty input)
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max)
}

/// True if every sample is exactly zero
pub fn is_silent(samples: &[f32]) -> bool {
    peak(samples) == 0.0
}

/// Scale so the largest magnitude becomes exactly 1.0.
///
/// Silence has no peak to divide by and is passed through as zeros.
/// NaN and infinite samples are zeroed first, so the output is always finite.
pub fn peak_normalize(waveform: FixedWaveform) -> NormalizedWaveform {
    let mut samples = waveform.samples;

    let non_finite = samples.iter().filter(|x| !x.is_finite()).count();
    if non_finite > 0 {
        warn!("Zeroing {} non-finite samples before normalization", non_finite);
        samples
            .iter_mut()
            .filter(|x| !x.is_finite())
            .for_each(|x| *x = 0.0);
    }

    let source_peak = peak(&samples);

    if source_peak == 0.0 {
        debug!("Silent waveform, skipping peak normalization");
        return NormalizedWaveform {
            samples,
            source_peak,
        };
    }

    let samples = samples
        .into_iter()
        .map(|x| x / source_peak)
        .collect();

    NormalizedWaveform {
        samples,
        source_peak,
    }
}
