//! Spectral features for checking that generated classes are separable.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::{dataset::Dataset, trial::Trial, utils::variance, Float};

/// Hann-windowed FFT power spectrum
pub struct SpectralAnalyzer {
    fft_size: usize,
    sampling_rate: Float,
    fft: Arc<dyn Fft<Float>>,
    window: Vec<Float>,
    buffer: Vec<Complex<Float>>,
    scratch: Vec<Complex<Float>>,
}

impl SpectralAnalyzer {
    /// Create a new spectral analyzer
    ///
    /// # Arguments
    ///
    /// * `fft_size` - FFT length in samples (any size, powers of two are fastest)
    /// * `sampling_rate` - Sample rate in Hz
    pub fn new(fft_size: usize, sampling_rate: Float) -> Self {
        let fft_size = fft_size.max(1);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            fft_size,
            sampling_rate,
            fft,
            window: hann_window(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch,
        }
    }

    /// Frequency resolution (Hz per bin)
    pub fn frequency_resolution(&self) -> Float {
        self.sampling_rate / self.fft_size as Float
    }

    /// Power (magnitude squared) of the non-negative frequency bins.
    ///
    /// Input longer than the FFT is truncated, shorter input is zero-padded.
    pub fn compute_psd(&mut self, samples: &[Float]) -> Vec<Float> {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let s = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(s * self.window[i], 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let n_freqs = self.fft_size / 2 + 1;
        let norm = 1.0 / (self.fft_size as Float).powi(2);

        self.buffer[..n_freqs]
            .iter()
            .map(|c| (c.re * c.re + c.im * c.im) * norm)
            .collect()
    }

    /// Summed power of the bins covering [low_hz, high_hz]
    pub fn band_power(&self, psd: &[Float], low_hz: Float, high_hz: Float) -> Float {
        if psd.is_empty() {
            return 0.0;
        }
        let freq_res = self.frequency_resolution();
        let start_bin = (low_hz / freq_res).floor().max(0.0) as usize;
        let end_bin = ((high_hz / freq_res).ceil() as usize).min(psd.len() - 1);
        if start_bin > end_bin {
            return 0.0;
        }

        psd[start_bin..=end_bin].iter().sum()
    }
}

fn hann_window(size: usize) -> Vec<Float> {
    if size == 1 {
        return vec![1.0];
    }
    let denom = (size - 1) as Float;
    (0..size)
        .map(|i| 0.5 - 0.5 * (std::f32::consts::TAU * i as Float / denom).cos())
        .collect()
}

/// Per-channel variance of a trial, a crude broadband power feature.
pub fn channel_variances(trial: &Trial) -> Vec<Float> {
    trial.iter_channels().map(variance).collect()
}

/// Mean band power on `channel` over every trial of `class`.
///
/// `None` when the class has no trials or the channel does not exist.
pub fn mean_band_power(
    dataset: &Dataset,
    class: usize,
    channel: usize,
    low_hz: Float,
    high_hz: Float,
) -> Option<Float> {
    let (_, channels, samples) = dataset.shape();
    if channel >= channels {
        return None;
    }

    let mut analyzer = SpectralAnalyzer::new(samples, dataset.sampling_rate());
    let mut total = 0.0;
    let mut count = 0usize;
    for trial in dataset.trials_of_class(class) {
        let psd = analyzer.compute_psd(trial.channel(channel));
        total += analyzer.band_power(&psd, low_hz, high_hz);
        count += 1;
    }

    if count == 0 {
        None
    } else {
        Some(total / count as Float)
    }
}
