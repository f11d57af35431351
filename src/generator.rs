//! Synthetic motor-imagery trial generation.
//!
//! Every trial starts as independent zero-mean gaussian noise on all
//! channels. The class's active channel then gets a sinusoid at the target
//! frequency added on top, so band power around that frequency separates
//! the classes.
//!
//! Random draws come from one ChaCha8 stream per call, consumed in a fixed
//! order: for each class in vocabulary order, for each trial, first the
//! amplitude factor (only when jitter is enabled), then the phase (only for
//! [`Phase::Random`]), then the noise for channel 0, channel 1, and so on.
//! Same config and seed therefore always give the same bits.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;
use tracing::{debug, trace};

use crate::{
    config::{GeneratorConfig, Phase, DEFAULT_CLASS_NAMES},
    dataset::Dataset,
    error::{GeneratorError, GeneratorResult},
    trial::Trial,
    utils::{fill_noise, randf},
    Float,
};

/// The class vocabulary of the default configuration.
pub fn get_class_names() -> Vec<String> {
    DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Generates `trials_per_class` trials for every class, grouped by class.
///
/// Trials come out class-grouped: all trials of class 0, then all of class 1,
/// and so on. Use [`Dataset::shuffled`] when an interleaved order is needed.
pub fn generate_dataset(config: &GeneratorConfig) -> GeneratorResult<Dataset> {
    let synth = Synth::new(config)?;
    let mut rng = match config.random_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    debug!(
        trials = config.trial_count(),
        channels = config.channel_count,
        samples = config.sample_count,
        seeded = config.random_seed.is_some(),
        "generating synthetic motor imagery dataset"
    );

    let mut trials = Vec::with_capacity(config.trial_count());
    let mut labels = Vec::with_capacity(config.trial_count());
    for class in 0..config.class_count() {
        trace!(
            class = %config.class_names[class],
            channel = synth.active_channels[class],
            "synthesizing class"
        );
        for _ in 0..config.trials_per_class {
            trials.push(synth.trial(class, &mut rng));
            labels.push(class);
        }
    }

    Dataset::new(
        config.class_names.clone(),
        synth.active_channels,
        config.sampling_rate,
        trials,
        labels,
    )
}

/// Generates one trial of `class_index` from a caller-owned random stream.
pub fn generate_trial<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    class_index: usize,
    rng: &mut R,
) -> GeneratorResult<Trial> {
    let synth = Synth::new(config)?;
    if class_index >= config.class_count() {
        return Err(GeneratorError::invalid(
            "class_index",
            format!(
                "{class_index} out of range for {} classes",
                config.class_count()
            ),
        ));
    }
    Ok(synth.trial(class_index, rng))
}

// validated parameters shared by every trial of one call
struct Synth<'a> {
    config: &'a GeneratorConfig,
    active_channels: Vec<usize>,
    noise: Normal<Float>,
    // radians per sample
    omega: f64,
}

impl<'a> Synth<'a> {
    fn new(config: &'a GeneratorConfig) -> GeneratorResult<Self> {
        let active_channels = config.validate()?;
        let noise = Normal::new(0.0, config.noise_amplitude)
            .map_err(|err| GeneratorError::invalid("noise_amplitude", err.to_string()))?;
        let omega = TAU * f64::from(config.target_frequency) / f64::from(config.sampling_rate);

        Ok(Self {
            config,
            active_channels,
            noise,
            omega,
        })
    }

    fn trial<R: Rng + ?Sized>(&self, class: usize, rng: &mut R) -> Trial {
        let config = self.config;

        let mut amplitude = config.signal_amplitude;
        if config.amplitude_jitter > 0.0 {
            amplitude *= 1.0 + config.amplitude_jitter * randf(rng, -1.0, 1.0);
        }
        let phase = match config.phase {
            Phase::Random => f64::from(randf(rng, 0.0, TAU as Float)),
            Phase::Fixed(phase) => f64::from(phase),
        };

        let mut trial = Trial::zeros(config.channel_count, config.sample_count, class);
        for channel in 0..config.channel_count {
            fill_noise(rng, &self.noise, trial.channel_mut(channel));
        }

        let amplitude = f64::from(amplitude);
        let active = self.active_channels[class];
        for (n, value) in trial.channel_mut(active).iter_mut().enumerate() {
            *value += (amplitude * (self.omega * n as f64 + phase).sin()) as Float;
        }
        trial
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::TAU;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{generate_dataset, generate_trial, get_class_names};
    use crate::{
        config::{GeneratorConfig, Phase},
        error::GeneratorError,
        spectral::mean_band_power,
        utils::maxmin,
    };

    fn seeded(seed: u64) -> GeneratorConfig {
        GeneratorConfig::builder().random_seed(seed).build()
    }

    #[test]
    fn example_shape_and_grouped_labels() {
        let config = GeneratorConfig::builder()
            .trials_per_class(20)
            .channel_count(8)
            .sample_count(1000)
            .sampling_rate(250.0)
            .target_frequency(12.0)
            .class_names(["left", "right"])
            .random_seed(42)
            .build();
        let dataset = generate_dataset(&config).unwrap();

        assert_eq!(dataset.shape(), (40, 8, 1000));
        assert_eq!(dataset.labels().len(), 40);

        let mut expected = vec![0; 20];
        expected.extend(vec![1; 20]);
        assert_eq!(dataset.labels(), expected.as_slice());
        assert_eq!(dataset.flatten().len(), 40 * 8 * 1000);
    }

    #[test]
    fn shape_follows_class_count() {
        let config = GeneratorConfig::builder()
            .trials_per_class(3)
            .channel_count(4)
            .sample_count(64)
            .class_names(["rest", "left", "right"])
            .build();
        let dataset = generate_dataset(&config).unwrap();

        assert_eq!(dataset.shape(), (9, 4, 64));
        assert_eq!(dataset.labels(), &[0, 0, 0, 1, 1, 1, 2, 2, 2]);
        assert_eq!(dataset.active_channels(), &[0, 1, 2]);
    }

    #[test]
    fn same_seed_same_bits() {
        let a = generate_dataset(&seeded(42)).unwrap();
        let b = generate_dataset(&seeded(42)).unwrap();
        assert_eq!(a.flatten(), b.flatten());
        assert_eq!(a.labels(), b.labels());

        let c = generate_dataset(&seeded(43)).unwrap();
        assert_ne!(a.flatten(), c.flatten());
    }

    #[test]
    fn unseeded_calls_differ() {
        let config = GeneratorConfig::default();
        let a = generate_dataset(&config).unwrap();
        let b = generate_dataset(&config).unwrap();
        assert_ne!(a.flatten(), b.flatten());
    }

    #[test]
    fn zero_trials_per_class_fails() {
        let config = GeneratorConfig::builder().trials_per_class(0).build();
        assert!(matches!(
            generate_dataset(&config),
            Err(GeneratorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn frequency_at_or_above_nyquist_fails() {
        for frequency in [125.0, 130.0] {
            let config = GeneratorConfig::builder()
                .sampling_rate(250.0)
                .target_frequency(frequency)
                .build();
            assert!(generate_dataset(&config).unwrap_err().is_invalid_parameter());
        }
    }

    #[test]
    fn oversized_config_fails_without_panicking() {
        let config = GeneratorConfig::builder()
            .trials_per_class(usize::MAX)
            .build();
        assert!(generate_dataset(&config).unwrap_err().is_invalid_parameter());

        let config = GeneratorConfig::builder()
            .channel_count(usize::MAX)
            .sample_count(2)
            .build();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(generate_trial(&config, 0, &mut rng)
            .unwrap_err()
            .is_invalid_parameter());
    }

    #[test]
    fn single_class_fails() {
        let config = GeneratorConfig::builder().class_names(["left"]).build();
        assert!(generate_dataset(&config).unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn noise_free_trial_is_closed_form_sinusoid() {
        let config = GeneratorConfig::builder()
            .noise_amplitude(0.0)
            .signal_amplitude(2.0)
            .phase(Phase::Fixed(0.0))
            .trials_per_class(2)
            .sample_count(250)
            .random_seed(1)
            .build();
        let dataset = generate_dataset(&config).unwrap();

        for trial in dataset.trials() {
            let active = dataset.active_channels()[trial.label()];
            for channel in 0..trial.channels() {
                let values = trial.channel(channel);
                if channel != active {
                    assert!(values.iter().all(|v| *v == 0.0));
                    continue;
                }
                for (n, v) in values.iter().enumerate() {
                    let expected = 2.0 * (TAU * 12.0 * n as f64 / 250.0).sin();
                    assert!((f64::from(*v) - expected).abs() < 1e-5);
                }
            }
        }
    }

    #[test]
    fn jitter_varies_amplitude_between_trials() {
        let config = GeneratorConfig::builder()
            .noise_amplitude(0.0)
            .amplitude_jitter(0.5)
            .phase(Phase::Fixed(0.0))
            .trials_per_class(5)
            .random_seed(9)
            .build();
        let dataset = generate_dataset(&config).unwrap();

        let peaks: Vec<f32> = dataset
            .trials_of_class(0)
            .map(|trial| maxmin(trial.channel(dataset.active_channels()[0])).unwrap().max_value)
            .collect();
        // amplitude lies in [1, 3); sampled peaks sit slightly under it
        for peak in &peaks {
            assert!(*peak > 0.9 && *peak < 3.0);
        }
        assert!(peaks.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn active_channel_carries_target_band_power() {
        let config = GeneratorConfig::builder()
            .trials_per_class(10)
            .signal_amplitude(2.0)
            .noise_amplitude(0.5)
            .random_seed(42)
            .build();
        let dataset = generate_dataset(&config).unwrap();

        for class in 0..2 {
            let active = dataset.active_channels()[class];
            let active_power = mean_band_power(&dataset, class, active, 11.0, 13.0).unwrap();
            for channel in (0..8).filter(|&c| c != active) {
                let power = mean_band_power(&dataset, class, channel, 11.0, 13.0).unwrap();
                assert!(
                    active_power > power * 10.0,
                    "class {class}: active {active_power} vs channel {channel} {power}"
                );
            }
        }
    }

    #[test]
    fn generate_trial_uses_caller_stream() {
        let config = GeneratorConfig::default();
        let mut a = ChaCha8Rng::seed_from_u64(5);
        let mut b = ChaCha8Rng::seed_from_u64(5);

        let first = generate_trial(&config, 1, &mut a).unwrap();
        let second = generate_trial(&config, 1, &mut b).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.label(), 1);
        assert_eq!((first.channels(), first.samples()), (8, 1000));

        assert!(generate_trial(&config, 2, &mut a)
            .unwrap_err()
            .is_invalid_parameter());
    }

    #[test]
    fn class_names_are_stable() {
        assert_eq!(get_class_names(), vec!["left", "right"]);
        assert_eq!(get_class_names(), get_class_names());
    }
}
