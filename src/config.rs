use std::{collections::HashSet, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{GeneratorError, GeneratorResult},
    Float,
};

/// Class vocabulary used when none is configured.
pub const DEFAULT_CLASS_NAMES: [&str; 2] = ["left", "right"];

/// C3 sits over the left motor cortex in the 8-channel motor montage.
pub const CHANNEL_C3: usize = 2;
/// C4 sits over the right motor cortex in the 8-channel motor montage.
pub const CHANNEL_C4: usize = 3;

/// Phase of the injected oscillation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Uniform in [0, 2π), drawn once per trial from the generator's stream.
    Random,
    /// Same phase (radians) for every trial.
    Fixed(Float),
}

/// Parameters for one generation call.
///
/// Missing fields take their defaults when deserialized, so a config file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub trials_per_class: usize,
    pub channel_count: usize,
    pub sample_count: usize,
    /// Hz
    pub sampling_rate: Float,
    /// Hz, must stay below the Nyquist frequency
    pub target_frequency: Float,
    /// standard deviation of the zero-mean gaussian background
    pub noise_amplitude: Float,
    /// peak amplitude of the injected sinusoid
    pub signal_amplitude: Float,
    /// relative per-trial amplitude variation, in [0, 1]
    pub amplitude_jitter: Float,
    pub class_names: Vec<String>,
    /// class index -> active channel. Derived from the montage when absent.
    pub active_channels: Option<Vec<usize>>,
    pub phase: Phase,
    pub random_seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            trials_per_class: 20,
            channel_count: 8,
            sample_count: 1000,
            sampling_rate: 250.0,
            target_frequency: 12.0,
            noise_amplitude: 0.5,
            signal_amplitude: 2.0,
            amplitude_jitter: 0.0,
            class_names: DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
            active_channels: None,
            phase: Phase::Random,
            random_seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::new()
    }

    pub fn from_json_str(json: &str) -> GeneratorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> GeneratorResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Sets `sample_count` from a trial length in seconds at the current sampling rate.
    pub fn with_duration(mut self, seconds: Float) -> Self {
        self.sample_count = (self.sampling_rate * seconds).round() as usize;
        self
    }

    pub fn class_count(&self) -> usize {
        self.class_names.len()
    }

    /// Saturates instead of overflowing; `validate` rejects configs where it would.
    pub fn trial_count(&self) -> usize {
        self.trials_per_class.saturating_mul(self.class_count())
    }

    /// Checks every parameter and returns the resolved class -> active channel map.
    ///
    /// Nothing is allocated for the dataset until this succeeds.
    pub fn validate(&self) -> GeneratorResult<Vec<usize>> {
        if self.trials_per_class == 0 {
            return Err(GeneratorError::invalid("trials_per_class", "must be positive"));
        }
        if self.sample_count == 0 {
            return Err(GeneratorError::invalid("sample_count", "must be positive"));
        }
        check_positive("sampling_rate", self.sampling_rate)?;
        check_positive("target_frequency", self.target_frequency)?;

        let nyquist = self.sampling_rate / 2.0;
        if self.target_frequency >= nyquist {
            return Err(GeneratorError::invalid(
                "target_frequency",
                format!(
                    "{} Hz is at or above the Nyquist frequency ({nyquist} Hz)",
                    self.target_frequency
                ),
            ));
        }

        check_non_negative("noise_amplitude", self.noise_amplitude)?;
        check_non_negative("signal_amplitude", self.signal_amplitude)?;
        if !(0.0..=1.0).contains(&self.amplitude_jitter) {
            return Err(GeneratorError::invalid(
                "amplitude_jitter",
                format!("{} is outside [0, 1]", self.amplitude_jitter),
            ));
        }
        if let Phase::Fixed(phase) = self.phase {
            if !phase.is_finite() {
                return Err(GeneratorError::invalid("phase", "must be finite"));
            }
        }

        let mut seen = HashSet::new();
        for name in &self.class_names {
            if !seen.insert(name.as_str()) {
                return Err(GeneratorError::invalid(
                    "class_names",
                    format!("duplicate class name `{name}`"),
                ));
            }
        }
        if self.class_names.len() < 2 {
            return Err(GeneratorError::invalid(
                "class_names",
                format!("need at least 2 distinct classes, got {}", self.class_names.len()),
            ));
        }

        if self.channel_count < 2 || self.channel_count < self.class_count() {
            return Err(GeneratorError::invalid(
                "channel_count",
                format!(
                    "need at least {} channels for {} classes, got {}",
                    self.class_count().max(2),
                    self.class_count(),
                    self.channel_count
                ),
            ));
        }

        self.check_sizes()?;
        self.resolve_active_channels()
    }

    // every buffer the generator allocates must have a representable length
    fn check_sizes(&self) -> GeneratorResult<()> {
        let trials = self
            .trials_per_class
            .checked_mul(self.class_count())
            .ok_or_else(|| {
                GeneratorError::invalid(
                    "trials_per_class",
                    format!(
                        "{} trials for {} classes overflows",
                        self.trials_per_class,
                        self.class_count()
                    ),
                )
            })?;
        let per_trial = self
            .channel_count
            .checked_mul(self.sample_count)
            .ok_or_else(|| {
                GeneratorError::invalid(
                    "sample_count",
                    format!(
                        "{} channels x {} samples overflows",
                        self.channel_count, self.sample_count
                    ),
                )
            })?;
        if trials.checked_mul(per_trial).is_none() {
            return Err(GeneratorError::invalid(
                "sample_count",
                format!("{trials} trials of {per_trial} values overflows"),
            ));
        }
        Ok(())
    }

    fn resolve_active_channels(&self) -> GeneratorResult<Vec<usize>> {
        let Some(map) = &self.active_channels else {
            return Ok(default_active_channels(
                self.class_count(),
                self.channel_count,
            ));
        };

        if map.len() != self.class_count() {
            return Err(GeneratorError::invalid(
                "active_channels",
                format!(
                    "expected one channel per class ({}), got {}",
                    self.class_count(),
                    map.len()
                ),
            ));
        }
        let mut seen = HashSet::new();
        for &channel in map {
            if channel >= self.channel_count {
                return Err(GeneratorError::invalid(
                    "active_channels",
                    format!(
                        "channel {channel} out of range for {} channels",
                        self.channel_count
                    ),
                ));
            }
            if !seen.insert(channel) {
                return Err(GeneratorError::invalid(
                    "active_channels",
                    format!("channel {channel} assigned to more than one class"),
                ));
            }
        }
        Ok(map.clone())
    }
}

/// Class -> channel map used when the config does not name one.
///
/// Two classes on a montage wide enough to hold C3/C4 follow contralateral
/// motor imagery: "left" drives C4, "right" drives C3. Anything else maps
/// class k onto channel k.
pub fn default_active_channels(class_count: usize, channel_count: usize) -> Vec<usize> {
    if class_count == 2 && channel_count > CHANNEL_C4 {
        vec![CHANNEL_C4, CHANNEL_C3]
    } else {
        (0..class_count).collect()
    }
}

fn check_positive(name: &'static str, value: Float) -> GeneratorResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GeneratorError::invalid(
            name,
            format!("must be finite and positive, got {value}"),
        ))
    }
}

fn check_non_negative(name: &'static str, value: Float) -> GeneratorResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(GeneratorError::invalid(
            name,
            format!("must be finite and non-negative, got {value}"),
        ))
    }
}

pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    fn new() -> Self {
        Self {
            config: GeneratorConfig::default(),
        }
    }

    pub fn trials_per_class(mut self, value: usize) -> Self {
        self.config.trials_per_class = value;
        self
    }

    pub fn channel_count(mut self, value: usize) -> Self {
        self.config.channel_count = value;
        self
    }

    pub fn sample_count(mut self, value: usize) -> Self {
        self.config.sample_count = value;
        self
    }

    pub fn sampling_rate(mut self, value: Float) -> Self {
        self.config.sampling_rate = value;
        self
    }

    pub fn target_frequency(mut self, value: Float) -> Self {
        self.config.target_frequency = value;
        self
    }

    pub fn noise_amplitude(mut self, value: Float) -> Self {
        self.config.noise_amplitude = value;
        self
    }

    pub fn signal_amplitude(mut self, value: Float) -> Self {
        self.config.signal_amplitude = value;
        self
    }

    pub fn amplitude_jitter(mut self, value: Float) -> Self {
        self.config.amplitude_jitter = value;
        self
    }

    pub fn class_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.class_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn active_channels(mut self, channels: Vec<usize>) -> Self {
        self.config.active_channels = Some(channels);
        self
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.config.phase = phase;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    pub fn duration(mut self, seconds: Float) -> Self {
        self.config = self.config.with_duration(seconds);
        self
    }

    pub fn build(self) -> GeneratorConfig {
        self.config
    }
}
