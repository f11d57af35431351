use serde::{Deserialize, Serialize};

use crate::{utils::zeros, Float};

// Trial is one labeled window of multi-channel signal.
// Samples are stored channel-major in a single buffer: all samples
// of channel 0, then all samples of channel 1, and so on. This is the
// (channel, sample) slice of the (trial, channel, sample) layout the
// rest of the pipeline consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrialParts")]
pub struct Trial {
    label: usize,
    channels: usize,
    samples: usize,

    data: Vec<Float>,
}

#[derive(Deserialize)]
struct TrialParts {
    label: usize,
    channels: usize,
    samples: usize,
    data: Vec<Float>,
}

impl TryFrom<TrialParts> for Trial {
    type Error = String;

    fn try_from(parts: TrialParts) -> Result<Self, Self::Error> {
        let TrialParts {
            label,
            channels,
            samples,
            data,
        } = parts;
        let len = data.len();
        Trial::from_data(channels, samples, label, data).ok_or_else(|| {
            format!("trial data has {len} values, expected {channels} channels x {samples} samples")
        })
    }
}

impl Trial {
    pub fn zeros(channels: usize, samples: usize, label: usize) -> Self {
        Self {
            label,
            channels,
            samples,
            data: zeros(channels * samples),
        }
    }

    /// Wraps an existing channel-major buffer. Returns `None` when the
    /// buffer length does not match `channels * samples`.
    pub fn from_data(
        channels: usize,
        samples: usize,
        label: usize,
        data: Vec<Float>,
    ) -> Option<Self> {
        if channels.checked_mul(samples) != Some(data.len()) {
            return None;
        }
        Some(Self {
            label,
            channels,
            samples,
            data,
        })
    }

    fn get_index(&self, channel: usize, sample: usize) -> usize {
        channel * self.samples + sample
    }

    pub fn get(&self, channel: usize, sample: usize) -> Float {
        let index = self.get_index(channel, sample);
        self.data[index]
    }

    pub fn channel(&self, channel: usize) -> &[Float] {
        let start = self.get_index(channel, 0);
        &self.data[start..start + self.samples]
    }

    pub(crate) fn channel_mut(&mut self, channel: usize) -> &mut [Float] {
        let start = self.get_index(channel, 0);
        let samples = self.samples;
        &mut self.data[start..start + samples]
    }

    pub fn iter_channels(&self) -> impl Iterator<Item = &[Float]> {
        self.data.chunks_exact(self.samples.max(1)).take(self.channels)
    }

    pub fn data(&self) -> &[Float] {
        &self.data
    }

    pub fn into_data(self) -> Vec<Float> {
        self.data
    }

    pub fn label(&self) -> usize {
        self.label
    }
    pub fn channels(&self) -> usize {
        self.channels
    }
    pub fn samples(&self) -> usize {
        self.samples
    }
}
