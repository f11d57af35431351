use std::collections::HashSet;

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::{GeneratorError, GeneratorResult},
    trial::Trial,
    Float,
};

/// A labeled collection of trials sharing one shape.
///
/// `labels[i]` is always the class index of `trials[i]`. A dataset is never
/// modified after construction; reordering produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatasetParts")]
pub struct Dataset {
    class_names: Vec<String>,
    active_channels: Vec<usize>,
    sampling_rate: Float,
    trials: Vec<Trial>,
    labels: Vec<usize>,
}

#[derive(Deserialize)]
struct DatasetParts {
    class_names: Vec<String>,
    active_channels: Vec<usize>,
    sampling_rate: Float,
    trials: Vec<Trial>,
    labels: Vec<usize>,
}

impl TryFrom<DatasetParts> for Dataset {
    type Error = GeneratorError;

    fn try_from(parts: DatasetParts) -> GeneratorResult<Self> {
        Dataset::new(
            parts.class_names,
            parts.active_channels,
            parts.sampling_rate,
            parts.trials,
            parts.labels,
        )
    }
}

impl Dataset {
    pub fn new(
        class_names: Vec<String>,
        active_channels: Vec<usize>,
        sampling_rate: Float,
        trials: Vec<Trial>,
        labels: Vec<usize>,
    ) -> GeneratorResult<Self> {
        if class_names.len() < 2 {
            return Err(GeneratorError::dataset("fewer than 2 classes"));
        }
        if active_channels.len() != class_names.len() {
            return Err(GeneratorError::dataset(format!(
                "{} active channels for {} classes",
                active_channels.len(),
                class_names.len()
            )));
        }
        {
            let mut seen = HashSet::new();
            if let Some(name) = class_names.iter().find(|name| !seen.insert(name.as_str())) {
                return Err(GeneratorError::dataset(format!(
                    "duplicate class name `{name}`"
                )));
            }
        }
        let mut seen = HashSet::new();
        if let Some(channel) = active_channels.iter().find(|&&c| !seen.insert(c)) {
            return Err(GeneratorError::dataset(format!(
                "channel {channel} is active for more than one class"
            )));
        }
        if labels.len() != trials.len() {
            return Err(GeneratorError::dataset(format!(
                "{} labels for {} trials",
                labels.len(),
                trials.len()
            )));
        }

        if let Some(first) = trials.first() {
            let (channels, samples) = (first.channels(), first.samples());
            for (i, (trial, &label)) in trials.iter().zip(labels.iter()).enumerate() {
                if trial.channels() != channels || trial.samples() != samples {
                    return Err(GeneratorError::dataset(format!(
                        "trial {i} is {}x{}, expected {channels}x{samples}",
                        trial.channels(),
                        trial.samples()
                    )));
                }
                if trial.label() != label {
                    return Err(GeneratorError::dataset(format!(
                        "trial {i} carries label {} but labels[{i}] is {label}",
                        trial.label()
                    )));
                }
                if label >= class_names.len() {
                    return Err(GeneratorError::dataset(format!(
                        "label {label} at {i} has no class name"
                    )));
                }
            }
            if let Some(&channel) = active_channels.iter().find(|&&c| c >= channels) {
                return Err(GeneratorError::dataset(format!(
                    "active channel {channel} out of range for {channels} channels"
                )));
            }
        }

        Ok(Self {
            class_names,
            active_channels,
            sampling_rate,
            trials,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// (trials, channels, samples)
    pub fn shape(&self) -> (usize, usize, usize) {
        match self.trials.first() {
            Some(trial) => (self.trials.len(), trial.channels(), trial.samples()),
            None => (0, 0, 0),
        }
    }

    pub fn trial(&self, index: usize) -> Option<&Trial> {
        self.trials.get(index)
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn active_channels(&self) -> &[usize] {
        &self.active_channels
    }

    pub fn sampling_rate(&self) -> Float {
        self.sampling_rate
    }

    /// Number of trials per class index.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.class_names.len()];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }

    pub fn trials_of_class(&self, class: usize) -> impl Iterator<Item = &Trial> {
        self.trials.iter().filter(move |trial| trial.label() == class)
    }

    /// All values in (trial, channel, sample) order.
    pub fn flatten(&self) -> Vec<Float> {
        let (n, c, s) = self.shape();
        let mut out = Vec::with_capacity(n * c * s);
        for trial in &self.trials {
            out.extend_from_slice(trial.data());
        }
        out
    }

    pub fn into_parts(self) -> (Vec<Trial>, Vec<usize>) {
        (self.trials, self.labels)
    }

    /// Returns a copy with trials permuted and labels moved alongside.
    pub fn shuffled(&self, seed: Option<u64>) -> Dataset {
        let mut rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut order: Vec<usize> = (0..self.trials.len()).collect();
        order.shuffle(&mut rng);

        Dataset {
            class_names: self.class_names.clone(),
            active_channels: self.active_channels.clone(),
            sampling_rate: self.sampling_rate,
            trials: order.iter().map(|&i| self.trials[i].clone()).collect(),
            labels: order.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Dataset;
    use crate::trial::Trial;

    fn names() -> Vec<String> {
        vec!["left".to_string(), "right".to_string()]
    }

    fn small() -> Dataset {
        let trials = (0..6)
            .map(|i| {
                let label = i / 3;
                Trial::from_data(2, 2, label, vec![i as f32; 4]).unwrap()
            })
            .collect();
        Dataset::new(names(), vec![1, 0], 250.0, trials, vec![0, 0, 0, 1, 1, 1]).unwrap()
    }

    #[test]
    fn shape_and_counts() {
        let dataset = small();
        assert_eq!(dataset.shape(), (6, 2, 2));
        assert_eq!(dataset.class_counts(), vec![3, 3]);
        assert_eq!(dataset.trials_of_class(1).count(), 3);
        assert_eq!(dataset.flatten().len(), 24);
        assert_eq!(&dataset.flatten()[4..8], &[1.0; 4]);

        let (trials, labels) = dataset.into_parts();
        assert_eq!(trials.len(), labels.len());
        assert_eq!(trials[4].label(), labels[4]);
    }

    #[test]
    fn rejects_mismatched_labels() {
        let trials = vec![Trial::zeros(2, 2, 0), Trial::zeros(2, 2, 1)];
        assert!(Dataset::new(names(), vec![0, 1], 250.0, trials.clone(), vec![0]).is_err());
        assert!(Dataset::new(names(), vec![0, 1], 250.0, trials, vec![1, 1]).is_err());
    }

    #[test]
    fn rejects_ragged_trials() {
        let trials = vec![Trial::zeros(2, 2, 0), Trial::zeros(2, 3, 1)];
        let err = Dataset::new(names(), vec![0, 1], 250.0, trials, vec![0, 1]).unwrap_err();
        assert!(err.to_string().contains("trial 1"));
    }

    #[test]
    fn rejects_out_of_range_active_channel() {
        let trials = vec![Trial::zeros(2, 2, 0), Trial::zeros(2, 2, 1)];
        assert!(Dataset::new(names(), vec![0, 2], 250.0, trials, vec![0, 1]).is_err());
    }

    #[test]
    fn rejects_shared_active_channel() {
        let trials = vec![Trial::zeros(2, 2, 0), Trial::zeros(2, 2, 1)];
        let err = Dataset::new(names(), vec![1, 1], 250.0, trials.clone(), vec![0, 1])
            .unwrap_err();
        assert!(err.to_string().contains("more than one class"));

        let same_names = vec!["a".to_string(), "a".to_string()];
        assert!(Dataset::new(same_names, vec![0, 1], 250.0, trials, vec![0, 1]).is_err());
    }

    #[test]
    fn shuffle_keeps_pairs_together() {
        let dataset = small();
        let shuffled = dataset.shuffled(Some(3));

        assert_eq!(shuffled.len(), dataset.len());
        for (trial, &label) in shuffled.trials().iter().zip(shuffled.labels()) {
            assert_eq!(trial.label(), label);
            // trial i was filled with value i, trials 0..3 are class 0
            assert_eq!(trial.get(0, 0) as usize / 3, label);
        }
        assert_eq!(shuffled.class_counts(), vec![3, 3]);
        assert_eq!(shuffled, dataset.shuffled(Some(3)));
    }

    #[test]
    fn deserialize_checks_invariants() {
        let dataset = small();
        let json = serde_json::to_string(&dataset).unwrap();
        let back: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dataset);

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["labels"] = serde_json::json!([0, 0, 0, 1, 1, 0]);
        assert!(serde_json::from_value::<Dataset>(value).is_err());
    }

    #[test]
    fn deserialize_rejects_shared_active_channel() {
        let json = serde_json::to_string(&small()).unwrap();

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["active_channels"] = serde_json::json!([0, 0]);
        assert!(serde_json::from_value::<Dataset>(value).is_err());

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["class_names"] = serde_json::json!(["left", "left"]);
        assert!(serde_json::from_value::<Dataset>(value).is_err());
    }
}
