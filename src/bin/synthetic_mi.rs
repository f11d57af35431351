//! Synthetic motor imagery smoke test
//!
//! Generates a dataset, reports its shape and per-class band power, and
//! optionally writes it out for offline training.
//!
//! # Usage
//!
//! ```bash
//! # Default 2-class, 8-channel dataset with a fixed seed
//! synthetic-mi --seed 42
//!
//! # 2 second trials from a config file, saved as bincode
//! synthetic-mi --config calibration.json --duration 2 --output trials.bin --format bincode
//! ```

use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use synthetic_mi::{
    channel_variances, generate_dataset, get_class_names, maxmin, mean, mean_band_power, Dataset,
    Float, GeneratorConfig,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Synthetic motor imagery dataset generator
#[derive(Parser, Debug)]
#[command(name = "synthetic-mi")]
#[command(author, version, long_about = None)]
#[command(about = "Generate synthetic motor imagery EEG trials")]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// JSON generator config; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    trials_per_class: Option<usize>,

    #[arg(long)]
    channels: Option<usize>,

    #[arg(long)]
    samples: Option<usize>,

    /// Trial length in seconds, overrides --samples
    #[arg(long)]
    duration: Option<Float>,

    /// Hz
    #[arg(long)]
    sampling_rate: Option<Float>,

    /// Oscillation frequency in Hz
    #[arg(long)]
    frequency: Option<Float>,

    #[arg(long)]
    noise: Option<Float>,

    #[arg(long)]
    signal: Option<Float>,

    /// Relative per-trial amplitude variation in [0, 1]
    #[arg(long)]
    jitter: Option<Float>,

    /// Comma separated class names
    #[arg(long, value_delimiter = ',')]
    classes: Option<Vec<String>>,

    #[arg(long)]
    seed: Option<u64>,

    /// Interleave classes instead of keeping them grouped
    #[arg(long)]
    shuffle: bool,

    /// Write the dataset to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Bincode,
}

impl Cli {
    fn generator_config(&self) -> anyhow::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => GeneratorConfig::default(),
        };

        if let Some(value) = self.trials_per_class {
            config.trials_per_class = value;
        }
        if let Some(value) = self.channels {
            config.channel_count = value;
        }
        if let Some(value) = self.samples {
            config.sample_count = value;
        }
        if let Some(value) = self.sampling_rate {
            config.sampling_rate = value;
        }
        if let Some(value) = self.frequency {
            config.target_frequency = value;
        }
        if let Some(value) = self.noise {
            config.noise_amplitude = value;
        }
        if let Some(value) = self.signal {
            config.signal_amplitude = value;
        }
        if let Some(value) = self.jitter {
            config.amplitude_jitter = value;
        }
        if let Some(names) = &self.classes {
            config.class_names = names.clone();
        }
        if self.seed.is_some() {
            config.random_seed = self.seed;
        }
        // applied last so it sees the final sampling rate
        if let Some(seconds) = self.duration {
            config = config.with_duration(seconds);
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.generator_config()?;
    if config.signal_amplitude <= config.noise_amplitude {
        warn!(
            signal = config.signal_amplitude,
            noise = config.noise_amplitude,
            "signal amplitude does not exceed noise, classes may not be separable"
        );
    }

    let mut dataset = generate_dataset(&config)?;
    if cli.shuffle {
        dataset = dataset.shuffled(config.random_seed);
    }

    let (trials, channels, samples) = dataset.shape();
    info!("data shape: ({trials}, {channels}, {samples}) (trials, channels, samples)");
    info!("labels: {:?}", dataset.labels());
    info!("classes: {:?}", dataset.class_names());
    if dataset.class_names() != get_class_names().as_slice() {
        info!("default classes: {:?}", get_class_names());
    }

    report_separability(&dataset, config.target_frequency);

    if let Some(path) = &cli.output {
        let writer = BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        );
        match cli.format {
            Format::Json => serde_json::to_writer(writer, &dataset)?,
            Format::Bincode => bincode::serialize_into(writer, &dataset)?,
        }
        info!("wrote {} trials to {}", dataset.len(), path.display());
    }

    Ok(())
}

// target-band power on each class's active channel, seen from every class
fn report_separability(dataset: &Dataset, frequency: Float) {
    let (low, high) = (frequency - 1.0, frequency + 1.0);

    for (class, name) in dataset.class_names().iter().enumerate() {
        let powers: Vec<String> = dataset
            .active_channels()
            .iter()
            .map(|&channel| {
                let power = mean_band_power(dataset, class, channel, low, high).unwrap_or(0.0);
                format!("ch{channel}={power:.4}")
            })
            .collect();
        info!("class `{name}` band power on active channels: {}", powers.join(" "));

        let variances: Vec<Vec<Float>> = dataset
            .trials_of_class(class)
            .map(channel_variances)
            .collect();
        let per_channel: Vec<Float> = (0..dataset.shape().1)
            .map(|c| mean(&variances.iter().map(|v| v[c]).collect::<Vec<_>>()))
            .collect();
        if let Some(mm) = maxmin(&per_channel) {
            info!(
                "class `{name}` channel variance: max ch{} {:.3}, min ch{} {:.3}",
                mm.max_index, mm.max_value, mm.min_index, mm.min_value
            );
        }
    }
}
