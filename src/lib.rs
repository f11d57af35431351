//! Synthetic motor-imagery EEG datasets.
//!
//! Produces labeled `(trial, channel, sample)` data in which each class shows
//! up as a narrow-band oscillation on its own channel over gaussian noise, so
//! decoding pipelines can be developed without acquisition hardware.
//!
//! ```no_run
//! use synthetic_mi::{generate_dataset, GeneratorConfig};
//!
//! let config = GeneratorConfig::builder().random_seed(42).build();
//! let dataset = generate_dataset(&config)?;
//! assert_eq!(dataset.shape(), (40, 8, 1000));
//! # Ok::<(), synthetic_mi::GeneratorError>(())
//! ```

mod config;
mod dataset;
mod error;
mod generator;
mod spectral;
mod trial;
mod utils;

pub use config::*;
pub use dataset::*;
pub use error::*;
pub use generator::*;
pub use spectral::*;
pub use trial::*;
pub use utils::*;

pub type Float = f32;
