use thiserror::Error;

/// Errors produced while configuring or running the generator.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// A configuration value is outside its valid range
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in the config
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// A dataset breaks its shape or label invariants
    #[error("invalid dataset: {reason}")]
    InvalidDataset { reason: String },

    #[error("failed to parse generator config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to read generator config: {0}")]
    Io(#[from] std::io::Error),
}

impl GeneratorError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn dataset(reason: impl Into<String>) -> Self {
        Self::InvalidDataset {
            reason: reason.into(),
        }
    }

    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;
