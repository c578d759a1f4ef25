//! Error type returned by capabilities.

use thiserror::Error;

/// Failure reported by a [`Capability`](crate::Capability) while executing a step.
///
/// The orchestrator wraps this error together with the failing step id and its
/// position in the execution plan, so capabilities only need to describe what
/// went wrong inside their own work.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// A required option was not present in the merged step options.
    #[error("missing required option '{0}'")]
    MissingOption(String),

    /// An option was present but had the wrong shape or an unusable value.
    #[error("invalid option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An external command ran but did not succeed.
    #[error("command '{command}' failed with exit code {code}")]
    CommandFailed { command: String, code: i32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CapabilityError {
    /// Shorthand for [`CapabilityError::InvalidOption`].
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
