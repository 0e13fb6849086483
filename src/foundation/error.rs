/// Crate-wide result alias.
pub type VidreelResult<T> = Result<T, VidreelError>;

/// Errors surfaced by sessions, sinks and transcoders.
#[derive(thiserror::Error, Debug)]
pub enum VidreelError {
    /// Invalid combination of session options (rejected before any resource is allocated).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed input, e.g. a frame buffer whose length does not match its shape.
    #[error("validation error: {0}")]
    Validation(String),

    /// Output stream, staged frame or external tool I/O failure.
    #[error("io error: {0}")]
    Io(String),

    /// Operation not valid in the current session state.
    #[error("state error: {0}")]
    State(String),

    /// An optional capability was used without its external tool available.
    #[error("missing dependency: {0}")]
    DependencyMissing(String),

    /// The configured duration cap was reached; the session has already been exported.
    #[error(
        "duration cap exceeded: recorded {elapsed_hours:.4}h, cap is {cap_hours}h (session was exported)"
    )]
    CapacityExceeded {
        /// Hours elapsed between the first and the most recent frame.
        elapsed_hours: f64,
        /// Configured cap in hours.
        cap_hours: f64,
    },

    /// Foreign error carried with its context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VidreelError {
    /// Build a [`VidreelError::Configuration`].
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`VidreelError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VidreelError::Io`].
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`VidreelError::State`].
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Build a [`VidreelError::DependencyMissing`].
    pub fn dependency_missing(msg: impl Into<String>) -> Self {
        Self::DependencyMissing(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
