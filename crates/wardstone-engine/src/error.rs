//! Error types for the Wardstone engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup, providing a single error type
//! that `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: wardstone_core::ConfigError,
    },

    /// Subsystem lifecycle failed.
    #[error("subsystem error: {source}")]
    Subsystem {
        /// The underlying subsystem error.
        #[from]
        source: wardstone_core::SubsystemError,
    },
}
