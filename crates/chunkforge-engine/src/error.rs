//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: chunkforge_core::config::ConfigError,
    },

    /// Scanner data could not be reloaded.
    #[error("auxiliary data error: {source}")]
    Auxiliary {
        /// The underlying reload error.
        #[from]
        source: chunkforge_core::auxiliary::AuxiliaryError,
    },

    /// Placing the starting trigger failed.
    #[error("activation error: {source}")]
    Activation {
        /// The underlying tick error.
        #[from]
        source: chunkforge_core::tick::TickError,
    },

    /// No configured space accepts the starting trigger.
    #[error("trigger '{trigger}' is not valid in any live space")]
    NoActivationSpace {
        /// The trigger name.
        trigger: String,
    },
}
