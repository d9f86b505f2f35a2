//! Errors raised while generating scripts.

use thiserror::Error;

/// Failures surfaced by the command builders and the stage composer.
///
/// Generation has no partial-success mode: the first error aborts the stage
/// and no script is produced.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScriptError {
    /// Raised when an input has the wrong shape, such as a non-boolean
    /// trailing-slash flag or an unsupported runtime selector.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Raised when a data source points at an instance that cannot be found.
    #[error("data source references unknown instance {uuid}")]
    MissingReference {
        /// Identifier that could not be resolved.
        uuid: String,
    },
    /// Raised when the instance being scripted cannot be found.
    #[error("empty or unexisting instance definition: {uuid}")]
    EmptyDefinition {
        /// Identifier that was looked up.
        uuid: String,
    },
}

impl ScriptError {
    /// Builds an [`ScriptError::InvalidArgument`] from any message.
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
