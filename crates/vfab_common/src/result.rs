//! Common result and error types for invariant violations.

/// The result type for operations that can only fail through a bug.
///
/// Expected outcomes such as an allocation shortfall are modelled with
/// `Option` or crate-specific error enums. `Err(InternalError)` means two
/// components disagree about shared state.
pub type VfabResult<T> = Result<T, InternalError>;

/// An internal error indicating diverged simulator state, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal simulator error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
