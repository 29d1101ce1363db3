use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A required input is empty, mismatched, or out of range.
    #[error("invalid argument `{param}`: {reason}")]
    InvalidArgument { param: &'static str, reason: String },

    /// A domain object is not in the state the operation requires.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The geometry cannot be resolved at the working tolerance.
    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

impl Error {
    pub fn invalid(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            param,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
