use thiserror::Error;

/// Failures while processing a devfile. The message is the user-facing detail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DevfileError {
    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Flatten(String),
}

pub type Result<T> = std::result::Result<T, DevfileError>;
