use thiserror::Error;

#[derive(Error, Debug)]
pub enum WsError {
    #[error("Repository error: {0}")]
    Repository(String),
}

pub type Result<T> = std::result::Result<T, WsError>;
