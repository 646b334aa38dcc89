use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrchestratorError {
    /// Name of the unique index a failed insert collided with, if any.
    pub fn unique_violation(&self) -> Option<String> {
        match self {
            OrchestratorError::Database(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation() =>
            {
                Some(db_err.message().to_string())
            }
            _ => None,
        }
    }
}
