use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Catalog source unusable: {0}")]
    Catalog(String),

    #[error("Record store failed: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;
